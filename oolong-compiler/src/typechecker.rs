use std::collections::HashMap;

use crate::ast::{
    BinaryOperator, CallExpression, ParsedBlock, ParsedExpression, ParsedFunction,
    ParsedNamespace, ParsedRecord, ParsedStatement, ParsedType, Span, Spanned, UnaryOperator,
};
use crate::diagnostics::Error;
use crate::project::{
    CheckedBlock, CheckedExpression, CheckedFunction, CheckedParameter, CheckedRecord,
    CheckedStatement, CheckedType, CheckedUnaryOperator, CheckedVarDecl, CheckedVariable,
    FunctionId, Project, RecordId, SafetyContext, ScopeId, TypeId, BOOL_TYPE_ID, INT_TYPE_ID,
    STRING_TYPE_ID, UNIT_TYPE_ID, UNKNOWN_TYPE_ID,
};

/// Accumulated generic bindings for one unification run, keyed by the type
/// variable's interned handle.
pub type Inferences = HashMap<TypeId, TypeId>;

pub struct Typechecker<'a> {
    project: &'a mut Project,
}

impl<'a> Typechecker<'a> {
    pub fn new(project: &'a mut Project) -> Self {
        Self { project }
    }

    /// Checks one namespace level in three passes: record identities first,
    /// then member signatures, then bodies. Forward and mutual references
    /// between sibling records resolve because every later pass only consumes
    /// names the earlier pass already bound.
    pub fn typecheck_namespace(
        &mut self,
        namespace: &ParsedNamespace,
        scope_id: ScopeId,
    ) -> Option<Error> {
        let mut error = None;

        for child in &namespace.namespaces {
            let child_scope = self.project.create_scope(scope_id);
            self.project.scopes[child_scope].namespace_name = child.name.clone();
            error = error.or(self.typecheck_namespace(child, child_scope));
        }

        // Pass A: reserve an identity for every record declared here so
        // siblings can name each other before any field resolves.
        for (index, record) in namespace.records.iter().enumerate() {
            let record_id = self.project.records.len() + index;
            let type_id = self
                .project
                .find_or_add_type_id(CheckedType::Record(record_id));
            error = error.or(self
                .project
                .add_type_to_scope(
                    scope_id,
                    record.name.value.clone(),
                    type_id,
                    record.name.span,
                )
                .err());
        }

        // Pass B: member signatures.
        for record in &namespace.records {
            error = error.or(self.typecheck_record_predecl(record, scope_id));
        }
        for function in &namespace.functions {
            error = error.or(self.typecheck_function_predecl(function, scope_id));
        }

        // Pass C: bodies.
        for record in &namespace.records {
            error = error.or(self.typecheck_record(record, scope_id));
        }
        for function in &namespace.functions {
            error = error.or(self.typecheck_method(function, scope_id));
        }

        error
    }

    /// Pass B for one record: creates its member scope, binds generic
    /// parameters as type variables, predeclares method signatures (bodies
    /// untouched, return types left Unknown), and appends the record stub.
    fn typecheck_record_predecl(
        &mut self,
        record: &ParsedRecord,
        scope_id: ScopeId,
    ) -> Option<Error> {
        let mut error = None;

        let record_scope = self.project.create_scope(scope_id);

        let mut generic_parameters = Vec::new();
        for parameter in &record.generic_parameters {
            let type_id = self
                .project
                .find_or_add_type_id(CheckedType::TypeVariable(parameter.value.clone()));
            error = error.or(self
                .project
                .add_type_to_scope(
                    record_scope,
                    parameter.value.clone(),
                    type_id,
                    parameter.span,
                )
                .err());
            generic_parameters.push(type_id);
        }

        for method in &record.methods {
            error = error.or(self.typecheck_function_predecl(method, record_scope));
        }

        let record_id = self.project.records.len();
        self.project.records.push(CheckedRecord {
            name: record.name.value.clone(),
            generic_parameters,
            fields: Vec::new(),
            scope_id: record_scope,
        });
        error = error.or(self
            .project
            .add_record_to_scope(
                scope_id,
                record.name.value.clone(),
                record_id,
                record.name.span,
            )
            .err());

        error
    }

    /// Predeclares one callable: parameter types resolve now, the body and
    /// return type wait for Pass C.
    fn typecheck_function_predecl(
        &mut self,
        function: &ParsedFunction,
        parent_scope: ScopeId,
    ) -> Option<Error> {
        let mut error = None;

        let function_scope = self.project.create_scope(parent_scope);

        let mut generic_parameters = Vec::new();
        for parameter in &function.generic_parameters {
            let type_id = self
                .project
                .find_or_add_type_id(CheckedType::TypeVariable(parameter.value.clone()));
            error = error.or(self
                .project
                .add_type_to_scope(
                    function_scope,
                    parameter.value.clone(),
                    type_id,
                    parameter.span,
                )
                .err());
            generic_parameters.push(type_id);
        }

        let mut parameters = Vec::new();
        for parameter in &function.parameters {
            let (type_id, type_error) = self.typecheck_typename(&parameter.ty, function_scope);
            error = error.or(type_error);
            parameters.push(CheckedParameter {
                requires_label: parameter.requires_label,
                variable: CheckedVariable {
                    name: parameter.name.value.clone(),
                    type_id,
                },
            });
        }

        let function_id = self.project.functions.len();
        self.project.functions.push(CheckedFunction {
            name: function.name.value.clone(),
            return_type_id: UNKNOWN_TYPE_ID,
            parameters,
            generic_parameters,
            scope_id: function_scope,
            block: CheckedBlock::default(),
        });
        error = error.or(self
            .project
            .add_function_to_scope(
                parent_scope,
                function.name.value.clone(),
                function_id,
                function.name.span,
            )
            .err());

        error
    }

    /// Pass C for one record: resolve field types into the stub, synthesize
    /// the default constructor when no method shadows the record's name, and
    /// check every method body.
    fn typecheck_record(&mut self, record: &ParsedRecord, scope_id: ScopeId) -> Option<Error> {
        let mut error = None;

        let record_id = self.project.scopes[scope_id]
            .records
            .iter()
            .find(|(name, _)| *name == record.name.value)
            .map(|(_, id)| *id)
            .expect("internal error: record not registered before body checking");
        let record_scope = self.project.records[record_id].scope_id;

        let mut fields = Vec::new();
        for field in &record.fields {
            let (type_id, type_error) = self.typecheck_typename(&field.ty, record_scope);
            error = error.or(type_error);
            fields.push(CheckedVarDecl {
                name: field.name.value.clone(),
                type_id,
                span: field.name.span,
            });
        }
        self.project.records[record_id].fields = fields.clone();

        let has_own_constructor = self.project.scopes[record_scope]
            .functions
            .iter()
            .any(|(name, _)| *name == record.name.value);
        if !has_own_constructor {
            error = error.or(self.synthesize_constructor(record_id, record_scope, &fields, record));
        }

        for method in &record.methods {
            error = error.or(self.typecheck_method(method, record_scope));
        }

        error
    }

    /// Builds the implicit constructor: one function per record taking each
    /// field as a required, labeled parameter and returning the record type.
    fn synthesize_constructor(
        &mut self,
        record_id: RecordId,
        record_scope: ScopeId,
        fields: &[CheckedVarDecl],
        record: &ParsedRecord,
    ) -> Option<Error> {
        let constructor_scope = self.project.create_scope(record_scope);
        let parameters = fields
            .iter()
            .map(|field| CheckedParameter {
                requires_label: true,
                variable: CheckedVariable {
                    name: field.name.clone(),
                    type_id: field.type_id,
                },
            })
            .collect();
        let return_type_id = self
            .project
            .find_or_add_type_id(CheckedType::Record(record_id));
        let generic_parameters = self.project.records[record_id].generic_parameters.clone();

        let function_id = self.project.functions.len();
        self.project.functions.push(CheckedFunction {
            name: record.name.value.clone(),
            return_type_id,
            parameters,
            generic_parameters,
            scope_id: constructor_scope,
            block: CheckedBlock::default(),
        });
        self.project
            .add_function_to_scope(
                record_scope,
                record.name.value.clone(),
                function_id,
                record.name.span,
            )
            .err()
    }

    /// Checks one callable body against its Pass B stub and commits the
    /// result into the function table. The declared return type resolves
    /// before the body so `return` statements unify against it.
    pub fn typecheck_method(
        &mut self,
        method: &ParsedFunction,
        lookup_scope: ScopeId,
    ) -> Option<Error> {
        let mut error = None;

        let function_id = self.project.scopes[lookup_scope]
            .functions
            .iter()
            .find(|(name, _)| *name == method.name.value)
            .map(|(_, id)| *id)
            .unwrap_or_else(|| {
                panic!(
                    "internal error: method '{}' vanished from its scope before body checking",
                    method.name.value
                )
            });
        let function_scope = self.project.functions[function_id].scope_id;

        let return_type_id = match &method.return_type {
            Some(annotation) => {
                let (type_id, type_error) = self.typecheck_typename(annotation, function_scope);
                let failed = type_error.is_some();
                error = error.or(type_error);
                if failed {
                    UNIT_TYPE_ID
                } else {
                    type_id
                }
            }
            None => UNIT_TYPE_ID,
        };
        self.project.functions[function_id].return_type_id = return_type_id;

        let parameters = self.project.functions[function_id].parameters.clone();
        for parameter in parameters {
            error = error.or(self
                .project
                .add_var_to_scope(function_scope, parameter.variable, method.name.span)
                .err());
        }

        let safety = if method.is_unsafe {
            SafetyContext::Unsafe
        } else {
            SafetyContext::Safe
        };
        let (block, block_error) =
            self.typecheck_block(&method.body, function_scope, function_id, safety);
        error = error.or(block_error);
        self.project.functions[function_id].block = block;

        error
    }

    pub fn typecheck_block(
        &mut self,
        block: &ParsedBlock,
        parent_scope: ScopeId,
        function_id: FunctionId,
        safety: SafetyContext,
    ) -> (CheckedBlock, Option<Error>) {
        let scope_id = self.project.create_scope(parent_scope);

        let mut error = None;
        let mut statements = Vec::new();
        for statement in &block.statements {
            let (checked, statement_error) =
                self.typecheck_statement(statement, scope_id, function_id, safety);
            error = error.or(statement_error);
            statements.push(checked);
        }

        (CheckedBlock { statements }, error)
    }

    fn typecheck_statement(
        &mut self,
        statement: &ParsedStatement,
        scope_id: ScopeId,
        function_id: FunctionId,
        safety: SafetyContext,
    ) -> (CheckedStatement, Option<Error>) {
        let return_type_id = self.project.functions[function_id].return_type_id;

        match statement {
            ParsedStatement::Expression(expression) => {
                let (checked, error) =
                    self.typecheck_expression(expression, scope_id, safety, Some(return_type_id));
                (CheckedStatement::Expression(checked), error)
            }
            ParsedStatement::Return { value, .. } => match value {
                Some(expression) => {
                    let (checked, error) = self.typecheck_expression(
                        expression,
                        scope_id,
                        safety,
                        Some(return_type_id),
                    );
                    (CheckedStatement::Return(Some(checked)), error)
                }
                None => (CheckedStatement::Return(None), None),
            },
            ParsedStatement::Var(decl) => {
                let mut error = None;

                let (declared_type_id, type_error) = self.typecheck_typename(&decl.ty, scope_id);
                error = error.or(type_error);

                let hint = if declared_type_id == UNKNOWN_TYPE_ID {
                    None
                } else {
                    Some(declared_type_id)
                };
                let (initializer, initializer_error) = match &decl.default_value {
                    Some(expression) => self.typecheck_expression(expression, scope_id, safety, hint),
                    None => (CheckedExpression::Null(UNKNOWN_TYPE_ID), None),
                };
                error = error.or(initializer_error);

                let type_id = if declared_type_id == UNKNOWN_TYPE_ID {
                    initializer.type_id()
                } else {
                    declared_type_id
                };
                error = error.or(self
                    .project
                    .add_var_to_scope(
                        scope_id,
                        CheckedVariable {
                            name: decl.name.value.clone(),
                            type_id,
                        },
                        decl.name.span,
                    )
                    .err());

                (
                    CheckedStatement::VarDecl {
                        decl: CheckedVarDecl {
                            name: decl.name.value.clone(),
                            type_id,
                            span: decl.name.span,
                        },
                        initializer,
                    },
                    error,
                )
            }
        }
    }

    pub fn typecheck_expression(
        &mut self,
        expression: &ParsedExpression,
        scope_id: ScopeId,
        safety: SafetyContext,
        hint: Option<TypeId>,
    ) -> (CheckedExpression, Option<Error>) {
        match expression {
            ParsedExpression::Null(_) => {
                let optional_record = self
                    .project
                    .find_record_in_scope(0, "Optional")
                    .expect("internal error: builtin record 'Optional' missing from the root scope");
                let type_id = self.project.find_or_add_type_id(CheckedType::GenericInstance(
                    optional_record,
                    vec![UNKNOWN_TYPE_ID],
                ));
                (CheckedExpression::Null(type_id), None)
            }
            ParsedExpression::Id(id) => match self.project.find_var_in_scope(scope_id, &id.value)
            {
                Some(var) => {
                    let (type_id, error) = self.unify_with_type_hint(var.type_id, hint, id.span);
                    (
                        CheckedExpression::Var(Spanned::new(
                            CheckedVariable {
                                name: var.name,
                                type_id,
                            },
                            id.span,
                        )),
                        error,
                    )
                }
                None => (
                    CheckedExpression::Var(Spanned::new(
                        CheckedVariable {
                            name: id.value.clone(),
                            type_id: UNKNOWN_TYPE_ID,
                        },
                        id.span,
                    )),
                    Some(Error::new(
                        format!("variable '{}' not found", id.value),
                        id.span,
                    )),
                ),
            },
            ParsedExpression::Int(value) => {
                let (_, error) = self.unify_with_type_hint(INT_TYPE_ID, hint, value.span);
                (CheckedExpression::Int(value.clone()), error)
            }
            ParsedExpression::String(value) => {
                let (_, error) = self.unify_with_type_hint(STRING_TYPE_ID, hint, value.span);
                (CheckedExpression::String(value.clone()), error)
            }
            ParsedExpression::Binary(binary) => {
                let (left, left_error) =
                    self.typecheck_expression(&binary.left, scope_id, safety, None);
                let (right, right_error) = self.typecheck_expression(
                    &binary.right,
                    scope_id,
                    safety,
                    Some(left.type_id()),
                );
                let mut error = left_error.or(right_error);

                let type_id = match binary.operator {
                    BinaryOperator::Equals => BOOL_TYPE_ID,
                };
                let (type_id, hint_error) = self.unify_with_type_hint(type_id, hint, binary.span);
                error = error.or(hint_error);

                (
                    CheckedExpression::BinaryOp {
                        left: Box::new(left),
                        op: binary.operator,
                        right: Box::new(right),
                        span: binary.span,
                        type_id,
                    },
                    error,
                )
            }
            ParsedExpression::If(if_expr) => {
                let (condition, condition_error) = self.typecheck_expression(
                    &if_expr.condition,
                    scope_id,
                    safety,
                    Some(BOOL_TYPE_ID),
                );
                let (then_branch, then_error) =
                    self.typecheck_expression(&if_expr.then_branch, scope_id, safety, hint);
                let mut error = condition_error.or(then_error);

                let else_branch = match &if_expr.else_branch {
                    Some(else_expr) => {
                        let (checked, else_error) =
                            self.typecheck_expression(else_expr, scope_id, safety, hint);
                        error = error.or(else_error);
                        Some(Box::new(checked))
                    }
                    None => None,
                };

                (
                    CheckedExpression::If {
                        condition: Box::new(condition),
                        then_branch: Box::new(then_branch),
                        else_branch,
                    },
                    error,
                )
            }
            ParsedExpression::Unary(unary) => {
                let (operand, mut error) =
                    self.typecheck_expression(&unary.operand, scope_id, safety, None);

                let type_id = match unary.operator {
                    UnaryOperator::Dereference => {
                        if safety != SafetyContext::Unsafe {
                            error = error.or(Some(Error::new(
                                "dereference requires an unsafe context",
                                unary.span,
                            )));
                        }
                        let operand_type = operand.type_id();
                        match &self.project.types[operand_type] {
                            CheckedType::RawPtr(subtype) => *subtype,
                            _ if operand_type == UNKNOWN_TYPE_ID => UNKNOWN_TYPE_ID,
                            _ => {
                                error = error.or(Some(Error::new(
                                    format!(
                                        "cannot dereference value of type {}",
                                        self.project.typename_for_type_id(operand_type)
                                    ),
                                    unary.span,
                                )));
                                UNKNOWN_TYPE_ID
                            }
                        }
                    }
                    UnaryOperator::AddressOf => self
                        .project
                        .find_or_add_type_id(CheckedType::RawPtr(operand.type_id())),
                };

                let (type_id, hint_error) = self.unify_with_type_hint(type_id, hint, unary.span);
                let error = error.or(hint_error);

                let op = match unary.operator {
                    UnaryOperator::Dereference => CheckedUnaryOperator::Dereference,
                    UnaryOperator::AddressOf => CheckedUnaryOperator::AddressOf,
                };

                (
                    CheckedExpression::UnaryOp {
                        operand: Box::new(operand),
                        op,
                        span: unary.span,
                        type_id,
                    },
                    error,
                )
            }
            ParsedExpression::Call(call) => self.typecheck_call(call, scope_id, safety, hint),
        }
    }

    /// Resolves a call target, checks the arguments positionally against the
    /// parameter types, and instantiates the return type from whatever
    /// generic bindings the arguments produced.
    fn typecheck_call(
        &mut self,
        call: &CallExpression,
        scope_id: ScopeId,
        safety: SafetyContext,
        hint: Option<TypeId>,
    ) -> (CheckedExpression, Option<Error>) {
        let ParsedExpression::Id(callee) = call.callee.as_ref() else {
            return (
                CheckedExpression::Null(UNKNOWN_TYPE_ID),
                Some(Error::new(
                    "only direct function calls are supported",
                    call.span,
                )),
            );
        };

        // A record name resolves to the constructor registered in the
        // record's own scope.
        let function_id = self
            .project
            .find_function_in_scope(scope_id, &callee.value)
            .or_else(|| {
                let record_id = self.project.find_record_in_scope(scope_id, &callee.value)?;
                let record_scope = self.project.records[record_id].scope_id;
                self.project
                    .find_function_in_scope(record_scope, &callee.value)
            });
        let Some(function_id) = function_id else {
            return (
                CheckedExpression::Null(UNKNOWN_TYPE_ID),
                Some(Error::new(
                    format!("function '{}' not found", callee.value),
                    callee.span,
                )),
            );
        };

        let function = self.project.functions[function_id].clone();
        let mut error = None;

        if call.arguments.len() != function.parameters.len() {
            error = Some(Error::new(
                format!(
                    "expected {} arguments, but got {} instead",
                    function.parameters.len(),
                    call.arguments.len()
                ),
                call.span,
            ));
        }

        let mut inferences = Inferences::new();
        let mut arguments = Vec::new();
        for (argument, parameter) in call.arguments.iter().zip(function.parameters.iter()) {
            if parameter.requires_label {
                match &argument.label {
                    None => {
                        error = error.or(Some(Error::new(
                            format!(
                                "argument for parameter '{}' must be labeled",
                                parameter.variable.name
                            ),
                            argument.expression.span(),
                        )));
                    }
                    Some(label) if label.value != parameter.variable.name => {
                        error = error.or(Some(Error::new(
                            format!(
                                "expected argument label '{}', but got '{}' instead",
                                parameter.variable.name, label.value
                            ),
                            label.span,
                        )));
                    }
                    Some(_) => {}
                }
            }

            let (checked, argument_error) =
                self.typecheck_expression(&argument.expression, scope_id, safety, None);
            error = error.or(argument_error);
            error = error.or(self.check_types_for_compat(
                parameter.variable.type_id,
                checked.type_id(),
                &mut inferences,
                argument.expression.span(),
            ));
            arguments.push(checked);
        }

        let type_id = self.substitute_typevars_in_type(function.return_type_id, &inferences);
        let (type_id, hint_error) = self.unify_with_type_hint(type_id, hint, call.span);
        let error = error.or(hint_error);

        (
            CheckedExpression::Call {
                function_id,
                arguments,
                span: call.span,
                type_id,
            },
            error,
        )
    }

    /// Reconciles an inferred type with the contextual expectation. An absent
    /// or Unknown hint accepts the type as-is; otherwise the two must unify,
    /// and whatever bindings the unification produced are applied.
    pub fn unify_with_type_hint(
        &mut self,
        type_id: TypeId,
        hint: Option<TypeId>,
        span: Span,
    ) -> (TypeId, Option<Error>) {
        let Some(hint) = hint else {
            return (type_id, None);
        };
        if hint == UNKNOWN_TYPE_ID {
            return (type_id, None);
        }

        let mut inferences = Inferences::new();
        if let Some(error) = self.check_types_for_compat(hint, type_id, &mut inferences, span) {
            return (type_id, Some(error));
        }

        (
            self.substitute_typevars_in_type(type_id, &inferences),
            None,
        )
    }

    /// The unification rule set. `lhs` is the expected side; a type variable
    /// on that side binds to `rhs` the first time and must match its binding
    /// exactly afterwards.
    pub fn check_types_for_compat(
        &mut self,
        lhs: TypeId,
        rhs: TypeId,
        inferences: &mut Inferences,
        span: Span,
    ) -> Option<Error> {
        let lhs_type = self.project.types[lhs].clone();

        match lhs_type {
            CheckedType::TypeVariable(_) => {
                if let Some(bound) = inferences.get(&lhs).copied() {
                    if bound == rhs {
                        None
                    } else {
                        Some(self.type_mismatch_error(bound, rhs, span))
                    }
                } else {
                    inferences.insert(lhs, rhs);
                    None
                }
            }
            CheckedType::GenericInstance(lhs_record, lhs_arguments) => {
                // Implicit wrap coercion: Optional[T] and WeakPtr[T] accept a
                // bare T.
                let optional = self.project.find_record_in_scope(0, "Optional");
                let weak_ptr = self.project.find_record_in_scope(0, "WeakPtr");
                if (Some(lhs_record) == optional || Some(lhs_record) == weak_ptr)
                    && lhs_arguments.len() == 1
                    && lhs_arguments[0] == rhs
                {
                    return None;
                }

                match self.project.types[rhs].clone() {
                    CheckedType::GenericInstance(rhs_record, rhs_arguments)
                        if rhs_record == lhs_record =>
                    {
                        if lhs_arguments.len() != rhs_arguments.len() {
                            return Some(Error::new(
                                format!(
                                    "mismatched number of generic arguments; expected {}, but got {} instead",
                                    lhs_arguments.len(),
                                    rhs_arguments.len()
                                ),
                                span,
                            ));
                        }
                        for (lhs_argument, rhs_argument) in
                            lhs_arguments.iter().zip(rhs_arguments.iter())
                        {
                            if let Some(error) = self.check_types_for_compat(
                                *lhs_argument,
                                *rhs_argument,
                                inferences,
                                span,
                            ) {
                                return Some(error);
                            }
                        }
                        None
                    }
                    _ => Some(self.type_mismatch_error(lhs, rhs, span)),
                }
            }
            CheckedType::Record(_) | CheckedType::Builtin | CheckedType::RawPtr(_) => {
                if rhs == lhs {
                    None
                } else {
                    Some(self.type_mismatch_error(lhs, rhs, span))
                }
            }
        }
    }

    /// Rewrites a type using accumulated bindings, repeating until the result
    /// stops changing so chained bindings resolve fully. A chain can be at
    /// most as long as the binding map, which also bounds the loop when a
    /// cyclic binding slips in (there is no occurs-check).
    pub fn substitute_typevars_in_type(
        &mut self,
        type_id: TypeId,
        inferences: &Inferences,
    ) -> TypeId {
        let mut current = type_id;
        for _ in 0..=inferences.len() {
            let next = self.substitute_typevars_once(current, inferences);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn substitute_typevars_once(&mut self, type_id: TypeId, inferences: &Inferences) -> TypeId {
        match self.project.types[type_id].clone() {
            CheckedType::TypeVariable(_) => inferences.get(&type_id).copied().unwrap_or(type_id),
            CheckedType::GenericInstance(record_id, arguments) => {
                let substituted = arguments
                    .iter()
                    .map(|argument| self.substitute_typevars_once(*argument, inferences))
                    .collect::<Vec<_>>();
                self.project
                    .find_or_add_type_id(CheckedType::GenericInstance(record_id, substituted))
            }
            CheckedType::Record(record_id) => {
                // A bare record that still declares generic parameters is
                // promoted to an instance over its (substituted) parameters.
                let generic_parameters = self.project.records[record_id].generic_parameters.clone();
                if generic_parameters.is_empty() {
                    type_id
                } else {
                    let substituted = generic_parameters
                        .iter()
                        .map(|parameter| self.substitute_typevars_once(*parameter, inferences))
                        .collect::<Vec<_>>();
                    self.project
                        .find_or_add_type_id(CheckedType::GenericInstance(record_id, substituted))
                }
            }
            CheckedType::RawPtr(subtype) => {
                let substituted = self.substitute_typevars_once(subtype, inferences);
                if substituted == subtype {
                    type_id
                } else {
                    self.project
                        .find_or_add_type_id(CheckedType::RawPtr(substituted))
                }
            }
            CheckedType::Builtin => type_id,
        }
    }

    /// Resolves a written type annotation in a scope.
    pub fn typecheck_typename(
        &mut self,
        ty: &ParsedType,
        scope_id: ScopeId,
    ) -> (TypeId, Option<Error>) {
        match ty {
            ParsedType::Undetermined => (UNKNOWN_TYPE_ID, None),
            ParsedType::Name(name) => match self.project.find_type_in_scope(scope_id, &name.value)
            {
                Some(type_id) => (type_id, None),
                None => (
                    UNKNOWN_TYPE_ID,
                    Some(Error::new(
                        format!("unknown type '{}'", name.value),
                        name.span,
                    )),
                ),
            },
            ParsedType::Str(_) => (STRING_TYPE_ID, None),
            ParsedType::Int(_) => (INT_TYPE_ID, None),
            ParsedType::Array(subtype, _) => {
                self.typecheck_builtin_wrapper(subtype, scope_id, "Array")
            }
            ParsedType::WeakPtr(subtype, _) => {
                self.typecheck_builtin_wrapper(subtype, scope_id, "WeakPtr")
            }
            ParsedType::Optional(subtype, _) => {
                self.typecheck_builtin_wrapper(subtype, scope_id, "Optional")
            }
            ParsedType::RawPtr(subtype, _) => {
                let (subtype_id, error) = self.typecheck_typename(subtype, scope_id);
                (
                    self.project
                        .find_or_add_type_id(CheckedType::RawPtr(subtype_id)),
                    error,
                )
            }
            ParsedType::GenericInstance(name, arguments) => {
                let mut error = None;
                let mut argument_ids = Vec::new();
                for argument in arguments {
                    let (argument_id, argument_error) =
                        self.typecheck_typename(argument, scope_id);
                    error = error.or(argument_error);
                    argument_ids.push(argument_id);
                }

                match self.project.find_record_in_scope(scope_id, &name.value) {
                    Some(record_id) => (
                        self.project.find_or_add_type_id(CheckedType::GenericInstance(
                            record_id,
                            argument_ids,
                        )),
                        error,
                    ),
                    None => (
                        UNKNOWN_TYPE_ID,
                        error.or(Some(Error::new(
                            format!("undefined type '{}'", name.value),
                            name.span,
                        ))),
                    ),
                }
            }
        }
    }

    fn typecheck_builtin_wrapper(
        &mut self,
        subtype: &ParsedType,
        scope_id: ScopeId,
        record_name: &str,
    ) -> (TypeId, Option<Error>) {
        let (subtype_id, error) = self.typecheck_typename(subtype, scope_id);
        let record_id = self
            .project
            .find_record_in_scope(0, record_name)
            .unwrap_or_else(|| {
                panic!(
                    "internal error: builtin record '{}' missing from the root scope",
                    record_name
                )
            });
        (
            self.project
                .find_or_add_type_id(CheckedType::GenericInstance(record_id, vec![subtype_id])),
            error,
        )
    }

    fn type_mismatch_error(&self, expected: TypeId, got: TypeId, span: Span) -> Error {
        Error::new(
            format!(
                "type mismatch; expected {}, but got {} instead",
                self.project.typename_for_type_id(expected),
                self.project.typename_for_type_id(got)
            ),
            span,
        )
    }
}
