use crate::ast::{BinaryOperator, Span, Spanned};
use crate::diagnostics::Error;

pub type TypeId = usize;
pub type RecordId = usize;
pub type FunctionId = usize;
pub type ScopeId = usize;

pub const UNKNOWN_TYPE_ID: TypeId = 0;
pub const UNIT_TYPE_ID: TypeId = 1;
pub const BOOL_TYPE_ID: TypeId = 2;
pub const INT_TYPE_ID: TypeId = 3;
pub const UINT_TYPE_ID: TypeId = 4;
pub const FLOAT_TYPE_ID: TypeId = 5;
pub const STRING_TYPE_ID: TypeId = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyContext {
    Safe,
    Unsafe,
}

/// A structural type descriptor. Equality compares full content, so the
/// interning table never conflates two generic instances that differ only in
/// their arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedType {
    Builtin,
    TypeVariable(String),
    GenericInstance(RecordId, Vec<TypeId>),
    Record(RecordId),
    RawPtr(TypeId),
}

#[derive(Debug, Clone)]
pub struct CheckedVariable {
    pub name: String,
    pub type_id: TypeId,
}

#[derive(Debug, Clone)]
pub struct CheckedVarDecl {
    pub name: String,
    pub type_id: TypeId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CheckedRecord {
    pub name: String,
    pub generic_parameters: Vec<TypeId>,
    pub fields: Vec<CheckedVarDecl>,
    pub scope_id: ScopeId,
}

#[derive(Debug, Clone)]
pub struct CheckedParameter {
    pub requires_label: bool,
    pub variable: CheckedVariable,
}

#[derive(Debug, Clone, Default)]
pub struct CheckedBlock {
    pub statements: Vec<CheckedStatement>,
}

#[derive(Debug, Clone)]
pub struct CheckedFunction {
    pub name: String,
    pub return_type_id: TypeId,
    pub parameters: Vec<CheckedParameter>,
    pub generic_parameters: Vec<TypeId>,
    pub scope_id: ScopeId,
    pub block: CheckedBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckedUnaryOperator {
    Dereference,
    AddressOf,
}

#[derive(Debug, Clone)]
pub enum CheckedExpression {
    Null(TypeId),
    Int(Spanned<i64>),
    String(Spanned<String>),
    Var(Spanned<CheckedVariable>),
    If {
        condition: Box<CheckedExpression>,
        then_branch: Box<CheckedExpression>,
        else_branch: Option<Box<CheckedExpression>>,
    },
    BinaryOp {
        left: Box<CheckedExpression>,
        op: BinaryOperator,
        right: Box<CheckedExpression>,
        span: Span,
        type_id: TypeId,
    },
    UnaryOp {
        operand: Box<CheckedExpression>,
        op: CheckedUnaryOperator,
        span: Span,
        type_id: TypeId,
    },
    Call {
        function_id: FunctionId,
        arguments: Vec<CheckedExpression>,
        span: Span,
        type_id: TypeId,
    },
}

impl CheckedExpression {
    pub fn type_id(&self) -> TypeId {
        match self {
            CheckedExpression::Null(type_id) => *type_id,
            CheckedExpression::Int(_) => INT_TYPE_ID,
            CheckedExpression::String(_) => STRING_TYPE_ID,
            CheckedExpression::Var(var) => var.value.type_id,
            CheckedExpression::If { condition, .. } => condition.type_id(),
            CheckedExpression::BinaryOp { type_id, .. } => *type_id,
            CheckedExpression::UnaryOp { type_id, .. } => *type_id,
            CheckedExpression::Call { type_id, .. } => *type_id,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CheckedStatement {
    Expression(CheckedExpression),
    VarDecl {
        decl: CheckedVarDecl,
        initializer: CheckedExpression,
    },
    Return(Option<CheckedExpression>),
}

/// One node of the lexical scope tree. Lookups walk from a scope to the root
/// through `parent`; scopes are never removed for the lifetime of a project.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub namespace_name: Option<String>,
    pub variables: Vec<CheckedVariable>,
    pub types: Vec<(String, TypeId)>,
    pub functions: Vec<(String, FunctionId)>,
    pub records: Vec<(String, RecordId)>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// True iff `other` is `own` or an ancestor of it. Placeholder for future
    /// visibility rules; nothing is gated on it yet.
    pub fn can_access(own: ScopeId, other: ScopeId, project: &Project) -> bool {
        if own == other {
            return true;
        }
        let mut scope = &project.scopes[own];
        while let Some(parent) = scope.parent {
            if parent == other {
                return true;
            }
            scope = &project.scopes[parent];
        }
        false
    }
}

/// The compilation unit's registries: interned types, declared records and
/// functions, and the scope tree. Everything else refers to these entries by
/// integer handle.
#[derive(Debug)]
pub struct Project {
    pub functions: Vec<CheckedFunction>,
    pub records: Vec<CheckedRecord>,
    pub scopes: Vec<Scope>,
    pub types: Vec<CheckedType>,
}

impl Project {
    pub fn new() -> Self {
        let mut project = Self {
            functions: Vec::new(),
            records: Vec::new(),
            scopes: vec![Scope::new(None)],
            // Reserved indices 0-6: unknown, unit, bool, int, uint, float, str.
            types: vec![CheckedType::Builtin; 7],
        };

        for (name, type_id) in [
            ("unit", UNIT_TYPE_ID),
            ("bool", BOOL_TYPE_ID),
            ("int", INT_TYPE_ID),
            ("uint", UINT_TYPE_ID),
            ("float", FLOAT_TYPE_ID),
            ("str", STRING_TYPE_ID),
        ] {
            project.scopes[0].types.push((name.to_string(), type_id));
        }

        project.add_builtin_record("Array");
        project.add_builtin_record("Optional");
        project.add_builtin_record("WeakPtr");

        project
    }

    /// Registers one of the well-known generic wrapper records in the root
    /// scope. These must exist before any `[T]`, `T?`, or `weak T` resolves.
    fn add_builtin_record(&mut self, name: &str) -> RecordId {
        let type_variable = self.find_or_add_type_id(CheckedType::TypeVariable("T".to_string()));
        let scope_id = self.create_scope(0);
        let record_id = self.records.len();
        self.records.push(CheckedRecord {
            name: name.to_string(),
            generic_parameters: vec![type_variable],
            fields: Vec::new(),
            scope_id,
        });
        self.scopes[0].records.push((name.to_string(), record_id));
        record_id
    }

    /// Returns the canonical handle for a descriptor, appending it if no
    /// structurally-equal entry exists yet. The same descriptor always maps
    /// to the same handle for the lifetime of the project.
    pub fn find_or_add_type_id(&mut self, ty: CheckedType) -> TypeId {
        if let Some(existing) = self.types.iter().position(|candidate| *candidate == ty) {
            return existing;
        }

        self.types.push(ty);
        self.types.len() - 1
    }

    /// Renders a human-readable name for diagnostics.
    pub fn typename_for_type_id(&self, type_id: TypeId) -> String {
        match &self.types[type_id] {
            CheckedType::Builtin => match type_id {
                UNIT_TYPE_ID => "unit".to_string(),
                BOOL_TYPE_ID => "bool".to_string(),
                INT_TYPE_ID => "int".to_string(),
                UINT_TYPE_ID => "uint".to_string(),
                FLOAT_TYPE_ID => "float".to_string(),
                STRING_TYPE_ID => "str".to_string(),
                _ => "<invalid>".to_string(),
            },
            CheckedType::TypeVariable(name) => name.clone(),
            CheckedType::GenericInstance(record_id, arguments) => {
                let mut output = self.records[*record_id].name.clone();
                output.push('[');
                for (index, argument) in arguments.iter().enumerate() {
                    if index != 0 {
                        output.push_str(", ");
                    }
                    output.push_str(&self.typename_for_type_id(*argument));
                }
                output.push(']');
                output
            }
            CheckedType::Record(record_id) => self.records[*record_id].name.clone(),
            CheckedType::RawPtr(subtype) => {
                format!("raw {}", self.typename_for_type_id(*subtype))
            }
        }
    }

    pub fn create_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope::new(Some(parent)));
        let scope_id = self.scopes.len() - 1;
        self.scopes[parent].children.push(scope_id);
        scope_id
    }

    pub fn add_var_to_scope(
        &mut self,
        scope_id: ScopeId,
        var: CheckedVariable,
        span: Span,
    ) -> Result<(), Error> {
        let scope = &mut self.scopes[scope_id];
        if scope.variables.iter().any(|existing| existing.name == var.name) {
            return Err(Error::new(
                format!("redefinition of variable {}", var.name),
                span,
            ));
        }

        scope.variables.push(var);
        Ok(())
    }

    pub fn find_var_in_scope(&self, scope_id: ScopeId, name: &str) -> Option<CheckedVariable> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(var) = scope.variables.iter().find(|var| var.name == name) {
                return Some(var.clone());
            }
            current = scope.parent;
        }
        None
    }

    pub fn add_type_to_scope(
        &mut self,
        scope_id: ScopeId,
        name: String,
        type_id: TypeId,
        span: Span,
    ) -> Result<(), Error> {
        let scope = &mut self.scopes[scope_id];
        if scope.types.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::new(format!("redefinition of type {}", name), span));
        }

        scope.types.push((name, type_id));
        Ok(())
    }

    pub fn find_type_in_scope(&self, scope_id: ScopeId, name: &str) -> Option<TypeId> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some((_, type_id)) = scope.types.iter().find(|(entry, _)| entry == name) {
                return Some(*type_id);
            }
            current = scope.parent;
        }
        None
    }

    pub fn add_function_to_scope(
        &mut self,
        scope_id: ScopeId,
        name: String,
        function_id: FunctionId,
        span: Span,
    ) -> Result<(), Error> {
        let scope = &mut self.scopes[scope_id];
        if scope.functions.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::new(
                format!("redefinition of function {}", name),
                span,
            ));
        }

        scope.functions.push((name, function_id));
        Ok(())
    }

    pub fn find_function_in_scope(&self, scope_id: ScopeId, name: &str) -> Option<FunctionId> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some((_, function_id)) =
                scope.functions.iter().find(|(entry, _)| entry == name)
            {
                return Some(*function_id);
            }
            current = scope.parent;
        }
        None
    }

    pub fn add_record_to_scope(
        &mut self,
        scope_id: ScopeId,
        name: String,
        record_id: RecordId,
        span: Span,
    ) -> Result<(), Error> {
        let scope = &mut self.scopes[scope_id];
        if scope.records.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::new(format!("redefinition of record {}", name), span));
        }

        scope.records.push((name, record_id));
        Ok(())
    }

    pub fn find_record_in_scope(&self, scope_id: ScopeId, name: &str) -> Option<RecordId> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some((_, record_id)) = scope.records.iter().find(|(entry, _)| entry == name) {
                return Some(*record_id);
            }
            current = scope.parent;
        }
        None
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
