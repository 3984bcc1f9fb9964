use crate::ast::{
    ParsedExpression, ParsedFunction, ParsedNamespace, ParsedRecord, ParsedStatement, ParsedType,
    ParsedVarDecl, UnaryOperator,
};

/// Renders a parsed tree back to an indented textual form, for `--emit ast`.
pub fn render_namespace(namespace: &ParsedNamespace) -> String {
    let mut printer = AstPrinter::default();
    printer.namespace(namespace);
    printer.output
}

#[derive(Default)]
struct AstPrinter {
    output: String,
    indent: usize,
}

impl AstPrinter {
    fn namespace(&mut self, namespace: &ParsedNamespace) {
        for child in &namespace.namespaces {
            self.line(&format!(
                "namespace {}:",
                child.name.as_deref().unwrap_or("<anonymous>")
            ));
            self.indent += 1;
            self.namespace(child);
            self.indent -= 1;
        }
        for record in &namespace.records {
            self.record(record);
        }
        for function in &namespace.functions {
            self.function(function);
        }
    }

    fn record(&mut self, record: &ParsedRecord) {
        let mut header = format!("object {}", record.name.value);
        if !record.generic_parameters.is_empty() {
            header.push('[');
            for (index, parameter) in record.generic_parameters.iter().enumerate() {
                if index != 0 {
                    header.push_str(", ");
                }
                header.push_str(&parameter.value);
            }
            header.push(']');
        }
        if !record.interfaces.is_empty() {
            header.push('(');
            for (index, interface) in record.interfaces.iter().enumerate() {
                if index != 0 {
                    header.push_str(", ");
                }
                header.push_str(&interface.value);
            }
            header.push(')');
        }
        if let Some(parent) = &record.parent {
            header.push_str(" > ");
            header.push_str(&parent.value);
        }
        header.push(':');
        self.line(&header);

        self.indent += 1;
        for field in &record.fields {
            self.field(field);
        }
        for method in &record.methods {
            self.function(method);
        }
        self.indent -= 1;
    }

    fn field(&mut self, field: &ParsedVarDecl) {
        let mut line = format!("{} {}", type_repr(&field.ty), field.name.value);
        if let Some(default) = &field.default_value {
            line.push_str(" = ");
            line.push_str(&expression_repr(default));
        }
        self.line(&line);
    }

    fn function(&mut self, function: &ParsedFunction) {
        let mut header = String::new();
        if function.is_unsafe {
            header.push_str("unsafe ");
        }
        header.push_str("fun ");
        header.push_str(&function.name.value);
        if !function.generic_parameters.is_empty() {
            header.push('[');
            for (index, parameter) in function.generic_parameters.iter().enumerate() {
                if index != 0 {
                    header.push_str(", ");
                }
                header.push_str(&parameter.value);
            }
            header.push(']');
        }
        header.push('(');
        for (index, parameter) in function.parameters.iter().enumerate() {
            if index != 0 {
                header.push_str(", ");
            }
            header.push_str(&format!(
                "{} {}",
                type_repr(&parameter.ty),
                parameter.name.value
            ));
        }
        header.push(')');
        if let Some(return_type) = &function.return_type {
            header.push_str(" > ");
            header.push_str(&type_repr(return_type));
        }
        header.push(':');
        self.line(&header);

        self.indent += 1;
        for statement in &function.body.statements {
            self.statement(statement);
        }
        self.indent -= 1;
    }

    fn statement(&mut self, statement: &ParsedStatement) {
        match statement {
            ParsedStatement::Expression(expression) => {
                let line = expression_repr(expression);
                self.line(&line);
            }
            ParsedStatement::Var(decl) => {
                let mut line = format!("var {} {}", type_repr(&decl.ty), decl.name.value);
                if let Some(value) = &decl.default_value {
                    line.push_str(" = ");
                    line.push_str(&expression_repr(value));
                }
                self.line(&line);
            }
            ParsedStatement::Return { value, .. } => {
                let mut line = String::from("return");
                if let Some(value) = value {
                    line.push(' ');
                    line.push_str(&expression_repr(value));
                }
                self.line(&line);
            }
        }
    }

    fn line(&mut self, contents: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(contents);
        self.output.push('\n');
    }
}

fn expression_repr(expression: &ParsedExpression) -> String {
    match expression {
        ParsedExpression::Null(_) => "null".to_string(),
        ParsedExpression::Id(id) => id.value.clone(),
        ParsedExpression::Int(value) => value.value.to_string(),
        ParsedExpression::String(value) => format!("\"{}\"", value.value),
        ParsedExpression::Call(call) => {
            let mut output = expression_repr(&call.callee);
            output.push('(');
            for (index, argument) in call.arguments.iter().enumerate() {
                if index != 0 {
                    output.push_str(", ");
                }
                if let Some(label) = &argument.label {
                    output.push_str(&label.value);
                    output.push_str(": ");
                }
                output.push_str(&expression_repr(&argument.expression));
            }
            output.push(')');
            output
        }
        ParsedExpression::If(if_expr) => {
            let mut output = format!(
                "if {} then {}",
                expression_repr(&if_expr.condition),
                expression_repr(&if_expr.then_branch)
            );
            if let Some(else_branch) = &if_expr.else_branch {
                output.push_str(" else ");
                output.push_str(&expression_repr(else_branch));
            }
            output
        }
        ParsedExpression::Unary(unary) => {
            let sigil = match unary.operator {
                UnaryOperator::Dereference => "*",
                UnaryOperator::AddressOf => "&",
            };
            format!("{}{}", sigil, expression_repr(&unary.operand))
        }
        ParsedExpression::Binary(binary) => format!(
            "{} == {}",
            expression_repr(&binary.left),
            expression_repr(&binary.right)
        ),
    }
}

fn type_repr(ty: &ParsedType) -> String {
    match ty {
        ParsedType::Undetermined => "<undetermined>".to_string(),
        ParsedType::Name(name) => name.value.clone(),
        ParsedType::Str(_) => "str".to_string(),
        ParsedType::Int(_) => "int".to_string(),
        ParsedType::Array(subtype, _) => format!("[{}]", type_repr(subtype)),
        ParsedType::RawPtr(subtype, _) => format!("raw {}", type_repr(subtype)),
        ParsedType::WeakPtr(subtype, _) => format!("weak {}", type_repr(subtype)),
        ParsedType::Optional(subtype, _) => format!("{}?", type_repr(subtype)),
        ParsedType::GenericInstance(name, arguments) => {
            let mut output = name.value.clone();
            output.push('[');
            for (index, argument) in arguments.iter().enumerate() {
                if index != 0 {
                    output.push_str(", ");
                }
                output.push_str(&type_repr(argument));
            }
            output.push(']');
            output
        }
    }
}
