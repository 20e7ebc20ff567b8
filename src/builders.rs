//! Node builders: the small vocabulary of statement and expression shapes the
//! DOM compositions are assembled from. None of these know anything about
//! markup.

use oxc_allocator::{Allocator, Box as oxc_box};
use oxc_ast::ast::*;
use oxc_ast::{AstBuilder, NONE};
use oxc_span::SPAN;

use crate::options::DeclarationKind;

/// A literal value accepted by [`NodeBuilder::literal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'s> {
    String(&'s str),
    Boolean(bool),
}

impl<'s> From<&'s str> for Literal<'s> {
    fn from(value: &'s str) -> Self {
        Literal::String(value)
    }
}

impl From<bool> for Literal<'_> {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

#[derive(Clone, Copy)]
pub struct NodeBuilder<'a> {
    pub ast: AstBuilder<'a>,
    declaration_kind: VariableDeclarationKind,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(allocator: &'a Allocator, declaration_kind: DeclarationKind) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            declaration_kind: declaration_kind.to_oxc(),
        }
    }

    /// Copies `value` into the arena so it can back an AST atom.
    pub fn atom(&self, value: &str) -> &'a str {
        self.ast.allocator.alloc_str(value)
    }

    pub fn identifier(&self, name: &str) -> Expression<'a> {
        self.ast.expression_identifier(SPAN, self.atom(name))
    }

    pub fn literal<'s>(&self, value: impl Into<Literal<'s>>) -> Expression<'a> {
        match value.into() {
            Literal::String(s) => self.ast.expression_string_literal(SPAN, self.atom(s), None),
            Literal::Boolean(b) => self.ast.expression_boolean_literal(SPAN, b),
        }
    }

    pub fn null(&self) -> Expression<'a> {
        self.ast.expression_null_literal(SPAN)
    }

    pub fn this(&self) -> Expression<'a> {
        self.ast.expression_this(SPAN)
    }

    /// `object.property`
    pub fn member(&self, object: Expression<'a>, property: &str) -> MemberExpression<'a> {
        self.ast.member_expression_static(
            SPAN,
            object,
            self.ast.identifier_name(SPAN, self.atom(property)),
            false,
        )
    }

    /// `callee(args...)`
    pub fn call(
        &self,
        callee: Expression<'a>,
        args: impl IntoIterator<Item = Expression<'a>>,
    ) -> Expression<'a> {
        let args = self.ast.vec_from_iter(args.into_iter().map(Argument::from));
        self.ast.expression_call(
            SPAN,
            callee,
            None::<oxc_box<TSTypeParameterInstantiation>>,
            args,
            false,
        )
    }

    pub fn expression_statement(&self, expression: Expression<'a>) -> Statement<'a> {
        self.ast.statement_expression(SPAN, expression)
    }

    /// `target = value;`
    pub fn assign(&self, target: MemberExpression<'a>, value: Expression<'a>) -> Statement<'a> {
        let left = SimpleAssignmentTarget::from(target);
        self.expression_statement(self.ast.expression_assignment(
            SPAN,
            AssignmentOperator::Assign,
            AssignmentTarget::from(left),
            value,
        ))
    }

    /// `<kind> name = callee(args...);` using the run's declaration kind.
    pub fn variable_declaration(
        &self,
        name: &str,
        callee: Expression<'a>,
        args: impl IntoIterator<Item = Expression<'a>>,
    ) -> Statement<'a> {
        let id = BindingPattern::BindingIdentifier(
            self.ast
                .alloc(self.ast.binding_identifier(SPAN, self.atom(name))),
        );
        let init = self.call(callee, args);
        let declarator = self.ast.variable_declarator(
            SPAN,
            self.declaration_kind,
            id,
            None::<oxc_box<TSTypeAnnotation>>,
            Some(init),
            false,
        );
        Statement::VariableDeclaration(self.ast.alloc_variable_declaration(
            SPAN,
            self.declaration_kind,
            self.ast.vec1(declarator),
            false,
        ))
    }

    pub fn return_statement(&self, argument: Expression<'a>) -> Statement<'a> {
        self.ast.statement_return(SPAN, Some(argument))
    }

    pub fn block(&self, body: impl IntoIterator<Item = Statement<'a>>) -> Statement<'a> {
        self.ast.statement_block(SPAN, self.ast.vec_from_iter(body))
    }

    /// `(() => { body })()`. Arrows keep the surrounding `this`, `arguments`
    /// and parameter scope, so the body sees exactly what the replaced
    /// expression saw.
    pub fn immediately_invoked(
        &self,
        body: impl IntoIterator<Item = Statement<'a>>,
    ) -> Expression<'a> {
        let params = self.ast.alloc_formal_parameters(
            SPAN,
            FormalParameterKind::ArrowFormalParameters,
            self.ast.vec(),
            NONE,
        );
        let body = self
            .ast
            .alloc_function_body(SPAN, self.ast.vec(), self.ast.vec_from_iter(body));
        let arrow = self
            .ast
            .expression_arrow_function(SPAN, false, false, NONE, params, NONE, body);
        self.ast.expression_call(
            SPAN,
            self.ast.expression_parenthesized(SPAN, arrow),
            NONE,
            self.ast.vec(),
            false,
        )
    }

    /// Placeholder left behind when a statement is moved out of its slot.
    pub fn empty_statement(&self) -> Statement<'a> {
        self.ast.statement_empty(SPAN)
    }
}

/// Renders loose statements through the code generator, one program per call.
#[cfg(test)]
pub(crate) fn render_statements<'a>(
    allocator: &'a Allocator,
    statements: impl IntoIterator<Item = Statement<'a>>,
) -> String {
    use oxc_codegen::Codegen;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    let mut program = Parser::new(allocator, "", SourceType::default())
        .parse()
        .program;
    for statement in statements {
        program.body.push(statement);
    }
    Codegen::new().build(&program).code
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(code: &str) -> Vec<String> {
        code.lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn test_variable_declaration() {
        let allocator = Allocator::default();
        let build = NodeBuilder::new(&allocator, DeclarationKind::Var);
        let callee = Expression::from(build.member(build.identifier("document"), "createElement"));
        let stmt = build.variable_declaration("$$0", callee, [build.literal("div")]);

        assert_eq!(
            lines(&render_statements(&allocator, [stmt])),
            vec![r#"var $$0 = document.createElement("div");"#]
        );
    }

    #[test]
    fn test_declaration_kind_follows_options() {
        let allocator = Allocator::default();
        let build = NodeBuilder::new(&allocator, DeclarationKind::Const);
        let stmt = build.variable_declaration("x", build.identifier("make"), []);

        assert_eq!(
            lines(&render_statements(&allocator, [stmt])),
            vec!["const x = make();"]
        );
    }

    #[test]
    fn test_assignment_and_call_statements() {
        let allocator = Allocator::default();
        let build = NodeBuilder::new(&allocator, DeclarationKind::Var);

        let assign = build.assign(build.member(build.identifier("el"), "hidden"), build.literal(true));
        let call = build.expression_statement(build.call(
            Expression::from(build.member(build.identifier("el"), "focus")),
            [],
        ));

        assert_eq!(
            lines(&render_statements(&allocator, [assign, call])),
            vec!["el.hidden = true;", "el.focus();"]
        );
    }

    #[test]
    fn test_immediately_invoked_arrow() {
        let allocator = Allocator::default();
        let build = NodeBuilder::new(&allocator, DeclarationKind::Var);
        let value = build.immediately_invoked([
            build.variable_declaration("$$0", build.identifier("make"), []),
            build.return_statement(build.identifier("$$0")),
        ]);
        let rendered = render_statements(&allocator, [build.expression_statement(value)]);
        let lines = lines(&rendered);

        assert_eq!(lines.len(), 4, "got:\n{}", rendered);
        assert!(lines[0].contains("() => {"), "got:\n{}", rendered);
        assert_eq!(lines[1], "var $$0 = make();");
        assert_eq!(lines[2], "return $$0;");
        assert!(lines[3].starts_with('}') && lines[3].ends_with("();"));
    }

    #[test]
    fn test_literal_conversions() {
        assert_eq!(Literal::from("a"), Literal::String("a"));
        assert_eq!(Literal::from(false), Literal::Boolean(false));
    }
}
