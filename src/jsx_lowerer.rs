//! JSX Lowering
//!
//! Every JSX element or fragment is replaced by a temporary variable. The DOM
//! calls that build it are hoisted in front of the statement that contained
//! the markup, in construction order: the element is created, its attributes
//! and listeners are applied, then each child is fully built and appended.
//!
//! Parameter defaults and class fields have no statement in their own scope
//! to hoist into. Markup there is built inside an arrow that is invoked on the
//! spot, so it runs once per evaluation and sees the parameters and `this` it
//! was written against.

use lazy_static::lazy_static;
use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::*;
use oxc_ast_visit::walk::{walk_jsx_element, walk_jsx_fragment};
use oxc_ast_visit::walk_mut::{
    walk_accessor_property, walk_arrow_function_expression, walk_expression,
    walk_formal_parameters, walk_function_body, walk_property_definition, walk_statement,
    walk_static_block,
};
use oxc_ast_visit::{Visit, VisitMut};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::builders::NodeBuilder;
use crate::compositions::{is_property, DomCompositions};
use crate::error::TranspileError;
use crate::names::NameAllocator;
use crate::options::ValidatedOptions;

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING CONVENTIONS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// `onClick`, `onKeyDown`: `on` followed by an uppercase letter.
    static ref EVENT_ATTR_RE: Regex = Regex::new(r"^on([A-Z][A-Za-z0-9]*)$").unwrap();

    static ref ENTITY_RE: Regex =
        Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|([A-Za-z][A-Za-z0-9]*));").unwrap();

    static ref NAMED_ENTITIES: HashMap<&'static str, char> = {
        let mut m = HashMap::new();
        m.insert("amp", '&');
        m.insert("lt", '<');
        m.insert("gt", '>');
        m.insert("quot", '"');
        m.insert("apos", '\'');
        m.insert("nbsp", '\u{a0}');
        m.insert("copy", '\u{a9}');
        m.insert("reg", '\u{ae}');
        m.insert("trade", '\u{2122}');
        m.insert("hellip", '\u{2026}');
        m.insert("mdash", '\u{2014}');
        m.insert("ndash", '\u{2013}');
        m.insert("laquo", '\u{ab}');
        m.insert("raquo", '\u{bb}');
        m.insert("middot", '\u{b7}');
        m.insert("times", '\u{d7}');
        m
    };
}

/// DOM event name for a listener attribute, `None` for ordinary attributes.
pub fn event_name(attribute: &str) -> Option<String> {
    EVENT_ATTR_RE
        .captures(attribute)
        .map(|caps| caps[1].to_lowercase())
}

/// Decodes HTML character references; unknown ones are left untouched.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let decoded = if let Some(hex) = caps.get(1) {
            u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
        } else if let Some(dec) = caps.get(2) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else {
            caps.get(3)
                .and_then(|name| NAMED_ENTITIES.get(name.as_str()).copied())
        };
        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// Applies JSX whitespace rules to a text child: every line is trimmed where
/// it touches a line break, blank lines disappear, and the remaining lines are
/// joined by single spaces. Returns `None` when nothing is left.
pub fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last = lines.len() - 1;
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        let spaced = line.replace('\t', " ");
        let mut trimmed = spaced.as_str();
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ');
        }
        if i != last {
            trimmed = trimmed.trim_end_matches(' ');
        }
        if !trimmed.is_empty() {
            text.push_str(trimmed);
            if i != last_non_empty {
                text.push(' ');
            }
        }
    }

    if text.is_empty() {
        None
    } else {
        Some(decode_entities(&text).into_owned())
    }
}

fn attribute_key(name: &JSXAttributeName<'_>) -> String {
    match name {
        JSXAttributeName::Identifier(id) => id.name.to_string(),
        JSXAttributeName::NamespacedName(ns) => format!("{}:{}", ns.namespace.name, ns.name.name),
    }
}

fn unparenthesized<'e, 'a>(expression: &'e Expression<'a>) -> &'e Expression<'a> {
    match expression {
        Expression::ParenthesizedExpression(paren) => unparenthesized(&paren.expression),
        other => other,
    }
}

fn is_markup(expression: &Expression<'_>) -> bool {
    matches!(
        unparenthesized(expression),
        Expression::JSXElement(_) | Expression::JSXFragment(_)
    )
}

fn is_map_call(call: &CallExpression<'_>) -> bool {
    matches!(
        &call.callee,
        Expression::StaticMemberExpression(member) if member.property.name == "map"
    )
}

fn yields_nodes(expression: &Expression<'_>) -> bool {
    is_markup(expression) || renders_nodes(expression)
}

/// Child expressions that evaluate to node collections rather than text:
/// array literals, `.map(...)` calls (optional chains included), and
/// conditionals or logical expressions with a branch that yields nodes.
fn renders_nodes(expression: &Expression<'_>) -> bool {
    match unparenthesized(expression) {
        Expression::ArrayExpression(_) => true,
        Expression::CallExpression(call) => is_map_call(call),
        Expression::ChainExpression(chain) => {
            matches!(&chain.expression, ChainElement::CallExpression(call) if is_map_call(call))
        }
        Expression::ConditionalExpression(cond) => {
            yields_nodes(&cond.consequent) || yields_nodes(&cond.alternate)
        }
        Expression::LogicalExpression(logical) => yields_nodes(&logical.right),
        _ => false,
    }
}

enum Tag<'a> {
    Static(String),
    Dynamic(Expression<'a>),
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX LOWERER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct JsxLowerer<'a> {
    pub dom: DomCompositions<'a>,
    names: NameAllocator,
    /// One frame per statement being visited; markup inside the statement
    /// emits into the innermost frame.
    frames: Vec<Vec<Statement<'a>>>,
    /// Set right before a statement-list item is visited, so that the item's
    /// hoisted statements go back to the list instead of a wrapping block.
    list_item: bool,
    /// Set inside parameter lists and class fields, where no statement of
    /// the same scope exists to hoist into.
    isolated: bool,
    pub errors: Vec<String>,
    lowered: usize,
}

impl<'a> JsxLowerer<'a> {
    pub fn new(allocator: &'a Allocator, options: &ValidatedOptions) -> Self {
        Self {
            dom: DomCompositions::new(NodeBuilder::new(allocator, options.declaration_kind)),
            names: NameAllocator::new(options.variable_prefix.clone()),
            frames: Vec::new(),
            list_item: false,
            isolated: false,
            errors: Vec::new(),
            lowered: 0,
        }
    }

    fn build(&self) -> NodeBuilder<'a> {
        self.dom.build
    }

    fn allocate(&mut self) -> &'a str {
        let name = self.names.next();
        self.build().atom(&name)
    }

    fn emit(&mut self, statement: Statement<'a>) {
        match self.frames.last_mut() {
            Some(frame) => frame.push(statement),
            None => self
                .errors
                .push("markup found outside of any statement".to_string()),
        }
    }

    /// Moves an expression out of the tree, leaving `null` in its slot.
    fn take(&self, slot: &mut Expression<'a>) -> Expression<'a> {
        std::mem::replace(slot, self.build().null())
    }

    /// Lowers `expression` in place if it is markup, returning the variable
    /// that now holds the node.
    fn lower_markup(&mut self, expression: &mut Expression<'a>) -> Option<&'a str> {
        let variable = match expression {
            Expression::JSXElement(element) => self.lower_element(element),
            Expression::JSXFragment(fragment) => self.lower_fragment(fragment),
            // `(<p/>)` collapses to the bare variable.
            Expression::ParenthesizedExpression(paren) if is_markup(&paren.expression) => {
                self.lower_markup(&mut paren.expression)?
            }
            _ => return None,
        };
        *expression = self.build().identifier(variable);
        Some(variable)
    }

    /// Lowers markup that must be built where it stands: construction goes
    /// into an arrow invoked in place of the markup, so every evaluation
    /// builds fresh nodes under the original scope.
    fn lower_isolated(&mut self, expression: &mut Expression<'a>) {
        let outer = std::mem::replace(&mut self.isolated, false);
        self.frames.push(Vec::new());
        let lowered = self.lower_markup(expression);
        let mut statements = self.frames.pop().unwrap_or_default();
        self.isolated = outer;

        if lowered.is_some() {
            statements.push(self.build().return_statement(self.take(expression)));
            *expression = self.build().immediately_invoked(statements);
        }
    }

    fn with_isolation(&mut self, isolated: bool, visit: impl FnOnce(&mut Self)) {
        let outer = std::mem::replace(&mut self.isolated, isolated);
        visit(self);
        self.isolated = outer;
    }

    fn lower_element(&mut self, element: &mut JSXElement<'a>) -> &'a str {
        let variable = self.allocate();
        self.lowered += 1;

        let create = match self.tag(&element.opening_element.name) {
            Tag::Static(name) => {
                trace!(variable, tag = %name, "lowering element");
                self.dom.create_element(variable, &name)
            }
            Tag::Dynamic(tag) => {
                trace!(variable, "lowering element with dynamic tag");
                self.dom.create_element_dynamic(variable, tag)
            }
        };
        self.emit(create);

        for item in element.opening_element.attributes.iter_mut() {
            self.lower_attribute(variable, item);
        }
        self.lower_children(variable, &mut element.children);

        variable
    }

    fn lower_fragment(&mut self, fragment: &mut JSXFragment<'a>) -> &'a str {
        let variable = self.allocate();
        self.lowered += 1;
        trace!(variable, "lowering fragment");

        self.emit(self.dom.create_document_fragment(variable));
        self.lower_children(variable, &mut fragment.children);

        variable
    }

    fn tag(&self, name: &JSXElementName<'a>) -> Tag<'a> {
        match name {
            JSXElementName::Identifier(id) => Tag::Static(id.name.to_string()),
            JSXElementName::NamespacedName(ns) => {
                Tag::Static(format!("{}:{}", ns.namespace.name, ns.name.name))
            }
            JSXElementName::IdentifierReference(id) => {
                Tag::Dynamic(self.build().identifier(&id.name))
            }
            JSXElementName::MemberExpression(member) => Tag::Dynamic(self.member_tag(member)),
            JSXElementName::ThisExpression(_) => Tag::Dynamic(self.build().this()),
        }
    }

    fn member_tag(&self, member: &JSXMemberExpression<'a>) -> Expression<'a> {
        let object = match &member.object {
            JSXMemberExpressionObject::IdentifierReference(id) => {
                self.build().identifier(&id.name)
            }
            JSXMemberExpressionObject::MemberExpression(inner) => self.member_tag(inner),
            JSXMemberExpressionObject::ThisExpression(_) => self.build().this(),
        };
        Expression::from(self.build().member(object, &member.property.name))
    }

    fn lower_attribute(&mut self, variable: &'a str, item: &mut JSXAttributeItem<'a>) {
        let attribute = match item {
            JSXAttributeItem::SpreadAttribute(spread) => {
                let mut bag = self.take(&mut spread.argument);
                self.visit_expression(&mut bag);
                self.emit(self.dom.set_attributes(variable, bag));
                return;
            }
            JSXAttributeItem::Attribute(attribute) => attribute,
        };

        let name = attribute_key(&attribute.name);

        if let Some(event) = event_name(&name) {
            let handler = match &mut attribute.value {
                Some(JSXAttributeValue::ExpressionContainer(container)) => {
                    container.expression.as_expression_mut().map(|slot| self.take(slot))
                }
                _ => None,
            };
            match handler {
                Some(mut handler) => {
                    self.visit_expression(&mut handler);
                    self.emit(self.dom.add_event_listener(variable, &event, handler));
                }
                None => self.errors.push(format!(
                    "event handler `{name}` must be given an expression, as in {name}={{handler}}"
                )),
            }
            return;
        }

        // Properties are forced to `true`; the authored value never runs.
        if is_property(&name) {
            self.emit(
                self.dom
                    .set_attribute(variable, &name, self.build().literal(true)),
            );
            return;
        }

        if let Some(value) = self.attribute_value(&name, &mut attribute.value) {
            self.emit(self.dom.set_attribute(variable, &name, value));
        }
    }

    fn attribute_value(
        &mut self,
        name: &str,
        value: &mut Option<JSXAttributeValue<'a>>,
    ) -> Option<Expression<'a>> {
        match value {
            None => Some(self.build().literal(true)),
            Some(JSXAttributeValue::StringLiteral(literal)) => {
                let decoded = decode_entities(&literal.value);
                Some(self.build().literal(&*decoded))
            }
            Some(JSXAttributeValue::ExpressionContainer(container)) => {
                match container.expression.as_expression_mut() {
                    Some(slot) => {
                        let mut expression = self.take(slot);
                        self.visit_expression(&mut expression);
                        Some(expression)
                    }
                    None => {
                        self.errors
                            .push(format!("attribute `{name}` has an empty expression"));
                        None
                    }
                }
            }
            Some(JSXAttributeValue::Element(element)) => {
                let node = self.lower_element(element);
                Some(self.build().identifier(node))
            }
            Some(JSXAttributeValue::Fragment(fragment)) => {
                let node = self.lower_fragment(fragment);
                Some(self.build().identifier(node))
            }
        }
    }

    fn lower_children(&mut self, parent: &'a str, children: &mut [JSXChild<'a>]) {
        for child in children.iter_mut() {
            match child {
                JSXChild::Text(text) => {
                    if let Some(cleaned) = clean_jsx_text(&text.value) {
                        let node = self.allocate();
                        self.emit(
                            self.dom
                                .create_text_node(node, self.build().literal(cleaned.as_str())),
                        );
                        self.emit(self.dom.append_child(parent, node));
                    }
                }
                JSXChild::Element(element) => {
                    let node = self.lower_element(element);
                    self.emit(self.dom.append_child(parent, node));
                }
                JSXChild::Fragment(fragment) => {
                    let node = self.lower_fragment(fragment);
                    self.emit(self.dom.append_child(parent, node));
                }
                JSXChild::ExpressionContainer(container) => {
                    // `{}` and `{/* comment */}` render nothing.
                    if let Some(slot) = container.expression.as_expression_mut() {
                        let expression = self.take(slot);
                        self.lower_expression_child(parent, expression);
                    }
                }
                JSXChild::Spread(spread) => {
                    let mut expression = self.take(&mut spread.expression);
                    self.visit_expression(&mut expression);
                    self.emit(self.dom.append_children(parent, expression));
                }
            }
        }
    }

    fn lower_expression_child(&mut self, parent: &'a str, mut expression: Expression<'a>) {
        if is_markup(&expression) {
            self.visit_expression(&mut expression);
            if let Expression::Identifier(id) = unparenthesized(&expression) {
                let node = id.name.to_string();
                self.emit(self.dom.append_child(parent, &node));
                return;
            }
        }

        if renders_nodes(&expression) {
            self.visit_expression(&mut expression);
            self.emit(self.dom.append_children(parent, expression));
            return;
        }

        self.visit_expression(&mut expression);
        let node = self.allocate();
        self.emit(self.dom.create_text_node(node, expression));
        self.emit(self.dom.append_child(parent, node));
    }
}

impl<'a> VisitMut<'a> for JsxLowerer<'a> {
    /// Rebuilds the list with each statement preceded by what it hoisted.
    fn visit_statements(&mut self, statements: &mut ArenaVec<'a, Statement<'a>>) {
        let mut hoisted = Vec::with_capacity(statements.len());
        for statement in statements.iter_mut() {
            self.frames.push(Vec::new());
            self.list_item = true;
            self.visit_statement(statement);
            hoisted.push(self.frames.pop().unwrap_or_default());
        }

        if hoisted.iter().all(Vec::is_empty) {
            return;
        }

        let total = statements.len() + hoisted.iter().map(Vec::len).sum::<usize>();
        let mut rebuilt = self.build().ast.vec_with_capacity(total);
        for (statement, before) in statements.iter_mut().zip(hoisted) {
            for emitted in before {
                rebuilt.push(emitted);
            }
            rebuilt.push(std::mem::replace(statement, self.build().empty_statement()));
        }
        *statements = rebuilt;
    }

    fn visit_statement(&mut self, statement: &mut Statement<'a>) {
        if std::mem::take(&mut self.list_item) {
            walk_statement(self, statement);
            return;
        }

        // A lone body such as `if (x) f(<p/>);` gets a block so construction
        // stays under the same control flow.
        self.frames.push(Vec::new());
        walk_statement(self, statement);
        let hoisted = self.frames.pop().unwrap_or_default();
        if !hoisted.is_empty() {
            let original = std::mem::replace(statement, self.build().empty_statement());
            *statement = self
                .build()
                .block(hoisted.into_iter().chain(std::iter::once(original)));
        }
    }

    fn visit_labeled_statement(&mut self, statement: &mut LabeledStatement<'a>) {
        // Hoist above the label so `continue label` keeps its target.
        self.list_item = true;
        self.visit_statement(&mut statement.body);
    }

    fn visit_arrow_function_expression(&mut self, arrow: &mut ArrowFunctionExpression<'a>) {
        walk_arrow_function_expression(self, arrow);

        if !arrow.expression || arrow.body.statements.len() < 2 {
            return;
        }
        let value = match arrow.body.statements.last_mut() {
            Some(Statement::ExpressionStatement(statement)) => {
                self.take(&mut statement.expression)
            }
            _ => return,
        };
        if let Some(last) = arrow.body.statements.last_mut() {
            *last = self.build().return_statement(value);
        }
        arrow.expression = false;
    }

    fn visit_formal_parameters(&mut self, params: &mut FormalParameters<'a>) {
        self.with_isolation(true, |this| walk_formal_parameters(this, params));
    }

    fn visit_property_definition(&mut self, property: &mut PropertyDefinition<'a>) {
        self.with_isolation(true, |this| walk_property_definition(this, property));
    }

    fn visit_accessor_property(&mut self, property: &mut AccessorProperty<'a>) {
        self.with_isolation(true, |this| walk_accessor_property(this, property));
    }

    fn visit_function_body(&mut self, body: &mut FunctionBody<'a>) {
        self.with_isolation(false, |this| walk_function_body(this, body));
    }

    fn visit_static_block(&mut self, block: &mut StaticBlock<'a>) {
        self.with_isolation(false, |this| walk_static_block(this, block));
    }

    fn visit_expression(&mut self, expression: &mut Expression<'a>) {
        if self.isolated && is_markup(expression) {
            self.lower_isolated(expression);
            return;
        }
        if self.lower_markup(expression).is_none() {
            walk_expression(self, expression);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP AUDIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Counts markup nodes still reachable from a program.
#[derive(Debug, Default)]
pub struct MarkupAudit {
    pub remaining: usize,
}

impl<'a> Visit<'a> for MarkupAudit {
    fn visit_jsx_element(&mut self, element: &JSXElement<'a>) {
        self.remaining += 1;
        walk_jsx_element(self, element);
    }

    fn visit_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) {
        self.remaining += 1;
        walk_jsx_fragment(self, fragment);
    }
}

/// Lowers all markup in `program`. On error the program is left half-lowered
/// and must be discarded.
pub fn lower_program<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
    options: &ValidatedOptions,
) -> Result<(), TranspileError> {
    let mut lowerer = JsxLowerer::new(allocator, options);
    lowerer.visit_program(program);

    let lowered = lowerer.lowered;
    let names = lowerer.names.allocated();
    if let Some(message) = lowerer.errors.into_iter().next() {
        return Err(TranspileError::translation(message));
    }

    let mut audit = MarkupAudit::default();
    audit.visit_program(program);
    if audit.remaining > 0 {
        return Err(TranspileError::translation(format!(
            "{} markup node(s) left after lowering",
            audit.remaining
        )));
    }

    debug!(lowered, names, "lowered markup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_names() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onKeyDown").as_deref(), Some("keydown"));
        assert_eq!(event_name("one"), None);
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("className"), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_clean_text_single_line_kept() {
        assert_eq!(clean_jsx_text("Hello").as_deref(), Some("Hello"));
        assert_eq!(clean_jsx_text(" - ").as_deref(), Some(" - "));
    }

    #[test]
    fn test_clean_text_multiline_joined() {
        assert_eq!(
            clean_jsx_text("\n    Hello\n    world\n  ").as_deref(),
            Some("Hello world")
        );
        assert_eq!(
            clean_jsx_text("Hello\r\n\tthere").as_deref(),
            Some("Hello there")
        );
    }

    #[test]
    fn test_clean_text_blank_dropped() {
        assert_eq!(clean_jsx_text("\n    \n  "), None);
        assert_eq!(clean_jsx_text(""), None);
    }

    #[test]
    fn test_clean_text_decodes_entities() {
        assert_eq!(
            clean_jsx_text("Tom &amp; Jerry").as_deref(),
            Some("Tom & Jerry")
        );
    }
}
