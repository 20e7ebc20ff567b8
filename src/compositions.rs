//! DOM compositions: one template per DOM operation the lowerer emits.

use lazy_static::lazy_static;
use oxc_ast::ast::{Expression, Statement};
use std::collections::{HashMap, HashSet};

use crate::builders::NodeBuilder;

lazy_static! {
    /// Attribute names that are written under a different DOM attribute name.
    static ref ATTRIBUTE_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("className", "class");
        m
    };

    /// Boolean DOM properties. Their presence always sets the property to
    /// `true`; the supplied value is dropped.
    static ref PROPERTIES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("required");
        s.insert("disabled");
        s
    };
}

pub fn is_property(name: &str) -> bool {
    PROPERTIES.contains(name)
}

/// The DOM attribute name an authored attribute is written to.
pub fn attribute_name(name: &str) -> &str {
    ATTRIBUTE_ALIASES.get(name).copied().unwrap_or(name)
}

#[derive(Clone, Copy)]
pub struct DomCompositions<'a> {
    pub build: NodeBuilder<'a>,
}

impl<'a> DomCompositions<'a> {
    pub fn new(build: NodeBuilder<'a>) -> Self {
        Self { build }
    }

    fn document(&self, method: &str) -> Expression<'a> {
        Expression::from(self.build.member(self.build.identifier("document"), method))
    }

    fn method(&self, variable: &str, method: &str) -> Expression<'a> {
        Expression::from(self.build.member(self.build.identifier(variable), method))
    }

    /// `var = document.createElement("tag")`
    pub fn create_element(&self, variable: &str, tag: &str) -> Statement<'a> {
        self.create_element_dynamic(variable, self.build.literal(tag))
    }

    /// `var = document.createElement(tag)` for a tag computed at runtime.
    pub fn create_element_dynamic(&self, variable: &str, tag: Expression<'a>) -> Statement<'a> {
        self.build
            .variable_declaration(variable, self.document("createElement"), [tag])
    }

    /// `var = document.createTextNode(expression)`
    pub fn create_text_node(&self, variable: &str, expression: Expression<'a>) -> Statement<'a> {
        self.build
            .variable_declaration(variable, self.document("createTextNode"), [expression])
    }

    /// `var = document.createDocumentFragment()`
    pub fn create_document_fragment(&self, variable: &str) -> Statement<'a> {
        self.build
            .variable_declaration(variable, self.document("createDocumentFragment"), [])
    }

    pub fn set_attribute(
        &self,
        variable: &str,
        attribute: &str,
        value: Expression<'a>,
    ) -> Statement<'a> {
        let mapped = attribute_name(attribute);

        if is_property(attribute) {
            self.build.assign(
                self.build.member(self.build.identifier(variable), mapped),
                self.build.literal(true),
            )
        } else {
            self.build.expression_statement(self.build.call(
                self.method(variable, "setAttribute"),
                [self.build.literal(mapped), value],
            ))
        }
    }

    /// Bulk attribute assignment for `{...bag}`; the bag is passed through as is.
    pub fn set_attributes(&self, variable: &str, bag: Expression<'a>) -> Statement<'a> {
        self.build
            .expression_statement(self.build.call(self.method(variable, "setAttributes"), [bag]))
    }

    pub fn add_event_listener(
        &self,
        variable: &str,
        event: &str,
        handler: Expression<'a>,
    ) -> Statement<'a> {
        self.build.expression_statement(self.build.call(
            self.method(variable, "addEventListener"),
            [self.build.literal(event), handler],
        ))
    }

    /// `parent.appendChild(child)`; children always live in a variable first.
    pub fn append_child(&self, parent: &str, child: &str) -> Statement<'a> {
        self.build.expression_statement(self.build.call(
            self.method(parent, "appendChild"),
            [self.build.identifier(child)],
        ))
    }

    /// Bulk append for expressions that evaluate to a collection of nodes.
    pub fn append_children(&self, parent: &str, expression: Expression<'a>) -> Statement<'a> {
        self.build.expression_statement(
            self.build
                .call(self.method(parent, "appendChildren"), [expression]),
        )
    }
}
