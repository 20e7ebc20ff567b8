//! Transpile options and their validation.

use lazy_static::lazy_static;
use oxc_ast::ast::VariableDeclarationKind;
use oxc_span::SourceType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_VARIABLE_PREFIX: &str = "$$";
pub const DEFAULT_DECLARATION_TYPE: &str = "var";

lazy_static! {
    /// A prefix must itself be a complete JS identifier so that appending the
    /// counter keeps it one.
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAW OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranspileOptions {
    /// Text encoding used by the file entry points.
    pub encoding: String,
    pub variable_prefix: String,
    pub declaration_type: String,
    #[serde(alias = "parserExtensions")]
    pub parser: ParserOptions,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            variable_prefix: DEFAULT_VARIABLE_PREFIX.to_string(),
            declaration_type: DEFAULT_DECLARATION_TYPE.to_string(),
            parser: ParserOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Parse as an ES module instead of a classic script.
    pub module: bool,
    pub typescript: bool,
    /// Accepted for compatibility; markup support is always switched on.
    pub jsx: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            module: false,
            typescript: false,
            jsx: true,
        }
    }
}

impl TranspileOptions {
    /// Reads options from an arbitrary JSON value the way a JS caller would
    /// pass them: anything that is not an object yields the defaults, and a
    /// field of the wrong type keeps its default.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut options = Self::default();
        let Some(object) = value.as_object() else {
            return options;
        };

        if let Some(encoding) = object.get("encoding").and_then(|v| v.as_str()) {
            options.encoding = encoding.to_string();
        }
        if let Some(prefix) = object.get("variablePrefix").and_then(|v| v.as_str()) {
            options.variable_prefix = prefix.to_string();
        }
        if let Some(kind) = object.get("declarationType").and_then(|v| v.as_str()) {
            options.declaration_type = kind.to_string();
        }

        let parser = object
            .get("parser")
            .or_else(|| object.get("parserExtensions"))
            .and_then(|v| v.as_object());
        if let Some(parser) = parser {
            if let Some(module) = parser.get("module").and_then(|v| v.as_bool()) {
                options.parser.module = module;
            }
            if let Some(typescript) = parser.get("typescript").and_then(|v| v.as_bool()) {
                options.parser.typescript = typescript;
            }
        }

        options
    }

    /// Resolves the options used by one run. Never fails: unusable values are
    /// replaced by their defaults and reported in `fallbacks`.
    pub fn validate(&self) -> ValidatedOptions {
        let mut fallbacks = Vec::new();

        let declaration_kind = match DeclarationKind::from_name(&self.declaration_type) {
            Some(kind) => kind,
            None => {
                debug!(
                    requested = %self.declaration_type,
                    "unknown declarationType, using `{}`",
                    DEFAULT_DECLARATION_TYPE
                );
                fallbacks.push(OptionFallback::DeclarationType {
                    requested: self.declaration_type.clone(),
                });
                DeclarationKind::default()
            }
        };

        let variable_prefix = if IDENTIFIER_RE.is_match(&self.variable_prefix) {
            self.variable_prefix.clone()
        } else {
            debug!(
                requested = %self.variable_prefix,
                "unusable variablePrefix, using `{}`",
                DEFAULT_VARIABLE_PREFIX
            );
            fallbacks.push(OptionFallback::VariablePrefix {
                requested: self.variable_prefix.clone(),
            });
            DEFAULT_VARIABLE_PREFIX.to_string()
        };

        ValidatedOptions {
            encoding: self.encoding.clone(),
            variable_prefix,
            declaration_kind,
            source_type: self.parser.source_type(),
            fallbacks,
        }
    }
}

impl ParserOptions {
    /// Markup support is forced on regardless of `jsx`.
    pub fn source_type(&self) -> SourceType {
        SourceType::default()
            .with_module(self.module)
            .with_typescript(self.typescript)
            .with_jsx(true)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATED OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclarationKind {
    #[default]
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    /// Declaration forms accepted for `declarationType`.
    pub const ALL: [DeclarationKind; 3] = [
        DeclarationKind::Var,
        DeclarationKind::Let,
        DeclarationKind::Const,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }

    pub fn to_oxc(self) -> VariableDeclarationKind {
        match self {
            DeclarationKind::Var => VariableDeclarationKind::Var,
            DeclarationKind::Let => VariableDeclarationKind::Let,
            DeclarationKind::Const => VariableDeclarationKind::Const,
        }
    }
}

/// An option that was replaced by its default during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionFallback {
    DeclarationType { requested: String },
    VariablePrefix { requested: String },
}

#[derive(Debug, Clone)]
pub struct ValidatedOptions {
    /// Label read by the file entry points.
    pub encoding: String,
    pub variable_prefix: String,
    pub declaration_kind: DeclarationKind,
    pub source_type: SourceType,
    pub fallbacks: Vec<OptionFallback>,
}

impl ValidatedOptions {
    pub fn used_defaults(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let validated = TranspileOptions::default().validate();
        assert_eq!(validated.encoding, "utf-8");
        assert_eq!(validated.variable_prefix, "$$");
        assert_eq!(validated.declaration_kind, DeclarationKind::Var);
        assert!(!validated.used_defaults());
        assert!(validated.source_type.is_jsx());
    }

    #[test]
    fn test_allow_list_is_accepted() {
        for kind in DeclarationKind::ALL {
            let options = TranspileOptions {
                declaration_type: kind.as_str().to_string(),
                ..Default::default()
            };
            let validated = options.validate();
            assert_eq!(validated.declaration_kind, kind);
            assert!(validated.fallbacks.is_empty());
        }
    }

    #[test]
    fn test_from_name_is_exact() {
        assert_eq!(DeclarationKind::from_name("let"), Some(DeclarationKind::Let));
        assert_eq!(DeclarationKind::from_name("Let"), None);
        assert_eq!(DeclarationKind::from_name("using"), None);
    }

    #[test]
    fn test_invalid_declaration_type_falls_back() {
        let options = TranspileOptions {
            declaration_type: "using".to_string(),
            ..Default::default()
        };
        let validated = options.validate();
        assert_eq!(validated.declaration_kind, DeclarationKind::Var);
        assert_eq!(
            validated.fallbacks,
            vec![OptionFallback::DeclarationType {
                requested: "using".to_string()
            }]
        );
    }

    #[test]
    fn test_unusable_prefix_falls_back() {
        for prefix in ["", "1x", "a-b"] {
            let options = TranspileOptions {
                variable_prefix: prefix.to_string(),
                ..Default::default()
            };
            let validated = options.validate();
            assert_eq!(validated.variable_prefix, "$$");
            assert!(validated.used_defaults());
        }
    }

    #[test]
    fn test_custom_prefix_kept() {
        let options = TranspileOptions {
            variable_prefix: "_el".to_string(),
            ..Default::default()
        };
        assert_eq!(options.validate().variable_prefix, "_el");
    }

    #[test]
    fn test_jsx_cannot_be_disabled() {
        let options = TranspileOptions {
            parser: ParserOptions {
                module: true,
                typescript: false,
                jsx: false,
            },
            ..Default::default()
        };
        let source_type = options.validate().source_type;
        assert!(source_type.is_jsx());
        assert!(source_type.is_module());
    }

    #[test]
    fn test_from_json_non_object_is_default() {
        assert_eq!(
            TranspileOptions::from_json(&json!("nope")),
            TranspileOptions::default()
        );
        assert_eq!(
            TranspileOptions::from_json(&json!(null)),
            TranspileOptions::default()
        );
    }

    #[test]
    fn test_from_json_ignores_wrong_types() {
        let options = TranspileOptions::from_json(&json!({
            "variablePrefix": 42,
            "declarationType": "let",
            "parserExtensions": { "jsx": false, "module": true }
        }));
        assert_eq!(options.variable_prefix, "$$");
        assert_eq!(options.declaration_type, "let");
        assert!(options.parser.module);
        assert!(options.parser.jsx);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: TranspileOptions = serde_json::from_value(json!({
            "encoding": "latin1",
            "variablePrefix": "_n",
        }))
        .unwrap();
        assert_eq!(options.encoding, "latin1");
        assert_eq!(options.variable_prefix, "_n");
        assert_eq!(options.declaration_type, "var");
    }
}
