//! Placeholder substitution over nested structures
//!
//! Rewrites an arbitrary nesting of mappings, sequences and scalars by
//! replacing placeholder markers in string scalars. The delimiter
//! convention is selected per call; a string is never scanned for more
//! than one convention at a time.

use crate::config::{Config, ConfigValue};
use crate::error::{TemplateError, TemplateResult};
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;

/// A placeholder delimiter convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterStyle {
    /// `$(NAME)`, used in staging manifests and path templates
    DollarParen,

    /// `${NAME}`, used in shell-flavored templates
    DollarCurly,

    /// `@[NAME]`, used in model-control files
    AtSquare,

    /// `@<NAME>`, used in table fragments
    AtAngle,
}

impl DelimiterStyle {
    /// All supported conventions
    pub const ALL: &'static [DelimiterStyle] = &[
        DelimiterStyle::DollarParen,
        DelimiterStyle::DollarCurly,
        DelimiterStyle::AtSquare,
        DelimiterStyle::AtAngle,
    ];

    /// Parse a style name as given on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dollar-paren" => Some(DelimiterStyle::DollarParen),
            "dollar-curly" => Some(DelimiterStyle::DollarCurly),
            "at-square" => Some(DelimiterStyle::AtSquare),
            "at-angle" => Some(DelimiterStyle::AtAngle),
            _ => None,
        }
    }

    /// Regex matching a well-formed placeholder of this style.
    ///
    /// An opening marker with no closing marker (or a non-identifier
    /// between the markers) does not match and is left as literal text.
    fn pattern(&self) -> Regex {
        let pattern = match self {
            DelimiterStyle::DollarParen => r"\$\(([A-Za-z_][A-Za-z0-9_]*)\)",
            DelimiterStyle::DollarCurly => r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}",
            DelimiterStyle::AtSquare => r"@\[([A-Za-z_][A-Za-z0-9_]*)\]",
            DelimiterStyle::AtAngle => r"@<([A-Za-z_][A-Za-z0-9_]*)>",
        };
        Regex::new(pattern).unwrap()
    }
}

/// Named value lookup for placeholder resolution
pub trait Resolve {
    /// Resolve a placeholder name to a value, or report it unknown
    fn resolve(&self, name: &str) -> Option<ConfigValue>;
}

impl Resolve for Config {
    fn resolve(&self, name: &str) -> Option<ConfigValue> {
        self.get(name).cloned()
    }
}

impl Resolve for HashMap<String, ConfigValue> {
    fn resolve(&self, name: &str) -> Option<ConfigValue> {
        self.get(name).cloned()
    }
}

/// An overlay resolver: task-derived values shadow the captured config
pub struct Layered<'a> {
    pub over: &'a HashMap<String, ConfigValue>,
    pub under: &'a Config,
}

impl Resolve for Layered<'_> {
    fn resolve(&self, name: &str) -> Option<ConfigValue> {
        self.over
            .get(name)
            .cloned()
            .or_else(|| self.under.get(name).cloned())
    }
}

/// Stringification policy for substituted scalars.
///
/// Model-control files are Fortran namelist flavored, so booleans default
/// to `.true.`/`.false.`; callers rendering other formats supply their own
/// literals.
#[derive(Debug, Clone)]
pub struct ValueFormat {
    pub true_lit: &'static str,
    pub false_lit: &'static str,
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat {
            true_lit: ".true.",
            false_lit: ".false.",
        }
    }
}

impl ValueFormat {
    /// Plain `true`/`false` booleans
    pub fn plain() -> Self {
        ValueFormat {
            true_lit: "true",
            false_lit: "false",
        }
    }

    /// Render a scalar into template text
    pub fn render(&self, value: &ConfigValue) -> String {
        match value {
            ConfigValue::Bool(true) => self.true_lit.to_string(),
            ConfigValue::Bool(false) => self.false_lit.to_string(),
            other => other.to_string(),
        }
    }
}

/// Substitute every placeholder of one style in a single string.
///
/// All placeholders are resolved or the call fails; a missing key is never
/// passed through silently.
pub fn substitute_str(
    s: &str,
    style: DelimiterStyle,
    resolver: &dyn Resolve,
    format: &ValueFormat,
) -> TemplateResult<String> {
    let re = style.pattern();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;

    for caps in re.captures_iter(s) {
        let whole = caps.get(0).unwrap();
        let name = &caps[1];

        let value = resolver
            .resolve(name)
            .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                name: name.to_string(),
                within: s.to_string(),
            })?;

        out.push_str(&s[last..whole.start()]);
        out.push_str(&format.render(&value));
        last = whole.end();
    }

    out.push_str(&s[last..]);
    Ok(out)
}

/// Substitute placeholders throughout a nested structure.
///
/// Traversal is recursive and structure-preserving: mappings keep their
/// key set, sequences keep their length, non-string scalars pass through
/// unchanged. All-or-nothing: the first unresolved placeholder aborts the
/// whole call and no partial result is returned.
pub fn substitute(
    value: &Value,
    style: DelimiterStyle,
    resolver: &dyn Resolve,
    format: &ValueFormat,
) -> TemplateResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_str(s, style, resolver, format)?)),
        Value::Sequence(seq) => {
            let items = seq
                .iter()
                .map(|item| substitute(item, style, resolver, format))
                .collect::<TemplateResult<Vec<_>>>()?;
            Ok(Value::Sequence(items))
        }
        Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::with_capacity(map.len());
            for (key, val) in map {
                out.insert(key.clone(), substitute(val, style, resolver, format)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HashMap<String, ConfigValue> {
        let mut vars = HashMap::new();
        vars.insert("DATA".to_string(), ConfigValue::Str("/tmp/fcst".into()));
        vars.insert("ntiles".to_string(), ConfigValue::Int(6));
        vars.insert("cplflx".to_string(), ConfigValue::Bool(false));
        vars
    }

    #[test]
    fn test_dollar_paren_substitution() {
        let vars = resolver();
        let result = substitute_str(
            "$(DATA)/INPUT",
            DelimiterStyle::DollarParen,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        assert_eq!(result, "/tmp/fcst/INPUT");
    }

    #[test]
    fn test_at_square_substitution() {
        let vars = resolver();
        let result = substitute_str(
            "ntiles: @[ntiles]",
            DelimiterStyle::AtSquare,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        assert_eq!(result, "ntiles: 6");
    }

    #[test]
    fn test_multiple_placeholders_in_one_string() {
        let vars = resolver();
        let result = substitute_str(
            "$(DATA)/tile$(ntiles).nc",
            DelimiterStyle::DollarParen,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        assert_eq!(result, "/tmp/fcst/tile6.nc");
    }

    #[test]
    fn test_boolean_renders_as_fortran_literal() {
        let vars = resolver();
        let result = substitute_str(
            "cplflx = @[cplflx]",
            DelimiterStyle::AtSquare,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        assert_eq!(result, "cplflx = .false.");
    }

    #[test]
    fn test_boolean_format_is_pluggable() {
        let vars = resolver();
        let result = substitute_str(
            "@[cplflx]",
            DelimiterStyle::AtSquare,
            &vars,
            &ValueFormat::plain(),
        )
        .unwrap();
        assert_eq!(result, "false");
    }

    #[test]
    fn test_unclosed_marker_is_literal() {
        let vars = resolver();
        let result = substitute_str(
            "cost is $(DATA and 5$",
            DelimiterStyle::DollarParen,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        assert_eq!(result, "cost is $(DATA and 5$");
    }

    #[test]
    fn test_one_style_per_call() {
        let vars = resolver();
        let result = substitute_str(
            "@[ntiles] and $(DATA)",
            DelimiterStyle::AtSquare,
            &vars,
            &ValueFormat::default(),
        )
        .unwrap();
        // The dollar-paren placeholder is untouched when scanning at-square
        assert_eq!(result, "6 and $(DATA)");
    }

    #[test]
    fn test_missing_key_is_error() {
        let vars = resolver();
        let result = substitute_str(
            "$(HOMEgfs)/parm",
            DelimiterStyle::DollarParen,
            &vars,
            &ValueFormat::default(),
        );
        match result {
            Err(TemplateError::UnresolvedPlaceholder { name, within }) => {
                assert_eq!(name, "HOMEgfs");
                assert_eq!(within, "$(HOMEgfs)/parm");
            }
            other => panic!("expected UnresolvedPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn test_structure_without_placeholders_is_unchanged() {
        let vars = resolver();
        let doc: Value = serde_yaml::from_str(
            r#"
mkdir:
  - /a/b
copy:
  - [src.nc, dest.nc]
count: 4
"#,
        )
        .unwrap();

        for style in DelimiterStyle::ALL {
            let result = substitute(&doc, *style, &vars, &ValueFormat::default()).unwrap();
            assert_eq!(result, doc);
        }
    }

    #[test]
    fn test_structure_shape_is_preserved() {
        let vars = resolver();
        let doc: Value = serde_yaml::from_str(
            r#"
stage:
  mkdir:
    - $(DATA)
    - $(DATA)/INPUT
  tiles: 6
  warm: true
"#,
        )
        .unwrap();

        let result =
            substitute(&doc, DelimiterStyle::DollarParen, &vars, &ValueFormat::default()).unwrap();

        let stage = result.get("stage").unwrap();
        let mkdir = stage.get("mkdir").unwrap().as_sequence().unwrap();
        assert_eq!(mkdir.len(), 2);
        assert_eq!(mkdir[0].as_str().unwrap(), "/tmp/fcst");
        assert_eq!(mkdir[1].as_str().unwrap(), "/tmp/fcst/INPUT");
        // Non-string scalars pass through untouched
        assert_eq!(stage.get("tiles").unwrap().as_i64().unwrap(), 6);
        assert!(stage.get("warm").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_resolver_failure_aborts_whole_call() {
        let vars = resolver();
        let doc: Value = serde_yaml::from_str(
            r#"
- $(DATA)/first
- $(UNKNOWN)/second
"#,
        )
        .unwrap();

        let result = substitute(&doc, DelimiterStyle::DollarParen, &vars, &ValueFormat::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_layered_resolver_shadows_config() {
        let config = Config::from_pairs([("atm_res", "C48"), ("FHMAX", "120")]);
        let mut over = HashMap::new();
        over.insert("atm_res".to_string(), ConfigValue::Str("C96".into()));

        let layered = Layered {
            over: &over,
            under: &config,
        };
        assert_eq!(
            layered.resolve("atm_res"),
            Some(ConfigValue::Str("C96".into()))
        );
        assert_eq!(layered.resolve("FHMAX"), Some(ConfigValue::Int(120)));
        assert_eq!(layered.resolve("absent"), None);
    }

    #[test]
    fn test_style_names() {
        assert_eq!(
            DelimiterStyle::from_name("at-square"),
            Some(DelimiterStyle::AtSquare)
        );
        assert_eq!(DelimiterStyle::from_name("nope"), None);
    }
}
