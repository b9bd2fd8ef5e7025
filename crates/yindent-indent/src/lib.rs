#![warn(rust_2024_compatibility, clippy::all)]

//! decree.yaml - YAML indentation inference and auto-fix.
//!
//! Every structurally significant token gets a descriptor saying which earlier
//! token its column derives from. Resolving those chains gives each line an
//! expected indentation; lines that differ are reported together with the
//! edits that would repair them.

pub mod descriptor;
mod fix;
pub mod lines;
mod missing;
pub mod resolver;

use yindent_abi::{BoxDecree, Capability, Decree, DecreeMetadata, Diagnostic, Diagnostics, Span};
use yindent_syntax::{ParseResult, SourceCode};

pub use fix::{Fix, Violation, ViolationKind, apply_fixes};
pub use lines::{IndicatorOffset, LineKind, LineRecord};

const DEFAULT_INDENT_UNIT: u32 = 2;
const MAX_FIX_PASSES: usize = 10;

/// Indentation style the engine enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentConfig {
    pub indent_unit: u32,
    /// Indent a block sequence that is a mapping value one unit past its key.
    pub indent_block_sequences: bool,
    /// Columns from a `-` to its value; defaults to `indent_unit`.
    pub indicator_value_indent: Option<u32>,
    /// Align continuation lines of a multi-line scalar with its first column
    /// when the scalar does not start its line.
    pub align_multiline_flow_scalars: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            indent_unit: DEFAULT_INDENT_UNIT,
            indent_block_sequences: true,
            indicator_value_indent: None,
            align_multiline_flow_scalars: false,
        }
    }
}

impl IndentConfig {
    #[must_use]
    pub fn indicator_value_indent(&self) -> u32 {
        self.indicator_value_indent.unwrap_or(self.indent_unit)
    }
}

/// Per-line results and the violations derived from them.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub lines: Vec<LineRecord>,
    pub violations: Vec<Violation>,
}

/// Parse and analyze `text`.
///
/// # Errors
///
/// Returns the parser's error when `text` is not well-formed YAML.
pub fn analyze(text: &str, config: &IndentConfig) -> ParseResult<Analysis> {
    let code = yindent_syntax::parse(text)?;
    Ok(analyze_code(&code, config))
}

/// Analyze an already parsed document stream.
#[must_use]
pub fn analyze_code(code: &SourceCode, config: &IndentConfig) -> Analysis {
    let graph = descriptor::build(code, config);
    let mut resolver = resolver::Resolver::new(&code.tokens, &graph);
    let mut records = lines::classify(code, &mut resolver);
    missing::fill(&mut records, code, &mut resolver, config);
    let violations = fix::validate(code, &records, &graph);
    tracing::trace!(
        lines = records.len(),
        violations = violations.len(),
        "analyzed source"
    );
    Analysis {
        lines: records,
        violations,
    }
}

/// True when any non-blank line is indented with a tab. Such files are not
/// checked at all.
#[must_use]
pub fn is_tab_indented(text: &str) -> bool {
    text.lines().any(|line| {
        let content = line.trim_start_matches([' ', '\t']);
        !content.is_empty() && line[..line.len() - content.len()].contains('\t')
    })
}

/// Apply every available fix, re-analyzing until the text settles.
#[must_use]
pub fn fix_source(text: &str, config: &IndentConfig) -> String {
    if is_tab_indented(text) {
        return text.to_string();
    }
    let mut current = text.to_string();
    for pass in 1..=MAX_FIX_PASSES {
        let Ok(analysis) = analyze(&current, config) else {
            break;
        };
        let fixes: Vec<Fix> = analysis
            .violations
            .into_iter()
            .filter_map(|v| v.fix)
            .collect();
        if fixes.is_empty() {
            break;
        }
        let next = apply_fixes(&current, &fixes);
        if next == current {
            break;
        }
        if yindent_syntax::parse(&next).is_err() {
            tracing::debug!(pass, "fix would break parsing, keeping previous text");
            break;
        }
        tracing::debug!(pass, fixes = fixes.len(), "applied fixes");
        current = next;
    }
    current
}

#[must_use]
pub fn lint_source(source: &str) -> Diagnostics {
    lint_source_with_config(source, &IndentConfig::default())
}

/// Lint with custom configuration
#[must_use]
pub fn lint_source_with_config(source: &str, config: &IndentConfig) -> Diagnostics {
    if is_tab_indented(source) {
        tracing::debug!("tab indentation, skipping");
        return Diagnostics::new();
    }
    match analyze(source, config) {
        Ok(analysis) => analysis
            .violations
            .iter()
            .map(|v| Diagnostic {
                rule: format!("yaml/{}", v.kind.rule()),
                message: v.message(),
                span: v.span,
                enforced: v.fix.is_some(),
            })
            .collect(),
        Err(err) => vec![Diagnostic {
            rule: "yaml/parse-error".to_string(),
            message: err.message.clone(),
            span: Span::new(err.offset, err.offset),
            enforced: false,
        }],
    }
}

#[derive(Default)]
pub struct YamlIndent {
    config: IndentConfig,
}

impl YamlIndent {
    #[must_use]
    pub const fn new(config: IndentConfig) -> Self {
        Self { config }
    }
}

impl Decree for YamlIndent {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn lint(&self, _path: &str, source: &str) -> Diagnostics {
        lint_source_with_config(source, &self.config)
    }

    fn metadata(&self) -> DecreeMetadata {
        DecreeMetadata {
            decree_version: env!("CARGO_PKG_VERSION").to_string(),
            description: "YAML indentation inference and auto-fix".to_string(),
            supported_extensions: vec!["yml".to_string(), "yaml".to_string()],
            capabilities: vec![
                Capability::Lint,
                Capability::AutoFix,
                Capability::RuntimeConfig,
            ],
        }
    }

    fn fix(&self, _path: &str, source: &str) -> Option<String> {
        let fixed = fix_source(source, &self.config);
        (fixed != source).then_some(fixed)
    }
}

#[must_use]
pub fn init_decree() -> BoxDecree {
    Box::new(YamlIndent::default())
}

/// Create decree with custom config
#[must_use]
pub fn init_decree_with_config(config: IndentConfig) -> BoxDecree {
    Box::new(YamlIndent::new(config))
}

/// Convert `DecreeSettings` to `IndentConfig`
#[must_use]
pub fn config_from_decree_settings(settings: &yindent_core::DecreeSettings) -> IndentConfig {
    let defaults = IndentConfig::default();
    IndentConfig {
        indent_unit: settings.indent_unit.unwrap_or(defaults.indent_unit),
        indent_block_sequences: settings
            .indent_block_sequences
            .unwrap_or(defaults.indent_block_sequences),
        indicator_value_indent: settings.indicator_value_indent,
        align_multiline_flow_scalars: settings
            .align_multiline_flow_scalars
            .unwrap_or(defaults.align_multiline_flow_scalars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_misindented_sibling() {
        let diags = lint_source("a:\n  b: 1\n     c: 2\n");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].rule, "yaml/indent");
        assert!(diags[0].enforced, "sibling shift should be fixable");
    }

    #[test]
    fn detects_indicator_gap() {
        let diags = lint_source("-   a\n");
        assert!(
            diags.iter().any(|d| d.rule == "yaml/indicator-offset"),
            "Should detect extra spaces after dash"
        );
    }

    #[test]
    fn accepts_well_indented_document() {
        let src = "root:\n  list:\n    - name: a\n      value: 1\n    - b\n  flow: [1, 2]\n  text: |\n    line\n";
        assert!(lint_source(src).is_empty());
    }

    #[test]
    fn trailing_comment_after_indicator_is_analyzed() {
        for src in ["a: # c\n  b: 1\n", "a:    # c\n  b: 1\n", "- # c\n  a: 1\n", "a: &x # c\n  b: 1\n"] {
            assert!(lint_source(src).is_empty(), "{src:?}: {:?}", lint_source(src));
        }
        let diags = lint_source("a: # c\n     b: 1\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "yaml/indent");
    }

    #[test]
    fn reports_parse_errors() {
        let diags = lint_source("a: [1, 2\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "yaml/parse-error");
        assert!(!diags[0].enforced);
    }

    #[test]
    fn skips_tab_indented_sources() {
        assert!(is_tab_indented("a:\n\tb: 1\n"));
        assert!(!is_tab_indented("a: \"\tx\"\n"));
        assert!(lint_source("a:\n\tb: 1\n     c: 2\n").is_empty());
    }

    #[test]
    fn fixes_sibling_indentation() {
        let fixed = fix_source("a:\n  b: 1\n     c: 2\n", &IndentConfig::default());
        assert_eq!(fixed, "a:\n  b: 1\n  c: 2\n");
    }

    #[test]
    fn decree_fix_returns_none_when_clean() {
        let decree = init_decree();
        assert!(decree.fix("x.yml", "a: 1\n").is_none());
        assert_eq!(decree.rule("indent"), "yaml/indent");
        assert!(decree.metadata().has_capability(Capability::AutoFix));
    }

    #[test]
    fn converts_settings() {
        let settings = yindent_core::DecreeSettings {
            indent_unit: Some(4),
            indent_block_sequences: Some(false),
            ..Default::default()
        };
        let config = config_from_decree_settings(&settings);
        assert_eq!(config.indent_unit, 4);
        assert!(!config.indent_block_sequences);
        assert_eq!(config.indicator_value_indent(), 4);
    }
}
