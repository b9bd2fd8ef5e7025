#![warn(rust_2024_compatibility, clippy::all)]

pub mod config;

use anyhow::Result;
use camino::Utf8Path;
use std::collections::HashSet;
use yindent_abi::{BoxDecree, Capability, Diagnostics};

pub use config::{CONFIG_FILE, ConfigError, DecreeSettings, YindentConfig};

/// In-memory source file for the Regime to enforce.
pub struct Source<'a> {
    pub path: &'a Utf8Path,
    pub text: &'a str,
}

/// The Regime: owns decree instances and enforces them over sources.
pub struct Regime {
    decrees: Vec<BoxDecree>,
}

impl Default for Regime {
    fn default() -> Self {
        Self::new()
    }
}

impl Regime {
    #[must_use]
    pub fn new() -> Self {
        Self {
            decrees: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_decree(mut self, decree: BoxDecree) -> Self {
        self.decrees.push(decree);
        self
    }

    pub fn add_decree(&mut self, decree: BoxDecree) {
        self.decrees.push(decree);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decrees.is_empty()
    }

    /// Return the union of supported extensions for all loaded decrees,
    /// lowercased, or `None` when no decree narrows the set.
    #[must_use]
    pub fn watched_extensions(&self) -> Option<HashSet<String>> {
        let mut exts = HashSet::new();
        for decree in &self.decrees {
            for ext in &decree.metadata().supported_extensions {
                exts.insert(ext.to_ascii_lowercase());
            }
        }

        if exts.is_empty() { None } else { Some(exts) }
    }

    /// Enforce all decrees over provided sources.
    ///
    /// Only runs a decree on files whose extension matches the decree's
    /// `supported_extensions`; an empty list matches every file.
    ///
    /// # Errors
    ///
    /// Returns an error if any decree fails during linting.
    pub fn enforce(&self, sources: &[Source<'_>]) -> Result<Diagnostics> {
        let mut all = Diagnostics::new();
        for decree in &self.decrees {
            let supported = &decree.metadata().supported_extensions;
            for src in sources {
                if supported.is_empty() || Self::extension_matches(src.path, supported) {
                    all.extend(decree.lint(src.path.as_str(), src.text));
                }
            }
        }
        Ok(all)
    }

    /// Run every auto-fixing decree that applies to `source` in turn.
    ///
    /// Returns the rewritten text, or `None` when nothing changed.
    #[must_use]
    pub fn fix(&self, source: &Source<'_>) -> Option<String> {
        let mut text = source.text.to_string();
        for decree in &self.decrees {
            let metadata = decree.metadata();
            if !metadata.has_capability(Capability::AutoFix) {
                continue;
            }
            let supported = &metadata.supported_extensions;
            if !supported.is_empty() && !Self::extension_matches(source.path, supported) {
                continue;
            }
            if let Some(fixed) = decree.fix(source.path.as_str(), &text) {
                tracing::debug!(decree = decree.name(), path = %source.path, "applied fixes");
                text = fixed;
            }
        }
        (text != source.text).then_some(text)
    }

    /// Check if a file's extension matches any in the supported list.
    fn extension_matches(path: &Utf8Path, supported: &[String]) -> bool {
        path.extension()
            .is_some_and(|ext| supported.iter().any(|s| s.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yindent_abi::{Decree, DecreeMetadata, Diagnostic, Span};

    struct MockDecree {
        name: &'static str,
        exts: Vec<String>,
        capabilities: Vec<Capability>,
    }

    impl MockDecree {
        fn boxed(name: &'static str, exts: &[&str], capabilities: Vec<Capability>) -> BoxDecree {
            Box::new(Self {
                name,
                exts: exts.iter().map(|e| (*e).to_string()).collect(),
                capabilities,
            })
        }
    }

    impl Decree for MockDecree {
        fn name(&self) -> &str {
            self.name
        }

        fn lint(&self, _path: &str, source: &str) -> Diagnostics {
            vec![Diagnostic {
                rule: self.rule("seen"),
                message: String::new(),
                span: Span::new(0, source.len()),
                enforced: false,
            }]
        }

        fn metadata(&self) -> DecreeMetadata {
            DecreeMetadata {
                decree_version: "1".into(),
                description: String::new(),
                supported_extensions: self.exts.clone(),
                capabilities: self.capabilities.clone(),
            }
        }

        fn fix(&self, _path: &str, source: &str) -> Option<String> {
            Some(format!("{source}{}", self.name))
        }
    }

    #[test]
    fn watched_extensions_unites_declared_sets() {
        let mut regime = Regime::new();
        regime.add_decree(MockDecree::boxed("a", &["yml", "YAML"], vec![Capability::Lint]));
        regime.add_decree(MockDecree::boxed("b", &["json"], vec![Capability::Lint]));

        let exts = regime.watched_extensions().unwrap();
        assert!(exts.contains("yml"));
        assert!(exts.contains("yaml"));
        assert!(exts.contains("json"));
        assert_eq!(exts.len(), 3);
    }

    #[test]
    fn watched_extensions_none_when_only_universal() {
        let regime = Regime::new().with_decree(MockDecree::boxed("any", &[], vec![]));
        assert!(regime.watched_extensions().is_none());
    }

    #[test]
    fn enforce_runs_only_matching_decrees() {
        let regime = Regime::new()
            .with_decree(MockDecree::boxed("yaml", &["yml"], vec![Capability::Lint]))
            .with_decree(MockDecree::boxed("json", &["json"], vec![Capability::Lint]));
        let source = Source {
            path: Utf8Path::new("conf/app.YML"),
            text: "a: 1\n",
        };
        let diags = regime.enforce(&[source]).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, "yaml/seen");
    }

    #[test]
    fn fix_threads_text_through_auto_fix_decrees() {
        let regime = Regime::new()
            .with_decree(MockDecree::boxed(
                "one",
                &["yml"],
                vec![Capability::Lint, Capability::AutoFix],
            ))
            .with_decree(MockDecree::boxed("lint-only", &["yml"], vec![Capability::Lint]))
            .with_decree(MockDecree::boxed("two", &[], vec![Capability::AutoFix]));
        let source = Source {
            path: Utf8Path::new("a.yml"),
            text: "x",
        };
        assert_eq!(regime.fix(&source).as_deref(), Some("xonetwo"));
    }

    #[test]
    fn fix_returns_none_without_fixers() {
        let regime = Regime::new().with_decree(MockDecree::boxed("l", &[], vec![Capability::Lint]));
        let source = Source {
            path: Utf8Path::new("a.yml"),
            text: "x",
        };
        assert!(regime.fix(&source).is_none());
    }
}
