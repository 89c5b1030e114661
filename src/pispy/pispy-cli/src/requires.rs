//! Dependency cross-references for the details view.

use pispy_data::project_name;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// The unique, sorted project names a package depends on.
///
/// Displays as a comma-separated list; each name is also a cross-reference
/// that can be looked up in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReferences(Vec<String>);

impl CrossReferences {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn into_names(self) -> Vec<String> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CrossReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Reduce `requires_dist` specifiers to the names they depend on.
///
/// Names are compared case-sensitively and sorted ascending. A malformed
/// specifier is logged and skipped; it never hides the rest of the list.
pub fn resolve_requires(specifiers: &[String]) -> CrossReferences {
    let names: BTreeSet<&str> = specifiers
        .iter()
        .filter_map(|spec| match project_name(spec) {
            Ok(name) => Some(name),
            Err(err) => {
                warn!(%err, "skipping dependency specifier");
                None
            }
        })
        .collect();

    CrossReferences(names.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedups_and_sorts() {
        let refs = resolve_requires(&specs(&["foo>=1.0", "bar", "foo[extra]<2.0"]));
        assert_eq!(refs.names(), ["bar", "foo"]);
        assert_eq!(refs.to_string(), "bar, foo");
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let refs = resolve_requires(&specs(&["foo", "Foo", "bar", "Bar"]));
        assert_eq!(refs.names(), ["Bar", "Foo", "bar", "foo"]);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let refs = resolve_requires(&specs(&[">=1.0", "idna<4", "", "[x]", "certifi"]));
        assert_eq!(refs.names(), ["certifi", "idna"]);
    }

    #[test]
    fn empty_input_renders_empty() {
        let refs = resolve_requires(&[]);
        assert!(refs.is_empty());
        assert_eq!(refs.to_string(), "");
    }
}
