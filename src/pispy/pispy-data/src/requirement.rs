use crate::Error;

/// Characters that end the project name in a dependency specifier: the start
/// of extras, a version constraint, an environment marker, or a direct URL.
const NAME_TERMINATORS: &[char] = &['[', '<', '>', '=', '!', '~', ';', '(', '@', ','];

/// Extract the bare project name from a dependency specifier.
///
/// Only the leading name is read; extras, version constraints and markers
/// are ignored. `"foo[extra]<2.0; python_version < '3.8'"` gives `"foo"`.
///
/// The name must start and end with an ASCII letter or digit and contain
/// only letters, digits, `-`, `_` and `.` in between.
pub fn project_name(spec: &str) -> Result<&str, Error> {
    let trimmed = spec.trim_start();
    let end = trimmed
        .find(|c: char| c.is_whitespace() || NAME_TERMINATORS.contains(&c))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..end];

    if is_valid_name(name) {
        Ok(name)
    } else {
        Err(Error::InvalidRequirement {
            spec: spec.to_string(),
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name() {
        assert_eq!(project_name("bar").unwrap(), "bar");
    }

    #[test]
    fn strips_version_constraints() {
        assert_eq!(project_name("foo>=1.0").unwrap(), "foo");
        assert_eq!(project_name("idna<4,>=2.5").unwrap(), "idna");
        assert_eq!(project_name("six==1.16.0").unwrap(), "six");
        assert_eq!(project_name("attrs!=21.1.0").unwrap(), "attrs");
        assert_eq!(project_name("tomli~=2.0").unwrap(), "tomli");
        assert_eq!(project_name("pytz (>=2020.1)").unwrap(), "pytz");
    }

    #[test]
    fn strips_extras_and_markers() {
        assert_eq!(project_name("foo[extra]<2.0").unwrap(), "foo");
        assert_eq!(
            project_name("PySocks!=1.5.7,>=1.5.6; extra == \"socks\"").unwrap(),
            "PySocks"
        );
        assert_eq!(
            project_name("importlib-metadata;python_version<'3.8'").unwrap(),
            "importlib-metadata"
        );
        assert_eq!(project_name("  zope.interface ").unwrap(), "zope.interface");
    }

    #[test]
    fn strips_direct_references() {
        assert_eq!(
            project_name("pip @ https://example.com/pip.whl").unwrap(),
            "pip"
        );
    }

    #[test]
    fn preserves_case() {
        assert_eq!(project_name("Django>=4").unwrap(), "Django");
    }

    #[test]
    fn rejects_specifiers_without_a_name() {
        for spec in ["", "   ", ">=1.0", "; python_version < '3'", "[extra]", "-foo", "foo-", "fo/o"] {
            assert!(
                matches!(project_name(spec), Err(Error::InvalidRequirement { .. })),
                "expected {spec:?} to be rejected"
            );
        }
    }
}
