//! Cross-reference resolution
//!
//! Generators may annotate indices with names for their own benefit, so a
//! reference arrives either as a bare integer or as `"<int> # <comment>"`.
//! The comment is never inspected.

use serde::{Deserialize, Serialize};

use crate::types::{Result, TutorError};

/// An index as written by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexRef {
    Integer(i64),
    Annotated(String),
}

impl IndexRef {
    /// Integer value of the reference, without bounds checking
    pub fn resolve(&self) -> Result<i64> {
        match self {
            Self::Integer(value) => Ok(*value),
            Self::Annotated(text) => {
                let head = text.split('#').next().unwrap_or_default().trim();
                head.parse::<i64>()
                    .map_err(|e| TutorError::InvalidReference {
                        value: text.clone(),
                        reason: e.to_string(),
                    })
            }
        }
    }
}

impl From<i64> for IndexRef {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for IndexRef {
    fn from(value: &str) -> Self {
        Self::Annotated(value.to_string())
    }
}

/// Resolve a reference and require `0 <= value < bound`
///
/// `context` names where the reference appeared (edge, plan position, ...).
pub fn resolve_index(reference: &IndexRef, bound: usize, context: &str) -> Result<usize> {
    let value = reference.resolve()?;
    match usize::try_from(value) {
        Ok(index) if index < bound => Ok(index),
        _ => Err(TutorError::out_of_bounds(context, value, bound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use proptest::prelude::*;

    #[test]
    fn test_resolve_formats() {
        assert_eq!(IndexRef::from(3).resolve().unwrap(), 3);
        assert_eq!(IndexRef::from("3").resolve().unwrap(), 3);
        assert_eq!(IndexRef::from("3 # Foo").resolve().unwrap(), 3);
        assert_eq!(IndexRef::from("  7#Bar # Baz").resolve().unwrap(), 7);
    }

    #[test]
    fn test_invalid_reference() {
        let err = IndexRef::from("Foo # 3").resolve().unwrap_err();
        assert!(matches!(err, TutorError::InvalidReference { .. }));
        assert_eq!(err.kind(), FailureKind::ResponseParseFailure);

        assert!(IndexRef::from("").resolve().is_err());
    }

    #[test]
    fn test_deserialize_untagged() {
        let refs: Vec<IndexRef> = serde_yaml::from_str("- 2\n- \"0 # Parser\"\n- 1 # comment\n").unwrap();
        assert_eq!(refs[0], IndexRef::Integer(2));
        assert_eq!(refs[1], IndexRef::Annotated("0 # Parser".into()));
        // A YAML comment disappears before it reaches us
        assert_eq!(refs[2], IndexRef::Integer(1));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(resolve_index(&IndexRef::from(1), 2, "edge 0 to").unwrap(), 1);

        let err = resolve_index(&IndexRef::from("2 # Ghost"), 2, "edge 0 to").unwrap_err();
        match err {
            TutorError::ReferenceOutOfBounds {
                context,
                value,
                bound,
            } => {
                assert_eq!(context, "edge 0 to");
                assert_eq!(value, 2);
                assert_eq!(bound, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(resolve_index(&IndexRef::from(-1), 5, "position 0").is_err());
    }

    proptest! {
        #[test]
        fn annotation_never_changes_value(n in 0i64..100_000, comment in "[A-Za-z #_-]{0,20}") {
            let bare = IndexRef::Annotated(n.to_string()).resolve().unwrap();
            let annotated = IndexRef::Annotated(format!("{n} # {comment}")).resolve().unwrap();
            prop_assert_eq!(bare, n);
            prop_assert_eq!(annotated, n);
        }

        #[test]
        fn in_bounds_iff_below_bound(n in -50i64..50, bound in 0usize..40) {
            let result = resolve_index(&IndexRef::Integer(n), bound, "prop");
            prop_assert_eq!(result.is_ok(), n >= 0 && (n as usize) < bound);
        }
    }
}
