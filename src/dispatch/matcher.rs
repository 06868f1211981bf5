use std::collections::BTreeSet;

use crate::message::Property;

/// Outcome of comparing a received property set with the sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyComparison {
    pub matched: bool,
    /// Names that were missing, carried a different value, or were not expected.
    pub mismatched: Vec<String>,
}

/// Order-independent equality over `(name, value)` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMatcher;

impl PropertyMatcher {
    pub fn matches(expected: &[Property], actual: &[Property]) -> bool {
        Self::compare(expected, actual).matched
    }

    pub fn compare(expected: &[Property], actual: &[Property]) -> PropertyComparison {
        let mut mismatched = BTreeSet::new();

        for property in expected {
            if !actual.contains(property) {
                mismatched.insert(property.name.clone());
            }
        }
        for property in actual {
            if !expected.contains(property) {
                mismatched.insert(property.name.clone());
            }
        }

        PropertyComparison {
            matched: expected.len() == actual.len() && mismatched.is_empty(),
            mismatched: mismatched.into_iter().collect(),
        }
    }
}
