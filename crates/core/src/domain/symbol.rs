use serde::Serialize;
use std::fmt;

/// Trimmed, uppercased ticker that is a key of the catalog it was resolved against.
///
/// Only [`crate::canonical::resolve`] produces these, so holding one means the
/// symbol was valid at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CanonicalSymbol(String);

impl CanonicalSymbol {
    pub(crate) fn new_unchecked(symbol: String) -> Self {
        Self(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CanonicalSymbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CanonicalSymbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
