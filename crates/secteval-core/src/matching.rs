use std::fmt;
use std::hash::{Hash, Hasher};

use unicode_normalization::UnicodeNormalization;

/// Canonical comparison key for a section title.
///
/// Removes every space, `.` and `-` from the raw text, then applies Unicode
/// NFKC normalization to what remains. Case is preserved: `"3. Results"`,
/// `"3 Results"` and `"3-Results"` all map to `"3Results"`, while
/// `"3. results"` stays a distinct key.
pub fn canonicalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(*c, ' ' | '.' | '-'))
        .nfkc()
        .collect()
}

/// A section title as it appears in an annotation or in extractor output.
///
/// Equality and hashing are based solely on the canonical key, never the
/// raw string, so spacing- and punctuation-variant spellings of the same
/// title compare equal. The raw string is kept for reporting.
#[derive(Debug, Clone)]
pub struct SectionTitle {
    raw: String,
    canonical: String,
}

impl SectionTitle {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let canonical = canonicalize(&raw);
        Self { raw, canonical }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for SectionTitle {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for SectionTitle {}

impl Hash for SectionTitle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for SectionTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for SectionTitle {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SectionTitle {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
