// Generation identifiers for persisted windows
use std::fmt;

/// Identifies one persisted generation, rendered as `<base_name>-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationId {
    base_name: String,
    index: u64,
}

impl GenerationId {
    pub fn new(base_name: impl Into<String>, index: u64) -> Self {
        Self {
            base_name: base_name.into(),
            index,
        }
    }

    pub fn first(base_name: impl Into<String>) -> Self {
        Self::new(base_name, 0)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn next(&self) -> Self {
        Self::new(self.base_name.clone(), self.index + 1)
    }

    /// Recognise a file name produced by `Display` for the given base name.
    /// Names like `base-01` or `base-x` are rejected so that only files
    /// this crate wrote take part in the chain.
    pub fn parse(base_name: &str, file_name: &str) -> Option<Self> {
        let digits = file_name.strip_prefix(base_name)?.strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        let index = digits.parse().ok()?;
        Some(Self::new(base_name, index))
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base_name, self.index)
    }
}
