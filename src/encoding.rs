//! Integer codes for alternatives, used by engines that need numeric choice ids.

use indexmap::IndexMap;

use crate::error::{ChoiceError, Result};

/// Stable alternative-to-integer mapping in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceEncoding {
    codes: IndexMap<String, usize>,
    first: usize,
}

impl ChoiceEncoding {
    /// Numbers `alternatives` consecutively starting at `first`.
    pub fn new<S: AsRef<str>>(alternatives: &[S], first: usize) -> Self {
        let codes = alternatives
            .iter()
            .enumerate()
            .map(|(offset, alternative)| (alternative.as_ref().to_string(), first + offset))
            .collect();
        Self { codes, first }
    }

    /// Code of `alternative`.
    pub fn code(&self, alternative: &str) -> Option<usize> {
        self.codes.get(alternative).copied()
    }

    /// Alternative carrying `code`.
    pub fn alternative(&self, code: usize) -> Option<&str> {
        code.checked_sub(self.first)
            .and_then(|index| self.codes.get_index(index))
            .map(|(alternative, _)| alternative.as_str())
    }

    /// Recodes the observed choice in `row`, failing on labels outside the model.
    pub fn encode(&self, row: usize, label: &str) -> Result<usize> {
        self.code(label).ok_or_else(|| ChoiceError::UnknownChoice {
            row,
            value: label.to_string(),
        })
    }

    /// Iterates `(alternative, code)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.codes
            .iter()
            .map(|(alternative, code)| (alternative.as_str(), *code))
    }

    /// Number of encoded alternatives.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns whether no alternatives are encoded.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
