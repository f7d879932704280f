//! Label abbreviation for engines with a hard limit on label length.
//!
//! Every label is truncated to the configured length. Labels whose truncations
//! coincide get the last character of their abbreviation replaced by a digit,
//! `1` for the first such label encountered, `2` for the next, and so on. The
//! resulting table is checked to be invertible so that engine output can be
//! mapped back to the original labels.

use indexmap::IndexMap;

use crate::error::{ChoiceError, Result};
use crate::model::ChoiceModel;
use crate::options::AbbreviationOptions;

/// Largest collision group the single digit suffix can resolve.
const MAX_COLLISIONS: usize = 9;

/// Bidirectional lookup between full labels and their abbreviations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Abbreviations {
    short: IndexMap<String, String>,
    long: IndexMap<String, String>,
    max_length: usize,
}

impl Abbreviations {
    /// Builds the table for `labels`, registered in first-encounter order.
    pub fn build<I, S>(labels: I, options: &AbbreviationOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let max_length = options.max_length;

        let mut registered: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if !registered.iter().any(|known| known == label) {
                registered.push(label.to_string());
            }
        }

        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, label) in registered.iter().enumerate() {
            let truncated: String = label.chars().take(max_length).collect();
            groups.entry(truncated).or_default().push(index);
        }

        let mut abbreviated = vec![String::new(); registered.len()];
        for (truncated, members) in groups {
            if members.len() == 1 {
                abbreviated[members[0]] = truncated;
                continue;
            }

            if members.len() > MAX_COLLISIONS || max_length < 2 {
                return Err(ChoiceError::AbbreviationOverflow {
                    abbreviation: truncated,
                    count: members.len(),
                });
            }

            log::debug!(
                "resolving {} labels truncated to `{}` with digit suffixes",
                members.len(),
                truncated
            );
            let mut stem = truncated;
            stem.pop();
            for (position, index) in members.into_iter().enumerate() {
                abbreviated[index] = format!("{}{}", stem, position + 1);
            }
        }

        let mut short = IndexMap::with_capacity(registered.len());
        let mut long: IndexMap<String, String> = IndexMap::with_capacity(registered.len());
        for (label, abbreviation) in registered.into_iter().zip(abbreviated) {
            if let Some(first) = long.get(&abbreviation) {
                return Err(ChoiceError::AbbreviationCollision {
                    abbreviation,
                    first: first.clone(),
                    second: label,
                });
            }
            long.insert(abbreviation.clone(), label.clone());
            short.insert(label, abbreviation);
        }

        Ok(Self {
            short,
            long,
            max_length,
        })
    }

    /// Abbreviated form of a registered label.
    pub fn abbreviate(&self, label: &str) -> Option<&str> {
        self.short.get(label).map(String::as_str)
    }

    /// Full label behind an abbreviation.
    pub fn elongate(&self, abbreviation: &str) -> Option<&str> {
        self.long.get(abbreviation).map(String::as_str)
    }

    /// Iterates `(full, abbreviated)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.short
            .iter()
            .map(|(label, abbreviation)| (label.as_str(), abbreviation.as_str()))
    }

    /// Number of registered labels.
    pub fn len(&self) -> usize {
        self.short.len()
    }

    /// Returns whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }

    /// Length limit the table was built for.
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Every label a model can emit, in the order they are registered.
///
/// Alternatives come first, then the choice column, availability columns,
/// variables, variable fields, intercepts and parameters.
pub fn model_labels(model: &ChoiceModel) -> Vec<&str> {
    let mut labels: Vec<&str> = model.alternatives().iter().map(String::as_str).collect();
    labels.push(model.choice_column());
    labels.extend(model.availability_fields());
    labels.extend(model.all_variables());
    labels.extend(model.all_variable_fields());
    labels.extend(model.intercepts().values().map(String::as_str));
    labels.extend(model.parameters().iter().map(String::as_str));
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(labels: &[&str]) -> Result<Abbreviations> {
        Abbreviations::build(labels.iter(), &AbbreviationOptions::default())
    }

    #[test]
    fn short_labels_map_to_themselves() {
        let table = build(&["choice1", "p1", "abcdefghij"]).unwrap();
        for label in ["choice1", "p1", "abcdefghij"] {
            assert_eq!(table.abbreviate(label), Some(label));
            assert_eq!(table.elongate(label), Some(label));
        }
    }

    #[test]
    fn long_labels_are_truncated() {
        let table = build(&["alternative", "choice1_var3", "choice2_var3"]).unwrap();
        assert_eq!(table.abbreviate("alternative"), Some("alternativ"));
        assert_eq!(table.abbreviate("choice1_var3"), Some("choice1_va"));
        assert_eq!(table.abbreviate("choice2_var3"), Some("choice2_va"));
        assert_eq!(table.elongate("alternativ"), Some("alternative"));
    }

    #[test]
    fn collisions_get_digit_suffixes_in_encounter_order() {
        let table = build(&["abcdefghij2", "abcdefghij1"]).unwrap();
        assert_eq!(table.abbreviate("abcdefghij2"), Some("abcdefghi1"));
        assert_eq!(table.abbreviate("abcdefghij1"), Some("abcdefghi2"));
        assert_eq!(table.elongate("abcdefghi1"), Some("abcdefghij2"));
        assert_eq!(table.elongate("abcdefghi2"), Some("abcdefghij1"));
    }

    #[test]
    fn every_registered_label_round_trips() {
        let labels = [
            "avail_choice1",
            "avail_choice2",
            "travel_time_bus",
            "travel_time_car",
            "cost",
            "cost",
        ];
        let table = build(&labels).unwrap();
        assert_eq!(table.len(), 5);
        for label in labels {
            let short = table.abbreviate(label).unwrap();
            assert!(short.chars().count() <= 10);
            assert_eq!(table.elongate(short), Some(label));
        }
    }

    #[test]
    fn more_than_nine_collisions_overflow() {
        let labels: Vec<String> = (0..10).map(|i| format!("long_label_number_{i}")).collect();
        let err = Abbreviations::build(&labels, &AbbreviationOptions::default()).unwrap_err();
        assert!(matches!(err, ChoiceError::AbbreviationOverflow { count: 10, .. }));
    }

    #[test]
    fn single_character_limit_cannot_hold_a_digit() {
        let options = AbbreviationOptions::default().with_max_length(1);
        let err = Abbreviations::build(["ab", "ac"], &options).unwrap_err();
        assert!(matches!(err, ChoiceError::AbbreviationOverflow { count: 2, .. }));
    }

    #[test]
    fn resolved_suffix_clashing_with_another_label_is_rejected() {
        let err = build(&["abcdefghi1", "abcdefghijk", "abcdefghijl"]).unwrap_err();
        assert!(matches!(
            err,
            ChoiceError::AbbreviationCollision { ref abbreviation, .. } if abbreviation == "abcdefghi1"
        ));
    }
}
