//! Parser for the linear-in-parameters utility strings of a choice model.
//!
//! A utility string has the form `"c + p1*v1 + v2*p2"`: an optional intercept
//! label as the first term followed by products of one parameter and one
//! variable. Labels in a product may appear in either order; which one is the
//! variable is decided by membership in the declared variable set.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ChoiceError, Result};

/// One `parameter*variable` product of a utility function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Term {
    /// Label of the variable (data column or alternative-dependent variable).
    pub variable: String,
    /// Label of the parameter multiplying the variable.
    pub parameter: String,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.parameter, self.variable)
    }
}

/// A parsed and validated utility function for a single alternative.
///
/// Two utilities compare equal when their intercepts match and they contain the
/// same set of terms, irrespective of term order.
#[derive(Clone, Debug)]
pub struct Utility {
    intercept: Option<String>,
    terms: Vec<Term>,
}

impl Utility {
    /// Parses `utility` against the declared variables and parameters.
    ///
    /// When `intercept` is given the first additive term must be exactly that
    /// label. Every other term must be the product of one label from
    /// `variables` and one from `parameters`, and no variable or parameter may
    /// appear twice.
    pub fn parse<V, P>(
        utility: &str,
        variables: &[V],
        intercept: Option<&str>,
        parameters: &[P],
    ) -> Result<Self>
    where
        V: AsRef<str>,
        P: AsRef<str>,
    {
        let tokens: Vec<&str> = utility.split('+').map(str::trim).collect();

        let (intercept, products) = match intercept {
            Some(expected) => {
                if tokens[0] != expected {
                    return Err(ChoiceError::intercept_mismatch(tokens[0], expected));
                }
                (Some(expected.to_string()), &tokens[1..])
            }
            None => {
                if !tokens[0].contains('*') {
                    return Err(ChoiceError::intercept_mismatch(tokens[0], ""));
                }
                (None, &tokens[..])
            }
        };

        let mut terms = Vec::with_capacity(products.len());
        for token in products {
            let (a, b) = split_term(token)?;
            terms.push(sort_labels(a, b, variables, parameters)?);
        }

        check_duplicates(&terms)?;

        Ok(Self { intercept, terms })
    }

    /// Intercept label, if this alternative has one.
    pub fn intercept(&self) -> Option<&str> {
        self.intercept.as_deref()
    }

    /// Terms in the order they were written.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Variables used by the utility, in term order.
    pub fn variables(&self) -> Vec<&str> {
        self.terms.iter().map(|term| term.variable.as_str()).collect()
    }

    /// Parameters used by the utility, in term order.
    pub fn parameters(&self) -> Vec<&str> {
        self.terms.iter().map(|term| term.parameter.as_str()).collect()
    }

    /// Looks up the parameter multiplying `variable`.
    pub fn parameter_for(&self, variable: &str) -> Option<&str> {
        self.terms
            .iter()
            .find(|term| term.variable == variable)
            .map(|term| term.parameter.as_str())
    }
}

impl PartialEq for Utility {
    fn eq(&self, other: &Self) -> bool {
        self.intercept == other.intercept
            && self.terms.len() == other.terms.len()
            && self.terms.iter().all(|term| other.terms.contains(term))
    }
}

impl Eq for Utility {}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.terms.len() + 1);
        if let Some(intercept) = &self.intercept {
            parts.push(intercept.clone());
        }
        parts.extend(self.terms.iter().map(Term::to_string));
        f.write_str(&parts.join(" + "))
    }
}

fn split_term(token: &str) -> Result<(&str, &str)> {
    let labels: Vec<&str> = token.split('*').map(str::trim).collect();
    match labels.as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(ChoiceError::MalformedTerm(token.to_string())),
    }
}

fn sort_labels<V, P>(a: &str, b: &str, variables: &[V], parameters: &[P]) -> Result<Term>
where
    V: AsRef<str>,
    P: AsRef<str>,
{
    let is_variable = |label: &str| variables.iter().any(|v| v.as_ref() == label);
    let is_parameter = |label: &str| parameters.iter().any(|p| p.as_ref() == label);

    let (variable, parameter) = if is_variable(a) && is_parameter(b) {
        (a, b)
    } else if is_parameter(a) && is_variable(b) {
        (b, a)
    } else {
        return Err(ChoiceError::InvalidTermContents(a.to_string(), b.to_string()));
    };

    Ok(Term {
        variable: variable.to_string(),
        parameter: parameter.to_string(),
    })
}

fn check_duplicates(terms: &[Term]) -> Result<()> {
    let mut seen = HashSet::new();
    for term in terms {
        if !seen.insert(term.variable.as_str()) {
            return Err(ChoiceError::DuplicateVariable(term.variable.clone()));
        }
    }

    seen.clear();
    for term in terms {
        if !seen.insert(term.parameter.as_str()) {
            return Err(ChoiceError::DuplicateParameter(term.parameter.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIABLES: [&str; 3] = ["var1", "var2", "var3"];
    const PARAMETERS: [&str; 3] = ["param1", "param2", "param3"];

    fn parse(utility: &str, intercept: Option<&str>) -> Result<Utility> {
        Utility::parse(utility, &VARIABLES, intercept, &PARAMETERS)
    }

    #[test]
    fn parses_intercept_and_terms_in_either_order() {
        let utility = parse("c + var1*param1 + param2*var2", Some("c")).unwrap();
        assert_eq!(utility.intercept(), Some("c"));
        assert_eq!(utility.variables(), vec!["var1", "var2"]);
        assert_eq!(utility.parameters(), vec!["param1", "param2"]);
        assert_eq!(utility.parameter_for("var2"), Some("param2"));
        assert_eq!(utility.parameter_for("var3"), None);
    }

    #[test]
    fn tolerates_missing_whitespace() {
        let utility = parse("c+param1 *var1+ var2* param2", Some("c")).unwrap();
        assert_eq!(utility.terms().len(), 2);
        assert_eq!(utility.to_string(), "c + param1*var1 + param2*var2");
    }

    #[test]
    fn permuted_products_are_equal() {
        let a = parse("var1*param1 + param2*var2", None).unwrap();
        let b = parse("param2*var2 + param1*var1", None).unwrap();
        assert_eq!(a, b);

        let c = parse("c + param1*var1", Some("c")).unwrap();
        let d = parse("param1*var1", None).unwrap();
        assert_ne!(c, d);
    }

    #[test]
    fn rerendered_string_parses_to_the_same_utility() {
        let original = parse("c + var1*param1 + param3*var3", Some("c")).unwrap();
        let rendered = original.to_string();
        let reparsed = parse(&rendered, Some("c")).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn intercept_only_utility_has_no_terms() {
        let utility = parse("c", Some("c")).unwrap();
        assert!(utility.terms().is_empty());
        assert_eq!(utility.to_string(), "c");
    }

    #[test]
    fn wrong_intercept_is_rejected() {
        let err = parse("d + param1*var1", Some("c")).unwrap_err();
        assert!(matches!(
            err,
            ChoiceError::InterceptMismatch { ref found, ref expected } if found == "d" && expected == "c"
        ));
    }

    #[test]
    fn missing_intercept_is_rejected() {
        let err = parse("param1*var1", Some("c")).unwrap_err();
        assert!(matches!(err, ChoiceError::InterceptMismatch { .. }));
    }

    #[test]
    fn unexpected_leading_label_is_rejected() {
        let err = parse("c + param1*var1", None).unwrap_err();
        assert!(matches!(err, ChoiceError::InterceptMismatch { ref found, .. } if found == "c"));
    }

    #[test]
    fn malformed_terms_are_rejected() {
        for utility in ["c + param1", "c + param1*var1*var2", "c + *var1", "c + param1*var1 +"] {
            let err = parse(utility, Some("c")).unwrap_err();
            assert!(matches!(err, ChoiceError::MalformedTerm(_)), "{utility}");
        }
    }

    #[test]
    fn two_variables_in_a_term_are_rejected() {
        let err = parse("c + var1*var2", Some("c")).unwrap_err();
        assert!(matches!(
            err,
            ChoiceError::InvalidTermContents(ref a, ref b) if a == "var1" && b == "var2"
        ));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = parse("c + param1*var9", Some("c")).unwrap_err();
        assert!(matches!(err, ChoiceError::InvalidTermContents(..)));
        let err = parse("c + param1*param2", Some("c")).unwrap_err();
        assert!(matches!(err, ChoiceError::InvalidTermContents(..)));
    }

    #[test]
    fn duplicate_variables_and_parameters_are_rejected() {
        let err = parse("param1*var1 + param2*var1", None).unwrap_err();
        assert!(matches!(err, ChoiceError::DuplicateVariable(ref v) if v == "var1"));

        let err = parse("param1*var1 + param1*var2", None).unwrap_err();
        assert!(matches!(err, ChoiceError::DuplicateParameter(ref p) if p == "param1"));
    }
}
