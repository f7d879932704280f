//! PyLogit interface.
//!
//! PyLogit estimates from long-format data together with a specification
//! mapping each long-table column to groups of alternative codes. Alternatives
//! in the same group share one coefficient; the parallel `names` map gives the
//! coefficient label of every group. Intercepts live under an `intercept`
//! column, which the driver adds to the long table as a column of ones.

use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::encoding::ChoiceEncoding;
use crate::error::Result;
use crate::interface::{validated_model, Interface, Stage};
use crate::long::{
    LongTable, ALTERNATIVE_COLUMN, AVAILABILITY_COLUMN, CHOSEN_COLUMN, OBSERVATION_COLUMN,
};
use crate::model::{Model, ModelKind, MultinomialLogit};

/// Specification key holding the alternative-specific constants.
pub const INTERCEPT_COLUMN: &str = "intercept";

/// Long data plus the grouped specification PyLogit expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PylogitSpecification {
    pub observation_column: &'static str,
    pub alternative_column: &'static str,
    pub choice_column: &'static str,
    pub availability_column: &'static str,
    /// Column to groups of alternative codes sharing a coefficient.
    pub specification: IndexMap<String, Vec<Vec<usize>>>,
    /// Column to the coefficient label of each group.
    pub names: IndexMap<String, Vec<String>>,
    /// Long-format observations; staged separately as CSV.
    #[serde(skip)]
    pub long: LongTable,
}

impl Stage for PylogitSpecification {
    fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let specification = dir.join("specification.json");
        let data = dir.join("long.csv");

        std::fs::write(&specification, serde_json::to_string_pretty(self)?)?;
        self.long.to_csv_writer(File::create(&data)?)?;
        Ok(vec![specification, data])
    }
}

/// Translator from a multinomial logit model to a [`PylogitSpecification`].
#[derive(Clone, Debug)]
pub struct PylogitInterface<'a> {
    model: &'a MultinomialLogit,
    encoding: ChoiceEncoding,
    specification: PylogitSpecification,
}

impl<'a> PylogitInterface<'a> {
    pub fn new(model: &'a Model) -> Result<Self> {
        let model = validated_model::<Self>(model)?;
        let encoding = ChoiceEncoding::new(model.alternatives(), 1);
        let long = LongTable::from_model(model, &encoding)?;
        let (specification, names) = grouped_specification(model, &encoding);

        log::debug!(
            "created pylogit specification for `{}` over {} long rows",
            model.title(),
            long.len()
        );
        Ok(Self {
            model,
            encoding,
            specification: PylogitSpecification {
                observation_column: OBSERVATION_COLUMN,
                alternative_column: ALTERNATIVE_COLUMN,
                choice_column: CHOSEN_COLUMN,
                availability_column: AVAILABILITY_COLUMN,
                specification,
                names,
                long,
            },
        })
    }

    /// The translated model.
    pub fn model(&self) -> &MultinomialLogit {
        self.model
    }

    /// Alternative numbering used in the long table.
    pub fn encoding(&self) -> &ChoiceEncoding {
        &self.encoding
    }

    pub fn specification(&self) -> &PylogitSpecification {
        &self.specification
    }

    /// Long-format observations.
    pub fn long_data(&self) -> &LongTable {
        &self.specification.long
    }
}

impl Interface for PylogitInterface<'_> {
    const NAME: &'static str = "pylogit";
    const VALID_MODELS: &'static [ModelKind] = &[ModelKind::MultinomialLogit];
    type Artifact = PylogitSpecification;

    fn artifact(&self) -> &PylogitSpecification {
        &self.specification
    }
}

type Groups = IndexMap<String, Vec<Vec<usize>>>;
type Names = IndexMap<String, Vec<String>>;

fn grouped_specification(model: &MultinomialLogit, encoding: &ChoiceEncoding) -> (Groups, Names) {
    let mut groups = Groups::new();
    let mut names = Names::new();

    let intercepts: Vec<(usize, &str)> = encoding
        .iter()
        .filter_map(|(alternative, code)| {
            model
                .utility(alternative)
                .and_then(|utility| utility.intercept())
                .map(|intercept| (code, intercept))
        })
        .collect();
    if !intercepts.is_empty() {
        groups.insert(
            INTERCEPT_COLUMN.to_string(),
            intercepts.iter().map(|(code, _)| vec![*code]).collect(),
        );
        names.insert(
            INTERCEPT_COLUMN.to_string(),
            intercepts.iter().map(|(_, name)| name.to_string()).collect(),
        );
    }

    for variable in model.all_variables() {
        let mut by_parameter: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (alternative, code) in encoding.iter() {
            let parameter = model
                .utility(alternative)
                .and_then(|utility| utility.parameter_for(variable));
            if let Some(parameter) = parameter {
                by_parameter.entry(parameter).or_default().push(code);
            }
        }
        if by_parameter.is_empty() {
            continue;
        }
        names.insert(
            variable.to_string(),
            by_parameter.keys().map(|name| name.to_string()).collect(),
        );
        groups.insert(variable.to_string(), by_parameter.into_values().collect());
    }

    (groups, names)
}
