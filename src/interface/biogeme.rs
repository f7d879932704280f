//! Biogeme interface.
//!
//! Biogeme identifies alternatives by integer, so the observed choice is
//! recoded into a `choice_int` column numbered from one and the original
//! column dropped. The model itself is described as a serializable
//! [`BiogemeSpecification`] that a driver script turns into Biogeme
//! expressions.

use std::fs::File;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::DataTable;
use crate::encoding::ChoiceEncoding;
use crate::error::{ChoiceError, Result};
use crate::interface::{validated_model, Interface, Stage};
use crate::model::{Model, ModelKind, MultinomialLogit};

/// Name of the integer choice column added to the data.
pub const CHOICE_COLUMN: &str = "choice_int";

/// A coefficient to estimate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Beta {
    pub name: String,
    /// Starting value.
    pub start: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Fixed coefficients keep their starting value.
    pub fixed: bool,
}

impl Beta {
    /// Free, unbounded coefficient starting at zero.
    pub fn free(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: 0.0,
            lower_bound: None,
            upper_bound: None,
            fixed: false,
        }
    }
}

/// `parameter * variable` with the variable resolved to its data column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinearTerm {
    pub parameter: String,
    pub field: String,
}

/// Utility of one alternative in terms of data columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BiogemeUtility {
    pub terms: Vec<LinearTerm>,
    pub intercept: Option<String>,
}

/// Everything Biogeme needs to estimate a multinomial logit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BiogemeSpecification {
    pub model_name: String,
    /// Column holding the integer choice.
    pub choice: String,
    /// Non-intercept parameters followed by the intercepts.
    pub parameters: Vec<Beta>,
    /// Data columns referenced by the model, including the choice column.
    pub variables: Vec<String>,
    /// Availability column per alternative code.
    pub availability: IndexMap<usize, String>,
    /// Utility per alternative code.
    pub utilities: IndexMap<usize, BiogemeUtility>,
    /// Recoded observation data; staged separately as CSV.
    #[serde(skip)]
    pub data: DataTable,
}

impl BiogemeSpecification {
    /// Pretty-printed JSON of everything except the data.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn stem(&self) -> String {
        let stem: String = self
            .model_name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        if stem.is_empty() {
            "model".to_string()
        } else {
            stem
        }
    }
}

impl Stage for BiogemeSpecification {
    fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let stem = self.stem();
        let specification = dir.join(format!("{stem}.json"));
        let data = dir.join(format!("{stem}.csv"));

        std::fs::write(&specification, self.to_json()?)?;
        self.data.to_csv_writer(File::create(&data)?, true)?;
        Ok(vec![specification, data])
    }
}

/// Translator from a multinomial logit model to a [`BiogemeSpecification`].
#[derive(Clone, Debug)]
pub struct BiogemeInterface<'a> {
    model: &'a MultinomialLogit,
    encoding: ChoiceEncoding,
    specification: BiogemeSpecification,
}

impl<'a> BiogemeInterface<'a> {
    pub fn new(model: &'a Model) -> Result<Self> {
        let model = validated_model::<Self>(model)?;
        let data = model.data().ok_or(ChoiceError::NoDataLoaded(Self::NAME))?;
        let encoding = ChoiceEncoding::new(model.alternatives(), 1);

        let parameters = model
            .parameters()
            .iter()
            .chain(model.intercepts().values())
            .map(Beta::free)
            .collect();

        let mut variables: Vec<String> = model
            .all_variable_fields()
            .into_iter()
            .map(str::to_string)
            .collect();
        variables.push(CHOICE_COLUMN.to_string());

        let mut availability = IndexMap::with_capacity(encoding.len());
        let mut utilities = IndexMap::with_capacity(encoding.len());
        for (alternative, code) in encoding.iter() {
            if let Some(column) = model.availability().get(alternative) {
                availability.insert(code, column.clone());
            }
            if let Some(utility) = model.utility(alternative) {
                let terms = utility
                    .terms()
                    .iter()
                    .map(|term| LinearTerm {
                        parameter: term.parameter.clone(),
                        field: model
                            .variable_field(&term.variable, alternative)
                            .unwrap_or(term.variable.as_str())
                            .to_string(),
                    })
                    .collect();
                utilities.insert(
                    code,
                    BiogemeUtility {
                        terms,
                        intercept: utility.intercept().map(str::to_string),
                    },
                );
            }
        }

        let specification = BiogemeSpecification {
            model_name: model.title().to_string(),
            choice: CHOICE_COLUMN.to_string(),
            parameters,
            variables,
            availability,
            utilities,
            data: recoded_data(model.choice_column(), data, &encoding)?,
        };
        log::debug!(
            "created Biogeme specification for `{}` with {} coefficients",
            model.title(),
            specification.parameters.len()
        );

        Ok(Self {
            model,
            encoding,
            specification,
        })
    }

    /// The translated model.
    pub fn model(&self) -> &MultinomialLogit {
        self.model
    }

    /// Alternative numbering used in the data and the utilities.
    pub fn encoding(&self) -> &ChoiceEncoding {
        &self.encoding
    }

    pub fn specification(&self) -> &BiogemeSpecification {
        &self.specification
    }
}

impl Interface for BiogemeInterface<'_> {
    const NAME: &'static str = "Biogeme";
    const VALID_MODELS: &'static [ModelKind] = &[ModelKind::MultinomialLogit];
    type Artifact = BiogemeSpecification;

    fn artifact(&self) -> &BiogemeSpecification {
        &self.specification
    }
}

/// Drops the choice column and appends its integer code as `choice_int`.
fn recoded_data(
    choice_column: &str,
    data: &DataTable,
    encoding: &ChoiceEncoding,
) -> Result<DataTable> {
    let choice_index = data
        .column_index(choice_column)
        .ok_or_else(|| ChoiceError::MissingField(choice_column.to_string()))?;

    let mut columns = data.columns().to_vec();
    columns.remove(choice_index);
    columns.push(CHOICE_COLUMN.to_string());

    let mut rows = Vec::with_capacity(data.row_count());
    for (index, row) in data.rows().iter().enumerate() {
        let mut row = row.clone();
        let label = row.remove(choice_index);
        row.push(encoding.encode(index, &label)?.to_string());
        rows.push(row);
    }
    DataTable::new(columns, rows)
}
