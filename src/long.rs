//! Wide-to-long reshaping of observation data.
//!
//! Wide data has one row per observation with a column per (alternative,
//! variable) pair. Long data has one row per (observation, alternative) with
//! the alternative-dependent variables resolved through that alternative's
//! column mapping. Variable cells are copied as text; only the availability
//! flag is interpreted.

use std::io::Write;

use crate::data::parse_number;
use crate::encoding::ChoiceEncoding;
use crate::error::{ChoiceError, Result};
use crate::model::ChoiceModel;

/// Fixed leading columns of a long table.
pub const OBSERVATION_COLUMN: &str = "observation";
pub const ALTERNATIVE_COLUMN: &str = "alternative";
pub const CHOSEN_COLUMN: &str = "choice_bool";
pub const AVAILABILITY_COLUMN: &str = "availability";

/// One (observation, alternative) row.
#[derive(Clone, Debug, PartialEq)]
pub struct LongRecord {
    /// Zero-based index of the observation in the wide data.
    pub observation: usize,
    /// Numeric code of the alternative.
    pub alternative: usize,
    /// Whether this alternative was the one chosen in the observation.
    pub chosen: bool,
    /// Whether the alternative was available to the decision maker.
    pub available: bool,
    /// Variable cells, unchanged, in the order of [`LongTable::variables`].
    pub values: Vec<String>,
}

/// Long-format observation data.
#[derive(Clone, Debug, PartialEq)]
pub struct LongTable {
    variables: Vec<String>,
    records: Vec<LongRecord>,
}

impl LongTable {
    /// Reshapes the data bound to `model`, numbering alternatives with `encoding`.
    pub fn from_model(model: &ChoiceModel, encoding: &ChoiceEncoding) -> Result<Self> {
        let data = model
            .data()
            .ok_or(ChoiceError::NoDataLoaded("long format"))?;

        let choice_index = data
            .column_index(model.choice_column())
            .ok_or_else(|| ChoiceError::MissingField(model.choice_column().to_string()))?;

        let variables: Vec<String> = model
            .all_variables()
            .into_iter()
            .map(str::to_string)
            .collect();

        // Resolve every column position once, in encoding order.
        let mut layout = Vec::with_capacity(encoding.len());
        for (alternative, code) in encoding.iter() {
            let availability = model
                .availability()
                .get(alternative)
                .ok_or_else(|| ChoiceError::UndefinedAvailability(alternative.to_string()))?;
            let availability = column_position(data.column_index(availability), availability)?;

            let mut fields = Vec::with_capacity(variables.len());
            for variable in &variables {
                let field = model.variable_field(variable, alternative).ok_or_else(|| {
                    ChoiceError::IncompleteVariableMapping {
                        variable: variable.clone(),
                        alternative: alternative.to_string(),
                    }
                })?;
                fields.push((field, column_position(data.column_index(field), field)?));
            }
            layout.push((code, availability, fields));
        }

        let mut records = Vec::with_capacity(data.row_count() * encoding.len());
        for (observation, row) in data.rows().iter().enumerate() {
            let chosen_code = encoding.encode(observation, &row[choice_index])?;
            for (code, availability, fields) in &layout {
                let available_column = &data.columns()[*availability];
                let available =
                    parse_number(available_column, observation, &row[*availability])? != 0.0;

                let values = fields
                    .iter()
                    .map(|(_, index)| row[*index].clone())
                    .collect();

                records.push(LongRecord {
                    observation,
                    alternative: *code,
                    chosen: *code == chosen_code,
                    available,
                    values,
                });
            }
        }

        log::debug!(
            "reshaped {} observations into {} long rows",
            data.row_count(),
            records.len()
        );
        Ok(Self { variables, records })
    }

    /// Variable columns following the fixed leading columns.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// All rows, grouped by observation in alternative order.
    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header of the table: the fixed columns followed by the variables.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![
            OBSERVATION_COLUMN,
            ALTERNATIVE_COLUMN,
            CHOSEN_COLUMN,
            AVAILABILITY_COLUMN,
        ];
        columns.extend(self.variables.iter().map(String::as_str));
        columns
    }

    /// Cells of `variable` down the whole table.
    pub fn variable_column(&self, variable: &str) -> Option<Vec<&str>> {
        let index = self.variables.iter().position(|name| name == variable)?;
        Some(
            self.records
                .iter()
                .map(|record| record.values[index].as_str())
                .collect(),
        )
    }

    /// Writes the table as CSV with a header row; flags are written as `0`/`1`.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        writer.write_record(self.columns())?;
        for record in &self.records {
            let mut cells = vec![
                record.observation.to_string(),
                record.alternative.to_string(),
                u8::from(record.chosen).to_string(),
                u8::from(record.available).to_string(),
            ];
            cells.extend(record.values.iter().cloned());
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn column_position(index: Option<usize>, name: &str) -> Result<usize> {
    index.ok_or_else(|| ChoiceError::MissingField(name.to_string()))
}
