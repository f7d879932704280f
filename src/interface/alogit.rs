//! ALOGIT interface: a command script plus a headerless, recoded data file.
//!
//! ALOGIT limits labels to ten characters, so every label the script mentions
//! goes through an [`Abbreviations`] table built once per interface. The
//! observed choice column is replaced by an integer column named `choice_no`
//! and decoded in the script with a `recode` directive.
//!
//! At most nine labels may share a truncation. Models whose labels share a
//! long common prefix, such as those from
//! [`synthetic_model`](crate::synthetic::synthetic_model), need a larger
//! `max_length` in [`AlogitOptions::abbreviation`].

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::abbreviation::{model_labels, Abbreviations};
use crate::data::DataTable;
use crate::encoding::ChoiceEncoding;
use crate::error::{ChoiceError, Result};
use crate::interface::{validated_model, EngineReport, Interface, Stage};
use crate::model::{Model, ModelKind, MultinomialLogit};
use crate::options::AlogitOptions;

/// Name of the integer choice column written to the data file.
pub const CHOICE_NUMBER_COLUMN: &str = "choice_no";

const COMMAND_TITLE: &str = "$title";
const COMMAND_ESTIMATE: &str = "$estimate";
const COMMAND_COEFFICIENTS: &str = "$coeff";
const COMMAND_ALTERNATIVES: &str = "$nest root()";
const COMMAND_ARRAY: &str = "$array";

/// Everything ALOGIT needs to run: the script and the data it refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct AlogitInput {
    /// Path the script is written to.
    pub alo_file: PathBuf,
    /// Path named in the script's `file` record.
    pub data_file: PathBuf,
    /// Text of the command script.
    pub script: String,
    /// Data with the choice column recoded; written without a header.
    pub data: DataTable,
}

impl AlogitInput {
    fn write_script(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.script)?;
        Ok(())
    }

    fn write_data(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.data.to_csv_writer(file, false)
    }
}

/// Writes the script under its file name and the data under `data_file`, which
/// is resolved against the staging directory when relative.
impl Stage for AlogitInput {
    fn stage(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let script = dir.join(self.alo_file.file_name().unwrap_or(self.alo_file.as_os_str()));
        self.write_script(&script)?;
        self.write_data(&dir.join(&self.data_file))?;
        Ok(vec![script])
    }
}

/// Translator from a multinomial logit model to ALOGIT input.
#[derive(Clone, Debug)]
pub struct AlogitInterface<'a> {
    model: &'a MultinomialLogit,
    abbreviations: Abbreviations,
    line_width: usize,
    input: AlogitInput,
}

impl<'a> AlogitInterface<'a> {
    /// Builds the abbreviation table, the script and the recoded data.
    pub fn new(model: &'a Model, options: AlogitOptions) -> Result<Self> {
        let model = validated_model::<Self>(model)?;
        let data = model.data().ok_or(ChoiceError::NoDataLoaded(Self::NAME))?;

        let mut labels = model_labels(model);
        labels.push(CHOICE_NUMBER_COLUMN);
        labels.extend(data.columns().iter().map(String::as_str));
        let abbreviations = Abbreviations::build(labels, &options.abbreviation)?;

        let encoding = ChoiceEncoding::new(model.alternatives(), 1);
        let stem = model.title().split(' ').next().unwrap_or("model");
        let data_file = options
            .data_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{stem}.csv")));
        let alo_file = options
            .alo_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{stem}.alo")));

        let data = recoded_data(model, data, &encoding)?;
        let mut interface = Self {
            model,
            abbreviations,
            line_width: options.line_width,
            input: AlogitInput {
                alo_file,
                data_file,
                script: String::new(),
                data,
            },
        };
        interface.input.script = interface.script();
        log::debug!(
            "created ALOGIT script for `{}` with {} abbreviated labels",
            model.title(),
            interface.abbreviations.len()
        );
        Ok(interface)
    }

    /// Abbreviation of a registered label.
    pub fn abbreviate(&self, label: &str) -> Option<&str> {
        self.abbreviations.abbreviate(label)
    }

    /// Full label behind an abbreviation.
    pub fn elongate(&self, abbreviation: &str) -> Option<&str> {
        self.abbreviations.elongate(abbreviation)
    }

    /// The abbreviation table used by this interface.
    pub fn abbreviations(&self) -> &Abbreviations {
        &self.abbreviations
    }

    /// Text of the command script.
    pub fn alo_script(&self) -> &str {
        &self.input.script
    }

    /// Writes the command script to the configured `.alo` path.
    pub fn write_alo_file(&self) -> Result<()> {
        self.input.write_script(&self.input.alo_file)
    }

    /// Writes the recoded data to the configured data path.
    pub fn write_data_file(&self) -> Result<()> {
        self.input.write_data(&self.input.data_file)
    }

    /// ALOGIT utility expression for `alternative`.
    ///
    /// Alternative-dependent variables are written as array elements,
    /// `variable(alternative)`.
    pub fn utility_string(&self, alternative: &str) -> Option<String> {
        let utility = self.model.utility(alternative)?;
        let mut parts = Vec::with_capacity(utility.terms().len() + 1);
        if let Some(intercept) = utility.intercept() {
            parts.push(self.short(intercept).to_string());
        }
        for term in utility.terms() {
            let variable = if self.model.is_alternative_dependent(&term.variable) {
                self.array(&term.variable, alternative)
            } else {
                self.short(&term.variable).to_string()
            };
            parts.push(format!("{}*{}", self.short(&term.parameter), variable));
        }
        Some(parts.join(" + "))
    }

    fn short<'s>(&'s self, label: &'s str) -> &'s str {
        self.abbreviations.abbreviate(label).unwrap_or(label)
    }

    fn array(&self, variable: &str, argument: &str) -> String {
        format!("{}({})", self.short(variable), self.short(argument))
    }

    fn record<I, S>(&self, command: &str, arguments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = vec![command.to_string()];
        for argument in arguments {
            words.extend(argument.as_ref().split(' ').map(str::to_string));
        }
        wrap(&words, self.line_width)
    }

    fn data_columns(&self) -> Vec<&str> {
        self.input
            .data
            .columns()
            .iter()
            .map(|column| self.short(column))
            .collect()
    }

    fn script(&self) -> String {
        let model = self.model;
        let mut script = String::new();

        script += &self.record(COMMAND_TITLE, [model.title()]);
        script += &self.record(COMMAND_ESTIMATE, Vec::<&str>::new());

        let coefficients = model
            .parameters()
            .iter()
            .chain(model.intercepts().values())
            .map(|label| self.short(label));
        script += &self.record(COMMAND_COEFFICIENTS, coefficients);

        let alternatives = model.alternatives().iter().map(|alt| self.short(alt));
        script += &self.record(COMMAND_ALTERNATIVES, alternatives);

        let file = format!("file (name={})", self.input.data_file.display());
        script += &self.record(&file, self.data_columns());

        for alternative in model.alternatives() {
            let command = format!("Avail({}) =", self.short(alternative));
            let column = &model.availability()[alternative];
            script += &self.record(&command, [self.short(column)]);
        }

        let choices = model
            .alternatives()
            .iter()
            .map(|alt| self.short(alt))
            .collect::<Vec<_>>()
            .join(", ");
        let recode = format!(
            "choice=recode({} {})",
            self.short(CHOICE_NUMBER_COLUMN),
            choices
        );
        script += &self.record(&recode, Vec::<&str>::new());

        for (variable, mapping) in model.alternative_dependent_variables() {
            script += &self.record(COMMAND_ARRAY, [format!("{}(alts)", self.short(variable))]);
            for alternative in model.alternatives() {
                if let Some(column) = mapping.get(alternative) {
                    let command = format!("{} =", self.array(variable, alternative));
                    script += &self.record(&command, [self.short(column)]);
                }
            }
        }

        for alternative in model.alternatives() {
            let command = format!("Util({}) =", self.short(alternative));
            let utility = self.utility_string(alternative).unwrap_or_default();
            script += &self.record(&command, [utility]);
        }

        script
    }
}

impl Interface for AlogitInterface<'_> {
    const NAME: &'static str = "ALOGIT";
    const VALID_MODELS: &'static [ModelKind] = &[ModelKind::MultinomialLogit];
    type Artifact = AlogitInput;

    fn artifact(&self) -> &AlogitInput {
        &self.input
    }

    fn translate_report(&self, report: EngineReport) -> EngineReport {
        let estimates = report
            .estimates
            .into_iter()
            .map(|(name, estimate)| {
                let full = self.elongate(&name).map(str::to_string).unwrap_or(name);
                (full, estimate)
            })
            .collect();
        EngineReport {
            estimates,
            ..report
        }
    }
}

/// Copy of `data` with the choice column renamed to `choice_no` and holding codes.
fn recoded_data(
    model: &MultinomialLogit,
    data: &DataTable,
    encoding: &ChoiceEncoding,
) -> Result<DataTable> {
    let choice_index = data
        .column_index(model.choice_column())
        .ok_or_else(|| ChoiceError::MissingField(model.choice_column().to_string()))?;

    let mut columns = data.columns().to_vec();
    columns[choice_index] = CHOICE_NUMBER_COLUMN.to_string();

    let mut rows = Vec::with_capacity(data.row_count());
    for (index, row) in data.rows().iter().enumerate() {
        let mut row = row.clone();
        row[choice_index] = encoding.encode(index, &row[choice_index])?.to_string();
        rows.push(row);
    }
    DataTable::new(columns, rows)
}

/// Joins `words` with single spaces, starting a new line whenever the next
/// word would pass `width`. Every line, including the last, ends in `\n`.
fn wrap(words: &[String], width: usize) -> String {
    let mut text = String::new();
    let mut line_length = 0usize;
    for word in words.iter().filter(|word| !word.is_empty()) {
        let length = word.chars().count();
        if line_length == 0 {
            text.push_str(word);
            line_length = length;
        } else if line_length + 1 + length <= width {
            text.push(' ');
            text.push_str(word);
            line_length += 1 + length;
        } else {
            text.push('\n');
            text.push_str(word);
            line_length = length;
        }
    }
    text.push('\n');
    text
}
