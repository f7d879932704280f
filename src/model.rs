//! Choice model definitions and the validation performed when building them.
//!
//! A [`ChoiceModel`] describes the alternatives, availability columns,
//! variables, intercepts and parameters of a discrete choice problem. A
//! [`MultinomialLogit`] adds one parsed [`Utility`] per alternative. Both can be
//! built programmatically through [`ChoiceModelBuilder`] or read from a YAML
//! document with the keys `title`, `alternatives`, `choice_column`,
//! `availability`, `alternative_independent_variables`,
//! `alternative_dependent_variables`, `intercepts`, `parameters` and, for the
//! multinomial logit, `specification`.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::data::DataTable;
use crate::error::{ChoiceError, Result};
use crate::utility::Utility;

/// Tag naming the model variants that interfaces can accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// A bare model definition without utility functions.
    ChoiceModel,
    /// A model with one linear utility per alternative.
    MultinomialLogit,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::ChoiceModel => f.write_str("ChoiceModel"),
            ModelKind::MultinomialLogit => f.write_str("MultinomialLogit"),
        }
    }
}

/// Observation data handed to [`ChoiceModel::load_data`].
pub enum DataSource {
    /// A table that is already in memory.
    Table(DataTable),
    /// A stream of comma separated text with a header row.
    Reader(Box<dyn Read>),
}

impl DataSource {
    /// Wraps any readable stream of CSV text.
    pub fn reader<R: Read + 'static>(reader: R) -> Self {
        Self::Reader(Box::new(reader))
    }
}

impl From<DataTable> for DataSource {
    fn from(table: DataTable) -> Self {
        Self::Table(table)
    }
}

/// Structural definition shared by every choice model.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceModel {
    title: String,
    alternatives: Vec<String>,
    choice_column: String,
    availability: IndexMap<String, String>,
    alternative_independent_variables: Vec<String>,
    alternative_dependent_variables: IndexMap<String, IndexMap<String, String>>,
    intercepts: IndexMap<String, String>,
    parameters: Vec<String>,
    data: Option<DataTable>,
}

impl ChoiceModel {
    /// Start building a model; see [`ChoiceModelBuilder`].
    pub fn builder<T, C>(title: T, choice_column: C) -> ChoiceModelBuilder
    where
        T: Into<String>,
        C: Into<String>,
    {
        ChoiceModelBuilder::new(title, choice_column)
    }

    /// Reads a model definition from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        ModelDocument::parse(yaml)?.into_builder()?.build()
    }

    /// Reads a model definition from a YAML stream.
    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self> {
        ModelDocument::from_reader(reader)?.into_builder()?.build()
    }

    /// Human-readable model title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Alternatives in declaration order.
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Data column holding the observed choice.
    pub fn choice_column(&self) -> &str {
        &self.choice_column
    }

    /// Availability column per alternative.
    pub fn availability(&self) -> &IndexMap<String, String> {
        &self.availability
    }

    /// Variables whose column is shared by all alternatives.
    pub fn alternative_independent_variables(&self) -> &[String] {
        &self.alternative_independent_variables
    }

    /// Variables with one column per alternative.
    pub fn alternative_dependent_variables(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.alternative_dependent_variables
    }

    /// Returns whether `variable` takes a different column for each alternative.
    pub fn is_alternative_dependent(&self, variable: &str) -> bool {
        self.alternative_dependent_variables.contains_key(variable)
    }

    /// Intercept parameter per alternative; one alternative has none.
    pub fn intercepts(&self) -> &IndexMap<String, String> {
        &self.intercepts
    }

    /// Intercept label of `alternative`, if it has one.
    pub fn intercept_for(&self, alternative: &str) -> Option<&str> {
        self.intercepts.get(alternative).map(String::as_str)
    }

    /// Non-intercept parameters.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Bound observation data, if any has been loaded.
    pub fn data(&self) -> Option<&DataTable> {
        self.data.as_ref()
    }

    /// All variable names, alternative-independent first.
    pub fn all_variables(&self) -> Vec<&str> {
        self.alternative_independent_variables
            .iter()
            .chain(self.alternative_dependent_variables.keys())
            .map(String::as_str)
            .collect()
    }

    /// Data columns holding variable values.
    ///
    /// Alternative-independent variables are their own column; dependent
    /// variables expand to their per-alternative columns.
    pub fn all_variable_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .alternative_independent_variables
            .iter()
            .map(String::as_str)
            .collect();
        for mapping in self.alternative_dependent_variables.values() {
            fields.extend(
                self.alternatives
                    .iter()
                    .filter_map(|alternative| mapping.get(alternative))
                    .map(String::as_str),
            );
        }
        fields
    }

    /// Column of `variable` for `alternative`.
    pub fn variable_field(&self, variable: &str, alternative: &str) -> Option<&str> {
        match self.alternative_dependent_variables.get(variable) {
            Some(mapping) => mapping.get(alternative).map(String::as_str),
            None => self
                .alternative_independent_variables
                .iter()
                .find(|name| name.as_str() == variable)
                .map(String::as_str),
        }
    }

    /// Availability columns in alternative order.
    pub fn availability_fields(&self) -> Vec<&str> {
        self.alternatives
            .iter()
            .filter_map(|alternative| self.availability.get(alternative))
            .map(String::as_str)
            .collect()
    }

    /// Number of alternatives.
    pub fn number_of_alternatives(&self) -> usize {
        self.alternatives.len()
    }

    /// Number of distinct variables.
    pub fn number_of_variables(&self) -> usize {
        self.alternative_independent_variables.len() + self.alternative_dependent_variables.len()
    }

    /// Number of parameters, optionally counting the intercepts.
    pub fn number_of_parameters(&self, include_intercepts: bool) -> usize {
        if include_intercepts {
            self.parameters.len() + self.intercepts.len()
        } else {
            self.parameters.len()
        }
    }

    /// Binds observation data, replacing any previously loaded table.
    ///
    /// The choice column, every availability column and every variable field
    /// must be present; the first missing one is reported. On failure the
    /// previously bound table is left in place.
    pub fn load_data(&mut self, source: impl Into<DataSource>) -> Result<()> {
        let table = match source.into() {
            DataSource::Table(table) => table,
            DataSource::Reader(reader) => DataTable::from_csv_reader(reader)?,
        };

        table.require_columns(std::iter::once(self.choice_column.as_str()))?;
        table.require_columns(self.availability_fields())?;
        table.require_columns(self.all_variable_fields())?;

        log::debug!(
            "bound {} observations to model `{}`",
            table.row_count(),
            self.title
        );
        self.data = Some(table);
        Ok(())
    }

    /// Reads a CSV file from disk and binds it.
    pub fn load_data_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let table = DataTable::from_csv_path(path)?;
        self.load_data(table)
    }
}

/// Multinomial logit model: a [`ChoiceModel`] with a utility per alternative.
#[derive(Clone, Debug, PartialEq)]
pub struct MultinomialLogit {
    model: ChoiceModel,
    specification: IndexMap<String, Utility>,
}

impl MultinomialLogit {
    /// Reads a model definition, including `specification`, from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        ModelDocument::parse(yaml)?.into_multinomial_logit()
    }

    /// Reads a model definition, including `specification`, from a YAML stream.
    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self> {
        ModelDocument::from_reader(reader)?.into_multinomial_logit()
    }

    /// Parsed utilities keyed by alternative, in alternative order.
    pub fn specification(&self) -> &IndexMap<String, Utility> {
        &self.specification
    }

    /// Utility of `alternative`.
    pub fn utility(&self, alternative: &str) -> Option<&Utility> {
        self.specification.get(alternative)
    }

    /// Underlying structural model.
    pub fn model(&self) -> &ChoiceModel {
        &self.model
    }

    /// See [`ChoiceModel::load_data`].
    pub fn load_data(&mut self, source: impl Into<DataSource>) -> Result<()> {
        self.model.load_data(source)
    }

    /// See [`ChoiceModel::load_data_file`].
    pub fn load_data_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.model.load_data_file(path)
    }
}

impl Deref for MultinomialLogit {
    type Target = ChoiceModel;

    fn deref(&self) -> &ChoiceModel {
        &self.model
    }
}

/// Any model variant, tagged so interfaces can check what they accept.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
    Choice(ChoiceModel),
    MultinomialLogit(MultinomialLogit),
}

impl Model {
    /// Variant tag of this model.
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Choice(_) => ModelKind::ChoiceModel,
            Model::MultinomialLogit(_) => ModelKind::MultinomialLogit,
        }
    }

    /// Structural definition shared by all variants.
    pub fn base(&self) -> &ChoiceModel {
        match self {
            Model::Choice(model) => model,
            Model::MultinomialLogit(model) => &model.model,
        }
    }

    /// Returns the multinomial logit variant, if this is one.
    pub fn as_multinomial_logit(&self) -> Option<&MultinomialLogit> {
        match self {
            Model::MultinomialLogit(model) => Some(model),
            Model::Choice(_) => None,
        }
    }

    /// See [`ChoiceModel::load_data`].
    pub fn load_data(&mut self, source: impl Into<DataSource>) -> Result<()> {
        match self {
            Model::Choice(model) => model.load_data(source),
            Model::MultinomialLogit(model) => model.load_data(source),
        }
    }
}

impl From<ChoiceModel> for Model {
    fn from(model: ChoiceModel) -> Self {
        Model::Choice(model)
    }
}

impl From<MultinomialLogit> for Model {
    fn from(model: MultinomialLogit) -> Self {
        Model::MultinomialLogit(model)
    }
}

/// Builder that validates the model structure before constructing it.
#[derive(Clone, Debug, Default)]
pub struct ChoiceModelBuilder {
    title: String,
    alternatives: Vec<String>,
    choice_column: String,
    availability: IndexMap<String, String>,
    alternative_independent_variables: Vec<String>,
    alternative_dependent_variables: IndexMap<String, IndexMap<String, String>>,
    intercepts: IndexMap<String, String>,
    parameters: Vec<String>,
}

impl ChoiceModelBuilder {
    /// Start building a model with a title and the column holding observed choices.
    pub fn new<T, C>(title: T, choice_column: C) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            title: title.into(),
            choice_column: choice_column.into(),
            ..Self::default()
        }
    }

    /// Sets the alternatives; their order fixes every later encoding.
    pub fn alternatives<I, S>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives = alternatives.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the availability column of each alternative.
    pub fn availability<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.availability = collect_pairs(entries);
        self
    }

    /// Sets the variables shared by all alternatives.
    pub fn alternative_independent_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_independent_variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a variable with one column per alternative.
    pub fn alternative_dependent_variable<N, I, K, V>(mut self, name: N, columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.alternative_dependent_variables
            .insert(name.into(), collect_pairs(columns));
        self
    }

    /// Sets the intercept label of each alternative that has one.
    pub fn intercepts<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.intercepts = collect_pairs(entries);
        self
    }

    /// Sets the non-intercept parameters.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Finalizes construction after validating the model structure.
    pub fn build(self) -> Result<ChoiceModel> {
        if self.alternatives.len() < 2 {
            return Err(ChoiceError::TooFewAlternatives {
                found: self.alternatives.len(),
            });
        }

        let mut seen = HashSet::new();
        for alternative in &self.alternatives {
            if !seen.insert(alternative.as_str()) {
                return Err(ChoiceError::DuplicateAlternative(alternative.clone()));
            }
        }

        for alternative in &self.alternatives {
            if !self.availability.contains_key(alternative) {
                return Err(ChoiceError::UndefinedAvailability(alternative.clone()));
            }
        }

        let required = self.alternatives.len() - 1;
        if self.intercepts.len() != required {
            return Err(ChoiceError::IncorrectNumberOfIntercepts {
                found: self.intercepts.len(),
                required,
            });
        }

        for alternative in self.intercepts.keys() {
            if !seen.contains(alternative.as_str()) {
                return Err(ChoiceError::unknown_alternative("intercepts", alternative));
            }
        }

        for (variable, mapping) in &self.alternative_dependent_variables {
            for alternative in mapping.keys() {
                if !seen.contains(alternative.as_str()) {
                    return Err(ChoiceError::unknown_alternative(
                        "alternative_dependent_variables",
                        alternative,
                    ));
                }
            }
            for alternative in &self.alternatives {
                if !mapping.contains_key(alternative) {
                    return Err(ChoiceError::IncompleteVariableMapping {
                        variable: variable.clone(),
                        alternative: alternative.clone(),
                    });
                }
            }
        }

        log::debug!(
            "built choice model `{}` with {} alternatives",
            self.title,
            self.alternatives.len()
        );

        Ok(ChoiceModel {
            title: self.title,
            alternatives: self.alternatives,
            choice_column: self.choice_column,
            availability: self.availability,
            alternative_independent_variables: self.alternative_independent_variables,
            alternative_dependent_variables: self.alternative_dependent_variables,
            intercepts: self.intercepts,
            parameters: self.parameters,
            data: None,
        })
    }

    /// Builds a multinomial logit model, parsing one utility string per alternative.
    pub fn build_multinomial_logit<I, K, V>(self, specification: I) -> Result<MultinomialLogit>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let model = self.build()?;
        let raw: IndexMap<String, String> = collect_pairs(specification);

        for alternative in raw.keys() {
            if !model.alternatives.contains(alternative) {
                return Err(ChoiceError::unknown_alternative("specification", alternative));
            }
        }

        let variables = model.all_variables();
        let mut parsed = IndexMap::with_capacity(model.alternatives.len());
        for alternative in &model.alternatives {
            let utility_string = raw
                .get(alternative)
                .ok_or_else(|| ChoiceError::MissingSpecification(alternative.clone()))?;
            let utility = Utility::parse(
                utility_string,
                &variables,
                model.intercept_for(alternative),
                &model.parameters,
            )?;
            parsed.insert(alternative.clone(), utility);
        }

        Ok(MultinomialLogit {
            model,
            specification: parsed,
        })
    }
}

fn collect_pairs<I, K, V>(entries: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Raw YAML model definition. Every key is optional here so that a missing key
/// can be reported by name rather than as a generic parse failure.
///
/// A key that is present with a null value is not missing: null lists and
/// maps read as empty, and a null title or choice column is reported as such.
#[derive(Debug, Deserialize)]
struct ModelDocument {
    #[serde(default, deserialize_with = "present")]
    title: Option<Option<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    alternatives: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    choice_column: Option<Option<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    availability: Option<IndexMap<String, String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    alternative_independent_variables: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    alternative_dependent_variables: Option<IndexMap<String, IndexMap<String, String>>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    intercepts: Option<IndexMap<String, String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    parameters: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    specification: Option<IndexMap<String, String>>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

impl ModelDocument {
    fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml_ng::from_reader(reader)?)
    }

    /// Checks the base keys first, then `specification`.
    fn into_multinomial_logit(mut self) -> Result<MultinomialLogit> {
        let specification = self.specification.take();
        let builder = self.into_builder()?;
        builder.build_multinomial_logit(required(specification, "specification")?)
    }

    fn into_builder(self) -> Result<ChoiceModelBuilder> {
        let title = scalar(self.title, "title")?;
        let alternatives = required(self.alternatives, "alternatives")?;
        let choice_column = scalar(self.choice_column, "choice_column")?;
        let availability = required(self.availability, "availability")?;
        let independent = required(
            self.alternative_independent_variables,
            "alternative_independent_variables",
        )?;
        let dependent = required(
            self.alternative_dependent_variables,
            "alternative_dependent_variables",
        )?;
        let intercepts = required(self.intercepts, "intercepts")?;
        let parameters = required(self.parameters, "parameters")?;

        let mut builder = ChoiceModelBuilder::new(title, choice_column)
            .alternatives(alternatives)
            .availability(availability)
            .alternative_independent_variables(independent)
            .intercepts(intercepts)
            .parameters(parameters);
        for (variable, columns) in dependent {
            builder = builder.alternative_dependent_variable(variable, columns);
        }
        Ok(builder)
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| ChoiceError::MissingKey(key.to_string()))
}

fn scalar<T>(value: Option<Option<T>>, key: &str) -> Result<T> {
    required(value, key)?.ok_or_else(|| ChoiceError::NullKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_MODEL: &str = "
title: Simple model
alternatives:
  - choice1
  - choice2
choice_column: alternative
availability:
  choice1: avail_choice1
  choice2: avail_choice2
alternative_independent_variables:
  - var1
  - var2
alternative_dependent_variables:
  var3:
    choice1: choice1_var3
    choice2: choice2_var3
intercepts:
  choice1: cchoice1
parameters:
  - p1
  - p2
  - p3
specification:
  choice1: cchoice1 + p1*var1 + p3*var3
  choice2: p2*var2 + p3*var3
";

    const SIMPLE_DATA: &str = "var1,var2,choice1_var3,choice2_var3,avail_choice1,avail_choice2,alternative
1,2,3,4,1,1,choice1
5,6,7,8,1,1,choice2
";

    fn two_alternative_builder() -> ChoiceModelBuilder {
        ChoiceModel::builder("Simple model", "alternative")
            .alternatives(["choice1", "choice2"])
            .availability([("choice1", "avail_choice1"), ("choice2", "avail_choice2")])
            .alternative_independent_variables(["var1", "var2"])
            .alternative_dependent_variable(
                "var3",
                [("choice1", "choice1_var3"), ("choice2", "choice2_var3")],
            )
            .intercepts([("choice1", "cchoice1")])
            .parameters(["p1", "p2", "p3"])
    }

    #[test]
    fn reads_yaml_definition() {
        let model = MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap();
        assert_eq!(model.title(), "Simple model");
        assert_eq!(model.alternatives(), ["choice1", "choice2"]);
        assert_eq!(model.choice_column(), "alternative");
        assert_eq!(model.all_variables(), vec!["var1", "var2", "var3"]);
        assert_eq!(
            model.all_variable_fields(),
            vec!["var1", "var2", "choice1_var3", "choice2_var3"]
        );
        assert_eq!(
            model.availability_fields(),
            vec!["avail_choice1", "avail_choice2"]
        );
        assert_eq!(model.utility("choice1").unwrap().intercept(), Some("cchoice1"));
        assert_eq!(model.utility("choice2").unwrap().intercept(), None);
        assert!(model.data().is_none());
    }

    #[test]
    fn builder_and_yaml_agree() {
        let from_yaml = MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap();
        let built = two_alternative_builder()
            .build_multinomial_logit([
                ("choice1", "cchoice1 + var1*p1 + p3*var3"),
                ("choice2", "var3*p3 + p2*var2"),
            ])
            .unwrap();
        assert_eq!(from_yaml, built);
    }

    #[test]
    fn base_model_ignores_specification() {
        let model = ChoiceModel::from_yaml_str(SIMPLE_MODEL).unwrap();
        assert_eq!(model.number_of_alternatives(), 2);
        assert_eq!(model.number_of_variables(), 3);
        assert_eq!(model.number_of_parameters(true), 4);
        assert_eq!(model.number_of_parameters(false), 3);
        assert_eq!(Model::from(model).kind(), ModelKind::ChoiceModel);
    }

    #[test]
    fn missing_key_is_named() {
        let yaml = SIMPLE_MODEL.replace("choice_column: alternative\n", "");
        let err = ChoiceModel::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ChoiceError::MissingKey(ref key) if key == "choice_column"));

        let yaml = SIMPLE_MODEL.split("specification:").next().unwrap().to_string();
        let err = MultinomialLogit::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ChoiceError::MissingKey(ref key) if key == "specification"));
    }

    #[test]
    fn base_keys_are_reported_before_specification() {
        let yaml = SIMPLE_MODEL
            .split("specification:")
            .next()
            .unwrap()
            .replace("title: Simple model\n", "");
        let err = MultinomialLogit::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ChoiceError::MissingKey(ref key) if key == "title"));
    }

    #[test]
    fn null_collections_read_as_empty() {
        let yaml = "
title: No variables
alternatives: [a, b]
choice_column: choice
availability: {a: av_a, b: av_b}
alternative_independent_variables:
alternative_dependent_variables: ~
intercepts: {a: ca}
parameters: null
";
        let model = ChoiceModel::from_yaml_str(yaml).unwrap();
        assert!(model.all_variables().is_empty());
        assert!(model.parameters().is_empty());

        let err = ChoiceModel::from_yaml_str(&yaml.replace("choice_column: choice", "choice_column:"))
            .unwrap_err();
        assert!(matches!(err, ChoiceError::NullKey(ref key) if key == "choice_column"));
    }

    #[test]
    fn undefined_availability_names_alternative() {
        let err = two_alternative_builder()
            .availability([("choice1", "avail_choice1")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ChoiceError::UndefinedAvailability(ref alt) if alt == "choice2"));
    }

    #[test]
    fn intercept_count_reports_both_numbers() {
        let err = ChoiceModel::builder("three", "choice")
            .alternatives(["a", "b", "c"])
            .availability([("a", "av_a"), ("b", "av_b"), ("c", "av_c")])
            .intercepts([("a", "ca")])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ChoiceError::IncorrectNumberOfIntercepts {
                found: 1,
                required: 2
            }
        ));
    }

    #[test]
    fn mappings_must_reference_declared_alternatives() {
        let err = two_alternative_builder()
            .intercepts([("choice3", "cchoice3")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ChoiceError::UnknownAlternative { context: "intercepts", .. }));

        let err = two_alternative_builder()
            .alternative_dependent_variable("var4", [("choice1", "choice1_var4")])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ChoiceError::IncompleteVariableMapping { ref variable, ref alternative }
                if variable == "var4" && alternative == "choice2"
        ));
    }

    #[test]
    fn rejects_degenerate_alternative_sets() {
        let err = ChoiceModel::builder("one", "choice")
            .alternatives(["a"])
            .availability([("a", "av_a")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ChoiceError::TooFewAlternatives { found: 1 }));

        let err = ChoiceModel::builder("dup", "choice")
            .alternatives(["a", "a"])
            .availability([("a", "av_a")])
            .intercepts([("a", "ca")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ChoiceError::DuplicateAlternative(ref alt) if alt == "a"));
    }

    #[test]
    fn utility_errors_surface_from_build() {
        let err = two_alternative_builder()
            .build_multinomial_logit([("choice1", "cchoice1 + var1*var2"), ("choice2", "p2*var2")])
            .unwrap_err();
        assert!(matches!(err, ChoiceError::InvalidTermContents(..)));

        let err = two_alternative_builder()
            .build_multinomial_logit([("choice1", "cchoice1 + p1*var1")])
            .unwrap_err();
        assert!(matches!(err, ChoiceError::MissingSpecification(ref alt) if alt == "choice2"));
    }

    #[test]
    fn load_data_binds_table() {
        let mut model = MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap();
        model.load_data(DataSource::reader(SIMPLE_DATA.as_bytes())).unwrap();
        assert_eq!(model.data().unwrap().row_count(), 2);
    }

    #[test]
    fn missing_availability_column_is_reported_and_old_data_kept() {
        let mut model = MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap();
        model.load_data(DataSource::reader(SIMPLE_DATA.as_bytes())).unwrap();

        let broken = SIMPLE_DATA.replace("avail_choice2", "avail_other");
        let err = model
            .load_data(DataSource::reader(std::io::Cursor::new(broken)))
            .unwrap_err();
        assert!(matches!(err, ChoiceError::MissingField(ref field) if field == "avail_choice2"));
        assert_eq!(model.data().unwrap().columns()[5], "avail_choice2");
    }

    #[test]
    fn choice_column_is_checked_first() {
        let mut model = ChoiceModel::from_yaml_str(SIMPLE_MODEL).unwrap();
        let table = DataTable::new(vec!["var1".to_string()], vec![]).unwrap();
        let err = model.load_data(table).unwrap_err();
        assert!(matches!(err, ChoiceError::MissingField(ref field) if field == "alternative"));
    }
}
