//! Interfaces to external estimation engines.
//!
//! An interface translates a [`MultinomialLogit`] with bound data into the
//! artifact a particular engine consumes. An [`Estimator`] pairs an interface
//! with an [`Engine`] that runs the estimation and tracks whether results are
//! available yet.
//!
//! Each interface declares the model kinds it accepts in
//! [`Interface::VALID_MODELS`]; construction fails for any other kind and for
//! models without data.

use std::fmt;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ChoiceError, Result};
use crate::model::{Model, ModelKind, MultinomialLogit};

pub mod alogit;
pub mod biogeme;
pub mod engine;
pub mod pylogit;

pub use alogit::AlogitInterface;
pub use biogeme::BiogemeInterface;
pub use engine::{CommandEngine, Stage};
pub use pylogit::PylogitInterface;

/// A translator from a model to the input of one estimation engine.
pub trait Interface {
    /// Engine name used in diagnostics.
    const NAME: &'static str;
    /// Model kinds this interface can translate.
    const VALID_MODELS: &'static [ModelKind];
    /// Translated input handed to the engine.
    type Artifact;

    /// The translated engine input.
    fn artifact(&self) -> &Self::Artifact;

    /// Maps engine-side names in a report back to model labels.
    fn translate_report(&self, report: EngineReport) -> EngineReport {
        report
    }
}

/// Checks the model kind against `I::VALID_MODELS` and that data is bound.
pub(crate) fn validated_model<I: Interface>(model: &Model) -> Result<&MultinomialLogit> {
    let unsupported = || ChoiceError::UnsupportedModel {
        interface: I::NAME,
        kind: model.kind(),
        accepted: I::VALID_MODELS,
    };

    if !I::VALID_MODELS.contains(&model.kind()) {
        return Err(unsupported());
    }
    if model.base().data().is_none() {
        return Err(ChoiceError::NoDataLoaded(I::NAME));
    }
    model.as_multinomial_logit().ok_or_else(unsupported)
}

/// Estimate, standard error and t-statistic of one parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub value: f64,
    pub std_err: f64,
    pub t_value: f64,
}

/// Results an engine reports after a successful run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub null_log_likelihood: f64,
    pub final_log_likelihood: f64,
    pub estimates: IndexMap<String, ParameterEstimate>,
}

/// Diagnostics of an engine run that exited abnormally, kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineFailure {
    /// Exit code, absent when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => writeln!(f, "estimation engine exited with status {code}")?,
            None => writeln!(f, "estimation engine terminated by signal")?,
        }
        f.write_str(&self.stdout)?;
        f.write_str(&self.stderr)
    }
}

/// What came back from a single engine invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineOutcome {
    Completed(EngineReport),
    Failed(EngineFailure),
}

/// Something that can estimate a model from a translated artifact.
///
/// The call is synchronous and is not subject to a timeout.
pub trait Engine<A> {
    fn run(&mut self, artifact: &A) -> Result<EngineOutcome>;
}

impl<A, F> Engine<A> for F
where
    F: FnMut(&A) -> Result<EngineOutcome>,
{
    fn run(&mut self, artifact: &A) -> Result<EngineOutcome> {
        self(artifact)
    }
}

/// Results of a completed estimation.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimationResults {
    pub null_log_likelihood: f64,
    pub final_log_likelihood: f64,
    pub estimates: IndexMap<String, ParameterEstimate>,
    /// Wall-clock duration of the engine call in seconds.
    pub estimation_time: f64,
}

/// Result of calling [`Estimator::estimate`].
#[derive(Clone, Debug, PartialEq)]
pub enum EstimationStatus {
    /// Results are now available.
    Estimated,
    /// The engine failed; the estimator remains unestimated.
    EngineFailed(EngineFailure),
}

#[derive(Clone, Debug)]
enum EstimationState {
    Unestimated,
    Estimated(EstimationResults),
}

/// Runs an engine on an interface's artifact and gates access to the results.
///
/// The estimator moves from unestimated to estimated exactly once. Re-running
/// an estimation requires a new estimator.
pub struct Estimator<I, E>
where
    I: Interface,
    E: Engine<I::Artifact>,
{
    interface: I,
    engine: E,
    state: EstimationState,
}

impl<I, E> Estimator<I, E>
where
    I: Interface,
    E: Engine<I::Artifact>,
{
    pub fn new(interface: I, engine: E) -> Self {
        Self {
            interface,
            engine,
            state: EstimationState::Unestimated,
        }
    }

    /// The interface whose artifact is estimated.
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Returns whether results are available.
    pub fn is_estimated(&self) -> bool {
        matches!(self.state, EstimationState::Estimated(_))
    }

    /// Invokes the engine once.
    ///
    /// An engine that exits abnormally is reported through
    /// [`EstimationStatus::EngineFailed`] and leaves the estimator unestimated.
    pub fn estimate(&mut self) -> Result<EstimationStatus> {
        if self.is_estimated() {
            return Err(ChoiceError::AlreadyEstimated);
        }

        log::info!("estimating with {}", I::NAME);
        let start = Instant::now();
        let outcome = self.engine.run(self.interface.artifact())?;
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            EngineOutcome::Completed(report) => {
                let report = self.interface.translate_report(report);
                log::info!(
                    "{} estimation finished in {:.3}s, final log likelihood {}",
                    I::NAME,
                    elapsed,
                    report.final_log_likelihood
                );
                self.state = EstimationState::Estimated(EstimationResults {
                    null_log_likelihood: report.null_log_likelihood,
                    final_log_likelihood: report.final_log_likelihood,
                    estimates: report.estimates,
                    estimation_time: elapsed,
                });
                Ok(EstimationStatus::Estimated)
            }
            EngineOutcome::Failed(failure) => {
                log::warn!("{} estimation failed: {:?}", I::NAME, failure.exit_code);
                Ok(EstimationStatus::EngineFailed(failure))
            }
        }
    }

    /// All results, once estimated.
    pub fn results(&self) -> Result<&EstimationResults> {
        match &self.state {
            EstimationState::Estimated(results) => Ok(results),
            EstimationState::Unestimated => Err(ChoiceError::NotEstimated),
        }
    }

    pub fn null_log_likelihood(&self) -> Result<f64> {
        Ok(self.results()?.null_log_likelihood)
    }

    pub fn final_log_likelihood(&self) -> Result<f64> {
        Ok(self.results()?.final_log_likelihood)
    }

    /// Estimated parameter values keyed by model label.
    pub fn parameters(&self) -> Result<IndexMap<String, f64>> {
        self.column(|estimate| estimate.value)
    }

    pub fn standard_errors(&self) -> Result<IndexMap<String, f64>> {
        self.column(|estimate| estimate.std_err)
    }

    pub fn t_values(&self) -> Result<IndexMap<String, f64>> {
        self.column(|estimate| estimate.t_value)
    }

    /// Seconds spent in the engine call.
    pub fn estimation_time(&self) -> Result<f64> {
        Ok(self.results()?.estimation_time)
    }

    /// Renders the results as a plain text table.
    pub fn display_results(&self) -> Result<String> {
        let results = self.results()?;
        let width = results
            .estimates
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Parameter".len());

        let mut text = format!(
            "{:<width$} {:>14} {:>14} {:>10}\n",
            "Parameter", "Value", "Std err", "t-test"
        );
        for (name, estimate) in &results.estimates {
            text.push_str(&format!(
                "{:<width$} {:>14.6} {:>14.6} {:>10.3}\n",
                name, estimate.value, estimate.std_err, estimate.t_value
            ));
        }
        text.push_str(&format!(
            "Null log likelihood: {:.6}\nFinal log likelihood: {:.6}\nEstimation time: {:.3}s\n",
            results.null_log_likelihood, results.final_log_likelihood, results.estimation_time
        ));
        Ok(text)
    }

    fn column(&self, field: impl Fn(&ParameterEstimate) -> f64) -> Result<IndexMap<String, f64>> {
        Ok(self
            .results()?
            .estimates
            .iter()
            .map(|(name, estimate)| (name.clone(), field(estimate)))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::DataSource;

    pub(crate) const SIMPLE_MODEL: &str = "
title: Simple model
alternatives: [choice1, choice2]
choice_column: alternative
availability:
  choice1: avail_choice1
  choice2: avail_choice2
alternative_independent_variables: [var1, var2]
alternative_dependent_variables:
  var3:
    choice1: choice1_var3
    choice2: choice2_var3
intercepts:
  choice1: cchoice1
parameters: [p1, p2, p3]
specification:
  choice1: cchoice1 + p1*var1 + p3*var3
  choice2: p2*var2 + p3*var3
";

    pub(crate) const SIMPLE_DATA: &str = "var1,var2,choice1_var3,choice2_var3,avail_choice1,avail_choice2,alternative
1,2,3,4,1,1,choice1
5,6,7,8,1,1,choice2
";

    pub(crate) fn simple_model_with_data() -> Model {
        let mut model = crate::model::MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap();
        model
            .load_data(DataSource::reader(SIMPLE_DATA.as_bytes()))
            .unwrap();
        Model::from(model)
    }

    fn report() -> EngineReport {
        let mut estimates = IndexMap::new();
        estimates.insert(
            "p1".to_string(),
            ParameterEstimate {
                value: 0.5,
                std_err: 0.25,
                t_value: 2.0,
            },
        );
        EngineReport {
            null_log_likelihood: -1.386,
            final_log_likelihood: -1.0,
            estimates,
        }
    }

    fn completed(_: &biogeme::BiogemeSpecification) -> Result<EngineOutcome> {
        Ok(EngineOutcome::Completed(report()))
    }

    #[test]
    fn queries_before_estimation_fail() {
        let model = simple_model_with_data();
        let estimator = Estimator::new(BiogemeInterface::new(&model).unwrap(), completed);
        assert!(matches!(estimator.parameters(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.null_log_likelihood(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.final_log_likelihood(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.standard_errors(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.t_values(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.estimation_time(), Err(ChoiceError::NotEstimated)));
        assert!(matches!(estimator.display_results(), Err(ChoiceError::NotEstimated)));
    }

    #[test]
    fn successful_run_exposes_results_once() {
        let model = simple_model_with_data();
        let mut estimator = Estimator::new(BiogemeInterface::new(&model).unwrap(), completed);
        assert_eq!(estimator.estimate().unwrap(), EstimationStatus::Estimated);
        assert!(estimator.is_estimated());
        assert_eq!(estimator.parameters().unwrap()["p1"], 0.5);
        assert_eq!(estimator.standard_errors().unwrap()["p1"], 0.25);
        assert_eq!(estimator.t_values().unwrap()["p1"], 2.0);
        assert_eq!(estimator.null_log_likelihood().unwrap(), -1.386);
        assert_eq!(estimator.final_log_likelihood().unwrap(), -1.0);
        assert!(estimator.estimation_time().unwrap() >= 0.0);
        assert!(estimator.display_results().unwrap().contains("p1"));
        assert!(matches!(estimator.estimate(), Err(ChoiceError::AlreadyEstimated)));
    }

    #[test]
    fn engine_failure_keeps_estimator_unestimated() {
        let failure = EngineFailure {
            exit_code: Some(3),
            stdout: String::new(),
            stderr: "singular hessian".to_string(),
        };
        let expected = failure.clone();
        let model = simple_model_with_data();
        let engine = move |_: &biogeme::BiogemeSpecification| -> Result<EngineOutcome> {
            Ok(EngineOutcome::Failed(failure.clone()))
        };
        let mut estimator = Estimator::new(BiogemeInterface::new(&model).unwrap(), engine);
        assert_eq!(
            estimator.estimate().unwrap(),
            EstimationStatus::EngineFailed(expected)
        );
        assert!(!estimator.is_estimated());
        assert!(matches!(estimator.parameters(), Err(ChoiceError::NotEstimated)));
    }

    #[test]
    fn base_models_are_rejected_by_every_interface() {
        let mut model = crate::model::ChoiceModel::from_yaml_str(SIMPLE_MODEL).unwrap();
        model
            .load_data(DataSource::reader(SIMPLE_DATA.as_bytes()))
            .unwrap();
        let model = Model::from(model);

        for err in [
            BiogemeInterface::new(&model).err(),
            PylogitInterface::new(&model).err(),
        ] {
            assert!(matches!(
                err,
                Some(ChoiceError::UnsupportedModel {
                    kind: ModelKind::ChoiceModel,
                    ..
                })
            ));
        }
        assert!(matches!(
            AlogitInterface::new(&model, Default::default()).err(),
            Some(ChoiceError::UnsupportedModel { .. })
        ));
    }

    #[test]
    fn models_without_data_are_rejected() {
        let model = Model::from(crate::model::MultinomialLogit::from_yaml_str(SIMPLE_MODEL).unwrap());
        assert!(matches!(
            BiogemeInterface::new(&model).err(),
            Some(ChoiceError::NoDataLoaded("Biogeme"))
        ));
        assert!(matches!(
            PylogitInterface::new(&model).err(),
            Some(ChoiceError::NoDataLoaded("pylogit"))
        ));
        assert!(matches!(
            AlogitInterface::new(&model, Default::default()).err(),
            Some(ChoiceError::NoDataLoaded("ALOGIT"))
        ));
    }
}
