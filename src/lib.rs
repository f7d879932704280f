//! Declarative multinomial logit models translated for external estimation engines.
//!
//! A model is described once, in YAML or through a builder, and validated up
//! front: every alternative needs an availability column, all but one
//! alternative carry an intercept, and each utility is a linear combination of
//! declared parameters and variables. Observation data is then bound to the
//! model and checked against the columns it references. Interfaces translate
//! the validated model into the input of a specific engine:
//!
//! - ALOGIT (`interface::alogit`): a command script with labels abbreviated to
//!   ten characters and a headerless, recoded data file,
//! - Biogeme (`interface::biogeme`): a JSON specification keyed by integer
//!   alternative codes plus the recoded data, and
//! - PyLogit (`interface::pylogit`): long-format data and grouped coefficient
//!   specification.
//!
//! An [`Estimator`] runs an [`interface::Engine`] on the translated input and
//! only exposes parameters, standard errors and likelihoods after a
//! successful run.
//!
//! # Quick start
//!
//! ```no_run
//! use choicers::interface::{AlogitInterface, CommandEngine};
//! use choicers::{AlogitOptions, EngineOptions, Estimator, Model, MultinomialLogit};
//!
//! let yaml = std::fs::read_to_string("model.yml").expect("model definition");
//! let mut model = MultinomialLogit::from_yaml_str(&yaml).expect("valid model");
//! model.load_data_file("data.csv").expect("columns present");
//! let model = Model::from(model);
//!
//! let interface = AlogitInterface::new(&model, AlogitOptions::default()).expect("translated");
//! println!("{}", interface.alo_script());
//!
//! let engine = CommandEngine::new(EngineOptions::new("alogit-driver"));
//! let mut estimator = Estimator::new(interface, engine);
//! estimator.estimate().expect("engine launched");
//! println!("{}", estimator.display_results().expect("estimated"));
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod abbreviation;
pub mod data;
pub mod encoding;
pub mod error;
pub mod interface;
pub mod long;
pub mod model;
pub mod options;
pub mod synthetic;
pub mod utility;

pub use data::DataTable;
pub use error::{ChoiceError, Result};
pub use interface::{EstimationResults, EstimationStatus, Estimator};
pub use model::{ChoiceModel, ChoiceModelBuilder, DataSource, Model, ModelKind, MultinomialLogit};
pub use options::{AbbreviationOptions, AlogitOptions, EngineOptions};
pub use utility::{Term, Utility};
