//! Synthetic models and observation data for benchmarking the translators.
//!
//! [`synthetic_model`] builds a multinomial logit in which every variable is
//! alternative-dependent and every alternative's utility is the same linear
//! combination. [`synthetic_data`] fills a table with uniform noise, while
//! [`synthetic_data2`] draws correlated variables and picks the choice with
//! the highest perturbed utility so that estimation has signal to recover.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Gumbel, StandardNormal};

use crate::data::DataTable;
use crate::error::{ChoiceError, Result};
use crate::model::{ChoiceModel, ChoiceModelBuilder, MultinomialLogit};

/// Choice column used by [`synthetic_model`].
pub const SYNTHETIC_CHOICE_COLUMN: &str = "choice";

const VARIABLE_MEAN: f64 = 5.0;
const PARAMETER_VALUE: f64 = 2.5;

/// Builds a model with `alternatives` alternatives and `variables` variables.
///
/// Labels follow the patterns `alternative<i>`, `availability<i>`,
/// `variable<j>`, `alternative<i>_variable<j>`, `c<i>` and `parameter<j>`. The
/// last alternative has no intercept. At least one variable is required.
///
/// Every `alternative<i>` and `alternative<i>_variable<j>` label truncates to
/// `alternativ` at ALOGIT's default ten characters, so with more than nine
/// such labels the ALOGIT interface fails with
/// [`ChoiceError::AbbreviationOverflow`]. Raise
/// [`AbbreviationOptions::max_length`](crate::AbbreviationOptions) to 16 to
/// translate these models.
pub fn synthetic_model(
    title: &str,
    alternatives: usize,
    variables: usize,
) -> Result<MultinomialLogit> {
    let names: Vec<String> = (1..=alternatives)
        .map(|number| format!("alternative{number}"))
        .collect();
    let parameters: Vec<String> = (1..=variables)
        .map(|number| format!("parameter{number}"))
        .collect();
    let variable_names: Vec<String> = (1..=variables)
        .map(|number| format!("variable{number}"))
        .collect();

    let availability = names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), format!("availability{}", index + 1)));
    let intercepts: Vec<(String, String)> = names
        .iter()
        .take(alternatives.saturating_sub(1))
        .enumerate()
        .map(|(index, name)| (name.clone(), format!("c{}", index + 1)))
        .collect();

    let mut builder = ChoiceModelBuilder::new(title, SYNTHETIC_CHOICE_COLUMN)
        .alternatives(names.clone())
        .availability(availability)
        .alternative_independent_variables(Vec::<String>::new())
        .intercepts(intercepts.clone())
        .parameters(parameters.clone());
    for variable in &variable_names {
        let columns = names
            .iter()
            .map(|name| (name.clone(), format!("{name}_{variable}")));
        builder = builder.alternative_dependent_variable(variable.clone(), columns);
    }

    let linear_combination = parameters
        .iter()
        .zip(&variable_names)
        .map(|(parameter, variable)| format!("{parameter}*{variable}"))
        .collect::<Vec<_>>()
        .join(" + ");
    let specification = names.iter().map(|name| {
        let utility = match intercepts.iter().find(|(alternative, _)| alternative == name) {
            Some((_, intercept)) => format!("{intercept} + {linear_combination}"),
            None => linear_combination.clone(),
        };
        (name.clone(), utility)
    });

    builder.build_multinomial_logit(specification)
}

/// Uniformly random choices and variable values in `[0, 1)`; every
/// alternative is available.
///
/// Columns are the variable fields, then the availability columns, then the
/// choice column.
pub fn synthetic_data<R>(model: &ChoiceModel, records: usize, rng: &mut R) -> Result<DataTable>
where
    R: Rng + ?Sized,
{
    let fields = model.all_variable_fields();
    let availability = model.availability_fields();
    let alternatives = model.alternatives();

    let mut rows = Vec::with_capacity(records);
    for _ in 0..records {
        let mut row = Vec::with_capacity(fields.len() + availability.len() + 1);
        row.extend(fields.iter().map(|_| rng.gen::<f64>().to_string()));
        row.extend(availability.iter().map(|_| "1".to_string()));
        let choice = rng.gen_range(0..alternatives.len());
        row.push(alternatives[choice].clone());
        rows.push(row);
    }

    DataTable::new(header(model), rows)
}

/// Correlated variables with choices made by utility maximisation.
///
/// For every observation and alternative the variables are drawn from a
/// multivariate normal with mean 5 and covariance `AᵀA`, where `A` has
/// entries uniform in `[-1, 1]`. The utility of an alternative is 2.5 times
/// the sum of its variables plus standard Gumbel noise and the chosen
/// alternative is the one with the highest utility. Alternative-independent
/// variables take the draw of the first alternative.
pub fn synthetic_data2<R>(
    model: &ChoiceModel,
    observations: usize,
    rng: &mut R,
) -> Result<DataTable>
where
    R: Rng + ?Sized,
{
    let variables = model.all_variables();
    let dimension = variables.len();
    let alternatives = model.alternatives();

    let a = DMatrix::from_fn(dimension, dimension, |_, _| rng.gen_range(-1.0..=1.0));
    let covariance = a.transpose() * &a;
    let factor = match covariance.clone().cholesky() {
        Some(cholesky) => cholesky.l(),
        // AᵀA is only semi-definite; fall back to independent draws.
        None => DMatrix::from_diagonal(&covariance.diagonal().map(f64::sqrt)),
    };
    let mean = DVector::from_element(dimension, VARIABLE_MEAN);
    let gumbel = Gumbel::new(0.0, 1.0).map_err(|err| ChoiceError::Sampling(err.to_string()))?;

    let mut rows = Vec::with_capacity(observations);
    for _ in 0..observations {
        let mut draws: Vec<DVector<f64>> = Vec::with_capacity(alternatives.len());
        for alternative in 0..alternatives.len() {
            let z = DVector::<f64>::from_fn(dimension, |_, _| StandardNormal.sample(rng));
            let mut x = &mean + &factor * z;
            if alternative > 0 {
                for (index, variable) in variables.iter().enumerate() {
                    if !model.is_alternative_dependent(variable) {
                        x[index] = draws[0][index];
                    }
                }
            }
            draws.push(x);
        }

        let mut chosen = 0;
        let mut best = f64::NEG_INFINITY;
        for (alternative, x) in draws.iter().enumerate() {
            let utility = PARAMETER_VALUE * x.sum() + gumbel.sample(rng);
            if utility > best {
                best = utility;
                chosen = alternative;
            }
        }

        let mut row = Vec::new();
        for variable in model.alternative_independent_variables() {
            let index = position(&variables, variable);
            row.push(draws[0][index].to_string());
        }
        for variable in model.alternative_dependent_variables().keys() {
            let index = position(&variables, variable);
            row.extend(draws.iter().map(|x| x[index].to_string()));
        }
        row.extend(model.availability_fields().iter().map(|_| "1".to_string()));
        row.push(alternatives[chosen].clone());
        rows.push(row);
    }

    log::debug!(
        "generated {} synthetic observations for `{}`",
        observations,
        model.title()
    );
    DataTable::new(header(model), rows)
}

fn header(model: &ChoiceModel) -> Vec<String> {
    model
        .all_variable_fields()
        .into_iter()
        .chain(model.availability_fields())
        .chain(std::iter::once(model.choice_column()))
        .map(str::to_string)
        .collect()
}

fn position(variables: &[&str], variable: &str) -> usize {
    variables
        .iter()
        .position(|name| *name == variable)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataSource;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn model_follows_naming_scheme() {
        let model = synthetic_model("Example Title", 2, 3).unwrap();
        assert_eq!(model.title(), "Example Title");
        assert_eq!(model.alternatives(), ["alternative1", "alternative2"]);
        assert_eq!(model.choice_column(), "choice");
        assert_eq!(model.all_variables(), vec!["variable1", "variable2", "variable3"]);
        assert!(model.alternative_independent_variables().is_empty());
        assert_eq!(model.intercept_for("alternative1"), Some("c1"));
        assert_eq!(model.intercept_for("alternative2"), None);
        assert_eq!(model.availability()["alternative2"], "availability2");
        assert_eq!(
            model.all_variable_fields(),
            vec![
                "alternative1_variable1",
                "alternative2_variable1",
                "alternative1_variable2",
                "alternative2_variable2",
                "alternative1_variable3",
                "alternative2_variable3",
            ]
        );
        assert_eq!(model.number_of_parameters(true), 4);
        assert_eq!(model.number_of_parameters(false), 3);
        assert_eq!(
            model.utility("alternative1").unwrap().to_string(),
            "c1 + parameter1*variable1 + parameter2*variable2 + parameter3*variable3"
        );
    }

    #[test]
    fn uniform_data_binds_to_its_model() {
        let mut model = synthetic_model("Example Title", 3, 2).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let data = synthetic_data(&model, 5, &mut rng).unwrap();

        assert_eq!(data.row_count(), 5);
        assert!(data
            .numeric_column("availability3")
            .unwrap()
            .iter()
            .all(|&value| value == 1.0));
        assert!(data
            .column("choice")
            .unwrap()
            .all(|choice| model.alternatives().iter().any(|alt| alt == choice)));
        assert!(data
            .numeric_column("alternative2_variable1")
            .unwrap()
            .iter()
            .all(|value| (0.0..1.0).contains(value)));

        model.load_data(DataSource::from(data)).unwrap();
    }

    #[test]
    fn utility_maximising_data_is_reproducible() {
        let model = synthetic_model("Example Title", 3, 2).unwrap();
        let first = synthetic_data2(&model, 50, &mut SmallRng::seed_from_u64(11)).unwrap();
        let second = synthetic_data2(&model, 50, &mut SmallRng::seed_from_u64(11)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.row_count(), 50);
        assert_eq!(first.columns(), header(&model).as_slice());

        let values = first.numeric_column("alternative1_variable1").unwrap();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean > 3.0 && mean < 7.0);
    }
}
