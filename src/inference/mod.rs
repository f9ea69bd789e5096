//! Defines the interface to inference engines

use crate::factor::Factor;
use crate::model::directed::DirectedModel;
use crate::util::{BayesError, Result};
use crate::variable::{Assignment, Variable};

use std::collections::HashSet;

mod bayes_ball;
mod enumeration;
mod variable_elimination;

pub use self::bayes_ball::BayesBall;
pub use self::enumeration::EnumerationEngine;
pub use self::variable_elimination::VariableEliminationEngine;


/// A `ConditionalInferenceEngine` is capable of answering Conditional Probability Queries of the form:
///     ```P(Y | E = e)```
///
/// `ConditionalInferenceEngine`s are stateful and must take the evidence `e` as an argument to whatever
/// construction mechanism they employ.
pub trait ConditionalInferenceEngine {

    /// Infer the joint distribution ```P(variables | evidence)```
    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor>;

}


/// Check a query ```P(variables | evidence)``` against the model it is asked of
///
/// # Errors
/// * `BayesError::MalformedQuery` if there are no query variables, or one of them is observed
/// * `BayesError::UnknownVariable` if a variable is not in the model
/// * `BayesError::UnknownOutcome` if an observed outcome is out of range
fn validate_query(
    model: &DirectedModel,
    evidence: &Assignment,
    variables: &HashSet<Variable>
) -> Result<()> {
    if variables.is_empty() {
        return Err(BayesError::MalformedQuery(String::from("no query variables")));
    }

    if let Some(v) = variables.iter().find(|v| ! model.contains(v)) {
        return Err(BayesError::UnknownVariable(v.to_string()));
    }

    for (v, &x) in evidence.iter() {
        if ! model.contains(v) {
            return Err(BayesError::UnknownVariable(v.to_string()));
        }
        if x >= v.cardinality() {
            return Err(BayesError::UnknownOutcome {
                variable: model.display_name(v),
                outcome: x.to_string()
            });
        }
        if variables.contains(v) {
            return Err(BayesError::MalformedQuery(
                format!("{} is both queried and observed", model.display_name(v))
            ));
        }
    }

    Ok(())
}


#[cfg(test)]
/// Tests for the inference engines in this module, on the student network of Koller & Friedman.
///
/// Example 6d of [1] provides the result of exact inference of P(I | D=0, L=1, S=0) on a modified
/// version of the K&F Student example. We use that result here to test our implementation.
///
/// [1] https://www.uni-oldenburg.de/en/lcs/probabilistic-programming/webchurch-and-openbugs/
mod tests {
    use super::*;
    use crate::init::Initialization;
    use crate::model::directed::{DirectedModel, DirectedModelBuilder};
    use crate::variable::Assignment;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// Utility function to build the student inference example
    fn build_student_example() -> (Variable, DirectedModel, Assignment) {
        let d = Variable::binary();
        let i = Variable::binary();
        let g = Variable::binary();
        let s = Variable::binary();
        let l = Variable::binary();

        let cpd_g = Factor::cpd(
            g,
            vec![i, d],
            array![[[0.3, 0.7], [0.05, 0.95]],
                   [[0.9, 0.1], [0.5, 0.5]]].into_dyn()
        ).unwrap();

        let cpd_s = Factor::cpd(s, vec![i], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();
        let cpd_l = Factor::cpd(l, vec![g], array![[0.9, 0.1], [0.4, 0.6]].into_dyn()).unwrap();

        let model = DirectedModelBuilder::new()
            .with_named_variable(&d, "D", vec![], Initialization::Binomial(0.6))
            .with_named_variable(&i, "I", vec![], Initialization::Binomial(0.7))
            .with_named_variable(&g, "G", vec![i, d], Initialization::Table(cpd_g))
            .with_named_variable(&s, "S", vec![i], Initialization::Table(cpd_s))
            .with_named_variable(&l, "L", vec![g], Initialization::Table(cpd_l))
            .build()
            .unwrap();

        let mut evidence = Assignment::new();
        evidence.set(&d, 0);
        evidence.set(&l, 1);
        evidence.set(&s, 0);

        (i, model, evidence)
    }

    #[test]
    /// Test variable elimination
    fn variable_elimination() {
        let (i, model, evidence) = build_student_example();
        let mut engine = VariableEliminationEngine::new(&model, &evidence);

        // the result should be the same on subsequent queries
        for _ in 0..10 {
            let f = engine.infer(&vec![i].into_iter().collect()).unwrap();
            assert_eq!(vec![i], f.scope());

            let mut assn = Assignment::new();
            assn.set(&i, 1);
            assert_abs_diff_eq!(0.02919708, f.value(&assn).unwrap(), epsilon = 1e-8);
        }
    }

    #[test]
    fn enumeration() {
        let (i, model, evidence) = build_student_example();
        let mut engine = EnumerationEngine::new(&model, &evidence);

        let f = engine.infer(&vec![i].into_iter().collect()).unwrap();
        let mut assn = Assignment::new();
        assn.set(&i, 1);
        assert_abs_diff_eq!(0.02919708, f.value(&assn).unwrap(), epsilon = 1e-8);
    }

}
