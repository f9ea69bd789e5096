//! Defines a `ConditionalInferenceEngine` that answers queries by brute-force enumeration of the
//! joint distribution.
//!
//! Every full assignment consistent with the evidence is scored with the chain rule and its mass
//! added to the matching entry of the query table. The cost grows exponentially with the number
//! of variables in the model, so this is only practical for small networks, where it serves as a
//! reference for the other engines.

use crate::factor::Factor;
use crate::model::directed::DirectedModel;
use crate::model::Model;
use super::{validate_query, ConditionalInferenceEngine};
use crate::util::{BayesError, Result};
use crate::variable::{all_assignments, Assignment, Variable};

use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use std::collections::HashSet;


pub struct EnumerationEngine<'a> {
    model: &'a DirectedModel,
    evidence: Assignment
}


impl<'a> EnumerationEngine<'a> {

    pub fn new(model: &'a DirectedModel, evidence: &Assignment) -> Self {
        EnumerationEngine { model, evidence: evidence.clone() }
    }


    fn consistent(&self, assignment: &Assignment) -> bool {
        self.evidence.iter().all(|(v, x)| assignment.get(v) == Some(x))
    }
}


impl<'a> ConditionalInferenceEngine for EnumerationEngine<'a> {

    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor> {
        validate_query(self.model, &self.evidence, variables)?;

        let order = self.model.topological_order();
        let scope: Vec<Variable> = order.iter().cloned().filter(|v| variables.contains(v)).collect();
        let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
        let mut table = ArrayD::<f64>::zeros(IxDyn(&shape));

        let mut visited = 0;
        for assn in all_assignments(&order).filter(|a| self.consistent(a)) {
            let p = self.model.probability(&assn)?;
            let idx = scope.iter()
                           .map(|v| assn.get(v).cloned().ok_or(BayesError::IncompleteAssignment))
                           .collect::<Result<Vec<usize>>>()?;

            table[IxDyn(&idx)] += p;
            visited += 1;
        }

        debug!(assignments = visited, "enumerated joint");
        Factor::new(scope, table)?.normalize()
    }

}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::Initialization;
    use crate::model::directed::DirectedModelBuilder;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    /// P(A | B = 0) on A -> B by Bayes' rule
    fn two_nodes() {
        let a = Variable::binary();
        let b = Variable::binary();
        let cpd_b = Factor::cpd(b, vec![a], array![[0.9, 0.1], [0.3, 0.7]].into_dyn()).unwrap();

        let model = DirectedModelBuilder::new()
            .with_variable(&a, vec![], Initialization::Binomial(0.2))
            .with_variable(&b, vec![a], Initialization::Table(cpd_b))
            .build()
            .unwrap();

        let evidence: Assignment = vec![(b, 0)].into_iter().collect();
        let phi = EnumerationEngine::new(&model, &evidence)
            .infer(&vec![a].into_iter().collect())
            .unwrap();

        let z = 0.2 * 0.9 + 0.8 * 0.3;
        let mut assn = Assignment::new();
        assn.set(&a, 0);
        assert_abs_diff_eq!(0.2 * 0.9 / z, phi.value(&assn).unwrap(), epsilon = 1e-12);
        assn.set(&a, 1);
        assert_abs_diff_eq!(0.8 * 0.3 / z, phi.value(&assn).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn impossible_evidence() {
        let a = Variable::binary();
        let b = Variable::binary();
        let cpd_b = Factor::cpd(b, vec![a], array![[1., 0.], [1., 0.]].into_dyn()).unwrap();

        let model = DirectedModelBuilder::new()
            .with_variable(&a, vec![], Initialization::Uniform)
            .with_variable(&b, vec![a], Initialization::Table(cpd_b))
            .build()
            .unwrap();

        let evidence: Assignment = vec![(b, 1)].into_iter().collect();
        let res = EnumerationEngine::new(&model, &evidence).infer(&vec![a].into_iter().collect());
        assert!(matches!(res, Err(BayesError::ZeroProbability)));
    }
}
