//! Defines a `ConditionalInferenceEngine` that uses exact inference by variable elimination to
//! answer conditional inference queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE, preceded by a relevance
//! pruning step: variables that are neither ancestors of the query or the evidence, nor
//! d-connected to the query given the evidence, cannot change the answer and their factors are
//! left out of the computation.

use crate::factor::{Factor, OperationCount};
use crate::model::directed::DirectedModel;
use super::{validate_query, BayesBall, ConditionalInferenceEngine};
use crate::util::{BayesError, Result};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;
use tracing::debug;

use std::collections::HashSet;


pub struct VariableEliminationEngine<'a> {

    /// the `DirectedModel` to run the inference task on
    model: &'a DirectedModel,

    /// the observed values
    evidence: Assignment,

    /// the order in which hidden variables are eliminated
    order: Vec<Variable>,

    /// the arithmetic performed by the last query
    ops: OperationCount

}


impl<'a> VariableEliminationEngine<'a> {

    /// Construct an engine that eliminates hidden variables in the topological order of the model
    pub fn new(model: &'a DirectedModel, evidence: &Assignment) -> Self {
        VariableEliminationEngine {
            model,
            evidence: evidence.clone(),
            order: model.topological_order(),
            ops: OperationCount::default()
        }
    }


    /// Eliminate the given variables first, in the given order. Hidden variables missing from
    /// `order` are eliminated afterwards in topological order.
    pub fn with_order(mut self, order: &[Variable]) -> Self {
        let mut full: Vec<Variable> = order.iter().cloned().unique().collect();
        full.extend(self.model.topological_order().into_iter().filter(|v| ! order.contains(v)));
        self.order = full;
        self
    }


    /// The multiplications and additions performed by the last query
    pub fn operations(&self) -> OperationCount {
        self.ops
    }


    /// Compute ```P(query | evidence)``` for a (partial) assignment ```query```.
    ///
    /// # Errors
    /// see `infer`
    pub fn probability(&mut self, query: &Assignment) -> Result<f64> {
        let variables: HashSet<Variable> = query.keys().cloned().collect();
        let phi = self.infer(&variables)?;
        phi.value(query)
    }


    /// Determine the variables that can influence ```P(query | evidence)```.
    ///
    /// These are the query variables, the hidden variables that are ancestors of a query or
    /// evidence variable and are d-connected to some query variable given the evidence, and the
    /// evidence variables that are d-connected to some query variable given the rest of the
    /// evidence.
    pub fn relevant_variables(&self, query: &HashSet<Variable>) -> Result<HashSet<Variable>> {
        let bb = BayesBall::new(self.model);
        let observed: HashSet<Variable> = self.evidence.keys().cloned().collect();

        let mut relevant = query.clone();
        for var in self.model.topological_order() {
            if query.contains(&var) {
                continue;
            }

            let connected = if observed.contains(&var) {
                let mut rest = observed.clone();
                rest.remove(&var);
                connected_to_any(&bb, &var, query, &rest)?
            } else {
                self.is_ancestral(&var, query) && connected_to_any(&bb, &var, query, &observed)?
            };

            if connected {
                relevant.insert(var);
            }
        }

        Ok(relevant)
    }


    /// Check if `var` is a query or evidence variable, or an ancestor of one
    fn is_ancestral(&self, var: &Variable, query: &HashSet<Variable>) -> bool {
        query.contains(var)
            || self.evidence.contains(var)
            || query.iter().chain(self.evidence.keys()).any(|t| self.model.is_ancestor_of(var, t))
    }


    /// If the query is a single variable whose parents are exactly the evidence, the answer is a
    /// row of its CPD.
    fn shortcut(&self, variables: &HashSet<Variable>) -> Result<Option<Factor>> {
        if variables.len() != 1 {
            return Ok(None);
        }

        let var = match variables.iter().next() {
            Some(var) => var,
            None => return Ok(None)
        };

        let parents = self.model.parents_of(var);
        if parents.len() != self.evidence.len() || ! parents.iter().all(|p| self.evidence.contains(p)) {
            return Ok(None);
        }

        match self.model.cpd(var) {
            Some(cpd) => cpd.reduce(&self.evidence).map(Some),
            None => Ok(None)
        }
    }


    /// Check that ```P(evidence) > 0```, summing out every other variable from the restricted
    /// CPDs of the evidence and its ancestors. Nothing is added to the operation count.
    fn evidence_is_possible(&self, factors: &[(Variable, Factor)]) -> Result<bool> {
        if self.evidence.is_empty() {
            return Ok(true);
        }

        let mut scratch = OperationCount::default();
        let mut phis: Vec<Factor> = factors
            .iter()
            .filter(|(head, _)| {
                self.evidence.contains(head)
                    || self.evidence.keys().any(|e| self.model.is_ancestor_of(head, e))
            })
            .map(|(_, phi)| phi.clone())
            .collect();

        for var in self.order.iter() {
            if ! self.evidence.contains(var) {
                phis = self.eliminate(phis, var, &mut scratch)?;
            }
        }

        let p = phis
            .iter()
            .try_fold(Factor::identity(), |acc, phi| acc.product_with(phi, &mut scratch))?;
        Ok(p.total() > 0.0)
    }


    /// Sum `var` out of the product of the factors that mention it
    fn eliminate(
        &self,
        phis: Vec<Factor>,
        var: &Variable,
        ops: &mut OperationCount
    ) -> Result<Vec<Factor>> {
        let (mut with_var, mut without_var): (Vec<Factor>, Vec<Factor>) = phis
            .into_iter()
            .partition(|f| f.contains(var));

        if with_var.is_empty() {
            return Ok(without_var);
        }

        // join the smallest factors first, ties broken by the characters of the variable names
        with_var.sort_by_key(|f| (f.arity(), self.name_weight(f)));

        // product step - multiply factors with var
        let psi = with_var
            .iter()
            .try_fold(Factor::identity(), |acc, phi| acc.product_with(phi, ops))?;

        // sum step - marginalize psi over var
        let tau = psi.marginalize_with(*var, ops);

        debug!(
            variable = %self.model.display_name(var),
            joined = with_var.len(),
            arity = tau.arity(),
            "eliminated"
        );

        without_var.push(tau);
        Ok(without_var)
    }


    /// Sum of the characters of the names of the variables in the scope of `phi`
    fn name_weight(&self, phi: &Factor) -> u32 {
        phi.scope()
            .iter()
            .map(|v| self.model.display_name(v).chars().map(|c| c as u32).sum::<u32>())
            .sum()
    }
}


/// Check if `var` is d-connected to at least one of `query` given `observed`
fn connected_to_any(
    bb: &BayesBall,
    var: &Variable,
    query: &HashSet<Variable>,
    observed: &HashSet<Variable>
) -> Result<bool> {
    for q in query.iter() {
        if ! bb.is_d_separated(var, q, observed)? {
            return Ok(true);
        }
    }
    Ok(false)
}


impl<'a> ConditionalInferenceEngine for VariableEliminationEngine<'a> {

    fn infer(&mut self, variables: &HashSet<Variable>) -> Result<Factor> {
        self.ops = OperationCount::default();
        validate_query(self.model, &self.evidence, variables)?;

        let mut ops = OperationCount::default();

        ///////////////////////////////////////////////////////////////////////
        // 1) Build one factor per node of the model, and restrict it by the evidence
        let factors = self.model
            .nodes()
            .map(|n| Ok((n.variable(), n.cpd().reduce(&self.evidence)?)))
            .collect::<Result<Vec<(Variable, Factor)>>>()?;

        if ! self.evidence_is_possible(&factors)? {
            return Err(BayesError::ZeroProbability);
        }

        if let Some(phi) = self.shortcut(variables)? {
            debug!("query answered directly from a CPD");
            return Ok(phi);
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Prune factors that cannot influence the query
        let relevant = self.relevant_variables(variables)?;
        let total = factors.len();

        let mut phis: Vec<Factor> = factors
            .into_iter()
            .filter(|(head, phi)| {
                if ! self.is_ancestral(head, variables) {
                    // barren: sums to one over the head and its descendants
                    return false;
                }

                let scope = phi.scope();
                if scope.is_empty() {
                    relevant.contains(head)
                } else {
                    scope.iter().any(|v| relevant.contains(v))
                }
            })
            .map(|(_, phi)| phi)
            .collect();

        debug!(
            kept = phis.len(),
            dropped = total - phis.len(),
            relevant = ?relevant.iter().map(|v| self.model.display_name(v)).collect::<Vec<_>>(),
            "pruned factors"
        );

        ///////////////////////////////////////////////////////////////////////
        // 3) Eliminate the hidden variables
        for var in self.order.iter() {
            if ! variables.contains(var) && ! self.evidence.contains(var) {
                phis = self.eliminate(phis, var, &mut ops)?;
            }
        }

        ///////////////////////////////////////////////////////////////////////
        // 4) Multiply together the remaining factors and normalize
        let phi_star = phis
            .iter()
            .try_fold(Factor::identity(), |acc, phi| acc.product_with(phi, &mut ops))?;

        // a lone factor that was never multiplied is a row of a CPD and already normalized
        let phi_star = if ops.multiplications > 0 || ! phi_star.is_cpd() {
            phi_star.normalize_with(&mut ops)?
        } else {
            phi_star
        };

        self.ops = ops;
        debug!(multiplications = ops.multiplications, additions = ops.additions, "inference done");

        let scope: HashSet<Variable> = phi_star.scope().into_iter().collect();
        if scope != *variables {
            return Err(BayesError::InvalidScope);
        }

        Ok(phi_star)
    }

}
