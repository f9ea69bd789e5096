//! Defines a `Model`, a Bayesian (directed) graphical model representing the factorization of a
//! probability distribution P.

use crate::util::Result;
use crate::variable::{Assignment, Variable};

use std::collections::HashSet;

/// The `Model` trait represents a Probabilistic Graphical Model.
pub trait Model {

    /// Lookup a `Variable` in the `Model` based on the name
    fn lookup_variable(&self, name: &str) -> Option<&Variable>;


    /// Lookup a `Variable`'s name in the `Model`.
    fn lookup_name(&self, var: &Variable) -> Option<&String>;


    /// Get all `Variable`s in the model.
    fn variables(&self) -> HashSet<Variable>;


    /// Get the number of `Variable`s in the the `Model`
    fn num_variables(&self) -> usize;


    /// Determine the probability of a full `Assignment` to the `Variable`s in the `Model`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment.
    ///
    /// # Args
    /// * `assignment`: a full `Assignment` to the `Model`
    ///
    /// # Returns
    /// the probability of the `Assignment` given the `Model`
    fn probability(&self, assignment: &Assignment) -> Result<f64>;
}

pub mod directed;
