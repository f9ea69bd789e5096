//! Module containing initialization routines for the parameters of a model.

use crate::factor::{Factor, Table};
use crate::util::{BayesError, Result};
use crate::variable::Variable;

use ndarray::{Array, ArrayD, Axis, IxDyn};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Defines possible ways to initialize a `Variable`s CPD.
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Randomly initialize the weights of the CPD from a seeded generator. The same seed always
    /// produces the same CPD.
    Seeded(u64),

    /// Initialize the CPD as a Binomial distribution with parameter ```p```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// User defined CPD
    Table(Factor)
}


impl<'a> Initialization<'a> {

    /// Construct a CPD ```P(var | parents)```, initialized based on ```self```
    ///
    /// # Returns
    /// a `Factor` with scope ```parents``` (in order) followed by ```var```.
    ///
    /// # Errors
    /// * `BayesError::InvalidInitialization` if the initialization does not suit the variable
    /// * `BayesError::InvalidScope` if a user defined CPD has the wrong scope
    pub fn build_cpd(self, var: Variable, parents: &[Variable]) -> Result<Factor> {
        ///////////////////////////////////////////////////////////////////////////////
        // Trivial cases

        // if this is a user defined factor, it just needs to be verified and returned
        if let Initialization::Table(f) = self {
            if ! f.is_cpd() {
                return Err(BayesError::InvalidInitialization);
            }

            let mut expected = parents.to_vec();
            expected.push(var);
            if f.scope() == expected {
                return Ok(f);
            } else {
                return Err(BayesError::InvalidScope);
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        match self {
            // A binomial/multinomial on a non-unit scope
            Initialization::Binomial(_) | Initialization::Multinomial(_) if ! parents.is_empty() => {
                return Err(BayesError::InvalidInitialization);
            },

            // A binomial distribution on a non-binary variable
            Initialization::Binomial(p) if var.cardinality() != 2 || p < 0.0 || p > 1.0 => {
                return Err(BayesError::InvalidInitialization);
            },

            // A multinomial distribution with an incorrect number of parameters
            Initialization::Multinomial(ps) if ps.len() != var.cardinality() => {
                return Err(BayesError::InvalidInitialization);
            },

            _ => ()
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
        shape.push(var.cardinality());

        let tbl = match self {
            Initialization::Uniform => {
                // normalizing constant is just the number of outcomes
                let val = 1. / (var.cardinality() as f64);
                ArrayD::from_elem(IxDyn(&shape), val)
            },
            Initialization::Seeded(seed) => random_rows(&shape, &mut StdRng::seed_from_u64(seed)),
            Initialization::Binomial(p) => {
                Array::from(vec![p, 1.0 - p]).into_dyn()
            },
            Initialization::Multinomial(ps) => {
                Array::from(ps.to_vec()).into_dyn()
            },
            Initialization::Table(_) => unreachable!("user defined tables are returned above")
        };

        Factor::cpd(var, parents.to_vec(), tbl)
    }
}


/// A random table of the given shape where each row along the last axis sums to one
fn random_rows<R: Rng>(shape: &[usize], rng: &mut R) -> Table {
    let last = Axis(shape.len() - 1);
    let tbl = Array::random_using(IxDyn(shape), Uniform::new(1.0, 100.0), rng);
    let z = tbl.sum_axis(last).insert_axis(last);
    &tbl / &z
}
