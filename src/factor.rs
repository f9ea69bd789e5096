//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s.

use crate::util::{BayesError, Result};
use crate::variable::{all_assignments, Assignment, Variable};

use itertools::Itertools;
use ndarray::{ArrayD, Axis, IxDyn};
use tracing::warn;

/// Alias f64 ndarray::Array as Table
pub type Table = ArrayD<f64>;

/// Tolerance used when checking that the rows of a CPD sum to one
const CPD_TOLERANCE: f64 = 0.001;


/// Tally of the arithmetic performed by `Factor` operations.
///
/// Every entry computed by a product costs one multiplication. Summing out a variable with `k`
/// outcomes costs `k - 1` additions per remaining entry, and normalizing a table of `n` entries
/// costs `n - 1` additions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationCount {
    pub multiplications: usize,
    pub additions: usize
}


#[derive(Clone, Debug)]
pub enum Factor {
    /// The empty, identity `Factor` with no scope. This type exists for dealing with arithmetic
    /// operations of `Factor`s
    Identity,

    /// A `Factor` over some scope of variables. Represented as a table-CPD as described in Koller
    /// & Friedman. A `TableFactor` with an empty scope is a constant.
    TableFactor {
        /// The scope of the `Factor`
        scope: Vec<Variable>,

        /// The values of the `Factor` table, one axis per scope variable in scope order.
        table: Table,

        /// `true`, if the `Factor` is a conditional probability distribution (i.e. is normalized)
        cpd: bool
    }
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::Identity
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `BayesError::InvalidScope` if the scope holds a variable twice, or does not match the
    ///   dimensions of the table
    /// * `BayesError::NonPositiveProbability` if the table holds a negative value
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        check_table(&scope, &table)?;
        Ok(Factor::TableFactor { scope, table, cpd: false })
    }


    /// Create a conditional probability distribution ```P(var | parents)```.
    ///
    /// The scope of the resulting `Factor` is the parents, in order, followed by `var`. The table
    /// must be laid out the same way, so each row along the last axis is the distribution of `var`
    /// for one assignment of the parents.
    ///
    /// # Errors
    /// * `BayesError::InvalidScope` if the table does not match the scope
    /// * `BayesError::NonPositiveProbability` if the table holds a negative value
    /// * `BayesError::NotACPD` if a row does not sum to one
    pub fn cpd(var: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let mut scope = parents;
        scope.push(var);
        check_table(&scope, &table)?;

        let rows = table.sum_axis(Axis(table.ndim() - 1));
        if rows.iter().any(|&z| (z - 1.0).abs() > CPD_TOLERANCE) {
            return Err(BayesError::NotACPD);
        }

        Ok(Factor::TableFactor { scope, table, cpd: true })
    }


    /// Check if the `Factor` is a Conditional Probability Distribution - i.e. if the values in the
    /// `Factor` are normalized.
    pub fn is_cpd(&self) -> bool {
        match self {
            &Factor::Identity => true,
            &Factor::TableFactor { cpd, .. } => cpd
        }
    }


    /// Retrieve the scope of the `Factor`.
    ///
    /// # Note
    /// This method returns a clone of the `Factor`'s scope. `Variable`'s are lightweight and
    /// therefore this is an acceptable overhead
    pub fn scope(&self) -> Vec<Variable> {
        match self {
            &Factor::Identity => vec![],
            &Factor::TableFactor { ref scope, .. } => scope.clone()
        }
    }


    /// The number of `Variable`s in the scope of the `Factor`
    pub fn arity(&self) -> usize {
        match self {
            &Factor::Identity => 0,
            &Factor::TableFactor { ref scope, .. } => scope.len()
        }
    }


    /// Check if `var` is in the scope of the `Factor`
    pub fn contains(&self, var: &Variable) -> bool {
        match self {
            &Factor::Identity => false,
            &Factor::TableFactor { ref scope, .. } => scope.contains(var)
        }
    }


    /// The sum of all values in the `Factor`
    pub fn total(&self) -> f64 {
        match self {
            &Factor::Identity => 1.0,
            &Factor::TableFactor { ref table, .. } => table.sum()
        }
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// This operation is defined only on non-indentity `Factor`s.
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope  may be a
    ///             superset  of the `Factor`s scope.
    ///
    /// # Errors
    /// * `BayesError::General` if the `Factor` is the identity, or an outcome is out of range
    /// * `BayesError::IncompleteAssignment`, if assignment is not a complete assignment to the
    ///   scope of the `Factor`
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        match self {
            &Factor::Identity => {
                Err(BayesError::General(String::from("The identity factor has no value")))
            },
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let mut idxs = Vec::with_capacity(scope.len());
                for v in scope.iter() {
                    let &idx = assignment.get(v).ok_or(BayesError::IncompleteAssignment)?;
                    if idx >= v.cardinality() {
                        return Err(BayesError::General(
                            format!("Outcome {} is out of range for {}", idx, v)
                        ));
                    }
                    idxs.push(idx);
                }

                Ok(table[IxDyn(&idxs)])
            }
        }
    }


    /// Lenient lookup of the value of an assignment.
    ///
    /// Rows removed by restriction and genuine zero probabilities are both reported as `0.0`; an
    /// assignment that does not address a row of the table is logged. Use `value` to tell the two
    /// apart.
    pub fn probability_of(&self, assignment: &Assignment) -> f64 {
        self.value(assignment).unwrap_or_else(|err| {
            warn!(scope = ?self.scope(), error = %err, "no table entry for assignment, using 0");
            0.0
        })
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope()): the scope of `self` first, then
    /// the variables only found in `other`, in their order.
    pub fn product(&self, other: &Self) -> Result<Self> {
        self.product_with(other, &mut OperationCount::default())
    }


    /// `product`, tallying one multiplication per entry of the result in `ops`
    pub fn product_with(&self, other: &Self, ops: &mut OperationCount) -> Result<Self> {
        // Factor::Identity is the multiplicative identity
        if let &Factor::Identity = self {
            return Ok(other.clone());
        } else if let &Factor::Identity = other {
            return Ok(self.clone());
        }

        // We are computing a new factor Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z).
        // See Koller & Friedman Definition 4.2
        let new_scope: Vec<Variable> = self.scope()
                                           .into_iter()
                                           .chain(other.scope())
                                           .unique()
                                           .collect();

        // all_assignments walks the union in row-major order, so the products can be laid out
        // directly as the new table
        let values = all_assignments(&new_scope)
            .map(|assn| Ok(self.value(&assn)? * other.value(&assn)?))
            .collect::<Result<Vec<f64>>>()?;

        ops.multiplications += values.len();

        let table = build_table(&new_scope, values)?;
        Ok(Factor::TableFactor { scope: new_scope, table, cpd: false })
    }


    /// Restrict the `Factor` to the rows where `var` takes outcome `value`.
    ///
    /// # Errors
    /// see `reduce`
    pub fn restrict(&self, var: &Variable, value: usize) -> Result<Self> {
        let mut assignment = Assignment::new();
        assignment.set(var, value);
        self.reduce(&assignment)
    }


    /// Reduce the `Factor` to over the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Returns
    /// A new `Factor` without the assigned variables. If every variable of the scope is assigned,
    /// the result is a constant `Factor`. Assigned variables outside of the scope are ignored.
    ///
    /// # Errors
    /// * `BayesError::UnknownOutcome` if an assigned outcome is out of range for its variable
    pub fn reduce(&self, assignment: &Assignment) -> Result<Self> {
        match self {
            &Factor::Identity => Ok(Factor::Identity),
            &Factor::TableFactor { ref scope, ref table, cpd } => {
                if ! scope.iter().any(|v| assignment.contains(v)) {
                    // empty assignment (relative to scope)
                    return Ok(self.clone());
                }

                // drop assigned axes from the back so the remaining axis indices stay valid
                let mut view = table.view();
                for (i, v) in scope.iter().enumerate().rev() {
                    if let Some(&val) = assignment.get(v) {
                        if val >= v.cardinality() {
                            return Err(BayesError::UnknownOutcome {
                                variable: v.to_string(),
                                outcome: val.to_string()
                            });
                        }
                        view = view.index_axis_move(Axis(i), val);
                    }
                }

                let new_scope: Vec<Variable> = scope.iter()
                                                    .cloned()
                                                    .filter(|v| ! assignment.contains(v))
                                                    .collect();

                // a CPD stays a CPD if only parents were fixed
                let cpd = cpd && scope.last().map_or(false, |child| new_scope.last() == Some(child));
                let table = view.to_owned();

                Ok(Factor::TableFactor { scope: new_scope, table, cpd })
            }
        }
    }


    /// Marginalize the `Factor` over the given `Variable`
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Returns
    /// another `Factor`, marginalized over the given `Variable`. If the `Variable` is not in the
    /// scope, the `Factor` is returned unchanged.
    pub fn marginalize(&self, var: Variable) -> Self {
        self.marginalize_with(var, &mut OperationCount::default())
    }


    /// `marginalize`, tallying the additions in `ops`
    pub fn marginalize_with(&self, var: Variable, ops: &mut OperationCount) -> Self {
        match self {
            // the identity factor marginalized over anything is the identity
            &Factor::Identity => Factor::Identity,

            &Factor::TableFactor { ref scope, ref table, .. } => {
                if let Some(idx) = scope.iter().position(|&v| v == var) {
                    let new_table = table.sum_axis(Axis(idx));
                    let new_scope = scope.iter().cloned().filter(|&v| v != var).collect();

                    ops.additions += (var.cardinality() - 1) * new_table.len();

                    Factor::TableFactor { scope: new_scope, table: new_table, cpd: false }
                } else {
                    // variable not in the scope of this factor, so the factor is already
                    // marginalized over the variable
                    self.clone()
                }
            }
        }
    }


    /// Normalize the `Factor` so that its values sum to one.
    ///
    /// # Errors
    /// * `BayesError::ZeroProbability` if the values sum to zero
    pub fn normalize(&self) -> Result<Self> {
        self.normalize_with(&mut OperationCount::default())
    }


    /// `normalize`, tallying the additions of the partition sum in `ops`
    pub fn normalize_with(&self, ops: &mut OperationCount) -> Result<Self> {
        match self {
            &Factor::Identity => Ok(Factor::Identity),
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let z = table.sum();
                ops.additions += table.len() - 1;

                if ! (z > 0.0) {
                    return Err(BayesError::ZeroProbability);
                }

                Ok(Factor::TableFactor {
                    scope: scope.clone(),
                    table: table.mapv(|v| v / z),
                    cpd: true
                })
            }
        }
    }

}


/// Validate a table against the scope it is defined over
fn check_table(scope: &[Variable], table: &Table) -> Result<()> {
    if scope.len() != table.ndim() || scope.iter().unique().count() != scope.len() {
        return Err(BayesError::InvalidScope);
    }

    if scope.iter().map(|v| v.cardinality()).zip(table.shape()).any(|(v, &t)| v != t) {
        return Err(BayesError::InvalidScope);
    }

    // factors may not have negative values
    if table.iter().any(|&v| v < 0.0) {
        return Err(BayesError::NonPositiveProbability);
    }

    Ok(())
}


/// Lay out row-major `values` as a table over `scope`
fn build_table(scope: &[Variable], values: Vec<f64>) -> Result<Table> {
    let shape: Vec<usize> = scope.iter().map(|v| v.cardinality()).collect();
    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| BayesError::General(e.to_string()))
}
