//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Bayesian Network. `Variable`s are
//! lightweight handles: the human readable name and the outcome labels of a `Variable` are owned
//! by the model it belongs to, which keeps `Variable`s cheap to copy into scopes and assignments.

use itertools::Itertools;

use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of unique ids for newly created `Variable`s
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A discrete random variable with a finite, ordered domain of `cardinality` outcomes. Outcomes
/// are identified by their index in the domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// The unique id of the `Variable`
    id: usize,

    /// The number of outcomes in the domain of the `Variable`
    cardinality: usize
}

impl Variable {

    /// Construct a new binary `Variable`
    pub fn binary() -> Self {
        Variable::discrete(2)
    }

    /// Construct a new `Variable` with `cardinality` outcomes
    pub fn discrete(cardinality: usize) -> Self {
        Variable {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            cardinality
        }
    }

    /// Get the number of outcomes of this `Variable`
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "X{}", self.id)
    }

}


/// A (possibly partial) assignment of outcomes to `Variable`s. Values are outcome indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: HashMap<Variable, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: HashMap::new() }
    }

    /// Assign outcome `value` to `var`, replacing any previous value
    pub fn set(&mut self, var: &Variable, value: usize) {
        self.values.insert(*var, value);
    }

    /// Get the outcome assigned to `var`, if any
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var)
    }

    /// Check whether `var` is assigned
    pub fn contains(&self, var: &Variable) -> bool {
        self.values.contains_key(var)
    }

    /// Remove `var` from the `Assignment`, returning its value
    pub fn remove(&mut self, var: &Variable) -> Option<usize> {
        self.values.remove(var)
    }

    /// The assigned `Variable`s
    pub fn keys(&self) -> impl Iterator<Item = &Variable> {
        self.values.keys()
    }

    /// Iterate over the `(Variable, outcome)` pairs
    pub fn iter(&self) -> hash_map::Iter<Variable, usize> {
        self.values.iter()
    }

    /// The number of assigned `Variable`s
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl iter::FromIterator<(Variable, usize)> for Assignment {

    fn from_iter<I: IntoIterator<Item = (Variable, usize)>>(iter: I) -> Self {
        Assignment { values: iter.into_iter().collect() }
    }

}


/// Enumerate every full `Assignment` to `scope`.
///
/// The first `Variable` of the scope is the outermost loop and the last one varies fastest, and
/// outcomes are visited in domain order. This is the row-major order of a `Factor` table over the
/// same scope. An empty scope has exactly one (empty) assignment.
pub fn all_assignments(scope: &[Variable]) -> Box<dyn Iterator<Item = Assignment>> {
    if scope.is_empty() {
        return Box::new(iter::once(Assignment::new()));
    }

    let vars = scope.to_vec();
    Box::new(
        scope.iter()
             .map(|v| 0..v.cardinality())
             .multi_cartesian_product()
             .map(move |vals| vars.iter().cloned().zip(vals).collect())
    )
}

// Unit Tests for the Variable module.
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn unique() {
        let a = Variable::binary();
        let b = Variable::binary();

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(2, a.cardinality());
        assert_eq!(7, Variable::discrete(7).cardinality());
    }

    #[test]
    fn assignment() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let mut assn = Assignment::new();
        assert!(assn.is_empty());
        assn.set(&a, 1);
        assn.set(&b, 2);
        assert_eq!(Some(&1), assn.get(&a));
        assert_eq!(Some(&2), assn.get(&b));

        assn.set(&b, 0);
        assert_eq!(Some(&0), assn.get(&b));
        assert_eq!(2, assn.len());

        assert_eq!(Some(1), assn.remove(&a));
        assert!(! assn.contains(&a));
    }

    #[test]
    fn enumeration_order() {
        let a = Variable::binary();
        let b = Variable::discrete(3);

        let seen: Vec<(usize, usize)> = all_assignments(&[a, b])
            .map(|assn| (*assn.get(&a).unwrap(), *assn.get(&b).unwrap()))
            .collect();

        assert_eq!(vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)], seen);
    }

    #[test]
    fn empty_scope() {
        let all: Vec<Assignment> = all_assignments(&[]).collect();
        assert_eq!(1, all.len());
        assert!(all[0].is_empty());
    }
}
