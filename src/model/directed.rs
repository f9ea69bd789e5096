//! Defines a `DirectedModel`, which is a Bayesian model that represents the factorization of
//! a probability distribution P

use crate::factor::Factor;
use crate::init::Initialization;
use crate::util::{BayesError, Result};
use crate::variable::{Assignment, Variable};
use super::Model;

use bidir_map::BidirMap;
use indexmap::IndexMap;

use std::collections::HashSet;


/// A `Variable` of a `DirectedModel` together with its outcome labels, its parents and its CPD.
#[derive(Clone, Debug)]
pub struct Node {
    variable: Variable,

    /// Labels of the outcomes, in domain order
    outcomes: Vec<String>,

    /// The parents, in the order of the CPD's scope
    parents: Vec<Variable>,

    /// ```P(variable | parents)```, with scope ```parents``` followed by ```variable```
    cpd: Factor
}

impl Node {

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn parents(&self) -> &[Variable] {
        &self.parents
    }

    pub fn cpd(&self) -> &Factor {
        &self.cpd
    }
}


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network is represented as a Directed Acyclic Graph (DAG). A traditional graph data
/// structure is not used for the simple representation of a `DirectedModel`; instead, the
/// parent list of each `Node` implicitly defines the edges of the graph. The `Node`s are held in
/// their topological order to faciliate efficient computations over the graph.
pub struct DirectedModel {

    /// The `Node` of each `Variable`. There are edges ```P -> X forall P in X.parents()```
    graph: IndexMap<Variable, Node>,

    /// The user-defined names of each `Variable`. This is a two way lookup ```(`Variable`->Name)```
    /// and ```(Name->`Variable`)```
    names: BidirMap<Variable, String>

}

impl DirectedModel {

    /// Get the `Node`s of the model, in topological order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.values()
    }

    /// Get the `Node` with the given name
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` if no variable has that name
    pub fn node(&self, name: &str) -> Result<&Node> {
        let var = self.resolve(name)?;
        self.graph.get(&var).ok_or_else(|| BayesError::UnknownVariable(String::from(name)))
    }

    /// Get the `Node` of a `Variable`
    pub fn node_of(&self, var: &Variable) -> Option<&Node> {
        self.graph.get(var)
    }

    /// Get the CPD for the given variable in this model.
    pub fn cpd(&self, v: &Variable) -> Option<&Factor> {
        self.graph.get(v).map(|n| &n.cpd)
    }

    /// Check if `var` belongs to this model
    pub fn contains(&self, var: &Variable) -> bool {
        self.graph.contains_key(var)
    }

    /// Get a topological order of the `DirectedModel`
    pub fn topological_order(&self) -> Vec<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Resolve the name of a `Variable`
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` if no variable has that name
    pub fn resolve(&self, name: &str) -> Result<Variable> {
        self.lookup_variable(name)
            .cloned()
            .ok_or_else(|| BayesError::UnknownVariable(String::from(name)))
    }

    /// The name of `var`, or its generated identifier if it is not part of this model
    pub fn display_name(&self, var: &Variable) -> String {
        self.lookup_name(var).cloned().unwrap_or_else(|| var.to_string())
    }

    /// The parents of `var`, in the order of its CPD. Empty if `var` is not in the model.
    pub fn parents_of(&self, var: &Variable) -> &[Variable] {
        match self.graph.get(var) {
            Some(node) => node.parents.as_slice(),
            None => &[]
        }
    }

    /// The children of `var`: every variable that lists `var` as a parent
    pub fn children_of(&self, var: &Variable) -> Vec<Variable> {
        self.graph.values()
                  .filter(|n| n.parents.contains(var))
                  .map(|n| n.variable)
                  .collect()
    }

    /// The names of the parents of the named variable
    pub fn parents(&self, name: &str) -> Result<Vec<&str>> {
        let var = self.resolve(name)?;
        Ok(self.parents_of(&var).iter().filter_map(|p| self.name_str(p)).collect())
    }

    /// The names of the children of the named variable
    pub fn children(&self, name: &str) -> Result<Vec<&str>> {
        let var = self.resolve(name)?;
        Ok(self.children_of(&var).iter().filter_map(|c| self.name_str(c)).collect())
    }

    /// Check if there is a directed path ```ancestor -> ... -> descendant```. A variable is not its
    /// own ancestor.
    pub fn is_ancestor_of(&self, ancestor: &Variable, descendant: &Variable) -> bool {
        let mut visited = HashSet::new();
        let mut stack: Vec<Variable> = self.parents_of(descendant).to_vec();

        while let Some(v) = stack.pop() {
            if v == *ancestor {
                return true;
            }

            if visited.insert(v) {
                stack.extend(self.parents_of(&v));
            }
        }

        false
    }

    /// Translate an outcome label of `var` to its index in the domain
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` if `var` is not in the model
    /// * `BayesError::UnknownOutcome` if `label` is not an outcome of `var`
    pub fn outcome_index(&self, var: &Variable, label: &str) -> Result<usize> {
        let node = self.graph.get(var).ok_or_else(|| BayesError::UnknownVariable(var.to_string()))?;
        node.outcomes.iter().position(|o| o == label).ok_or_else(|| {
            BayesError::UnknownOutcome {
                variable: self.display_name(var),
                outcome: String::from(label)
            }
        })
    }

    /// Translate an outcome index of `var` to its label
    pub fn outcome_label(&self, var: &Variable, idx: usize) -> Option<&str> {
        self.graph.get(var).and_then(|n| n.outcomes.get(idx)).map(|s| s.as_str())
    }

    fn name_str(&self, var: &Variable) -> Option<&str> {
        self.lookup_name(var).map(|s| s.as_str())
    }
}

impl Model for DirectedModel {

    /// Lookup a `Variable` in the `DirectedModel` based on the name
    fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name))
    }

    /// Lookup a `Variable`'s name in the `DirectedModel`.
    fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(var)
    }

    /// Get all `Variable`s in the model.
    fn variables(&self) -> HashSet<Variable> {
        self.graph.keys().cloned().collect()
    }

    /// Get the number of `Variable`s in the the `DirectedModel`
    fn num_variables(&self) -> usize {
        self.graph.len()
    }

    /// Determine the probability of a full `Assignment` to the `Variable`s in the `DirectedModel`.
    fn probability(&self, assignment: &Assignment) -> Result<f64> {
        // for every variable in the graph
        self.graph.values()
                  // get the probability of the assignment
                  .map(|n| n.cpd.value(assignment))
                  // and multiply those probability by the chain rule
                  // but if there are any errors, just return the error
                  .fold(Ok(1.0), |acc, val| acc.and_then(|p| val.map(|v| p * v)))
    }
}


/// An implementation of the [builder pattern] for creating a `DirectedModel`.
///
/// Models must be assembled in topological order: the parents of a `Variable` have to be added
/// before the `Variable` itself, which guarantees the result is acyclic.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct DirectedModelBuilder {

    /// The `Node`s added so far
    nodes: IndexMap<Variable, Node>,

    /// The names of each `Variable`
    names: BidirMap<Variable, String>,

    /// The error state of the builder
    err: Option<BayesError>

}


impl DirectedModelBuilder {

    /// Construct a new `DirectedModelBuilder` representing an empty `DirectedModel`
    pub fn new() -> Self {
        DirectedModelBuilder {
            nodes: IndexMap::new(),
            names: BidirMap::new(),
            err: None
        }
    }


    /// Add an anonymous `Variable` to the `DirectedModel`. Its outcomes are labelled by index.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the parent variables. The parents must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(self, var: &Variable, parents: Vec<Variable>, init: Initialization) -> Self {
        let name = var.to_string();
        self.with_named_variable(var, &name, parents, init)
    }


    /// Add a named `Variable` to the `DirectedModel`. Its outcomes are labelled by index.
    pub fn with_named_variable(
        self,
        var: &Variable,
        name: &str,
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        let outcomes: Vec<String> = (0..var.cardinality()).map(|i| i.to_string()).collect();
        self.with_node(var, name, &outcomes, parents, init)
    }


    /// Add a named `Variable` with labelled outcomes to the `DirectedModel`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `name`: the name for the variable.
    /// * `outcomes`: the labels of the outcomes of `var`, in domain order
    /// * `parents`: the parent variables, in the order of the CPD. They must already be in the
    ///   model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_node<S: AsRef<str>>(
        mut self,
        var: &Variable,
        name: &str,
        outcomes: &[S],
        parents: Vec<Variable>,
        init: Initialization,
    ) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        if parents.iter().any(|v| ! self.nodes.contains_key(v)) {
            self.err = Some(BayesError::MissingParent);
            return self;
        }

        if self.nodes.contains_key(var) || self.names.get_by_second(&String::from(name)).is_some() {
            self.err = Some(BayesError::DuplicateVariable);
            return self;
        }

        if outcomes.len() != var.cardinality() {
            self.err = Some(BayesError::InvalidScope);
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Build the CPD based on the initialization
        let cpd = match init.build_cpd(*var, &parents) {
            Ok(cpd) => cpd,
            Err(e) => {
                self.err = Some(e);
                return self;
            }
        };

        ///////////////////////////////////////////////////////////////////////
        // 4) Add to current model
        let node = Node {
            variable: *var,
            outcomes: outcomes.iter().map(|o| String::from(o.as_ref())).collect(),
            parents,
            cpd
        };
        self.nodes.insert(*var, node);
        self.names.insert(*var, String::from(name));

        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `DirectedModel`, or an error if one was generated during the building process
    ///
    /// # Postcondition
    /// This call consumes the `DirectedModelBuilder`
    pub fn build(self) -> Result<DirectedModel> {
        if let Some(e) = self.err {
            Err(e)
        } else {
            Ok(DirectedModel { graph: self.nodes, names: self.names })
        }
    }
}
