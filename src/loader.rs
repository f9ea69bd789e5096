//! Loads a `DirectedModel` from a JSON network description.
//!
//! The description lists the variables with their outcome labels, and one definition per
//! variable giving its parents and its conditional probability table:
//!
//! ```json
//! {
//!   "variables": [
//!     { "name": "B", "outcomes": ["T", "F"] },
//!     { "name": "A", "outcomes": ["T", "F"] }
//!   ],
//!   "definitions": [
//!     { "for": "B", "table": [0.001, 0.999] },
//!     { "for": "A", "given": ["B"], "table": [0.94, 0.06, 0.001, 0.999] }
//!   ]
//! }
//! ```
//!
//! A table is laid out row-major over the `given` variables, in order, followed by the variable
//! itself, so each run of consecutive entries is the distribution for one parent assignment.
//! Definitions may appear in any order.

use crate::factor::Factor;
use crate::init::Initialization;
use crate::model::directed::{DirectedModel, DirectedModelBuilder};
use crate::util::{BayesError, Result};
use crate::variable::Variable;

use indexmap::IndexMap;
use ndarray::{ArrayD, IxDyn};
use serde::Deserialize;
use tracing::debug;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;


#[derive(Debug, Deserialize)]
struct NetworkFile {
    variables: Vec<VariableEntry>,
    definitions: Vec<Definition>
}


#[derive(Debug, Deserialize)]
struct VariableEntry {
    name: String,
    outcomes: Vec<String>
}


#[derive(Debug, Deserialize)]
struct Definition {
    #[serde(rename = "for")]
    target: String,

    #[serde(default)]
    given: Vec<String>,

    table: Vec<f64>
}


/// Parse a network description
///
/// # Errors
/// * `BayesError::Json` if the text is not a network description
/// * any error of the network itself, see `build`
pub fn from_str(s: &str) -> Result<DirectedModel> {
    let file: NetworkFile = serde_json::from_str(s)?;
    build(file)
}


/// Read a network description
pub fn from_reader<R: Read>(reader: R) -> Result<DirectedModel> {
    let file: NetworkFile = serde_json::from_reader(reader)?;
    build(file)
}


/// Read a network description from a file
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DirectedModel> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading network");
    from_reader(BufReader::new(File::open(path)?))
}


/// Assemble the `DirectedModel` of a parsed description.
///
/// # Errors
/// * `BayesError::DuplicateVariable` if a name is declared or defined twice
/// * `BayesError::InvalidScope` if a variable lists the same parent twice
/// * `BayesError::UnknownVariable` if a definition names an undeclared variable
/// * `BayesError::General` if a variable has no outcomes or no definition
/// * `BayesError::Cycle` if the parents do not form a DAG
/// * `BayesError::TableSize` if a table does not have one entry per assignment
/// * `BayesError::NotACPD` if a row of a table does not sum to one
fn build(file: NetworkFile) -> Result<DirectedModel> {
    ///////////////////////////////////////////////////////////////////////
    // 1) Declare the variables
    let mut declared: IndexMap<String, (Variable, Vec<String>)> = IndexMap::new();
    for entry in file.variables {
        if entry.outcomes.is_empty() {
            return Err(BayesError::General(format!("Variable '{}' has no outcomes", entry.name)));
        }
        if declared.contains_key(&entry.name) {
            return Err(BayesError::DuplicateVariable);
        }

        let var = Variable::discrete(entry.outcomes.len());
        declared.insert(entry.name, (var, entry.outcomes));
    }

    ///////////////////////////////////////////////////////////////////////
    // 2) Match every variable with its definition
    let mut definitions: IndexMap<String, Definition> = IndexMap::new();
    for def in file.definitions {
        for name in def.given.iter().chain(Some(&def.target)) {
            if ! declared.contains_key(name) {
                return Err(BayesError::UnknownVariable(name.clone()));
            }
        }
        if definitions.contains_key(&def.target) {
            return Err(BayesError::DuplicateVariable);
        }
        definitions.insert(def.target.clone(), def);
    }

    if let Some(name) = declared.keys().find(|n| ! definitions.contains_key(*n)) {
        return Err(BayesError::General(format!("No definition for variable '{}'", name)));
    }

    ///////////////////////////////////////////////////////////////////////
    // 3) Add the variables parents first, keeping the declaration order where possible
    let order = topological_order(&declared, &definitions)?;

    let mut builder = DirectedModelBuilder::new();
    for name in order {
        let (var, outcomes) = &declared[name.as_str()];
        let def = &definitions[name.as_str()];

        let parents: Vec<Variable> = def.given.iter().map(|p| declared[p.as_str()].0).collect();
        let mut shape: Vec<usize> = parents.iter().map(|p| p.cardinality()).collect();
        shape.push(var.cardinality());

        let expected: usize = shape.iter().product();
        if def.table.len() != expected {
            return Err(BayesError::TableSize {
                variable: name.clone(),
                expected,
                found: def.table.len()
            });
        }

        let table = ArrayD::from_shape_vec(IxDyn(&shape), def.table.clone())
            .map_err(|e| BayesError::General(e.to_string()))?;
        let cpd = Factor::cpd(*var, parents.clone(), table)?;

        builder = builder.with_node(var, &name, outcomes, parents, Initialization::Table(cpd));
    }

    let model = builder.build()?;
    debug!(variables = declared.len(), "network loaded");
    Ok(model)
}


/// Order the variables so that each one follows its parents. Among the variables that are ready,
/// the one declared first goes first.
fn topological_order(
    declared: &IndexMap<String, (Variable, Vec<String>)>,
    definitions: &IndexMap<String, Definition>
) -> Result<Vec<String>> {
    let mut order: Vec<String> = Vec::with_capacity(declared.len());

    while order.len() < declared.len() {
        let next = declared.keys()
            .filter(|n| ! order.contains(*n))
            .find(|n| definitions[n.as_str()].given.iter().all(|p| order.contains(p)));

        match next {
            Some(name) => order.push(name.clone()),
            None => {
                // every remaining variable waits on another remaining one
                let stuck = declared.keys().find(|n| ! order.contains(*n));
                return Err(BayesError::Cycle(stuck.cloned().unwrap_or_default()));
            }
        }
    }

    Ok(order)
}
