//! Defines the `Error` type for the bayesnet library

use std::io;
use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, BayesError>;

#[derive(Debug, Error)]
pub enum BayesError {

    /// Represents an incomplete assignment where a complete assignment was required.
    #[error("Missing assignments to the required Variables")]
    IncompleteAssignment,

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("Provided scope did not satisfy constraints")]
    InvalidScope,

    /// The evidence has zero probability, so no posterior is defined
    #[error("The evidence has zero probability")]
    ZeroProbability,

    /// Represents an error where there was a parent variable expected, but not found
    #[error("Missing a parent from the model")]
    MissingParent,

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("A variable was encountered twice")]
    DuplicateVariable,

    /// A name that does not belong to any variable of the model
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// An outcome label that is not in the domain of the variable
    #[error("Unknown outcome '{outcome}' for variable '{variable}'")]
    UnknownOutcome { variable: String, outcome: String },

    /// Represents the situation when we expected a CPD but did not receive one
    #[error("Requires a Conditional Probability Distribution")]
    NotACPD,

    /// Represents an attempt to initialize a variable with an incompatible Initialization
    #[error("An invalid initialization was provided")]
    InvalidInitialization,

    /// Represents a situation in which there was a non-positive probability provided
    #[error("Encountered a non-positive probability")]
    NonPositiveProbability,

    /// A table whose length does not match the domains of its variables
    #[error("Table for '{variable}' has {found} entries, expected {expected}")]
    TableSize { variable: String, expected: usize, found: usize },

    /// The network definitions contain a directed cycle
    #[error("The network contains a cycle through '{0}'")]
    Cycle(String),

    /// A query that could not be parsed or that contradicts itself
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A general error with the given description
    #[error("{0}")]
    General(String),

}
