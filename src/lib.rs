//! Exact reasoning over discrete Bayesian networks: d-separation with Bayes-Ball, and
//! conditional probabilities by variable elimination.

pub mod variable;
pub mod factor;
pub mod init;
pub mod model;
pub mod inference;
pub mod loader;
pub mod query;
pub mod util;

pub use util::{Result, BayesError};
pub use variable::{all_assignments, Assignment, Variable};
pub use factor::{Factor, OperationCount};
pub use init::Initialization;
pub use model::Model;
pub use model::directed::{DirectedModel, DirectedModelBuilder, Node};
pub use inference::{BayesBall, ConditionalInferenceEngine, EnumerationEngine, VariableEliminationEngine};
pub use query::{Answer, Observation, Query};
