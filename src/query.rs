//! Parses and answers textual queries against a `DirectedModel`.
//!
//! Two kinds of queries are understood:
//!
//! * independence queries, ```B-E|J=T,M=T```: are `B` and `E` independent given `J` and `M`?
//!   The observed values are optional, ```B-E|J,M``` asks the same question.
//! * probability queries, ```P(B=T|J=T,M=T) A-E```: the probability of `B=T` given `J=T` and
//!   `M=T`, eliminating `A` before `E`. The evidence and the elimination order are optional.

use crate::factor::OperationCount;
use crate::inference::{BayesBall, VariableEliminationEngine};
use crate::model::directed::DirectedModel;
use crate::util::{BayesError, Result};
use crate::variable::{Assignment, Variable};

use itertools::Itertools;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;


/// A variable and one of its outcomes, by name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub variable: String,
    pub outcome: String
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Is `start` independent of `end` given the `given` variables?
    Independence {
        start: String,
        end: String,
        given: Vec<String>
    },

    /// What is the probability of the `query` outcomes given the `evidence`?
    Probability {
        query: Vec<Observation>,
        evidence: Vec<Observation>,

        /// Hidden variables to eliminate first, in order
        order: Vec<String>
    }
}


/// The answer to a `Query`. Displays as `yes`/`no` for independence, and as
/// ```probability,additions,multiplications``` for a probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Answer {
    Independent(bool),
    Probability { value: f64, ops: OperationCount }
}


impl Query {

    /// Answer the query over `model`.
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` or `BayesError::UnknownOutcome` for names the model does
    ///   not know
    /// * `BayesError::MalformedQuery` if a variable is given twice
    /// * any inference error, e.g. `BayesError::ZeroProbability`
    pub fn answer(&self, model: &DirectedModel) -> Result<Answer> {
        match self {
            Query::Independence { start, end, given } => {
                let start = model.resolve(start)?;
                let end = model.resolve(end)?;
                let given = given.iter()
                                 .map(|name| model.resolve(name))
                                 .collect::<Result<HashSet<Variable>>>()?;

                BayesBall::new(model).is_d_separated(&start, &end, &given).map(Answer::Independent)
            },

            Query::Probability { query, evidence, order } => {
                let query = resolve_observations(model, query)?;
                let evidence = resolve_observations(model, evidence)?;
                let order = order.iter()
                                 .map(|name| model.resolve(name))
                                 .collect::<Result<Vec<Variable>>>()?;

                let mut engine = VariableEliminationEngine::new(model, &evidence).with_order(&order);
                let value = engine.probability(&query)?;

                Ok(Answer::Probability { value, ops: engine.operations() })
            }
        }
    }

}


fn resolve_observations(model: &DirectedModel, observations: &[Observation]) -> Result<Assignment> {
    let mut assignment = Assignment::new();
    for obs in observations {
        let var = model.resolve(&obs.variable)?;
        if assignment.contains(&var) {
            return Err(BayesError::MalformedQuery(format!("{} is given twice", obs.variable)));
        }
        assignment.set(&var, model.outcome_index(&var, &obs.outcome)?);
    }
    Ok(assignment)
}


impl FromStr for Query {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("P(") {
            parse_probability(s)
        } else {
            parse_independence(s)
        }
    }
}


fn malformed(s: &str) -> BayesError {
    BayesError::MalformedQuery(String::from(s))
}


/// ```start-end|X=x,Y```
fn parse_independence(s: &str) -> Result<Query> {
    let mut parts = s.splitn(2, '|');
    let pair = parts.next().unwrap_or("");
    let given = parts.next().unwrap_or("");

    let names: Vec<&str> = pair.split('-').map(str::trim).collect();
    let (start, end) = match names.as_slice() {
        [start, end] if ! start.is_empty() && ! end.is_empty() => (start, end),
        _ => return Err(malformed(s))
    };

    let given = given.split(',')
                     .map(|entry| entry.split('=').next().unwrap_or("").trim())
                     .filter(|name| ! name.is_empty())
                     .map(String::from)
                     .collect();

    Ok(Query::Independence { start: String::from(*start), end: String::from(*end), given })
}


/// ```P(Q=q,...|E=e,...) H1-H2-...```
fn parse_probability(s: &str) -> Result<Query> {
    let close = s.find(')').ok_or_else(|| malformed(s))?;
    let inner = &s[2..close];
    let rest = s[close + 1..].trim();

    let mut parts = inner.splitn(2, '|');
    let query = parse_observations(parts.next().unwrap_or(""), s)?;
    let evidence = parse_observations(parts.next().unwrap_or(""), s)?;

    if query.is_empty() {
        return Err(malformed(s));
    }

    let order: Vec<String> = if rest.is_empty() {
        vec![]
    } else {
        rest.split('-').map(|n| String::from(n.trim())).collect()
    };

    if order.iter().any(|n| n.is_empty()) {
        return Err(malformed(s));
    }

    Ok(Query::Probability { query, evidence, order })
}


/// ```X=x,Y=y```, possibly empty
fn parse_observations(part: &str, query: &str) -> Result<Vec<Observation>> {
    part.split(',')
        .map(str::trim)
        .filter(|entry| ! entry.is_empty())
        .map(|entry| {
            let mut kv = entry.splitn(2, '=').map(str::trim);
            match (kv.next(), kv.next()) {
                (Some(variable), Some(outcome)) if ! variable.is_empty() && ! outcome.is_empty() => {
                    Ok(Observation { variable: String::from(variable), outcome: String::from(outcome) })
                },
                _ => Err(malformed(query))
            }
        })
        .collect()
}


impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.variable, self.outcome)
    }
}


impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Query::Independence { start, end, given } => {
                write!(f, "{}-{}|{}", start, end, given.join(","))
            },
            Query::Probability { query, evidence, order } => {
                write!(f, "P({}", query.iter().join(","))?;
                if ! evidence.is_empty() {
                    write!(f, "|{}", evidence.iter().join(","))?;
                }
                write!(f, ")")?;
                if ! order.is_empty() {
                    write!(f, " {}", order.join("-"))?;
                }
                Ok(())
            }
        }
    }
}


impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Answer::Independent(true) => write!(f, "yes"),
            Answer::Independent(false) => write!(f, "no"),
            Answer::Probability { value, ops } => {
                write!(f, "{:.5},{},{}", value, ops.additions, ops.multiplications)
            }
        }
    }
}
