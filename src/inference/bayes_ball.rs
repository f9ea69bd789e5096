//! Determines d-separation in a `DirectedModel` with the Bayes-Ball algorithm.
//!
//! Implementation of Shachter, "Bayes-Ball: The Rational Pastime", 1998. A ball is bounced
//! through the network from the start variable. Whether it passes through a variable, bounces
//! back, or is blocked depends on the direction it arrived from and on whether the variable is
//! observed. The target is d-connected to the start iff the ball reaches it.

use crate::model::directed::DirectedModel;
use crate::util::{BayesError, Result};
use crate::variable::Variable;

use tracing::trace;

use std::collections::HashSet;


/// The direction the ball arrived from at a `Variable`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Direction {
    /// The ball travelled up an edge, from a child of the variable
    FromChild,

    /// The ball travelled down an edge, from a parent of the variable
    FromParent
}


/// Answers d-separation queries over a `DirectedModel`. Holds no state between queries.
pub struct BayesBall<'a> {
    model: &'a DirectedModel
}


impl<'a> BayesBall<'a> {

    pub fn new(model: &'a DirectedModel) -> Self {
        BayesBall { model }
    }


    /// Check if `start` and `end` are d-separated given `evidence`, i.e. if ```start``` is
    /// conditionally independent of ```end``` given ```evidence``` in every distribution that
    /// factorizes over the model.
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` if any of the variables is not in the model
    pub fn is_d_separated(
        &self,
        start: &Variable,
        end: &Variable,
        evidence: &HashSet<Variable>
    ) -> Result<bool> {
        self.reachable(start, end, evidence).map(|r| ! r)
    }


    /// Check if there is an active trail between `start` and `end` given `evidence`.
    ///
    /// # Errors
    /// * `BayesError::UnknownVariable` if any of the variables is not in the model
    pub fn reachable(
        &self,
        start: &Variable,
        end: &Variable,
        evidence: &HashSet<Variable>
    ) -> Result<bool> {
        for v in [start, end].iter().cloned().chain(evidence.iter()) {
            if ! self.model.contains(v) {
                return Err(BayesError::UnknownVariable(v.to_string()));
            }
        }

        if start == end {
            return Ok(true);
        }

        // (variable, direction) pairs that have been processed. A variable may be passed through
        // once in each direction, since what it lets through differs.
        let mut visited: HashSet<(Variable, Direction)> = HashSet::new();
        visited.insert((*start, Direction::FromChild));
        visited.insert((*start, Direction::FromParent));

        // the ball leaves the start towards all of its neighbours
        let mut schedule: Vec<(Variable, Direction)> = Vec::new();
        self.send_to_parents(start, &mut schedule);
        self.send_to_children(start, &mut schedule);

        while let Some((current, direction)) = schedule.pop() {
            if current == *end {
                trace!(variable = %self.model.display_name(&current), ?direction, "reached target");
                return Ok(true);
            }

            if ! visited.insert((current, direction)) {
                continue;
            }

            let observed = evidence.contains(&current);
            trace!(variable = %self.model.display_name(&current), ?direction, observed, "visit");

            match (direction, observed) {
                // an unobserved variable passes a ball from below on to all of its neighbours
                (Direction::FromChild, false) => {
                    self.send_to_parents(&current, &mut schedule);
                    self.send_to_children(&current, &mut schedule);
                },

                // an observed variable blocks a ball from below
                (Direction::FromChild, true) => (),

                // an unobserved variable passes a ball from above on to its children
                (Direction::FromParent, false) => {
                    self.send_to_children(&current, &mut schedule);
                },

                // an observed variable bounces a ball from above back to its parents
                (Direction::FromParent, true) => {
                    self.send_to_parents(&current, &mut schedule);
                }
            }
        }

        Ok(false)
    }


    fn send_to_parents(&self, var: &Variable, schedule: &mut Vec<(Variable, Direction)>) {
        schedule.extend(self.model.parents_of(var).iter().map(|&p| (p, Direction::FromChild)));
    }


    fn send_to_children(&self, var: &Variable, schedule: &mut Vec<(Variable, Direction)>) {
        schedule.extend(self.model.children_of(var).into_iter().map(|c| (c, Direction::FromParent)));
    }
}
