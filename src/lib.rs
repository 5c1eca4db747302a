//! Infers a regular expression from a finite sample of words.
//!
//! The inference runs in three stages. First, the [`learning::ZeroReversibleLearner`] builds
//! the prefix tree of the sample and merges states until the automaton is 0-reversible, i.e.
//! deterministic and deterministic when all transitions are reversed. The result is the
//! smallest 0-reversible automaton accepting the sample. Then [`uniform::uniformize`] gives it a
//! single source without incoming and a single sink without outgoing transitions. Finally the
//! [`elimination::Eliminator`] removes the states in between, relabeling transitions with
//! regular expressions until a single transition from source to sink is left.
//!
//! The expressions built during elimination can grow quickly, how much effort is spent on
//! keeping them small is controlled by a [`simplify::Simplification`] policy.
//!
//! ```
//! use a0lree::prelude::*;
//!
//! let sample = FiniteSample::new(["b", "ab", "aab", "aaaab"]).unwrap();
//! let extraction = Pipeline::default().infer(&sample).unwrap();
//! assert_eq!(extraction.to_string(), "a*b");
//! ```
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use a0lree::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{CharAlphabet, Label, Letter, Symbol},
        automaton::{Automaton, EdgeRef, Snapshot, StateIndex, Transition},
        elimination::{Eliminator, Extraction},
        infer_regex,
        learning::{FiniteSample, ZeroReversibleLearner},
        math,
        pipeline::{LogTables, Observer, Options, Pipeline, Silent, Stage},
        regex::{ParseError, Regex},
        simplify::Simplification,
        uniform::{uniformize, UniformAutomaton, UniformReport},
        Error, Show,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the
/// crate and do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets and transition labels.
pub mod alphabet;

/// Defines the automaton that all stages operate on, together with its snapshots.
pub mod automaton;

/// Learning of 0-reversible automata from finite samples.
pub mod learning;

/// Brings automata into the shape that state elimination requires.
pub mod uniform;

/// Regular expressions, their textual syntax and a matcher.
pub mod regex;

pub mod simplify;

/// Turns a uniform automaton into a regular expression by eliminating states.
pub mod elimination;

pub mod pipeline;

use automaton::StateIndex;
use itertools::Itertools;
use thiserror::Error;

/// Everything that can go wrong in the library. Apart from [`Error::EmptySample`], all of these
/// point to a bug in the calling code or in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The transition already exists.
    #[error("transition (q{from}, {label}, q{to}) already exists")]
    DuplicateTransition {
        /// Where the transition starts.
        from: StateIndex,
        /// The rendered label.
        label: String,
        /// Where the transition leads.
        to: StateIndex,
    },
    /// A state can only be removed once it is detached from all transitions.
    #[error("state q{state} still has {incoming} incoming and {outgoing} outgoing transitions")]
    StateHasTransitions {
        /// The state that should have been removed.
        state: StateIndex,
        /// Number of incoming transitions.
        incoming: usize,
        /// Number of outgoing transitions.
        outgoing: usize,
    },
    /// No state with the given index exists (anymore).
    #[error("state q{0} does not exist")]
    UnknownState(StateIndex),
    /// The initial state can not be removed.
    #[error("state q{0} is initial and can not be removed")]
    RemovesInitialState(StateIndex),
    /// The merging of clashing states did not end in a 0-reversible automaton.
    #[error("learner invariant violated: {0}")]
    LearnerInvariant(String),
    /// There is nothing to learn from.
    #[error("the sample does not contain any words")]
    EmptySample,
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example q0, q1, q2, ... and for a transition (q0, a, q1) it should be (q0, a, q1).
    fn show(&self) -> String;
}

impl Show for StateIndex {
    fn show(&self) -> String {
        format!("q{self}")
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        format!("{{{}}}", self.iter().map(Show::show).join(", "))
    }
}

/// Infers a regular expression for the given words with the default [`pipeline::Options`].
pub fn infer_regex<I, W>(words: I) -> Result<elimination::Extraction>
where
    I: IntoIterator<Item = W>,
    W: Into<String>,
{
    let sample = learning::FiniteSample::new(words)?;
    pipeline::Pipeline::default().infer(&sample)
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn errors_are_readable() {
        let err = Error::DuplicateTransition {
            from: 0,
            label: "a".to_string(),
            to: 1,
        };
        assert_eq!(err.to_string(), "transition (q0, a, q1) already exists");
        assert_eq!(
            infer_regex(Vec::<String>::new()),
            Err(Error::EmptySample)
        );
    }

    #[test]
    fn slices_are_shown_as_sets() {
        assert_eq!([0u32, 2][..].show(), "{q0, q2}");
        assert_eq!(infer_regex(["ab", "b"]).unwrap().to_string(), "a*b");
    }
}
