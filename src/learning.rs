use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    alphabet::{Label, Letter},
    automaton::{Automaton, StateIndex},
    math::group_ordered,
    pipeline::{notify, Observer, Silent, Stage},
    Error, Result, Show,
};

mod prefix_tree;
mod sample;

pub use prefix_tree::prefix_tree;
pub use sample::FiniteSample;

/// Two states that have to be merged because of a common neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clash {
    /// `state` reaches both `first` and `second` with transitions carrying the same label.
    Forward {
        /// The state with the non-deterministic transitions.
        state: StateIndex,
        /// One of the targets.
        first: StateIndex,
        /// The other target.
        second: StateIndex,
    },
    /// `state` is reached from both `first` and `second` with transitions carrying the
    /// same label.
    Backward {
        /// The state with the non-deterministic incoming transitions.
        state: StateIndex,
        /// One of the sources.
        first: StateIndex,
        /// The other source.
        second: StateIndex,
    },
}

impl Clash {
    /// The two states that must be merged to resolve the clash.
    pub fn states(&self) -> (StateIndex, StateIndex) {
        match self {
            Clash::Forward { first, second, .. } | Clash::Backward { first, second, .. } => {
                (*first, *second)
            }
        }
    }
}

/// Finds a clash around `state`, looking at its outgoing transitions first. Since no
/// transition exists twice, equal labels always lead to distinct neighbours.
pub fn find_clash<L: Label>(automaton: &Automaton<L>, state: StateIndex) -> Option<Clash> {
    let forward = group_ordered(automaton.outgoing(state).map(|e| (e.label, e.target)));
    if let Some(targets) = forward.values().find(|targets| targets.len() > 1) {
        return Some(Clash::Forward {
            state,
            first: targets[0],
            second: targets[1],
        });
    }
    let backward = group_ordered(automaton.incoming(state).map(|e| (e.label, e.source)));
    backward
        .values()
        .find(|sources| sources.len() > 1)
        .map(|sources| Clash::Backward {
            state,
            first: sources[0],
            second: sources[1],
        })
}

/// Merges all accepting states into a single one and returns it, or `None` if no state is
/// accepting.
pub fn merge_accepting_states<L: Label>(
    automaton: &mut Automaton<L>,
) -> Result<Option<StateIndex>> {
    let accepting = automaton.accepting_states();
    debug!("merging {} accepting states into one", accepting.len());
    let mut iter = accepting.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    iter.try_fold(first, |merged, q| automaton.merge(merged, q))
        .map(Some)
}

/// Merges clashing states until the automaton is deterministic and reverse-deterministic and
/// returns the number of merges that were performed.
///
/// Merging two states only changes the transitions of the state that survives (its neighbours
/// merely see one target or source renamed, which can not introduce equal labels to distinct
/// states). Hence a worklist holding every state once, and afterwards each survivor of a merge,
/// suffices to reach the fixed point.
pub fn restore_zero_reversibility<L: Label>(automaton: &mut Automaton<L>) -> Result<usize> {
    let limit = automaton.size();
    let mut worklist: VecDeque<StateIndex> = automaton.state_indices().collect();
    let mut merges = 0;

    while let Some(q) = worklist.pop_front() {
        let Some(mut q) = automaton.resolve(q) else {
            continue;
        };
        while let Some(clash) = find_clash(automaton, q) {
            trace!("resolving {clash:?}");
            let (first, second) = clash.states();
            let survivor = automaton.merge(first, second)?;
            merges += 1;
            if merges >= limit {
                return Err(Error::LearnerInvariant(format!(
                    "performed {merges} merges on an automaton with {limit} states"
                )));
            }
            worklist.push_back(survivor);
            match automaton.resolve(q) {
                Some(resolved) => q = resolved,
                None => break,
            }
        }
    }

    if !automaton.is_zero_reversible() {
        return Err(Error::LearnerInvariant(
            "no clash is left, yet the automaton is not 0-reversible".to_string(),
        ));
    }
    debug!("reached 0-reversible automaton after {merges} merges");
    Ok(merges)
}

/// Infers the smallest 0-reversible automaton accepting a [`FiniteSample`], following
/// Angluin's algorithm for zero-reversible languages:
/// 1. build the prefix tree of the sample,
/// 2. merge all accepting states,
/// 3. merge states as long as some state has two outgoing or two incoming transitions with
///    the same label.
///
/// The resulting automaton accepts every word of the sample and generalizes only as far as
/// the merges force it to.
#[derive(Clone, Debug)]
pub struct ZeroReversibleLearner<'a> {
    sample: &'a FiniteSample,
}

impl<'a> ZeroReversibleLearner<'a> {
    /// Creates a learner for the given sample.
    pub fn new(sample: &'a FiniteSample) -> Self {
        Self { sample }
    }

    /// Runs the learner.
    pub fn learn(&self) -> Result<Automaton<Letter>> {
        self.learn_observed(&mut Silent)
    }

    /// Runs the learner and hands the automaton to `observer` after each stage.
    pub fn learn_observed<O: Observer>(&self, observer: &mut O) -> Result<Automaton<Letter>> {
        debug!(
            "learning from {} words over alphabet {}",
            self.sample.len(),
            self.sample.alphabet().show()
        );
        let mut automaton = prefix_tree(self.sample)?;
        debug!("prefix tree has {} states", automaton.size());
        trace!("prefix tree\n{:?}", automaton);
        notify(observer, Stage::PrefixTree, &automaton);

        merge_accepting_states(&mut automaton)?;
        notify(observer, Stage::AcceptingMerged, &automaton);

        restore_zero_reversibility(&mut automaton)?;
        debug!(
            "0-reversible automaton has {} states and {} transitions",
            automaton.size(),
            automaton.transition_count()
        );
        trace!("0-reversible automaton\n{:?}", automaton);
        notify(observer, Stage::ZeroReversible, &automaton);
        Ok(automaton)
    }
}
