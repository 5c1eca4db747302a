use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    alphabet::Label,
    automaton::{Automaton, StateIndex},
    Result,
};

/// An automaton in the shape required by state elimination: the initial state (the source)
/// has no incoming transitions, a single sink state has no outgoing transitions and is the
/// only accepting state, and every other state lies on a path from the source to the sink.
///
/// The source and the sink are always distinct states. If no path leads from the source to
/// the sink, the automaton accepts nothing and is left with just these two states.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UniformAutomaton<L: Label> {
    automaton: Automaton<L>,
    sink: StateIndex,
    report: UniformReport,
}

/// Records what [`uniformize`] had to change.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct UniformReport {
    /// The fresh source, if the initial state could not serve as one.
    pub fresh_source: Option<StateIndex>,
    /// The fresh sink, if no accepting state could serve as one.
    pub fresh_sink: Option<StateIndex>,
    /// States removed because they do not lie on a path from the source to the sink, in
    /// creation order.
    pub pruned: Vec<StateIndex>,
}

impl<L: Label> UniformAutomaton<L> {
    /// The underlying automaton.
    pub fn automaton(&self) -> &Automaton<L> {
        &self.automaton
    }

    /// The unique state without incoming transitions.
    pub fn source(&self) -> StateIndex {
        self.automaton.initial()
    }

    /// The unique state without outgoing transitions.
    pub fn sink(&self) -> StateIndex {
        self.sink
    }

    /// States that were removed because they are not on any path from the source to the sink.
    pub fn pruned(&self) -> &[StateIndex] {
        &self.report.pruned
    }

    /// Everything that was added or removed.
    pub fn report(&self) -> &UniformReport {
        &self.report
    }

    /// The states other than source and sink, in ascending order.
    pub fn interior(&self) -> Vec<StateIndex> {
        self.automaton
            .state_indices()
            .filter(|q| *q != self.source() && *q != self.sink)
            .sorted()
            .collect()
    }

    /// Decomposes `self` into the automaton and the index of its sink.
    pub fn into_parts(self) -> (Automaton<L>, StateIndex) {
        (self.automaton, self.sink)
    }

    /// Checks the shape: exactly one state without incoming transitions (the source), exactly
    /// one without outgoing transitions (the sink), and every state is reachable from the
    /// source and can reach the sink. An automaton for the empty language fails the last part.
    pub fn is_uniform(&self) -> bool {
        let aut = &self.automaton;
        let no_incoming = aut
            .state_indices()
            .filter(|q| aut.incoming(*q).next().is_none())
            .collect_vec();
        let no_outgoing = aut
            .state_indices()
            .filter(|q| aut.outgoing(*q).next().is_none())
            .collect_vec();
        let forward = aut.reachable_from_initial();
        let backward = aut.co_reachable_to(self.sink);
        no_incoming == vec![self.source()]
            && no_outgoing == vec![self.sink]
            && aut
                .state_indices()
                .all(|q| forward.contains(q as usize) && backward.contains(q as usize))
    }
}

/// Brings `automaton` into the uniform shape described in [`UniformAutomaton`]:
/// - if the initial state has incoming transitions or is accepting, a fresh source is
///   connected to it with an ε-transition,
/// - unless there is a single accepting state without outgoing transitions already, a fresh
///   sink is reached by ε-transitions from all accepting states, which stop accepting,
/// - states that are not reachable from the source or from which the sink can not be reached
///   are removed and reported.
pub fn uniformize<L: Label>(mut automaton: Automaton<L>) -> Result<UniformAutomaton<L>> {
    let mut report = UniformReport::default();
    let initial = automaton.initial();
    if automaton.is_accepting(initial) || automaton.incoming(initial).next().is_some() {
        let source = automaton.add_state(false);
        automaton.add_transition(source, L::epsilon(), initial)?;
        automaton.set_initial(source)?;
        debug!("introduced fresh source q{source}");
        report.fresh_source = Some(source);
    }
    let source = automaton.initial();

    let accepting = automaton.accepting_states();
    let sink = match accepting.as_slice() {
        [single] if automaton.outgoing(*single).next().is_none() => *single,
        _ => {
            let sink = automaton.add_state(true);
            for q in accepting {
                automaton.add_transition(q, L::epsilon(), sink)?;
                automaton.set_accepting(q, false)?;
            }
            debug!("introduced fresh sink q{sink}");
            report.fresh_sink = Some(sink);
            sink
        }
    };

    let forward = automaton.reachable_from_initial();
    let backward = automaton.co_reachable_to(sink);
    let useless = automaton
        .state_indices()
        .filter(|q| *q != source && *q != sink)
        .filter(|q| !forward.contains(*q as usize) || !backward.contains(*q as usize))
        .collect_vec();
    for q in &useless {
        warn!("pruning q{q}, it does not lie on a path from q{source} to q{sink}");
        automaton.remove_edges_from(*q);
        automaton.remove_edges_to(*q);
        automaton.remove_state(*q)?;
    }

    report.pruned = useless;
    Ok(UniformAutomaton {
        automaton,
        sink,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alphabet::Letter,
        learning::{FiniteSample, ZeroReversibleLearner},
    };

    fn learned(words: &[&str]) -> Automaton<Letter> {
        let sample = FiniteSample::new(words.iter().copied()).unwrap();
        ZeroReversibleLearner::new(&sample).learn().unwrap()
    }

    #[test_log::test]
    fn learned_automata_become_uniform() {
        for words in [
            &["b", "ab", "aab", "aaaab"][..],
            &[""],
            &["a", "b"],
            &["", "ab"],
            &["abc", "bca", "cab", "ba"],
        ] {
            let aut = learned(words);
            let uniform = uniformize(aut.clone()).unwrap();
            assert!(uniform.is_uniform(), "{words:?} gives\n{:?}", uniform.automaton());
            assert!(uniform.pruned().is_empty());
            assert_ne!(uniform.source(), uniform.sink());
            assert_eq!(uniform.automaton().accepting_states(), vec![uniform.sink()]);
            for word in words {
                assert!(uniform.automaton().accepts(word));
            }
        }
    }

    #[test]
    fn loop_on_initial_state_needs_fresh_source() {
        // a*b: initial state has a self-loop, the prefix tree used up q0 to q8
        let aut = learned(&["b", "ab", "aab", "aaaab"]);
        let uniform = uniformize(aut).unwrap();
        assert_eq!(uniform.source(), 9);
        // the accepting state had no outgoing transitions, so it stays the sink
        assert_eq!(uniform.sink(), 5);
        assert_eq!(uniform.interior(), vec![0]);
    }

    #[test]
    fn multiple_accepting_states_get_fresh_sink() {
        let aut = Automaton::from_transitions([(0, 'a', 1), (1, 'b', 2)], [1, 2]).unwrap();
        let uniform = uniformize(aut).unwrap();
        assert_eq!(uniform.source(), 0);
        assert_eq!(uniform.sink(), 3);
        assert_eq!(uniform.interior(), vec![1, 2]);
        assert_eq!(
            uniform.report(),
            &UniformReport {
                fresh_source: None,
                fresh_sink: Some(3),
                pruned: vec![]
            }
        );
        assert!(uniform.is_uniform());
        assert!(uniform.automaton().accepts("a"));
        assert!(uniform.automaton().accepts("ab"));
    }

    #[test]
    fn useless_states_are_pruned() {
        let mut aut =
            Automaton::from_transitions([(0, 'a', 1), (0, 'b', 2), (3, 'c', 1)], [1]).unwrap();
        aut.add_transition(2, Letter::Symbol('d'), 2).unwrap();
        let uniform = uniformize(aut).unwrap();
        // 2 can not reach the accepting state, 3 can not be reached
        assert_eq!(uniform.pruned(), &[2, 3]);
        assert!(uniform.is_uniform());
        assert_eq!(uniform.automaton().size(), 2);
    }

    #[test]
    fn nothing_accepting_leaves_source_and_sink() {
        let aut = Automaton::from_transitions([(0, 'a', 1)], []).unwrap();
        let uniform = uniformize(aut).unwrap();
        assert_eq!(uniform.pruned(), &[1]);
        assert_eq!(uniform.automaton().size(), 2);
        assert_eq!(uniform.automaton().transition_count(), 0);
        assert!(!uniform.is_uniform());
    }
}
