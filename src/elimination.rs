use std::fmt::Display;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    alphabet::Label,
    automaton::{Automaton, StateIndex},
    math::group_ordered,
    regex::Regex,
    simplify::Simplification,
    uniform::UniformAutomaton,
    Result,
};

/// The outcome of state elimination.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Extraction {
    /// The label of the single transition from source to sink.
    Expression(Regex),
    /// No transition from source to sink was left, so no word is accepted.
    EmptyLanguage,
}

impl Extraction {
    /// Returns the expression, unless the language is empty.
    pub fn expression(&self) -> Option<&Regex> {
        match self {
            Extraction::Expression(regex) => Some(regex),
            Extraction::EmptyLanguage => None,
        }
    }

    /// Returns true for [`Extraction::EmptyLanguage`].
    pub fn is_empty_language(&self) -> bool {
        matches!(self, Extraction::EmptyLanguage)
    }

    /// Decides whether `word` belongs to the extracted language.
    pub fn matches<W: AsRef<str>>(&self, word: W) -> bool {
        self.expression().is_some_and(|regex| regex.matches(word))
    }
}

impl Display for Extraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extraction::Expression(regex) => write!(f, "{regex}"),
            Extraction::EmptyLanguage => write!(f, "∅"),
        }
    }
}

/// Removes the interior states of a uniform automaton one by one. The next state is the one that
/// creates the fewest new paths, i.e. the product of its incoming and outgoing transitions
/// (self-loops not counted) is minimal, ties are broken by the smaller index. Eliminating `q`
/// replaces every path `p → q → r` by a direct transition labeled with
/// `L_in · L_self* · L_out`, where a missing self-loop on `q` simply drops the middle factor.
/// Between any two states there is at most one transition at all times, new labels are joined
/// with an existing one by union.
///
/// Every expression is built through the configured [`Simplification`] policy.
#[derive(Clone, Debug)]
pub struct Eliminator {
    automaton: Automaton<Regex>,
    source: StateIndex,
    sink: StateIndex,
    policy: Simplification,
}

impl Eliminator {
    /// Turns the labels of `uniform` into expressions and combines parallel transitions.
    pub fn new<L: Label + Into<Regex>>(
        uniform: UniformAutomaton<L>,
        policy: Simplification,
    ) -> Result<Self> {
        let source = uniform.source();
        let (automaton, sink) = uniform.into_parts();
        let mut eliminator = Self {
            automaton: automaton.map_labels(Into::into),
            source,
            sink,
            policy,
        };
        eliminator.combine_parallel_transitions()?;
        Ok(eliminator)
    }

    /// The automaton in its current state.
    pub fn automaton(&self) -> &Automaton<Regex> {
        &self.automaton
    }

    /// The source of the uniform automaton.
    pub fn source(&self) -> StateIndex {
        self.source
    }

    /// The sink of the uniform automaton.
    pub fn sink(&self) -> StateIndex {
        self.sink
    }

    /// The number of interior states that are still to be eliminated.
    pub fn interior_count(&self) -> usize {
        self.automaton.size().saturating_sub(2)
    }

    /// Number of paths through `state` that its elimination replaces.
    pub fn weight(&self, state: StateIndex) -> usize {
        let entering = self
            .automaton
            .incoming(state)
            .filter(|e| e.source != state)
            .count();
        let leaving = self
            .automaton
            .outgoing(state)
            .filter(|e| e.target != state)
            .count();
        entering * leaving
    }

    /// The interior state that [`Eliminator::step`] removes next.
    pub fn next_state(&self) -> Option<StateIndex> {
        self.automaton
            .state_indices()
            .filter(|q| *q != self.source && *q != self.sink)
            .min_by_key(|q| (self.weight(*q), *q))
    }

    /// Eliminates the interior state given by [`Eliminator::next_state`] and returns it, or
    /// `None` once only source and sink are left.
    pub fn step(&mut self) -> Result<Option<StateIndex>> {
        let Some(state) = self.next_state() else {
            return Ok(None);
        };
        self.eliminate(state)?;
        Ok(Some(state))
    }

    /// Eliminates all remaining interior states and reads off the result.
    pub fn run(mut self) -> Result<Extraction> {
        while self.step()?.is_some() {}
        let remaining = self
            .automaton
            .transitions_between(self.source, self.sink)
            .map(|e| e.label.clone())
            .collect_vec();
        let extraction = match remaining.into_iter().reduce(|l, r| self.policy.union(l, r)) {
            Some(regex) => Extraction::Expression(regex),
            None => Extraction::EmptyLanguage,
        };
        match &extraction {
            Extraction::Expression(regex) => {
                debug!("extracted {regex} with {} nodes", regex.size())
            }
            Extraction::EmptyLanguage => debug!("extracted the empty language"),
        }
        Ok(extraction)
    }

    fn eliminate(&mut self, state: StateIndex) -> Result<()> {
        let policy = self.policy;
        let outgoing = self.automaton.remove_edges_from(state);
        let (loops, outgoing): (Vec<_>, Vec<_>) =
            outgoing.into_iter().partition(|t| t.is_self_loop());
        let incoming = self.automaton.remove_edges_to(state);
        let repeated = loops
            .into_iter()
            .map(|t| t.label)
            .reduce(|l, r| policy.union(l, r))
            .map(|label| policy.star(label));

        for entering in &incoming {
            for leaving in &outgoing {
                let tail = match &repeated {
                    Some(star) => policy.concat(star.clone(), leaving.label.clone()),
                    None => leaving.label.clone(),
                };
                let label = policy.concat(entering.label.clone(), tail);
                self.join(entering.source, label, leaving.target)?;
            }
        }
        self.automaton.remove_state(state)?;
        debug!(
            "eliminated q{state}, {} interior states remain",
            self.interior_count()
        );
        Ok(())
    }

    /// Adds a transition from `from` to `to`, taking the union with the label of an existing
    /// one.
    fn join(&mut self, from: StateIndex, label: Regex, to: StateIndex) -> Result<()> {
        let existing = self
            .automaton
            .transitions_between(from, to)
            .map(|e| e.label.clone())
            .collect_vec();
        let mut combined = label;
        for old in existing {
            self.automaton.remove_transition(from, &old, to);
            combined = self.policy.union(old, combined);
        }
        trace!("q{from} -> q{to} is now labeled {combined}");
        self.automaton.add_transition(from, combined, to)
    }

    fn combine_parallel_transitions(&mut self) -> Result<()> {
        let policy = self.policy;
        let grouped = group_ordered(
            self.automaton
                .edges()
                .map(|e| ((e.source, e.target), e.label.clone())),
        );
        for ((from, to), labels) in grouped {
            if labels.len() < 2 {
                continue;
            }
            for label in &labels {
                self.automaton.remove_transition(from, label, to);
            }
            if let Some(combined) = labels.into_iter().reduce(|l, r| policy.union(l, r)) {
                trace!("combined parallel transitions from q{from} to q{to} into {combined}");
                self.automaton.add_transition(from, combined, to)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alphabet::Letter,
        learning::{FiniteSample, ZeroReversibleLearner},
        uniform::uniformize,
    };

    fn eliminator(words: &[&str], policy: Simplification) -> Eliminator {
        let sample = FiniteSample::new(words.iter().copied()).unwrap();
        let aut = ZeroReversibleLearner::new(&sample).learn().unwrap();
        Eliminator::new(uniformize(aut).unwrap(), policy).unwrap()
    }

    fn extract(words: &[&str]) -> Extraction {
        eliminator(words, Simplification::default()).run().unwrap()
    }

    #[test_log::test]
    fn a_star_b() {
        assert_eq!(extract(&["b", "ab", "aab", "aaaab"]).to_string(), "a*b");
    }

    #[test]
    fn parallel_transitions_are_combined() {
        assert_eq!(extract(&["a", "b"]).to_string(), "a|b");
        let elim = eliminator(&["a", "b"], Simplification::default());
        assert_eq!(elim.interior_count(), 0);
        assert_eq!(elim.automaton().transition_count(), 1);
    }

    #[test]
    fn disjoint_paths_are_joined_by_union() {
        assert_eq!(extract(&["ab", "cd"]).to_string(), "ab|cd");
    }

    #[test]
    fn empty_word() {
        let extraction = extract(&[""]);
        assert_eq!(extraction, Extraction::Expression(Regex::Epsilon));
        assert_eq!(extraction.to_string(), "ε");
        assert!(extraction.matches(""));
        assert!(!extraction.matches("a"));
    }

    #[test]
    fn each_step_removes_one_interior_state() {
        let mut elim = eliminator(&["abc", "bca", "cab", "ba", "c"], Simplification::default());
        let initial = elim.interior_count();
        assert!(initial > 0);
        let mut eliminated = vec![];
        while let Some(q) = elim.step().unwrap() {
            eliminated.push(q);
            assert_eq!(elim.interior_count(), initial - eliminated.len());
        }
        assert_eq!(eliminated.len(), initial);
        assert!(eliminated.iter().all_unique());
        assert_eq!(elim.automaton().size(), 2);
        assert!(elim.automaton().transition_count() <= 1);
        let extraction = elim.run().unwrap();
        for word in ["abc", "bca", "cab", "ba", "c"] {
            assert!(extraction.matches(word), "{extraction} should match {word}");
        }
    }

    #[test]
    fn states_creating_fewer_paths_go_first() {
        // q1 sits between the source and both branches, q2 and q3 lie on a single path each
        let aut = Automaton::<Letter>::from_transitions(
            [
                (0, 'a', 1),
                (0, 'b', 1),
                (1, 'c', 2),
                (1, 'd', 3),
                (2, 'e', 4),
                (3, 'f', 4),
            ],
            [4],
        )
        .unwrap();
        let mut elim =
            Eliminator::new(uniformize(aut).unwrap(), Simplification::default()).unwrap();
        // the parallel transitions into q1 are combined, so q1 has weight 1 * 2
        assert_eq!(elim.weight(1), 2);
        assert_eq!(elim.weight(2), 1);
        assert_eq!(elim.next_state(), Some(2));
        let order = std::iter::from_fn(|| elim.step().unwrap()).collect_vec();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(elim.run().unwrap().to_string(), "(a|b)(ce|df)");
    }

    #[test]
    fn self_loops_do_not_add_weight() {
        let mut aut =
            Automaton::<Letter>::from_transitions([(0, 'a', 1), (1, 'b', 2)], [2]).unwrap();
        aut.add_transition(1, Letter::Symbol('c'), 1).unwrap();
        let elim = Eliminator::new(uniformize(aut).unwrap(), Simplification::default()).unwrap();
        assert_eq!(elim.weight(1), 1);
        assert_eq!(elim.run().unwrap().to_string(), "ac*b");
    }

    #[test]
    fn unconnected_sink_gives_empty_language() {
        let aut = Automaton::<Letter>::from_transitions([(0, 'a', 1)], []).unwrap();
        let elim = Eliminator::new(uniformize(aut).unwrap(), Simplification::default()).unwrap();
        let extraction = elim.run().unwrap();
        assert!(extraction.is_empty_language());
        assert_eq!(extraction.to_string(), "∅");
        assert!(!extraction.matches(""));
    }

    #[test]
    fn without_simplification_the_structure_is_kept() {
        let extraction = eliminator(&["b", "ab"], Simplification::Off).run().unwrap();
        // the fresh source contributes a leading ε
        assert_eq!(extraction.to_string(), "εa*b");
        assert!(extraction.matches("aaab"));
    }
}
