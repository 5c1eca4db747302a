use tracing::trace;

use crate::{
    alphabet::Letter,
    automaton::{Automaton, StateIndex},
    Result,
};

use super::FiniteSample;

/// Builds the prefix tree (trie) of the sample: an automaton shaped like a tree rooted in the
/// initial state that accepts precisely the words of the sample. Words sharing a prefix share
/// the path reading it, so the tree is deterministic. States are created in the order in which
/// the sorted words first reach them.
pub fn prefix_tree(sample: &FiniteSample) -> Result<Automaton<Letter>> {
    let mut tree = Automaton::new(sample.contains_empty_word());
    for word in sample.words() {
        let mut current = tree.initial();
        for sym in word.chars() {
            current = match successor(&tree, current, sym) {
                Some(next) => next,
                None => {
                    let next = tree.add_state(false);
                    tree.add_transition(current, Letter::Symbol(sym), next)?;
                    next
                }
            };
        }
        trace!("word {word:?} ends in q{current}");
        tree.set_accepting(current, true)?;
    }
    Ok(tree)
}

fn successor(tree: &Automaton<Letter>, state: StateIndex, sym: char) -> Option<StateIndex> {
    tree.outgoing(state)
        .find(|e| *e.label == Letter::Symbol(sym))
        .map(|e| e.target)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::Show;

    #[test]
    fn shared_prefixes_share_states() {
        let sample = FiniteSample::new(["ab", "aab", "b", "aaaab"]).unwrap();
        let tree = prefix_tree(&sample).unwrap();
        // root, a, aa, aaa, aaaa, aaaab, aab, ab, b
        assert_eq!(tree.size(), 9);
        assert_eq!(tree.transition_count(), 8);
        assert!(tree.is_deterministic());
        assert_eq!(tree.accepting_states().len(), 4);
        assert!(!tree.is_accepting(tree.initial()));
        for word in sample.words() {
            assert!(tree.accepts(word));
        }
        for word in ["", "a", "aa", "aaab", "ba"] {
            assert!(!tree.accepts(word));
        }
    }

    #[test]
    fn every_state_has_at_most_one_predecessor() {
        let sample = FiniteSample::new(["abc", "abd", "ac", "c"]).unwrap();
        let tree = prefix_tree(&sample).unwrap();
        for q in tree.state_indices() {
            assert!(tree.incoming(q).count() <= 1);
        }
        let edges = tree
            .outgoing(tree.initial())
            .map(|e| e.to_transition().show())
            .collect_vec();
        assert_eq!(edges, vec!["(q0, a, q1)", "(q0, c, q6)"]);
    }

    #[test]
    fn empty_word_makes_the_root_accepting() {
        let tree = prefix_tree(&FiniteSample::new([""]).unwrap()).unwrap();
        assert_eq!(tree.size(), 1);
        assert!(tree.is_accepting(0));
        assert_eq!(tree.transition_count(), 0);
    }
}
