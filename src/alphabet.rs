use std::fmt::Debug;
use std::hash::Hash;

use itertools::Itertools;

use crate::{regex::Regex, Show};

/// Input symbols are single characters.
pub type Symbol = char;

/// Represents an alphabet where every symbol is just a single `char`. The symbols are kept
/// sorted and free of duplicates.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord, Default)]
pub struct CharAlphabet(Vec<Symbol>);

impl CharAlphabet {
    /// Returns an iterator over the symbols in ascending order.
    pub fn universe(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of distinct symbols.
    pub fn size(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Symbol> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl Show for CharAlphabet {
    fn show(&self) -> String {
        format!("{{{}}}", self.0.iter().join(", "))
    }
}

/// The label of a transition in an automaton. Besides being comparable and hashable, a label
/// must have a distinguished value for the empty string, which is used when new source or
/// sink states are connected to an existing automaton.
pub trait Label: Clone + Eq + Hash + Debug + Show {
    /// The label denoting the empty string.
    fn epsilon() -> Self;

    /// Returns true if `self` denotes the empty string.
    fn is_epsilon(&self) -> bool;
}

/// A transition label while learning: either a single input symbol or the empty string.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Letter {
    /// Reads exactly one input symbol.
    Symbol(Symbol),
    /// Reads nothing.
    Epsilon,
}

impl Label for Letter {
    fn epsilon() -> Self {
        Letter::Epsilon
    }

    fn is_epsilon(&self) -> bool {
        matches!(self, Letter::Epsilon)
    }
}

impl From<Symbol> for Letter {
    fn from(value: Symbol) -> Self {
        Letter::Symbol(value)
    }
}

impl From<Letter> for Regex {
    fn from(value: Letter) -> Self {
        match value {
            Letter::Symbol(sym) => Regex::Symbol(sym),
            Letter::Epsilon => Regex::Epsilon,
        }
    }
}

impl Show for Letter {
    fn show(&self) -> String {
        match self {
            Letter::Symbol(sym) => sym.to_string(),
            Letter::Epsilon => "ε".to_string(),
        }
    }
}

impl Debug for Letter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.show())
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}
