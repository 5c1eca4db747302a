use std::fmt::{Display, Formatter};

use crate::{
    alphabet::{Label, Symbol},
    Show,
};

mod matching;
mod parse;
pub use parse::ParseError;

/// Characters that carry a meaning in the textual syntax and need to be escaped with a
/// backslash when they occur as symbols.
pub const METACHARACTERS: [char; 9] = ['(', ')', '|', '*', '?', '+', '\\', 'ε', '∅'];

/// A regular expression. Equality is structural, two expressions denoting the same language
/// are only equal if they were built the same way.
///
/// The variants can be combined directly, which never rewrites anything. To keep expressions
/// small, build them through a [`crate::simplify::Simplification`] policy instead.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Regex {
    /// The empty language ∅, matched by no word at all.
    Empty,
    /// The language containing only the empty word ε.
    Epsilon,
    /// A single symbol.
    Symbol(Symbol),
    /// Concatenation of two expressions.
    Concat(Box<Regex>, Box<Regex>),
    /// Union (alternation) of two expressions.
    Union(Box<Regex>, Box<Regex>),
    /// Kleene star of an expression.
    Star(Box<Regex>),
}

/// Binding strength of the rendered forms, higher binds tighter.
const UNION: u8 = 0;
const CONCAT: u8 = 1;
const POSTFIX: u8 = 2;
const ATOM: u8 = 3;

impl Regex {
    /// Builds the concatenation `left · right` without simplifying.
    pub fn concat(left: Regex, right: Regex) -> Regex {
        Regex::Concat(Box::new(left), Box::new(right))
    }

    /// Builds the union `left | right` without simplifying.
    pub fn union(left: Regex, right: Regex) -> Regex {
        Regex::Union(Box::new(left), Box::new(right))
    }

    /// Builds the Kleene star `inner*` without simplifying.
    pub fn star(inner: Regex) -> Regex {
        Regex::Star(Box::new(inner))
    }

    /// Counts the nodes of the expression tree.
    pub fn size(&self) -> usize {
        match self {
            Regex::Empty | Regex::Epsilon | Regex::Symbol(_) => 1,
            Regex::Concat(l, r) | Regex::Union(l, r) => 1 + l.size() + r.size(),
            Regex::Star(inner) => 1 + inner.size(),
        }
    }

    /// Returns true if the empty word is in the language of the expression.
    pub fn is_nullable(&self) -> bool {
        match self {
            Regex::Empty | Regex::Symbol(_) => false,
            Regex::Epsilon | Regex::Star(_) => true,
            Regex::Concat(l, r) => l.is_nullable() && r.is_nullable(),
            Regex::Union(l, r) => l.is_nullable() || r.is_nullable(),
        }
    }

    /// If `self` is the union of ε with some other expression, that other expression is
    /// returned. Such unions are rendered with the `?` closure.
    pub(crate) fn optional_operand(&self) -> Option<&Regex> {
        match self {
            Regex::Union(l, r) if **r == Regex::Epsilon && **l != Regex::Epsilon => Some(l),
            Regex::Union(l, r) if **l == Regex::Epsilon && **r != Regex::Epsilon => Some(r),
            _ => None,
        }
    }

    /// If `self` is `x·x*`, this returns `x`. Such expressions are rendered with the `+` closure.
    fn plus_operand(&self) -> Option<&Regex> {
        match self {
            Regex::Concat(l, r) => match r.as_ref() {
                Regex::Star(inner) if inner == l => Some(l),
                _ => None,
            },
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        if self.optional_operand().is_some() || self.plus_operand().is_some() {
            return POSTFIX;
        }
        match self {
            Regex::Empty | Regex::Epsilon | Regex::Symbol(_) => ATOM,
            Regex::Star(_) => POSTFIX,
            Regex::Concat(_, _) => CONCAT,
            Regex::Union(_, _) => UNION,
        }
    }

    fn fmt_at_least(&self, f: &mut Formatter<'_>, min: u8) -> std::fmt::Result {
        if self.precedence() < min {
            write!(f, "(")?;
            self.fmt_expression(f)?;
            write!(f, ")")
        } else {
            self.fmt_expression(f)
        }
    }

    fn fmt_expression(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(operand) = self.optional_operand() {
            operand.fmt_at_least(f, POSTFIX)?;
            return write!(f, "?");
        }
        if let Some(operand) = self.plus_operand() {
            operand.fmt_at_least(f, POSTFIX)?;
            return write!(f, "+");
        }
        match self {
            Regex::Empty => write!(f, "∅"),
            Regex::Epsilon => write!(f, "ε"),
            Regex::Symbol(sym) if METACHARACTERS.contains(sym) => write!(f, "\\{sym}"),
            Regex::Symbol(sym) => write!(f, "{sym}"),
            // concatenation is parsed right-associative, a nested concatenation on the
            // left needs parentheses to come back the same way
            Regex::Concat(l, r) => {
                l.fmt_at_least(f, POSTFIX)?;
                r.fmt_at_least(f, CONCAT)
            }
            Regex::Union(l, r) => {
                l.fmt_at_least(f, UNION)?;
                write!(f, "|")?;
                r.fmt_at_least(f, CONCAT)
            }
            Regex::Star(inner) => {
                inner.fmt_at_least(f, POSTFIX)?;
                write!(f, "*")
            }
        }
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_expression(f)
    }
}

impl Show for Regex {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Label for Regex {
    fn epsilon() -> Self {
        Regex::Epsilon
    }

    fn is_epsilon(&self) -> bool {
        matches!(self, Regex::Epsilon)
    }
}

impl From<Symbol> for Regex {
    fn from(value: Symbol) -> Self {
        Regex::Symbol(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Regex;

    fn sym(c: char) -> Regex {
        Regex::Symbol(c)
    }

    #[test]
    fn precedence_is_respected_when_rendering() {
        let ab = Regex::concat(sym('a'), sym('b'));
        assert_eq!(Regex::star(ab.clone()).to_string(), "(ab)*");
        assert_eq!(Regex::union(ab.clone(), sym('c')).to_string(), "ab|c");
        assert_eq!(
            Regex::concat(Regex::union(sym('a'), sym('b')), sym('c')).to_string(),
            "(a|b)c"
        );
        assert_eq!(
            Regex::concat(sym('a'), Regex::star(sym('b'))).to_string(),
            "ab*"
        );
        assert_eq!(
            Regex::union(sym('a'), Regex::union(sym('b'), sym('c'))).to_string(),
            "a|(b|c)"
        );
        assert_eq!(Regex::concat(ab.clone(), sym('c')).to_string(), "(ab)c");
    }

    #[test]
    fn closures_are_rendered_as_postfix_operators() {
        let ab = Regex::concat(sym('a'), sym('b'));
        assert_eq!(Regex::union(ab.clone(), Regex::Epsilon).to_string(), "(ab)?");
        assert_eq!(Regex::union(Regex::Epsilon, sym('a')).to_string(), "a?");
        assert_eq!(
            Regex::concat(sym('a'), Regex::star(sym('a'))).to_string(),
            "a+"
        );
        assert_eq!(
            Regex::concat(sym('c'), Regex::concat(sym('a'), Regex::star(sym('a')))).to_string(),
            "ca+"
        );
        assert_eq!(Regex::union(Regex::Epsilon, Regex::Epsilon).to_string(), "ε|ε");
    }

    #[test]
    fn special_expressions_and_escapes() {
        assert_eq!(Regex::Empty.to_string(), "∅");
        assert_eq!(Regex::Epsilon.to_string(), "ε");
        assert_eq!(
            Regex::concat(sym('a'), Regex::concat(sym('*'), sym('b'))).to_string(),
            "a\\*b"
        );
    }

    #[test]
    fn size_and_nullability() {
        let re = Regex::concat(Regex::star(sym('a')), sym('b'));
        assert_eq!(re.size(), 4);
        assert!(!re.is_nullable());
        assert!(Regex::union(sym('a'), Regex::Epsilon).is_nullable());
        assert!(!Regex::Empty.is_nullable());
    }
}
