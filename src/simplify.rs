//! Purely syntactic rewriting of regular expressions.
//!
//! Each [`Simplification`] level includes all rules of the levels below it:
//! - [`Simplification::Off`] builds expressions exactly as requested.
//! - [`Simplification::Identities`] removes ε and ∅ where they are neutral or absorbing:
//!   `∅|x = x|∅ = x`, `ε·x = x·ε = x`, `∅·x = x·∅ = ∅` and `ε* = ∅* = ε`.
//! - [`Simplification::Nested`] additionally collapses `x|x` to `x`, keeps concatenations
//!   nested to the right and factors a common first or last factor out of a union, so
//!   `ab|ac = a(b|c)` and `ab|cb = (a|c)b`. Factoring only ever looks at syntactically equal
//!   factors, it is incomplete by nature.
//! - [`Simplification::Closures`] is an extension on top, which folds unions and products
//!   into stars: `ε|x* = x|x* = x*`, `x*·x* = x*`, `(x*)* = x*` and `(ε|x)* = x*`.
//!
//! Every rule preserves the language of the expression, and all constructors return
//! expressions that are left unchanged by [`Simplification::simplify`].

use std::{fmt::Display, str::FromStr};

use thiserror::Error;

use crate::regex::Regex;

/// How aggressively expressions are rewritten while they are built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Simplification {
    /// No rewriting at all.
    Off,
    /// Only the neutral and absorbing elements ε and ∅ are removed.
    Identities,
    /// Identities, idempotent unions and factoring of common prefixes and suffixes.
    #[default]
    Nested,
    /// Everything of [`Simplification::Nested`] plus folding into stars.
    Closures,
}

/// Returned when a [`Simplification`] is parsed from an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown simplification `{0}`, expected one of off, identities, nested, closures")]
pub struct UnknownSimplification(pub String);

impl Simplification {
    /// All levels, from the weakest to the strongest.
    pub const ALL: [Simplification; 4] = [
        Simplification::Off,
        Simplification::Identities,
        Simplification::Nested,
        Simplification::Closures,
    ];

    /// Builds the union of `left` and `right`.
    pub fn union(self, left: Regex, right: Regex) -> Regex {
        if self >= Simplification::Identities {
            if left == Regex::Empty {
                return right;
            }
            if right == Regex::Empty {
                return left;
            }
        }
        if self >= Simplification::Nested && left == right {
            return left;
        }
        if self >= Simplification::Closures {
            if let Some(star) = absorbed_by_star(&left, &right) {
                return star.clone();
            }
            if let Some(star) = absorbed_by_star(&right, &left) {
                return star.clone();
            }
        }
        if self >= Simplification::Nested {
            if let Some(factored) = self.factor(&left, &right) {
                return factored;
            }
        }
        Regex::union(left, right)
    }

    /// Builds the concatenation of `left` and `right`.
    pub fn concat(self, left: Regex, right: Regex) -> Regex {
        if self >= Simplification::Identities {
            if left == Regex::Empty || right == Regex::Empty {
                return Regex::Empty;
            }
            if left == Regex::Epsilon {
                return right;
            }
            if right == Regex::Epsilon {
                return left;
            }
        }
        if self >= Simplification::Nested {
            if let Regex::Concat(first, second) = left {
                let rest = self.concat(*second, right);
                return self.concat(*first, rest);
            }
        }
        if self >= Simplification::Closures && matches!(left, Regex::Star(_)) {
            if left == right {
                return left;
            }
            if let Regex::Concat(head, tail) = &right {
                if **head == left {
                    return self.concat(left, tail.as_ref().clone());
                }
            }
        }
        Regex::concat(left, right)
    }

    /// Builds the Kleene star of `inner`.
    pub fn star(self, inner: Regex) -> Regex {
        if self >= Simplification::Identities
            && (inner == Regex::Epsilon || inner == Regex::Empty)
        {
            return Regex::Epsilon;
        }
        if self >= Simplification::Closures {
            if let Regex::Star(_) = inner {
                return inner;
            }
            if let Some(operand) = inner.optional_operand() {
                return self.star(operand.clone());
            }
        }
        Regex::star(inner)
    }

    /// Rebuilds `regex` bottom-up through the constructors of this level.
    pub fn simplify(self, regex: &Regex) -> Regex {
        match regex {
            Regex::Empty | Regex::Epsilon | Regex::Symbol(_) => regex.clone(),
            Regex::Concat(l, r) => self.concat(self.simplify(l), self.simplify(r)),
            Regex::Union(l, r) => self.union(self.simplify(l), self.simplify(r)),
            Regex::Star(inner) => self.star(self.simplify(inner)),
        }
    }

    /// Pulls a common first factor (or failing that, a common last factor) out of the union
    /// of `left` and `right`. A side that consists of nothing but the common factor leaves ε.
    fn factor(self, left: &Regex, right: &Regex) -> Option<Regex> {
        let (left_head, left_tail) = split_first(left);
        let (right_head, right_tail) = split_first(right);
        if left_head == right_head {
            let rest = self.union(
                left_tail.cloned().unwrap_or(Regex::Epsilon),
                right_tail.cloned().unwrap_or(Regex::Epsilon),
            );
            return Some(self.concat(left_head.clone(), rest));
        }

        let (left_init, left_last) = self.split_last(left);
        let (right_init, right_last) = self.split_last(right);
        if left_last == right_last {
            let rest = self.union(
                left_init.unwrap_or(Regex::Epsilon),
                right_init.unwrap_or(Regex::Epsilon),
            );
            return Some(self.concat(rest, left_last.clone()));
        }
        None
    }

    /// Splits off the last factor of a concatenation chain, rebuilding what comes before it.
    fn split_last<'a>(self, regex: &'a Regex) -> (Option<Regex>, &'a Regex) {
        match regex {
            Regex::Concat(first, rest) => {
                let (init, last) = self.split_last(rest);
                let init = match init {
                    Some(init) => self.concat(first.as_ref().clone(), init),
                    None => first.as_ref().clone(),
                };
                (Some(init), last)
            }
            _ => (None, regex),
        }
    }
}

/// Splits off the first factor of a concatenation.
fn split_first(regex: &Regex) -> (&Regex, Option<&Regex>) {
    match regex {
        Regex::Concat(first, rest) => (first, Some(rest)),
        _ => (regex, None),
    }
}

/// If `star` is `x*` and `other` is ε or `x`, their union is just `star`.
fn absorbed_by_star<'a>(other: &Regex, star: &'a Regex) -> Option<&'a Regex> {
    match star {
        Regex::Star(inner) if *other == Regex::Epsilon || other == inner.as_ref() => Some(star),
        _ => None,
    }
}

impl Display for Simplification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Simplification::Off => "off",
            Simplification::Identities => "identities",
            Simplification::Nested => "nested",
            Simplification::Closures => "closures",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Simplification {
    type Err = UnknownSimplification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Simplification::ALL
            .into_iter()
            .find(|level| level.to_string() == s)
            .ok_or_else(|| UnknownSimplification(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::Simplification::{self, *};
    use crate::regex::Regex;

    fn re(text: &str) -> Regex {
        text.parse().unwrap()
    }

    fn sym(c: char) -> Regex {
        Regex::Symbol(c)
    }

    /// All words over `{a, b, c}` up to length 4.
    fn words() -> Vec<String> {
        (0..=4)
            .flat_map(|len| {
                std::iter::repeat("abc".chars())
                    .take(len)
                    .multi_cartesian_product()
                    .map(|w| w.into_iter().collect::<String>())
            })
            .chain(std::iter::once(String::new()))
            .unique()
            .collect()
    }

    fn samples() -> Vec<Regex> {
        [
            "ab|ac",
            "ab|cb",
            "a|ab",
            "(ab)c|(ab)d",
            "a(b|c)|a(b|c)",
            "ε|a*",
            "a*a*b",
            "(ε|a)*",
            "a**|a",
            "∅|a∅|ε*",
            "(a|ε)(b|ε)|ab",
            "abc|abd|ab",
            "a*b|a*c|b",
        ]
        .into_iter()
        .map(re)
        .collect()
    }

    #[test]
    fn identities() {
        let p = Identities;
        assert_eq!(p.union(Regex::Empty, sym('a')), sym('a'));
        assert_eq!(p.union(sym('a'), Regex::Empty), sym('a'));
        assert_eq!(p.concat(Regex::Epsilon, sym('a')), sym('a'));
        assert_eq!(p.concat(sym('a'), Regex::Epsilon), sym('a'));
        assert_eq!(p.concat(Regex::Empty, sym('a')), Regex::Empty);
        assert_eq!(p.concat(sym('a'), Regex::Empty), Regex::Empty);
        assert_eq!(p.star(Regex::Epsilon), Regex::Epsilon);
        assert_eq!(p.star(Regex::Empty), Regex::Epsilon);
        // idempotent unions are left for the next level
        assert_eq!(p.union(sym('a'), sym('a')).to_string(), "a|a");
    }

    #[test]
    fn off_never_rewrites() {
        for regex in samples() {
            assert_eq!(Off.simplify(&regex), regex);
        }
        assert_eq!(
            Off.concat(Regex::Epsilon, sym('a')),
            Regex::concat(Regex::Epsilon, sym('a'))
        );
    }

    #[test]
    fn nested_factors_common_prefixes_and_suffixes() {
        assert_eq!(Nested.simplify(&re("ab|ac")).to_string(), "a(b|c)");
        assert_eq!(Nested.simplify(&re("ab|cb")).to_string(), "(a|c)b");
        assert_eq!(Nested.simplify(&re("a|ab")).to_string(), "ab?");
        assert_eq!(Nested.simplify(&re("abc|abd|ab")).to_string(), "ab(c|d)?");
        assert_eq!(Nested.simplify(&re("(ab)c|(ab)d")).to_string(), "ab(c|d)");
        assert_eq!(Nested.simplify(&re("a(b|c)|a(b|c)")).to_string(), "a(b|c)");
        // different factors are left alone
        assert_eq!(Nested.simplify(&re("ab|ba")).to_string(), "ab|ba");
    }

    #[test]
    fn closures_fold_into_stars() {
        assert_eq!(Closures.simplify(&re("ε|a*")), re("a*"));
        assert_eq!(Closures.simplify(&re("a|a*")), re("a*"));
        assert_eq!(Closures.simplify(&re("a*a*b")), re("a*b"));
        assert_eq!(Closures.simplify(&re("(ε|a)*")), re("a*"));
        assert_eq!(Closures.simplify(&re("a**")), re("a*"));
        // the plain nested level keeps them
        assert_eq!(Nested.simplify(&re("a*a*b")).to_string(), "a*a*b");
    }

    #[test]
    fn simplification_is_idempotent() {
        for policy in Simplification::ALL {
            for regex in samples() {
                let once = policy.simplify(&regex);
                assert_eq!(policy.simplify(&once), once, "{policy} on {regex}");
            }
        }
    }

    #[test]
    fn simplification_preserves_the_language() {
        let words = words();
        for policy in Simplification::ALL {
            for regex in samples() {
                let simplified = policy.simplify(&regex);
                for word in &words {
                    assert_eq!(
                        regex.matches(word),
                        simplified.matches(word),
                        "{policy} changed {regex} into {simplified} on {word:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn policies_are_named() {
        for policy in Simplification::ALL {
            assert_eq!(policy.to_string().parse::<Simplification>(), Ok(policy));
        }
        assert!("aggressive".parse::<Simplification>().is_err());
        assert_eq!(Simplification::default(), Nested);
    }
}
