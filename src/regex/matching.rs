use crate::{alphabet::Symbol, simplify::Simplification};

use super::Regex;

impl Regex {
    /// Computes the Brzozowski derivative of `self` with respect to `symbol`, i.e. an expression
    /// for all words `w` such that `symbol·w` is matched by `self`.
    pub fn derivative(&self, symbol: Symbol) -> Regex {
        let policy = Simplification::Nested;
        match self {
            Regex::Empty | Regex::Epsilon => Regex::Empty,
            Regex::Symbol(sym) if *sym == symbol => Regex::Epsilon,
            Regex::Symbol(_) => Regex::Empty,
            Regex::Union(l, r) => policy.union(l.derivative(symbol), r.derivative(symbol)),
            Regex::Concat(l, r) => {
                let head = policy.concat(l.derivative(symbol), r.as_ref().clone());
                if l.is_nullable() {
                    policy.union(head, r.derivative(symbol))
                } else {
                    head
                }
            }
            Regex::Star(inner) => policy.concat(inner.derivative(symbol), self.clone()),
        }
    }

    /// Decides whether the whole of `word` is matched by the expression.
    pub fn matches<W: AsRef<str>>(&self, word: W) -> bool {
        let mut current = self.clone();
        for symbol in word.as_ref().chars() {
            current = current.derivative(symbol);
            if current == Regex::Empty {
                return false;
            }
        }
        current.is_nullable()
    }
}

#[cfg(test)]
mod tests {
    use super::Regex;

    #[test]
    fn matches_whole_words_only() {
        let re: Regex = "a*b".parse().unwrap();
        for word in ["b", "ab", "aab", "aaaab"] {
            assert!(re.matches(word), "{word} should match");
        }
        for word in ["", "a", "ba", "abb", "c"] {
            assert!(!re.matches(word), "{word} should not match");
        }
    }

    #[test]
    fn special_expressions() {
        assert!(Regex::Epsilon.matches(""));
        assert!(!Regex::Epsilon.matches("a"));
        assert!(!Regex::Empty.matches(""));
        let re: Regex = "(ab|c)+d?".parse().unwrap();
        assert!(re.matches("abcab"));
        assert!(re.matches("cd"));
        assert!(!re.matches("d"));
        assert!(!re.matches("abd d"));
    }
}
