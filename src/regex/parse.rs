use std::{iter::Peekable, str::CharIndices, str::FromStr};

use thiserror::Error;

use super::Regex;

/// Errors that can occur while reading the textual form of a [`Regex`]. Positions are byte
/// offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An operand is missing, e.g. the input is empty or an operator has nothing to apply to.
    #[error("expected an expression at position {0}")]
    MissingOperand(usize),
    /// A group is never closed.
    #[error("parenthesis opened at position {0} is never closed")]
    UnclosedParenthesis(usize),
    /// A character occurred where it is not allowed.
    #[error("unexpected `{found}` at position {position}")]
    Unexpected {
        /// The offending character.
        found: char,
        /// Where it was found.
        position: usize,
    },
    /// The input ends with a backslash.
    #[error("escape at position {0} is not followed by a symbol")]
    DanglingEscape(usize),
}

/// Recursive descent parser for the syntax produced by the `Display` implementation of
/// [`Regex`]:
///
/// ```text
/// union   ::= concat ('|' concat)*
/// concat  ::= postfix postfix*
/// postfix ::= atom ('*' | '?' | '+')*
/// atom    ::= symbol | '\' any | 'ε' | '∅' | '(' union ')'
/// ```
///
/// Unions associate to the left and concatenations to the right, `x?` is read as `x|ε` and
/// `x+` as `x·x*`.
struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.len)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<Regex, ParseError> {
        let regex = self.parse_union()?;
        match self.chars.next() {
            None => Ok(regex),
            Some((position, found)) => Err(ParseError::Unexpected { found, position }),
        }
    }

    fn parse_union(&mut self) -> Result<Regex, ParseError> {
        let mut regex = self.parse_concat()?;
        while self.eat('|') {
            let right = self.parse_concat()?;
            regex = Regex::union(regex, right);
        }
        Ok(regex)
    }

    fn parse_concat(&mut self) -> Result<Regex, ParseError> {
        let start = self.position();
        let mut items = vec![];
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        items
            .into_iter()
            .rev()
            .reduce(|acc, item| Regex::concat(item, acc))
            .ok_or(ParseError::MissingOperand(start))
    }

    fn parse_postfix(&mut self) -> Result<Regex, ParseError> {
        let mut regex = self.parse_atom()?;
        loop {
            if self.eat('*') {
                regex = Regex::star(regex);
            } else if self.eat('?') {
                regex = Regex::union(regex, Regex::Epsilon);
            } else if self.eat('+') {
                regex = Regex::concat(regex.clone(), Regex::star(regex));
            } else {
                return Ok(regex);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Regex, ParseError> {
        let Some((position, c)) = self.chars.next() else {
            return Err(ParseError::MissingOperand(self.len));
        };
        match c {
            '(' => {
                let inner = self.parse_union()?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err(ParseError::UnclosedParenthesis(position))
                }
            }
            '\\' => match self.chars.next() {
                Some((_, escaped)) => Ok(Regex::Symbol(escaped)),
                None => Err(ParseError::DanglingEscape(position)),
            },
            'ε' => Ok(Regex::Epsilon),
            '∅' => Ok(Regex::Empty),
            '*' | '?' | '+' => Err(ParseError::MissingOperand(position)),
            ')' | '|' => Err(ParseError::Unexpected { found: c, position }),
            sym => Ok(Regex::Symbol(sym)),
        }
    }
}

impl FromStr for Regex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Regex {
        Regex::Symbol(c)
    }

    #[test]
    fn parses_precedence_and_associativity() {
        let re: Regex = "ab|c*".parse().unwrap();
        assert_eq!(
            re,
            Regex::union(
                Regex::concat(sym('a'), sym('b')),
                Regex::star(sym('c'))
            )
        );
        let re: Regex = "a|b|c".parse().unwrap();
        assert_eq!(
            re,
            Regex::union(Regex::union(sym('a'), sym('b')), sym('c'))
        );
        let re: Regex = "abc".parse().unwrap();
        assert_eq!(re, Regex::concat(sym('a'), Regex::concat(sym('b'), sym('c'))));
    }

    #[test]
    fn closures_and_escapes() {
        let re: Regex = "a?b+".parse().unwrap();
        assert_eq!(
            re,
            Regex::concat(
                Regex::union(sym('a'), Regex::Epsilon),
                Regex::concat(sym('b'), Regex::star(sym('b')))
            )
        );
        let re: Regex = "\\*\\ε∅ε".parse().unwrap();
        assert_eq!(
            re,
            Regex::concat(
                sym('*'),
                Regex::concat(sym('ε'), Regex::concat(Regex::Empty, Regex::Epsilon))
            )
        );
    }

    #[test]
    fn rendered_expressions_parse_back() {
        for text in ["(ab)*c", "a|(b|c)", "(a|b)c", "a?*", "(ab)+", "(ab)c", "\\(x\\)", "a*b"] {
            let re: Regex = text.parse().unwrap();
            assert_eq!(re.to_string(), text);
        }
    }

    #[test]
    fn reports_malformed_input() {
        assert_eq!("".parse::<Regex>(), Err(ParseError::MissingOperand(0)));
        assert_eq!("a|".parse::<Regex>(), Err(ParseError::MissingOperand(2)));
        assert_eq!("(ab".parse::<Regex>(), Err(ParseError::UnclosedParenthesis(0)));
        assert_eq!(
            "ab)".parse::<Regex>(),
            Err(ParseError::Unexpected {
                found: ')',
                position: 2
            })
        );
        assert_eq!("*a".parse::<Regex>(), Err(ParseError::MissingOperand(0)));
        assert_eq!("a\\".parse::<Regex>(), Err(ParseError::DanglingEscape(1)));
    }
}
