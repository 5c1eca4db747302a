use itertools::Itertools;

use crate::{alphabet::CharAlphabet, Error, Result, Show};

/// A finite collection of example words, all of which should be accepted by the inferred
/// expression. The words are kept sorted and free of duplicates, and the alphabet is made up of
/// every symbol that occurs in one of them.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FiniteSample {
    alphabet: CharAlphabet,
    words: Vec<String>,
}

impl FiniteSample {
    /// Creates a sample from the given words. The empty word may be among them, meaning the
    /// empty string should be accepted. Fails with [`Error::EmptySample`] if there are no
    /// words at all.
    pub fn new<W, I>(words: I) -> Result<Self>
    where
        W: Into<String>,
        I: IntoIterator<Item = W>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .sorted()
            .dedup()
            .collect_vec();
        if words.is_empty() {
            return Err(Error::EmptySample);
        }
        let alphabet = words.iter().flat_map(|w| w.chars()).collect();
        Ok(Self { alphabet, words })
    }

    /// Gives an iterator over the words in ascending order.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }

    /// The symbols occurring in the sample.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// The number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false, a sample can not be empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns true if the empty word is part of the sample.
    pub fn contains_empty_word(&self) -> bool {
        self.words.first().is_some_and(|w| w.is_empty())
    }

    /// Returns the maximum length of any word in the sample, measured in symbols.
    pub fn max_word_len(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl Show for FiniteSample {
    fn show(&self) -> String {
        format!(
            "{{{}}}",
            self.words.iter().map(|w| format!("\"{w}\"")).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_sorted_and_deduplicated() {
        let sample = FiniteSample::new(["ab", "b", "", "ab"]).unwrap();
        assert_eq!(sample.words().collect_vec(), vec!["", "ab", "b"]);
        assert_eq!(sample.len(), 3);
        assert!(sample.contains_empty_word());
        assert_eq!(sample.alphabet().universe().collect::<String>(), "ab");
        assert_eq!(sample.max_word_len(), 2);
        assert_eq!(sample.show(), "{\"\", \"ab\", \"b\"}");
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert_eq!(
            FiniteSample::new(Vec::<String>::new()),
            Err(Error::EmptySample)
        );
        // the empty word on its own is a perfectly fine sample
        assert!(FiniteSample::new([""]).is_ok());
    }
}
