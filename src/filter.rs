//! Incremental prefix filter over the word store.

use crate::debug_log;
use crate::store::WordStore;

/// Result of appending a character to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStep {
    Narrowed { matches: usize },
    /// Nothing matched; the character was dropped.
    NoMatch,
}

/// Case-insensitive "starts with" filter that never settles on zero matches.
#[derive(Debug, Clone, Default)]
pub struct FilterSearch {
    current: String,
}

impl FilterSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn apply_char(&mut self, c: char, store: &WordStore) -> FilterStep {
        self.current.push(c);
        let matches = self.matches(store).count();
        if matches == 0 {
            self.current.pop();
            debug_log!("filter '{}{c}' has no matches, reverted", self.current);
            return FilterStep::NoMatch;
        }
        FilterStep::Narrowed { matches }
    }

    /// Drop the last character, if any.
    pub fn pop_char(&mut self) -> Option<char> {
        self.current.pop()
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }

    /// Store entries whose word starts with the filter, in store order.
    pub fn matches<'a>(
        &self,
        store: &'a WordStore,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        let prefix = self.current.to_lowercase();
        store
            .list()
            .filter(move |(word, _)| word.to_lowercase().starts_with(&prefix))
    }
}
