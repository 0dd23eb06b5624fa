//! Word store: an insertion-ordered word → definition map persisted as JSON.
//!
//! Every mutation is write-through. The change is applied to a copy, the copy
//! is saved, and only then does it replace the in-memory map, so a failed
//! write leaves both memory and disk as they were.

use crate::error::{MementoError, Result};
use crate::persist::{corrupt, read_json, write_atomic, write_json};
use crate::tabular;
use crate::{debug_log, info_log};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// One word and its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub definition: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

impl From<(&str, &str)> for WordEntry {
    fn from((word, definition): (&str, &str)) -> Self {
        Self::new(word, definition)
    }
}

/// Whether `add` created a new entry or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Counts reported by an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Rows merged into the store.
    pub imported: usize,
    /// Merged keys that were not in the store beforehand.
    pub new: usize,
}

#[derive(Debug, Clone)]
pub struct WordStore {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl WordStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: IndexMap::new(),
        }
    }

    /// Load the word document at `path`, or start empty if there is none.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let Some(entries) = read_json::<IndexMap<String, String>>(&path)? else {
            info_log!("no word document at {}, starting empty", path.display());
            return Ok(Self::new(path));
        };

        if entries.keys().any(|word| word.trim().is_empty()) {
            return Err(corrupt(&path, "word document contains an empty word"));
        }

        info_log!("loaded {} words from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    /// Entries in insertion order. Call again to iterate from the start.
    pub fn list(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(word, definition)| (word.as_str(), definition.as_str()))
    }

    /// Insert or overwrite `word`. Both fields are trimmed; an empty word is rejected.
    pub fn add(&mut self, word: &str, definition: &str) -> Result<Upsert> {
        let word = word.trim();
        if word.is_empty() {
            return Err(MementoError::EmptyWord);
        }

        let mut next = self.entries.clone();
        let previous = next.insert(word.to_string(), definition.trim().to_string());
        self.commit(next)?;

        let outcome = if previous.is_some() {
            Upsert::Replaced
        } else {
            Upsert::Inserted
        };
        info_log!("add '{word}': {outcome:?}");
        Ok(outcome)
    }

    /// Remove `word`, returning its definition.
    pub fn delete(&mut self, word: &str) -> Result<String> {
        if !self.entries.contains_key(word) {
            return Err(MementoError::NotFound(word.to_string()));
        }

        let mut next = self.entries.clone();
        let removed = next.shift_remove(word).unwrap_or_default();
        self.commit(next)?;
        info_log!("deleted '{word}'");
        Ok(removed)
    }

    /// Merge `(word, definition)` rows, overwriting existing keys, and save once.
    ///
    /// Both fields are trimmed and rows with an empty field are skipped.
    pub fn import_from<I, W, D>(&mut self, rows: I) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = (W, D)>,
        W: AsRef<str>,
        D: AsRef<str>,
    {
        let mut next = self.entries.clone();
        let mut summary = ImportSummary::default();

        for (word, definition) in rows {
            let (word, definition) = (word.as_ref().trim(), definition.as_ref().trim());
            if word.is_empty() || definition.is_empty() {
                debug_log!("skipping import row ({word:?}, {definition:?})");
                continue;
            }
            if next.insert(word.to_string(), definition.to_string()).is_none() {
                summary.new += 1;
            }
            summary.imported += 1;
        }

        if summary.imported > 0 {
            self.commit(next)?;
        }
        info_log!(
            "imported {} rows ({} new) into {}",
            summary.imported,
            summary.new,
            self.path.display()
        );
        Ok(summary)
    }

    /// Parse a CSV source and merge it. A bad header fails before any change.
    pub fn import_csv<R: Read>(&mut self, source: R) -> Result<ImportSummary> {
        let rows = tabular::read_rows(source)?;
        self.import_from(rows)
    }

    pub fn import_from_path(&mut self, path: &Path) -> Result<ImportSummary> {
        let file = File::open(path)?;
        self.import_csv(BufReader::new(file))
    }

    /// Write all entries as CSV with a `Word,Definition` header.
    pub fn export_to<W: Write>(&self, sink: W) -> Result<()> {
        tabular::write_rows(sink, self.list())
    }

    /// Export to a file, replacing it atomically.
    pub fn export_to_path(&self, path: &Path) -> Result<()> {
        let mut buffer = Vec::new();
        self.export_to(&mut buffer)?;
        write_atomic(path, &buffer)?;
        info_log!("exported {} words to {}", self.len(), path.display());
        Ok(())
    }

    fn commit(&mut self, next: IndexMap<String, String>) -> Result<()> {
        write_json(&self.path, &next)?;
        self.entries = next;
        Ok(())
    }
}
