use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Local};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    pub word: String,
    /// Recognized text the word was typed for
    pub recognized_text: String,
    pub timestamp: DateTime<Local>,
}

/// Words already emitted, as a membership set plus an ordered undo ledger
///
/// The set always holds exactly the words present in the ledger. A word is
/// in the ledger at most once.
#[derive(Debug, Clone)]
pub struct TypedHistory {
    words: HashSet<String>,
    records: VecDeque<TypedRecord>,
    capacity: usize,
}

impl TypedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            words: HashSet::new(),
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records an emitted word. Returns `false` if it was already typed.
    pub fn add(&mut self, word: &str, recognized_text: &str) -> bool {
        self.push(TypedRecord {
            word: word.to_string(),
            recognized_text: recognized_text.to_string(),
            timestamp: Local::now(),
        })
    }

    /// Appends a prepared record; past capacity the oldest record is evicted
    /// along with its word
    pub fn push(&mut self, record: TypedRecord) -> bool {
        if self.words.contains(&record.word) {
            return false;
        }

        self.words.insert(record.word.clone());
        self.records.push_back(record);

        while self.records.len() > self.capacity {
            if let Some(oldest) = self.records.pop_front() {
                tracing::debug!(word = %oldest.word, "typed history full, forgetting oldest word");
                self.words.remove(&oldest.word);
            }
        }
        true
    }

    /// Pops the most recent record. Only bookkeeping is reverted; keystrokes
    /// already delivered stay delivered.
    pub fn undo(&mut self) -> Option<TypedRecord> {
        let record = self.records.pop_back()?;
        self.words.remove(&record.word);
        Some(record)
    }

    /// Removes `word` wherever it sits in the ledger
    pub fn forget(&mut self, word: &str) -> bool {
        if !self.words.remove(word) {
            return false;
        }
        if let Some(pos) = self.records.iter().rposition(|r| r.word == word) {
            self.records.remove(pos);
        }
        true
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.records.clear();
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn words(&self) -> &HashSet<String> {
        &self.words
    }

    pub fn records(&self) -> impl Iterator<Item = &TypedRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TypedRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for TypedHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(history: &TypedHistory) {
        let ledger: HashSet<String> = history.records().map(|r| r.word.clone()).collect();
        assert_eq!(&ledger, history.words());
        assert_eq!(ledger.len(), history.len());
    }

    #[test]
    fn test_undo_is_lifo() {
        let mut history = TypedHistory::new(10);
        history.add("cat", "ca");
        history.add("hat", "at");

        let undone = history.undo().unwrap();
        assert_eq!(undone.word, "hat");
        assert_eq!(undone.recognized_text, "at");
        assert!(!history.contains("hat"));
        assert!(history.contains("cat"));

        assert_eq!(history.undo().unwrap().word, "cat");
        assert!(history.undo().is_none());
        assert_consistent(&history);
    }

    #[test]
    fn test_duplicate_add_refused() {
        let mut history = TypedHistory::new(10);
        assert!(history.add("cat", "ca"));
        assert!(!history.add("cat", "at"));
        assert_eq!(history.len(), 1);
        assert_consistent(&history);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = TypedHistory::new(2);
        history.add("one", "o");
        history.add("two", "t");
        history.add("three", "t");

        assert!(!history.contains("one"));
        assert!(history.contains("two"));
        assert!(history.contains("three"));
        assert_consistent(&history);
    }

    #[test]
    fn test_forget_removes_record() {
        let mut history = TypedHistory::new(10);
        history.add("ant", "a");
        history.add("bee", "b");
        history.add("cow", "c");

        assert!(history.forget("bee"));
        assert!(!history.forget("bee"));
        assert_eq!(history.last().map(|r| r.word.as_str()), Some("cow"));
        assert_consistent(&history);
    }
}
