// src/core/types.rs
use serde::{Deserialize, Serialize};

/// One entry of the vocabulary dataset. Supplied externally, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub meaning: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl WordEntry {
    pub fn new(word: &str, meaning: &str, synonyms: &[&str]) -> Self {
        Self {
            word: word.to_string(),
            meaning: meaning.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Stand-in for a word that only ever appears as somebody's synonym.
    pub fn placeholder(word: &str) -> Self {
        Self {
            word: word.to_string(),
            meaning: "synonym".to_string(),
            synonyms: Vec::new(),
        }
    }
}

/// Identity of an undirected synonym relationship.
/// The pair is stored sorted, so `new(a, b) == new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipKey(String, String);

impl RelationshipKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0 == word || self.1 == word
    }
}

/// Per-word learning record. Absent records read as the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordProgress {
    #[serde(default)]
    pub marked: bool,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub correct: u32,
}

/// Composite read of a word: fresh brightness plus its progress record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StarState {
    pub brightness: f64,
    pub marked: bool,
    pub attempts: u32,
    pub correct: u32,
}

impl StarState {
    /// Share of attempts that counted as correct, 0 before any attempt.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_handles_no_attempts() {
        assert_eq!(StarState::default().accuracy(), 0.0);
        let state = StarState { attempts: 4, correct: 3, ..StarState::default() };
        assert!((state.accuracy() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn relationship_key_is_order_independent() {
        assert_eq!(RelationshipKey::new("glad", "happy"), RelationshipKey::new("happy", "glad"));
        let key = RelationshipKey::new("zeal", "ardor");
        assert_eq!(key.first(), "ardor");
        assert_eq!(key.second(), "zeal");
    }

    #[test]
    fn hyphenated_words_do_not_collide() {
        assert_ne!(RelationshipKey::new("a-b", "c"), RelationshipKey::new("a", "b-c"));
    }

    #[test]
    fn entry_synonyms_default_to_empty() {
        let entry: WordEntry = serde_json::from_str(r#"{"word":"lone","meaning":"alone"}"#).unwrap();
        assert!(entry.synonyms.is_empty());
    }
}
