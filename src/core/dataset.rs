// File: src/core/dataset.rs
use crate::core::types::WordEntry;
use crate::error::DatasetError;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// The read-only vocabulary list, in input order.
#[derive(Debug, Clone, Default)]
pub struct VocabularyDataset {
    entries: Vec<WordEntry>,
    /// word -> position in `entries`
    index: HashMap<String, usize>,
    /// word -> entries that list it as a synonym
    listed_by: HashMap<String, Vec<usize>>,
}

impl VocabularyDataset {
    /// Builds the dataset. A word seen twice keeps its first entry.
    pub fn new(raw: Vec<WordEntry>) -> Self {
        let mut entries = Vec::with_capacity(raw.len());
        let mut index = HashMap::with_capacity(raw.len());

        for entry in raw {
            if index.contains_key(&entry.word) {
                tracing::warn!(word = %entry.word, "dropping duplicate dataset entry");
                continue;
            }
            index.insert(entry.word.clone(), entries.len());
            entries.push(entry);
        }

        let mut listed_by: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, entry) in entries.iter().enumerate() {
            for synonym in &entry.synonyms {
                listed_by.entry(synonym.clone()).or_default().push(pos);
            }
        }

        let dataset = Self { entries, index, listed_by };
        let asymmetric = dataset.asymmetric_listings();
        if !asymmetric.is_empty() {
            tracing::warn!(
                count = asymmetric.len(),
                "dataset has one-directional synonym listings; treating them as undirected"
            );
            for (from, to) in &asymmetric {
                tracing::debug!(%from, %to, "asymmetric listing");
            }
        }
        dataset
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let raw: Vec<WordEntry> = serde_json::from_str(json)?;
        Ok(Self::new(raw))
    }

    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), words = dataset.len(), "loaded vocabulary");
        Ok(dataset)
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.index.get(word).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// True for entry words and for words that only appear as synonyms.
    pub fn knows(&self, word: &str) -> bool {
        self.contains(word) || self.listed_by.contains_key(word)
    }

    /// Every word touching `word` in the undirected graph: the words it lists
    /// plus the words whose entries list it.
    pub fn neighbours(&self, word: &str) -> BTreeSet<&str> {
        let mut out: BTreeSet<&str> = BTreeSet::new();
        if let Some(entry) = self.get(word) {
            out.extend(entry.synonyms.iter().map(String::as_str));
        }
        if let Some(listers) = self.listed_by.get(word) {
            out.extend(listers.iter().map(|&pos| self.entries[pos].word.as_str()));
        }
        out
    }

    /// Pairs `(a, b)` where `a` lists `b`, `b` has its own entry, and `b`
    /// does not list `a` back.
    pub fn asymmetric_listings(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let mut seen = HashSet::new();
            for synonym in &entry.synonyms {
                if !seen.insert(synonym.as_str()) {
                    continue;
                }
                if let Some(other) = self.get(synonym) {
                    if !other.synonyms.iter().any(|s| s == &entry.word) {
                        out.push((entry.word.clone(), synonym.clone()));
                    }
                }
            }
        }
        out
    }

    /// Case-insensitive substring search over word, meaning and synonyms.
    pub fn search(&self, term: &str) -> Vec<&WordEntry> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                entry.word.to_lowercase().contains(&needle)
                    || entry.meaning.to_lowercase().contains(&needle)
                    || entry.synonyms.iter().any(|s| s.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
