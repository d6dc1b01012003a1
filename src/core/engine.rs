// File: src/core/engine.rs
use crate::config::StarConfig;
use crate::core::constellation::{build_constellations, Constellation};
use crate::core::dataset::VocabularyDataset;
use crate::core::types::{StarState, WordEntry};
use crate::error::{DatasetError, MissionError, PersistenceError};
use crate::mission::{
    Advance, Mission, MissionEngine, MissionOutcome, MissionSession, SessionStats, Skipped, SlotStatus,
};
use crate::persistence::{self, load_from_disk, save_to_disk};
use crate::progress::ProgressStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Everything one learner works with: the vocabulary, their progress, the
/// running quiz, and the bits of view state that progress operations reset.
pub struct StarEngine {
    dataset: VocabularyDataset,
    progress: ProgressStore,
    missions: MissionEngine,
    rng: StdRng,
    marking_mode: bool,
    selected_star: Option<String>,
    progress_path: Option<PathBuf>,
    session_size: usize,
}

impl StarEngine {
    pub fn new(dataset: VocabularyDataset) -> Self {
        Self {
            dataset,
            progress: ProgressStore::new(),
            missions: MissionEngine::new(),
            rng: StdRng::from_entropy(),
            marking_mode: false,
            selected_star: None,
            progress_path: None,
            session_size: crate::mission::DEFAULT_SESSION_SIZE,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_session_size(mut self, size: usize) -> Self {
        self.session_size = size;
        self
    }

    /// Loads saved progress from `path`, starting fresh when there is none.
    pub fn open(dataset: VocabularyDataset, path: &Path) -> Self {
        let mut engine = Self::new(dataset);
        if path.exists() {
            match load_from_disk(path) {
                Ok(progress) => engine.progress = progress,
                Err(err) => tracing::warn!("Failed to load progress at {:?}: {}", path, err),
            }
        }
        engine.progress_path = Some(path.to_path_buf());
        engine
    }

    pub fn from_config(config: &StarConfig) -> Result<Self, DatasetError> {
        let dataset = VocabularyDataset::from_path(&config.dataset_path())?;
        let mut engine = Self::open(dataset, &config.progress_path()).with_session_size(config.session_size());
        if let Some(seed) = config.session_seed() {
            engine = engine.with_seed(seed);
        }
        Ok(engine)
    }

    pub fn dataset(&self) -> &VocabularyDataset {
        &self.dataset
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    // Map

    pub fn constellations(&self) -> Vec<Constellation> {
        build_constellations(&self.dataset)
    }

    pub fn constellation_of(&self, word: &str) -> Option<Constellation> {
        self.constellations().into_iter().find(|c| c.contains(word))
    }

    pub fn star_state(&self, word: &str) -> StarState {
        self.progress.state(&self.dataset, word)
    }

    pub fn connection_brightness(&self, a: &str, b: &str) -> f64 {
        self.progress.connection_brightness(a, b)
    }

    pub fn search(&self, term: &str) -> Vec<&WordEntry> {
        self.dataset.search(term)
    }

    pub fn toggle_marking_mode(&mut self) -> bool {
        self.marking_mode = !self.marking_mode;
        self.marking_mode
    }

    pub fn is_marking_mode(&self) -> bool {
        self.marking_mode
    }

    /// Marks the star in marking mode, selects it otherwise.
    pub fn click_star(&mut self, word: &str) {
        if self.marking_mode {
            self.progress.toggle_mark(word);
        } else {
            self.select_star(word);
        }
    }

    pub fn toggle_mark(&mut self, word: &str) {
        self.progress.toggle_mark(word);
    }

    pub fn select_star(&mut self, word: &str) {
        self.selected_star = Some(word.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected_star = None;
    }

    pub fn selected_star(&self) -> Option<&str> {
        self.selected_star.as_deref()
    }

    /// Marked words with their dataset entry when they have one.
    pub fn notebook(&self) -> Vec<(&str, Option<&WordEntry>)> {
        self.progress
            .marked_words()
            .into_iter()
            .map(|word| (word, self.dataset.get(word)))
            .collect()
    }

    // Missions

    pub fn mission(&self) -> Option<&Mission> {
        self.missions.mission()
    }

    pub fn session(&self) -> Option<&MissionSession> {
        self.missions.session()
    }

    pub fn finished_session(&self) -> Option<&SessionStats> {
        self.missions.finished_session()
    }

    pub fn start_mission(&mut self, word: &str) -> bool {
        self.missions.start_mission(&self.dataset, word)
    }

    /// Starts a session of `n` questions, or the configured size.
    pub fn start_session(&mut self, n: Option<usize>) -> usize {
        let n = n.unwrap_or(self.session_size);
        self.missions.start_session(&self.dataset, n, &mut self.rng)
    }

    pub fn submit_answer(&mut self, slot: usize, text: &str) -> Result<SlotStatus, MissionError> {
        self.missions.submit_answer(slot, text)
    }

    pub fn mark_dont_know(&mut self, slot: usize) -> Result<String, MissionError> {
        self.missions.mark_dont_know(&mut self.progress, slot)
    }

    pub fn complete_mission(&mut self) -> Result<MissionOutcome, MissionError> {
        self.missions.complete_mission(&mut self.progress)
    }

    pub fn skip_mission(&mut self) -> Result<Skipped, MissionError> {
        self.missions.skip_mission(&mut self.progress)
    }

    pub fn next_mission(&mut self) -> Result<Advance, MissionError> {
        self.missions.next_mission()
    }

    pub fn clear_mission(&mut self) {
        self.missions.clear_mission();
    }

    pub fn end_session_early(&mut self) -> Option<SessionStats> {
        self.missions.end_session_early()
    }

    // Persistence

    pub fn export_progress(&self) -> Result<String, PersistenceError> {
        persistence::export_json(&self.progress)
    }

    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, PersistenceError> {
        persistence::write_export(&self.progress, dir)
    }

    /// Replaces progress with the snapshot in `blob`. Returns `false` and
    /// changes nothing when the blob is rejected.
    pub fn import_progress(&mut self, blob: &str) -> bool {
        let dataset = &self.dataset;
        match persistence::import_json(&mut self.progress, blob, |word| dataset.knows(word)) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("Failed to import progress: {}", err);
                false
            }
        }
    }

    /// Wipes all progress along with the active mission and selection.
    pub fn reset_progress(&mut self) {
        persistence::reset(&mut self.progress);
        self.missions.clear_mission();
        self.selected_star = None;
    }

    pub fn save(&self) -> Result<(), PersistenceError> {
        if let Some(path) = &self.progress_path {
            save_to_disk(&self.progress, path)
        } else {
            Ok(()) // Don't error if no path is set
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StarEngine {
        StarEngine::new(VocabularyDataset::new(vec![
            WordEntry::new("happy", "joyful", &["glad", "joyful"]),
            WordEntry::new("terse", "brief", &["concise"]),
        ]))
        .with_seed(5)
    }

    #[test]
    fn click_respects_marking_mode() {
        let mut engine = engine();
        engine.click_star("happy");
        assert_eq!(engine.selected_star(), Some("happy"));
        assert!(!engine.star_state("happy").marked);

        assert!(engine.toggle_marking_mode());
        engine.click_star("terse");
        assert!(engine.star_state("terse").marked);
        assert_eq!(engine.selected_star(), Some("happy"));
    }

    #[test]
    fn notebook_lists_marked_words_with_entries() {
        let mut engine = engine();
        engine.toggle_mark("terse");
        engine.toggle_mark("glad");
        let notebook = engine.notebook();
        assert_eq!(notebook.len(), 2);
        assert_eq!(notebook[0].0, "glad");
        assert!(notebook[0].1.is_none());
        assert_eq!(notebook[1].1.unwrap().meaning, "brief");
    }

    #[test]
    fn mission_brightens_word_and_synonym() {
        let mut engine = engine();
        assert!(engine.start_mission("happy"));
        engine.submit_answer(0, "Glad").unwrap();
        engine.submit_answer(1, "JOYFUL").unwrap();
        let outcome = engine.complete_mission().unwrap();
        assert!(outcome.counted_correct);

        assert!((engine.star_state("happy").brightness - 0.2).abs() < 1e-9);
        assert!((engine.star_state("glad").brightness - 0.1).abs() < 1e-9);
        assert_eq!(engine.star_state("happy").correct, 1);
    }

    #[test]
    fn skipped_synonyms_reach_the_notebook() {
        let mut engine = engine();
        engine.start_mission("happy");
        engine.submit_answer(0, "glad").unwrap();
        engine.skip_mission().unwrap();
        assert!(engine.mission().is_none());
        let words: Vec<&str> = engine.notebook().iter().map(|(w, _)| *w).collect();
        assert_eq!(words, vec!["joyful"]);
    }

    #[test]
    fn failed_import_keeps_progress() {
        let mut engine = engine();
        engine.toggle_mark("happy");
        assert!(!engine.import_progress("{\"version\":\"1.1\"}"));
        assert!(engine.star_state("happy").marked);
    }

    #[test]
    fn reset_clears_mission_and_selection() {
        let mut engine = engine();
        engine.select_star("happy");
        engine.start_mission("happy");
        engine.toggle_mark("happy");
        engine.reset_progress();
        assert!(engine.mission().is_none());
        assert!(engine.selected_star().is_none());
        assert_eq!(engine.star_state("happy"), StarState::default());
    }

    #[test]
    fn open_falls_back_on_missing_file_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.bin");
        let dataset = engine().dataset().clone();

        let mut first = StarEngine::open(dataset.clone(), &path);
        first.toggle_mark("happy");
        first.save().unwrap();

        let second = StarEngine::open(dataset, &path);
        assert!(second.star_state("happy").marked);
    }

    #[test]
    fn constellation_lookup_by_member() {
        let engine = engine();
        assert_eq!(engine.constellations().len(), 2);
        assert_eq!(engine.constellation_of("joyful").unwrap().main_star.word, "happy");
        assert!(engine.constellation_of("missing").is_none());
    }
}
