// File: src/mission.rs
//! Quiz flow: a single mission (one word, one slot per synonym) and the
//! optional session queue that chains missions together.
use crate::core::dataset::VocabularyDataset;
use crate::core::types::WordEntry;
use crate::error::MissionError;
use crate::progress::ProgressStore;
use rand::seq::SliceRandom;
use rand::Rng;

/// Brightness added to a word-synonym edge per correctly recalled synonym.
pub const BRIGHTNESS_STEP: f64 = 0.1;
/// A mission counts as a correct attempt only strictly above this accuracy.
pub const PASS_ACCURACY: f64 = 0.8;
pub const DEFAULT_SESSION_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Empty,
    Correct,
    Incorrect,
    /// Given up; the answer is revealed and the slot is locked.
    DontKnow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub target: String,
    pub input: String,
    pub status: SlotStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub word: String,
    pub meaning: String,
    pub slots: Vec<Slot>,
    pub completed: bool,
}

impl Mission {
    fn from_entry(entry: &WordEntry) -> Self {
        Self {
            word: entry.word.clone(),
            meaning: entry.meaning.clone(),
            slots: entry
                .synonyms
                .iter()
                .map(|target| Slot {
                    target: target.clone(),
                    input: String::new(),
                    status: SlotStatus::Empty,
                })
                .collect(),
            completed: false,
        }
    }

    pub fn synonyms(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.target.as_str())
    }

    /// The non-empty answers typed so far, in slot order.
    pub fn user_inputs(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|s| s.status != SlotStatus::DontKnow && !s.input.trim().is_empty())
            .map(|s| s.input.as_str())
            .collect()
    }

    pub fn correct_count(&self) -> usize {
        self.slots.iter().filter(|s| s.status == SlotStatus::Correct).count()
    }

    pub fn accuracy(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        self.correct_count() as f64 / self.slots.len() as f64
    }

    /// First letter plus blanks and the letter count, e.g. `G__ (4 letters)`.
    /// `expanded` draws one blank per remaining letter.
    pub fn hint(&self, slot: usize, expanded: bool) -> Result<String, MissionError> {
        let target = &self.slot(slot)?.target;
        let first: String = target
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_default();
        let len = target.chars().count();
        let blanks = if expanded { len.saturating_sub(1) } else { 2 };
        Ok(format!("{first}{} ({len} letters)", "_".repeat(blanks)))
    }

    fn slot(&self, slot: usize) -> Result<&Slot, MissionError> {
        self.slots.get(slot).ok_or(MissionError::SlotOutOfRange { slot, len: self.slots.len() })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Slot, MissionError> {
        let len = self.slots.len();
        self.slots.get_mut(slot).ok_or(MissionError::SlotOutOfRange { slot, len })
    }
}

/// Marks `word` unless it is already marked.
fn flag_for_review(store: &mut ProgressStore, word: &str) {
    if !store.progress(word).marked {
        store.toggle_mark(word);
    }
}

/// Case-insensitive, whitespace-trimmed exact match.
pub fn answer_matches(input: &str, target: &str) -> bool {
    input.trim().to_lowercase() == target.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub missed_words: Vec<String>,
    pub dont_know_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionSession {
    pub queue: Vec<WordEntry>,
    pub index: usize,
    pub stats: SessionStats,
}

impl MissionSession {
    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.index + 1)
    }
}

/// Result of scoring a mission.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionOutcome {
    pub word: String,
    pub correct_slots: usize,
    pub total_slots: usize,
    pub accuracy: f64,
    pub counted_correct: bool,
    /// Synonyms whose edge to the mission word was brightened.
    pub brightened: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Synonyms marked for review.
    pub flagged: Vec<String>,
    /// Where the session went next; `None` for a standalone mission.
    pub advance: Option<Advance>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next,
    SessionComplete(SessionStats),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Active(Mission),
    SessionComplete(SessionStats),
}

/// Holds the active mission and session. Progress is only touched through
/// the [`ProgressStore`] passed into each call.
#[derive(Debug, Clone, Default)]
pub struct MissionEngine {
    phase: Phase,
    session: Option<MissionSession>,
}

impl MissionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mission(&self) -> Option<&Mission> {
        match &self.phase {
            Phase::Active(mission) => Some(mission),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&MissionSession> {
        self.session.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Final stats once a session has run out of questions.
    pub fn finished_session(&self) -> Option<&SessionStats> {
        match &self.phase {
            Phase::SessionComplete(stats) => Some(stats),
            _ => None,
        }
    }

    /// Starts a standalone mission. Unknown words are ignored and `false`
    /// is returned.
    pub fn start_mission(&mut self, dataset: &VocabularyDataset, word: &str) -> bool {
        let Some(entry) = dataset.get(word) else {
            tracing::debug!(word, "ignoring mission for unknown word");
            return false;
        };
        self.session = None;
        self.phase = Phase::Active(Mission::from_entry(entry));
        tracing::debug!(word, "mission started");
        true
    }

    /// Samples up to `n` distinct entries in random order and starts the first.
    /// Returns the number of queued questions; an empty dataset leaves the
    /// engine idle.
    pub fn start_session<R: Rng + ?Sized>(
        &mut self,
        dataset: &VocabularyDataset,
        n: usize,
        rng: &mut R,
    ) -> usize {
        let mut queue: Vec<WordEntry> = dataset.entries().to_vec();
        queue.shuffle(rng);
        queue.truncate(n.min(dataset.len()));

        let Some(first) = queue.first() else {
            self.clear_mission();
            return 0;
        };
        self.phase = Phase::Active(Mission::from_entry(first));
        let total = queue.len();
        self.session = Some(MissionSession {
            queue,
            index: 0,
            stats: SessionStats { total_questions: total, ..SessionStats::default() },
        });
        tracing::debug!(total, "session started");
        total
    }

    fn active_mut(&mut self) -> Result<&mut Mission, MissionError> {
        match &mut self.phase {
            Phase::Active(mission) if mission.completed => Err(MissionError::AlreadyCompleted),
            Phase::Active(mission) => Ok(mission),
            _ => Err(MissionError::NoActiveMission),
        }
    }

    /// Records the text typed into one slot and reports whether it matches.
    pub fn submit_answer(&mut self, slot: usize, text: &str) -> Result<SlotStatus, MissionError> {
        let mission = self.active_mut()?;
        let slot_ref = mission.slot_mut(slot)?;
        if slot_ref.status == SlotStatus::DontKnow {
            return Err(MissionError::SlotLocked(slot));
        }
        slot_ref.input = text.to_string();
        slot_ref.status = if text.trim().is_empty() {
            SlotStatus::Empty
        } else if answer_matches(text, &slot_ref.target) {
            SlotStatus::Correct
        } else {
            SlotStatus::Incorrect
        };
        Ok(slot_ref.status)
    }

    /// Reveals the slot's answer, locks it, and flags the mission word for
    /// review. Returns the revealed synonym.
    pub fn mark_dont_know(&mut self, store: &mut ProgressStore, slot: usize) -> Result<String, MissionError> {
        let mission = self.active_mut()?;
        let word = mission.word.clone();
        let slot_ref = mission.slot_mut(slot)?;
        if slot_ref.status == SlotStatus::DontKnow {
            return Err(MissionError::SlotLocked(slot));
        }
        slot_ref.input = slot_ref.target.clone();
        slot_ref.status = SlotStatus::DontKnow;
        let revealed = slot_ref.target.clone();

        flag_for_review(store, &word);
        Ok(revealed)
    }

    /// Gives up on the whole mission: every synonym not answered correctly is
    /// flagged for review. Standalone missions are cleared; in a session the
    /// word counts as missed and the next question is loaded.
    pub fn skip_mission(&mut self, store: &mut ProgressStore) -> Result<Skipped, MissionError> {
        let mission = self.active_mut()?;
        let flagged: Vec<String> = mission
            .slots
            .iter()
            .filter(|s| s.status != SlotStatus::Correct)
            .map(|s| s.target.clone())
            .collect();
        for synonym in &flagged {
            flag_for_review(store, synonym);
        }
        tracing::debug!(word = %mission.word, flagged = flagged.len(), "mission skipped");

        let advance = if self.session.is_some() {
            Some(self.next_mission()?)
        } else {
            self.clear_mission();
            None
        };
        Ok(Skipped { flagged, advance })
    }

    /// Scores the mission and commits the result to `store`. A second call
    /// for the same mission is rejected.
    pub fn complete_mission(&mut self, store: &mut ProgressStore) -> Result<MissionOutcome, MissionError> {
        let mission = self.active_mut()?;
        mission.completed = true;

        let accuracy = mission.accuracy();
        let counted_correct = accuracy > PASS_ACCURACY;
        let brightened: Vec<String> = mission
            .slots
            .iter()
            .filter(|s| s.status == SlotStatus::Correct)
            .map(|s| s.target.clone())
            .collect();
        for synonym in &brightened {
            store.increment_brightness(&mission.word, synonym, BRIGHTNESS_STEP);
        }
        store.record_attempt(&mission.word, counted_correct);

        let outcome = MissionOutcome {
            word: mission.word.clone(),
            correct_slots: brightened.len(),
            total_slots: mission.slots.len(),
            accuracy,
            counted_correct,
            brightened,
        };
        let gave_up = mission.slots.iter().any(|s| s.status == SlotStatus::DontKnow);

        if let Some(session) = self.session.as_mut() {
            if counted_correct {
                session.stats.correct_answers += 1;
            } else {
                session.stats.missed_words.push(outcome.word.clone());
            }
            if gave_up {
                session.stats.dont_know_words.push(outcome.word.clone());
            }
        }
        tracing::debug!(word = %outcome.word, accuracy, counted_correct, "mission completed");
        Ok(outcome)
    }

    /// Moves to the next queued question. A mission left uncompleted counts
    /// as missed, without touching progress.
    pub fn next_mission(&mut self) -> Result<Advance, MissionError> {
        let Some(session) = self.session.as_mut() else {
            return Err(MissionError::NoSession);
        };
        if let Phase::Active(mission) = &self.phase {
            if !mission.completed {
                session.stats.missed_words.push(mission.word.clone());
            }
        }

        if session.index + 1 < session.queue.len() {
            session.index += 1;
            self.phase = Phase::Active(Mission::from_entry(&session.queue[session.index]));
            return Ok(Advance::Next);
        }

        let stats = session.stats.clone();
        self.session = None;
        self.phase = Phase::SessionComplete(stats.clone());
        tracing::debug!(correct = stats.correct_answers, total = stats.total_questions, "session complete");
        Ok(Advance::SessionComplete(stats))
    }

    /// Drops the mission and any session. Already committed scores stay.
    pub fn clear_mission(&mut self) {
        self.phase = Phase::Idle;
        self.session = None;
    }

    pub fn end_session_early(&mut self) -> Option<SessionStats> {
        let stats = self.session.take().map(|s| s.stats);
        self.phase = Phase::Idle;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> VocabularyDataset {
        VocabularyDataset::new(vec![
            WordEntry::new("W", "test word", &["x", "y", "z"]),
            WordEntry::new("happy", "joyful", &["glad"]),
            WordEntry::new("bare", "empty", &[]),
            WordEntry::new("terse", "brief", &["concise", "pithy", "curt", "laconic", "succinct"]),
        ])
    }

    #[test]
    fn unknown_word_is_a_no_op() {
        let mut engine = MissionEngine::new();
        assert!(!engine.start_mission(&dataset(), "nope"));
        assert!(engine.is_idle());
    }

    #[test]
    fn scoring_counts_only_exact_matches() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        assert!(engine.start_mission(&dataset, "W"));

        assert_eq!(engine.submit_answer(0, " X ").unwrap(), SlotStatus::Correct);
        assert_eq!(engine.submit_answer(1, "zz").unwrap(), SlotStatus::Incorrect);
        assert_eq!(engine.mark_dont_know(&mut store, 2).unwrap(), "z");

        let outcome = engine.complete_mission(&mut store).unwrap();
        assert_eq!(outcome.correct_slots, 1);
        assert!((outcome.accuracy - 1.0 / 3.0).abs() < 1e-9);
        assert!(!outcome.counted_correct);
        assert_eq!(outcome.brightened, vec!["x"]);

        assert!((store.connection_brightness("W", "x") - 0.1).abs() < 1e-9);
        assert_eq!(store.connection_brightness("W", "y"), 0.0);
        assert_eq!(store.connection_brightness("W", "z"), 0.0);
        let p = store.progress("W");
        assert_eq!((p.attempts, p.correct), (1, 0));
        assert!(p.marked);
    }

    #[test]
    fn second_completion_is_rejected() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset, "happy");
        engine.submit_answer(0, "glad").unwrap();
        engine.complete_mission(&mut store).unwrap();

        assert_eq!(engine.complete_mission(&mut store), Err(MissionError::AlreadyCompleted));
        assert_eq!(engine.submit_answer(0, "x"), Err(MissionError::AlreadyCompleted));
        assert!((store.connection_brightness("happy", "glad") - 0.1).abs() < 1e-9);
        assert_eq!(store.progress("happy").attempts, 1);
        assert_eq!(store.progress("happy").correct, 1);
    }

    #[test]
    fn pass_threshold_is_strict() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset, "terse");
        for (slot, answer) in ["concise", "pithy", "curt", "laconic"].iter().enumerate() {
            engine.submit_answer(slot, answer).unwrap();
        }
        let outcome = engine.complete_mission(&mut store).unwrap();
        assert!((outcome.accuracy - 0.8).abs() < 1e-9);
        assert!(!outcome.counted_correct);
        assert_eq!(store.progress("terse").correct, 0);
    }

    #[test]
    fn dont_know_locks_slot_and_keeps_mark() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset, "W");
        engine.mark_dont_know(&mut store, 0).unwrap();
        engine.mark_dont_know(&mut store, 1).unwrap();

        assert_eq!(engine.submit_answer(0, "x"), Err(MissionError::SlotLocked(0)));
        assert_eq!(engine.mark_dont_know(&mut store, 0), Err(MissionError::SlotLocked(0)));
        assert_eq!(
            engine.submit_answer(7, "x"),
            Err(MissionError::SlotOutOfRange { slot: 7, len: 3 })
        );
        assert!(store.progress("W").marked);
        assert!(!store.progress("x").marked);
    }

    #[test]
    fn skip_flags_unanswered_synonyms() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        store.toggle_mark("z");
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset, "W");
        engine.submit_answer(0, "x").unwrap();
        engine.submit_answer(1, "wrong").unwrap();

        let skipped = engine.skip_mission(&mut store).unwrap();
        assert_eq!(skipped.flagged, vec!["y", "z"]);
        assert_eq!(skipped.advance, None);
        assert!(engine.is_idle());
        assert_eq!(store.marked_words(), vec!["y", "z"]);
        assert!(!store.progress("x").marked);
        // nothing is scored
        assert_eq!(store.progress("W").attempts, 0);
        assert_eq!(store.connection_brightness("W", "x"), 0.0);
        assert_eq!(engine.skip_mission(&mut store), Err(MissionError::NoActiveMission));
    }

    #[test]
    fn skip_in_session_records_miss_and_advances() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_session(&dataset, 2, &mut StdRng::seed_from_u64(4));
        let first = engine.mission().unwrap().word.clone();

        let skipped = engine.skip_mission(&mut store).unwrap();
        assert_eq!(skipped.advance, Some(Advance::Next));
        assert_eq!(engine.session().unwrap().stats.missed_words, vec![first]);
        assert_eq!(engine.session().unwrap().index, 1);

        let last = engine.skip_mission(&mut store).unwrap();
        assert!(matches!(last.advance, Some(Advance::SessionComplete(ref stats)) if stats.missed_words.len() == 2));
    }

    #[test]
    fn blank_answer_resets_slot() {
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset(), "W");
        engine.submit_answer(1, "nope").unwrap();
        assert_eq!(engine.submit_answer(1, "   ").unwrap(), SlotStatus::Empty);
        assert!(engine.mission().unwrap().user_inputs().is_empty());
    }

    #[test]
    fn mission_without_synonyms_scores_zero() {
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset(), "bare");
        let outcome = engine.complete_mission(&mut store).unwrap();
        assert_eq!(outcome.accuracy, 0.0);
        assert_eq!(store.progress("bare").attempts, 1);
    }

    #[test]
    fn hints_show_first_letter_and_length() {
        let mut engine = MissionEngine::new();
        engine.start_mission(&dataset(), "terse");
        let mission = engine.mission().unwrap();
        assert_eq!(mission.hint(0, false).unwrap(), "C__ (7 letters)");
        assert_eq!(mission.hint(2, true).unwrap(), "C___ (4 letters)");
    }

    #[test]
    fn session_walks_queue_and_accumulates_stats() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(engine.start_session(&dataset, 3, &mut rng), 3);

        let queued: Vec<String> = engine.session().unwrap().queue.iter().map(|e| e.word.clone()).collect();
        let mut distinct = queued.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 3);

        // first: answer everything
        let first = engine.mission().unwrap().clone();
        for (slot, target) in first.synonyms().enumerate() {
            engine.submit_answer(slot, target).unwrap();
        }
        engine.complete_mission(&mut store).unwrap();
        assert_eq!(engine.next_mission().unwrap(), Advance::Next);

        // second: skipped without completing
        assert_eq!(engine.mission().unwrap().word, queued[1]);
        assert_eq!(engine.next_mission().unwrap(), Advance::Next);

        // third: completed empty
        engine.complete_mission(&mut store).unwrap();
        let Advance::SessionComplete(stats) = engine.next_mission().unwrap() else {
            panic!("session should be over");
        };
        assert_eq!(stats.total_questions, 3);
        let first_passed = !first.slots.is_empty();
        assert_eq!(stats.correct_answers, usize::from(first_passed));
        assert!(stats.missed_words.contains(&queued[1]));
        assert!(stats.missed_words.contains(&queued[2]));
        assert_eq!(engine.finished_session(), Some(&stats));
        assert!(engine.session().is_none());

        engine.clear_mission();
        assert!(engine.is_idle());
    }

    #[test]
    fn session_size_is_capped_by_dataset() {
        let mut engine = MissionEngine::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(engine.start_session(&dataset(), DEFAULT_SESSION_SIZE, &mut rng), 4);
        assert_eq!(engine.session().unwrap().remaining(), 3);
        assert_eq!(engine.start_session(&VocabularyDataset::default(), 5, &mut rng), 0);
        assert!(engine.is_idle());
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let dataset = dataset();
        let order = |seed| {
            let mut engine = MissionEngine::new();
            engine.start_session(&dataset, 4, &mut StdRng::seed_from_u64(seed));
            engine.session().unwrap().queue.clone()
        };
        assert_eq!(order(11), order(11));
    }

    #[test]
    fn ending_early_keeps_committed_scores() {
        let dataset = dataset();
        let mut store = ProgressStore::new();
        let mut engine = MissionEngine::new();
        engine.start_session(&dataset, 2, &mut StdRng::seed_from_u64(3));
        let word = engine.mission().unwrap().word.clone();
        engine.complete_mission(&mut store).unwrap();
        engine.next_mission().unwrap();
        let stats = engine.end_session_early().unwrap();
        assert_eq!(stats.missed_words, vec![word.clone()]);
        assert_eq!(store.progress(&word).attempts, 1);
        assert!(engine.is_idle());
        assert_eq!(engine.next_mission(), Err(MissionError::NoSession));
    }

    #[test]
    fn standalone_mission_drops_session() {
        let dataset = dataset();
        let mut engine = MissionEngine::new();
        engine.start_session(&dataset, 2, &mut StdRng::seed_from_u64(3));
        engine.start_mission(&dataset, "happy");
        assert!(engine.session().is_none());
    }
}
