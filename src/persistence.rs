// File: src/persistence.rs
//! Two ways to keep progress around:
//! - the JSON snapshot used for export/import (`version 1.1` format, pair
//!   keys written as `a-b`),
//! - a binary autosave of the store written atomically next to its target.
use crate::core::types::{RelationshipKey, WordProgress};
use crate::error::{ImportError, PersistenceError};
use crate::progress::ProgressStore;
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_VERSION: &str = "1.1";

/// The durable part of a [`ProgressStore`] as it appears in exported files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub timestamp: String,
    pub star_progress: BTreeMap<String, WordProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_brightness: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub version: Option<String>,
    pub words: usize,
    pub connections: usize,
    /// Pair keys that could not be split back into two words.
    pub dropped_keys: Vec<String>,
}

pub fn pair_key(key: &RelationshipKey) -> String {
    format!("{}-{}", key.first(), key.second())
}

/// Splits an `a-b` key back into a pair. Only splits whose halves are in
/// sorted order are candidates; with several candidates the single one whose
/// halves are known words wins. Returns `None` when nothing fits or two
/// candidates tie.
pub fn split_pair_key(key: &str, is_known: impl Fn(&str) -> bool) -> Option<RelationshipKey> {
    let candidates: Vec<(&str, &str)> = key
        .match_indices('-')
        .map(|(at, _)| (&key[..at], &key[at + 1..]))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty() && a <= b)
        .collect();

    match candidates.as_slice() {
        [] => None,
        &[(a, b)] => Some(RelationshipKey::new(a, b)),
        many => {
            let score = |&(a, b): &(&str, &str)| usize::from(is_known(a)) + usize::from(is_known(b));
            let best = many.iter().map(score).max().unwrap_or(0);
            let mut top = many.iter().filter(|&pair| score(pair) == best);
            match (top.next(), top.next()) {
                (Some(&(a, b)), None) if best > 0 => Some(RelationshipKey::new(a, b)),
                _ => None,
            }
        }
    }
}

pub fn snapshot(store: &ProgressStore) -> Snapshot {
    Snapshot {
        version: SNAPSHOT_VERSION.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        star_progress: store.star_progress.clone(),
        connection_brightness: Some(
            store
                .connection_brightness
                .iter()
                .map(|(key, value)| (pair_key(key), *value))
                .collect(),
        ),
    }
}

pub fn export_json(store: &ProgressStore) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(&snapshot(store))?)
}

/// `gre-starnet-progress-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("gre-starnet-progress-{}.json", date.format("%Y-%m-%d"))
}

/// Writes an export into `dir` and returns the file path.
pub fn write_export(store: &ProgressStore, dir: &Path) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    fs::write(&path, export_json(store)?)?;
    tracing::info!(path = %path.display(), "exported progress");
    Ok(path)
}

/// Replaces the store's progress with the snapshot in `blob`.
/// On any error the store is left as it was.
pub fn import_json(
    store: &mut ProgressStore,
    blob: &str,
    is_known: impl Fn(&str) -> bool,
) -> Result<ImportSummary, ImportError> {
    let value: Value = serde_json::from_str(blob).map_err(ImportError::Parse)?;
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;

    let raw_progress = match object.get("starProgress") {
        None | Some(Value::Null) => return Err(ImportError::MissingStarProgress),
        Some(v) => v.clone(),
    };
    let mut star_progress: BTreeMap<String, WordProgress> = serde_json::from_value(raw_progress)
        .map_err(|source| ImportError::Malformed { field: "starProgress", source })?;
    for (word, progress) in star_progress.iter_mut() {
        if progress.correct > progress.attempts {
            tracing::warn!(%word, "correct exceeds attempts in snapshot, clamping");
            progress.correct = progress.attempts;
        }
    }

    // older snapshots predate per-connection brightness
    let raw_brightness: BTreeMap<String, f64> = match object.get("connectionBrightness") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|source| ImportError::Malformed { field: "connectionBrightness", source })?,
    };

    let mut connection_brightness = BTreeMap::new();
    let mut dropped_keys = Vec::new();
    for (key, value) in raw_brightness {
        if !value.is_finite() {
            dropped_keys.push(key);
            continue;
        }
        match split_pair_key(&key, &is_known) {
            Some(pair) => {
                connection_brightness.insert(pair, value.clamp(0.0, 1.0));
            }
            None => dropped_keys.push(key),
        }
    }
    if !dropped_keys.is_empty() {
        tracing::warn!(count = dropped_keys.len(), keys = ?dropped_keys, "dropped unreadable connection keys");
    }

    let summary = ImportSummary {
        version: object.get("version").and_then(Value::as_str).map(str::to_string),
        words: star_progress.len(),
        connections: connection_brightness.len(),
        dropped_keys,
    };
    store.star_progress = star_progress;
    store.connection_brightness = connection_brightness;
    tracing::info!(
        version = summary.version.as_deref().unwrap_or("unknown"),
        words = summary.words,
        connections = summary.connections,
        "imported progress"
    );
    Ok(summary)
}

pub fn reset(store: &mut ProgressStore) {
    store.clear();
    tracing::info!("progress reset");
}

pub fn save_to_disk(store: &ProgressStore, path: &Path) -> Result<(), PersistenceError> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        bincode::serialize_into(&mut writer, store)?;
        writer.flush()?;
    }

    temp_file.persist(path)?;
    tracing::debug!(path = %path.display(), "progress saved");
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<ProgressStore, PersistenceError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let store: ProgressStore = bincode::deserialize_from(reader)?;
    tracing::info!(path = %path.display(), "progress loaded");
    Ok(store)
}
