//! # Transcript Module
//!
//! Resolves the most recent token usage recorded in a session transcript.
//! The quota API only reports request counts, so context-window consumption
//! has to be read back from the session's JSONL log.
//!
//! Resolution order:
//! - the named file, if it exists: a trailing summary line is followed to the
//!   message it references (searched across every log in the directory),
//!   otherwise the newest assistant entry with usage wins
//! - when the named file is missing, sibling `.jsonl` files newest first
//!
//! Malformed lines are skipped everywhere. No outcome here is an error; an
//! unresolvable transcript is simply `None`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::models::TranscriptEntry;
use crate::tokens::TokenUsageFigures;

const LOG_EXTENSION: &str = "jsonl";

/// Latest token usage for the session whose transcript lives at `transcript_path`
pub fn resolve_transcript_usage(transcript_path: &Path) -> Option<TokenUsageFigures> {
    let dir = match transcript_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !transcript_path.is_file() {
        tracing::debug!(path = %transcript_path.display(), "transcript missing, scanning history");
        return find_from_history(dir);
    }
    let entries = read_entries(transcript_path)?;
    resolve_entries(&entries, dir)
}

/// Read every well-formed line of a transcript
pub fn read_entries(path: &Path) -> Option<Vec<TranscriptEntry>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "cannot open transcript");
            return None;
        }
    };
    // Reading stops at the first I/O error; lines that are not UTF-8 are skipped
    let entries = BufReader::new(file)
        .split(b'\n')
        .map_while(Result::ok)
        .filter_map(|line| String::from_utf8(line).ok())
        .filter_map(|line| TranscriptEntry::parse_line(&line))
        .collect();
    Some(entries)
}

/// Resolve usage from one file's entries; `dir` is where references are chased.
fn resolve_entries(entries: &[TranscriptEntry], dir: &Path) -> Option<TokenUsageFigures> {
    if let Some(TranscriptEntry::Summary { leaf_uuid }) = entries.last() {
        return resolve_by_reference(dir, leaf_uuid.as_deref()?);
    }
    // All-zero usage (synthetic assistant lines) would mask the real figure
    entries
        .iter()
        .rev()
        .filter_map(TranscriptEntry::usage)
        .map(TokenUsageFigures::from_usage)
        .find(|figures| figures.context_tokens() > 0)
}

/// Find the entry with uuid `reference` in any log of `dir`
fn resolve_by_reference(dir: &Path, reference: &str) -> Option<TokenUsageFigures> {
    for path in log_files_by_recency(dir) {
        let Some(entries) = read_entries(&path) else {
            continue;
        };
        let Some(found) = entries.iter().find(|e| e.uuid() == Some(reference)) else {
            continue;
        };
        return match found {
            TranscriptEntry::Assistant { usage: Some(usage), .. } => {
                Some(TokenUsageFigures::from_usage(usage))
            }
            TranscriptEntry::User {
                parent_uuid: Some(parent),
                ..
            } => entries
                .iter()
                .find(|e| e.uuid() == Some(parent.as_str()))
                .and_then(TranscriptEntry::usage)
                .map(TokenUsageFigures::from_usage),
            _ => {
                tracing::debug!(reference, path = %path.display(), "referenced entry carries no usage");
                None
            }
        };
    }
    tracing::debug!(reference, dir = %dir.display(), "reference not found");
    None
}

/// Try each sibling log newest first until one yields usage
fn find_from_history(dir: &Path) -> Option<TokenUsageFigures> {
    log_files_by_recency(dir).into_iter().find_map(|path| {
        let entries = read_entries(&path)?;
        resolve_entries(&entries, dir)
    })
}

/// `.jsonl` files directly inside `dir`, most recently modified first
pub fn log_files_by_recency(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(SystemTime, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(LOG_EXTENSION))
        .map(|e| {
            let mtime = e
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (mtime, e.into_path())
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    files.into_iter().map(|(_, p)| p).collect()
}
