//! Parsing of cut-list files.
//!
//! A cut list holds one `<minutes>:<seconds> <title>` entry per line. Malformed
//! lines never abort parsing: they are recorded as [`LineIssue`]s and skipped,
//! so a partly broken file still yields every entry that could be read.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

use crate::AudioSplitError;

/// A single valid line of a cut list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutEntry {
    /// 1-based line number in the source file.
    pub line: usize,
    /// Start of the segment in milliseconds.
    pub timestamp_ms: u64,
    /// Title exactly as written, before sanitization.
    pub title: String,
}

/// Why a cut-list line was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineIssueKind {
    /// The line has no whitespace separating the time mark from a title.
    MissingTitle,
    /// The time mark is not `<minutes>:<seconds>` with unsigned integers.
    InvalidTimeMark,
}

impl fmt::Display for LineIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineIssueKind::MissingTitle => write!(f, "expected '<minutes>:<seconds> <title>'"),
            LineIssueKind::InvalidTimeMark => write!(f, "invalid time mark"),
        }
    }
}

/// Diagnostic for a cut-list line that was skipped.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: '{content}'")]
pub struct LineIssue {
    pub line: usize,
    /// The offending line with surrounding whitespace removed.
    pub content: String,
    pub kind: LineIssueKind,
}

/// Entries of a cut list in file order, together with the skipped lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CutList {
    entries: Vec<CutEntry>,
    issues: Vec<LineIssue>,
}

impl CutList {
    /// Parse cut-list text. Never fails; bad lines end up in [`CutList::issues`].
    pub fn parse(text: &str) -> Self {
        let mut list = CutList::default();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Ok((timestamp_ms, title)) => list.entries.push(CutEntry {
                    line: line_number,
                    timestamp_ms,
                    title: title.to_owned(),
                }),
                Err(kind) => {
                    let issue = LineIssue {
                        line: line_number,
                        content: line.to_owned(),
                        kind,
                    };
                    warn!("skipping cut-list {issue}");
                    list.issues.push(issue);
                }
            }
        }

        debug!(
            "parsed {} cut-list entries, skipped {} line(s)",
            list.entries.len(),
            list.issues.len()
        );
        list
    }

    pub fn entries(&self) -> &[CutEntry] {
        &self.entries
    }

    pub fn issues(&self) -> &[LineIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read and parse the cut list stored at `path`.
///
/// Only failing to read the file is an error; malformed lines are reported
/// through [`CutList::issues`].
pub fn parse_cut_list<P: AsRef<Path>>(path: P) -> Result<CutList, AudioSplitError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| AudioSplitError::CutList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CutList::parse(&text))
}

fn parse_line(line: &str) -> Result<(u64, &str), LineIssueKind> {
    let (mark, rest) = line
        .split_once(char::is_whitespace)
        .ok_or(LineIssueKind::MissingTitle)?;
    let title = rest.trim_start();
    if title.is_empty() {
        return Err(LineIssueKind::MissingTitle);
    }

    let timestamp_ms = parse_time_mark(mark).ok_or(LineIssueKind::InvalidTimeMark)?;
    Ok((timestamp_ms, title))
}

/// Convert a `<minutes>:<seconds>` mark into milliseconds.
///
/// Seconds are not range checked, so `0:90` is ninety seconds. Returns `None`
/// for anything that is not two colon-separated unsigned integers or that
/// overflows.
pub fn parse_time_mark(mark: &str) -> Option<u64> {
    let (minutes, seconds) = mark.split_once(':')?;
    let minutes = minutes.parse::<u64>().ok()?;
    let seconds = seconds.parse::<u64>().ok()?;

    minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1_000)
}
