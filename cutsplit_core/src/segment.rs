use std::collections::HashMap;

use crate::cutlist::CutEntry;
use crate::sanitize::sanitize_filename;
use crate::AudioSplitError;

/// A time range of the source recording that becomes one output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Position in the cut list, starting at zero.
    pub index: usize,
    pub start_ms: u64,
    /// Exclusive end; `None` runs to the end of the recording.
    pub end_ms: Option<u64>,
    /// Title as written in the cut list.
    pub title: String,
    /// Sanitized title used as the output file stem.
    pub file_stem: String,
}

impl Segment {
    /// Resolve the end of the segment against the decoded duration.
    pub fn end_or(&self, duration_ms: u64) -> u64 {
        self.end_ms.unwrap_or(duration_ms)
    }
}

/// Derive one segment per entry.
///
/// Each segment runs from its own timestamp to the timestamp of the next
/// entry; the final one is open-ended.
pub fn plan_segments(entries: &[CutEntry]) -> Vec<Segment> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| Segment {
            index,
            start_ms: entry.timestamp_ms,
            end_ms: entries.get(index + 1).map(|next| next.timestamp_ms),
            title: entry.title.clone(),
            file_stem: sanitize_filename(&entry.title),
        })
        .collect()
}

/// Reject cut lists that cannot be exported unambiguously.
///
/// The list must be non-empty, timestamps must never decrease, and no two
/// titles may sanitize to the same file name.
pub fn validate(entries: &[CutEntry]) -> Result<(), AudioSplitError> {
    if entries.is_empty() {
        return Err(AudioSplitError::EmptyCutList);
    }

    for pair in entries.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.timestamp_ms < previous.timestamp_ms {
            return Err(AudioSplitError::UnorderedCutList {
                line: current.line,
                timestamp: format_time(current.timestamp_ms),
                previous: format_time(previous.timestamp_ms),
            });
        }
    }

    let mut seen: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let name = sanitize_filename(&entry.title);
        if let Some(first_line) = seen.get(&name) {
            return Err(AudioSplitError::DuplicateOutputName {
                name,
                first_line: *first_line,
                second_line: entry.line,
            });
        }
        seen.insert(name, entry.line);
    }

    Ok(())
}

/// Format milliseconds as `MM:SS`, letting minutes grow past 59.
pub fn format_time(milliseconds: u64) -> String {
    let seconds = milliseconds / 1_000;
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: usize, timestamp_ms: u64, title: &str) -> CutEntry {
        CutEntry {
            line,
            timestamp_ms,
            title: title.to_owned(),
        }
    }

    #[test]
    fn segments_are_contiguous_and_one_per_entry() {
        let entries = [
            entry(1, 0, "Intro"),
            entry(2, 90_000, "Chapter_One"),
            entry(3, 225_000, "Finale!"),
        ];
        let segments = plan_segments(&entries);

        assert_eq!(segments.len(), entries.len());
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_ms, Some(pair[1].start_ms));
        }
        assert_eq!(segments[0].start_ms, 0);
        assert_eq!(segments[2].end_ms, None);
        assert_eq!(segments[2].end_or(300_000), 300_000);
        assert_eq!(
            segments.iter().map(|s| s.file_stem.as_str()).collect::<Vec<_>>(),
            ["Intro", "Chapter_One", "Finale!"]
        );
    }

    #[test]
    fn single_entry_spans_whole_recording() {
        let segments = plan_segments(&[entry(1, 5_000, "Only")]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_ms, 5_000);
        assert_eq!(segments[0].end_ms, None);
    }

    #[test]
    fn file_stems_are_sanitized_but_titles_are_not() {
        let segments = plan_segments(&[entry(1, 0, "What? Now: Part 1/2")]);
        assert_eq!(segments[0].title, "What? Now: Part 1/2");
        assert_eq!(segments[0].file_stem, "What_ Now_ Part 1_2");
    }

    #[test]
    fn validate_rejects_empty_list() {
        assert!(matches!(validate(&[]), Err(AudioSplitError::EmptyCutList)));
    }

    #[test]
    fn validate_rejects_decreasing_timestamps() {
        let entries = [entry(1, 0, "A"), entry(2, 60_000, "B"), entry(4, 30_000, "C")];
        match validate(&entries) {
            Err(AudioSplitError::UnorderedCutList {
                line,
                timestamp,
                previous,
            }) => {
                assert_eq!(line, 4);
                assert_eq!(timestamp, "00:30");
                assert_eq!(previous, "01:00");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn validate_allows_equal_timestamps() {
        let entries = [entry(1, 0, "A"), entry(2, 0, "B")];
        assert!(validate(&entries).is_ok());
    }

    #[test]
    fn validate_rejects_titles_that_collide_after_sanitizing() {
        let entries = [entry(1, 0, "Part 1/2"), entry(3, 10_000, "Part 1:2")];
        match validate(&entries) {
            Err(AudioSplitError::DuplicateOutputName {
                name,
                first_line,
                second_line,
            }) => {
                assert_eq!(name, "Part 1_2");
                assert_eq!((first_line, second_line), (1, 3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn format_time_pads_and_truncates() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(90_999), "01:30");
        assert_eq!(format_time(225_000), "03:45");
        assert_eq!(format_time(6_000_000), "100:00");
    }
}
