pub mod audio;
pub mod cutlist;
pub mod sanitize;
pub mod segment;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

pub use audio::{decode, AudioClip, DecodedAudio, OutputFormat};
pub use cutlist::{parse_cut_list, parse_time_mark, CutEntry, CutList, LineIssue, LineIssueKind};
pub use sanitize::{sanitize_filename, UNSAFE_FILENAME_CHARS};
pub use segment::{format_time, plan_segments, Segment};

/// Errors that can occur while splitting audio files.
#[derive(Debug, Error)]
pub enum AudioSplitError {
    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper around errors produced while writing WAV segments.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Error reported by the LAME encoder.
    #[error("mp3 encoding failed: {0}")]
    Mp3Encode(String),

    /// Error returned when the cut-list file cannot be read.
    #[error("failed to read cut list '{}'", .path.display())]
    CutList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error returned when the input audio file does not exist.
    #[error("input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    /// Error returned when no probe recognises the input container.
    #[error("unsupported audio format")]
    UnsupportedFormat,

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec")]
    UnsupportedCodec,

    /// Error returned when the output format cannot hold the channel layout.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannelCount(usize),

    /// Error returned when no line of the cut list could be parsed.
    #[error("cut list contains no valid entries")]
    EmptyCutList,

    /// Error returned when a time mark precedes the one before it.
    #[error("cut list is out of order: line {line} starts at {timestamp}, before the previous entry at {previous}")]
    UnorderedCutList {
        line: usize,
        timestamp: String,
        previous: String,
    },

    /// Error returned when two titles sanitize to the same file name.
    #[error("titles on lines {first_line} and {second_line} both produce the file name '{name}'")]
    DuplicateOutputName {
        name: String,
        first_line: usize,
        second_line: usize,
    },

    /// Error returned when an output file exists and overwriting is disabled.
    #[error("output file already exists: {} (use --overwrite to replace it)", .0.display())]
    OutputExists(PathBuf),
}

/// Configuration for the splitting operation.
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonicalized path of the recording to split.
    pub input_path: PathBuf,
    /// Path of the cut-list file.
    pub cutlist_path: PathBuf,
    /// Directory into which the segments are written; created when missing.
    pub output_dir: PathBuf,
    /// Replace files that already exist in the output directory.
    pub overwrite: bool,
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input: PathBuf,
    cutlist: PathBuf,
    output: PathBuf,
    overwrite: bool,
}

impl Config {
    /// Construct a new [`Config`] with default options.
    pub fn new<P, C, Q>(input: P, cutlist: C, output: Q) -> Result<Self, AudioSplitError>
    where
        P: AsRef<Path>,
        C: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Self::builder(input, cutlist, output).build()
    }

    pub fn builder<P, C, Q>(input: P, cutlist: C, output: Q) -> ConfigBuilder
    where
        P: AsRef<Path>,
        C: AsRef<Path>,
        Q: AsRef<Path>,
    {
        ConfigBuilder {
            input: input.as_ref().to_path_buf(),
            cutlist: cutlist.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            overwrite: false,
        }
    }

    /// Format the segments of this run are written in.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::for_input(&self.input_path)
    }

    /// Path of the file written for `segment`.
    pub fn output_path(&self, segment: &Segment) -> PathBuf {
        let mut path = self.output_dir.clone();
        path.push(format!(
            "{}.{}",
            segment.file_stem,
            self.output_format().extension()
        ));
        path
    }
}

impl ConfigBuilder {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate the input path and produce the [`Config`].
    pub fn build(self) -> Result<Config, AudioSplitError> {
        if !self.input.is_file() {
            return Err(AudioSplitError::MissingInput(self.input));
        }
        let input_path = fs::canonicalize(&self.input)?;

        Ok(Config {
            input_path,
            cutlist_path: self.cutlist,
            output_dir: self.output,
            overwrite: self.overwrite,
        })
    }
}

/// Events emitted while a cut list is exported.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    /// A cut-list line was skipped.
    LineSkipped(&'a LineIssue),
    /// The recording has been decoded.
    Decoded {
        total_duration: Duration,
        segments: usize,
    },
    /// Export of a segment is about to begin.
    SegmentStarted {
        segment: &'a Segment,
        path: &'a Path,
    },
    /// A segment has been written.
    SegmentSaved {
        segment: &'a Segment,
        path: &'a Path,
    },
    Finish,
}

/// Receiver of [`ProgressEvent`]s.
pub trait ProgressReporter {
    fn report(&mut self, _event: ProgressEvent<'_>) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(ProgressEvent<'_>),
{
    fn report(&mut self, event: ProgressEvent<'_>) {
        self(event)
    }
}

/// Reporter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A segment together with the file it will be written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedSegment {
    pub segment: Segment,
    pub path: PathBuf,
}

/// Outcome of a completed export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub segments_written: usize,
    pub total_duration: Duration,
    pub outputs: Vec<PathBuf>,
}

/// Validate the cut list and resolve every output path without decoding.
///
/// Fails on an empty or unordered list, on colliding file names, and, unless
/// [`Config::overwrite`] is set, when an output file already exists.
pub fn plan_outputs(
    config: &Config,
    cut_list: &CutList,
) -> Result<Vec<PlannedSegment>, AudioSplitError> {
    segment::validate(cut_list.entries())?;

    let planned: Vec<PlannedSegment> = plan_segments(cut_list.entries())
        .into_iter()
        .map(|segment| {
            let path = config.output_path(&segment);
            PlannedSegment { segment, path }
        })
        .collect();

    if !config.overwrite {
        if let Some(existing) = planned.iter().find(|planned| planned.path.exists()) {
            return Err(AudioSplitError::OutputExists(existing.path.clone()));
        }
    }

    Ok(planned)
}

/// Read the cut list named by `config` and export every segment.
pub fn run(config: Config) -> Result<ExportSummary, AudioSplitError> {
    run_with_progress(config, &mut NoProgress)
}

/// Like [`run`], reporting skipped lines and per-segment progress.
pub fn run_with_progress<R: ProgressReporter + ?Sized>(
    config: Config,
    progress: &mut R,
) -> Result<ExportSummary, AudioSplitError> {
    let cut_list = parse_cut_list(&config.cutlist_path)?;
    for issue in cut_list.issues() {
        progress.report(ProgressEvent::LineSkipped(issue));
    }
    export_segments(&config, &cut_list, progress)
}

/// Decode the input once and write one file per cut-list entry, in order.
pub fn export_segments<R: ProgressReporter + ?Sized>(
    config: &Config,
    cut_list: &CutList,
    progress: &mut R,
) -> Result<ExportSummary, AudioSplitError> {
    let planned = plan_outputs(config, cut_list)?;
    fs::create_dir_all(&config.output_dir)?;

    let audio = decode(&config.input_path)?;
    let duration_ms = audio.duration_ms();
    let total_duration = Duration::from_millis(duration_ms);
    progress.report(ProgressEvent::Decoded {
        total_duration,
        segments: planned.len(),
    });

    let format = config.output_format();
    let mut outputs = Vec::with_capacity(planned.len());

    for PlannedSegment { segment, path } in &planned {
        if segment.start_ms > duration_ms {
            warn!(
                "'{}' starts at {}, past the end of the recording ({})",
                segment.title,
                format_time(segment.start_ms),
                format_time(duration_ms)
            );
        }

        progress.report(ProgressEvent::SegmentStarted { segment, path });

        let clip = audio.slice(segment.start_ms, Some(segment.end_or(duration_ms)));
        debug!(
            "segment {} spans {} frame(s) ({} ms)",
            segment.index,
            clip.frames(),
            clip.duration_ms()
        );
        clip.encode(path, format)?;
        info!("wrote '{}' to '{}'", segment.title, path.display());

        progress.report(ProgressEvent::SegmentSaved { segment, path });
        outputs.push(path.clone());
    }

    progress.report(ProgressEvent::Finish);

    Ok(ExportSummary {
        segments_written: outputs.len(),
        total_duration,
        outputs,
    })
}
