//! Decoding, slicing and encoding of the source recording.
//!
//! The whole input is decoded once into interleaved 16-bit PCM. Segments are
//! borrowed millisecond ranges of that buffer and are re-encoded on export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use mp3lame_encoder::{
    max_required_buffer_size, Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::AudioSplitError;

/// LAME needs this much headroom on top of the per-sample estimate to flush.
const MP3_FLUSH_HEADROOM: usize = 7_200;

/// Container written for each segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3,
    Wav,
}

impl OutputFormat {
    /// Pick the output format matching the source file.
    ///
    /// WAV sources stay WAV; everything else is written as MP3.
    pub fn for_input(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => OutputFormat::Wav,
            _ => OutputFormat::Mp3,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }
}

/// A fully decoded recording.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    samples: Vec<i16>,
    channels: usize,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap already decoded interleaved samples.
    pub fn from_samples(samples: Vec<i16>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        (self.samples.len() / self.channels) as u64
    }

    pub fn duration_ms(&self) -> u64 {
        (u128::from(self.frames()) * 1_000 / u128::from(self.sample_rate)) as u64
    }

    /// Borrow the range `[start_ms, end_ms)`; `None` runs to the end.
    ///
    /// Offsets past the end are clamped and an inverted range is empty.
    pub fn slice(&self, start_ms: u64, end_ms: Option<u64>) -> AudioClip<'_> {
        let total = self.frames();
        let start = self.frame_at(start_ms).min(total);
        let end = end_ms
            .map(|ms| self.frame_at(ms).min(total))
            .unwrap_or(total)
            .max(start);

        let from = start as usize * self.channels;
        let to = end as usize * self.channels;
        AudioClip {
            samples: &self.samples[from..to],
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    fn frame_at(&self, ms: u64) -> u64 {
        let frame = u128::from(ms) * u128::from(self.sample_rate) / 1_000;
        frame.min(u128::from(u64::MAX)) as u64
    }
}

/// A borrowed range of a [`DecodedAudio`].
#[derive(Clone, Copy, Debug)]
pub struct AudioClip<'a> {
    samples: &'a [i16],
    channels: usize,
    sample_rate: u32,
}

impl AudioClip<'_> {
    pub fn samples(&self) -> &[i16] {
        self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_ms(&self) -> u64 {
        (self.frames() as u128 * 1_000 / u128::from(self.sample_rate)) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Write the clip to `path`, replacing any existing file.
    pub fn encode(&self, path: &Path, format: OutputFormat) -> Result<(), AudioSplitError> {
        match format {
            OutputFormat::Wav => self.write_wav(path),
            OutputFormat::Mp3 => self.write_mp3(path),
        }
    }

    fn write_wav(&self, path: &Path) -> Result<(), AudioSplitError> {
        let channels = u16::try_from(self.channels)
            .map_err(|_| AudioSplitError::UnsupportedChannelCount(self.channels))?;
        let spec = WavSpec {
            channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for &sample in self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    fn write_mp3(&self, path: &Path) -> Result<(), AudioSplitError> {
        let channels = match self.channels {
            1 => 1u8,
            2 => 2u8,
            other => return Err(AudioSplitError::UnsupportedChannelCount(other)),
        };

        let mut builder = Builder::new()
            .ok_or_else(|| AudioSplitError::Mp3Encode("failed to allocate LAME encoder".into()))?;
        builder.set_num_channels(channels).map_err(mp3_error)?;
        builder.set_sample_rate(self.sample_rate).map_err(mp3_error)?;
        builder.set_brate(Bitrate::Kbps192).map_err(mp3_error)?;
        builder.set_quality(Quality::Best).map_err(mp3_error)?;
        let mut encoder = builder.build().map_err(mp3_error)?;

        let mut encoded = Vec::new();
        encoded.reserve(max_required_buffer_size(self.frames()) + MP3_FLUSH_HEADROOM);
        if !self.is_empty() {
            match channels {
                1 => encoder.encode_to_vec(MonoPcm(self.samples), &mut encoded),
                _ => encoder.encode_to_vec(InterleavedPcm(self.samples), &mut encoded),
            }
            .map_err(mp3_error)?;
        }
        encoder
            .flush_to_vec::<FlushNoGap>(&mut encoded)
            .map_err(mp3_error)?;

        let mut output = BufWriter::new(File::create(path)?);
        output.write_all(&encoded)?;
        output.flush()?;
        Ok(())
    }
}

fn mp3_error<E: std::fmt::Display>(err: E) -> AudioSplitError {
    AudioSplitError::Mp3Encode(err.to_string())
}

/// Decode every sample of the default track of `path`.
pub fn decode(path: &Path) -> Result<DecodedAudio, AudioSplitError> {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| match err {
            SymphoniaError::Unsupported(_) => AudioSplitError::UnsupportedFormat,
            other => AudioSplitError::from(other),
        })?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or(AudioSplitError::MissingDefaultTrack)?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(AudioSplitError::UnsupportedCodec);
    }

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioSplitError::MissingSampleRate)?;
    let mut channels = track
        .codec_params
        .channels
        .map(|channels| channels.count())
        .unwrap_or(1);

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    // Header frame counts are not trusted; streamed WAVs often claim 4 GiB.
    let mut samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<(usize, SampleBuffer<i16>)> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(err) => return Err(AudioSplitError::from(err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!("skipping undecodable packet: {reason}");
                continue;
            }
            Err(err) => return Err(AudioSplitError::from(err)),
        };

        let capacity = decoded.capacity();
        let spec = *decoded.spec();
        channels = spec.channels.count();
        if sample_buf.as_ref().map_or(true, |(cap, _)| *cap != capacity) {
            sample_buf = Some((capacity, SampleBuffer::<i16>::new(capacity as u64, spec)));
        }
        if let Some((_, buf)) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let audio = DecodedAudio::from_samples(samples, channels, sample_rate);
    debug!(
        "decoded '{}': {} frame(s), {} channel(s) at {} Hz",
        path.display(),
        audio.frames(),
        audio.channels(),
        audio.sample_rate()
    );
    Ok(audio)
}
