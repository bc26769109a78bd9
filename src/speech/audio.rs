//! Audio device access: microphone capture and synthesized-speech playback.
//!
//! Capture runs entirely on a blocking thread. A short-lived cpal stream
//! feeds sample chunks through a channel to a silence-based endpointer,
//! and the finished utterance is downmixed and resampled to the mono
//! 16 kHz PCM the recognition service expects. Device handles are opened
//! per call and released before returning.

use crate::error::{Result, SvarError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::io::Cursor;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sample rate the recognition service expects for uploaded audio.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// RMS amplitude above which a chunk counts as speech.
const SPEECH_RMS_THRESHOLD: f32 = 0.01;

/// How long to wait for speech to start before giving up.
const INITIAL_SILENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Trailing silence that ends an utterance once speech has started.
const TRAILING_SILENCE: Duration = Duration::from_millis(900);

/// Hard cap on a single utterance.
const MAX_UTTERANCE: Duration = Duration::from_secs(15);

/// Audio kept from just before speech onset so the first word is not clipped.
const PRE_ROLL: Duration = Duration::from_millis(300);

/// Outcome of a microphone capture attempt.
#[derive(Debug)]
pub enum Capture {
    /// Mono samples at [`TARGET_SAMPLE_RATE`] containing the utterance.
    Utterance(Vec<i16>),
    /// The initial silence timeout expired before any speech was heard.
    Silence,
}

/// Name of the default audio input device, when one is present.
pub fn default_input_device_name() -> Option<String> {
    cpal::default_host()
        .default_input_device()
        .map(|device| device.name().unwrap_or_else(|_| "unknown".to_string()))
}

/// Name of the default audio output device, when one is present.
pub fn default_output_device_name() -> Option<String> {
    cpal::default_host()
        .default_output_device()
        .map(|device| device.name().unwrap_or_else(|_| "unknown".to_string()))
}

/// One-time microphone capability probe.
///
/// Never fails; absence of a device simply disables voice input.
pub fn detect_microphone() -> bool {
    match default_input_device_name() {
        Some(name) => {
            info!("Using microphone: {}", name);
            true
        }
        None => {
            debug!("No default audio input device detected");
            false
        }
    }
}

/// Record a single utterance from the default microphone.
///
/// Blocks until the speaker pauses, the initial silence timeout expires,
/// or the utterance cap is reached. The capture stream lives only for
/// the duration of this call.
pub fn capture_utterance() -> Result<Capture> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| SvarError::Audio("no input device available".to_string()))?;
    let supported = device
        .default_input_config()
        .map_err(|e| SvarError::Audio(format!("failed to query input config: {}", e)))?;
    let sample_format = supported.sample_format();
    let config = supported.config();
    let channels = config.channels as usize;
    let source_rate = config.sample_rate.0;

    debug!(
        "Capturing at {} Hz, {} channel(s), {:?}",
        source_rate, channels, sample_format
    );

    let (tx, rx) = bounded::<Vec<f32>>(64);

    let stream = match sample_format {
        SampleFormat::F32 => {
            let tx = tx.clone();
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.try_send(downmix(data, channels));
                },
                log_stream_error,
                None,
            )
        }
        SampleFormat::I16 => {
            let tx = tx.clone();
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let frames: Vec<f32> =
                        data.iter().map(|s| *s as f32 / i16::MAX as f32).collect();
                    let _ = tx.try_send(downmix(&frames, channels));
                },
                log_stream_error,
                None,
            )
        }
        SampleFormat::U16 => {
            let tx = tx.clone();
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let frames: Vec<f32> = data
                        .iter()
                        .map(|s| (*s as f32 - 32768.0) / 32768.0)
                        .collect();
                    let _ = tx.try_send(downmix(&frames, channels));
                },
                log_stream_error,
                None,
            )
        }
        other => {
            return Err(SvarError::Audio(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| SvarError::Audio(format!("failed to build input stream: {}", e)))?;
    drop(tx);

    stream
        .play()
        .map_err(|e| SvarError::Audio(format!("failed to start input stream: {}", e)))?;

    let collected = collect_utterance(&rx, source_rate);
    drop(stream);

    match collected? {
        Some(samples) => {
            let mono = resample(&samples, source_rate, TARGET_SAMPLE_RATE);
            debug!(
                "Captured {:.1}s of audio",
                mono.len() as f64 / TARGET_SAMPLE_RATE as f64
            );
            Ok(Capture::Utterance(to_pcm16(&mono)))
        }
        None => Ok(Capture::Silence),
    }
}

/// Drain chunks from the capture stream until the endpointer settles.
///
/// Returns None when the initial silence timeout expired. The wall-clock
/// deadline guards against a stream that stops delivering data entirely.
fn collect_utterance(rx: &Receiver<Vec<f32>>, sample_rate: u32) -> Result<Option<Vec<f32>>> {
    let mut endpointer = Endpointer::new(sample_rate);
    let preroll_cap = samples_for(PRE_ROLL, sample_rate);
    let mut preroll: Vec<f32> = Vec::new();
    let mut samples: Vec<f32> = Vec::new();
    let mut capturing = false;
    let deadline = Instant::now() + INITIAL_SILENCE_TIMEOUT + MAX_UTTERANCE;

    loop {
        let chunk = match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => {
                if Instant::now() >= deadline {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let decision = endpointer.push(&chunk);
        match decision {
            EndpointDecision::Waiting => {
                preroll.extend_from_slice(&chunk);
                if preroll.len() > preroll_cap {
                    let excess = preroll.len() - preroll_cap;
                    preroll.drain(..excess);
                }
            }
            EndpointDecision::Recording | EndpointDecision::Done => {
                if !capturing {
                    samples.append(&mut preroll);
                    capturing = true;
                }
                samples.extend_from_slice(&chunk);
                if decision == EndpointDecision::Done {
                    break;
                }
            }
            EndpointDecision::TimedOut => return Ok(None),
        }

        if Instant::now() >= deadline {
            break;
        }
    }

    if samples.is_empty() {
        return Err(SvarError::Audio("capture produced no samples".to_string()));
    }
    Ok(Some(samples))
}

fn log_stream_error(err: cpal::StreamError) {
    warn!("Audio input stream error: {}", err);
}

/// Encode mono 16-bit PCM samples as an in-memory WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| SvarError::Audio(format!("failed to create WAV writer: {}", e)))?;
    for sample in samples {
        writer
            .write_sample(*sample)
            .map_err(|e| SvarError::Audio(format!("failed to write WAV sample: {}", e)))?;
    }
    writer
        .finalize()
        .map_err(|e| SvarError::Audio(format!("failed to finalize WAV: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Play audio bytes on the default output device, blocking until done.
///
/// The output stream and sink live only for this call.
pub fn play_audio(bytes: Vec<u8>) -> Result<()> {
    let (_stream, handle) = rodio::OutputStream::try_default()
        .map_err(|e| SvarError::Audio(format!("no audio output available: {}", e)))?;
    let sink = rodio::Sink::try_new(&handle)
        .map_err(|e| SvarError::Audio(format!("failed to open audio sink: {}", e)))?;
    let source = rodio::Decoder::new(Cursor::new(bytes))
        .map_err(|e| SvarError::Audio(format!("failed to decode audio: {}", e)))?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

/// Silence-based endpointing over a stream of sample chunks.
///
/// Duration accounting is sample-based, keeping the decisions
/// independent of wall-clock jitter in the capture callback.
struct Endpointer {
    initial_silence_limit: usize,
    trailing_silence_limit: usize,
    max_utterance_limit: usize,
    samples_seen: usize,
    samples_since_voice: usize,
    speech_started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointDecision {
    /// No speech yet; keep waiting.
    Waiting,
    /// Speech in progress; keep the samples.
    Recording,
    /// The utterance is complete.
    Done,
    /// Waited too long without hearing anything.
    TimedOut,
}

impl Endpointer {
    fn new(sample_rate: u32) -> Self {
        Self {
            initial_silence_limit: samples_for(INITIAL_SILENCE_TIMEOUT, sample_rate),
            trailing_silence_limit: samples_for(TRAILING_SILENCE, sample_rate),
            max_utterance_limit: samples_for(MAX_UTTERANCE, sample_rate),
            samples_seen: 0,
            samples_since_voice: 0,
            speech_started: false,
        }
    }

    fn push(&mut self, chunk: &[f32]) -> EndpointDecision {
        self.samples_seen += chunk.len();
        if rms(chunk) >= SPEECH_RMS_THRESHOLD {
            self.speech_started = true;
            self.samples_since_voice = 0;
        } else if self.speech_started {
            self.samples_since_voice += chunk.len();
        }

        if !self.speech_started {
            if self.samples_seen >= self.initial_silence_limit {
                return EndpointDecision::TimedOut;
            }
            return EndpointDecision::Waiting;
        }
        if self.samples_since_voice >= self.trailing_silence_limit
            || self.samples_seen >= self.max_utterance_limit
        {
            return EndpointDecision::Done;
        }
        EndpointDecision::Recording
    }
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64) as usize
}

/// Average interleaved frames down to mono.
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Linear resampling; adequate for speech uploaded to the recognizer.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = samples[idx];
        let b = if idx + 1 < samples.len() {
            samples[idx + 1]
        } else {
            a
        };
        out.push(a + (b - a) * frac);
    }
    out
}

fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}
