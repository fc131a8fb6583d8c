//! # Audio Module
//!
//! The audio boundary of the game. The core only ever talks to an
//! [`AudioIo`] implementation: play a tone, record a buffer, rest.
//! [`CpalAudio`] implements it on top of CPAL (Cross-Platform Audio Library).
//!
//! ## Features
//! - Sine tone synthesis with short fades to avoid clicks
//! - Automatic device and stream configuration selection
//! - Blocking playback and recording bounded by a fixed timeout
//! - Multichannel input folded down to mono

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, SupportedStreamConfigRange};
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::error::{SeekError, SeekResult};

/// Extra time granted to a stream beyond its nominal duration before the
/// device is considered stuck.
const STREAM_SLACK: Duration = Duration::from_secs(2);

/// Length of the fade in and fade out applied to played tones.
const FADE_SECS: f32 = 0.01;

/// A mono recording (or synthesized tone) and its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// A buffer of silence.
    pub fn silence(duration_secs: f32, sample_rate: u32) -> Self {
        Self::new(vec![0.0; sample_count(duration_secs, sample_rate)], sample_rate)
    }

    /// Synthesizes a pure sine tone.
    ///
    /// The phase is computed in double precision so long tones stay
    /// in tune to the last sample.
    pub fn sine(frequency_hz: f32, duration_secs: f32, sample_rate: u32, amplitude: f32) -> Self {
        let step = 2.0 * std::f64::consts::PI * f64::from(frequency_hz) / f64::from(sample_rate.max(1));
        let samples = (0..sample_count(duration_secs, sample_rate))
            .map(|i| amplitude * (step * i as f64).sin() as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Applies a linear fade in and fade out of `fade_secs` to both ends.
    pub fn with_fade(mut self, fade_secs: f32) -> Self {
        let fade_len = sample_count(fade_secs, self.sample_rate).min(self.samples.len() / 2);
        if fade_len == 0 {
            return self;
        }
        let len = self.samples.len();
        for i in 0..fade_len {
            let gain = i as f32 / fade_len as f32;
            self.samples[i] *= gain;
            self.samples[len - 1 - i] *= gain;
        }
        self
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

fn sample_count(duration_secs: f32, sample_rate: u32) -> usize {
    if !(duration_secs > 0.0) || !duration_secs.is_finite() {
        return 0;
    }
    (f64::from(sample_rate) * f64::from(duration_secs)) as usize
}

/// The audio capability the game needs.
///
/// Calls block until the tone has played or the recording is complete.
/// Implementations must bound every call by a fixed duration.
pub trait AudioIo {
    /// Plays a sine tone at `frequency_hz` for `duration_secs`.
    fn play(&mut self, frequency_hz: f32, duration_secs: f32) -> SeekResult<()>;

    /// Records `duration_secs` of mono audio. The returned buffer carries the
    /// sample rate the device actually ran at, which may differ from
    /// `sample_rate` when the device cannot honour it.
    fn record(&mut self, duration_secs: f32, sample_rate: u32) -> SeekResult<AudioBuffer>;

    /// Pauses between phases of the game.
    fn rest(&mut self, secs: f32) {
        if secs > 0.0 && secs.is_finite() {
            thread::sleep(Duration::from_secs_f32(secs));
        }
    }
}

/// [`AudioIo`] backed by the default CPAL input and output devices.
pub struct CpalAudio {
    host: cpal::Host,
    volume: f32,
}

impl CpalAudio {
    /// Creates an audio backend on the default host.
    ///
    /// # Arguments
    /// * `volume` - Playback amplitude, clamped to 0.0..=1.0
    pub fn new(volume: f32) -> Self {
        Self {
            host: cpal::default_host(),
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Plays a tone on the default output device and blocks until it ends.
    fn play_tone(&self, frequency_hz: f32, duration_secs: f32) -> Result<()> {
        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;
        let supported = device
            .default_output_config()
            .context("Querying the default output configuration")?;

        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let tone = AudioBuffer::sine(frequency_hz, duration_secs, sample_rate, self.volume)
            .with_fade(FADE_SECS);
        debug!(frequency_hz, duration_secs, sample_rate, "Playing tone");

        let (events_tx, events_rx) = crossbeam_channel::bounded::<Result<(), String>>(2);
        let stream = match format {
            SampleFormat::F32 => build_tone_stream::<f32>(&device, &config, tone.samples, events_tx)?,
            SampleFormat::I16 => build_tone_stream::<i16>(&device, &config, tone.samples, events_tx)?,
            SampleFormat::U16 => build_tone_stream::<u16>(&device, &config, tone.samples, events_tx)?,
            other => bail!("Unsupported output sample format: {other:?}"),
        };
        stream.play().context("Starting the output stream")?;

        let timeout = Duration::from_secs_f32(duration_secs) + STREAM_SLACK;
        let outcome = events_rx.recv_timeout(timeout);

        // Give the device a moment to drain before tearing the stream down.
        thread::sleep(Duration::from_millis(50));
        if let Err(e) = stream.pause() {
            warn!("Error pausing output stream: {}", e);
        }
        drop(stream);

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => bail!("Output stream error: {message}"),
            Err(_) => bail!("Timed out after {timeout:?} waiting for playback to finish"),
        }
    }

    /// Records from the default input device and blocks until enough
    /// samples have arrived.
    fn capture(&self, duration_secs: f32, sample_rate: u32) -> Result<AudioBuffer> {
        let device = self
            .host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        info!("Using audio input device: {}", device.name()?);

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let (config, format): (cpal::StreamConfig, SampleFormat) =
            match find_supported_config(configs, sample_rate) {
                Some(range) => {
                    let format = range.sample_format();
                    let config: cpal::StreamConfig =
                        range.with_sample_rate(cpal::SampleRate(sample_rate)).into();
                    (config, format)
                }
                None => {
                    let fallback = device
                        .default_input_config()
                        .context("Querying the default input configuration")?;
                    warn!(
                        "No input format at {} Hz, falling back to {} Hz",
                        sample_rate,
                        fallback.sample_rate().0
                    );
                    let format = fallback.sample_format();
                    (fallback.into(), format)
                }
            };

        let actual_rate = config.sample_rate.0;
        info!("Selected sample rate: {} Hz", actual_rate);

        let (data_tx, data_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let (error_tx, error_rx) = crossbeam_channel::bounded::<String>(1);
        let stream = match format {
            SampleFormat::F32 => build_capture_stream::<f32>(&device, &config, data_tx, error_tx)?,
            SampleFormat::I16 => build_capture_stream::<i16>(&device, &config, data_tx, error_tx)?,
            SampleFormat::U16 => build_capture_stream::<u16>(&device, &config, data_tx, error_tx)?,
            other => bail!("Unsupported input sample format: {other:?}"),
        };
        stream.play().context("Starting the input stream")?;

        let needed = sample_count(duration_secs, actual_rate);
        let deadline = Instant::now() + Duration::from_secs_f32(duration_secs) + STREAM_SLACK;
        let mut samples = Vec::with_capacity(needed);

        let result = loop {
            if samples.len() >= needed {
                break Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            crossbeam_channel::select! {
                recv(data_rx) -> msg => match msg {
                    Ok(chunk) => samples.extend(chunk),
                    Err(_) => break Err(anyhow!("Input stream closed unexpectedly")),
                },
                recv(error_rx) -> msg => {
                    let message = msg.unwrap_or_else(|_| "stream dropped".to_string());
                    break Err(anyhow!("Input stream error: {message}"));
                },
                default(remaining) => {
                    break Err(anyhow!(
                        "Timed out waiting for microphone samples ({} of {} received)",
                        samples.len(),
                        needed
                    ));
                },
            }
        };

        if let Err(e) = stream.pause() {
            warn!("Error pausing input stream: {}", e);
        }
        drop(stream);
        result?;

        samples.truncate(needed);
        debug!(samples = samples.len(), sample_rate = actual_rate, "Recording complete");
        Ok(AudioBuffer::new(samples, actual_rate))
    }
}

impl AudioIo for CpalAudio {
    fn play(&mut self, frequency_hz: f32, duration_secs: f32) -> SeekResult<()> {
        self.play_tone(frequency_hz, duration_secs).map_err(device_error)
    }

    fn record(&mut self, duration_secs: f32, sample_rate: u32) -> SeekResult<AudioBuffer> {
        self.capture(duration_secs, sample_rate).map_err(device_error)
    }
}

fn device_error(err: anyhow::Error) -> SeekError {
    SeekError::Device(format!("{err:#}"))
}

/// Builds an output stream that plays `samples` on every channel, then
/// silence. The first completion (or stream error) is sent on `events`.
fn build_tone_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Vec<f32>,
    events: Sender<Result<(), String>>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels.max(1));
    let error_events = events.clone();
    let mut position = 0;
    let mut finished = false;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let value = samples.get(position).copied().unwrap_or(0.0);
                position += 1;
                for sample in frame.iter_mut() {
                    *sample = T::from_sample(value);
                }
            }
            if !finished && position >= samples.len() {
                finished = true;
                let _ = events.try_send(Ok(()));
            }
        },
        move |err| {
            let _ = error_events.try_send(Err(err.to_string()));
        },
        None,
    )?;
    Ok(stream)
}

/// Builds an input stream that folds every frame to mono and sends the
/// converted chunks on `sender`.
fn build_capture_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sender: Sender<Vec<f32>>,
    errors: Sender<String>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = data
                .chunks(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / frame.len() as f32
                })
                .collect::<Vec<f32>>();
            let _ = sender.send(mono);
        },
        move |err| {
            let _ = errors.try_send(err.to_string());
        },
        None,
    )?;
    Ok(stream)
}

/// Finds the best supported input configuration for the target sample rate.
///
/// Only ranges that contain `target_rate` and use a sample format we can
/// convert are considered. Among those, 32-bit float is preferred, then
/// the fewest channels.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| {
            c.min_sample_rate().0 <= target_rate
                && target_rate <= c.max_sample_rate().0
                && matches!(
                    c.sample_format(),
                    SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
                )
        })
        .min_by_key(|c| (c.sample_format() != SampleFormat::F32, c.channels()))
}
