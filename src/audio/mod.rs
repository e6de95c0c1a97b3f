mod source;

pub use source::{InlineSource, probe_duration};
#[cfg(test)]
pub(crate) use source::wav_bytes;

use anyhow::{Context, Result};
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
#[cfg(unix)]
use std::ffi::CString;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const MAX_VOLUME: f32 = 1.0;

pub trait AudioEngine {
    fn load(&mut self, source: InlineSource) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn eject(&mut self);
    fn is_paused(&self) -> bool;
    fn is_loaded(&self) -> bool;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn output_name(&self) -> Option<String>;
    fn is_finished(&self) -> bool;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    source: Option<InlineSource>,
    track_duration: Option<Duration>,
    volume: f32,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let (stream, sink) = Self::open_output_stream()?;

        Ok(Self {
            stream,
            sink,
            source: None,
            track_duration: None,
            volume: 1.0,
        })
    }

    fn open_output_stream() -> Result<(OutputStream, Sink)> {
        let mut stream = with_silenced_stderr(|| {
            let host = rodio::cpal::default_host();
            match OutputStreamBuilder::from_default_device()
                .context("failed to open default system output stream")
                .and_then(|builder| {
                    builder
                        .with_error_callback(|_| {})
                        .open_stream_or_fallback()
                        .context("failed to start default output stream")
                }) {
                Ok(stream) => Ok(stream),
                Err(default_err) => {
                    warn!("default output failed, trying other devices: {default_err:#}");
                    let mut candidates: Vec<String> = host
                        .output_devices()
                        .ok()
                        .into_iter()
                        .flatten()
                        .filter_map(|device| device.name().ok())
                        .collect();
                    candidates.sort_by_cached_key(|name| {
                        let lower = name.to_ascii_lowercase();
                        let rank = if lower.contains("pulse") {
                            0_u8
                        } else if lower.contains("pipewire") {
                            1_u8
                        } else if lower.contains("default") {
                            2_u8
                        } else {
                            3_u8
                        };
                        (rank, lower)
                    });
                    candidates.dedup();

                    let mut started: Option<OutputStream> = None;
                    for candidate in candidates {
                        let Some(device) = host
                            .output_devices()
                            .ok()
                            .into_iter()
                            .flatten()
                            .find(|entry| entry.name().ok().as_deref() == Some(candidate.as_str()))
                        else {
                            continue;
                        };
                        let opened = OutputStreamBuilder::from_device(device)
                            .context("failed to open fallback output device")
                            .and_then(|builder| {
                                builder
                                    .with_error_callback(|_| {})
                                    .open_stream_or_fallback()
                                    .context("failed to start fallback output stream")
                            });
                        if let Ok(stream) = opened {
                            debug!("using fallback output device {candidate}");
                            started = Some(stream);
                            break;
                        }
                    }

                    started.with_context(|| {
                        format!(
                            "unable to start any audio output stream after default failed: {default_err:#}"
                        )
                    })
                }
            }
        })?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok((stream, sink))
    }

    fn decode(source: &InlineSource) -> Result<Decoder<std::io::Cursor<std::sync::Arc<[u8]>>>> {
        Decoder::builder()
            .with_data(source.cursor())
            .with_byte_len(source.len() as u64)
            .with_mime_type(source.mime())
            .with_seekable(true)
            .build()
            .with_context(|| format!("failed to decode {} stream", source.mime()))
    }

    fn bind_paused(&mut self, source: &InlineSource) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.pause();

        let decoder = Self::decode(source)?;
        self.track_duration = decoder
            .total_duration()
            .filter(|duration| !duration.is_zero())
            .or_else(|| probe_duration(source));
        self.sink.append(decoder);
        self.sink.set_volume(self.volume);
        Ok(())
    }
}

impl AudioEngine for RodioAudioEngine {
    fn load(&mut self, source: InlineSource) -> Result<()> {
        self.source = None;
        self.bind_paused(&source)?;
        debug!(
            mime = source.mime(),
            bytes = source.len(),
            duration = ?self.track_duration,
            "bound inline source"
        );
        self.source = Some(source);
        Ok(())
    }

    fn play(&mut self) {
        if self.source.is_some() {
            self.sink.play();
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        if let Err(err) = self.bind_paused(&source) {
            warn!("failed to rewind track: {err:#}");
            self.eject();
        }
    }

    fn eject(&mut self) {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.source = None;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    fn position(&self) -> Option<Duration> {
        self.source.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.source.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        let target = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.sink
            .try_seek(target)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))?;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sink.set_volume(self.volume);
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("System default output (CPAL)"))
    }

    fn is_finished(&self) -> bool {
        self.source.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

pub struct NullAudioEngine {
    paused: bool,
    source: Option<InlineSource>,
    volume: f32,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self {
            paused: true,
            source: None,
            volume: 1.0,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.source.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for NullAudioEngine {
    fn load(&mut self, source: InlineSource) -> Result<()> {
        self.track_duration = probe_duration(&source);
        self.source = Some(source);
        self.paused = true;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) {
        if self.source.is_some() && self.paused {
            self.started_at = Some(Instant::now());
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn stop(&mut self) {
        self.paused = true;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
    }

    fn eject(&mut self) {
        self.stop();
        self.source = None;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    fn position(&self) -> Option<Duration> {
        self.source.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.source.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("Null audio engine"))
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.source.is_some() && !self.paused && self.current_position() >= duration
    }
}
