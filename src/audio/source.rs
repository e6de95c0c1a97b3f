use anyhow::{Context, Result, bail};
use base64::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::codecs::CodecParameters;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSource {
    mime: String,
    bytes: Arc<[u8]>,
}

impl InlineSource {
    pub fn new(mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let Some(rest) = uri.strip_prefix("data:") else {
            bail!("not a data uri");
        };
        let Some((header, payload)) = rest.split_once(',') else {
            bail!("data uri has no payload separator");
        };
        let Some(mime) = header.strip_suffix(";base64") else {
            bail!("data uri is not base64 encoded");
        };
        if mime.is_empty() {
            bail!("data uri has no media type");
        }

        let bytes = BASE64_STANDARD
            .decode(payload)
            .context("failed to decode data uri payload")?;
        Ok(Self::new(mime, bytes))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64_STANDARD.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn cursor(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(Arc::clone(&self.bytes))
    }
}

pub fn probe_duration(source: &InlineSource) -> Option<Duration> {
    let stream = MediaSourceStream::new(
        Box::new(source.cursor()),
        MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    hint.mime_type(source.mime());

    let probed = get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    probed
        .format
        .default_track()
        .and_then(|track| codec_duration(&track.codec_params))
        .filter(|duration| !duration.is_zero())
}

fn codec_duration(codec_params: &CodecParameters) -> Option<Duration> {
    if let (Some(time_base), Some(frame_count)) = (codec_params.time_base, codec_params.n_frames) {
        let time = time_base.calc_time(frame_count);
        return Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac));
    }

    codec_params
        .n_frames
        .zip(codec_params.sample_rate)
        .filter(|(_, sample_rate)| *sample_rate > 0)
        .map(|(frame_count, sample_rate)| {
            Duration::from_secs_f64(frame_count as f64 / f64::from(sample_rate))
        })
}

#[cfg(test)]
pub(crate) fn wav_bytes(duration_ms: u32) -> Vec<u8> {
    let sample_rate: u32 = 44_100;
    let channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let bytes_per_sample = u32::from(bits_per_sample / 8);
    let total_samples = (u64::from(sample_rate) * u64::from(duration_ms) / 1_000) as u32;
    let data_size = total_samples * u32::from(channels) * bytes_per_sample;
    let byte_rate = sample_rate * u32::from(channels) * bytes_per_sample;
    let block_align = channels * (bits_per_sample / 8);
    let riff_chunk_size = 36_u32.saturating_add(data_size);

    let mut bytes = Vec::with_capacity((44_u32 + data_size) as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&riff_chunk_size.to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16_u32.to_le_bytes());
    bytes.extend_from_slice(&1_u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes.resize((44_u32 + data_size) as usize, 0_u8);
    bytes
}
