// Audio decoder using Symphonia
// Decodes audio files packet by packet and feeds them to rodio as a Source

use rodio::Source;
use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::backend::PlaybackError;

pub struct AudioDecoder {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    duration_ms: Option<u64>,
}

impl AudioDecoder {
    /// Open an audio file and prepare for decoding
    pub fn open(path: &Path) -> Result<Self, PlaybackError> {
        let decode_err = |message: String| PlaybackError::Decode {
            path: path.display().to_string(),
            message,
        };

        let file = File::open(path).map_err(|_| PlaybackError::SourceNotFound(path.to_path_buf()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint using the file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| decode_err(format!("Failed to probe file format: {}", e)))?;
        let format = probed.format;

        // Find the first audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| decode_err("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
        let duration_ms = track
            .codec_params
            .n_frames
            .map(|frames| (frames as f64 / sample_rate as f64 * 1000.0) as u64);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_err(format!("Failed to create decoder: {}", e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration_ms,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Decode next packet, returns interleaved f32 samples
    /// Returns None when end of stream is reached
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, PlaybackError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None); // End of stream
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(self.error(format!("Failed to read packet: {}", e))),
            };

            // Skip packets from other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => return Ok(Some(audio_buf_to_f32(&decoded))),
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::debug!("Decode error in {:?} (skipping packet): {}", self.path, e);
                    continue;
                }
                Err(e) => return Err(self.error(format!("Decode failed: {}", e))),
            }
        }
    }

    fn error(&self, message: String) -> PlaybackError {
        PlaybackError::Decode {
            path: self.path.display().to_string(),
            message,
        }
    }
}

/// Streams a decoder's output into rodio one packet at a time
pub struct DecodedSource {
    decoder: AudioDecoder,
    buffer: Vec<f32>,
    position: usize,
    done: bool,
}

impl DecodedSource {
    pub fn new(decoder: AudioDecoder) -> Self {
        let mut source = Self {
            decoder,
            buffer: Vec::new(),
            position: 0,
            done: false,
        };
        source.refill();
        source
    }

    /// Load the next non-empty packet. The buffer is only empty once the
    /// stream is over, so rodio never sees a zero-length frame mid-stream.
    fn refill(&mut self) {
        self.buffer.clear();
        self.position = 0;
        while !self.done {
            match self.decoder.decode_next() {
                Ok(Some(samples)) if samples.is_empty() => continue,
                Ok(Some(samples)) => {
                    self.buffer = samples;
                    return;
                }
                Ok(None) => self.done = true,
                Err(e) => {
                    // End the sound early rather than stall the sink
                    tracing::warn!("{}", e);
                    self.done = true;
                }
            }
        }
    }
}

impl Iterator for DecodedSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = *self.buffer.get(self.position)?;
        self.position += 1;
        if self.position >= self.buffer.len() {
            self.refill();
        }
        Some(sample)
    }
}

impl Source for DecodedSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.buffer.len() - self.position)
    }

    fn channels(&self) -> u16 {
        self.decoder.channels() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.decoder.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.decoder.duration_ms().map(Duration::from_millis)
    }
}

/// Convert any AudioBufferRef to interleaved f32 samples
fn audio_buf_to_f32(buf: &AudioBufferRef) -> Vec<f32> {
    match buf {
        AudioBufferRef::F32(b) => interleave(b.planes(), b.frames(), |s: f32| s),
        AudioBufferRef::F64(b) => interleave(b.planes(), b.frames(), |s: f64| s as f32),
        AudioBufferRef::S8(b) => interleave(b.planes(), b.frames(), |s: i8| s as f32 / 128.0),
        AudioBufferRef::S16(b) => interleave(b.planes(), b.frames(), |s: i16| s as f32 / 32768.0),
        AudioBufferRef::S24(b) => interleave(b.planes(), b.frames(), |s| s.inner() as f32 / 8388608.0),
        AudioBufferRef::S32(b) => {
            interleave(b.planes(), b.frames(), |s: i32| s as f32 / 2147483648.0)
        }
        AudioBufferRef::U8(b) => interleave(b.planes(), b.frames(), |s: u8| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(b) => {
            interleave(b.planes(), b.frames(), |s: u16| (s as f32 - 32768.0) / 32768.0)
        }
        AudioBufferRef::U24(b) => {
            interleave(b.planes(), b.frames(), |s| (s.inner() as f32 - 8388608.0) / 8388608.0)
        }
        AudioBufferRef::U32(b) => interleave(b.planes(), b.frames(), |s: u32| {
            (s as f64 - 2147483648.0) as f32 / 2147483648.0
        }),
    }
}

fn interleave<T: Sample + Copy, F: Fn(T) -> f32>(
    planes: AudioPlanes<T>,
    frames: usize,
    convert: F,
) -> Vec<f32> {
    let planes = planes.planes();
    if planes.is_empty() || frames == 0 {
        return vec![];
    }

    let mut interleaved = Vec::with_capacity(frames * planes.len());
    for frame in 0..frames {
        for plane in planes {
            interleaved.push(convert(plane[frame]));
        }
    }
    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let result = AudioDecoder::open(Path::new("/definitely/not/here.ogg"));
        assert!(matches!(result, Err(PlaybackError::SourceNotFound(_))));
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"this is not audio at all").unwrap();
        assert!(matches!(
            AudioDecoder::open(&path),
            Err(PlaybackError::Decode { .. })
        ));
    }

    #[test]
    fn test_decodes_wav_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, pcm16_wav(&[0, 16384, -16384, 32767], 8000, 1)).unwrap();

        let decoder = AudioDecoder::open(&path).unwrap();
        assert_eq!(decoder.sample_rate(), 8000);
        assert_eq!(decoder.channels(), 1);

        let source = DecodedSource::new(decoder);
        assert_eq!(source.channels(), 1);
        let samples: Vec<f32> = source.collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -0.5);
    }

    /// Minimal 16-bit PCM WAV file
    fn pcm16_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let byte_rate = sample_rate * channels as u32 * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&(channels * 2).to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            wav.extend_from_slice(&s.to_le_bytes());
        }
        wav
    }
}
