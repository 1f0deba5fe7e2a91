//! Assembled audio artifacts.
//!
//! Once a capture session stops, its chunks are concatenated into a single
//! in-memory WAV blob with a timestamped filename, ready for playback or
//! saving. Each new recording replaces the previous artifact.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// An in-memory WAV clip assembled from captured audio chunks.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Complete WAV file contents (header + PCM data).
    wav_bytes: Vec<u8>,
    /// Timestamped filename the clip is saved under.
    filename: String,
    /// Number of mono samples in the clip.
    sample_count: usize,
    /// Sample rate of the clip in Hz.
    sample_rate: u32,
}

impl AudioArtifact {
    /// Assembles captured chunks into one WAV blob.
    ///
    /// Returns `None` when the chunks hold no samples; a stop with nothing
    /// captured produces no artifact (the caller keeps any previous one).
    ///
    /// # Errors
    /// - If WAV encoding fails
    pub fn assemble(chunks: &[Vec<i16>], sample_rate: u32) -> Result<Option<Self>> {
        let sample_count: usize = chunks.iter().map(Vec::len).sum();
        if sample_count == 0 {
            tracing::warn!("Capture stopped with no samples, no artifact produced");
            return Ok(None);
        }

        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, wav_spec)?;
            for chunk in chunks {
                for &sample in chunk {
                    writer.write_sample(sample)?;
                }
            }
            writer.finalize()?;
        }

        let filename = format!("audio_{}.wav", Local::now().format("%Y-%m-%dT%H-%M-%S"));
        let artifact = Self {
            wav_bytes: cursor.into_inner(),
            filename,
            sample_count,
            sample_rate,
        };

        tracing::info!(
            "Artifact assembled: {} ({:.2}s, {} bytes)",
            artifact.filename,
            artifact.duration_secs(),
            artifact.wav_bytes.len()
        );
        Ok(Some(artifact))
    }

    /// Timestamped filename for the clip.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate as f32
    }

    /// Size of the encoded clip in bytes.
    pub fn size_bytes(&self) -> usize {
        self.wav_bytes.len()
    }

    /// Writes the clip into `dir` under its timestamped filename.
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the file cannot be written
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create recordings directory {}", dir.display()))?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.wav_bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Artifact saved: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_samples(wav_bytes: &[u8]) -> (hound::WavSpec, Vec<i16>) {
        let reader = hound::WavReader::new(Cursor::new(wav_bytes.to_vec())).unwrap();
        let spec = reader.spec();
        let samples = reader.into_samples::<i16>().map(Result::unwrap).collect();
        (spec, samples)
    }

    #[test]
    fn assemble_concatenates_chunks_in_order() {
        let chunks = vec![vec![1i16, 2, 3], vec![4i16, 5]];
        let artifact = AudioArtifact::assemble(&chunks, 16000).unwrap().unwrap();

        let (spec, samples) = read_samples(&artifact.wav_bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(samples, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn assemble_with_no_chunks_produces_no_artifact() {
        assert!(AudioArtifact::assemble(&[], 16000).unwrap().is_none());
    }

    #[test]
    fn assemble_with_only_empty_chunks_produces_no_artifact() {
        let chunks = vec![Vec::new(), Vec::new()];
        assert!(AudioArtifact::assemble(&chunks, 16000).unwrap().is_none());
    }

    #[test]
    fn duration_reflects_sample_count_and_rate() {
        let chunks = vec![vec![0i16; 8000]];
        let artifact = AudioArtifact::assemble(&chunks, 16000).unwrap().unwrap();
        assert!((artifact.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn filename_is_timestamped_wav() {
        let chunks = vec![vec![0i16; 10]];
        let artifact = AudioArtifact::assemble(&chunks, 16000).unwrap().unwrap();
        assert!(artifact.filename().starts_with("audio_"));
        assert!(artifact.filename().ends_with(".wav"));
    }

    #[test]
    fn save_into_writes_playable_file() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = vec![vec![7i16; 100]];
        let artifact = AudioArtifact::assemble(&chunks, 16000).unwrap().unwrap();

        let path = artifact.save_into(dir.path()).unwrap();
        assert!(path.exists());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 100);
    }
}
