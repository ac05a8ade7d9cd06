use serde::Serialize;
use std::path::{Path, PathBuf};

/// Audio formats accepted by the scanner and the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Flac,
    Wav,
    M4a,
    Aac,
    Ogg,
}

impl AudioFormat {
    /// Infer the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            "wav" => Some(AudioFormat::Wav),
            "m4a" => Some(AudioFormat::M4a),
            "aac" => Some(AudioFormat::Aac),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Aac => "aac",
            AudioFormat::Ogg => "ogg",
        }
    }
}

/// Check if a file is an audio file based on extension
pub fn is_audio_file(path: &Path) -> bool {
    AudioFormat::from_path(path).is_some()
}

/// A file found by a scan or a watcher event that may become a song.
///
/// Never persisted; lives only for the duration of a scan or an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub path: PathBuf,
    pub format: AudioFormat,
}

impl ImportCandidate {
    /// Build a candidate if the path carries an allowed audio extension
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let format = AudioFormat::from_path(&path)?;
        Some(Self { path, format })
    }
}

/// Result of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Added,
    Duplicate,
    Failed(String),
}

/// Counters for one batch run.
///
/// Owned by the pipeline; consumers only ever see copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatistics {
    pub added: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub total: usize,
}

impl BatchStatistics {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Added => self.added += 1,
            FileOutcome::Duplicate => self.duplicates += 1,
            FileOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// Files handled so far, whatever their outcome
    pub fn processed(&self) -> usize {
        self.added + self.duplicates + self.errors
    }
}

/// Events delivered across the UI boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ImportNotification {
    #[serde(rename_all = "camelCase")]
    BatchStarted { total: usize, is_initial_scan: bool },
    BatchProgress {
        processed: usize,
        total: usize,
        added: usize,
        duplicates: usize,
        errors: usize,
    },
    BatchComplete {
        added: usize,
        duplicates: usize,
        errors: usize,
        total: usize,
    },
    #[serde(rename_all = "camelCase")]
    SingleFileAdded { path: PathBuf, display_name: String },
    /// Emitted after a watcher batch that added at least one song
    SongsBatchAdded { paths: Vec<PathBuf> },
}

impl ImportNotification {
    pub(crate) fn progress(stats: &BatchStatistics) -> Self {
        ImportNotification::BatchProgress {
            processed: stats.processed(),
            total: stats.total,
            added: stats.added,
            duplicates: stats.duplicates,
            errors: stats.errors,
        }
    }

    pub(crate) fn complete(stats: &BatchStatistics) -> Self {
        ImportNotification::BatchComplete {
            added: stats.added,
            duplicates: stats.duplicates,
            errors: stats.errors,
            total: stats.total,
        }
    }

    pub(crate) fn single_file_added(path: PathBuf) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        ImportNotification::SingleFileAdded { path, display_name }
    }

    /// Whether this event belongs to a batch run (as opposed to a single file)
    pub fn is_batch_event(&self) -> bool {
        !matches!(self, ImportNotification::SingleFileAdded { .. })
    }
}
