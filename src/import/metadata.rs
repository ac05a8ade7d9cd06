//! Audio metadata extraction.
//!
//! `SymphoniaExtractor` probes the container for duration, standard tags and
//! embedded artwork. MP3 files whose tags symphonia could not surface fall back to
//! reading ID3 frames directly.

use id3::TagLike;
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to probe audio file: {0}")]
    Probe(String),
    #[error("No audio track found")]
    NoTrack,
}

/// Embedded cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub data: Vec<u8>,
    /// MIME type, e.g. `image/jpeg`
    pub format: String,
}

/// Tags read from a file. Missing tags stay `None`; defaults are applied when
/// the song record is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_seconds: f64,
    pub cover_image: Option<CoverImage>,
}

/// Reads metadata from an audio file.
///
/// Called from a blocking thread; implementations may do synchronous I/O.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<AudioMetadata, ExtractionError>;
}

/// Extractor backed by symphonia's probe, with an id3 fallback for MP3 tags.
#[derive(Debug, Default, Clone)]
pub struct SymphoniaExtractor;

impl SymphoniaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for SymphoniaExtractor {
    fn extract(&self, path: &Path) -> Result<AudioMetadata, ExtractionError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ExtractionError::Probe(e.to_string()))?;

        let track = probed.format.default_track().ok_or(ExtractionError::NoTrack)?;

        let duration_seconds = match (track.codec_params.n_frames, track.codec_params.sample_rate)
        {
            (Some(frames), Some(rate)) if rate > 0 => frames as f64 / rate as f64,
            _ => {
                debug!("No frame count for {:?}, duration unknown", path);
                0.0
            }
        };

        let mut metadata = AudioMetadata {
            duration_seconds,
            ..AudioMetadata::default()
        };

        // Tags found while probing (e.g. ID3v2 ahead of the stream) come first,
        // then whatever the container itself carries
        if let Some(revision) = probed.metadata.get().as_ref().and_then(|m| m.current()) {
            apply_revision(&mut metadata, revision);
        }
        if let Some(revision) = probed.format.metadata().current() {
            apply_revision(&mut metadata, revision);
        }

        if metadata.title.is_none() && is_mp3(path) {
            apply_id3_tags(&mut metadata, path);
        }

        Ok(metadata)
    }
}

fn apply_revision(metadata: &mut AudioMetadata, revision: &MetadataRevision) {
    for tag in revision.tags() {
        let slot = match tag.std_key {
            Some(StandardTagKey::TrackTitle) => &mut metadata.title,
            Some(StandardTagKey::Artist) => &mut metadata.artist,
            Some(StandardTagKey::AlbumArtist) if metadata.artist.is_none() => {
                &mut metadata.artist
            }
            Some(StandardTagKey::Album) => &mut metadata.album,
            _ => continue,
        };
        if slot.is_none() {
            let value = tag.value.to_string();
            if !value.trim().is_empty() {
                *slot = Some(value);
            }
        }
    }

    if metadata.cover_image.is_none() {
        if let Some(visual) = revision.visuals().first() {
            metadata.cover_image = Some(CoverImage {
                data: visual.data.to_vec(),
                format: visual.media_type.clone(),
            });
        }
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp3"))
        .unwrap_or(false)
}

/// Fill gaps from ID3 frames
fn apply_id3_tags(metadata: &mut AudioMetadata, path: &Path) {
    match id3::Tag::read_from_path(path) {
        Ok(tag) => {
            for frame in tag.frames() {
                let slot = match frame.id() {
                    "TIT2" => &mut metadata.title,
                    "TPE1" | "TPE2" => &mut metadata.artist,
                    "TALB" => &mut metadata.album,
                    _ => continue,
                };
                if slot.is_none() {
                    if let Some(text) = frame.content().text() {
                        *slot = Some(text.to_string());
                    }
                }
            }

            if metadata.cover_image.is_none() {
                if let Some(picture) = tag.pictures().next() {
                    metadata.cover_image = Some(CoverImage {
                        data: picture.data.clone(),
                        format: picture.mime_type.clone(),
                    });
                }
            }
        }
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => {
            // No tags found, not an error
        }
        Err(e) => {
            warn!("Failed to read MP3 metadata from {:?}: {}", path, e);
        }
    }
}
