use std::path::{Path, PathBuf};

use bevy_math::Vec2;
use bot::{SegmentKind, Track, TrackBuilder, TrackError};
use serde::{Deserialize, Serialize};
use tracing::warn;

const BUILTIN_OVAL: &str = include_str!("../assets/tracks/oval.toml");
const BUILTIN_KINK: &str = include_str!("../assets/tracks/kink.toml");

/// Largest gap between the last segment's end and the first segment's start
/// before a loaded track is reported as not closed.
const CLOSURE_TOLERANCE: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum TrackFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse track: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("segment {index}: {reason}")]
    Segment { index: usize, reason: String },

    #[error(transparent)]
    Track(#[from] TrackError),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackFile {
    #[serde(default)]
    pub metadata: TrackMetadata,
    pub segments: Vec<SegmentSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_track_width")]
    pub track_width: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub start: [f32; 2],
    #[serde(default)]
    pub start_heading_deg: f32,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: String::new(),
            track_width: default_track_width(),
            friction: default_friction(),
            start: [0.0, 0.0],
            start_heading_deg: 0.0,
        }
    }
}

/// One piece of track as written in the file. `split` lays it out as that many
/// equal segments; `width` and `friction` override the metadata defaults.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SegmentSpec {
    pub kind: SegmentKind,
    #[serde(default)]
    pub length: f32,
    #[serde(default)]
    pub radius: f32,
    #[serde(default)]
    pub arc_deg: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub friction: Option<f32>,
    #[serde(default = "default_split")]
    pub split: u32,
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_track_width() -> f32 {
    12.0
}

fn default_friction() -> f32 {
    1.0
}

fn default_split() -> u32 {
    1
}

impl TrackFile {
    /// Load a track from a TOML file.
    pub fn load(path: &Path) -> Result<Self, TrackFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| TrackFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, TrackFileError> {
        Ok(toml::from_str(text)?)
    }

    /// The oval shipped with the host.
    pub fn load_builtin() -> Result<Self, TrackFileError> {
        Self::from_toml(BUILTIN_OVAL)
    }

    /// Look up a shipped track by name.
    pub fn builtin(name: &str) -> Option<Result<Self, TrackFileError>> {
        match name {
            "oval" => Some(Self::from_toml(BUILTIN_OVAL)),
            "kink" => Some(Self::from_toml(BUILTIN_KINK)),
            _ => None,
        }
    }

    /// Lay the segments out into a [`Track`].
    pub fn to_track(&self) -> Result<Track, TrackFileError> {
        let meta = &self.metadata;
        let mut builder = TrackBuilder::new(&meta.name, meta.track_width, meta.friction).start_at(
            Vec2::new(meta.start[0], meta.start[1]),
            meta.start_heading_deg.to_radians(),
        );

        for (index, spec) in self.segments.iter().enumerate() {
            if spec.split == 0 {
                return Err(TrackFileError::Segment {
                    index,
                    reason: "split must be at least 1".to_string(),
                });
            }
            let width = spec.width.unwrap_or(meta.track_width);
            let friction = spec.friction.unwrap_or(meta.friction);
            let pieces = spec.split as f32;
            for _ in 0..spec.split {
                builder = match spec.kind {
                    SegmentKind::Straight => {
                        builder.straight_with(spec.length / pieces, width, friction)
                    }
                    kind => builder.curve_with(
                        kind,
                        spec.radius,
                        spec.arc_deg.to_radians() / pieces,
                        width,
                        friction,
                    ),
                };
            }
        }

        let track = builder.build()?;
        let gap = track.closure_gap();
        if gap > CLOSURE_TOLERANCE {
            warn!(track = track.name(), gap, "track does not close");
        }
        Ok(track)
    }
}
