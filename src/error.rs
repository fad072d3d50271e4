//! Error types for asset and config loading

use std::path::PathBuf;
use thiserror::Error;

/// Which index array a face corner points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Uv,
    Normal,
    Material,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexKind::Vertex => "vertex",
            IndexKind::Uv => "uv",
            IndexKind::Normal => "normal",
            IndexKind::Material => "material",
        };
        f.write_str(name)
    }
}

/// Errors from mesh and texture loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Face {face} references {kind} index {index}, but only {len} exist")]
    IndexOutOfRange {
        face: usize,
        kind: IndexKind,
        index: usize,
        len: usize,
    },

    #[error("Unsupported mesh format: {0:?}")]
    UnsupportedFormat(String),

    #[error("Texture {name}: expected {expected} bytes of RGB data, got {actual}")]
    TextureSize {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Texture {name}: {width}x{height} RGB does not fit in memory")]
    TextureDimensions {
        name: String,
        width: usize,
        height: usize,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io { path: path.into(), source }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        LoadError::Parse { line, message: message.into() }
    }
}

/// Errors from reading or writing the RON config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
