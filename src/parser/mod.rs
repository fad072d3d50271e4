//! Mesh file parsing
//!
//! Formats are looked up by file extension in `FORMATS`. Every parser hands
//! its arrays to `Mesh::new`, so indices are validated once, at load time.

pub mod obj;

use std::path::Path;
use tracing::info;

use crate::error::LoadError;
use crate::scene::Mesh;

/// Parse a whole source file into a mesh
pub type ParseFn = fn(&str) -> Result<Mesh, LoadError>;

/// Lowercase extension -> parser
pub const FORMATS: &[(&str, ParseFn)] = &[("obj", obj::parse_obj)];

/// Parser for `path`, chosen by its extension
pub fn format_of(path: &Path) -> Result<ParseFn, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    FORMATS
        .iter()
        .find(|(name, _)| *name == ext)
        .map(|(_, parse)| *parse)
        .ok_or(LoadError::UnsupportedFormat(ext))
}

/// Extensions accepted by `parse_file`, for file dialogs
pub fn supported_extensions() -> Vec<&'static str> {
    FORMATS.iter().map(|(name, _)| *name).collect()
}

/// Read and parse a mesh file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Mesh, LoadError> {
    let path = path.as_ref();
    let parse = format_of(path)?;
    let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let mesh = parse(&source)?;

    info!(
        path = %path.display(),
        vertices = mesh.vertices().len(),
        faces = mesh.faces().len(),
        materials = mesh.materials().len(),
        "Loaded mesh"
    );
    Ok(mesh)
}
