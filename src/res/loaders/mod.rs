//! Concrete loaders, one module per resource category. Scene loaders
//! (glTF/OBJ/STL) are the involved ones; textures, programs and raw data
//! are thin wrappers over decoding plus a device upload.

pub mod data;
pub mod gltf;
pub mod obj;
pub mod program;
pub mod stl;
pub mod texture;

use std::fs;
use std::io::Read;
use std::path::Path;

use super::errors::Result;

/// Reads a file fully, transparently gunzipping `.gz` paths.
pub(crate) fn read_maybe_gz(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path)?;

    let gz = path
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if gz {
        let mut decoded = Vec::new();
        ::flate2::read::GzDecoder::new(&raw[..]).read_to_end(&mut decoded)?;
        Ok(decoded)
    } else {
        Ok(raw)
    }
}
