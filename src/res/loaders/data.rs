//! Raw data files: text, bytes, or parsed JSON.

use std::fs;

use crate::res::desc::{DataDesc, DataKind};
use crate::res::errors::Result;
use crate::res::finder::SearchPaths;

/// The loaded contents of a data resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Text(String),
    Binary(Vec<u8>),
    Json(::serde_json::Value),
}

pub fn load(paths: &SearchPaths, desc: &DataDesc, kind: DataKind) -> Result<Data> {
    let path = paths.locate(&desc.path)?;
    info!("Loads data {:?} as {:?}.", desc.path, kind);

    match kind {
        DataKind::Text => Ok(Data::Text(fs::read_to_string(&path)?)),
        DataKind::Binary => Ok(Data::Binary(fs::read(&path)?)),
        DataKind::Json => {
            let text = fs::read_to_string(&path)?;
            Ok(Data::Json(::serde_json::from_str(&text)?))
        }
    }
}
