use std::path::PathBuf;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(
        display = "Search directory {:?} must be an absolute path to an existing directory.",
        _0
    )]
    SearchPathInvalid(PathBuf),
    #[fail(display = "{:?} was not found in any registered search directory.", _0)]
    NotFound(PathBuf),
    #[fail(
        display = "No loader kind named '{}'. Available kinds: {}.",
        requested, available
    )]
    UnsupportedKind {
        requested: String,
        available: String,
    },
    #[fail(display = "No loader supports the file extension of {:?}.", _0)]
    NoLoaderFound(PathBuf),
    #[fail(
        display = "Program description supplies neither 'path' nor any per-stage shader path."
    )]
    ProgramPathMissing,
    #[fail(
        display = "Shader source {:?} must start with a #version pragma (line {}).",
        path, line
    )]
    MissingVersionPragma { path: PathBuf, line: usize },
    #[fail(display = "Include depth exceeded 100 levels resolving \"{}\"; circular include?", _0)]
    IncludeDepthExceeded(String),
    #[fail(display = "Malformed glTF: {}.", _0)]
    MalformedGltf(String),
    #[fail(display = "Unsupported glTF version '{}', only 2.0 is supported.", _0)]
    UnsupportedGltfVersion(String),
    #[fail(display = "Required glTF extension '{}' is not supported.", _0)]
    UnsupportedExtension(String),
    #[fail(display = "Malformed scene file: {}.", _0)]
    MalformedScene(String),
    #[fail(
        display = "Layered texture description (path {:?}) supplies no layer files.",
        _0
    )]
    EmptyLayerList(PathBuf),
    #[fail(
        display = "{:?} has {} color components where {} were expected.",
        path, found, expected
    )]
    ComponentMismatch {
        path: PathBuf,
        expected: u8,
        found: u8,
    },
    #[fail(
        display = "{:?} is {}x{} pixels where {}x{} were expected.",
        path, found_w, found_h, expected_w, expected_h
    )]
    DimensionMismatch {
        path: PathBuf,
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },
    #[fail(display = "Image: {}", _0)]
    Image(String),
    #[fail(display = "{}", _0)]
    Io(#[cause] ::std::io::Error),
    #[fail(display = "{}", _0)]
    Json(#[cause] ::serde_json::Error),
    #[fail(display = "{}", _0)]
    Video(#[cause] crate::video::errors::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<crate::video::errors::Error> for Error {
    fn from(err: crate::video::errors::Error) -> Self {
        Error::Video(err)
    }
}

impl From<::image::ImageError> for Error {
    fn from(err: ::image::ImageError) -> Self {
        Error::Image(format!("{}", err))
    }
}
