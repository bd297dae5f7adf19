#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Malformed vertex format token '{}'.", _0)]
    MalformedFormat(String),
    #[fail(
        display = "Buffer of {} bytes is not divisible by its declared vertex size of {} bytes.",
        size, vertex_size
    )]
    BufferMisaligned { size: usize, vertex_size: usize },
    #[fail(display = "Buffer layout declares no attributes.")]
    BufferEmpty,
    #[fail(
        display = "Layout declares {} formats but {} attribute names.",
        formats, names
    )]
    LayoutMismatch { formats: usize, names: usize },
    #[fail(
        display = "Attribute '{}' requested by the program is not declared by any buffer. \
                   Program attributes: {:?}. Buffer attributes: {:?}.",
        name, program, buffers
    )]
    AttributeMismatch {
        name: String,
        program: Vec<String>,
        buffers: Vec<String>,
    },
    #[fail(display = "{} is not a valid draw mode.", _0)]
    InvalidDrawMode(u32),
    #[fail(display = "Index element size must be 1, 2 or 4 bytes, not {}.", _0)]
    InvalidIndexFormat(u8),
    #[fail(display = "The vertex array already owns an index buffer.")]
    IndexBufferAlreadySet,
    #[fail(display = "Device: {}", _0)]
    Device(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;
