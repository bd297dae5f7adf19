//! The GPU-facing half of the crate.
//!
//! Everything here talks to the GPU exclusively through the [`GpuDevice`]
//! trait: an opaque, process-wide context that can create and delete buffers,
//! programs, textures and vertex-array objects. The crate never inspects a
//! backend beyond this seam, which is what allows the whole loading pipeline
//! to be exercised against the bundled [`headless::HeadlessDevice`].
//!
//! Ownership discipline: handles are plain values with no lifetime attached.
//! A buffer must outlive every vertex-array binding built from it; callers
//! release vertex arrays (via [`vao::VertexArray::release`]) before deleting
//! the buffers they reference.

pub mod errors;
pub mod format;
pub mod headless;
pub mod vao;

pub mod prelude {
    pub use super::format::{AttributeFormat, NumericKind, VertexFormat};
    pub use super::headless::HeadlessDevice;
    pub use super::vao::{BufferBinding, BufferInfo, DrawMode, IndexBinding, VertexArray};
    pub use super::{
        BufferHandle, GpuDevice, ProgramHandle, ProgramSources, TextureHandle, TextureParams,
        VertexArrayHandle,
    };
}

use self::errors::Result;
use self::vao::{BufferBinding, IndexBinding};

impl_handle!(BufferHandle);
impl_handle!(ProgramHandle);
impl_handle!(TextureHandle);
impl_handle!(VertexArrayHandle);

/// Assembled shader sources for one program, one entry per stage. A program
/// needs at least a vertex stage, or a compute stage alone.
#[derive(Debug, Clone, Default)]
pub struct ProgramSources {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    pub geometry: Option<String>,
    pub tess_control: Option<String>,
    pub tess_evaluation: Option<String>,
    pub compute: Option<String>,
    /// Out-attribute names captured for transform feedback.
    pub varyings: Vec<String>,
}

/// The setup parameters of a texture object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    /// Dimensions in pixels of a single layer.
    pub dimensions: (u32, u32),
    /// The number of color components per pixel (1-4).
    pub components: u8,
    /// Number of layers: 1 for a plain texture, 6 for a cubemap, N for an
    /// array texture.
    pub layers: u32,
    /// Should the backend generate a mipmap chain.
    pub mipmap: bool,
    /// Explicit mipmap chain length; `None` means a full chain.
    pub mipmap_levels: Option<u32>,
    /// Maximum level of anisotropic filtering.
    pub anisotropy: f32,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            dimensions: (0, 0),
            components: 4,
            layers: 1,
            mipmap: false,
            mipmap_levels: None,
            anisotropy: 1.0,
        }
    }
}

/// The opaque GPU context every loader and vertex array goes through.
///
/// The pipeline assumes exactly one active context for the lifetime of the
/// process; there is no multi-context sharing or migration.
pub trait GpuDevice {
    /// Uploads `data` into a fresh GPU buffer.
    fn create_buffer(&mut self, data: &[u8]) -> Result<BufferHandle>;

    fn delete_buffer(&mut self, handle: BufferHandle);

    /// Compiles and links a program from the assembled per-stage sources.
    fn create_program(&mut self, sources: &ProgramSources) -> Result<ProgramHandle>;

    fn delete_program(&mut self, handle: ProgramHandle);

    /// The vertex-stage input attributes a linked program declares, builtins
    /// included. Callers filter reserved `gl_` names themselves.
    fn program_attributes(&self, handle: ProgramHandle) -> Vec<String>;

    /// Uploads pixel `data` into a fresh texture object. For layered
    /// textures the data of all layers is concatenated in order.
    fn create_texture(&mut self, params: &TextureParams, data: &[u8]) -> Result<TextureHandle>;

    fn delete_texture(&mut self, handle: TextureHandle);

    /// Builds a backend vertex-array object binding `buffers` (and the
    /// optional index buffer) against `program`'s attribute locations.
    fn create_vertex_array(
        &mut self,
        program: ProgramHandle,
        buffers: &[BufferBinding],
        index: Option<IndexBinding>,
    ) -> Result<VertexArrayHandle>;

    fn delete_vertex_array(&mut self, handle: VertexArrayHandle);
}
