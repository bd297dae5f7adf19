//! A no-op GPU device. It allocates handles, tracks buffer sizes and scrapes
//! vertex-stage `in` declarations from the submitted sources, which is
//! enough to exercise the whole loading pipeline without a real context.

use crate::utils::{FastHashMap, FastHashSet, HandleLike};

use super::errors::{Error, Result};
use super::vao::{BufferBinding, IndexBinding};
use super::{
    BufferHandle, GpuDevice, ProgramHandle, ProgramSources, TextureHandle, TextureParams,
    VertexArrayHandle,
};

#[derive(Default)]
pub struct HeadlessDevice {
    next: u32,
    buffers: FastHashMap<BufferHandle, usize>,
    programs: FastHashMap<ProgramHandle, Vec<String>>,
    textures: FastHashMap<TextureHandle, TextureParams>,
    vertex_arrays: FastHashSet<VertexArrayHandle>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Default::default()
    }

    fn alloc<H: HandleLike>(&mut self) -> H {
        self.next += 1;
        H::new(self.next, 1)
    }

    /// The byte size a buffer was created with.
    pub fn buffer_size(&self, handle: BufferHandle) -> Option<usize> {
        self.buffers.get(&handle).cloned()
    }

    pub fn texture_params(&self, handle: TextureHandle) -> Option<TextureParams> {
        self.textures.get(&handle).cloned()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }
}

/// Pulls the declared input attribute names out of a GLSL vertex stage.
/// Understands plain `in vec3 name;` declarations, with or without a
/// `layout(...)` qualifier.
fn scrape_attributes(source: &str) -> Vec<String> {
    let mut names = Vec::new();

    for line in source.lines() {
        let line = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };

        let mut tokens = line.split_whitespace().peekable();
        if let Some(&first) = tokens.peek() {
            if first.starts_with("layout") {
                while let Some(v) = tokens.next() {
                    if v.ends_with(')') {
                        break;
                    }
                }
            }
        }

        let tokens: Vec<&str> = tokens.collect();
        if tokens.len() == 3 && tokens[0] == "in" && tokens[2].ends_with(';') {
            names.push(tokens[2].trim_end_matches(';').to_string());
        }
    }

    names
}

impl GpuDevice for HeadlessDevice {
    fn create_buffer(&mut self, data: &[u8]) -> Result<BufferHandle> {
        let handle = self.alloc();
        self.buffers.insert(handle, data.len());
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(&handle);
    }

    fn create_program(&mut self, sources: &ProgramSources) -> Result<ProgramHandle> {
        if sources.vertex.is_none() && sources.compute.is_none() {
            return Err(Error::Device(
                "a program needs a vertex or a compute stage".into(),
            ));
        }

        let attributes = sources
            .vertex
            .as_ref()
            .map(|v| scrape_attributes(v))
            .unwrap_or_default();

        let handle = self.alloc();
        self.programs.insert(handle, attributes);
        Ok(handle)
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        self.programs.remove(&handle);
    }

    fn program_attributes(&self, handle: ProgramHandle) -> Vec<String> {
        self.programs.get(&handle).cloned().unwrap_or_default()
    }

    fn create_texture(&mut self, params: &TextureParams, data: &[u8]) -> Result<TextureHandle> {
        let (w, h) = params.dimensions;
        let expected = w as usize * h as usize * params.components as usize * params.layers as usize;
        if data.len() != expected {
            return Err(Error::Device(format!(
                "texture data is {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        let handle = self.alloc();
        self.textures.insert(handle, *params);
        Ok(handle)
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn create_vertex_array(
        &mut self,
        _: ProgramHandle,
        buffers: &[BufferBinding],
        _: Option<IndexBinding>,
    ) -> Result<VertexArrayHandle> {
        for binding in buffers {
            if !self.buffers.contains_key(&binding.buffer) {
                return Err(Error::Device(format!(
                    "unknown buffer {} in binding",
                    binding.buffer
                )));
            }
        }

        let handle = self.alloc();
        self.vertex_arrays.insert(handle);
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, handle: VertexArrayHandle) {
        self.vertex_arrays.remove(&handle);
    }
}
