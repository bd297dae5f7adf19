//! Vertex-array wrapper and the attribute-binding algorithm.
//!
//! A [`VertexArray`] owns an ordered list of [`BufferInfo`], an optional
//! index buffer and a draw mode. When asked to bind itself against a shader
//! program it computes the minimal buffer-binding list covering exactly the
//! attributes the program declares, padding over the interleaved attributes
//! the program does not use, and caches one backend vertex-array object per
//! distinct program.

use crate::utils::FastHashMap;

use super::errors::{Error, Result};
use super::format::{AttributeFormat, VertexFormat};
use super::{BufferHandle, GpuDevice, ProgramHandle, VertexArrayHandle};

/// How the input vertex data is used to assemble primitives.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl DrawMode {
    /// Maps a glTF primitive `mode` integer onto a draw mode.
    pub fn from_gltf(mode: u32) -> Result<Self> {
        match mode {
            0 => Ok(DrawMode::Points),
            1 => Ok(DrawMode::Lines),
            2 => Ok(DrawMode::LineLoop),
            3 => Ok(DrawMode::LineStrip),
            4 => Ok(DrawMode::Triangles),
            5 => Ok(DrawMode::TriangleStrip),
            6 => Ok(DrawMode::TriangleFan),
            v => Err(Error::InvalidDrawMode(v)),
        }
    }
}

/// One raw GPU buffer registered with a vertex array: its declared
/// interleave format and the attribute names that format corresponds to,
/// positionally one to one.
#[derive(Debug, Clone)]
pub struct BufferInfo {
    buffer: BufferHandle,
    size: usize,
    format: VertexFormat,
    attributes: Vec<String>,
}

impl BufferInfo {
    /// Wraps a GPU buffer of `size` bytes. Fails if the format declares no
    /// attributes, if the format and name lists disagree in length, or if
    /// `size` is not a whole multiple of the declared vertex size.
    pub fn new(
        buffer: BufferHandle,
        size: usize,
        format: VertexFormat,
        attributes: Vec<String>,
    ) -> Result<Self> {
        if format.len() == 0 {
            return Err(Error::BufferEmpty);
        }

        if format.len() != attributes.len() {
            return Err(Error::LayoutMismatch {
                formats: format.len(),
                names: attributes.len(),
            });
        }

        let vertex_size = format.vertex_size();
        if size % vertex_size != 0 {
            return Err(Error::BufferMisaligned { size, vertex_size });
        }

        Ok(BufferInfo {
            buffer,
            size,
            format,
            attributes,
        })
    }

    #[inline]
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    #[inline]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The byte size of one whole vertex in this buffer.
    #[inline]
    pub fn vertex_size(&self) -> usize {
        self.format.vertex_size()
    }

    /// The number of vertices the buffer holds.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.size / self.vertex_size()
    }
}

/// One element of a buffer binding: a real attribute, or padding skipping
/// over interleaved bytes the program does not consume.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingElement {
    Attribute {
        format: AttributeFormat,
        name: String,
    },
    Padding {
        bytes: usize,
    },
}

impl BindingElement {
    pub fn bytes(&self) -> usize {
        match *self {
            BindingElement::Attribute { ref format, .. } => format.bytes_total(),
            BindingElement::Padding { bytes } => bytes,
        }
    }

    pub fn is_attribute(&self) -> bool {
        match *self {
            BindingElement::Attribute { .. } => true,
            BindingElement::Padding { .. } => false,
        }
    }
}

/// The content contribution of one buffer towards a program: ordered
/// elements whose byte widths sum to `stride`.
#[derive(Debug, Clone)]
pub struct BufferBinding {
    pub buffer: BufferHandle,
    pub stride: usize,
    pub per_instance: bool,
    pub elements: Vec<BindingElement>,
}

/// An index buffer and its element byte size (1, 2 or 4).
#[derive(Debug, Clone, Copy)]
pub struct IndexBinding {
    pub buffer: BufferHandle,
    pub element_size: u8,
    pub count: usize,
}

/// Wraps one or more attribute buffers plus an optional index buffer, and
/// lazily builds one cached backend vertex-array object per shader program
/// it is rendered with.
pub struct VertexArray {
    buffers: Vec<BufferInfo>,
    index: Option<IndexBinding>,
    mode: DrawMode,
    vertices: usize,
    cache: FastHashMap<ProgramHandle, VertexArrayHandle>,
}

impl VertexArray {
    /// Creates an empty vertex array with the given default draw mode.
    pub fn new(mode: DrawMode) -> Self {
        VertexArray {
            buffers: Vec::new(),
            index: None,
            mode,
            vertices: 0,
            cache: FastHashMap::default(),
        }
    }

    /// Registers an attribute buffer. The vertex count of the array follows
    /// the last-added buffer.
    pub fn buffer(&mut self, info: BufferInfo) -> &mut Self {
        self.vertices = info.vertex_count();
        self.buffers.push(info);
        self
    }

    /// Sets the index buffer. May be called at most once; `element_size`
    /// must be 1, 2 or 4.
    pub fn index_buffer(
        &mut self,
        buffer: BufferHandle,
        size: usize,
        element_size: u8,
    ) -> Result<&mut Self> {
        match element_size {
            1 | 2 | 4 => {}
            v => return Err(Error::InvalidIndexFormat(v)),
        }

        if self.index.is_some() {
            return Err(Error::IndexBufferAlreadySet);
        }

        self.index = Some(IndexBinding {
            buffer,
            element_size,
            count: size / element_size as usize,
        });
        Ok(self)
    }

    #[inline]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    #[inline]
    pub fn index(&self) -> Option<IndexBinding> {
        self.index
    }

    #[inline]
    pub fn buffers(&self) -> &[BufferInfo] {
        &self.buffers
    }

    /// Computes the minimal binding list satisfying `requested` attribute
    /// names from the registered buffers.
    ///
    /// Buffers are consulted in registration order, and within one buffer in
    /// declaration order; the first buffer declaring a name wins. A buffer
    /// contributing no real attribute is omitted entirely. Attributes a
    /// buffer carries but the program does not request become padding of the
    /// same byte width, so offsets inside interleaved buffers stay correct.
    pub fn content(&self, requested: &[String]) -> Result<Vec<BufferBinding>> {
        let declared: Vec<String> = self
            .buffers
            .iter()
            .flat_map(|b| b.attributes.iter().cloned())
            .collect();

        for name in requested {
            if !declared.contains(name) {
                return Err(Error::AttributeMismatch {
                    name: name.clone(),
                    program: requested.to_vec(),
                    buffers: declared,
                });
            }
        }

        let mut remaining: Vec<String> = requested.to_vec();
        let mut bindings = Vec::new();

        for info in &self.buffers {
            let mut elements = Vec::with_capacity(info.format.len());
            let mut satisfied = 0;

            for (format, name) in info.format.attributes.iter().zip(&info.attributes) {
                if let Some(pos) = remaining.iter().position(|v| v == name) {
                    remaining.remove(pos);
                    satisfied += 1;
                    elements.push(BindingElement::Attribute {
                        format: *format,
                        name: name.clone(),
                    });
                } else {
                    if requested.contains(name) {
                        warn!(
                            "Attribute '{}' is declared by more than one buffer; \
                             the first registered buffer wins.",
                            name
                        );
                    }
                    elements.push(BindingElement::Padding {
                        bytes: format.bytes_total(),
                    });
                }
            }

            if satisfied > 0 {
                bindings.push(BufferBinding {
                    buffer: info.buffer,
                    stride: info.vertex_size(),
                    per_instance: info.format.per_instance,
                    elements,
                });
            }
        }

        if let Some(name) = remaining.into_iter().next() {
            return Err(Error::AttributeMismatch {
                name,
                program: requested.to_vec(),
                buffers: declared,
            });
        }

        Ok(bindings)
    }

    /// Builds (or fetches from cache) the backend vertex-array object
    /// binding this array against `program`. Reserved `gl_` inputs are
    /// ignored.
    pub fn bind<G: GpuDevice>(
        &mut self,
        device: &mut G,
        program: ProgramHandle,
    ) -> Result<VertexArrayHandle> {
        if let Some(&handle) = self.cache.get(&program) {
            return Ok(handle);
        }

        let requested: Vec<String> = device
            .program_attributes(program)
            .into_iter()
            .filter(|v| !v.starts_with("gl_"))
            .collect();

        let bindings = self.content(&requested)?;
        let handle = device.create_vertex_array(program, &bindings, self.index)?;
        self.cache.insert(program, handle);
        Ok(handle)
    }

    /// Frees every cached backend vertex-array object, and optionally the
    /// underlying buffers as well. Must be called before any referenced
    /// buffer is deleted.
    pub fn release<G: GpuDevice>(&mut self, device: &mut G, release_buffers: bool) {
        for (_, handle) in self.cache.drain() {
            device.delete_vertex_array(handle);
        }

        if release_buffers {
            for info in self.buffers.drain(..) {
                device.delete_buffer(info.buffer);
            }
            if let Some(index) = self.index.take() {
                device.delete_buffer(index.buffer);
            }
            self.vertices = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::HandleLike;

    fn buffer(index: u32) -> BufferHandle {
        BufferHandle::new(index, 1)
    }

    fn info(index: u32, vertices: usize, format: &str, names: &[&str]) -> BufferInfo {
        let format = VertexFormat::parse(format).unwrap();
        let size = vertices * format.vertex_size();
        BufferInfo::new(
            buffer(index),
            size,
            format,
            names.iter().map(|v| v.to_string()).collect(),
        )
        .unwrap()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alignment_invariant() {
        let format = VertexFormat::parse("3f 3f 2f").unwrap();
        assert!(BufferInfo::new(buffer(1), 31, format.clone(), names(&["a", "b", "c"])).is_err());

        let ok = BufferInfo::new(buffer(1), 96, format, names(&["a", "b", "c"])).unwrap();
        assert_eq!(ok.vertex_size(), 32);
        assert_eq!(ok.vertex_count(), 3);
    }

    #[test]
    fn empty_layout_fails() {
        let format = VertexFormat {
            attributes: Default::default(),
            per_instance: false,
        };
        match BufferInfo::new(buffer(1), 12, format, Vec::new()) {
            Err(Error::BufferEmpty) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn layout_length_invariant() {
        let format = VertexFormat::parse("3f 2f").unwrap();
        assert!(BufferInfo::new(buffer(1), 40, format, names(&["a"])).is_err());
    }

    #[test]
    fn minimal_padding() {
        let mut vao = VertexArray::new(DrawMode::Triangles);
        vao.buffer(info(1, 4, "3f 3f 2f", &["in_position", "in_normal", "in_uv"]));

        let bindings = vao.content(&names(&["in_position", "in_uv"])).unwrap();
        assert_eq!(bindings.len(), 1);

        let binding = &bindings[0];
        assert_eq!(binding.stride, 32);
        assert_eq!(binding.elements.len(), 3);
        assert!(binding.elements[0].is_attribute());
        assert_eq!(
            binding.elements[1],
            BindingElement::Padding { bytes: 12 }
        );
        assert!(binding.elements[2].is_attribute());
    }

    #[test]
    fn missing_attribute_fails() {
        let mut vao = VertexArray::new(DrawMode::Triangles);
        vao.buffer(info(1, 4, "3f", &["in_position"]));

        match vao.content(&names(&["in_position", "in_normal"])) {
            Err(Error::AttributeMismatch { name, .. }) => assert_eq!(name, "in_normal"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unused_buffer_omitted() {
        let mut vao = VertexArray::new(DrawMode::Triangles);
        vao.buffer(info(1, 4, "3f", &["in_position"]));
        vao.buffer(info(2, 4, "4f", &["in_color"]));

        let bindings = vao.content(&names(&["in_position"])).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].buffer, buffer(1));
    }

    #[test]
    fn duplicate_attribute_first_wins() {
        let mut vao = VertexArray::new(DrawMode::Triangles);
        vao.buffer(info(1, 4, "3f", &["in_position"]));
        vao.buffer(info(2, 4, "3f", &["in_position"]));

        let bindings = vao.content(&names(&["in_position"])).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].buffer, buffer(1));
    }

    #[test]
    fn vertex_count_follows_last_buffer() {
        let mut vao = VertexArray::new(DrawMode::Points);
        vao.buffer(info(1, 8, "3f", &["in_position"]));
        assert_eq!(vao.vertex_count(), 8);
        vao.buffer(info(2, 4, "2f", &["in_uv"]));
        assert_eq!(vao.vertex_count(), 4);
    }

    #[test]
    fn index_buffer_rules() {
        let mut vao = VertexArray::new(DrawMode::Triangles);
        assert!(vao.index_buffer(buffer(1), 12, 3).is_err());
        vao.index_buffer(buffer(1), 12, 2).unwrap();
        assert_eq!(vao.index().unwrap().count, 6);
        assert!(vao.index_buffer(buffer(2), 12, 2).is_err());
    }

    #[test]
    fn draw_modes() {
        assert_eq!(DrawMode::from_gltf(4).unwrap(), DrawMode::Triangles);
        assert_eq!(DrawMode::from_gltf(0).unwrap(), DrawMode::Points);
        assert!(DrawMode::from_gltf(7).is_err());
    }
}
