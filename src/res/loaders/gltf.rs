//! glTF 2.0 loading: the `.gltf` JSON form and the `.glb` binary container.
//!
//! The container and JSON layers are validated strictly before anything is
//! read from a buffer or uploaded: GLB header and chunk layout first, then
//! `asset.version`, then required extensions, then buffer sources. Vertex
//! data goes to the GPU as-is wherever accessors are already interleaved;
//! adjacent accessors sharing a buffer view are merged into one upload with
//! a combined format, and strided accessors are compacted on the CPU.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};
use serde::Deserialize;

use crate::res::desc::{AttributeNames, SceneDesc, TextureDesc, TextureKind};
use crate::res::errors::{Error, Result};
use crate::res::finder::SearchPaths;
use crate::res::loaders::texture::{self, Texture};
use crate::scene::{AttributeInfo, BoundingBox, Material, Mesh, Node, Scene};
use crate::utils::{FastHashMap, HashValue};
use crate::video::format::{AttributeFormat, NumericKind, VertexFormat};
use crate::video::vao::{BufferInfo, DrawMode, VertexArray};
use crate::video::GpuDevice;

const GLB_MAGIC: u32 = 0x46546C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const MAX_NODE_DEPTH: usize = 256;

// The JSON document model, limited to the subset the loader consumes.

#[derive(Debug, Deserialize)]
struct Document {
    asset: Asset,
    #[serde(default, rename = "extensionsRequired")]
    extensions_required: Vec<String>,
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<DocScene>,
    #[serde(default)]
    nodes: Vec<DocNode>,
    #[serde(default)]
    meshes: Vec<DocMesh>,
    #[serde(default)]
    materials: Vec<DocMaterial>,
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default, rename = "bufferViews")]
    buffer_views: Vec<BufferView>,
    #[serde(default)]
    buffers: Vec<Buffer>,
    #[serde(default)]
    textures: Vec<DocTexture>,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    version: String,
}

#[derive(Debug, Deserialize)]
struct DocScene {
    name: Option<String>,
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct DocNode {
    name: Option<String>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
    #[serde(default)]
    children: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct DocMesh {
    name: Option<String>,
    primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
struct Primitive {
    /// Semantic name to accessor index. A BTreeMap keeps iteration order
    /// deterministic.
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DocMaterial {
    name: Option<String>,
    #[serde(rename = "pbrMetallicRoughness")]
    pbr: Option<PbrMetallicRoughness>,
    #[serde(default, rename = "doubleSided")]
    double_sided: bool,
}

#[derive(Debug, Deserialize)]
struct PbrMetallicRoughness {
    #[serde(rename = "baseColorFactor")]
    base_color_factor: Option<[f32; 4]>,
    #[serde(rename = "baseColorTexture")]
    base_color_texture: Option<TextureRef>,
}

#[derive(Debug, Deserialize)]
struct TextureRef {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct DocTexture {
    source: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Image {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Accessor {
    #[serde(rename = "bufferView")]
    buffer_view: Option<usize>,
    #[serde(default, rename = "byteOffset")]
    byte_offset: usize,
    #[serde(rename = "componentType")]
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    min: Option<Vec<f32>>,
    max: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct BufferView {
    buffer: usize,
    #[serde(default, rename = "byteOffset")]
    byte_offset: usize,
    #[serde(rename = "byteLength")]
    byte_length: usize,
    #[serde(rename = "byteStride")]
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Buffer {
    uri: Option<String>,
    #[serde(rename = "byteLength")]
    byte_length: usize,
}

/// Where one glTF buffer's bytes come from. External files are verified to
/// exist at resolution time and read on first use.
enum BufferSource {
    Loaded(Vec<u8>),
    External(PathBuf),
}

struct BufferStore {
    sources: Vec<BufferSource>,
}

impl BufferStore {
    fn bytes(&mut self, index: usize) -> Result<&[u8]> {
        let source = self
            .sources
            .get_mut(index)
            .ok_or_else(|| Error::MalformedGltf(format!("buffer {} out of range", index)))?;

        let pending = match source {
            BufferSource::External(path) => Some(path.clone()),
            BufferSource::Loaded(_) => None,
        };
        if let Some(path) = pending {
            *source = BufferSource::Loaded(fs::read(&path)?);
        }

        match source {
            BufferSource::Loaded(data) => Ok(data),
            BufferSource::External(_) => unreachable!(),
        }
    }
}

pub fn load<G: GpuDevice>(device: &mut G, paths: &SearchPaths, desc: &SceneDesc) -> Result<Scene> {
    let located = paths.locate(&desc.path)?;
    info!("Loads glTF scene {:?}.", desc.path);

    let raw = fs::read(&located)?;

    let glb = located
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.eq_ignore_ascii_case("glb"))
        .unwrap_or(false);

    let (json, bin) = if glb {
        let (json, bin) = parse_glb(&raw)?;
        (json, Some(bin))
    } else {
        (raw, None)
    };

    let doc: Document = ::serde_json::from_slice(&json)?;

    if doc.asset.version != "2.0" {
        return Err(Error::UnsupportedGltfVersion(doc.asset.version));
    }
    if let Some(extension) = doc.extensions_required.first() {
        // No extensions are supported; any requirement is fatal.
        return Err(Error::UnsupportedExtension(extension.clone()));
    }

    let dir = located
        .parent()
        .ok_or_else(|| Error::NotFound(located.clone()))?;
    let mut store = resolve_buffers(&doc, bin, dir)?;

    let attr_names = desc.attr_names.clone().unwrap_or_default();

    let mut scene = Scene::new();
    scene.materials = build_materials(device, &doc, dir)?;

    // Flatten per-mesh primitive lists; `mesh_map[i]` are the indices our
    // scene assigned to glTF mesh i.
    let mut mesh_map = Vec::with_capacity(doc.meshes.len());
    for mesh in &doc.meshes {
        let mut indices = Vec::with_capacity(mesh.primitives.len());
        for primitive in &mesh.primitives {
            indices.push(scene.meshes.len());
            scene
                .meshes
                .push(build_primitive(device, &doc, &mut store, primitive, mesh, &attr_names)?);
        }
        mesh_map.push(indices);
    }

    if let Some(doc_scene) = doc.scenes.get(doc.scene.unwrap_or(0)) {
        scene.name = doc_scene.name.clone();
        for &root in &doc_scene.nodes {
            scene.nodes.push(build_node(&doc, root, &mesh_map, 0)?);
        }
    }

    Ok(scene)
}

/// Splits a GLB container into its JSON and binary chunks, validating the
/// header and the chunk layout first.
fn parse_glb(raw: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if raw.len() < 12 {
        return Err(Error::MalformedGltf("truncated GLB header".into()));
    }

    let mut cursor = Cursor::new(raw);
    if cursor.read_u32::<LittleEndian>()? != GLB_MAGIC {
        return Err(Error::MalformedGltf("bad GLB magic".into()));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != 2 {
        return Err(Error::UnsupportedGltfVersion(version.to_string()));
    }

    let length = cursor.read_u32::<LittleEndian>()? as usize;
    if length != raw.len() {
        return Err(Error::MalformedGltf(format!(
            "GLB declares {} bytes but the file holds {}",
            length,
            raw.len()
        )));
    }

    let json = read_chunk(&mut cursor, raw, CHUNK_JSON)?;
    let bin = read_chunk(&mut cursor, raw, CHUNK_BIN)?;
    Ok((json, bin))
}

fn read_chunk(cursor: &mut Cursor<&[u8]>, raw: &[u8], expected: u32) -> Result<Vec<u8>> {
    let length = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::MalformedGltf("missing GLB chunk".into()))? as usize;
    let kind = cursor.read_u32::<LittleEndian>()?;
    if kind != expected {
        return Err(Error::MalformedGltf(format!(
            "unexpected GLB chunk type {:#010x}",
            kind
        )));
    }

    let start = cursor.position() as usize;
    let end = start
        .checked_add(length)
        .filter(|&v| v <= raw.len())
        .ok_or_else(|| Error::MalformedGltf("GLB chunk overruns the file".into()))?;

    cursor.set_position(end as u64);
    Ok(raw[start..end].to_vec())
}

/// Maps every buffer entry onto a byte source, verifying external files
/// exist before any GPU work starts.
fn resolve_buffers(doc: &Document, bin: Option<Vec<u8>>, dir: &Path) -> Result<BufferStore> {
    let mut bin = bin;
    let mut sources = Vec::with_capacity(doc.buffers.len());

    for (index, buffer) in doc.buffers.iter().enumerate() {
        let source = match &buffer.uri {
            None => {
                let data = bin.take().ok_or_else(|| {
                    Error::MalformedGltf(format!(
                        "buffer {} has no uri and no GLB binary chunk is available",
                        index
                    ))
                })?;
                if data.len() < buffer.byte_length {
                    return Err(Error::MalformedGltf(format!(
                        "GLB binary chunk is shorter than buffer {} declares",
                        index
                    )));
                }
                BufferSource::Loaded(data)
            }
            Some(uri) if uri.starts_with("data:") => {
                let encoded = uri
                    .splitn(2, ',')
                    .nth(1)
                    .ok_or_else(|| Error::MalformedGltf(format!("malformed data uri in buffer {}", index)))?;
                let data = ::base64::decode(encoded).map_err(|err| {
                    Error::MalformedGltf(format!("data uri in buffer {}: {}", index, err))
                })?;
                BufferSource::Loaded(data)
            }
            Some(uri) => {
                let path = dir.join(uri);
                if !path.is_file() {
                    return Err(Error::NotFound(path));
                }
                BufferSource::External(path)
            }
        };
        sources.push(source);
    }

    Ok(BufferStore { sources })
}

fn build_materials<G: GpuDevice>(
    device: &mut G,
    doc: &Document,
    dir: &Path,
) -> Result<Vec<Material>> {
    let mut paths = SearchPaths::new();
    paths.mount(dir)?;

    let mut cache: FastHashMap<HashValue<str>, Texture> = FastHashMap::default();
    let mut materials = Vec::with_capacity(doc.materials.len());

    for doc_material in &doc.materials {
        let mut material = Material::default();
        material.name = doc_material.name.clone();
        material.double_sided = doc_material.double_sided;

        if let Some(pbr) = &doc_material.pbr {
            if let Some(factor) = pbr.base_color_factor {
                material.base_color = factor;
            }
            if let Some(reference) = &pbr.base_color_texture {
                material.texture = load_texture(device, &paths, doc, reference.index, &mut cache)?;
            }
        }

        materials.push(material);
    }

    Ok(materials)
}

/// Loads the image behind texture `index`, at most once per source path.
/// Non-file image sources (data uris, buffer views) are skipped.
fn load_texture<G: GpuDevice>(
    device: &mut G,
    paths: &SearchPaths,
    doc: &Document,
    index: usize,
    cache: &mut FastHashMap<HashValue<str>, Texture>,
) -> Result<Option<Texture>> {
    let source = doc.textures.get(index).and_then(|v| v.source);
    let uri = match source.and_then(|v| doc.images.get(v)).and_then(|v| v.uri.as_ref()) {
        Some(uri) if !uri.starts_with("data:") => uri,
        _ => {
            warn!("Texture {} has no file-backed image source, skipped.", index);
            return Ok(None);
        }
    };

    let key = HashValue::from(uri.as_str());
    if let Some(texture) = cache.get(&key) {
        return Ok(Some(*texture));
    }

    let mut desc = TextureDesc::new(uri);
    // glTF texture coordinates already have a top-left origin.
    desc.flip = false;
    let texture = texture::load(device, paths, &desc, TextureKind::Image)?;
    cache.insert(key, texture);
    Ok(Some(texture))
}

fn build_primitive<G: GpuDevice>(
    device: &mut G,
    doc: &Document,
    store: &mut BufferStore,
    primitive: &Primitive,
    mesh: &DocMesh,
    attr_names: &AttributeNames,
) -> Result<Mesh> {
    let mode = DrawMode::from_gltf(primitive.mode.unwrap_or(4))?;
    let mut vao = VertexArray::new(mode);
    let mut attributes = Vec::new();
    let mut bbox = None;

    // Shader-facing channels, grouped by the buffer view they live in.
    let mut by_view: BTreeMap<usize, Vec<(String, usize)>> = BTreeMap::new();

    for (semantic, &accessor_index) in &primitive.attributes {
        let name = match attr_names.for_semantic(semantic) {
            Some(name) => name.to_string(),
            None => {
                warn!("Ignores unmapped glTF attribute semantic '{}'.", semantic);
                continue;
            }
        };

        let accessor = accessor_at(doc, accessor_index)?;
        let view = accessor.buffer_view.ok_or_else(|| {
            Error::MalformedGltf(format!("accessor {} has no buffer view", accessor_index))
        })?;

        if semantic == "POSITION" {
            bbox = position_bbox(accessor);
        }

        by_view.entry(view).or_default().push((name, accessor_index));
    }

    for (view_index, mut entries) in by_view {
        entries.sort_by_key(|&(_, accessor)| doc.accessors[accessor].byte_offset);

        // Merge adjacent accessors into interleaved runs: while the next
        // accessor begins exactly where the merged format ends, it joins
        // the current run.
        let mut run: Vec<(String, AttributeFormat, &Accessor)> = Vec::new();
        let mut run_offset = 0;
        let mut run_size = 0;

        for (name, accessor_index) in entries {
            let accessor = &doc.accessors[accessor_index];
            let format = accessor_format(accessor)?;

            if !run.is_empty() && accessor.byte_offset != run_offset + run_size {
                upload_run(device, doc, store, view_index, run_offset, &run, &mut vao)?;
                run.clear();
            }
            if run.is_empty() {
                run_offset = accessor.byte_offset;
                run_size = 0;
            }

            run_size += format.bytes_total();
            attributes.push(AttributeInfo {
                name: name.clone(),
                format,
            });
            run.push((name, format, accessor));
        }

        if !run.is_empty() {
            upload_run(device, doc, store, view_index, run_offset, &run, &mut vao)?;
        }
    }

    if let Some(accessor_index) = primitive.indices {
        upload_indices(device, doc, store, accessor_index, &mut vao)?;
    }

    Ok(Mesh {
        name: mesh.name.clone(),
        vao,
        material: primitive.material,
        attributes,
        bbox,
    })
}

fn accessor_at(doc: &Document, index: usize) -> Result<&Accessor> {
    doc.accessors
        .get(index)
        .ok_or_else(|| Error::MalformedGltf(format!("accessor {} out of range", index)))
}

fn view_at(doc: &Document, index: usize) -> Result<&BufferView> {
    doc.buffer_views
        .get(index)
        .ok_or_else(|| Error::MalformedGltf(format!("buffer view {} out of range", index)))
}

/// Uploads one interleaved run of accessors as a single buffer.
fn upload_run<G: GpuDevice>(
    device: &mut G,
    doc: &Document,
    store: &mut BufferStore,
    view_index: usize,
    run_offset: usize,
    run: &[(String, AttributeFormat, &Accessor)],
    vao: &mut VertexArray,
) -> Result<()> {
    let view = view_at(doc, view_index)?;

    let count = run[0].2.count;
    for (_, _, accessor) in run {
        if accessor.count != count {
            return Err(Error::MalformedGltf(
                "interleaved accessors disagree on element count".into(),
            ));
        }
    }

    let mut format = VertexFormat {
        attributes: Default::default(),
        per_instance: false,
    };
    let mut names = Vec::with_capacity(run.len());
    for (name, attribute, _) in run {
        format.attributes.push(*attribute);
        names.push(name.clone());
    }

    let vertex_size = format.vertex_size();
    let data = read_elements(store, view, run_offset, vertex_size, count)?;

    let buffer = device.create_buffer(&data)?;
    let info = BufferInfo::new(buffer, data.len(), format, names)?;
    vao.buffer(info);
    Ok(())
}

fn upload_indices<G: GpuDevice>(
    device: &mut G,
    doc: &Document,
    store: &mut BufferStore,
    accessor_index: usize,
    vao: &mut VertexArray,
) -> Result<()> {
    let accessor = accessor_at(doc, accessor_index)?;
    let view_index = accessor.buffer_view.ok_or_else(|| {
        Error::MalformedGltf(format!("index accessor {} has no buffer view", accessor_index))
    })?;
    let view = view_at(doc, view_index)?;

    let element_size: u8 = match accessor.component_type {
        5121 => 1,
        5123 => 2,
        5125 => 4,
        v => {
            return Err(Error::MalformedGltf(format!(
                "component type {} is not valid for indices",
                v
            )));
        }
    };

    let data = read_elements(
        store,
        view,
        accessor.byte_offset,
        element_size as usize,
        accessor.count,
    )?;

    let buffer = device.create_buffer(&data)?;
    vao.index_buffer(buffer, data.len(), element_size)?;
    Ok(())
}

/// Copies `count` elements of `element_size` bytes out of a buffer view,
/// compacting strided layouts.
fn read_elements(
    store: &mut BufferStore,
    view: &BufferView,
    offset_in_view: usize,
    element_size: usize,
    count: usize,
) -> Result<Vec<u8>> {
    let stride = view.byte_stride.unwrap_or(element_size);
    let data = store.bytes(view.buffer)?;

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|&v| v <= data.len())
        .ok_or_else(|| Error::MalformedGltf("buffer view overruns its buffer".into()))?;
    let base = view.byte_offset + offset_in_view;

    if stride == element_size {
        let end = base + count * element_size;
        if end > view_end {
            return Err(Error::MalformedGltf("accessor overruns its buffer view".into()));
        }
        return Ok(data[base..end].to_vec());
    }

    let mut out = Vec::with_capacity(count * element_size);
    for i in 0..count {
        let start = base + i * stride;
        let end = start + element_size;
        if end > view_end {
            return Err(Error::MalformedGltf("accessor overruns its buffer view".into()));
        }
        out.extend_from_slice(&data[start..end]);
    }
    Ok(out)
}

/// The buffer format of an accessor's elements. Matrix types have no vertex
/// attribute mapping and fail.
fn accessor_format(accessor: &Accessor) -> Result<AttributeFormat> {
    let components = match accessor.kind.as_str() {
        "SCALAR" => 1,
        "VEC2" => 2,
        "VEC3" => 3,
        "VEC4" => 4,
        other => {
            return Err(Error::MalformedGltf(format!(
                "unsupported accessor type '{}'",
                other
            )));
        }
    };

    let (kind, width) = match accessor.component_type {
        5120 => (NumericKind::Int, 1),
        5121 => (NumericKind::Uint, 1),
        5122 => (NumericKind::Int, 2),
        5123 => (NumericKind::Uint, 2),
        5125 => (NumericKind::Uint, 4),
        5126 => (NumericKind::Float, 4),
        v => {
            return Err(Error::MalformedGltf(format!(
                "unknown accessor component type {}",
                v
            )));
        }
    };

    Ok(AttributeFormat::new(components, kind, width))
}

fn position_bbox(accessor: &Accessor) -> Option<BoundingBox> {
    let min = accessor.min.as_ref().filter(|v| v.len() >= 3)?;
    let max = accessor.max.as_ref().filter(|v| v.len() >= 3)?;
    Some(BoundingBox::new(
        Vector3::new(min[0], min[1], min[2]),
        Vector3::new(max[0], max[1], max[2]),
    ))
}

fn build_node(doc: &Document, index: usize, mesh_map: &[Vec<usize>], depth: usize) -> Result<Node> {
    if depth > MAX_NODE_DEPTH {
        return Err(Error::MalformedGltf(
            "node tree exceeds the supported depth; circular reference?".into(),
        ));
    }

    let doc_node = doc
        .nodes
        .get(index)
        .ok_or_else(|| Error::MalformedGltf(format!("node {} out of range", index)))?;

    let mut node = Node::new();
    node.name = doc_node.name.clone();
    node.transform = node_transform(doc_node);

    if let Some(mesh_index) = doc_node.mesh {
        let meshes = mesh_map
            .get(mesh_index)
            .ok_or_else(|| Error::MalformedGltf(format!("mesh {} out of range", mesh_index)))?;

        // A multi-primitive mesh becomes one child node per primitive.
        if meshes.len() == 1 {
            node.mesh = Some(meshes[0]);
        } else {
            for &mesh in meshes {
                let mut child = Node::new();
                child.mesh = Some(mesh);
                node.children.push(child);
            }
        }
    }

    for &child in &doc_node.children {
        node.children.push(build_node(doc, child, mesh_map, depth + 1)?);
    }

    Ok(node)
}

/// A node's local transform: the explicit matrix when present, otherwise
/// translation, rotation and scale composed in T R S order.
fn node_transform(node: &DocNode) -> Matrix4<f32> {
    if let Some(m) = node.matrix {
        // glTF matrices are column-major, same as cgmath.
        return Matrix4::new(
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12],
            m[13], m[14], m[15],
        );
    }

    let mut transform = Matrix4::identity();
    if let Some([x, y, z]) = node.translation {
        transform = transform * Matrix4::from_translation(Vector3::new(x, y, z));
    }
    if let Some([x, y, z, w]) = node.rotation {
        transform = transform * Matrix4::from(Quaternion::new(w, x, y, z));
    }
    if let Some([x, y, z]) = node.scale {
        transform = transform * Matrix4::from_nonuniform_scale(x, y, z);
    }
    transform
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn glb(magic: u32, version: u32, chunks: &[(u32, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (kind, data) in chunks {
            body.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            body.write_u32::<LittleEndian>(*kind).unwrap();
            body.extend_from_slice(data);
        }

        let mut out = Vec::new();
        out.write_u32::<LittleEndian>(magic).unwrap();
        out.write_u32::<LittleEndian>(version).unwrap();
        out.write_u32::<LittleEndian>(12 + body.len() as u32).unwrap();
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn glb_header_validation() {
        let good = glb(GLB_MAGIC, 2, &[(CHUNK_JSON, b"{}"), (CHUNK_BIN, b"\0\0")]);
        let (json, bin) = parse_glb(&good).unwrap();
        assert_eq!(json, b"{}");
        assert_eq!(bin.len(), 2);

        let bad_magic = glb(0xDEAD_BEEF, 2, &[(CHUNK_JSON, b"{}"), (CHUNK_BIN, b"")]);
        match parse_glb(&bad_magic) {
            Err(Error::MalformedGltf(msg)) => assert!(msg.contains("magic")),
            other => panic!("unexpected: {:?}", other),
        }

        let bad_version = glb(GLB_MAGIC, 1, &[(CHUNK_JSON, b"{}"), (CHUNK_BIN, b"")]);
        match parse_glb(&bad_version) {
            Err(Error::UnsupportedGltfVersion(v)) => assert_eq!(v, "1"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn glb_requires_both_chunks() {
        let json_only = glb(GLB_MAGIC, 2, &[(CHUNK_JSON, b"{}")]);
        assert!(parse_glb(&json_only).is_err());

        let swapped = glb(GLB_MAGIC, 2, &[(CHUNK_BIN, b""), (CHUNK_JSON, b"{}")]);
        assert!(parse_glb(&swapped).is_err());
    }

    #[test]
    fn glb_length_must_match() {
        let mut out = glb(GLB_MAGIC, 2, &[(CHUNK_JSON, b"{}"), (CHUNK_BIN, b"")]);
        out.push(0);
        assert!(parse_glb(&out).is_err());
    }

    #[test]
    fn accessor_formats() {
        let accessor = |component_type, kind: &str| Accessor {
            buffer_view: None,
            byte_offset: 0,
            component_type,
            count: 0,
            kind: kind.into(),
            min: None,
            max: None,
        };

        let v = accessor_format(&accessor(5126, "VEC3")).unwrap();
        assert_eq!(v, AttributeFormat::new(3, NumericKind::Float, 4));

        let v = accessor_format(&accessor(5123, "SCALAR")).unwrap();
        assert_eq!(v, AttributeFormat::new(1, NumericKind::Uint, 2));

        assert!(accessor_format(&accessor(5124, "VEC3")).is_err());
        assert!(accessor_format(&accessor(5126, "MAT4")).is_err());
    }

    #[test]
    fn data_uri_buffers_decode() {
        let doc: Document = ::serde_json::from_str(
            r#"{
                "asset": {"version": "2.0"},
                "buffers": [
                    {"uri": "data:application/octet-stream;base64,AAECAw==", "byteLength": 4}
                ]
            }"#,
        )
        .unwrap();

        let mut store = resolve_buffers(&doc, None, Path::new("/")).unwrap();
        assert_eq!(store.bytes(0).unwrap(), &[0, 1, 2, 3]);
    }

    #[test]
    fn missing_external_buffer_fails_eagerly() {
        let doc: Document = ::serde_json::from_str(
            r#"{
                "asset": {"version": "2.0"},
                "buffers": [{"uri": "missing.bin", "byteLength": 4}]
            }"#,
        )
        .unwrap();

        match resolve_buffers(&doc, None, &::std::env::temp_dir()) {
            Err(Error::NotFound(_)) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn trs_composition_order() {
        let node = DocNode {
            name: None,
            mesh: None,
            matrix: None,
            translation: Some([1.0, 0.0, 0.0]),
            rotation: None,
            scale: Some([2.0, 2.0, 2.0]),
            children: Vec::new(),
        };

        // Scale applies in local space, translation afterwards.
        let m = node_transform(&node);
        let p = m * cgmath::Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1e-6);
    }
}
