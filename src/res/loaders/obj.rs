//! Wavefront OBJ loading, with a small `.mtl` material subset (`newmtl`,
//! `Kd`, `map_Kd`).
//!
//! Faces are fan-triangulated and expanded into one non-indexed interleaved
//! buffer per material group. Channels are interleaved in the fixed order
//! texcoord, color, normal, position; a channel is present only when every
//! face vertex in the group references it.

use std::path::Path;
use std::str;

use byteorder::{LittleEndian, WriteBytesExt};
use cgmath::Vector3;

use crate::res::desc::{AttributeNames, SceneDesc, TextureDesc, TextureKind};
use crate::res::errors::{Error, Result};
use crate::res::finder::SearchPaths;
use crate::res::loaders::texture::{self, Texture};
use crate::scene::{AttributeInfo, BoundingBox, Material, Mesh, Node, Scene};
use crate::utils::{FastHashMap, HashValue};
use crate::video::format::{AttributeFormat, VertexFormat};
use crate::video::vao::{BufferInfo, DrawMode, VertexArray};
use crate::video::GpuDevice;

/// One corner of a face, indices already resolved to 0-based.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VertexRef {
    v: usize,
    vt: Option<usize>,
    vn: Option<usize>,
}

/// Consecutive faces sharing one material.
#[derive(Debug, Default)]
struct FaceGroup {
    name: Option<String>,
    material: Option<String>,
    faces: Vec<[VertexRef; 3]>,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    /// Per-vertex colors; only usable when every `v` line carried one.
    colors: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    groups: Vec<FaceGroup>,
    mtl_libs: Vec<String>,
}

impl ObjData {
    fn has_colors(&self) -> bool {
        !self.colors.is_empty() && self.colors.len() == self.positions.len()
    }
}

#[derive(Debug, Default, Clone)]
struct MtlMaterial {
    kd: Option<[f32; 3]>,
    map_kd: Option<String>,
}

pub fn load<G: GpuDevice>(device: &mut G, paths: &SearchPaths, desc: &SceneDesc) -> Result<Scene> {
    let located = paths.locate(&desc.path)?;
    info!("Loads OBJ scene {:?}.", desc.path);

    let raw = super::read_maybe_gz(&located)?;
    let source = str::from_utf8(&raw)
        .map_err(|_| Error::MalformedScene("OBJ file is not valid UTF-8".into()))?;
    let data = parse_obj(source)?;

    let dir = located
        .parent()
        .ok_or_else(|| Error::NotFound(located.clone()))?;
    let library = load_materials(&data, dir);

    let attr_names = desc.attr_names.clone().unwrap_or_default();
    let mut scene = Scene::new();

    let mut texture_cache: FastHashMap<HashValue<str>, Texture> = FastHashMap::default();
    let mut material_slots: FastHashMap<HashValue<str>, usize> = FastHashMap::default();

    for group in data.groups.iter().filter(|v| !v.faces.is_empty()) {
        let material = match &group.material {
            Some(name) => Some(material_slot(
                device,
                dir,
                name,
                &library,
                &mut material_slots,
                &mut texture_cache,
                &mut scene.materials,
            )?),
            None => None,
        };

        let mesh = build_group(device, &data, group, material, &attr_names)?;
        let mut node = Node::new();
        node.name = group.name.clone();
        node.mesh = Some(scene.meshes.len());
        scene.nodes.push(node);
        scene.meshes.push(mesh);
    }

    Ok(scene)
}

fn parse_obj(source: &str) -> Result<ObjData> {
    let mut data = ObjData::default();
    data.groups.push(FaceGroup::default());

    for (number, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap();
        let rest: Vec<&str> = tokens.collect();

        let malformed =
            |what: &str| Error::MalformedScene(format!("{} on line {}", what, number + 1));

        match keyword {
            "v" => {
                let floats = parse_floats(&rest).map_err(|_| malformed("bad vertex"))?;
                match floats.len() {
                    3 => data.positions.push([floats[0], floats[1], floats[2]]),
                    6 => {
                        data.positions.push([floats[0], floats[1], floats[2]]);
                        data.colors.push([floats[3], floats[4], floats[5]]);
                    }
                    _ => return Err(malformed("bad vertex")),
                }
            }
            "vt" => {
                let floats = parse_floats(&rest).map_err(|_| malformed("bad texcoord"))?;
                if floats.len() < 2 {
                    return Err(malformed("bad texcoord"));
                }
                data.texcoords.push([floats[0], floats[1]]);
            }
            "vn" => {
                let floats = parse_floats(&rest).map_err(|_| malformed("bad normal"))?;
                if floats.len() < 3 {
                    return Err(malformed("bad normal"));
                }
                data.normals.push([floats[0], floats[1], floats[2]]);
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(malformed("face with fewer than 3 vertices"));
                }
                let mut refs = Vec::with_capacity(rest.len());
                for token in &rest {
                    refs.push(parse_vertex_ref(token, &data).ok_or_else(|| malformed("bad face index"))?);
                }

                let group = data.groups.last_mut().unwrap();
                for i in 1..refs.len() - 1 {
                    group.faces.push([refs[0], refs[i], refs[i + 1]]);
                }
            }
            "usemtl" => {
                let material = rest.first().map(|v| v.to_string());
                let previous = data.groups.last().unwrap();

                if previous.faces.is_empty() {
                    data.groups.last_mut().unwrap().material = material;
                } else {
                    let name = previous.name.clone();
                    data.groups.push(FaceGroup {
                        name,
                        material,
                        faces: Vec::new(),
                    });
                }
            }
            "o" | "g" => {
                let name = rest.first().map(|v| v.to_string());
                let previous = data.groups.last().unwrap();

                if previous.faces.is_empty() {
                    data.groups.last_mut().unwrap().name = name;
                } else {
                    let material = previous.material.clone();
                    data.groups.push(FaceGroup {
                        name,
                        material,
                        faces: Vec::new(),
                    });
                }
            }
            "mtllib" => {
                data.mtl_libs.extend(rest.iter().map(|v| v.to_string()));
            }
            // Smoothing groups, lines, points and free-form geometry are
            // outside the subset.
            _ => {}
        }
    }

    Ok(data)
}

fn parse_floats(tokens: &[&str]) -> ::std::result::Result<Vec<f32>, ()> {
    tokens.iter().map(|v| v.parse::<f32>().map_err(|_| ())).collect()
}

/// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`, resolving 1-based and negative
/// indices against the counts parsed so far.
fn parse_vertex_ref(token: &str, data: &ObjData) -> Option<VertexRef> {
    let mut parts = token.split('/');

    let v = resolve_index(parts.next()?, data.positions.len())?;
    let vt = match parts.next() {
        None | Some("") => None,
        Some(part) => Some(resolve_index(part, data.texcoords.len())?),
    };
    let vn = match parts.next() {
        None | Some("") => None,
        Some(part) => Some(resolve_index(part, data.normals.len())?),
    };

    Some(VertexRef { v, vt, vn })
}

fn resolve_index(token: &str, count: usize) -> Option<usize> {
    let index: i64 = token.parse().ok()?;
    let resolved = if index < 0 {
        count as i64 + index
    } else {
        index - 1
    };

    if resolved >= 0 && (resolved as usize) < count {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Parses every referenced `.mtl` library next to the OBJ file. Missing
/// libraries are skipped with a warning; OBJ files in the wild routinely
/// reference ones that are not shipped.
fn load_materials(data: &ObjData, dir: &Path) -> FastHashMap<String, MtlMaterial> {
    let mut library = FastHashMap::default();

    for name in &data.mtl_libs {
        let path = dir.join(name);
        let source = match ::std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(_) => {
                warn!("Material library {:?} is missing, skipped.", path);
                continue;
            }
        };
        parse_mtl(&source, &mut library);
    }

    library
}

fn parse_mtl(source: &str, library: &mut FastHashMap<String, MtlMaterial>) {
    let mut current: Option<String> = None;

    for line in source.lines() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("newmtl") => {
                if let Some(name) = tokens.next() {
                    current = Some(name.to_string());
                    library.insert(name.to_string(), MtlMaterial::default());
                }
            }
            Some("Kd") => {
                let floats: Vec<f32> = tokens.filter_map(|v| v.parse().ok()).collect();
                if floats.len() >= 3 {
                    if let Some(material) = current.as_ref().and_then(|v| library.get_mut(v)) {
                        material.kd = Some([floats[0], floats[1], floats[2]]);
                    }
                }
            }
            Some("map_Kd") => {
                if let Some(file) = tokens.last() {
                    if let Some(material) = current.as_ref().and_then(|v| library.get_mut(v)) {
                        material.map_kd = Some(file.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Finds or creates the scene material slot for `name`, loading its diffuse
/// texture at most once per scene load.
fn material_slot<G: GpuDevice>(
    device: &mut G,
    dir: &Path,
    name: &str,
    library: &FastHashMap<String, MtlMaterial>,
    slots: &mut FastHashMap<HashValue<str>, usize>,
    texture_cache: &mut FastHashMap<HashValue<str>, Texture>,
    materials: &mut Vec<Material>,
) -> Result<usize> {
    let key = HashValue::from(name);
    if let Some(&slot) = slots.get(&key) {
        return Ok(slot);
    }

    let parsed = library.get(name).cloned().unwrap_or_default();

    let mut material = Material::default();
    material.name = Some(name.to_string());
    if let Some([r, g, b]) = parsed.kd {
        material.base_color = [r, g, b, 1.0];
    }

    if let Some(file) = parsed.map_kd {
        let file_key = HashValue::from(file.as_str());
        material.texture = Some(match texture_cache.get(&file_key) {
            Some(texture) => *texture,
            None => {
                let mut paths = SearchPaths::new();
                paths.mount(dir)?;
                let texture =
                    texture::load(device, &paths, &TextureDesc::new(&file), TextureKind::Image)?;
                texture_cache.insert(file_key, texture);
                texture
            }
        });
    }

    let slot = materials.len();
    materials.push(material);
    slots.insert(key, slot);
    Ok(slot)
}

fn build_group<G: GpuDevice>(
    device: &mut G,
    data: &ObjData,
    group: &FaceGroup,
    material: Option<usize>,
    attr_names: &AttributeNames,
) -> Result<Mesh> {
    let has_texcoords = group
        .faces
        .iter()
        .all(|face| face.iter().all(|v| v.vt.is_some()));
    let has_normals = group
        .faces
        .iter()
        .all(|face| face.iter().all(|v| v.vn.is_some()));
    let has_colors = data.has_colors();

    // Channel order is fixed: texcoord, color, normal, position.
    let mut format = VertexFormat {
        attributes: Default::default(),
        per_instance: false,
    };
    let mut names = Vec::new();
    if has_texcoords {
        format.attributes.push(AttributeFormat::parse("2f")?);
        names.push(attr_names.texcoord_0.clone());
    }
    if has_colors {
        format.attributes.push(AttributeFormat::parse("3f")?);
        names.push(attr_names.color_0.clone());
    }
    if has_normals {
        format.attributes.push(AttributeFormat::parse("3f")?);
        names.push(attr_names.normal.clone());
    }
    format.attributes.push(AttributeFormat::parse("3f")?);
    names.push(attr_names.position.clone());

    let attributes = format
        .attributes
        .iter()
        .zip(&names)
        .map(|(format, name)| AttributeInfo {
            name: name.clone(),
            format: *format,
        })
        .collect();

    let vertex_count = group.faces.len() * 3;
    let mut bytes = Vec::with_capacity(vertex_count * format.vertex_size());
    let mut bbox: Option<BoundingBox> = None;

    for face in &group.faces {
        for corner in face {
            if has_texcoords {
                let [u, v] = data.texcoords[corner.vt.unwrap()];
                bytes.write_f32::<LittleEndian>(u)?;
                bytes.write_f32::<LittleEndian>(v)?;
            }
            if has_colors {
                for &v in &data.colors[corner.v] {
                    bytes.write_f32::<LittleEndian>(v)?;
                }
            }
            if has_normals {
                for &v in &data.normals[corner.vn.unwrap()] {
                    bytes.write_f32::<LittleEndian>(v)?;
                }
            }

            let [x, y, z] = data.positions[corner.v];
            bytes.write_f32::<LittleEndian>(x)?;
            bytes.write_f32::<LittleEndian>(y)?;
            bytes.write_f32::<LittleEndian>(z)?;

            let point = BoundingBox::new(Vector3::new(x, y, z), Vector3::new(x, y, z));
            match bbox {
                Some(ref mut acc) => acc.union(&point),
                None => bbox = Some(point),
            }
        }
    }

    let buffer = device.create_buffer(&bytes)?;
    let info = BufferInfo::new(buffer, bytes.len(), format, names)?;

    let mut vao = VertexArray::new(DrawMode::Triangles);
    vao.buffer(info);

    Ok(Mesh {
        name: group.name.clone(),
        vao,
        material,
        attributes,
        bbox,
    })
}
