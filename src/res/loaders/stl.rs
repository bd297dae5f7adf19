//! STL loading, binary and ASCII.
//!
//! Both forms produce the same scene shape: a single mesh with one
//! interleaved position+normal buffer (`"3f 3f"`), one default material and
//! one root node. The per-facet normal is replicated onto each of the three
//! corners.

use std::io::Cursor;
use std::str;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::Vector3;

use crate::res::desc::SceneDesc;
use crate::res::errors::{Error, Result};
use crate::res::finder::SearchPaths;
use crate::scene::{AttributeInfo, BoundingBox, Material, Mesh, Node, Scene};
use crate::video::format::{AttributeFormat, VertexFormat};
use crate::video::vao::{BufferInfo, DrawMode, VertexArray};
use crate::video::GpuDevice;

const BINARY_HEADER: usize = 80;
const BINARY_TRIANGLE: usize = 50;

/// One parsed facet: the normal and its three corners.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Facet {
    normal: [f32; 3],
    vertices: [[f32; 3]; 3],
}

pub fn load<G: GpuDevice>(device: &mut G, paths: &SearchPaths, desc: &SceneDesc) -> Result<Scene> {
    let located = paths.locate(&desc.path)?;
    info!("Loads STL scene {:?}.", desc.path);

    let raw = super::read_maybe_gz(&located)?;
    let facets = match str::from_utf8(&raw) {
        Ok(text) if is_ascii(text) => parse_ascii(text)?,
        _ => parse_binary(&raw)?,
    };

    let attr_names = desc.attr_names.clone().unwrap_or_default();

    let mut format = VertexFormat {
        attributes: Default::default(),
        per_instance: false,
    };
    format.attributes.push(AttributeFormat::parse("3f")?);
    format.attributes.push(AttributeFormat::parse("3f")?);
    let names = vec![attr_names.position.clone(), attr_names.normal.clone()];

    let mut bytes = Vec::with_capacity(facets.len() * 3 * format.vertex_size());
    let mut bbox: Option<BoundingBox> = None;

    for facet in &facets {
        for vertex in &facet.vertices {
            for &v in vertex {
                bytes.write_f32::<LittleEndian>(v)?;
            }
            for &v in &facet.normal {
                bytes.write_f32::<LittleEndian>(v)?;
            }

            let p = Vector3::new(vertex[0], vertex[1], vertex[2]);
            let point = BoundingBox::new(p, p);
            match bbox {
                Some(ref mut acc) => acc.union(&point),
                None => bbox = Some(point),
            }
        }
    }

    let attributes = format
        .attributes
        .iter()
        .zip(&names)
        .map(|(format, name)| AttributeInfo {
            name: name.clone(),
            format: *format,
        })
        .collect();

    let buffer = device.create_buffer(&bytes)?;
    let info = BufferInfo::new(buffer, bytes.len(), format, names)?;

    let mut vao = VertexArray::new(DrawMode::Triangles);
    vao.buffer(info);

    let mut scene = Scene::new();
    scene.materials.push(Material {
        name: Some("default".into()),
        ..Default::default()
    });
    scene.meshes.push(Mesh {
        name: None,
        vao,
        material: Some(0),
        attributes,
        bbox,
    });

    let mut root = Node::new();
    root.mesh = Some(0);
    scene.nodes.push(root);

    Ok(scene)
}

/// ASCII files start with `solid` and spell their facets out; binary files
/// may also start with `solid` inside the free-form header, so the facet
/// keyword decides.
fn is_ascii(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("solid") && text.contains("facet")
}

fn parse_binary(raw: &[u8]) -> Result<Vec<Facet>> {
    if raw.len() < BINARY_HEADER + 4 {
        return Err(Error::MalformedScene("truncated binary STL header".into()));
    }

    let mut cursor = Cursor::new(&raw[BINARY_HEADER..]);
    let count = cursor.read_u32::<LittleEndian>()? as usize;

    let expected = BINARY_HEADER + 4 + count * BINARY_TRIANGLE;
    if raw.len() != expected {
        return Err(Error::MalformedScene(format!(
            "binary STL declares {} triangles ({} bytes) but the file holds {}",
            count,
            expected,
            raw.len()
        )));
    }

    let mut facets = Vec::with_capacity(count);
    for _ in 0..count {
        let mut normal = [0.0; 3];
        for v in &mut normal {
            *v = cursor.read_f32::<LittleEndian>()?;
        }

        let mut vertices = [[0.0; 3]; 3];
        for vertex in &mut vertices {
            for v in vertex.iter_mut() {
                *v = cursor.read_f32::<LittleEndian>()?;
            }
        }

        // Attribute byte count, unused.
        cursor.read_u16::<LittleEndian>()?;
        facets.push(Facet { normal, vertices });
    }

    Ok(facets)
}

fn parse_ascii(source: &str) -> Result<Vec<Facet>> {
    let mut facets = Vec::new();
    let mut normal: Option<[f32; 3]> = None;
    let mut vertices: Vec<[f32; 3]> = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let malformed =
            |what: &str| Error::MalformedScene(format!("{} on line {}", what, number + 1));

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                // "facet normal nx ny nz"
                let floats: Vec<f32> = tokens.skip(1).filter_map(|v| v.parse().ok()).collect();
                if floats.len() != 3 {
                    return Err(malformed("bad facet normal"));
                }
                normal = Some([floats[0], floats[1], floats[2]]);
                vertices.clear();
            }
            Some("vertex") => {
                let floats: Vec<f32> = tokens.filter_map(|v| v.parse().ok()).collect();
                if floats.len() != 3 {
                    return Err(malformed("bad vertex"));
                }
                vertices.push([floats[0], floats[1], floats[2]]);
            }
            Some("endfacet") => {
                let normal = normal.take().ok_or_else(|| malformed("endfacet without facet"))?;
                if vertices.len() != 3 {
                    return Err(malformed("facet without exactly 3 vertices"));
                }
                facets.push(Facet {
                    normal,
                    vertices: [vertices[0], vertices[1], vertices[2]],
                });
                vertices.clear();
            }
            _ => {}
        }
    }

    Ok(facets)
}

#[cfg(test)]
mod test {
    use super::*;

    fn binary_stl(facets: &[Facet]) -> Vec<u8> {
        let mut out = vec![0u8; BINARY_HEADER];
        out.write_u32::<LittleEndian>(facets.len() as u32).unwrap();
        for facet in facets {
            for &v in &facet.normal {
                out.write_f32::<LittleEndian>(v).unwrap();
            }
            for vertex in &facet.vertices {
                for &v in vertex {
                    out.write_f32::<LittleEndian>(v).unwrap();
                }
            }
            out.write_u16::<LittleEndian>(0).unwrap();
        }
        out
    }

    fn tri() -> Facet {
        Facet {
            normal: [0.0, 0.0, 1.0],
            vertices: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    #[test]
    fn binary_round_trip() {
        let raw = binary_stl(&[tri(), tri()]);
        let facets = parse_binary(&raw).unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0], tri());
    }

    #[test]
    fn binary_length_must_match() {
        let mut raw = binary_stl(&[tri()]);
        raw.pop();
        assert!(parse_binary(&raw).is_err());

        assert!(parse_binary(&[0u8; 40]).is_err());
    }

    #[test]
    fn ascii_facets() {
        let source = "solid part\n\
                      facet normal 0 0 1\n\
                      outer loop\n\
                      vertex 0 0 0\n\
                      vertex 1 0 0\n\
                      vertex 0 1 0\n\
                      endloop\n\
                      endfacet\n\
                      endsolid part\n";

        let facets = parse_ascii(source).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0], tri());
    }

    #[test]
    fn ascii_detection() {
        assert!(is_ascii("solid part\nfacet normal 0 0 1\n"));
        assert!(!is_ascii("solid part\n"));

        // A binary file whose header happens to start with "solid" still
        // parses as binary because no facet keyword follows.
        let mut raw = binary_stl(&[tri()]);
        raw[..5].copy_from_slice(b"solid");
        if let Ok(text) = str::from_utf8(&raw) {
            assert!(!is_ascii(text));
        }
        assert!(parse_binary(&raw).is_ok());
    }
}
