use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::json;

use glint::prelude::*;
use glint::res::errors::Error as ResError;

fn testbed(label: &str) -> PathBuf {
    let _ = env_logger::try_init();
    let dir = std::env::temp_dir()
        .join("glint-integration-tests")
        .join(format!("{}-{}", label, rand::random::<u32>()));
    for sub in &["textures", "programs", "scenes", "data"] {
        fs::create_dir_all(dir.join(sub)).unwrap();
    }
    dir
}

fn assets(root: &Path) -> Assets {
    let mut assets = Assets::new();
    assets.mount_all(root).unwrap();
    assets
}

fn write_png(path: &Path, components: u8) {
    let color = match components {
        3 => image::ColorType::RGB(8),
        4 => image::ColorType::RGBA(8),
        _ => unreachable!(),
    };
    let data = vec![128u8; 2 * 2 * components as usize];
    image::save_buffer(path, &data, 2, 2, color).unwrap();
}

const WHITE_GLSL: &str = "\
#version 330

#if defined VERTEX_SHADER
in vec3 in_position;
void main() {
    gl_Position = vec4(in_position, 1.0);
}
#elif defined FRAGMENT_SHADER
out vec4 fragColor;
void main() {
    fragColor = vec4(1.0);
}
#endif
";

#[test]
fn single_file_program_end_to_end() {
    let root = testbed("program");
    fs::write(root.join("programs/white.glsl"), WHITE_GLSL).unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let program = assets
        .programs
        .load(&mut device, &ProgramDesc::single("white.glsl"))
        .unwrap();

    assert_eq!(program.attributes, vec!["in_position".to_string()]);
    assert!(program.varyings.is_empty());
    assert_eq!(device.program_attributes(program.handle), program.attributes);
}

#[test]
fn cubemap_component_mismatch_fails_before_upload() {
    let root = testbed("cubemap");
    for face in &["px", "nx", "py", "ny", "pz"] {
        write_png(&root.join(format!("textures/{}.png", face)), 3);
    }
    write_png(&root.join("textures/nz.png"), 4);

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let mut desc = TextureDesc::new("");
    desc.faces = Some(Box::new(CubeFaces {
        pos_x: "px.png".into(),
        neg_x: "nx.png".into(),
        pos_y: "py.png".into(),
        neg_y: "ny.png".into(),
        pos_z: "pz.png".into(),
        neg_z: "nz.png".into(),
    }));

    match assets.textures.load(&mut device, &desc) {
        Err(ResError::ComponentMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, 3);
            assert_eq!(found, 4);
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
    assert_eq!(device.texture_count(), 0);
}

#[test]
fn cubemap_loads_as_six_layers() {
    let root = testbed("cubemap-ok");
    for face in &["px", "nx", "py", "ny", "pz", "nz"] {
        write_png(&root.join(format!("textures/{}.png", face)), 3);
    }

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let mut desc = TextureDesc::new("");
    desc.faces = Some(Box::new(CubeFaces {
        pos_x: "px.png".into(),
        neg_x: "nx.png".into(),
        pos_y: "py.png".into(),
        neg_y: "ny.png".into(),
        pos_z: "pz.png".into(),
        neg_z: "nz.png".into(),
    }));

    desc.mipmap = true;
    desc.mipmap_levels = Some(4);

    let texture = assets.textures.load(&mut device, &desc).unwrap();
    assert_eq!(texture.params.layers, 6);
    assert_eq!(texture.params.dimensions, (2, 2));
    assert_eq!(texture.params.mipmap_levels, Some(4));
    assert_eq!(device.texture_count(), 1);
}

#[test]
fn empty_layer_list_is_an_error() {
    let root = testbed("empty-layers");
    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let mut desc = TextureDesc::new("");
    desc.layers = Some(Vec::new());

    match assets.textures.load(&mut device, &desc) {
        Err(ResError::EmptyLayerList(_)) => {}
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
    assert_eq!(device.texture_count(), 0);
}

/// Three vertices with interleaved position+normal in one buffer view,
/// texcoords in a second view and u16 indices in a third.
fn write_gltf_payload(dir: &Path) -> serde_json::Value {
    let mut bin = Vec::new();
    let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    for p in &positions {
        for &v in p {
            bin.write_f32::<LittleEndian>(v).unwrap();
        }
        for &v in &[0.0f32, 0.0, 1.0] {
            bin.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    for uv in &[[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        for &v in uv {
            bin.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    for &i in &[0u16, 1, 2] {
        bin.write_u16::<LittleEndian>(i).unwrap();
    }
    fs::write(dir.join("tri.bin"), &bin).unwrap();

    json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"name": "tri", "nodes": [0]}],
        "nodes": [{"mesh": 0, "translation": [1.0, 2.0, 3.0]}],
        "meshes": [{
            "name": "tri",
            "primitives": [{
                "attributes": {"POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2},
                "indices": 3,
                "material": 0
            }]
        }],
        "materials": [{
            "name": "red",
            "pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0]}
        }],
        "accessors": [
            {"bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 3,
             "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 0, "byteOffset": 12, "componentType": 5126, "count": 3,
             "type": "VEC3"},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2"},
            {"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 72, "byteStride": 24},
            {"buffer": 0, "byteOffset": 72, "byteLength": 24},
            {"buffer": 0, "byteOffset": 96, "byteLength": 6}
        ],
        "buffers": [{"uri": "tri.bin", "byteLength": 102}]
    })
}

#[test]
fn gltf_interleaved_accessors_merge_into_one_buffer() {
    let root = testbed("gltf");
    let document = write_gltf_payload(&root.join("scenes"));
    fs::write(
        root.join("scenes/tri.gltf"),
        serde_json::to_vec(&document).unwrap(),
    )
    .unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let scene = assets
        .scenes
        .load(&mut device, &SceneDesc::new("tri.gltf"))
        .unwrap();

    assert_eq!(scene.name.as_deref(), Some("tri"));
    assert_eq!(scene.meshes.len(), 1);

    // Position+normal merged into one 24-byte-stride buffer, texcoords in a
    // second; non-adjacent accessors never merge.
    let mesh = &scene.meshes[0];
    let buffers = mesh.vao.buffers();
    assert_eq!(buffers.len(), 2);

    let sizes: Vec<usize> = buffers
        .iter()
        .map(|v| device.buffer_size(v.buffer()).unwrap())
        .collect();
    assert!(sizes.contains(&72));
    assert!(sizes.contains(&24));

    let index = mesh.vao.index().unwrap();
    assert_eq!(index.element_size, 2);
    assert_eq!(index.count, 3);

    assert_eq!(scene.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);

    // Node translation shifts the accessor min/max bounds.
    let bbox = scene.calc_bbox().unwrap();
    assert!((bbox.min.x - 1.0).abs() < 1e-6);
    assert!((bbox.max.y - 3.0).abs() < 1e-6);
    assert!((bbox.max.z - 3.0).abs() < 1e-6);
}

#[test]
fn gltf_scene_binds_against_a_program() {
    let root = testbed("gltf-bind");
    let document = write_gltf_payload(&root.join("scenes"));
    fs::write(
        root.join("scenes/tri.gltf"),
        serde_json::to_vec(&document).unwrap(),
    )
    .unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let mut scene = assets
        .scenes
        .load(&mut device, &SceneDesc::new("tri.gltf"))
        .unwrap();

    let mut sources = ProgramSources::default();
    sources.vertex = Some(
        "#version 330\nin vec3 in_position;\nin vec2 in_texcoord_0;\nvoid main() {}\n".into(),
    );
    let program = device.create_program(&sources).unwrap();

    let handle = scene.meshes[0].vao.bind(&mut device, program).unwrap();
    assert_eq!(device.vertex_array_count(), 1);

    // A second bind against the same program reuses the cached object.
    assert_eq!(scene.meshes[0].vao.bind(&mut device, program).unwrap(), handle);
    assert_eq!(device.vertex_array_count(), 1);

    scene.release(&mut device);
    assert_eq!(device.vertex_array_count(), 0);
}

#[test]
fn glb_container_end_to_end() {
    let root = testbed("glb");
    let scenes = root.join("scenes");
    let document = write_gltf_payload(&scenes);
    let bin = fs::read(scenes.join("tri.bin")).unwrap();

    // Rewrite the buffer entry as the GLB binary chunk.
    let mut document = document;
    document["buffers"] = json!([{"byteLength": bin.len()}]);
    let json = serde_json::to_vec(&document).unwrap();

    let mut glb = Vec::new();
    glb.write_u32::<LittleEndian>(0x4654_6C67).unwrap();
    glb.write_u32::<LittleEndian>(2).unwrap();
    glb.write_u32::<LittleEndian>((12 + 8 + json.len() + 8 + bin.len()) as u32)
        .unwrap();
    glb.write_u32::<LittleEndian>(json.len() as u32).unwrap();
    glb.write_u32::<LittleEndian>(0x4E4F_534A).unwrap();
    glb.extend_from_slice(&json);
    glb.write_u32::<LittleEndian>(bin.len() as u32).unwrap();
    glb.write_u32::<LittleEndian>(0x004E_4942).unwrap();
    glb.extend_from_slice(&bin);
    fs::write(scenes.join("tri.glb"), &glb).unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let scene = assets
        .scenes
        .load(&mut device, &SceneDesc::new("tri.glb"))
        .unwrap();
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.meshes[0].vao.vertex_count(), 3);
}

#[test]
fn obj_with_materials_end_to_end() {
    let root = testbed("obj");
    write_png(&root.join("scenes/side.png"), 3);
    fs::write(
        root.join("scenes/quad.mtl"),
        "newmtl painted\nKd 0.5 0.25 0.125\nmap_Kd side.png\n",
    )
    .unwrap();
    fs::write(
        root.join("scenes/quad.obj"),
        "mtllib quad.mtl\n\
         o quad\n\
         v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
         vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
         vn 0 0 1\n\
         usemtl painted\n\
         f 1/1/1 2/2/1 3/3/1 4/4/1\n",
    )
    .unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let scene = assets
        .scenes
        .load(&mut device, &SceneDesc::new("quad.obj"))
        .unwrap();

    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(scene.nodes[0].name.as_deref(), Some("quad"));

    let material = &scene.materials[0];
    assert_eq!(material.name.as_deref(), Some("painted"));
    assert_eq!(material.base_color, [0.5, 0.25, 0.125, 1.0]);
    assert!(material.texture.is_some());

    // Two triangles, expanded and interleaved as 2f 3f 3f.
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.vao.vertex_count(), 6);
    let names: Vec<&str> = mesh.attributes.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["in_texcoord_0", "in_normal", "in_position"]);

    let buffers = mesh.vao.buffers();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].vertex_size(), 32);
    assert_eq!(device.buffer_size(buffers[0].buffer()).unwrap(), 6 * 32);
}

#[test]
fn gzipped_stl_resolves_and_loads() {
    let root = testbed("stl");

    // One binary triangle, gzipped.
    let mut stl = vec![0u8; 80];
    stl.write_u32::<LittleEndian>(1).unwrap();
    for &v in &[0.0f32, 0.0, 1.0] {
        stl.write_f32::<LittleEndian>(v).unwrap();
    }
    for vertex in &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for &v in vertex {
            stl.write_f32::<LittleEndian>(v).unwrap();
        }
    }
    stl.write_u16::<LittleEndian>(0).unwrap();

    let file = fs::File::create(root.join("scenes/part.stl.gz")).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(&stl).unwrap();
    encoder.finish().unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let desc = SceneDesc::new("part.stl.gz");
    assert_eq!(assets.scenes.resolve(&desc).unwrap(), SceneKind::Stl);

    let scene = assets.scenes.load(&mut device, &desc).unwrap();
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.vao.vertex_count(), 3);
    assert_eq!(mesh.vao.buffers()[0].vertex_size(), 24);
    assert_eq!(mesh.material, Some(0));

    let bbox = scene.calc_bbox().unwrap();
    assert_eq!(bbox.max.x, 1.0);
    assert_eq!(bbox.max.y, 1.0);
}

#[test]
fn data_pool_drains_in_order() {
    let root = testbed("data");
    fs::write(root.join("data/config.json"), r#"{"speed": 3}"#).unwrap();
    fs::write(root.join("data/notes.txt"), "hello").unwrap();

    let mut assets = assets(&root);
    let mut device = HeadlessDevice::new();

    assets.data.add(DataDesc::new("config.json"));
    assets.data.add(DataDesc::new("notes.txt"));
    assert_eq!(assets.data.pending(), 2);

    let loaded = assets.data.load_pool(&mut device).unwrap();
    assert_eq!(assets.data.pending(), 0);
    assert_eq!(loaded.len(), 2);

    match &loaded[0].1 {
        Data::Json(value) => assert_eq!(value["speed"], 3),
        other => panic!("unexpected: {:?}", other),
    }
    match &loaded[1].1 {
        Data::Text(text) => assert_eq!(text, "hello"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn shader_includes_and_defines_end_to_end() {
    let root = testbed("includes");
    fs::write(
        root.join("programs/common.glsl"),
        "uniform mat4 mvp;\n#define LIGHT_COUNT 4\n",
    )
    .unwrap();
    fs::write(
        root.join("programs/lit.vert"),
        "#version 330\n#include \"common.glsl\"\nin vec3 in_position;\nvoid main() {}\n",
    )
    .unwrap();
    fs::write(
        root.join("programs/lit.frag"),
        "#version 330\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n",
    )
    .unwrap();

    let assets = assets(&root);
    let mut device = HeadlessDevice::new();

    let mut desc = ProgramDesc::separate();
    desc.vertex_shader = Some("lit.vert".into());
    desc.fragment_shader = Some("lit.frag".into());
    desc.defines = vec![("LIGHT_COUNT".into(), "16".into())];

    let program = assets.programs.load(&mut device, &desc).unwrap();
    assert_eq!(program.attributes, vec!["in_position".to_string()]);
}
