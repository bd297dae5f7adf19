//! Typed resource descriptions — one explicit struct per resource category,
//! with a closed kind enum each instead of free-form discriminator strings.
//!
//! Descriptions are plain data: resolution never mutates them, and one
//! description can be passed to `load` any number of times.

use std::path::PathBuf;

use super::registry::LoaderKind;

/// Which concrete loader handles a texture description.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureKind {
    /// A single 2D image file.
    Image,
    /// An array texture assembled from N layer files.
    Array,
    /// A cubemap assembled from 6 face files.
    Cube,
}

impl LoaderKind for TextureKind {
    fn all() -> &'static [Self] {
        &[TextureKind::Image, TextureKind::Array, TextureKind::Cube]
    }

    fn name(self) -> &'static str {
        match self {
            TextureKind::Image => "image",
            TextureKind::Array => "array",
            TextureKind::Cube => "cube",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            TextureKind::Image => &["png", "jpg", "jpeg", "bmp", "tga"],
            // Layered kinds are assembled from several files and are never
            // inferred from an extension.
            TextureKind::Array | TextureKind::Cube => &[],
        }
    }
}

/// The six cubemap faces, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFaces {
    pub pos_x: PathBuf,
    pub neg_x: PathBuf,
    pub pos_y: PathBuf,
    pub neg_y: PathBuf,
    pub pos_z: PathBuf,
    pub neg_z: PathBuf,
}

impl CubeFaces {
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        vec![
            &self.pos_x,
            &self.neg_x,
            &self.pos_y,
            &self.neg_y,
            &self.pos_z,
            &self.neg_z,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Relative path of the image file (plain 2D textures).
    pub path: PathBuf,
    pub kind: Option<TextureKind>,
    /// Flip the image vertically while decoding.
    pub flip: bool,
    pub mipmap: bool,
    /// Explicit mipmap chain length; `None` lets the backend derive a full
    /// chain when `mipmap` is set.
    pub mipmap_levels: Option<u32>,
    pub anisotropy: f32,
    /// Layer files for [`TextureKind::Array`].
    pub layers: Option<Vec<PathBuf>>,
    /// Face files for [`TextureKind::Cube`].
    pub faces: Option<Box<CubeFaces>>,
}

impl Default for TextureDesc {
    fn default() -> Self {
        TextureDesc {
            path: PathBuf::new(),
            kind: None,
            flip: true,
            mipmap: false,
            mipmap_levels: None,
            anisotropy: 1.0,
            layers: None,
            faces: None,
        }
    }
}

impl TextureDesc {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        TextureDesc {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Single-file programs carry every stage in one source, separate-file
/// programs supply one path per stage.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProgramKind {
    Single,
    Separate,
}

impl LoaderKind for ProgramKind {
    fn all() -> &'static [Self] {
        &[ProgramKind::Single, ProgramKind::Separate]
    }

    fn name(self) -> &'static str {
        match self {
            ProgramKind::Single => "single",
            ProgramKind::Separate => "separate",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            ProgramKind::Single => &["glsl"],
            ProgramKind::Separate => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramDesc {
    /// Source shared by all stages ([`ProgramKind::Single`]).
    pub path: Option<PathBuf>,
    pub vertex_shader: Option<PathBuf>,
    pub fragment_shader: Option<PathBuf>,
    pub geometry_shader: Option<PathBuf>,
    pub tess_control_shader: Option<PathBuf>,
    pub tess_evaluation_shader: Option<PathBuf>,
    pub compute_shader: Option<PathBuf>,
    pub kind: Option<ProgramKind>,
    /// `#define NAME VALUE` overrides applied during source assembly.
    pub defines: Vec<(String, String)>,
    /// Explicit transform-feedback varyings. When empty and no fragment
    /// stage exists, out-attributes are auto-detected.
    pub varyings: Vec<String>,
    /// Wrap the result in a hot-swappable proxy.
    pub reloadable: bool,
}

impl ProgramDesc {
    pub fn single<P: Into<PathBuf>>(path: P) -> Self {
        ProgramDesc {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn separate() -> Self {
        Default::default()
    }

    /// Does the description carry any per-stage path.
    pub fn has_stage_paths(&self) -> bool {
        self.vertex_shader.is_some()
            || self.fragment_shader.is_some()
            || self.geometry_shader.is_some()
            || self.tess_control_shader.is_some()
            || self.tess_evaluation_shader.is_some()
            || self.compute_shader.is_some()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SceneKind {
    Gltf,
    Obj,
    Stl,
}

impl LoaderKind for SceneKind {
    fn all() -> &'static [Self] {
        &[SceneKind::Gltf, SceneKind::Obj, SceneKind::Stl]
    }

    fn name(self) -> &'static str {
        match self {
            SceneKind::Gltf => "gltf",
            SceneKind::Obj => "obj",
            SceneKind::Stl => "stl",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            SceneKind::Gltf => &["gltf", "glb"],
            SceneKind::Obj => &["obj", "obj.gz"],
            SceneKind::Stl => &["stl", "stl.gz"],
        }
    }
}

/// Shader attribute names the scene loaders bind semantic vertex channels
/// to.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNames {
    pub position: String,
    pub normal: String,
    pub tangent: String,
    pub texcoord_0: String,
    pub texcoord_1: String,
    pub color_0: String,
    pub joints_0: String,
    pub weights_0: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        AttributeNames {
            position: "in_position".into(),
            normal: "in_normal".into(),
            tangent: "in_tangent".into(),
            texcoord_0: "in_texcoord_0".into(),
            texcoord_1: "in_texcoord_1".into(),
            color_0: "in_color_0".into(),
            joints_0: "in_joints_0".into(),
            weights_0: "in_weights_0".into(),
        }
    }
}

impl AttributeNames {
    /// The shader name for a glTF semantic, if the semantic is known.
    pub fn for_semantic(&self, semantic: &str) -> Option<&str> {
        match semantic {
            "POSITION" => Some(&self.position),
            "NORMAL" => Some(&self.normal),
            "TANGENT" => Some(&self.tangent),
            "TEXCOORD_0" => Some(&self.texcoord_0),
            "TEXCOORD_1" => Some(&self.texcoord_1),
            "COLOR_0" => Some(&self.color_0),
            "JOINTS_0" => Some(&self.joints_0),
            "WEIGHTS_0" => Some(&self.weights_0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDesc {
    pub path: PathBuf,
    pub kind: Option<SceneKind>,
    pub attr_names: Option<AttributeNames>,
}

impl SceneDesc {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SceneDesc {
            path: path.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DataKind {
    Text,
    Binary,
    Json,
}

impl LoaderKind for DataKind {
    fn all() -> &'static [Self] {
        &[DataKind::Json, DataKind::Binary, DataKind::Text]
    }

    fn name(self) -> &'static str {
        match self {
            DataKind::Text => "text",
            DataKind::Binary => "binary",
            DataKind::Json => "json",
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            DataKind::Json => &["json"],
            DataKind::Binary => &["bin"],
            DataKind::Text => &["txt"],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDesc {
    pub path: PathBuf,
    pub kind: Option<DataKind>,
}

impl DataDesc {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        DataDesc {
            path: path.into(),
            ..Default::default()
        }
    }
}
