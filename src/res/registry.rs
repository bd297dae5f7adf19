//! Per-resource-type registries: loader-kind resolution, eager loading and
//! the deferred `add`/`load_pool` queue.
//!
//! Resolution precedence is fixed: an explicit kind on the description
//! always wins and skips extension sniffing entirely; otherwise kinds are
//! consulted in declared order and the first whose extension pattern
//! matches the path's suffix chain is chosen.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use crate::scene::Scene;
use crate::video::GpuDevice;

use super::desc::{
    DataDesc, DataKind, ProgramDesc, ProgramKind, SceneDesc, SceneKind, TextureDesc, TextureKind,
};
use super::errors::{Error, Result};
use super::finder::SearchPaths;
use super::loaders::data::{self, Data};
use super::loaders::program::{self, Program, ReloadableProgram};
use super::loaders::texture::{self, Texture};
use super::loaders::{gltf, obj, stl};

/// A closed set of loader discriminators for one resource category.
pub trait LoaderKind: Copy + PartialEq + fmt::Debug + 'static {
    /// Every kind, in resolution order.
    fn all() -> &'static [Self];

    fn name(self) -> &'static str;

    /// Multi-part extension patterns this kind claims, e.g. `"obj.gz"`.
    fn extensions(self) -> &'static [&'static str];

    /// Does the path's suffix chain match one of this kind's patterns.
    fn supports(self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|v| v.to_str()) {
            Some(v) => v.to_ascii_lowercase(),
            None => return false,
        };

        self.extensions()
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext)))
    }

    /// Looks a kind up by its configured name.
    fn from_name(name: &str) -> Result<Self> {
        Self::all()
            .iter()
            .cloned()
            .find(|v| v.name() == name)
            .ok_or_else(|| Error::UnsupportedKind {
                requested: name.into(),
                available: Self::all()
                    .iter()
                    .map(|v| v.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Picks the first kind whose extension pattern matches `path`.
    fn from_extension(path: &Path) -> Result<Self> {
        Self::all()
            .iter()
            .cloned()
            .find(|v| v.supports(path))
            .ok_or_else(|| Error::NoLoaderFound(path.into()))
    }
}

macro_rules! impl_pool {
    ($desc:ty, $resource:ty) => {
        /// Enqueues a description without loading it.
        pub fn add(&mut self, desc: $desc) {
            self.pending.push_back(desc);
        }

        /// The number of descriptions waiting in the pool.
        pub fn pending(&self) -> usize {
            self.pending.len()
        }

        /// Drains the pool in FIFO order, loading every queued description
        /// and clearing the queue.
        pub fn load_pool<G: GpuDevice>(
            &mut self,
            device: &mut G,
        ) -> Result<Vec<($desc, $resource)>> {
            let mut loaded = Vec::with_capacity(self.pending.len());
            while let Some(desc) = self.pending.pop_front() {
                let resource = self.load(device, &desc)?;
                loaded.push((desc, resource));
            }
            Ok(loaded)
        }
    };
}

#[derive(Default)]
pub struct TextureRegistry {
    pub paths: SearchPaths,
    pending: VecDeque<TextureDesc>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn mount<P: Into<::std::path::PathBuf>>(&mut self, dir: P) -> Result<()> {
        self.paths.mount(dir)
    }

    /// Explicit kind wins; a face set implies a cubemap and a layer list an
    /// array texture; everything else is a plain image.
    pub fn resolve(&self, desc: &TextureDesc) -> Result<TextureKind> {
        if let Some(kind) = desc.kind {
            return Ok(kind);
        }
        if desc.faces.is_some() {
            return Ok(TextureKind::Cube);
        }
        if desc.layers.is_some() {
            return Ok(TextureKind::Array);
        }
        Ok(TextureKind::Image)
    }

    pub fn load<G: GpuDevice>(&self, device: &mut G, desc: &TextureDesc) -> Result<Texture> {
        let kind = self.resolve(desc)?;
        texture::load(device, &self.paths, desc, kind)
    }

    impl_pool!(TextureDesc, Texture);
}

#[derive(Default)]
pub struct ProgramRegistry {
    pub paths: SearchPaths,
    pending: VecDeque<ProgramDesc>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn mount<P: Into<::std::path::PathBuf>>(&mut self, dir: P) -> Result<()> {
        self.paths.mount(dir)
    }

    /// Explicit kind wins; otherwise a lone `path` resolves to
    /// [`ProgramKind::Single`] and per-stage paths to
    /// [`ProgramKind::Separate`].
    pub fn resolve(&self, desc: &ProgramDesc) -> Result<ProgramKind> {
        if let Some(kind) = desc.kind {
            return Ok(kind);
        }
        if desc.path.is_some() {
            return Ok(ProgramKind::Single);
        }
        if desc.has_stage_paths() {
            return Ok(ProgramKind::Separate);
        }
        Err(Error::ProgramPathMissing)
    }

    pub fn load<G: GpuDevice>(&self, device: &mut G, desc: &ProgramDesc) -> Result<Program> {
        let kind = self.resolve(desc)?;
        program::load(device, &self.paths, desc, kind)
    }

    /// Loads and wraps the program in a hot-swappable proxy.
    pub fn load_reloadable<G: GpuDevice>(
        &self,
        device: &mut G,
        desc: &ProgramDesc,
    ) -> Result<ReloadableProgram> {
        Ok(ReloadableProgram::new(self.load(device, desc)?))
    }

    impl_pool!(ProgramDesc, Program);
}

#[derive(Default)]
pub struct SceneRegistry {
    pub paths: SearchPaths,
    pending: VecDeque<SceneDesc>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn mount<P: Into<::std::path::PathBuf>>(&mut self, dir: P) -> Result<()> {
        self.paths.mount(dir)
    }

    pub fn resolve(&self, desc: &SceneDesc) -> Result<SceneKind> {
        match desc.kind {
            Some(kind) => Ok(kind),
            None => SceneKind::from_extension(&desc.path),
        }
    }

    pub fn load<G: GpuDevice>(&self, device: &mut G, desc: &SceneDesc) -> Result<Scene> {
        match self.resolve(desc)? {
            SceneKind::Gltf => gltf::load(device, &self.paths, desc),
            SceneKind::Obj => obj::load(device, &self.paths, desc),
            SceneKind::Stl => stl::load(device, &self.paths, desc),
        }
    }

    impl_pool!(SceneDesc, Scene);
}

#[derive(Default)]
pub struct DataRegistry {
    pub paths: SearchPaths,
    pending: VecDeque<DataDesc>,
}

impl DataRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn mount<P: Into<::std::path::PathBuf>>(&mut self, dir: P) -> Result<()> {
        self.paths.mount(dir)
    }

    /// Explicit kind, then extension, then the text fallback.
    pub fn resolve(&self, desc: &DataDesc) -> Result<DataKind> {
        match desc.kind {
            Some(kind) => Ok(kind),
            None => Ok(DataKind::from_extension(&desc.path).unwrap_or(DataKind::Text)),
        }
    }

    pub fn load<G: GpuDevice>(&self, _: &mut G, desc: &DataDesc) -> Result<Data> {
        let kind = self.resolve(desc)?;
        data::load(&self.paths, desc, kind)
    }

    impl_pool!(DataDesc, Data);
}
