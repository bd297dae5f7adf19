//! The resource pipeline: search paths, typed descriptions, registries and
//! loaders.
//!
//! A caller builds a typed description ([`desc::TextureDesc`],
//! [`desc::ProgramDesc`], [`desc::SceneDesc`] or [`desc::DataDesc`]) and
//! passes it to the matching registry on [`Assets`]. The registry resolves
//! which loader kind handles the description — by explicit kind, or by
//! sniffing the path's extension chain — and invokes the loader, which in
//! turn locates the file through the registry's [`finder::SearchPaths`],
//! parses it, and uploads through the caller's
//! [`GpuDevice`](crate::video::GpuDevice).
//!
//! Everything is synchronous and blocking: a load either returns the
//! resource or a descriptive error, on the caller's thread. The deferred
//! `add`/`load_pool` mode only batches; it changes nothing about how each
//! resource loads.

pub mod desc;
pub mod errors;
pub mod finder;
pub mod loaders;
pub mod registry;

pub mod prelude {
    pub use super::desc::{
        AttributeNames, CubeFaces, DataDesc, DataKind, ProgramDesc, ProgramKind, SceneDesc,
        SceneKind, TextureDesc, TextureKind,
    };
    pub use super::finder::SearchPaths;
    pub use super::loaders::data::Data;
    pub use super::loaders::program::{Program, ReloadableProgram};
    pub use super::loaders::texture::Texture;
    pub use super::registry::{
        DataRegistry, LoaderKind, ProgramRegistry, SceneRegistry, TextureRegistry,
    };
    pub use super::Assets;
}

use std::path::Path;

use self::errors::Result;
use self::registry::{DataRegistry, ProgramRegistry, SceneRegistry, TextureRegistry};

/// The explicit resource context: one registry per resource category, each
/// with its own ordered search-path list and pending pool. Constructed once
/// at startup and passed by reference wherever loading happens; there is no
/// global state.
#[derive(Default)]
pub struct Assets {
    pub textures: TextureRegistry,
    pub programs: ProgramRegistry,
    pub scenes: SceneRegistry,
    pub data: DataRegistry,
}

impl Assets {
    pub fn new() -> Self {
        Default::default()
    }

    /// Mounts the conventional subdirectories of a resource root —
    /// `textures/`, `programs/`, `scenes/` and `data/` — on the matching
    /// registries, skipping the ones that do not exist.
    pub fn mount_all<P: AsRef<Path>>(&mut self, root: P) -> Result<()> {
        let root = root.as_ref();

        let mounts = vec![
            ("textures", &mut self.textures.paths),
            ("programs", &mut self.programs.paths),
            ("scenes", &mut self.scenes.paths),
            ("data", &mut self.data.paths),
        ];

        for (name, paths) in mounts {
            let dir = root.join(name);
            if dir.is_dir() {
                paths.mount(dir)?;
            } else {
                info!("Skips missing resource directory {:?}.", dir);
            }
        }

        Ok(())
    }
}
