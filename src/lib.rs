//! # glint
//!
//! A small convenience layer that sits between an application and an
//! OpenGL-style GPU binding. It unifies resource loading behind a
//! finder/loader/registry pipeline and wraps raw GPU buffers into vertex
//! arrays that know how to bind themselves against a shader program's
//! declared inputs.
//!
//! The crate is split in two halves:
//!
//! - [`res`] is the CPU-facing half: search paths, typed resource
//!   descriptions, per-type registries and the actual loaders (textures,
//!   shader programs, glTF/OBJ/STL scenes, raw data).
//! - [`video`] is the GPU-facing half: the vertex-format mini-language,
//!   `BufferInfo`/`VertexArray` and the attribute-binding algorithm, plus the
//!   `GpuDevice` seam the loaders upload through.
//!
//! The whole pipeline is synchronous and single-threaded by design; every
//! load happens on the caller's thread and either returns the resource or a
//! descriptive error. There is no retry, no cancellation and no background
//! prefetch.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

#[macro_use]
pub mod utils;
pub mod video;
pub mod res;
pub mod scene;
pub mod window;

pub mod prelude {
    pub use crate::res::prelude::*;
    pub use crate::scene::{Material, Mesh, Node, Scene};
    pub use crate::video::prelude::*;
    pub use crate::window::{Event, HeadlessWindow, Window};
}
