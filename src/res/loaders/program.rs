//! Shader program assembly and linking.
//!
//! Single-file programs keep all stages in one GLSL source and select the
//! active stage with preprocessor markers (`VERTEX_SHADER`,
//! `FRAGMENT_SHADER`, ...). Separate-file programs supply one source per
//! stage. Either way every stage source is assembled the same way: the
//! `#version` pragma stays first, a stage define is injected right after it,
//! `#include "file"` directives are expanded recursively through the search
//! paths, and `#define NAME VALUE` overrides from the description are
//! applied last.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::res::desc::{ProgramDesc, ProgramKind};
use crate::res::errors::{Error, Result};
use crate::res::finder::SearchPaths;
use crate::video::{GpuDevice, ProgramHandle, ProgramSources};

const MAX_INCLUDE_DEPTH: usize = 100;

/// The shader stages a program can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl ShaderStage {
    /// The preprocessor symbol injected while assembling this stage, and
    /// the marker a single-file source uses to opt the stage in.
    pub fn define(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX_SHADER",
            ShaderStage::Fragment => "FRAGMENT_SHADER",
            ShaderStage::Geometry => "GEOMETRY_SHADER",
            ShaderStage::TessControl => "TESS_CONTROL_SHADER",
            ShaderStage::TessEvaluation => "TESS_EVALUATION_SHADER",
            ShaderStage::Compute => "COMPUTE_SHADER",
        }
    }
}

/// A linked program: the backend handle plus the attribute and varying
/// names it was created with.
#[derive(Debug, Clone)]
pub struct Program {
    pub handle: ProgramHandle,
    /// Vertex-stage input attributes as reported by the backend.
    pub attributes: Vec<String>,
    /// Transform-feedback varyings the program was linked with.
    pub varyings: Vec<String>,
    /// The description path the program was loaded from, kept for reloads.
    pub path: Option<PathBuf>,
}

/// A hot-swappable program proxy. Holders keep the proxy; a reload swaps
/// the inner [`Program`] without disturbing them.
#[derive(Debug)]
pub struct ReloadableProgram {
    inner: RefCell<Program>,
}

impl ReloadableProgram {
    pub fn new(program: Program) -> Self {
        ReloadableProgram {
            inner: RefCell::new(program),
        }
    }

    pub fn handle(&self) -> ProgramHandle {
        self.inner.borrow().handle
    }

    pub fn attributes(&self) -> Vec<String> {
        self.inner.borrow().attributes.clone()
    }

    /// Replaces the inner program, returning the previous one so the caller
    /// can release its backend handle.
    pub fn swap(&self, program: Program) -> Program {
        self.inner.replace(program)
    }
}

pub fn load<G: GpuDevice>(
    device: &mut G,
    paths: &SearchPaths,
    desc: &ProgramDesc,
    kind: ProgramKind,
) -> Result<Program> {
    let (sources, path) = match kind {
        ProgramKind::Single => {
            let relative = desc.path.as_ref().ok_or(Error::ProgramPathMissing)?;
            let located = paths.locate(relative)?;
            info!("Loads program {:?}.", relative);
            (assemble_single(paths, relative, &located, desc)?, Some(relative.clone()))
        }
        ProgramKind::Separate => {
            if !desc.has_stage_paths() {
                return Err(Error::ProgramPathMissing);
            }
            info!("Loads program from per-stage sources.");
            (assemble_separate(paths, desc)?, None)
        }
    };

    let handle = device.create_program(&sources)?;
    let attributes = device.program_attributes(handle);
    Ok(Program {
        handle,
        attributes,
        varyings: sources.varyings,
        path,
    })
}

fn assemble_single(
    paths: &SearchPaths,
    relative: &Path,
    located: &Path,
    desc: &ProgramDesc,
) -> Result<ProgramSources> {
    let source = fs::read_to_string(located)?;

    // The vertex stage is always assembled from a single-file source; the
    // remaining stages opt in by referencing their marker symbol.
    let mut sources = ProgramSources::default();
    sources.vertex = Some(assemble_stage(
        paths,
        relative,
        &source,
        ShaderStage::Vertex,
        &desc.defines,
    )?);

    for &stage in &[
        ShaderStage::Fragment,
        ShaderStage::Geometry,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
    ] {
        if source.contains(stage.define()) {
            let assembled = assemble_stage(paths, relative, &source, stage, &desc.defines)?;
            match stage {
                ShaderStage::Fragment => sources.fragment = Some(assembled),
                ShaderStage::Geometry => sources.geometry = Some(assembled),
                ShaderStage::TessControl => sources.tess_control = Some(assembled),
                ShaderStage::TessEvaluation => sources.tess_evaluation = Some(assembled),
                _ => unreachable!(),
            }
        }
    }

    sources.varyings = resolve_varyings(&sources, desc);
    Ok(sources)
}

fn assemble_separate(paths: &SearchPaths, desc: &ProgramDesc) -> Result<ProgramSources> {
    let mut sources = ProgramSources::default();

    let stages: [(&Option<PathBuf>, ShaderStage); 6] = [
        (&desc.vertex_shader, ShaderStage::Vertex),
        (&desc.fragment_shader, ShaderStage::Fragment),
        (&desc.geometry_shader, ShaderStage::Geometry),
        (&desc.tess_control_shader, ShaderStage::TessControl),
        (&desc.tess_evaluation_shader, ShaderStage::TessEvaluation),
        (&desc.compute_shader, ShaderStage::Compute),
    ];

    for (relative, stage) in &stages {
        if let Some(relative) = relative {
            let located = paths.locate(relative)?;
            let source = fs::read_to_string(&located)?;
            let assembled = assemble_stage(paths, relative, &source, *stage, &desc.defines)?;
            match stage {
                ShaderStage::Vertex => sources.vertex = Some(assembled),
                ShaderStage::Fragment => sources.fragment = Some(assembled),
                ShaderStage::Geometry => sources.geometry = Some(assembled),
                ShaderStage::TessControl => sources.tess_control = Some(assembled),
                ShaderStage::TessEvaluation => sources.tess_evaluation = Some(assembled),
                ShaderStage::Compute => sources.compute = Some(assembled),
            }
        }
    }

    sources.varyings = resolve_varyings(&sources, desc);
    Ok(sources)
}

/// Explicit varyings win. Without them, a program that has no fragment
/// stage (and is not compute-only) captures the out-attributes of its last
/// vertex-processing stage.
fn resolve_varyings(sources: &ProgramSources, desc: &ProgramDesc) -> Vec<String> {
    if !desc.varyings.is_empty() {
        return desc.varyings.clone();
    }
    if sources.fragment.is_some() {
        return Vec::new();
    }

    if let Some(geometry) = &sources.geometry {
        return detect_out_attributes(geometry);
    }
    if let Some(vertex) = &sources.vertex {
        return detect_out_attributes(vertex);
    }
    Vec::new()
}

/// Collects the names of plain `out <type> <name>;` declarations.
fn detect_out_attributes(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("//") {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() == 3 && tokens[0] == "out" {
            names.push(tokens[2].trim_end_matches(';').to_string());
        }
    }
    names
}

/// Assembles one stage from `source`: validates the `#version` pragma,
/// injects the stage define, expands includes and applies define overrides.
pub(crate) fn assemble_stage(
    paths: &SearchPaths,
    relative: &Path,
    source: &str,
    stage: ShaderStage,
    defines: &[(String, String)],
) -> Result<String> {
    let mut lines = source.lines().enumerate();

    let (version_index, version_line) = loop {
        match lines.next() {
            Some((index, line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if line.trim_start().starts_with("#version") {
                    break (index, line);
                }
                return Err(Error::MissingVersionPragma {
                    path: relative.into(),
                    line: index + 1,
                });
            }
            None => {
                return Err(Error::MissingVersionPragma {
                    path: relative.into(),
                    line: 1,
                });
            }
        }
    };

    let mut assembled = String::new();
    assembled.push_str(version_line.trim_start());
    assembled.push('\n');
    assembled.push_str(&format!("#define {} 1\n", stage.define()));
    assembled.push_str(&format!("#line {}\n", version_index + 2));

    for (_, line) in lines {
        if let Some(name) = include_target(line) {
            expand_include(paths, name, 0, defines, &mut assembled)?;
        } else {
            assembled.push_str(&apply_defines(line, defines));
            assembled.push('\n');
        }
    }

    Ok(assembled)
}

/// The quoted file name of an `#include` directive, if `line` is one.
fn include_target(line: &str) -> Option<&str> {
    let line = line.trim();
    if !line.starts_with("#include") {
        return None;
    }

    let rest = line["#include".len()..].trim();
    if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        Some(&rest[1..rest.len() - 1])
    } else {
        None
    }
}

fn expand_include(
    paths: &SearchPaths,
    name: &str,
    depth: usize,
    defines: &[(String, String)],
    out: &mut String,
) -> Result<()> {
    if depth == MAX_INCLUDE_DEPTH {
        return Err(Error::IncludeDepthExceeded(name.into()));
    }

    let located = paths.locate(name)?;
    let source = fs::read_to_string(&located)?;

    for line in source.lines() {
        if let Some(nested) = include_target(line) {
            expand_include(paths, nested, depth + 1, defines, out)?;
        } else {
            out.push_str(&apply_defines(line, defines));
            out.push('\n');
        }
    }

    Ok(())
}

/// Rewrites `#define NAME <anything>` lines whose name has an override in
/// the description.
fn apply_defines(line: &str, defines: &[(String, String)]) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with("#define") {
        let mut tokens = trimmed["#define".len()..].split_whitespace();
        if let Some(name) = tokens.next() {
            if let Some((_, value)) = defines.iter().find(|(k, _)| k == name) {
                return format!("#define {} {}", name, value);
            }
        }
    }
    line.to_string()
}
