//! OBJ input and reordered mesh output for the command line tool.

use std::{
    ffi::OsStr,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

type Vertex = obj::Position;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse obj {path}: {details}")]
    Parse { path: PathBuf, details: String },

    #[error("--output needs exactly one input mesh, got {0}")]
    AmbiguousOutput(usize),

    #[error(transparent)]
    Reorder(#[from] vcache_reorder::Error),
}

pub struct LoadedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl LoadedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub fn load_mesh(path: &Path) -> Result<LoadedMesh, CliError> {
    let file = File::open(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    let model: obj::Obj<Vertex, u32> =
        obj::load_obj(BufReader::new(file)).map_err(|err| CliError::Parse {
            path: path.to_owned(),
            details: err.to_string(),
        })?;

    let name = model.name.unwrap_or_else(|| {
        path.file_stem()
            .unwrap_or_else(|| path.as_os_str())
            .to_string_lossy()
            .into_owned()
    });

    Ok(LoadedMesh {
        name,
        positions: model.vertices.into_iter().map(|v| v.position).collect(),
        indices: model.indices,
    })
}

/// Writes `indices` next to `positions`: an `.obj` path gets a text mesh,
/// anything else the raw native-endian `u32` index buffer.
pub fn write_output(path: &Path, positions: &[[f32; 3]], indices: &[u32]) -> Result<(), CliError> {
    let is_obj = path
        .extension()
        .and_then(OsStr::to_str)
        .map_or(false, |ext| ext.eq_ignore_ascii_case("obj"));

    let write = |path: &Path| -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        if is_obj {
            write_obj(&mut out, positions, indices)?;
        } else {
            out.write_all(bytemuck::cast_slice(indices))?;
        }
        out.flush()
    };

    write(path).map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })
}

pub fn write_obj(
    out: &mut impl Write,
    positions: &[[f32; 3]],
    indices: &[u32],
) -> std::io::Result<()> {
    for [x, y, z] in positions {
        writeln!(out, "v {} {} {}", x, y, z)?;
    }
    // obj indices are 1-based
    for tri in indices.chunks_exact(3) {
        writeln!(out, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1)?;
    }
    Ok(())
}
