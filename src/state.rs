//! Per-vertex and per-triangle bookkeeping for one reordering run.

use crate::{
    error::{InputError, Result},
    score::ScoreTable,
};

#[derive(Debug, Clone, Copy)]
pub struct VertexRecord {
    /// Unemitted triangle corners that name this vertex.
    remaining: u32,
    /// Start of this vertex's slice in the shared reference arena.
    offset: u32,
    score: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct TriangleRecord {
    corners: [u32; 3],
    emitted: bool,
    score: f32,
}

/// Vertex and triangle tables built from a triangle list.
///
/// Triangle references live in one flat arena: vertex `v` owns
/// `refs[offset..offset + valence]`, and its live triangles are always the
/// first `remaining` entries of that slice.
#[derive(Debug, Clone)]
pub struct MeshState {
    vertices: Vec<VertexRecord>,
    triangles: Vec<TriangleRecord>,
    refs: Vec<u32>,
    emitted_count: usize,
}

/// Checks the input contract without touching any state.
pub fn validate_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(InputError::IndexCount { len: indices.len() }.into());
    }
    if u32::try_from(indices.len()).is_err() {
        return Err(InputError::TooLarge {
            what: "index",
            count: indices.len(),
        }
        .into());
    }
    // vertex ids are u32, and per-vertex tables are sized by vertex_count
    if vertex_count as u64 > u32::MAX as u64 + 1 {
        return Err(InputError::TooLarge {
            what: "vertex",
            count: vertex_count,
        }
        .into());
    }
    if let Some((position, &index)) = indices
        .iter()
        .enumerate()
        .find(|&(_, &index)| index as usize >= vertex_count)
    {
        return Err(InputError::IndexOutOfRange {
            position,
            index,
            vertex_count,
        }
        .into());
    }
    Ok(())
}

impl MeshState {
    pub fn new(indices: &[u32], vertex_count: usize, table: &ScoreTable) -> Result<Self> {
        validate_indices(indices, vertex_count)?;

        let mut valence = vec![0u32; vertex_count];
        for &index in indices {
            valence[index as usize] += 1;
        }

        let mut offset = 0;
        let mut vertices: Vec<VertexRecord> = valence
            .iter()
            .map(|&count| {
                let record = VertexRecord {
                    remaining: 0,
                    offset,
                    score: 0.0,
                };
                offset += count;
                record
            })
            .collect();

        // filling `remaining` back up to the valence places each reference
        let mut refs = vec![0u32; indices.len()];
        for (triangle, corners) in indices.chunks_exact(3).enumerate() {
            for &v in corners {
                let record = &mut vertices[v as usize];
                refs[(record.offset + record.remaining) as usize] = triangle as u32;
                record.remaining += 1;
            }
        }

        for record in &mut vertices {
            record.score = table.score(None, record.remaining);
        }

        let triangles = indices
            .chunks_exact(3)
            .map(|c| {
                let corners = [c[0], c[1], c[2]];
                TriangleRecord {
                    corners,
                    emitted: false,
                    score: corners
                        .iter()
                        .map(|&v| vertices[v as usize].score)
                        .sum(),
                }
            })
            .collect();

        Ok(Self {
            vertices,
            triangles,
            refs,
            emitted_count: 0,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted_count
    }

    pub fn is_done(&self) -> bool {
        self.emitted_count == self.triangles.len()
    }

    pub fn corners(&self, triangle: usize) -> [u32; 3] {
        self.triangles[triangle].corners
    }

    pub fn is_emitted(&self, triangle: usize) -> bool {
        self.triangles[triangle].emitted
    }

    pub fn triangle_score(&self, triangle: usize) -> f32 {
        self.triangles[triangle].score
    }

    pub fn remaining(&self, vertex: u32) -> u32 {
        self.vertices[vertex as usize].remaining
    }

    pub fn vertex_score(&self, vertex: u32) -> f32 {
        self.vertices[vertex as usize].score
    }

    /// Unemitted triangles referencing `vertex`, in no particular order.
    pub fn live_triangles(&self, vertex: u32) -> &[u32] {
        let record = &self.vertices[vertex as usize];
        let start = record.offset as usize;
        &self.refs[start..start + record.remaining as usize]
    }

    /// Marks `triangle` emitted and drops it from its corners' live lists.
    ///
    /// Returns the corners, i.e. the vertices whose remaining count changed.
    /// A degenerate triangle returns the same vertex more than once.
    pub fn emit(&mut self, triangle: usize) -> [u32; 3] {
        let record = &mut self.triangles[triangle];
        let corners = record.corners;
        debug_assert!(!record.emitted, "triangle {} emitted twice", triangle);
        if record.emitted {
            return corners;
        }
        record.emitted = true;

        for v in corners {
            let vertex = &mut self.vertices[v as usize];
            let start = vertex.offset as usize;
            let live = &mut self.refs[start..start + vertex.remaining as usize];
            if let Some(slot) = live.iter().position(|&t| t as usize == triangle) {
                live.swap(slot, live.len() - 1);
                vertex.remaining -= 1;
            }
        }

        self.emitted_count += 1;
        corners
    }

    /// Recomputes the memoized score of `vertex`; returns whether it changed.
    pub fn rescore_vertex(
        &mut self,
        vertex: u32,
        cache_position: Option<usize>,
        table: &ScoreTable,
    ) -> bool {
        let record = &mut self.vertices[vertex as usize];
        let score = table.score(cache_position, record.remaining);
        let changed = score.to_bits() != record.score.to_bits();
        record.score = score;
        changed
    }

    pub fn rescore_triangle(&mut self, triangle: usize) {
        let corners = self.triangles[triangle].corners;
        self.triangles[triangle].score = corners
            .iter()
            .map(|&v| self.vertices[v as usize].score)
            .sum();
    }
}
