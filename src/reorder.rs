//! Greedy triangle reordering for vertex cache locality.
//!
//! Each step picks the highest scoring unemitted triangle among those touching
//! a cached vertex, emits it, pushes its corners through the simulated cache
//! and rescores only the vertices whose cache slot or remaining count moved.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    cache::{SimulatedCache, Touch},
    error::Result,
    score::{ScoreConfig, ScoreTable},
    state::MeshState,
};

/// Cache behaviour observed while emitting triangles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub hits: usize,
    pub misses: usize,
}

impl RunStats {
    pub fn hit_rate(&self) -> f32 {
        let touches = self.hits + self.misses;
        if touches == 0 {
            return 0.0;
        }
        self.hits as f32 / touches as f32
    }
}

/// One in-progress reordering run.
///
/// Iterating yields the id of each emitted triangle, so a host can stop
/// between steps; [`Reorder::finish`] drives the run to completion.
#[derive(Debug, Clone)]
pub struct Reorder {
    table: ScoreTable,
    cache: SimulatedCache,
    state: MeshState,
    // per-triangle stamp of the last step that considered it
    visited: Vec<u32>,
    step: u32,
    // no triangle below this id is unemitted
    cursor: usize,
    dirty: Vec<u32>,
    output: Vec<u32>,
    stats: RunStats,
}

impl Reorder {
    pub fn new(indices: &[u32], vertex_count: usize, config: &ScoreConfig) -> Result<Self> {
        let table = ScoreTable::new(config)?;
        let state = MeshState::new(indices, vertex_count, &table)?;

        debug!(
            triangles = state.triangle_count(),
            vertices = vertex_count,
            cache_size = config.cache_size,
            "starting vertex cache reorder"
        );

        Ok(Self {
            cache: SimulatedCache::new(config.cache_size, vertex_count),
            visited: vec![0; state.triangle_count()],
            step: 0,
            cursor: 0,
            dirty: Vec::with_capacity(config.cache_size + 3),
            output: Vec::with_capacity(indices.len()),
            stats: RunStats::default(),
            table,
            state,
        })
    }

    pub fn cache(&self) -> &SimulatedCache {
        &self.cache
    }

    pub fn state(&self) -> &MeshState {
        &self.state
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Indices emitted so far.
    pub fn output(&self) -> &[u32] {
        &self.output
    }

    /// Emits every remaining triangle and returns the full reordered list.
    pub fn finish(mut self) -> Vec<u32> {
        while self.next_triangle().is_some() {}

        debug!(
            triangles = self.state.triangle_count(),
            hits = self.stats.hits,
            misses = self.stats.misses,
            "finished vertex cache reorder"
        );
        self.output
    }

    fn next_triangle(&mut self) -> Option<usize> {
        if self.state.is_done() {
            return None;
        }
        let triangle = match self.best_candidate() {
            Some(t) => t,
            None => self.first_unemitted()?,
        };
        self.emit(triangle);
        Some(triangle)
    }

    /// Best live triangle touching the cache; ties go to the lowest id.
    fn best_candidate(&mut self) -> Option<usize> {
        self.step += 1;
        let mut best: Option<(usize, f32)> = None;

        for vertex in self.cache.iter() {
            for &t in self.state.live_triangles(vertex) {
                let t = t as usize;
                if self.visited[t] == self.step {
                    continue;
                }
                self.visited[t] = self.step;

                let score = self.state.triangle_score(t);
                match best {
                    Some((best_t, best_score))
                        if best_score > score || (best_score == score && best_t < t) => {}
                    _ => best = Some((t, score)),
                }
            }
        }

        best.map(|(t, _)| t)
    }

    fn first_unemitted(&mut self) -> Option<usize> {
        while self.cursor < self.state.triangle_count() {
            if !self.state.is_emitted(self.cursor) {
                trace!(triangle = self.cursor, "no cached candidate, seeding");
                return Some(self.cursor);
            }
            self.cursor += 1;
        }
        None
    }

    fn emit(&mut self, triangle: usize) {
        let corners = self.state.emit(triangle);
        self.output.extend_from_slice(&corners);

        self.dirty.clear();
        let mut shifted = false;
        for v in corners {
            match self.cache.touch(v) {
                Touch::Hit => self.stats.hits += 1,
                Touch::Miss { evicted } => {
                    self.stats.misses += 1;
                    shifted = true;
                    self.dirty.extend(evicted);
                }
            }
            self.dirty.push(v);
        }
        // a miss moves every resident one slot back
        if shifted {
            self.dirty.extend(self.cache.iter());
        }

        for &v in &self.dirty {
            let position = self.cache.position_of(v);
            if !self.state.rescore_vertex(v, position, &self.table) {
                continue;
            }
            for i in 0..self.state.live_triangles(v).len() {
                let t = self.state.live_triangles(v)[i];
                self.state.rescore_triangle(t as usize);
            }
        }
    }
}

impl Iterator for Reorder {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.next_triangle()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.state.triangle_count() - self.state.emitted_count();
        (left, Some(left))
    }
}

impl ExactSizeIterator for Reorder {}

/// Reorders a triangle list for the simulated vertex cache.
///
/// The result holds the same triangles with their corners in the original
/// order; only the order of triangles changes. Malformed input or
/// configuration is rejected before any work is done.
pub fn optimize(indices: &[u32], vertex_count: usize, config: &ScoreConfig) -> Result<Vec<u32>> {
    Ok(Reorder::new(indices, vertex_count, config)?.finish())
}

/// Like [`optimize`], writing the result back into `indices`. On error the
/// slice is left untouched.
pub fn optimize_in_place(
    indices: &mut [u32],
    vertex_count: usize,
    config: &ScoreConfig,
) -> Result<()> {
    let optimized = optimize(indices, vertex_count, config)?;
    indices.copy_from_slice(&optimized);
    Ok(())
}

/// A borrowed triangle list and the size of the vertex pool it indexes.
#[derive(Debug, Clone, Copy)]
pub struct MeshIndices<'a> {
    pub indices: &'a [u32],
    pub vertex_count: usize,
}

/// Runs [`optimize`] on every mesh in parallel. Results keep input order.
pub fn optimize_batch(meshes: &[MeshIndices<'_>], config: &ScoreConfig) -> Vec<Result<Vec<u32>>> {
    meshes
        .par_iter()
        .map(|mesh| optimize(mesh.indices, mesh.vertex_count, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze_cache;

    fn default_optimize(indices: &[u32], vertex_count: usize) -> Vec<u32> {
        optimize(indices, vertex_count, &ScoreConfig::default()).unwrap()
    }

    #[test]
    fn single_triangle_is_unchanged() {
        assert_eq!(default_optimize(&[0, 1, 2], 3), vec![0, 1, 2]);
    }

    #[test]
    fn empty_input() {
        assert!(default_optimize(&[], 0).is_empty());
        assert!(default_optimize(&[], 10).is_empty());
    }

    #[test]
    fn disconnected_triangles_keep_input_order() {
        // no shared vertices, so each step falls back to the lowest id
        assert_eq!(
            default_optimize(&[0, 1, 2, 3, 4, 5], 6),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn fan_keeps_hub_cached() {
        let indices = [0, 1, 2, 0, 2, 3, 0, 3, 4];
        let config = ScoreConfig::default();

        let mut reorder = Reorder::new(&indices, 5, &config).unwrap();
        while reorder.next().is_some() {
            if reorder.state().remaining(0) > 0 {
                assert!(reorder.cache().contains(0));
            }
        }
        let stats = reorder.stats();
        let natural = analyze_cache(&indices, 5, config.cache_size).unwrap();
        assert!(stats.hit_rate() >= natural.hit_rate());
        assert_eq!(stats.hits, 4);
    }

    #[test]
    fn prefers_triangle_sharing_an_edge() {
        // triangle 2 shares the edge (1, 2) with the seed; triangle 1 shares nothing
        let indices = [0, 1, 2, 5, 6, 7, 2, 1, 3];
        assert_eq!(
            default_optimize(&indices, 8),
            vec![0, 1, 2, 2, 1, 3, 5, 6, 7]
        );
    }

    #[test]
    fn equal_scores_pick_lowest_id() {
        // both neighbours share one edge with the seed and have equal valence
        let indices = [0, 1, 2, 1, 2, 3, 0, 1, 4];
        let mut reorder = Reorder::new(&indices, 5, &ScoreConfig::default()).unwrap();
        assert_eq!(reorder.next(), Some(0));
        let (a, b) = (reorder.state().triangle_score(1), reorder.state().triangle_score(2));
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(reorder.next(), Some(1));
    }

    #[test]
    fn deterministic() {
        let indices: Vec<u32> = (0..40u32)
            .flat_map(|i| [i % 13, (i * 7 + 1) % 13, (i * 5 + 3) % 13])
            .collect();
        let first = default_optimize(&indices, 13);
        let second = default_optimize(&indices, 13);
        assert_eq!(first, second);
    }

    #[test]
    fn stepwise_invariants_hold() {
        let indices: Vec<u32> = (0..60u32)
            .flat_map(|i| [i % 17, (i + 1) % 17, (i * 3 + 2) % 17])
            .collect();
        let config = ScoreConfig::default().with_cache_size(4);
        let mut reorder = Reorder::new(&indices, 17, &config).unwrap();

        let mut previous: Vec<u32> = (0..17).map(|v| reorder.state().remaining(v)).collect();
        let mut seen = vec![false; 60];
        while let Some(t) = reorder.next() {
            assert!(!seen[t]);
            seen[t] = true;
            assert!(reorder.cache().len() <= 4);
            assert!(reorder.cache().iter().count() <= 4);
            for v in 0..17u32 {
                let now = reorder.state().remaining(v);
                assert!(now <= previous[v as usize]);
                previous[v as usize] = now;
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert!(previous.iter().all(|&r| r == 0));
        assert_eq!(reorder.output().len(), indices.len());
    }

    #[test]
    fn finish_after_partial_iteration_returns_everything() {
        let indices = [0, 1, 2, 2, 1, 3, 3, 1, 4];
        let mut reorder = Reorder::new(&indices, 5, &ScoreConfig::default()).unwrap();
        assert_eq!(reorder.len(), 3);
        reorder.next();
        assert_eq!(reorder.len(), 2);
        assert_eq!(reorder.finish().len(), indices.len());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut indices = [0, 1, 3];
        let err = optimize_in_place(&mut indices, 3, &ScoreConfig::default()).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(indices, [0, 1, 3]);

        let err = optimize(&[0, 1, 2, 0], 3, &ScoreConfig::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn huge_vertex_count_is_an_error() {
        let err = optimize(&[0, 1, 2], usize::MAX, &ScoreConfig::default()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn zero_cache_is_rejected() {
        let err = optimize(&[0, 1, 2], 3, &ScoreConfig::default().with_cache_size(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn batch_matches_sequential() {
        let a = [0, 1, 2, 2, 1, 3];
        let b = [0, 1, 2, 3, 4, 5, 2, 1, 3];
        let meshes = [
            MeshIndices {
                indices: &a,
                vertex_count: 4,
            },
            MeshIndices {
                indices: &b,
                vertex_count: 6,
            },
            MeshIndices {
                indices: &[0, 1, 9],
                vertex_count: 3,
            },
        ];
        let results = optimize_batch(&meshes, &ScoreConfig::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &default_optimize(&a, 4));
        assert_eq!(results[1].as_ref().unwrap(), &default_optimize(&b, 6));
        assert!(results[2].is_err());
    }
}
