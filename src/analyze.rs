//! Cache statistics for an index buffer, and the index orders worth comparing.

use std::fmt::Display;

use rand::{seq::SliceRandom, Rng};

use crate::{
    cache::SimulatedCache,
    error::{ConfigError, Result},
    reorder::optimize,
    score::ScoreConfig,
    state::validate_indices,
};

/// What the simulated FIFO cache saw while replaying an index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: usize,
    pub misses: usize,
    pub triangles: usize,
    /// Distinct vertices referenced by the index buffer.
    pub vertices: usize,
}

impl CacheStatistics {
    /// Average cache miss ratio: misses per triangle. 3.0 is the worst case,
    /// 0.5 is close to the best a regular grid can do.
    pub fn acmr(&self) -> f32 {
        if self.triangles == 0 {
            return 0.0;
        }
        self.misses as f32 / self.triangles as f32
    }

    /// Average transform to vertex ratio: misses per referenced vertex. 1.0 is
    /// optimal, every vertex shaded once.
    pub fn atvr(&self) -> f32 {
        if self.vertices == 0 {
            return 0.0;
        }
        self.misses as f32 / self.vertices as f32
    }

    pub fn hit_rate(&self) -> f32 {
        let touches = self.hits + self.misses;
        if touches == 0 {
            return 0.0;
        }
        self.hits as f32 / touches as f32
    }
}

/// Replays `indices` through a FIFO cache of `cache_size` entries.
pub fn analyze_cache(
    indices: &[u32],
    vertex_count: usize,
    cache_size: usize,
) -> Result<CacheStatistics> {
    if cache_size == 0 {
        return Err(ConfigError::CacheSize(cache_size).into());
    }
    validate_indices(indices, vertex_count)?;

    let mut cache = SimulatedCache::new(cache_size, vertex_count);
    let mut referenced = vec![false; vertex_count];
    let mut stats = CacheStatistics {
        triangles: indices.len() / 3,
        ..Default::default()
    };

    for &index in indices {
        if cache.touch(index).is_hit() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        if !referenced[index as usize] {
            referenced[index as usize] = true;
            stats.vertices += 1;
        }
    }

    Ok(stats)
}

/// Shuffles whole triangles; corners stay together and in order.
pub fn shuffle_triangles<R: Rng + ?Sized>(indices: &[u32], rng: &mut R) -> Vec<u32> {
    let mut triangles: Vec<&[u32]> = indices.chunks_exact(3).collect();
    triangles.shuffle(rng);
    triangles.concat()
}

/// Index orders compared when inspecting a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrder {
    Original,
    Optimized,
    Shuffled,
}

impl IndexOrder {
    pub const ALL: [IndexOrder; 3] = [
        IndexOrder::Original,
        IndexOrder::Optimized,
        IndexOrder::Shuffled,
    ];

    /// Produces the index buffer in this order.
    pub fn apply<R: Rng + ?Sized>(
        self,
        indices: &[u32],
        vertex_count: usize,
        config: &ScoreConfig,
        rng: &mut R,
    ) -> Result<Vec<u32>> {
        match self {
            IndexOrder::Original => {
                validate_indices(indices, vertex_count)?;
                Ok(indices.to_vec())
            }
            IndexOrder::Optimized => optimize(indices, vertex_count, config),
            IndexOrder::Shuffled => {
                validate_indices(indices, vertex_count)?;
                Ok(shuffle_triangles(indices, rng))
            }
        }
    }
}

impl Display for IndexOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexOrder::Original => "original",
            IndexOrder::Optimized => "optimized",
            IndexOrder::Shuffled => "shuffled",
        };
        f.pad(name)
    }
}
