//! Vertex scoring heuristic.
//!
//! A vertex scores higher the more recently it entered the simulated cache and
//! the fewer unemitted triangles still reference it. Triangle scores are the
//! sum of their three vertex scores.

use crate::error::{ConfigError, Result};

/// Score returned for a vertex that has no unemitted triangles left.
pub const DEAD_VERTEX_SCORE: f32 = -1.0;

/// Number of most recent cache slots that receive the flat
/// [`ScoreConfig::last_triangle_score`] bonus.
pub const LAST_TRIANGLE_SLOTS: usize = 3;

/// Valences up to this value are served from [`ScoreTable`].
pub const MAX_TABLE_VALENCE: usize = 32;

/// Shaping constants for the vertex score.
///
/// The defaults reproduce the published Forsyth heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreConfig {
    /// Capacity of the simulated FIFO vertex cache.
    pub cache_size: usize,
    /// Exponent of the falloff applied to slots past the last triangle.
    /// Larger values make older cache entries lose value faster.
    pub cache_decay_power: f32,
    /// Flat score for the three most recently inserted vertices. Kept below
    /// the score of slot 3 so that reusing exactly the last triangle's edge is
    /// not overly favoured.
    pub last_triangle_score: f32,
    /// Weight of the low-valence bonus.
    pub valence_boost_scale: f32,
    /// Exponent of the low-valence bonus; the bonus is
    /// `valence_boost_scale * remaining^-valence_boost_power`.
    pub valence_boost_power: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            cache_size: 32,
            cache_decay_power: 1.5,
            last_triangle_score: 0.75,
            valence_boost_scale: 2.0,
            valence_boost_power: 0.5,
        }
    }
}

impl ScoreConfig {
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(ConfigError::CacheSize(self.cache_size).into());
        }

        let constants = [
            ("cache_decay_power", self.cache_decay_power),
            ("last_triangle_score", self.last_triangle_score),
            ("valence_boost_scale", self.valence_boost_scale),
            ("valence_boost_power", self.valence_boost_power),
        ];
        for (name, value) in constants {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Constant { name, value }.into());
            }
        }
        Ok(())
    }

    /// Score contribution of the cache slot alone.
    pub fn cache_score(&self, cache_position: Option<usize>) -> f32 {
        match cache_position {
            Some(pos) if pos < self.cache_size => {
                if pos < LAST_TRIANGLE_SLOTS {
                    self.last_triangle_score
                } else {
                    // pos >= 3 and pos < cache_size, so the divisor is at least 1
                    let scaler = 1.0 / (self.cache_size - LAST_TRIANGLE_SLOTS) as f32;
                    let falloff = 1.0 - (pos - LAST_TRIANGLE_SLOTS) as f32 * scaler;
                    falloff.powf(self.cache_decay_power)
                }
            }
            _ => 0.0,
        }
    }

    /// Score contribution of the remaining valence alone. Zero for dead vertices.
    pub fn valence_score(&self, remaining: u32) -> f32 {
        if remaining == 0 {
            return 0.0;
        }
        self.valence_boost_scale * (remaining as f32).powf(-self.valence_boost_power)
    }

    pub fn vertex_score(&self, cache_position: Option<usize>, remaining: u32) -> f32 {
        if remaining == 0 {
            return DEAD_VERTEX_SCORE;
        }
        self.cache_score(cache_position) + self.valence_score(remaining)
    }
}

/// Precomputed [`ScoreConfig::vertex_score`] terms.
///
/// Lookups return the same bits as the direct computation; valences above
/// [`MAX_TABLE_VALENCE`] fall through to it.
#[derive(Debug, Clone)]
pub struct ScoreTable {
    config: ScoreConfig,
    cache: Vec<f32>,
    valence: Vec<f32>,
}

impl ScoreTable {
    pub fn new(config: &ScoreConfig) -> Result<Self> {
        config.validate()?;

        let cache = (0..config.cache_size)
            .map(|pos| config.cache_score(Some(pos)))
            .collect();
        let valence = (0..=MAX_TABLE_VALENCE as u32)
            .map(|remaining| config.valence_score(remaining))
            .collect();

        Ok(Self {
            config: *config,
            cache,
            valence,
        })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    pub fn score(&self, cache_position: Option<usize>, remaining: u32) -> f32 {
        if remaining == 0 {
            return DEAD_VERTEX_SCORE;
        }
        let cache = cache_position
            .and_then(|pos| self.cache.get(pos))
            .copied()
            .unwrap_or(0.0);
        let valence = match self.valence.get(remaining as usize) {
            Some(&v) => v,
            None => self.config.valence_score(remaining),
        };
        cache + valence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dead_vertex_never_scores_positive() {
        let config = ScoreConfig::default();
        assert_eq!(config.vertex_score(Some(0), 0), DEAD_VERTEX_SCORE);
        assert_eq!(config.vertex_score(None, 0), DEAD_VERTEX_SCORE);
    }

    #[test]
    fn last_triangle_slots_share_bonus() {
        let config = ScoreConfig::default();
        for pos in 0..LAST_TRIANGLE_SLOTS {
            assert_relative_eq!(config.cache_score(Some(pos)), 0.75);
        }
        // slot 3 is the start of the decay curve
        assert_relative_eq!(config.cache_score(Some(3)), 1.0);
    }

    #[test]
    fn cache_score_decays_to_zero_at_boundary() {
        let config = ScoreConfig::default();
        let mut last = f32::MAX;
        for pos in LAST_TRIANGLE_SLOTS..config.cache_size {
            let score = config.cache_score(Some(pos));
            assert!(score < last, "slot {} did not decay", pos);
            assert!(score > 0.0);
            last = score;
        }
        assert_eq!(config.cache_score(Some(config.cache_size)), 0.0);
        assert_eq!(config.cache_score(None), 0.0);
    }

    #[test]
    fn low_valence_is_preferred() {
        let config = ScoreConfig::default();
        assert_relative_eq!(config.valence_score(1), 2.0);
        assert_relative_eq!(config.valence_score(4), 1.0);
        assert!(config.vertex_score(None, 1) > config.vertex_score(None, 2));
    }

    #[test]
    fn tiny_cache_has_no_decay_region() {
        let config = ScoreConfig::default().with_cache_size(2);
        assert_relative_eq!(config.cache_score(Some(1)), 0.75);
        assert_eq!(config.cache_score(Some(2)), 0.0);
    }

    #[test]
    fn table_matches_direct_computation() {
        let config = ScoreConfig::default();
        let table = ScoreTable::new(&config).unwrap();
        for remaining in 0..(MAX_TABLE_VALENCE as u32 + 8) {
            assert_eq!(
                table.score(None, remaining).to_bits(),
                config.vertex_score(None, remaining).to_bits()
            );
            for pos in 0..config.cache_size + 2 {
                assert_eq!(
                    table.score(Some(pos), remaining).to_bits(),
                    config.vertex_score(Some(pos), remaining).to_bits(),
                    "pos {} remaining {}",
                    pos,
                    remaining
                );
            }
        }
    }

    #[test]
    fn rejects_bad_config() {
        let zero = ScoreConfig::default().with_cache_size(0);
        assert!(zero.validate().unwrap_err().is_configuration());

        let nan = ScoreConfig {
            cache_decay_power: f32::NAN,
            ..Default::default()
        };
        assert!(ScoreTable::new(&nan).is_err());

        let negative = ScoreConfig {
            valence_boost_scale: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }
}
