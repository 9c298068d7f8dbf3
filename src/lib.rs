//! Triangle reordering for post-transform vertex cache locality.
//!
//! A greedy, linear-time pass in the style of Tom Forsyth's "Linear-Speed
//! Vertex Cache Optimisation": triangles are emitted one at a time, always
//! picking the best scoring triangle that touches a vertex in a simulated
//! FIFO cache. Vertex data is never touched and every triangle keeps its
//! corner order.
//!
//! ```
//! use vcache_reorder::{optimize, ScoreConfig};
//!
//! let indices = [0, 1, 2, 5, 6, 7, 2, 1, 3];
//! let reordered = optimize(&indices, 8, &ScoreConfig::default()).unwrap();
//! assert_eq!(reordered, [0, 1, 2, 2, 1, 3, 5, 6, 7]);
//! ```

pub mod analyze;
pub mod cache;
pub mod error;
pub mod reorder;
pub mod score;
pub mod state;

pub use analyze::{analyze_cache, shuffle_triangles, CacheStatistics, IndexOrder};
pub use cache::{SimulatedCache, Touch};
pub use error::{ConfigError, Error, InputError, Result};
pub use reorder::{optimize, optimize_batch, optimize_in_place, MeshIndices, Reorder, RunStats};
pub use score::{ScoreConfig, ScoreTable};
pub use state::MeshState;
