use std::{fmt::Display, path::PathBuf, time::Instant};

use clap::Parser;
use rand::{rngs::SmallRng, SeedableRng};
use tracing::{error, info};
use vcache_reorder::{analyze_cache, IndexOrder, ScoreConfig};

mod display;
mod mesh;

use display::Timing;
use mesh::{load_mesh, write_output, CliError, LoadedMesh};

/// Reorders OBJ triangle lists for vertex cache locality and reports how the
/// original, optimized and shuffled orders behave in a simulated FIFO cache.
#[derive(Parser, Debug)]
#[command(name = "vcache-reorder", version)]
struct Args {
    /// OBJ meshes to load
    #[arg(required = true)]
    meshes: Vec<PathBuf>,

    /// Simulated cache capacity in vertices
    #[arg(long)]
    cache_size: Option<usize>,

    /// Falloff exponent for cache slots past the last triangle
    #[arg(long)]
    decay_power: Option<f32>,

    /// Flat score for the three most recent cache slots
    #[arg(long)]
    last_triangle_score: Option<f32>,

    /// Weight of the low-valence bonus
    #[arg(long)]
    valence_scale: Option<f32>,

    /// Exponent of the low-valence bonus
    #[arg(long)]
    valence_power: Option<f32>,

    /// Seed for the shuffled order
    #[arg(long, default_value_t = 42424242)]
    seed: u64,

    /// Also report meshoptimizer's reordering
    #[arg(long)]
    compare_meshopt: bool,

    /// Write the optimized mesh (.obj) or raw u32 index buffer (any other extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn score_config(&self) -> ScoreConfig {
        let defaults = ScoreConfig::default();
        ScoreConfig {
            cache_size: self.cache_size.unwrap_or(defaults.cache_size),
            cache_decay_power: self.decay_power.unwrap_or(defaults.cache_decay_power),
            last_triangle_score: self
                .last_triangle_score
                .unwrap_or(defaults.last_triangle_score),
            valence_boost_scale: self.valence_scale.unwrap_or(defaults.valence_boost_scale),
            valence_boost_power: self.valence_power.unwrap_or(defaults.valence_boost_power),
        }
    }
}

fn report(
    label: impl Display,
    mesh: &LoadedMesh,
    indices: &[u32],
    cache_size: usize,
    elapsed: std::time::Duration,
) -> Result<(), CliError> {
    let stats = analyze_cache(indices, mesh.vertex_count(), cache_size)?;
    println!(
        "  {:>9}  ACMR {:.3}  ATVR {:.3}  hits {:5.1}%  {}",
        label,
        stats.acmr(),
        stats.atvr(),
        stats.hit_rate() * 100.0,
        Timing {
            elapsed,
            triangles: mesh.triangle_count(),
        },
    );
    Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = args.score_config();
    config.validate()?;

    if args.output.is_some() && args.meshes.len() != 1 {
        return Err(CliError::AmbiguousOutput(args.meshes.len()));
    }

    let mut rng = SmallRng::seed_from_u64(args.seed);

    for path in &args.meshes {
        let mesh = load_mesh(path)?;
        info!(
            mesh = %mesh.name,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "loaded mesh"
        );
        println!(
            "{}: {} vertices, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        let mut optimized = None;
        for order in IndexOrder::ALL {
            let start = Instant::now();
            let indices = order.apply(&mesh.indices, mesh.vertex_count(), &config, &mut rng)?;
            report(order, &mesh, &indices, config.cache_size, start.elapsed())?;

            if order == IndexOrder::Optimized {
                optimized = Some(indices);
            }
        }

        if args.compare_meshopt {
            let start = Instant::now();
            let indices = meshopt::optimize_vertex_cache(&mesh.indices, mesh.vertex_count());
            report("meshopt", &mesh, &indices, config.cache_size, start.elapsed())?;
        }

        if let (Some(output), Some(indices)) = (&args.output, &optimized) {
            write_output(output, &mesh.positions, indices)?;
            info!(path = %output.display(), "wrote optimized mesh");
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        error!("{}", err);
        std::process::exit(1);
    }
}
