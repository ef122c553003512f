//! Weighted random walks
//!
//! First-order walks where the next hop is drawn with probability proportional
//! to edge weight. Walks are generated on a dedicated rayon pool; every walk
//! gets its own RNG derived from `(seed, round, start)`, so the output does not
//! depend on the number of workers or on scheduling.

use super::common::GraphView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuildError;

/// A walk is a sequence of dense node indices, starting with its start node
pub type Walk = Vec<usize>;

/// Random walk configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomWalkConfig {
    /// Walks started from every node
    pub num_walks: usize,
    /// Maximum number of nodes in a walk, start node included
    pub walk_length: usize,
    /// Worker threads used to generate walks
    pub workers: usize,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            num_walks: 100,
            walk_length: 15,
            workers: default_workers(),
        }
    }
}

/// Half of the available cores, at least one
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// SplitMix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn walk_seed(seed: u64, round: usize, start: usize) -> u64 {
    mix(mix(seed ^ round as u64).wrapping_add(start as u64))
}

/// Generate a single walk from `start`
///
/// A node without neighbors yields a walk containing only itself.
pub fn random_walk<R: Rng + ?Sized>(
    view: &GraphView,
    start: usize,
    walk_length: usize,
    rng: &mut R,
) -> Walk {
    let mut walk = Vec::with_capacity(walk_length.max(1));
    walk.push(start);

    let mut current = start;
    while walk.len() < walk_length {
        let total = view.total_weight(current);
        if total <= 0.0 {
            break;
        }
        let draw = rng.gen::<f64>() * total;
        match view.neighbor_at(current, draw) {
            Some(next) => {
                walk.push(next);
                current = next;
            }
            None => break,
        }
    }

    walk
}

/// Generate `num_walks` walks from every node of the view
///
/// Walks are ordered by round, then by start node index.
pub fn weighted_random_walks(
    view: &GraphView,
    config: &RandomWalkConfig,
    seed: u64,
) -> Result<Vec<Walk>, ThreadPoolBuildError> {
    let n = view.node_count;
    if n == 0 || config.num_walks == 0 || config.walk_length == 0 {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()?;

    let total = config.num_walks * n;
    let walks = pool.install(|| {
        (0..total)
            .into_par_iter()
            .map(|k| {
                let (round, start) = (k / n, k % n);
                let mut rng = StdRng::seed_from_u64(walk_seed(seed, round, start));
                random_walk(view, start, config.walk_length, &mut rng)
            })
            .collect()
    });

    Ok(walks)
}
