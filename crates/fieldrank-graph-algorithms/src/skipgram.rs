//! Skip-gram with negative sampling over walk corpora
//!
//! Walks are treated as sentences over a vocabulary of dense node indices.
//! Training is single threaded and driven by one seeded RNG, so a given corpus
//! and seed always produce the same vectors.

use super::walk::Walk;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Skip-gram training configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkipGramConfig {
    /// Embedding dimension
    pub dimensions: usize,
    /// Maximum distance between a center token and a context token
    pub window: usize,
    /// Negative samples per positive pair
    pub negative: usize,
    /// Passes over the corpus
    pub epochs: usize,
    /// Initial learning rate, decayed linearly to `min_learning_rate`
    pub learning_rate: f32,
    pub min_learning_rate: f32,
}

impl Default for SkipGramConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            window: 5,
            negative: 5,
            epochs: 1,
            learning_rate: 0.025,
            min_learning_rate: 0.0001,
        }
    }
}

const MAX_EXP: f32 = 6.0;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x.clamp(-MAX_EXP, MAX_EXP)).exp())
}

/// Unigram^0.75 sampling table for negatives
struct NegativeTable {
    cumulative: Vec<f64>,
    tokens: Vec<usize>,
}

impl NegativeTable {
    fn new(counts: &[u64]) -> Self {
        let mut cumulative = Vec::new();
        let mut tokens = Vec::new();
        let mut running = 0.0;
        for (token, &count) in counts.iter().enumerate() {
            if count > 0 {
                running += (count as f64).powf(0.75);
                cumulative.push(running);
                tokens.push(token);
            }
        }
        Self { cumulative, tokens }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let draw = rng.gen::<f64>() * total;
        let pos = self
            .cumulative
            .partition_point(|&c| c <= draw)
            .min(self.tokens.len() - 1);
        self.tokens[pos]
    }
}

/// Train skip-gram vectors for a corpus of walks
///
/// Returns one entry per vocabulary index; tokens that never occur in `walks`
/// have no vector. Tokens `>= vocab_size` are ignored.
pub fn train_skip_gram(
    walks: &[Walk],
    vocab_size: usize,
    config: &SkipGramConfig,
    seed: u64,
) -> Vec<Option<Vec<f32>>> {
    let dim = config.dimensions;
    let mut counts = vec![0u64; vocab_size];
    for walk in walks {
        for &token in walk {
            if token < vocab_size {
                counts[token] += 1;
            }
        }
    }

    let corpus_tokens: u64 = counts.iter().sum();
    if corpus_tokens == 0 || dim == 0 {
        return vec![None; vocab_size];
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let mut syn0 = Array2::<f32>::zeros((vocab_size, dim));
    for (token, &count) in counts.iter().enumerate() {
        if count > 0 {
            for value in syn0.row_mut(token).iter_mut() {
                *value = (rng.gen::<f32>() - 0.5) / dim as f32;
            }
        }
    }
    let mut syn1 = Array2::<f32>::zeros((vocab_size, dim));
    let mut neu1e = Array1::<f32>::zeros(dim);

    let table = NegativeTable::new(&counts);
    let epochs = config.epochs.max(1);
    let total_work = (corpus_tokens * epochs as u64) as f32;
    let mut processed = 0u64;

    for _ in 0..epochs {
        for walk in walks {
            let sentence: Vec<usize> = walk.iter().copied().filter(|&t| t < vocab_size).collect();
            for (i, &center) in sentence.iter().enumerate() {
                let progress = processed as f32 / total_work;
                let alpha = (config.learning_rate * (1.0 - progress)).max(config.min_learning_rate);
                processed += 1;

                // Effective window shrinks randomly, as in word2vec
                let reduced = if config.window > 1 { rng.gen_range(0..config.window) } else { 0 };
                let span = config.window.saturating_sub(reduced).max(1);
                let start = i.saturating_sub(span);
                let end = (i + span + 1).min(sentence.len());

                for (j, &context) in sentence.iter().enumerate().take(end).skip(start) {
                    if j == i {
                        continue;
                    }
                    neu1e.fill(0.0);

                    for d in 0..=config.negative {
                        let (target, label) = if d == 0 {
                            (context, 1.0)
                        } else {
                            let sampled = table.sample(&mut rng);
                            if sampled == context {
                                continue;
                            }
                            (sampled, 0.0)
                        };

                        let f = syn0.row(center).dot(&syn1.row(target));
                        let g = (label - sigmoid(f)) * alpha;
                        neu1e.scaled_add(g, &syn1.row(target));
                        syn1.row_mut(target).scaled_add(g, &syn0.row(center));
                    }

                    syn0.row_mut(center).scaled_add(1.0, &neu1e);
                }
            }
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(token, &count)| (count > 0).then(|| syn0.row(token).to_vec()))
        .collect()
}
