// Pairwise token distances.
//
// Cosine distance is 1 - cos(a, b), so it ranges over [0, 2]. A token
// whose vector is all zeros (no weighted context survived the filters) has
// no direction; it is placed at distance 1 from every other token.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::matrix::TypeTokenMatrix;

/// Distance metric between token vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cosine,
    Euclidean,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => f.write_str("cosine"),
            Metric::Euclidean => f.write_str("euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => anyhow::bail!("Unknown distance metric {other:?} (expected cosine or euclidean)"),
        }
    }
}

/// Square, symmetric token x token distance matrix with a zero diagonal.
pub fn compute_distance(vectors: &TypeTokenMatrix, metric: Metric) -> Result<TypeTokenMatrix> {
    let n = vectors.shape().0;
    let dense: Vec<Vec<f64>> = (0..n).map(|r| vectors.dense_row(r)).collect();
    let norms: Vec<f64> = dense.iter().map(|v| norm(v)).collect();

    let zero_vectors = norms.iter().filter(|n| **n == 0.0).count();
    if zero_vectors > 0 && metric == Metric::Cosine {
        warn!(tokens = zero_vectors, "Tokens with an empty vector");
    }

    let labels = vectors.row_items().to_vec();
    let mut distances = TypeTokenMatrix::new(labels.clone(), labels)?;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = match metric {
                Metric::Cosine => cosine_distance(&dense[i], &dense[j], norms[i], norms[j]),
                Metric::Euclidean => euclidean_distance(&dense[i], &dense[j]),
            };
            distances.set(i, j, d);
            distances.set(j, i, d);
        }
    }

    info!(tokens = n, %metric, "Computed token distances");
    Ok(distances)
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn cosine_distance(a: &[f64], b: &[f64], norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    // Rounding can push the similarity just outside [-1, 1]
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    1.0 - similarity
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
