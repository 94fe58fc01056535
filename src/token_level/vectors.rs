use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matrix::TypeTokenMatrix;

/// How the weighted second-order vectors of a token's context are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Weighted sum
    #[default]
    Sum,
    /// Weighted sum divided by the sum of the weights
    Mean,
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Composition::Sum => f.write_str("sum"),
            Composition::Mean => f.write_str("mean"),
        }
    }
}

impl FromStr for Composition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" | "addition" => Ok(Composition::Sum),
            "mean" | "average" => Ok(Composition::Mean),
            other => anyhow::bail!("Unknown composition {other:?} (expected sum or mean)"),
        }
    }
}

/// Replace each token's weighted context items by their second-order vectors.
///
/// `weights` is token x context item, `soc` is context item x second-order
/// dimension. Context items are matched to `soc` rows by label; items without
/// a second-order vector are ignored.
pub fn compute_token_vectors(
    weights: &TypeTokenMatrix,
    soc: &TypeTokenMatrix,
    composition: Composition,
) -> Result<TypeTokenMatrix> {
    let mut vectors = weights.matmul(soc);

    if composition == Composition::Mean {
        for r in 0..weights.shape().0 {
            let weight_sum: f64 = weights
                .row_entries(r)
                .filter(|(c, _)| soc.row_position(&weights.col_items()[*c]).is_some())
                .map(|(_, w)| w)
                .sum();
            if weight_sum != 0.0 {
                vectors.scale_row(r, 1.0 / weight_sum);
            }
        }
    }

    info!(
        tokens = vectors.shape().0,
        dimensions = vectors.shape().1,
        %composition,
        "Composed token vectors"
    );
    Ok(vectors)
}
