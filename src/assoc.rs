// Association strength between row items and context features.
//
// All measures are computed per non-zero cell of a frequency matrix from
// the cell count f, the row marginal n_r, the column marginal c_c and the
// total N (the sum of the row marginals):
//
//   PMI  = ln( f * N / (n_r * c_c) )
//   PPMI = max(0, PMI)
//   LL   = signed Dunning G2 over the 2x2 contingency table of (row, col)
//
// Marginals are passed in rather than taken from the matrix itself, because
// the usual call weights a small submatrix (a few target rows) against the
// totals of the full corpus matrix.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matrix::{Marginals, TypeTokenMatrix};

/// Which association measure to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Positive pointwise mutual information
    Ppmi,
    /// Pointwise mutual information (may be negative)
    Pmi,
    /// Signed log-likelihood ratio (G2); negative for dispreferred pairs
    #[value(name = "lik")]
    #[serde(rename = "lik")]
    LogLikelihood,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measure::Ppmi => "ppmi",
            Measure::Pmi => "pmi",
            Measure::LogLikelihood => "lik",
        };
        f.write_str(name)
    }
}

impl FromStr for Measure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ppmi" => Ok(Measure::Ppmi),
            "pmi" => Ok(Measure::Pmi),
            "lik" | "loglikelihood" | "log-likelihood" => Ok(Measure::LogLikelihood),
            other => anyhow::bail!("Unknown association measure {other:?} (expected ppmi, pmi or lik)"),
        }
    }
}

/// Compute an association matrix with the same labels as `freq`.
///
/// N is the sum of `nfreq`. Cells whose row or column has no (or a zero)
/// marginal are left empty.
pub fn compute_association(
    freq: &TypeTokenMatrix,
    nfreq: &Marginals,
    cfreq: &Marginals,
    measure: Measure,
) -> Result<TypeTokenMatrix> {
    let total: f64 = nfreq.values().sum();
    compute_association_with_total(freq, nfreq, cfreq, total, measure)
}

/// Like `compute_association`, with N given explicitly. Used when `nfreq`
/// holds derived rows (such as lemma totals) that must not count towards N.
pub fn compute_association_with_total(
    freq: &TypeTokenMatrix,
    nfreq: &Marginals,
    cfreq: &Marginals,
    total: f64,
    measure: Measure,
) -> Result<TypeTokenMatrix> {
    if total <= 0.0 {
        anyhow::bail!("Cannot compute {measure}: total frequency is zero");
    }

    let mut assoc = TypeTokenMatrix::new(freq.row_items().to_vec(), freq.col_items().to_vec())?;
    let mut skipped = 0usize;

    for (r, row_label) in freq.row_items().iter().enumerate() {
        let n_r = nfreq.get(row_label).copied().unwrap_or(0.0);
        for (c, f) in freq.row_entries(r) {
            let c_c = cfreq
                .get(&freq.col_items()[c])
                .copied()
                .unwrap_or(0.0);
            if n_r <= 0.0 || c_c <= 0.0 || f <= 0.0 {
                skipped += 1;
                continue;
            }
            let value = match measure {
                Measure::Pmi => pmi(f, n_r, c_c, total),
                Measure::Ppmi => pmi(f, n_r, c_c, total).max(0.0),
                Measure::LogLikelihood => log_likelihood(f, n_r, c_c, total),
            };
            assoc.set(r, c, value);
        }
    }

    if skipped > 0 {
        debug!(skipped, "Cells without marginals left empty");
    }
    info!(
        %measure,
        rows = assoc.shape().0,
        cols = assoc.shape().1,
        nnz = assoc.nnz(),
        "Computed association matrix"
    );
    Ok(assoc)
}

/// Pointwise mutual information of one cell.
pub fn pmi(f: f64, n_r: f64, c_c: f64, total: f64) -> f64 {
    (f * total / (n_r * c_c)).ln()
}

/// Signed Dunning log-likelihood of one cell.
pub fn log_likelihood(f: f64, n_r: f64, c_c: f64, total: f64) -> f64 {
    let observed = [f, n_r - f, c_c - f, total - n_r - c_c + f];
    let expected = [
        n_r * c_c / total,
        n_r * (total - c_c) / total,
        (total - n_r) * c_c / total,
        (total - n_r) * (total - c_c) / total,
    ];
    let g2: f64 = 2.0
        * observed
            .iter()
            .zip(&expected)
            .filter(|(o, e)| **o > 0.0 && **e > 0.0)
            .map(|(o, e)| o * (o / e).ln())
            .sum::<f64>();
    if f < expected[0] {
        -g2
    } else {
        g2
    }
}
