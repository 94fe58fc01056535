// Stage 2: co-occurrence frequency matrices per subcorpus and window size.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::corpus::fnames::FileLists;
use crate::corpus::reader::CorpusReader;
use crate::count::col_freq::build_col_freq;
use crate::matrix::TypeTokenMatrix;

use super::freq;

/// Build and save a vocab x vocab matrix for every modelled period and window.
///
/// Returns the paths written.
pub fn run(config: &Config, reader: &CorpusReader, lists: &FileLists) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for period in config.modelled_periods() {
        let vocab = freq::load(config, &period)?;
        let fnames = lists.get(&period)?;
        for &window in &config.windows {
            println!("Building co-occurrence matrix for period {period}, window {window}...");
            let matrix = build_col_freq(reader, fnames, &vocab, &vocab, window)?;
            let path = config.freq_matrix_path(&period, window);
            matrix.save(&path)?;
            info!(period = period.as_str(), window, path = %path.display(), "Saved co-occurrence matrix");
            written.push(path);
        }
    }

    Ok(written)
}

/// Load the saved co-occurrence matrix of a period and window.
pub fn load(config: &Config, period: &str, window: usize) -> Result<TypeTokenMatrix> {
    let path = config.freq_matrix_path(period, window);
    if !path.exists() {
        anyhow::bail!(
            "Co-occurrence matrix {} not found.\n\
             Run `diasem colloc` first, and check that {window} is listed in DIASEM_WINDOWS.",
            path.display()
        );
    }
    TypeTokenMatrix::load(&path)
        .with_context(|| format!("Loading co-occurrence matrix for period {period}, window {window}"))
}
