// Stage 3: candidate spellings of the lemmas, for manual checking.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::variants::{write_candidates, VariantSet};

use super::freq;

/// Write every word form of the period that starts with a lemma prefix.
///
/// The output is a worklist: the forms that survive the manual check go
/// into the variants file.
pub fn run(
    config: &Config,
    set: &VariantSet,
    period: &str,
) -> Result<Vec<(String, Vec<(String, u64)>)>> {
    let vocab = freq::load(config, period)?;
    let candidates = set.find_candidates(&vocab);
    let path = config.candidates_path();
    write_candidates(&candidates, &path)?;

    let total: usize = candidates.iter().map(|(_, forms)| forms.len()).sum();
    info!(period, candidates = total, path = %path.display(), "Wrote candidate spellings");
    Ok(candidates)
}
