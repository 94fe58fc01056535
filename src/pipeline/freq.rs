// Stage 1: frequency lists per subcorpus.
//
// Plain periods are counted from their corpus files. Merged periods are the
// sum of their parts' lists, which gives the same counts as reading the
// concatenated filename list without a second pass over the corpus.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::corpus::fnames::FileLists;
use crate::corpus::reader::CorpusReader;
use crate::count::item_freq::build_item_freq;
use crate::vocab::Vocab;

/// Build and save the frequency list of every period and merged period.
pub fn run(
    config: &Config,
    reader: &CorpusReader,
    lists: &FileLists,
) -> Result<BTreeMap<String, Vocab>> {
    let mut vocabs = BTreeMap::new();

    for period in &config.periods {
        println!("Counting period {period}...");
        let vocab = build_item_freq(reader, lists.get(period)?)?;
        vocabs.insert(period.clone(), vocab);
    }

    for (name, parts) in &config.merged_periods {
        let merged = parts
            .iter()
            .filter_map(|p| vocabs.get(p))
            .fold(Vocab::default(), |acc, v| acc.merge(v));
        info!(period = name.as_str(), types = merged.len(), "Merged frequency list");
        vocabs.insert(name.clone(), merged);
    }

    for (period, vocab) in &vocabs {
        let path = config.freqlist_path(period);
        vocab.save(&path)?;
        info!(period = period.as_str(), path = %path.display(), "Saved frequency list");
    }

    Ok(vocabs)
}

/// Load the saved frequency list of a period.
pub fn load(config: &Config, period: &str) -> Result<Vocab> {
    let path = config.freqlist_path(period);
    if !path.exists() {
        anyhow::bail!(
            "Frequency list {} not found.\nRun `diasem freq` first.",
            path.display()
        );
    }
    Vocab::load(&path).with_context(|| format!("Loading frequency list for period {period}"))
}
