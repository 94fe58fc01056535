// Filename lists: which corpus files belong to which subcorpus.
//
// Each period has `fnames_{period}.txt` under `input-files/filenames/`, one
// corpus file name per line. Merged periods (e.g. 1617 for the sparsely
// attested 16th and 17th centuries) are the concatenation of their parts.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::reader::file_id;
use crate::config::Config;

/// Corpus file names per subcorpus.
#[derive(Debug, Clone, Default)]
pub struct FileLists {
    lists: BTreeMap<String, Vec<String>>,
}

impl FileLists {
    /// Read every configured period's list and build the merged periods.
    pub fn load(config: &Config) -> Result<Self> {
        let dir = config.filenames_dir();
        let mut lists = BTreeMap::new();

        for period in &config.periods {
            let path = dir.join(format!("fnames_{period}.txt"));
            let fnames = read_filename_list(&path)?;
            info!(period = period.as_str(), files = fnames.len(), "Loaded filename list");
            lists.insert(period.clone(), fnames);
        }

        for (name, parts) in &config.merged_periods {
            let combined: Vec<String> = parts
                .iter()
                .flat_map(|p| lists.get(p).cloned().unwrap_or_default())
                .collect();
            lists.insert(name.clone(), combined);
        }

        for (period, fnames) in &lists {
            check_unique_ids(period, fnames)?;
        }
        Ok(Self { lists })
    }

    pub fn from_lists(lists: BTreeMap<String, Vec<String>>) -> Self {
        Self { lists }
    }

    /// File names of a period; errors for a period with no list.
    pub fn get(&self, period: &str) -> Result<&[String]> {
        self.lists
            .get(period)
            .map(Vec::as_slice)
            .with_context(|| format!("No filename list for period {period}"))
    }
}

/// Token ids name their file by `file_id`, so two files of one subcorpus
/// may not share it.
fn check_unique_ids(period: &str, fnames: &[String]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for fname in fnames {
        if let Some(first) = seen.insert(file_id(fname), fname) {
            anyhow::bail!(
                "Period {period} lists {first} and {fname}, which share the file id {:?}. \
                 Rename one of them or remove the repeated entry from the filename lists.",
                file_id(fname)
            );
        }
    }
    Ok(())
}

/// Read a filename list: one name per line, surrounding whitespace trimmed,
/// blank lines skipped.
pub fn read_filename_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read filename list {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
