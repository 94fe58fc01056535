use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::assoc::Measure;
use crate::token_level::distance::Metric;
use crate::variants::LemmaMarginal;

/// Default corpus line layout: word, part of speech and lemma, tab-separated.
pub const DEFAULT_LINE_MACHINE: &str =
    r"^(?P<word>[^\t]+)\t(?P<pos>[^\t]+)\t(?P<lemma>[^\t]+)$";

/// Central configuration loaded from environment variables.
///
/// Values come from a dotenv-format settings file (`--config`, or `.env`
/// in the working directory) plus the process environment. Every key is
/// prefixed with `DIASEM_`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the corpus files named in the filename lists
    pub corpus_path: PathBuf,
    /// Root of everything the pipeline writes
    pub output_path: PathBuf,
    /// Regex with named groups describing one corpus line
    pub line_machine: String,
    /// Regex for lines that end a sentence; windows never cross one
    pub separator_line_machine: Option<String>,
    /// Template for type strings, e.g. `{word}` or `{lemma}/{pos}`
    pub type_format: String,
    /// Template for context (collocate) strings
    pub colloc_format: String,
    pub lowercase: bool,
    /// Subcorpora with their own filename list
    pub periods: Vec<String>,
    /// Subcorpora combined from others, e.g. `1617` = `16` + `17`
    pub merged_periods: BTreeMap<String, Vec<String>>,
    /// The subcorpus the token-level model is built for
    pub model_period: String,
    /// Window sizes to build co-occurrence matrices for
    pub windows: Vec<usize>,
    /// Window of the matrix used for first-order weights
    pub foc_window: usize,
    /// Window of the matrix used for second-order vectors
    pub soc_window: usize,
    /// Span around each token when retrieving its context
    pub token_span: usize,
    pub sample_size: usize,
    pub seed: u64,
    /// First-order context words must occur more often than this
    pub foc_min_freq: u64,
    /// Association scores must exceed this to weight a context word
    pub assoc_cutoff: f64,
    /// Most frequent word forms skipped for second-order dimensions
    pub soc_skip: usize,
    /// Number of second-order dimensions kept after the skip
    pub soc_take: usize,
    /// Regex overriding which vocab items count as word forms. Unset keeps
    /// items of Unicode letters, digits and `_`.
    pub word_pattern: Option<String>,
    pub measure: Measure,
    /// Row marginal used when weighting a lemma row
    pub lemma_marginal: LemmaMarginal,
    pub metric: Metric,
    /// JSON file with the lemma variant lists (built-in lists otherwise)
    pub variants_path: Option<PathBuf>,
}

impl Default for Config {
    /// The settings used for the 16th-20th century models.
    fn default() -> Self {
        let mut merged_periods = BTreeMap::new();
        merged_periods.insert("1617".to_string(), vec!["16".to_string(), "17".to_string()]);
        Self {
            corpus_path: PathBuf::new(),
            output_path: PathBuf::from("./output"),
            line_machine: DEFAULT_LINE_MACHINE.to_string(),
            separator_line_machine: Some("^</s>$".to_string()),
            type_format: "{word}".to_string(),
            colloc_format: "{word}".to_string(),
            lowercase: true,
            periods: ["16", "17", "18", "19", "20"].map(String::from).to_vec(),
            merged_periods,
            model_period: "1617".to_string(),
            windows: vec![4, 5, 10],
            foc_window: 10,
            soc_window: 4,
            token_span: 10,
            sample_size: 400,
            seed: 97,
            foc_min_freq: 10,
            assoc_cutoff: 2.0,
            soc_skip: 100,
            soc_take: 5000,
            word_pattern: None,
            measure: Measure::Ppmi,
            lemma_marginal: LemmaMarginal::Form,
            metric: Metric::Cosine,
            variants_path: None,
        }
    }
}

impl Config {
    /// Load the settings file (if any) and read configuration from the environment.
    ///
    /// An explicit `settings` path must exist. Without one, a `.env` in the
    /// working directory is used when present.
    pub fn load(settings: Option<&Path>) -> Result<Self> {
        match settings {
            Some(path) => {
                dotenvy::from_path(path)
                    .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            }
            None => {
                let _ = dotenvy::dotenv();
            }
        }
        Self::from_env()
    }

    /// Read configuration from the process environment only.
    pub fn from_env() -> Result<Self> {
        let d = Config::default();

        let periods = match env::var("DIASEM_PERIODS") {
            Ok(raw) => split_list(&raw),
            Err(_) => d.periods,
        };
        let merged_periods = match env::var("DIASEM_MERGED_PERIODS") {
            Ok(raw) => parse_merged(&raw)?,
            Err(_) => d.merged_periods,
        };

        for (name, parts) in &merged_periods {
            for part in parts {
                if !periods.contains(part) {
                    anyhow::bail!(
                        "DIASEM_MERGED_PERIODS: {name} uses unknown period {part}. \
                         Known periods: {}",
                        periods.join(", ")
                    );
                }
            }
        }

        let windows = match env::var("DIASEM_WINDOWS") {
            Ok(raw) => split_list(&raw)
                .iter()
                .map(|w| {
                    w.parse::<usize>()
                        .with_context(|| format!("DIASEM_WINDOWS: {w:?} is not a window size"))
                })
                .collect::<Result<Vec<_>>>()?,
            Err(_) => d.windows,
        };

        let separator_line_machine = match env::var("DIASEM_SEPARATOR_LINE_MACHINE") {
            Ok(raw) if raw.is_empty() => None,
            Ok(raw) => Some(raw),
            Err(_) => d.separator_line_machine,
        };

        Ok(Self {
            corpus_path: env::var("DIASEM_CORPUS_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.corpus_path),
            output_path: env::var("DIASEM_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.output_path),
            line_machine: env::var("DIASEM_LINE_MACHINE").unwrap_or(d.line_machine),
            separator_line_machine,
            type_format: env::var("DIASEM_TYPE_FORMAT").unwrap_or(d.type_format),
            colloc_format: env::var("DIASEM_COLLOC_FORMAT").unwrap_or(d.colloc_format),
            lowercase: parse_var("DIASEM_LOWERCASE", d.lowercase)?,
            periods,
            merged_periods,
            model_period: env::var("DIASEM_MODEL_PERIOD").unwrap_or(d.model_period),
            windows,
            foc_window: parse_var("DIASEM_FOC_WINDOW", d.foc_window)?,
            soc_window: parse_var("DIASEM_SOC_WINDOW", d.soc_window)?,
            token_span: parse_var("DIASEM_TOKEN_SPAN", d.token_span)?,
            sample_size: parse_var("DIASEM_SAMPLE_SIZE", d.sample_size)?,
            seed: parse_var("DIASEM_SEED", d.seed)?,
            foc_min_freq: parse_var("DIASEM_FOC_MIN_FREQ", d.foc_min_freq)?,
            assoc_cutoff: parse_var("DIASEM_ASSOC_CUTOFF", d.assoc_cutoff)?,
            soc_skip: parse_var("DIASEM_SOC_SKIP", d.soc_skip)?,
            soc_take: parse_var("DIASEM_SOC_TAKE", d.soc_take)?,
            word_pattern: env::var("DIASEM_WORD_PATTERN")
                .ok()
                .filter(|p| !p.is_empty())
                .or(d.word_pattern),
            measure: parse_var("DIASEM_MEASURE", d.measure)?,
            lemma_marginal: parse_var("DIASEM_LEMMA_MARGINAL", d.lemma_marginal)?,
            metric: parse_var("DIASEM_METRIC", d.metric)?,
            variants_path: env::var("DIASEM_VARIANTS_PATH")
                .ok()
                .map(PathBuf::from)
                .or(d.variants_path),
        })
    }

    /// Check that the corpus directory is configured and exists.
    /// Call this before any stage that reads corpus files.
    pub fn require_corpus(&self) -> Result<()> {
        if self.corpus_path.as_os_str().is_empty() {
            anyhow::bail!(
                "DIASEM_CORPUS_PATH not set. Add it to your settings file.\n\
                 See settings.env.example for the available keys."
            );
        }
        if !self.corpus_path.is_dir() {
            anyhow::bail!(
                "Corpus directory {} does not exist",
                self.corpus_path.display()
            );
        }
        Ok(())
    }

    /// Every subcorpus the frequency lists are built for: plain periods, then merged ones.
    pub fn all_periods(&self) -> Vec<String> {
        let mut all = self.periods.clone();
        all.extend(self.merged_periods.keys().cloned());
        all
    }

    /// Subcorpora that get co-occurrence matrices and models. A period that
    /// is part of a merged period is replaced by the merged one.
    pub fn modelled_periods(&self) -> Vec<String> {
        let mut modelled = Vec::new();
        for period in &self.periods {
            let merged = self
                .merged_periods
                .iter()
                .find(|(_, parts)| parts.contains(period))
                .map(|(name, _)| name.clone());
            let chosen = merged.unwrap_or_else(|| period.clone());
            if !modelled.contains(&chosen) {
                modelled.push(chosen);
            }
        }
        modelled
    }

    pub fn filenames_dir(&self) -> PathBuf {
        self.output_path.join("input-files").join("filenames")
    }

    pub fn freqlist_path(&self, period: &str) -> PathBuf {
        self.output_path
            .join("input-files")
            .join("frequency-lists")
            .join(format!("freqlist_cent{period}.freq"))
    }

    pub fn freq_matrix_path(&self, period: &str, window: usize) -> PathBuf {
        self.output_path
            .join("input-files")
            .join("frequency-matrices")
            .join(format!("freqMTX_cent{period}_CW{window}.wcmx.pac"))
    }

    pub fn candidates_path(&self) -> PathBuf {
        self.output_path.join("destroyspellings.txt")
    }

    pub fn token_level_dir(&self) -> PathBuf {
        self.output_path.join("token-level")
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}: cannot parse {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `1617=16+17;1819=18+19` into name -> parts.
pub fn parse_merged(raw: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let mut merged = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, parts) = entry
            .split_once('=')
            .with_context(|| format!("Merged period {entry:?} must look like name=a+b"))?;
        let parts: Vec<String> = parts
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if parts.is_empty() {
            anyhow::bail!("Merged period {name:?} has no parts");
        }
        merged.insert(name.trim().to_string(), parts);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_merged() {
        let merged = parse_merged("1617=16+17; 1819 = 18 + 19").unwrap();
        assert_eq!(merged["1617"], vec!["16", "17"]);
        assert_eq!(merged["1819"], vec!["18", "19"]);
    }

    #[test]
    fn test_parse_merged_rejects_malformed() {
        assert!(parse_merged("1617").is_err());
        assert!(parse_merged("1617=").is_err());
    }

    #[test]
    fn test_modelled_periods_replace_merged_parts() {
        let config = Config::default();
        assert_eq!(config.modelled_periods(), vec!["1617", "18", "19", "20"]);
        assert_eq!(
            config.all_periods(),
            vec!["16", "17", "18", "19", "20", "1617"]
        );
    }

    #[test]
    fn test_artifact_paths() {
        let config = Config {
            output_path: PathBuf::from("/data"),
            ..Config::default()
        };
        assert_eq!(
            config.freq_matrix_path("1617", 10),
            PathBuf::from("/data/input-files/frequency-matrices/freqMTX_cent1617_CW10.wcmx.pac")
        );
        assert_eq!(
            config.freqlist_path("18"),
            PathBuf::from("/data/input-files/frequency-lists/freqlist_cent18.freq")
        );
    }

    #[test]
    fn test_split_list_skips_blanks() {
        assert_eq!(split_list("4, 5,,10 "), vec!["4", "5", "10"]);
    }
}
