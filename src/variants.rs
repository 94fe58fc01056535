// Spelling variants of the lemmas under study.
//
// The corpus is not lemmatized, so each lemma is represented by the list of
// word forms (inflections and historical spellings) that were checked by hand
// to belong to it. The prefixes are only used to propose candidates for that
// manual check.
//
// Lemma-level matrices are built by summing the rows of all variants of a
// lemma into one row and then giving every variant a copy of that row, so
// that every form of a lemma is weighted by the same lemma-level profile.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assoc::{compute_association_with_total, Measure};
use crate::matrix::{Marginals, TypeTokenMatrix};
use crate::vocab::Vocab;

/// One lemma with its curated word forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LemmaVariants {
    pub lemma: String,
    /// Word-form prefixes used to look for candidate spellings
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// Word forms confirmed to belong to the lemma
    pub variants: Vec<String>,
}

/// The lemmas under study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSet {
    pub lemmas: Vec<LemmaVariants>,
}

/// Which row marginal a lemma row is weighted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LemmaMarginal {
    /// Marginal of the word form spelled like the lemma (`vernielen`)
    #[default]
    Form,
    /// Sum of the marginals of all the lemma's variants
    Lemma,
}

impl fmt::Display for LemmaMarginal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LemmaMarginal::Form => f.write_str("form"),
            LemmaMarginal::Lemma => f.write_str("lemma"),
        }
    }
}

impl FromStr for LemmaMarginal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "form" => Ok(LemmaMarginal::Form),
            "lemma" => Ok(LemmaMarginal::Lemma),
            other => anyhow::bail!("Unknown lemma marginal {other:?} (expected form or lemma)"),
        }
    }
}

/// The summed row of one lemma, with the variants it stands for.
#[derive(Debug, Clone)]
pub struct LemmaRow {
    pub lemma: String,
    /// Variants present in the source matrix, in list order
    pub variants: Vec<String>,
    /// Single-row matrix labelled with the lemma
    pub row: TypeTokenMatrix,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for VariantSet {
    /// vernielen and vernietigen ("to destroy") in 16th-20th century Dutch.
    fn default() -> Self {
        Self {
            lemmas: vec![
                LemmaVariants {
                    lemma: "vernielen".to_string(),
                    prefixes: strings(&["verniel", "vernyel"]),
                    variants: strings(&[
                        "vernielen", "vernielt", "vernield", "vernielde", "verniele", "verniel",
                        "vernielden", "vernieldt", "vernyelt", "vernyelen",
                    ]),
                },
                LemmaVariants {
                    lemma: "vernietigen".to_string(),
                    prefixes: strings(&["vernietig", "vernietich"]),
                    variants: strings(&[
                        "vernietigen", "vernietight", "vernietigt", "vernietigd", "vernietig",
                        "vernietige", "vernietigden", "vernietigde", "vernietighen", "vernietighd",
                        "vernietighde", "vernieticht", "vernietichde",
                    ]),
                },
            ],
        }
    }
}

impl VariantSet {
    /// Read a variant set from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read variants file {}", path.display()))?;
        let set: VariantSet = serde_json::from_str(&text)
            .with_context(|| format!("Malformed variants file {}", path.display()))?;
        set.validate()?;
        Ok(set)
    }

    /// The configured file if there is one, else the built-in lists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Lemma names are unique, each word form belongs to one lemma only,
    /// and every lemma needs forms.
    pub fn validate(&self) -> Result<()> {
        if self.lemmas.is_empty() {
            anyhow::bail!("Variant set has no lemmas");
        }
        let mut lemmas = std::collections::HashSet::new();
        let mut seen = std::collections::HashMap::new();
        for entry in &self.lemmas {
            if !lemmas.insert(entry.lemma.as_str()) {
                anyhow::bail!("Lemma {} is listed more than once", entry.lemma);
            }
            if entry.variants.is_empty() {
                anyhow::bail!("Lemma {} has no variants", entry.lemma);
            }
            for form in &entry.variants {
                if let Some(other) = seen.insert(form.as_str(), entry.lemma.as_str()) {
                    anyhow::bail!(
                        "Word form {form:?} is listed under both {other} and {}",
                        entry.lemma
                    );
                }
            }
        }
        Ok(())
    }

    /// All variants of all lemmas, in lemma order.
    pub fn queries_flat(&self) -> Vec<String> {
        self.lemmas
            .iter()
            .flat_map(|l| l.variants.iter().cloned())
            .collect()
    }

    /// The lemma a word form belongs to.
    pub fn lemma_of(&self, form: &str) -> Option<&str> {
        self.lemmas
            .iter()
            .find(|l| l.variants.iter().any(|v| v == form))
            .map(|l| l.lemma.as_str())
    }

    /// Per lemma, every vocab item starting with one of its prefixes, most frequent first.
    pub fn find_candidates(&self, vocab: &Vocab) -> Vec<(String, Vec<(String, u64)>)> {
        let ranked = vocab.items_by_freq();
        self.lemmas
            .iter()
            .map(|entry| {
                let found = ranked
                    .iter()
                    .filter(|(item, _)| entry.prefixes.iter().any(|p| item.starts_with(p.as_str())))
                    .map(|(item, freq)| (item.to_string(), *freq))
                    .collect();
                (entry.lemma.clone(), found)
            })
            .collect()
    }

    /// Sum the variant rows of every lemma in `freq` into one row per lemma.
    ///
    /// Variants missing from `freq` are skipped. A lemma none of whose
    /// variants occur is left out.
    pub fn collapse(&self, freq: &TypeTokenMatrix) -> Vec<LemmaRow> {
        let mut rows = Vec::new();
        for entry in &self.lemmas {
            let present: Vec<String> = entry
                .variants
                .iter()
                .filter(|v| freq.row_position(v).is_some())
                .cloned()
                .collect();
            if present.len() < entry.variants.len() {
                debug!(
                    lemma = entry.lemma.as_str(),
                    missing = entry.variants.len() - present.len(),
                    "Variants without a row"
                );
            }
            if present.is_empty() {
                warn!(lemma = entry.lemma.as_str(), "No variant of this lemma occurs, skipping it");
                continue;
            }
            let row = freq
                .submatrix(Some(present.as_slice()), None)
                .collapse_rows(&entry.lemma);
            rows.push(LemmaRow {
                lemma: entry.lemma.clone(),
                variants: present,
                row,
            });
        }
        rows
    }

    /// Row marginals for lemma rows, keyed by lemma.
    ///
    /// `Form` takes the marginal of the row labelled like the lemma itself;
    /// a lemma with no such row gets 0, which leaves its row unweighted.
    /// `Lemma` sums the marginals of all its variants.
    pub fn lemma_marginals(&self, nfreq: &Marginals, mode: LemmaMarginal) -> Marginals {
        self.lemmas
            .iter()
            .map(|entry| {
                let total = match mode {
                    LemmaMarginal::Form => nfreq.get(&entry.lemma).copied().unwrap_or_else(|| {
                        warn!(lemma = entry.lemma.as_str(), "No row for the lemma form, its marginal is 0");
                        0.0
                    }),
                    LemmaMarginal::Lemma => entry
                        .variants
                        .iter()
                        .filter_map(|v| nfreq.get(v))
                        .sum::<f64>(),
                };
                (entry.lemma.clone(), total)
            })
            .collect()
    }
}

impl LemmaRow {
    /// Weight the lemma row with an association measure.
    ///
    /// `lemma_nfreq` holds the lemma marginals (see `VariantSet::lemma_marginals`)
    /// and `total` the corpus total they are measured against.
    pub fn associate(
        &self,
        lemma_nfreq: &Marginals,
        cfreq: &Marginals,
        total: f64,
        measure: Measure,
    ) -> Result<LemmaRow> {
        let row = compute_association_with_total(&self.row, lemma_nfreq, cfreq, total, measure)?;
        Ok(LemmaRow {
            lemma: self.lemma.clone(),
            variants: self.variants.clone(),
            row,
        })
    }
}

/// Give every variant a copy of its lemma's row and stack all lemmas.
///
/// Rows are the variants, lemma by lemma; columns are the union of the
/// lemma rows' columns.
pub fn expand(rows: &[LemmaRow]) -> Result<TypeTokenMatrix> {
    let mut merged: Option<TypeTokenMatrix> = None;
    for lemma_row in rows {
        let replicated = lemma_row
            .row
            .replicate_row(&lemma_row.variants)
            .with_context(|| format!("Failed to expand lemma {}", lemma_row.lemma))?;
        merged = Some(match merged {
            Some(acc) => acc.merge(&replicated),
            None => replicated,
        });
    }
    let matrix = merged.context("No lemma rows to expand")?;
    info!(
        rows = matrix.shape().0,
        cols = matrix.shape().1,
        "Built lemma-level matrix"
    );
    Ok(matrix)
}

/// Write candidate spellings, one per line, grouped by lemma.
pub fn write_candidates(candidates: &[(String, Vec<(String, u64)>)], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (_, forms) in candidates {
        for (form, _) in forms {
            writeln!(writer, "{form}")?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_valid() {
        let set = VariantSet::default();
        set.validate().unwrap();
        assert_eq!(set.queries_flat().len(), 23);
        assert_eq!(set.lemma_of("vernyelt"), Some("vernielen"));
        assert_eq!(set.lemma_of("vernietichde"), Some("vernietigen"));
        assert_eq!(set.lemma_of("verniet"), None);
    }

    #[test]
    fn test_duplicate_form_rejected() {
        let mut set = VariantSet::default();
        set.lemmas[1].variants.push("vernielt".to_string());
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_find_candidates_by_prefix() {
        let vocab = Vocab::from_items([
            "vernielt", "vernielt", "vernyelen", "vernietigt", "vernieuwd", "stad",
        ]);
        let candidates = VariantSet::default().find_candidates(&vocab);
        assert_eq!(candidates[0].0, "vernielen");
        assert_eq!(
            candidates[0].1,
            vec![("vernielt".to_string(), 2), ("vernyelen".to_string(), 1)]
        );
        // "vernieuwd" matches neither lemma's prefixes
        assert_eq!(candidates[1].1, vec![("vernietigt".to_string(), 1)]);
    }

    #[test]
    fn test_duplicate_lemma_rejected() {
        let mut set = VariantSet::default();
        set.lemmas.push(LemmaVariants {
            lemma: "vernielen".to_string(),
            prefixes: Vec::new(),
            variants: vec!["vernyeld".to_string()],
        });
        let err = set.validate().unwrap_err().to_string();
        assert!(err.contains("more than once"));
    }

    fn marginals() -> Marginals {
        [
            ("vernielt".to_string(), 4.0),
            ("vernielen".to_string(), 6.0),
            ("vernietigd".to_string(), 2.0),
        ]
        .into()
    }

    #[test]
    fn test_lemma_marginals_sum_variants() {
        let m = VariantSet::default().lemma_marginals(&marginals(), LemmaMarginal::Lemma);
        assert_eq!(m["vernielen"], 10.0);
        assert_eq!(m["vernietigen"], 2.0);
    }

    #[test]
    fn test_form_marginals_use_lemma_spelling() {
        let m = VariantSet::default().lemma_marginals(&marginals(), LemmaMarginal::Form);
        assert_eq!(m["vernielen"], 6.0);
        // No "vernietigen" row
        assert_eq!(m["vernietigen"], 0.0);
    }

    #[test]
    fn test_lemma_marginal_from_str() {
        assert_eq!("Form".parse::<LemmaMarginal>().unwrap(), LemmaMarginal::Form);
        assert_eq!("lemma".parse::<LemmaMarginal>().unwrap(), LemmaMarginal::Lemma);
        assert!("sum".parse::<LemmaMarginal>().is_err());
    }
}
