// Vocab — frequency list of items (word forms, or type strings in general).
//
// Backed by a HashMap for lookups. Every listing goes through
// `items_by_freq`, which sorts by frequency descending and breaks ties on
// the item itself, so saved files and slices are reproducible across runs.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// A frequency list: item -> number of occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocab {
    freqs: HashMap<String, u64>,
}

impl Vocab {
    pub fn new(freqs: HashMap<String, u64>) -> Self {
        Self { freqs }
    }

    /// Build a vocab by counting every item yielded by the iterator.
    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut freqs = HashMap::new();
        for item in items {
            *freqs.entry(item.into()).or_insert(0) += 1;
        }
        Self { freqs }
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    pub fn get(&self, item: &str) -> Option<u64> {
        self.freqs.get(item).copied()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.freqs.contains_key(item)
    }

    /// Add `count` occurrences of `item`.
    pub fn increment(&mut self, item: &str, count: u64) {
        if let Some(freq) = self.freqs.get_mut(item) {
            *freq += count;
        } else {
            self.freqs.insert(item.to_string(), count);
        }
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.freqs.values().sum()
    }

    /// All entries, most frequent first. Ties are ordered by item.
    pub fn items_by_freq(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<(&str, u64)> = self
            .freqs
            .iter()
            .map(|(item, freq)| (item.as_str(), *freq))
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Item labels in frequency order.
    pub fn item_list(&self) -> Vec<String> {
        self.items_by_freq()
            .into_iter()
            .map(|(item, _)| item.to_string())
            .collect()
    }

    /// Restrict to the listed items. Items absent from this vocab are skipped.
    pub fn subvocab<S: AsRef<str>>(&self, items: &[S]) -> Vocab {
        let freqs = items
            .iter()
            .filter_map(|item| {
                let item = item.as_ref();
                self.freqs.get(item).map(|f| (item.to_string(), *f))
            })
            .collect();
        Vocab { freqs }
    }

    /// Items occurring strictly more than `threshold` times.
    pub fn filter_freq(&self, threshold: u64) -> Vocab {
        let freqs = self
            .freqs
            .iter()
            .filter(|(_, f)| **f > threshold)
            .map(|(item, f)| (item.clone(), *f))
            .collect();
        Vocab { freqs }
    }

    /// Items matched by `pattern`. Anchor the pattern to require a full match.
    pub fn filter_items(&self, pattern: &Regex) -> Vocab {
        let freqs = self
            .freqs
            .iter()
            .filter(|(item, _)| pattern.is_match(item))
            .map(|(item, f)| (item.clone(), *f))
            .collect();
        Vocab { freqs }
    }

    /// Word forms only: items made of letters, digits and `_`, in any script.
    pub fn filter_word_forms(&self) -> Vocab {
        let freqs = self
            .freqs
            .iter()
            .filter(|(item, _)| is_word_form(item))
            .map(|(item, f)| (item.clone(), *f))
            .collect();
        Vocab { freqs }
    }

    /// Skip the `skip` most frequent items and keep the next `take`.
    pub fn slice(&self, skip: usize, take: usize) -> Vocab {
        let freqs = self
            .items_by_freq()
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(item, f)| (item.to_string(), f))
            .collect();
        Vocab { freqs }
    }

    /// Combine two vocabs by summing counts.
    pub fn merge(&self, other: &Vocab) -> Vocab {
        let mut merged = self.clone();
        for (item, freq) in &other.freqs {
            merged.increment(item, *freq);
        }
        merged
    }

    /// Write the vocab as `item\tfreq` lines in frequency order.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create frequency list {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for (item, freq) in self.items_by_freq() {
            writeln!(writer, "{item}\t{freq}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a frequency list written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open frequency list {}", path.display()))?;
        let mut freqs = HashMap::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (item, freq) = line.rsplit_once('\t').with_context(|| {
                format!("{}:{}: expected `item<TAB>freq`", path.display(), i + 1)
            })?;
            let freq: u64 = freq
                .parse()
                .with_context(|| format!("{}:{}: bad frequency {freq:?}", path.display(), i + 1))?;
            freqs.insert(item.to_string(), freq);
        }
        Ok(Self { freqs })
    }
}

/// A non-empty item of Unicode letters, digits and underscores (`geëerd`, `België`).
pub fn is_word_form(item: &str) -> bool {
    !item.is_empty() && item.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl FromIterator<(String, u64)> for Vocab {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        let mut vocab = Vocab::default();
        for (item, freq) in iter {
            vocab.increment(&item, freq);
        }
        vocab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocab {
        Vocab::from_items(["de", "de", "de", "stad", "stad", "vernielt", ",", "brand"])
    }

    #[test]
    fn test_items_by_freq_breaks_ties_on_item() {
        let v = sample();
        let items = v.items_by_freq();
        assert_eq!(items[0], ("de", 3));
        assert_eq!(items[1], ("stad", 2));
        // Three items with freq 1, ordered by item
        assert_eq!(items[2].0, ",");
        assert_eq!(items[3].0, "brand");
        assert_eq!(items[4].0, "vernielt");
    }

    #[test]
    fn test_filter_freq_is_exclusive() {
        let v = sample().filter_freq(2);
        assert_eq!(v.len(), 1);
        assert!(v.contains("de"));
    }

    #[test]
    fn test_filter_items_word_forms() {
        let re = Regex::new(r"^\w+$").unwrap();
        let v = sample().filter_items(&re);
        assert!(!v.contains(","));
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn test_word_forms_keep_diacritics() {
        let v = Vocab::from_items(["stad", "geëerd", "ideeën", "België", "zee_1", ",", "'t", "a-b"]);
        let words = v.filter_word_forms();
        assert_eq!(words.len(), 5);
        assert!(words.contains("geëerd"));
        assert!(words.contains("België"));
        assert!(!words.contains("'t"));
        assert!(!words.contains("a-b"));
        assert!(!is_word_form(""));
    }

    #[test]
    fn test_slice_skips_most_frequent() {
        let v = sample().slice(1, 2);
        assert_eq!(v.item_list(), vec![
            "stad".to_string(),
            ",".to_string()
        ]);
    }

    #[test]
    fn test_subvocab_skips_missing() {
        let v = sample().subvocab(&["vernielt", "vernielen"]);
        assert_eq!(v.len(), 1);
        assert_eq!(v.get("vernielt"), Some(1));
    }

    #[test]
    fn test_merge_sums_counts() {
        let a = Vocab::from_items(["a", "b"]);
        let b = Vocab::from_items(["b", "c"]);
        let m = a.merge(&b);
        assert_eq!(m.get("b"), Some(2));
        assert_eq!(m.total(), 4);
    }

    #[test]
    fn test_save_load() {
        let dir = std::env::temp_dir().join(format!("diasem-vocab-{}", std::process::id()));
        let path = dir.join("test.freq");
        let v = sample();
        v.save(&path).unwrap();
        let loaded = Vocab::load(&path).unwrap();
        assert_eq!(v, loaded);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
