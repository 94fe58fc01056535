// Co-occurrence counting.
//
// For every token whose type is in the row vocab, every other token within
// `span` positions on either side of it, in the same sentence, adds one to
// (type, colloc) when its colloc item is in the column vocab. Positions count
// all tokens of the sentence, including ones outside the column vocab.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use crate::corpus::reader::{CorpusReader, CorpusToken};
use crate::matrix::TypeTokenMatrix;
use crate::vocab::Vocab;

/// Build a co-occurrence frequency matrix (row vocab x column vocab).
///
/// Rows and columns follow the vocabs' frequency order; rows or columns
/// that never co-occur stay in the matrix as empty.
pub fn build_col_freq(
    reader: &CorpusReader,
    fnames: &[String],
    row_vocab: &Vocab,
    col_vocab: &Vocab,
    span: usize,
) -> Result<TypeTokenMatrix> {
    let row_items = row_vocab.item_list();
    let col_items = col_vocab.item_list();
    let row_ids: HashMap<&str, usize> = row_items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let col_ids: HashMap<&str, usize> = col_items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut counts: HashMap<(usize, usize), u64> = HashMap::new();
    reader.for_each_sentence(fnames, &format!("Window {span}"), |_, sentence| {
        count_sentence(sentence, span, &row_ids, &col_ids, &mut counts);
    })?;

    let matrix = TypeTokenMatrix::from_triplets(
        row_items.clone(),
        col_items.clone(),
        counts.into_iter().map(|((r, c), n)| (r, c, n as f64)),
    )?;

    info!(
        span,
        rows = matrix.shape().0,
        cols = matrix.shape().1,
        nnz = matrix.nnz(),
        "Built co-occurrence matrix"
    );
    Ok(matrix)
}

/// Positions within `span` of `i` in a sentence of `len` tokens, excluding `i`.
pub fn window(i: usize, len: usize, span: usize) -> impl Iterator<Item = usize> {
    let start = i.saturating_sub(span);
    let end = (i + span + 1).min(len);
    (start..end).filter(move |&j| j != i)
}

fn count_sentence(
    sentence: &[CorpusToken],
    span: usize,
    row_ids: &HashMap<&str, usize>,
    col_ids: &HashMap<&str, usize>,
    counts: &mut HashMap<(usize, usize), u64>,
) {
    for (i, target) in sentence.iter().enumerate() {
        let Some(&r) = row_ids.get(target.type_item.as_str()) else {
            continue;
        };
        for j in window(i, sentence.len(), span) {
            if let Some(&c) = col_ids.get(sentence[j].colloc_item.as_str()) {
                *counts.entry((r, c)).or_insert(0) += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(item: &str) -> CorpusToken {
        CorpusToken {
            type_item: item.to_string(),
            colloc_item: item.to_string(),
            line: 0,
        }
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(window(0, 5, 2).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(window(2, 5, 1).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(window(4, 5, 10).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_count_sentence_respects_span() {
        let sentence: Vec<CorpusToken> = ["vijand", "vernielt", "de", "stad"].map(tok).to_vec();
        let row_ids: HashMap<&str, usize> = [("vernielt", 0)].into();
        let col_ids: HashMap<&str, usize> = [("vijand", 0), ("stad", 1)].into();
        let mut counts = HashMap::new();

        count_sentence(&sentence, 1, &row_ids, &col_ids, &mut counts);
        assert_eq!(counts.get(&(0, 0)), Some(&1));
        // "stad" is two positions away
        assert_eq!(counts.get(&(0, 1)), None);

        count_sentence(&sentence, 2, &row_ids, &col_ids, &mut counts);
        assert_eq!(counts.get(&(0, 0)), Some(&2));
        assert_eq!(counts.get(&(0, 1)), Some(&1));
    }
}
