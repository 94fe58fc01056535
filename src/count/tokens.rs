// Token retrieval and sampling.
//
// A token is one occurrence of a queried type. Its id is
// `{type}/{file id}/{line}`, which is unique because a corpus line holds a
// single token. The token matrix has one row per token and one column per
// context item seen around any token; a cell holds the signed distance from
// the token to that context item (-2 = two positions to the left).

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use super::col_freq::window;
use crate::corpus::reader::CorpusReader;
use crate::matrix::{Axis, TypeTokenMatrix};
use crate::vocab::Vocab;

/// Build the id of a token.
pub fn token_id(type_item: &str, fid: &str, line: usize) -> String {
    format!("{type_item}/{fid}/{line}")
}

/// The type a token id belongs to: everything before the last two `/` fields.
pub fn token_type(token_id: &str) -> &str {
    match token_id.rsplitn(3, '/').nth(2) {
        Some(type_item) => type_item,
        None => token_id,
    }
}

/// Retrieve every occurrence of a type in `query`, with its context within `span`.
///
/// Rows are in corpus order; columns are sorted. When a context item occurs
/// more than once around a token, the nearest occurrence is kept (the left
/// one on a tie).
pub fn retrieve_tokens(
    reader: &CorpusReader,
    fnames: &[String],
    query: &Vocab,
    span: usize,
) -> Result<TypeTokenMatrix> {
    let mut token_ids: Vec<String> = Vec::new();
    let mut contexts: Vec<HashMap<String, i64>> = Vec::new();

    reader.for_each_sentence(fnames, "Tokens", |fid, sentence| {
        for (i, target) in sentence.iter().enumerate() {
            if !query.contains(&target.type_item) {
                continue;
            }
            let mut context: HashMap<String, i64> = HashMap::new();
            for j in window(i, sentence.len(), span) {
                let offset = j as i64 - i as i64;
                context
                    .entry(sentence[j].colloc_item.clone())
                    .and_modify(|pos| {
                        if offset.abs() < pos.abs() {
                            *pos = offset;
                        }
                    })
                    .or_insert(offset);
            }
            token_ids.push(token_id(&target.type_item, fid, target.line));
            contexts.push(context);
        }
    })?;

    let col_items: Vec<String> = contexts
        .iter()
        .flat_map(|c| c.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let col_ids: HashMap<&str, usize> = col_items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let triplets: Vec<(usize, usize, f64)> = contexts
        .iter()
        .enumerate()
        .flat_map(|(r, context)| {
            context
                .iter()
                .map(|(item, pos)| (r, col_ids[item.as_str()], *pos as f64))
                .collect::<Vec<_>>()
        })
        .collect();

    let matrix = TypeTokenMatrix::from_triplets(token_ids, col_items.clone(), triplets)?;
    info!(
        tokens = matrix.shape().0,
        context_items = matrix.shape().1,
        span,
        "Retrieved tokens"
    );
    Ok(matrix)
}

/// Draw a reproducible random sample of `size` tokens, keeping corpus order,
/// and drop context columns no sampled token uses.
///
/// When fewer tokens are available than requested, all of them are kept.
pub fn sample_tokens(tokens: &TypeTokenMatrix, size: usize, seed: u64) -> TypeTokenMatrix {
    let available = tokens.shape().0;
    if size >= available {
        if size > available {
            warn!(
                requested = size,
                available, "Fewer tokens than the sample size, keeping all of them"
            );
        }
        return tokens.drop_empty(Axis::Col);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, available, size).into_vec();
    picked.sort_unstable();

    let ids: Vec<&String> = picked.iter().map(|&i| &tokens.row_items()[i]).collect();
    tokens
        .submatrix(Some(ids.as_slice()), None)
        .drop_empty(Axis::Col)
}
