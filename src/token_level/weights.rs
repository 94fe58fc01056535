use anyhow::Result;
use tracing::{info, warn};

use crate::count::tokens::token_type;
use crate::matrix::TypeTokenMatrix;

/// Weight each token's context items by their association with the token's type.
///
/// `tokens` is a token matrix (non-zero cell = context item present) and
/// `weighter` an association matrix with types as rows. The result has the
/// token rows and `tokens`' columns; a cell holds `weighter[type, item]`, so
/// context items the type has no association with get no weight. Tokens
/// whose type is not a row of `weighter` end up with an empty row.
pub fn compute_token_weights(
    tokens: &TypeTokenMatrix,
    weighter: &TypeTokenMatrix,
) -> Result<TypeTokenMatrix> {
    let mut weights = TypeTokenMatrix::new(tokens.row_items().to_vec(), tokens.col_items().to_vec())?;
    let mut unknown_types = 0usize;

    for (r, token_id) in tokens.row_items().iter().enumerate() {
        let type_item = token_type(token_id);
        let Some(w_row) = weighter.row_position(type_item) else {
            unknown_types += 1;
            continue;
        };
        for (c, _) in tokens.row_entries(r) {
            if let Some(w_col) = weighter.col_position(&tokens.col_items()[c]) {
                weights.set(r, c, weighter.get_at(w_row, w_col));
            }
        }
    }

    if unknown_types > 0 {
        warn!(tokens = unknown_types, "Tokens whose type has no association row");
    }
    let empty = (0..weights.shape().0)
        .filter(|&r| weights.row_entries(r).next().is_none())
        .count();
    info!(
        tokens = weights.shape().0,
        context_items = weights.shape().1,
        without_context = empty,
        "Computed token weights"
    );
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_weights_follow_token_type() {
        let tokens = TypeTokenMatrix::from_triplets(
            labels(&["vernielt/f/1", "vernietigd/f/9", "anders/f/3"]),
            labels(&["stad", "vijand", "de"]),
            [(0, 0, -1.0), (0, 2, 1.0), (1, 1, 2.0), (2, 0, 1.0)],
        )
        .unwrap();
        let weighter = TypeTokenMatrix::from_triplets(
            labels(&["vernielt", "vernietigd"]),
            labels(&["stad", "vijand"]),
            [(0, 0, 3.0), (1, 0, 1.0), (1, 1, 2.5)],
        )
        .unwrap();

        let w = compute_token_weights(&tokens, &weighter).unwrap();
        assert_eq!(w.get("vernielt/f/1", "stad"), 3.0);
        // "de" has no association column
        assert_eq!(w.get("vernielt/f/1", "de"), 0.0);
        assert_eq!(w.get("vernietigd/f/9", "vijand"), 2.5);
        // "stad" is associated with vernietigd but not in that token's context
        assert_eq!(w.get("vernietigd/f/9", "stad"), 0.0);
        // Unknown type
        assert_eq!(w.row_by_label("anders/f/3").len(), 0);
    }
}
