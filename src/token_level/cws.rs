// Context words per token, for inspecting what a token vector is built from.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::matrix::TypeTokenMatrix;

/// Token id -> context items with a non-zero weight, in column order.
pub fn list_cws(weights: &TypeTokenMatrix) -> Vec<(String, Vec<String>)> {
    weights
        .row_items()
        .iter()
        .enumerate()
        .map(|(r, token)| {
            let cws = weights
                .row_entries(r)
                .map(|(c, _)| weights.col_items()[c].clone())
                .collect();
            (token.clone(), cws)
        })
        .collect()
}

/// Write `tokid<TAB>cws` lines, the context items joined with `;`.
pub fn write_cws_tsv(cws: &[(String, Vec<String>)], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "tokid\tcws")?;
    for (token, items) in cws {
        writeln!(writer, "{token}\t{}", items.join(";"))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_write_cws() {
        let weights = TypeTokenMatrix::from_triplets(
            vec!["vernielt/f/1".into(), "vernietigd/f/2".into()],
            vec!["stad".into(), "vijand".into(), "vuur".into()],
            [(0, 2, 1.2), (0, 0, 3.0)],
        )
        .unwrap();

        let cws = list_cws(&weights);
        assert_eq!(cws[0].1, vec!["stad", "vuur"]);
        assert!(cws[1].1.is_empty());

        let dir = std::env::temp_dir().join(format!("diasem-cws-{}", std::process::id()));
        let path = dir.join("cws_model.tsv");
        write_cws_tsv(&cws, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "tokid\tcws\nvernielt/f/1\tstad;vuur\nvernietigd/f/2\t\n");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
