// Matrix files.
//
// `.pac` files hold a bincode-encoded PackedMatrix: the two label lists plus
// the non-zero cells as (row, col, value) triplets. TSV export writes the
// dense matrix for use in R or a spreadsheet.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::TypeTokenMatrix;

/// Bumped whenever PackedMatrix changes shape.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PackedMatrix {
    version: u32,
    row_items: Vec<String>,
    col_items: Vec<String>,
    cells: Vec<(u32, u32, f64)>,
}

impl TypeTokenMatrix {
    /// Write the matrix in the packed binary format.
    pub fn save(&self, path: &Path) -> Result<()> {
        create_parent(path)?;
        let mut cells = Vec::with_capacity(self.nnz());
        for r in 0..self.row_items.len() {
            for (c, v) in self.row_entries(r) {
                cells.push((r as u32, c as u32, v));
            }
        }
        let packed = PackedMatrix {
            version: FORMAT_VERSION,
            row_items: self.row_items.clone(),
            col_items: self.col_items.clone(),
            cells,
        };

        let file = File::create(path)
            .with_context(|| format!("Failed to create matrix file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &packed)
            .with_context(|| format!("Failed to write matrix to {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }

    /// Read a matrix written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open matrix file {}", path.display()))?;
        let packed: PackedMatrix = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("Failed to decode matrix file {}", path.display()))?;
        if packed.version != FORMAT_VERSION {
            anyhow::bail!(
                "{} has matrix format version {}, expected {}",
                path.display(),
                packed.version,
                FORMAT_VERSION
            );
        }
        Self::from_triplets(
            packed.row_items,
            packed.col_items,
            packed
                .cells
                .into_iter()
                .map(|(r, c, v)| (r as usize, c as usize, v)),
        )
        .with_context(|| format!("Corrupt matrix file {}", path.display()))
    }

    /// Write the full matrix as tab-separated text, with column labels in the
    /// header and row labels in the first column.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        create_parent(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        write!(writer, "_id")?;
        for col in &self.col_items {
            write!(writer, "\t{col}")?;
        }
        writeln!(writer)?;

        for (r, label) in self.row_items.iter().enumerate() {
            write!(writer, "{label}")?;
            for v in self.dense_row(r) {
                write!(writer, "\t{v}")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}
