// Labelled sparse matrices.
//
// Every matrix in the pipeline (co-occurrence counts, association scores,
// token contexts, token weights, token vectors, token distances) is a
// TypeTokenMatrix: string labels on both axes and a sparse map of non-zero
// cells per row. Operations that select by label keep the caller's order,
// which is what lets later steps line up columns of one matrix with rows of
// another.

pub mod persist;

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use tracing::debug;

/// Per-label totals, e.g. row or column sums of a frequency matrix.
pub type Marginals = HashMap<String, f64>;

/// Which axis an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// A sparse matrix with labelled rows and columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTokenMatrix {
    row_items: Vec<String>,
    col_items: Vec<String>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
    /// One map per row: column index -> value. Zeros are never stored.
    rows: Vec<BTreeMap<usize, f64>>,
}

fn build_index(items: &[String], axis: Axis) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if index.insert(item.clone(), i).is_some() {
            anyhow::bail!("Duplicate {axis:?} label {item:?} in matrix");
        }
    }
    Ok(index)
}

impl TypeTokenMatrix {
    /// An all-zero matrix with the given labels.
    pub fn new(row_items: Vec<String>, col_items: Vec<String>) -> Result<Self> {
        let row_index = build_index(&row_items, Axis::Row)?;
        let col_index = build_index(&col_items, Axis::Col)?;
        let rows = vec![BTreeMap::new(); row_items.len()];
        Ok(Self {
            row_items,
            col_items,
            row_index,
            col_index,
            rows,
        })
    }

    /// Build from `(row, col, value)` index triplets. Repeated cells are summed.
    pub fn from_triplets<I>(row_items: Vec<String>, col_items: Vec<String>, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut matrix = Self::new(row_items, col_items)?;
        let (n_rows, n_cols) = matrix.shape();
        for (r, c, v) in triplets {
            if r >= n_rows || c >= n_cols {
                anyhow::bail!("Cell ({r}, {c}) out of bounds for a {n_rows}x{n_cols} matrix");
            }
            matrix.add(r, c, v);
        }
        Ok(matrix)
    }

    pub fn row_items(&self) -> &[String] {
        &self.row_items
    }

    pub fn col_items(&self) -> &[String] {
        &self.col_items
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_items.len(), self.col_items.len())
    }

    /// Number of stored (non-zero) cells.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn row_position(&self, label: &str) -> Option<usize> {
        self.row_index.get(label).copied()
    }

    pub fn col_position(&self, label: &str) -> Option<usize> {
        self.col_index.get(label).copied()
    }

    /// Value at (row label, column label); zero when either label is unknown.
    pub fn get(&self, row: &str, col: &str) -> f64 {
        match (self.row_position(row), self.col_position(col)) {
            (Some(r), Some(c)) => self.get_at(r, c),
            _ => 0.0,
        }
    }

    pub fn get_at(&self, r: usize, c: usize) -> f64 {
        self.rows[r].get(&c).copied().unwrap_or(0.0)
    }

    /// Overwrite a cell. Setting zero removes it.
    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        if value == 0.0 {
            self.rows[r].remove(&c);
        } else {
            self.rows[r].insert(c, value);
        }
    }

    /// Add to a cell.
    pub fn add(&mut self, r: usize, c: usize, value: f64) {
        let updated = self.get_at(r, c) + value;
        self.set(r, c, updated);
    }

    /// Non-zero cells of row `r` as (column index, value), in column order.
    pub fn row_entries(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.rows[r].iter().map(|(c, v)| (*c, *v))
    }

    /// Non-zero cells of the row with this label, with column labels.
    pub fn row_by_label(&self, label: &str) -> Vec<(&str, f64)> {
        match self.row_position(label) {
            Some(r) => self
                .row_entries(r)
                .map(|(c, v)| (self.col_items[c].as_str(), v))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Row `r` as a dense vector over all columns.
    pub fn dense_row(&self, r: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.col_items.len()];
        for (c, v) in self.row_entries(r) {
            dense[c] = v;
        }
        dense
    }

    /// Multiply every cell of row `r` by `factor`.
    pub fn scale_row(&mut self, r: usize, factor: f64) {
        if factor == 0.0 {
            self.rows[r].clear();
            return;
        }
        for value in self.rows[r].values_mut() {
            *value *= factor;
        }
    }

    /// Keep the requested rows and/or columns, in the requested order.
    ///
    /// `None` keeps that axis as is. Requested labels that the matrix does
    /// not have are skipped, as are repeats.
    pub fn submatrix<S: AsRef<str>>(&self, rows: Option<&[S]>, cols: Option<&[S]>) -> Self {
        let row_sel = select_positions(&self.row_index, &self.row_items, rows, Axis::Row);
        let col_sel = select_positions(&self.col_index, &self.col_items, cols, Axis::Col);

        let col_map: HashMap<usize, usize> = col_sel
            .iter()
            .enumerate()
            .map(|(new, old)| (*old, new))
            .collect();

        let rows_data = row_sel
            .iter()
            .map(|&old_r| {
                self.rows[old_r]
                    .iter()
                    .filter_map(|(c, v)| col_map.get(c).map(|new_c| (*new_c, *v)))
                    .collect()
            })
            .collect();

        self.rebuilt(
            row_sel.iter().map(|&r| self.row_items[r].clone()).collect(),
            col_sel.iter().map(|&c| self.col_items[c].clone()).collect(),
            rows_data,
        )
    }

    /// Remove rows or columns that contain no non-zero cell.
    pub fn drop_empty(&self, axis: Axis) -> Self {
        match axis {
            Axis::Row => {
                let keep: Vec<&String> = self
                    .row_items
                    .iter()
                    .zip(&self.rows)
                    .filter(|(_, row)| !row.is_empty())
                    .map(|(label, _)| label)
                    .collect();
                self.submatrix(Some(keep.as_slice()), None)
            }
            Axis::Col => {
                let used: HashSet<usize> = self.rows.iter().flat_map(|r| r.keys().copied()).collect();
                let keep: Vec<&String> = self
                    .col_items
                    .iter()
                    .enumerate()
                    .filter(|(c, _)| used.contains(c))
                    .map(|(_, label)| label)
                    .collect();
                self.submatrix(None, Some(keep.as_slice()))
            }
        }
    }

    /// Sum of each row, keyed by row label.
    pub fn row_sums(&self) -> Marginals {
        self.row_items
            .iter()
            .zip(&self.rows)
            .map(|(label, row)| (label.clone(), row.values().sum()))
            .collect()
    }

    /// Sum of each column, keyed by column label.
    pub fn col_sums(&self) -> Marginals {
        let mut sums = vec![0.0; self.col_items.len()];
        for row in &self.rows {
            for (c, v) in row {
                sums[*c] += v;
            }
        }
        self.col_items.iter().cloned().zip(sums).collect()
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        self.rows.iter().flat_map(|r| r.values()).sum()
    }

    /// Sum all rows into a single row called `label`.
    pub fn collapse_rows(&self, label: &str) -> Self {
        let mut summed: BTreeMap<usize, f64> = BTreeMap::new();
        for row in &self.rows {
            for (c, v) in row {
                *summed.entry(*c).or_insert(0.0) += v;
            }
        }
        summed.retain(|_, v| *v != 0.0);
        self.rebuilt(vec![label.to_string()], self.col_items.clone(), vec![summed])
    }

    /// Copy a one-row matrix once per label, naming each copy after its label.
    pub fn replicate_row<S: AsRef<str>>(&self, labels: &[S]) -> Result<Self> {
        if self.rows.len() != 1 {
            anyhow::bail!(
                "replicate_row needs a single-row matrix, got {} rows",
                self.rows.len()
            );
        }
        let row_items: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        build_index(&row_items, Axis::Row)?;
        let rows = vec![self.rows[0].clone(); row_items.len()];
        Ok(self.rebuilt(row_items, self.col_items.clone(), rows))
    }

    /// Stack `other` below `self`. Both must have the same columns in the same order.
    pub fn concatenate(&self, other: &Self) -> Result<Self> {
        if self.col_items != other.col_items {
            anyhow::bail!(
                "Cannot concatenate matrices with different columns ({} vs {})",
                self.col_items.len(),
                other.col_items.len()
            );
        }
        let mut row_items = self.row_items.clone();
        row_items.extend(other.row_items.iter().cloned());
        build_index(&row_items, Axis::Row)?;
        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().cloned());
        Ok(self.rebuilt(row_items, self.col_items.clone(), rows))
    }

    /// Union of both matrices' rows and columns. Cells present in both are summed.
    ///
    /// Labels from `self` come first, followed by labels only `other` has.
    pub fn merge(&self, other: &Self) -> Self {
        let mut row_items = self.row_items.clone();
        row_items.extend(
            other
                .row_items
                .iter()
                .filter(|r| !self.row_index.contains_key(*r))
                .cloned(),
        );
        let mut col_items = self.col_items.clone();
        col_items.extend(
            other
                .col_items
                .iter()
                .filter(|c| !self.col_index.contains_key(*c))
                .cloned(),
        );

        let mut rows = self.rows.clone();
        rows.resize(row_items.len(), BTreeMap::new());
        let mut merged = self.rebuilt(row_items, col_items, rows);

        for (r_other, row) in other.rows.iter().enumerate() {
            let r = merged.row_index[&other.row_items[r_other]];
            for (c_other, v) in row {
                let c = merged.col_index[&other.col_items[*c_other]];
                merged.add(r, c, *v);
            }
        }
        merged
    }

    /// Keep only cells whose value satisfies `keep`; the rest become zero.
    pub fn retain_values<F: Fn(f64) -> bool>(&self, keep: F) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().filter(|(_, v)| keep(**v)).map(|(c, v)| (*c, *v)).collect())
            .collect();
        self.rebuilt(self.row_items.clone(), self.col_items.clone(), rows)
    }

    /// Matrix product, matching this matrix's column labels to `other`'s row labels.
    ///
    /// Columns of `self` without a matching row in `other` contribute nothing.
    /// The result has `self`'s rows and `other`'s columns.
    pub fn matmul(&self, other: &Self) -> Self {
        let link: Vec<Option<usize>> = self
            .col_items
            .iter()
            .map(|c| other.row_position(c))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut acc: BTreeMap<usize, f64> = BTreeMap::new();
                for (c, w) in row {
                    if let Some(k) = link[*c] {
                        for (j, v) in &other.rows[k] {
                            *acc.entry(*j).or_insert(0.0) += w * v;
                        }
                    }
                }
                acc.retain(|_, v| *v != 0.0);
                acc
            })
            .collect();

        self.rebuilt(self.row_items.clone(), other.col_items.clone(), rows)
    }

    // Labels are already known to be unique here, so the indexes are rebuilt
    // without the duplicate check.
    fn rebuilt(
        &self,
        row_items: Vec<String>,
        col_items: Vec<String>,
        rows: Vec<BTreeMap<usize, f64>>,
    ) -> Self {
        let row_index = row_items.iter().cloned().enumerate().map(|(i, s)| (s, i)).collect();
        let col_index = col_items.iter().cloned().enumerate().map(|(i, s)| (s, i)).collect();
        Self {
            row_items,
            col_items,
            row_index,
            col_index,
            rows,
        }
    }
}

fn select_positions<S: AsRef<str>>(
    index: &HashMap<String, usize>,
    items: &[String],
    wanted: Option<&[S]>,
    axis: Axis,
) -> Vec<usize> {
    let Some(wanted) = wanted else {
        return (0..items.len()).collect();
    };
    let mut seen = HashSet::new();
    let mut positions = Vec::with_capacity(wanted.len());
    let mut missing = 0usize;
    for label in wanted {
        match index.get(label.as_ref()) {
            Some(&pos) => {
                if seen.insert(pos) {
                    positions.push(pos);
                }
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        debug!(?axis, missing, "Requested labels not in matrix, skipped");
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn small() -> TypeTokenMatrix {
        TypeTokenMatrix::from_triplets(
            labels(&["vernielt", "vernielen"]),
            labels(&["stad", "brand", "kerk"]),
            [(0, 0, 2.0), (0, 1, 1.0), (1, 0, 3.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let result = TypeTokenMatrix::new(labels(&["a", "a"]), labels(&["x"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_submatrix_keeps_requested_order() {
        let m = small();
        let sub = m.submatrix(
            Some(&["vernielen", "missing", "vernielt"][..]),
            Some(&["brand", "stad"][..]),
        );
        assert_eq!(sub.row_items(), &labels(&["vernielen", "vernielt"])[..]);
        assert_eq!(sub.col_items(), &labels(&["brand", "stad"])[..]);
        assert_eq!(sub.get("vernielt", "brand"), 1.0);
        assert_eq!(sub.get("vernielen", "stad"), 3.0);
        assert_eq!(sub.nnz(), 3);
    }

    #[test]
    fn test_drop_empty_columns() {
        let dropped = small().drop_empty(Axis::Col);
        assert_eq!(dropped.col_items(), &labels(&["stad", "brand"])[..]);
    }

    #[test]
    fn test_collapse_and_replicate() {
        let collapsed = small().collapse_rows("vernielen");
        assert_eq!(collapsed.shape(), (1, 3));
        assert_eq!(collapsed.get("vernielen", "stad"), 5.0);

        let replicated = collapsed.replicate_row(&["vernielt", "vernield"]).unwrap();
        assert_eq!(replicated.shape(), (2, 3));
        assert_eq!(replicated.get("vernield", "stad"), 5.0);
        assert_eq!(replicated.get("vernielt", "brand"), 1.0);
    }

    #[test]
    fn test_replicate_needs_single_row() {
        assert!(small().replicate_row(&["x"]).is_err());
    }

    #[test]
    fn test_concatenate_requires_same_columns() {
        let m = small();
        let other = TypeTokenMatrix::new(labels(&["x"]), labels(&["stad"])).unwrap();
        assert!(m.concatenate(&other).is_err());
        // Duplicate row labels are rejected too
        assert!(m.concatenate(&m).is_err());
    }

    #[test]
    fn test_merge_unions_labels() {
        let a = small();
        let b = TypeTokenMatrix::from_triplets(
            labels(&["vernietigd", "vernielt"]),
            labels(&["kerk", "vuur"]),
            [(0, 1, 4.0), (1, 0, 1.0)],
        )
        .unwrap();
        let merged = a.merge(&b);
        assert_eq!(merged.shape(), (3, 4));
        assert_eq!(merged.get("vernietigd", "vuur"), 4.0);
        assert_eq!(merged.get("vernielt", "kerk"), 1.0);
        assert_eq!(merged.get("vernielt", "stad"), 2.0);
    }

    #[test]
    fn test_row_and_col_sums() {
        let m = small();
        assert_eq!(m.row_sums()["vernielt"], 3.0);
        assert_eq!(m.col_sums()["stad"], 5.0);
        assert_eq!(m.col_sums()["kerk"], 0.0);
        assert_eq!(m.total(), 6.0);
    }

    #[test]
    fn test_retain_values_cutoff() {
        let kept = small().retain_values(|v| v > 2.0);
        assert_eq!(kept.nnz(), 1);
        assert_eq!(kept.get("vernielen", "stad"), 3.0);
    }

    #[test]
    fn test_matmul_matches_labels() {
        // tokens x context words
        let weights = TypeTokenMatrix::from_triplets(
            labels(&["t1"]),
            labels(&["stad", "brand"]),
            [(0, 0, 2.0), (0, 1, 1.0)],
        )
        .unwrap();
        // context words x second-order dimensions; "brand" missing on purpose
        let soc = TypeTokenMatrix::from_triplets(
            labels(&["stad"]),
            labels(&["d1", "d2"]),
            [(0, 0, 1.5), (0, 1, 0.5)],
        )
        .unwrap();
        let product = weights.matmul(&soc);
        assert_eq!(product.shape(), (1, 2));
        assert_eq!(product.get("t1", "d1"), 3.0);
        assert_eq!(product.get("t1", "d2"), 1.0);
    }
}
