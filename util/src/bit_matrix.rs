use crate::bit_row::BitRow;
use serde::{Deserialize, Serialize};

/// A matrix of bits: a vector of [`BitRow`]s plus an explicit column count.
///
/// Rows may be appended, removed and permuted independently; the column
/// count only bounds what [`BitMatrix::transpose`] and printing look at,
/// since the underlying rows grow on demand.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BitMatrix {
    rows: Vec<BitRow>,
    num_columns: usize,
}

impl BitMatrix {
    /// An empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero matrix with the given shape.
    pub fn zeros(num_rows: usize, num_columns: usize) -> Self {
        Self {
            rows: vec![BitRow::new(); num_rows],
            num_columns,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn row(&self, i: usize) -> &BitRow {
        &self.rows[i]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut BitRow {
        &mut self.rows[i]
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        self.rows[i].get(j)
    }

    pub fn set(&mut self, i: usize, j: usize) {
        self.rows[i].set(j);
        if j >= self.num_columns {
            self.num_columns = j + 1;
        }
    }

    /// Appends a row; the column count is unchanged.
    pub fn push_row(&mut self, row: BitRow) {
        self.rows.push(row);
    }

    /// Removes row `i`, preserving the order of the remaining rows.
    pub fn remove_row(&mut self, i: usize) -> BitRow {
        self.rows.remove(i)
    }

    /// Removes row `i` by swapping the last row into its place.
    pub fn swap_remove_row(&mut self, i: usize) -> BitRow {
        self.rows.swap_remove(i)
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// Drops all rows and resets the column count.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.num_columns = 0;
    }

    /// Grows or shrinks to the given shape; bits in surviving positions are
    /// preserved.
    pub fn resize(&mut self, num_rows: usize, num_columns: usize) {
        self.rows.resize_with(num_rows, BitRow::new);
        if num_columns < self.num_columns {
            for row in &mut self.rows {
                row.clear_from(num_columns);
            }
        }
        self.num_columns = num_columns;
    }

    /// Records that columns now extend to `num_columns`.
    pub fn set_num_columns(&mut self, num_columns: usize) {
        debug_assert!(num_columns >= self.num_columns);
        self.num_columns = num_columns;
    }

    /// The transposed matrix: bit `(j, i)` of the result equals bit
    /// `(i, j)` of `self`.
    pub fn transpose(&self) -> BitMatrix {
        let mut t = BitMatrix::zeros(self.num_columns, self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            for j in 0..self.num_columns {
                if row.get(j) {
                    t.rows[j].set(i);
                }
            }
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_round_trips() {
        let mut m = BitMatrix::zeros(2, 3);
        m.set(0, 1);
        m.set(1, 0);
        m.set(1, 2);
        let t = m.transpose();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.num_columns(), 2);
        assert!(t.get(1, 0) && t.get(0, 1) && t.get(2, 1));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn row_removal_preserves_order() {
        let mut m = BitMatrix::zeros(3, 2);
        m.set(0, 0);
        m.set(1, 1);
        m.set(2, 0);
        m.remove_row(1);
        assert_eq!(m.num_rows(), 2);
        assert!(m.get(0, 0) && m.get(1, 0));
        assert!(!m.get(1, 1));
    }

    #[test]
    fn resize_truncates_columns() {
        let mut m = BitMatrix::zeros(1, 4);
        m.set(0, 3);
        m.resize(2, 2);
        assert!(!m.get(0, 3));
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.num_columns(), 2);
    }
}
