//! The ordered row container shared by constraint and generator systems.

use crate::row::{LinearRow, RowKind, Topology};
use hedra_num::Coefficient;
use itertools::{EitherOrBoth, Itertools};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A typed view over a [`LinearRow`]: constraint systems store
/// [`crate::Constraint`]s, generator systems store [`crate::Generator`]s,
/// while the container and the conversion algorithms only see the rows.
pub trait SystemRow: Clone {
    fn from_row(row: LinearRow) -> Self;
    fn row(&self) -> &LinearRow;
    fn row_mut(&mut self) -> &mut LinearRow;
    fn into_row(self) -> LinearRow;
}

/// An ordered collection of rows of one topology, split into a non-pending
/// prefix `[0, first_pending)` and a pending suffix.
///
/// The `sorted` flag records whether the non-pending prefix is in strictly
/// ascending canonical order; pending rows are never covered by it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinearSystem<R: SystemRow> {
    rows: Vec<R>,
    topology: Topology,
    num_columns: usize,
    first_pending: usize,
    sorted: bool,
}

impl<R: SystemRow> LinearSystem<R> {
    /// An empty system with no columns.
    pub fn new(topology: Topology) -> Self {
        Self::with_columns(topology, 0)
    }

    /// An empty system with the given column count.
    pub fn with_columns(topology: Topology, num_columns: usize) -> Self {
        Self {
            rows: Vec::new(),
            topology,
            num_columns,
            first_pending: 0,
            sorted: true,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_necessarily_closed(&self) -> bool {
        self.topology == Topology::Closed
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_no_rows(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Columns minus the inhomogeneous and epsilon columns, or zero for a
    /// system with no columns.
    pub fn space_dimension(&self) -> usize {
        self.num_columns
            .saturating_sub(self.topology.extra_columns())
    }

    pub fn first_pending_row(&self) -> usize {
        self.first_pending
    }

    pub fn num_pending_rows(&self) -> usize {
        self.rows.len() - self.first_pending
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn set_sorted(&mut self, sorted: bool) {
        self.sorted = sorted;
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &R {
        &self.rows[i]
    }

    /// Mutable row access; the caller is responsible for clearing the
    /// sortedness flag when the edit can disturb the order.
    pub fn row_mut(&mut self, i: usize) -> &mut R {
        &mut self.rows[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    /// The non-pending prefix.
    pub fn non_pending(&self) -> &[R] {
        &self.rows[..self.first_pending]
    }

    /// Appends a row to the non-pending segment, before any pending rows.
    pub fn add_row(&mut self, r: R) {
        debug_assert_eq!(r.row().size(), self.num_columns);
        debug_assert_eq!(r.row().topology(), self.topology);
        self.rows.insert(self.first_pending, r);
        self.first_pending += 1;
        self.sorted = false;
    }

    /// Appends a row to the pending segment.
    pub fn add_pending_row(&mut self, r: R) {
        debug_assert_eq!(r.row().size(), self.num_columns);
        debug_assert_eq!(r.row().topology(), self.topology);
        self.rows.push(r);
    }

    /// Appends `k` zero rows of the given kind to the non-pending segment.
    pub fn add_zero_rows(&mut self, k: usize, kind: RowKind) {
        for _ in 0..k {
            self.add_row(R::from_row(LinearRow::zero(
                self.num_columns,
                kind,
                self.topology,
            )));
        }
    }

    /// Appends `k` zero rows and `c` zero columns in one reshape.
    pub fn add_zero_rows_and_columns(&mut self, k: usize, c: usize, kind: RowKind) {
        self.add_zero_columns(c);
        self.add_zero_rows(k, kind);
    }

    /// Appends `c` zero columns at the end of every row.
    pub fn add_zero_columns(&mut self, c: usize) {
        self.num_columns += c;
        for r in &mut self.rows {
            r.row_mut().resize(self.num_columns);
        }
    }

    /// Inserts `c` zero columns at position `at` in every row.
    pub fn insert_zero_columns(&mut self, at: usize, c: usize) {
        self.num_columns += c;
        for r in &mut self.rows {
            for _ in 0..c {
                r.row_mut().insert_zero_column(at);
            }
        }
        self.sorted = false;
    }

    /// Drops the last `c` columns of every row.
    pub fn remove_trailing_columns(&mut self, c: usize) {
        debug_assert!(c <= self.num_columns);
        self.num_columns -= c;
        for r in &mut self.rows {
            r.row_mut().resize(self.num_columns);
        }
        self.sorted = false;
    }

    /// Removes the column at `index` from every row.
    pub fn remove_column(&mut self, index: usize) {
        debug_assert!(index < self.num_columns);
        self.num_columns -= 1;
        for r in &mut self.rows {
            r.row_mut().remove_column(index);
        }
        self.sorted = false;
    }

    pub fn swap_columns(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        for r in &mut self.rows {
            r.row_mut().swap_columns(i, j);
        }
        self.sorted = false;
    }

    /// Applies the permutation cycle `c[0] -> c[1] -> ... -> c[0]` to the
    /// columns of every row.
    pub fn permute_columns(&mut self, cycle: &[usize]) {
        if cycle.len() < 2 {
            return;
        }
        for r in &mut self.rows {
            let row = r.row_mut();
            let last = row.as_slice()[cycle[cycle.len() - 1]].clone();
            for w in (1..cycle.len()).rev() {
                let prev = row.as_slice()[cycle[w - 1]].clone();
                row[cycle[w]] = prev;
            }
            row[cycle[0]] = last;
        }
        self.sorted = false;
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
        if i != j {
            self.sorted = false;
        }
    }

    /// Removes row `i`, preserving order and the pending split.
    pub fn remove_row(&mut self, i: usize) -> R {
        if i < self.first_pending {
            self.first_pending -= 1;
        }
        self.rows.remove(i)
    }

    /// Truncates the system to its first `k` rows.
    pub fn erase_to_end(&mut self, k: usize) {
        self.rows.truncate(k);
        self.first_pending = self.first_pending.min(k);
    }

    /// Drops every row, keeping the column count.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
        self.first_pending = 0;
        self.sorted = true;
    }

    /// Promotes all pending rows to non-pending; sortedness is lost.
    pub fn unset_pending_rows(&mut self) {
        if self.first_pending != self.rows.len() {
            self.first_pending = self.rows.len();
            self.sorted = false;
        }
    }

    /// Sorts the non-pending prefix and removes duplicate rows in it.
    pub fn sort_rows(&mut self) {
        let pending = self.rows.split_off(self.first_pending);
        self.rows.sort_by(|a, b| a.row().compare(b.row()));
        self.rows
            .dedup_by(|a, b| a.row().compare(b.row()) == Ordering::Equal);
        self.first_pending = self.rows.len();
        self.rows.extend(pending);
        self.sorted = true;
    }

    /// Sorts the pending suffix and removes duplicates, both among the
    /// pending rows themselves and against the non-pending prefix. All
    /// pending rows may disappear this way.
    pub fn sort_pending_and_remove_duplicates(&mut self) {
        let mut pending = self.rows.split_off(self.first_pending);
        pending.sort_by(|a, b| a.row().compare(b.row()));
        pending.dedup_by(|a, b| a.row().compare(b.row()) == Ordering::Equal);
        let prefix = &self.rows;
        pending.retain(|p| {
            !prefix
                .iter()
                .any(|r| r.row().compare(p.row()) == Ordering::Equal)
        });
        self.rows.extend(pending);
    }

    /// Merges another sorted, pending-free system into this one, which
    /// must also be sorted and pending-free; the result is sorted and
    /// duplicate-free.
    pub fn merge_rows_assign(&mut self, other: &Self) {
        debug_assert!(self.sorted && other.sorted);
        debug_assert_eq!(self.num_pending_rows(), 0);
        debug_assert_eq!(other.num_pending_rows(), 0);
        let mine = std::mem::take(&mut self.rows);
        self.rows = mine
            .into_iter()
            .merge_join_by(other.rows.iter(), |a, b| a.row().compare(b.row()))
            .map(|merged| match merged {
                EitherOrBoth::Left(r) | EitherOrBoth::Both(r, _) => r,
                EitherOrBoth::Right(r) => r.clone(),
            })
            .collect();
        self.first_pending = self.rows.len();
        self.sorted = true;
    }

    /// Appends every row of `other` (pending rows included) to this
    /// system's pending segment.
    pub fn add_pending_rows(&mut self, other: &Self) {
        debug_assert_eq!(self.num_columns, other.num_columns);
        for r in &other.rows {
            self.rows.push(r.clone());
        }
    }

    /// Appends every row of `other` to the non-pending segment.
    pub fn add_rows(&mut self, other: &Self) {
        debug_assert_eq!(self.num_columns, other.num_columns);
        for r in &other.rows {
            self.add_row(r.clone());
        }
    }

    /// Strong-normalizes every row.
    pub fn strong_normalize(&mut self) {
        for r in &mut self.rows {
            r.row_mut().strong_normalize();
        }
        self.sorted = false;
    }

    /// Applies `x[v] := (expr . x) / denominator` to every row, where the
    /// rows are generator-like (column 0 scales the inhomogeneous part).
    /// The denominator must be positive.
    pub fn affine_image_col(&mut self, v: usize, expr: &[Coefficient], denominator: &Coefficient) {
        debug_assert!(*denominator > Coefficient::zero());
        for r in &mut self.rows {
            let row = r.row_mut();
            let mut new_v = Coefficient::zero();
            for (j, e) in expr.iter().enumerate() {
                new_v += e * &row.as_slice()[j];
            }
            for j in 0..row.size() {
                if j != v {
                    row[j] *= denominator;
                }
            }
            row[v] = new_v;
            row.strong_normalize();
        }
        self.sorted = false;
    }

    /// Substitutes `x[v] := (expr . x) / denominator` into every row, where
    /// the rows are constraint-like. The denominator must be positive.
    pub fn affine_preimage_col(
        &mut self,
        v: usize,
        expr: &[Coefficient],
        denominator: &Coefficient,
    ) {
        debug_assert!(*denominator > Coefficient::zero());
        for r in &mut self.rows {
            let row = r.row_mut();
            let old_v = row.as_slice()[v].clone();
            for j in 0..row.size() {
                let e_j = expr.get(j).cloned().unwrap_or_else(Coefficient::zero);
                if j == v {
                    row[j] = e_j * &old_v;
                } else {
                    row[j] *= denominator;
                    row[j] += e_j * &old_v;
                }
            }
            row.strong_normalize();
        }
        self.sorted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SystemRow for LinearRow {
        fn from_row(row: LinearRow) -> Self {
            row
        }
        fn row(&self) -> &LinearRow {
            self
        }
        fn row_mut(&mut self) -> &mut LinearRow {
            self
        }
        fn into_row(self) -> LinearRow {
            self
        }
    }

    fn row(cols: &[i64]) -> LinearRow {
        LinearRow::from_columns(
            cols.iter().map(|&c| Coefficient::from(c)).collect(),
            RowKind::RayOrPointOrInequality,
            Topology::Closed,
        )
    }

    fn sys(rows: &[&[i64]]) -> LinearSystem<LinearRow> {
        let mut s = LinearSystem::with_columns(Topology::Closed, rows[0].len());
        for r in rows {
            s.add_row(row(r));
        }
        s
    }

    #[test]
    fn pending_split_bookkeeping() {
        let mut s = sys(&[&[1, 0]]);
        s.add_pending_row(row(&[0, 1]));
        assert_eq!(s.num_rows(), 2);
        assert_eq!(s.num_pending_rows(), 1);
        s.unset_pending_rows();
        assert_eq!(s.num_pending_rows(), 0);
        assert!(!s.is_sorted());
    }

    #[test]
    fn sorting_removes_duplicates() {
        let mut s = sys(&[&[1, 0], &[0, 1], &[1, 0]]);
        s.sort_rows();
        assert_eq!(s.num_rows(), 2);
        assert!(s.is_sorted());
        assert!(s.row(0).compare(s.row(1).row()) == Ordering::Less);
    }

    #[test]
    fn pending_duplicates_vanish() {
        let mut s = sys(&[&[1, 0]]);
        s.add_pending_row(row(&[1, 0]));
        s.add_pending_row(row(&[0, 1]));
        s.add_pending_row(row(&[0, 1]));
        s.sort_pending_and_remove_duplicates();
        assert_eq!(s.num_pending_rows(), 1);
    }

    #[test]
    fn merge_is_sorted_and_duplicate_free() {
        let mut a = sys(&[&[0, 1], &[2, 1]]);
        a.sort_rows();
        let mut b = sys(&[&[1, 1], &[2, 1]]);
        b.sort_rows();
        a.merge_rows_assign(&b);
        assert_eq!(a.num_rows(), 3);
        assert!(a.is_sorted());
    }

    #[test]
    fn column_permutation_cycles() {
        let mut s = sys(&[&[1, 2, 3]]);
        s.permute_columns(&[0, 1, 2]);
        assert_eq!(s.row(0).as_slice(), row(&[3, 1, 2]).as_slice());
    }

    #[test]
    fn affine_image_on_generator_rows() {
        // The point (1, 1) under x1 := x0 + x1 becomes (1, 2).
        let mut s = sys(&[&[1, 1, 1]]);
        let expr = [
            Coefficient::from(0),
            Coefficient::from(1),
            Coefficient::from(1),
        ];
        s.affine_image_col(2, &expr, &Coefficient::from(1));
        assert_eq!(s.row(0).as_slice(), row(&[1, 1, 2]).as_slice());
    }

    #[test]
    fn affine_preimage_on_constraint_rows() {
        // x1 >= 2, substituting x1 := x0 + x1, becomes x0 + x1 >= 2.
        let mut s = sys(&[&[-2, 0, 1]]);
        let expr = [
            Coefficient::from(0),
            Coefficient::from(1),
            Coefficient::from(1),
        ];
        s.affine_preimage_col(2, &expr, &Coefficient::from(1));
        assert_eq!(s.row(0).as_slice(), row(&[-2, 1, 1]).as_slice());
    }
}
