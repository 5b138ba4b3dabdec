// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sparse coordinate array with an explicit default value

use super::{check_index, volume, NdArray};
use crate::error::{GeometryError, Result};
use std::collections::BTreeMap;
use std::ops::Add;

/// Coordinate-indexed array storing only explicitly written cells
///
/// Absent coordinates read as `default`. Writing a value equal to the default
/// still stores it; only [`SparseArray::compact`] evicts such entries, and it
/// never changes what `get` returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseArray<T, const R: usize> {
    shape: [usize; R],
    default: T,
    entries: BTreeMap<[usize; R], T>,
}

pub type SparseArray2<T> = SparseArray<T, 2>;
pub type SparseArray3<T> = SparseArray<T, 3>;

impl<T, const R: usize> SparseArray<T, R> {
    pub fn new(shape: [usize; R], default: T) -> Self {
        Self {
            shape,
            default,
            entries: BTreeMap::new(),
        }
    }

    /// Sparse array whose absent cells read as `T::default()`
    pub fn zeros(shape: [usize; R]) -> Self
    where
        T: Default,
    {
        Self::new(shape, T::default())
    }

    pub fn shape(&self) -> [usize; R] {
        self.shape
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Number of addressable cells
    pub fn len(&self) -> usize {
        volume(&self.shape)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of explicitly stored entries
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Fraction of cells that are not stored (1.0 for an untouched array)
    pub fn sparsity(&self) -> f64 {
        let total = self.len();
        if total == 0 {
            return 1.0;
        }
        1.0 - self.entries.len() as f64 / total as f64
    }

    pub fn get(&self, index: [usize; R]) -> Result<&T> {
        check_index(&self.shape, &index)?;
        Ok(self.entries.get(&index).unwrap_or(&self.default))
    }

    pub fn contains(&self, index: [usize; R]) -> bool {
        self.entries.contains_key(&index)
    }

    /// Store a value, returning the previously stored one
    pub fn set(&mut self, index: [usize; R], value: T) -> Result<Option<T>> {
        check_index(&self.shape, &index)?;
        Ok(self.entries.insert(index, value))
    }

    /// Mutable access to a cell, materializing it from the default if absent
    pub fn entry_mut(&mut self, index: [usize; R]) -> Result<&mut T>
    where
        T: Clone,
    {
        check_index(&self.shape, &index)?;
        let default = &self.default;
        Ok(self.entries.entry(index).or_insert_with(|| default.clone()))
    }

    pub fn remove(&mut self, index: [usize; R]) -> Result<Option<T>> {
        check_index(&self.shape, &index)?;
        Ok(self.entries.remove(&index))
    }

    /// Drop stored entries equal to the default; returns how many were evicted
    pub fn compact(&mut self) -> usize
    where
        T: PartialEq,
    {
        let before = self.entries.len();
        let default = &self.default;
        self.entries.retain(|_, value| value != default);
        before - self.entries.len()
    }

    /// Stored entries in row-major coordinate order
    pub fn iter_stored(&self) -> impl Iterator<Item = (&[usize; R], &T)> + '_ {
        self.entries.iter()
    }

    pub fn to_dense(&self) -> NdArray<T, R>
    where
        T: Clone,
    {
        let mut dense = NdArray::new(self.shape, self.default.clone());
        for (index, value) in &self.entries {
            dense[*index] = value.clone();
        }
        dense
    }

    /// Build from a dense array, storing only cells that differ from `default`
    pub fn from_dense(dense: &NdArray<T, R>, default: T) -> Self
    where
        T: Clone + PartialEq,
    {
        let entries = dense
            .indexed_iter()
            .filter(|(_, value)| **value != default)
            .map(|(index, value)| (index, value.clone()))
            .collect();
        Self {
            shape: dense.shape(),
            default,
            entries,
        }
    }

    /// Cell-wise sum; the result's default is the sum of both defaults
    pub fn add(&self, other: &Self) -> Result<Self>
    where
        T: Clone + Add<Output = T>,
    {
        if self.shape != other.shape {
            return Err(GeometryError::ShapeMismatch(format!(
                "{:?} vs {:?}",
                self.shape, other.shape
            )));
        }
        let mut entries = BTreeMap::new();
        for (index, value) in &self.entries {
            let rhs = other.entries.get(index).unwrap_or(&other.default);
            entries.insert(*index, value.clone() + rhs.clone());
        }
        for (index, value) in &other.entries {
            if !self.entries.contains_key(index) {
                entries.insert(*index, self.default.clone() + value.clone());
            }
        }
        Ok(Self {
            shape: self.shape,
            default: self.default.clone() + other.default.clone(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_reads_default() {
        let mut array: SparseArray3<f64> = SparseArray::zeros([10, 10, 10]);
        assert_eq!(*array.get([3, 4, 5]).unwrap(), 0.0);

        array.set([3, 4, 5], 2.5).unwrap();
        assert_eq!(*array.get([3, 4, 5]).unwrap(), 2.5);
        assert_eq!(array.stored_len(), 1);
        assert!(array.get([10, 0, 0]).is_err());
    }

    #[test]
    fn test_compact_is_explicit_and_preserves_reads() {
        let mut array: SparseArray2<i32> = SparseArray::new([4, 4], -1);
        array.set([0, 0], -1).unwrap();
        array.set([1, 1], 7).unwrap();
        assert_eq!(array.stored_len(), 2);

        let evicted = array.compact();
        assert_eq!(evicted, 1);
        assert_eq!(*array.get([0, 0]).unwrap(), -1);
        assert_eq!(*array.get([1, 1]).unwrap(), 7);
    }

    #[test]
    fn test_sparsity() {
        let mut array: SparseArray2<u8> = SparseArray::zeros([2, 5]);
        assert_eq!(array.sparsity(), 1.0);
        array.set([0, 0], 1).unwrap();
        array.set([1, 4], 1).unwrap();
        assert!((array.sparsity() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_dense_conversion() {
        let dense = NdArray::from_fn([3, 3], |[i, j]| if i == j { 1 } else { 0 });
        let sparse = SparseArray::from_dense(&dense, 0);
        assert_eq!(sparse.stored_len(), 3);
        assert_eq!(sparse.to_dense(), dense);
    }

    #[test]
    fn test_add_merges_entries() {
        let mut a: SparseArray2<i32> = SparseArray::zeros([3, 3]);
        let mut b: SparseArray2<i32> = SparseArray::zeros([3, 3]);
        a.set([0, 0], 1).unwrap();
        b.set([0, 0], 2).unwrap();
        b.set([2, 2], 5).unwrap();

        let sum = a.add(&b).unwrap();
        assert_eq!(*sum.get([0, 0]).unwrap(), 3);
        assert_eq!(*sum.get([2, 2]).unwrap(), 5);
        assert_eq!(*sum.get([1, 1]).unwrap(), 0);

        let c: SparseArray2<i32> = SparseArray::zeros([2, 3]);
        assert!(matches!(a.add(&c), Err(GeometryError::ShapeMismatch(_))));
    }

    #[test]
    fn test_entry_mut_accumulates() {
        let mut counts: SparseArray3<u32> = SparseArray::zeros([4, 4, 4]);
        *counts.entry_mut([1, 2, 3]).unwrap() += 1;
        *counts.entry_mut([1, 2, 3]).unwrap() += 1;
        assert_eq!(*counts.get([1, 2, 3]).unwrap(), 2);
    }
}
