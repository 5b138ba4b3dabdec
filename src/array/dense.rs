// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dense rank-parameterized array over contiguous row-major storage

use super::{check_index, row_major_strides, unravel, volume};
use crate::error::{GeometryError, Result};
use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// Dense array of fixed rank `R`
///
/// Storage is a single `Vec<T>` laid out row-major (the last axis is
/// contiguous). The array owns its data; slices and iterators borrow it.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T, const R: usize> {
    shape: [usize; R],
    strides: [usize; R],
    data: Vec<T>,
}

pub type Array1<T> = NdArray<T, 1>;
pub type Array2<T> = NdArray<T, 2>;
pub type Array3<T> = NdArray<T, 3>;
pub type Array4<T> = NdArray<T, 4>;

impl<T, const R: usize> NdArray<T, R> {
    /// Create an array with every cell set to `fill`
    pub fn new(shape: [usize; R], fill: T) -> Self
    where
        T: Clone,
    {
        Self {
            shape,
            strides: row_major_strides(&shape),
            data: vec![fill; volume(&shape)],
        }
    }

    /// Create a default-initialized (zero for numeric types) array
    pub fn zeros(shape: [usize; R]) -> Self
    where
        T: Clone + Default,
    {
        Self::new(shape, T::default())
    }

    /// Wrap existing row-major data; the length must equal the product of extents
    pub fn from_vec(shape: [usize; R], data: Vec<T>) -> Result<Self> {
        let expected = volume(&shape);
        if data.len() != expected {
            return Err(GeometryError::ShapeMismatch(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            shape,
            strides: row_major_strides(&shape),
            data,
        })
    }

    /// Build an array by evaluating `f` at every multi-index in row-major order
    pub fn from_fn(shape: [usize; R], mut f: impl FnMut([usize; R]) -> T) -> Self {
        let data = (0..volume(&shape)).map(|flat| f(unravel(&shape, flat))).collect();
        Self {
            shape,
            strides: row_major_strides(&shape),
            data,
        }
    }

    pub fn shape(&self) -> [usize; R] {
        self.shape
    }

    pub fn strides(&self) -> [usize; R] {
        self.strides
    }

    pub fn rank(&self) -> usize {
        R
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, index: &[usize; R]) -> usize {
        index
            .iter()
            .zip(self.strides.iter())
            .map(|(i, s)| i * s)
            .sum()
    }

    /// Flat storage offset for a checked multi-index
    pub fn flat_index(&self, index: [usize; R]) -> Result<usize> {
        check_index(&self.shape, &index)?;
        Ok(self.offset(&index))
    }

    /// Multi-index for a flat storage offset
    pub fn unravel(&self, flat: usize) -> Result<[usize; R]> {
        if flat >= self.data.len() {
            return Err(GeometryError::OutOfRange(format!(
                "flat offset {} outside {} elements",
                flat,
                self.data.len()
            )));
        }
        Ok(unravel(&self.shape, flat))
    }

    pub fn get(&self, index: [usize; R]) -> Option<&T> {
        check_index(&self.shape, &index).ok()?;
        self.data.get(self.offset(&index))
    }

    /// Bounds-checked element access
    pub fn at(&self, index: [usize; R]) -> Result<&T> {
        check_index(&self.shape, &index)?;
        Ok(&self.data[self.offset(&index)])
    }

    /// Bounds-checked mutable element access
    pub fn at_mut(&mut self, index: [usize; R]) -> Result<&mut T> {
        check_index(&self.shape, &index)?;
        let offset = self.offset(&index);
        Ok(&mut self.data[offset])
    }

    pub fn set(&mut self, index: [usize; R], value: T) -> Result<()> {
        *self.at_mut(index)? = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major storage; chunking it along the leading axis yields
    /// disjoint regions suitable for parallel writers
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Lazy `(index, value)` sequence in row-major order.
    ///
    /// The iterator is `Clone`, so a saved copy restarts from where it was taken.
    pub fn indexed_iter(&self) -> IndexedIter<'_, T, R> {
        IndexedIter {
            array: self,
            position: 0,
        }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.fill(value);
    }

    /// Reallocate to `new_shape`.
    ///
    /// Cells whose index is valid in both the old and the new shape keep their
    /// value; all other cells are `T::default()`.
    pub fn resize(&mut self, new_shape: [usize; R])
    where
        T: Clone + Default,
    {
        if new_shape == self.shape {
            return;
        }
        let mut resized = Self::zeros(new_shape);
        let overlap: [usize; R] = std::array::from_fn(|axis| self.shape[axis].min(new_shape[axis]));
        for flat in 0..volume(&overlap) {
            let index = unravel(&overlap, flat);
            let target = resized.offset(&index);
            resized.data[target] = self.data[self.offset(&index)].clone();
        }
        *self = resized;
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> NdArray<U, R> {
        NdArray {
            shape: self.shape,
            strides: self.strides,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two arrays of identical shape cell by cell
    pub fn zip_with<U, V>(
        &self,
        other: &NdArray<U, R>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> Result<NdArray<V, R>> {
        if self.shape != other.shape {
            return Err(GeometryError::ShapeMismatch(format!(
                "{:?} vs {:?}",
                self.shape, other.shape
            )));
        }
        Ok(NdArray {
            shape: self.shape,
            strides: self.strides,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }

    pub fn add(&self, other: &Self) -> Result<Self>
    where
        T: Clone + Add<Output = T>,
    {
        self.zip_with(other, |a, b| a.clone() + b.clone())
    }

    pub fn sub(&self, other: &Self) -> Result<Self>
    where
        T: Clone + Sub<Output = T>,
    {
        self.zip_with(other, |a, b| a.clone() - b.clone())
    }

    /// Element-wise product
    pub fn hadamard(&self, other: &Self) -> Result<Self>
    where
        T: Clone + Mul<Output = T>,
    {
        self.zip_with(other, |a, b| a.clone() * b.clone())
    }

    pub fn scale(&self, factor: T) -> Self
    where
        T: Clone + Mul<Output = T>,
    {
        self.map(|v| v.clone() * factor.clone())
    }
}

impl<T: Clone> NdArray<T, 3> {
    /// Extract the 2D plane at `index` along `axis`
    pub fn slice_axis(&self, axis: usize, index: usize) -> Result<NdArray<T, 2>> {
        if axis >= 3 {
            return Err(GeometryError::OutOfRange(format!("axis {} on a rank-3 array", axis)));
        }
        if index >= self.shape[axis] {
            return Err(GeometryError::OutOfRange(format!(
                "slice {} along axis {} (extent {})",
                index, axis, self.shape[axis]
            )));
        }
        let (a, b) = match axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        Ok(NdArray::from_fn([self.shape[a], self.shape[b]], |[i, j]| {
            let mut full = [0; 3];
            full[axis] = index;
            full[a] = i;
            full[b] = j;
            self.data[self.offset(&full)].clone()
        }))
    }
}

impl<T, const R: usize> Index<[usize; R]> for NdArray<T, R> {
    type Output = T;

    fn index(&self, index: [usize; R]) -> &T {
        debug_assert!(
            check_index(&self.shape, &index).is_ok(),
            "index {:?} outside shape {:?}",
            index,
            self.shape
        );
        &self.data[self.offset(&index)]
    }
}

impl<T, const R: usize> IndexMut<[usize; R]> for NdArray<T, R> {
    fn index_mut(&mut self, index: [usize; R]) -> &mut T {
        debug_assert!(
            check_index(&self.shape, &index).is_ok(),
            "index {:?} outside shape {:?}",
            index,
            self.shape
        );
        let offset = self.offset(&index);
        &mut self.data[offset]
    }
}

/// Row-major `(index, value)` iterator over an [`NdArray`]
#[derive(Debug)]
pub struct IndexedIter<'a, T, const R: usize> {
    array: &'a NdArray<T, R>,
    position: usize,
}

impl<T, const R: usize> Clone for IndexedIter<'_, T, R> {
    fn clone(&self) -> Self {
        Self {
            array: self.array,
            position: self.position,
        }
    }
}

impl<'a, T, const R: usize> Iterator for IndexedIter<'a, T, R> {
    type Item = ([usize; R], &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.array.data.get(self.position)?;
        let index = unravel(&self.array.shape, self.position);
        self.position += 1;
        Some((index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.data.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl<T, const R: usize> ExactSizeIterator for IndexedIter<'_, T, R> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_and_access() {
        let mut array: Array3<f64> = NdArray::zeros([2, 3, 4]);
        assert_eq!(array.len(), 24);
        assert_eq!(array.strides(), [12, 4, 1]);

        array.set([1, 2, 3], 5.0).unwrap();
        assert_eq!(*array.at([1, 2, 3]).unwrap(), 5.0);
        assert_eq!(array[[1, 2, 3]], 5.0);
        assert_eq!(array.as_slice()[23], 5.0);
    }

    #[test]
    fn test_out_of_range() {
        let array: Array2<i32> = NdArray::zeros([2, 2]);
        assert!(matches!(array.at([2, 0]), Err(GeometryError::OutOfRange(_))));
        assert!(array.get([0, 5]).is_none());
    }

    #[test]
    fn test_from_vec_shape_mismatch() {
        let result = Array2::from_vec([2, 2], vec![1, 2, 3]);
        assert!(matches!(result, Err(GeometryError::ShapeMismatch(_))));
    }

    #[test]
    fn test_arithmetic() {
        let a = Array1::from_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
        let b = Array1::from_vec([3], vec![0.5, 0.5, 0.5]).unwrap();

        assert_eq!(a.add(&b).unwrap().as_slice(), &[1.5, 2.5, 3.5]);
        assert_eq!(a.sub(&b).unwrap().as_slice(), &[0.5, 1.5, 2.5]);
        assert_eq!(a.scale(2.0).as_slice(), &[2.0, 4.0, 6.0]);

        let c = Array1::from_vec([2], vec![1.0, 1.0]).unwrap();
        assert!(matches!(a.add(&c), Err(GeometryError::ShapeMismatch(_))));
    }

    #[test]
    fn test_resize_preserves_overlap() {
        let mut array = Array2::from_fn([2, 3], |[i, j]| (i * 10 + j) as i32);
        array.resize([3, 2]);

        assert_eq!(array.shape(), [3, 2]);
        assert_eq!(array[[0, 0]], 0);
        assert_eq!(array[[0, 1]], 1);
        assert_eq!(array[[1, 1]], 11);
        assert_eq!(array[[2, 0]], 0);
    }

    #[test]
    fn test_indexed_iter_row_major_and_restartable() {
        let array = Array2::from_fn([2, 2], |[i, j]| i * 2 + j);
        let iter = array.indexed_iter();
        let saved = iter.clone();

        let collected: Vec<_> = iter.map(|(idx, v)| (idx, *v)).collect();
        assert_eq!(
            collected,
            vec![([0, 0], 0), ([0, 1], 1), ([1, 0], 2), ([1, 1], 3)]
        );
        assert_eq!(saved.count(), 4);
    }

    #[test]
    fn test_slice_axis() {
        let array = Array3::from_fn([2, 3, 4], |[i, j, k]| i * 100 + j * 10 + k);
        let plane = array.slice_axis(2, 1).unwrap();
        assert_eq!(plane.shape(), [2, 3]);
        assert_eq!(plane[[1, 2]], 121);
        assert!(array.slice_axis(0, 2).is_err());
    }

    #[test]
    fn test_rank_four() {
        let array: Array4<u8> = NdArray::new([2, 2, 2, 2], 1);
        assert_eq!(array.iter().map(|&v| v as usize).sum::<usize>(), 16);
        assert_eq!(array.unravel(15).unwrap(), [1, 1, 1, 1]);
    }
}
