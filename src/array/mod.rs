// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Numeric containers - dense N-dimensional arrays and sparse coordinate arrays

mod dense;
mod sparse;

pub use dense::{Array1, Array2, Array3, Array4, IndexedIter, NdArray};
pub use sparse::{SparseArray, SparseArray2, SparseArray3};

use crate::error::{GeometryError, Result};

/// Validate a multi-index against a shape
pub(crate) fn check_index<const R: usize>(shape: &[usize; R], index: &[usize; R]) -> Result<()> {
    for axis in 0..R {
        if index[axis] >= shape[axis] {
            return Err(GeometryError::OutOfRange(format!(
                "index {:?} outside shape {:?} (axis {})",
                index, shape, axis
            )));
        }
    }
    Ok(())
}

/// Total number of cells for a shape
pub(crate) fn volume<const R: usize>(shape: &[usize; R]) -> usize {
    shape.iter().product()
}

/// Row-major strides for a shape (last axis is contiguous)
pub(crate) fn row_major_strides<const R: usize>(shape: &[usize; R]) -> [usize; R] {
    let mut strides = [0; R];
    let mut acc = 1;
    for axis in (0..R).rev() {
        strides[axis] = acc;
        acc *= shape[axis];
    }
    strides
}

/// Convert a row-major flat offset back into a multi-index
pub(crate) fn unravel<const R: usize>(shape: &[usize; R], mut flat: usize) -> [usize; R] {
    let mut index = [0; R];
    for axis in (0..R).rev() {
        let extent = shape[axis].max(1);
        index[axis] = flat % extent;
        flat /= extent;
    }
    index
}
