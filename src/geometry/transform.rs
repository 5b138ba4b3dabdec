// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Affine transformations `x -> A x + b` in any dimension

use super::{PointN, VecN};
use crate::error::{GeometryError, Result};
use crate::math::constants::{GEOMETRY_EPSILON, SINGULAR_TOLERANCE};
use crate::math::linalg;
use nalgebra::{DMatrix, Matrix3, Matrix4, Rotation2, Rotation3, SMatrix, Unit, Vector3};

/// Linear map plus translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform<const D: usize> {
    pub linear: SMatrix<f64, D, D>,
    pub translation: VecN<D>,
}

pub type Affine2 = AffineTransform<2>;
pub type Affine3 = AffineTransform<3>;

impl<const D: usize> AffineTransform<D> {
    pub fn identity() -> Self {
        Self {
            linear: SMatrix::identity(),
            translation: VecN::zeros(),
        }
    }

    pub fn from_parts(linear: SMatrix<f64, D, D>, translation: VecN<D>) -> Self {
        Self { linear, translation }
    }

    pub fn translation(offset: VecN<D>) -> Self {
        Self {
            linear: SMatrix::identity(),
            translation: offset,
        }
    }

    /// Per-axis scaling about the origin
    pub fn scaling(factors: VecN<D>) -> Self {
        Self {
            linear: SMatrix::from_diagonal(&factors),
            translation: VecN::zeros(),
        }
    }

    pub fn uniform_scaling(factor: f64) -> Self {
        Self::scaling(VecN::repeat(factor))
    }

    /// Composition `self ∘ first`: applies `first`, then `self` (matrix `self * first`)
    pub fn then(&self, first: &Self) -> Self {
        Self {
            linear: self.linear * first.linear,
            translation: self.linear * first.translation + self.translation,
        }
    }

    pub fn apply_point(&self, point: &PointN<D>) -> PointN<D> {
        PointN::from(self.linear * point.coords + self.translation)
    }

    /// Apply the linear part only (directions and displacements)
    pub fn apply_vector(&self, vector: &VecN<D>) -> VecN<D> {
        self.linear * vector
    }

    fn linear_dynamic(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(D, D, self.linear.as_slice())
    }

    pub fn determinant(&self) -> f64 {
        self.linear_dynamic().lu().determinant()
    }

    /// Inverse map; fails with `SingularTransform` when |det| < `SINGULAR_TOLERANCE`
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        if det.abs() < SINGULAR_TOLERANCE {
            return Err(GeometryError::SingularTransform { determinant: det });
        }
        let inverse = linalg::invert(&self.linear_dynamic())?;
        let linear = SMatrix::<f64, D, D>::from_column_slice(inverse.as_slice());
        Ok(Self {
            linear,
            translation: -(linear * self.translation),
        })
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.approx_eq(&Self::identity(), tolerance)
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.linear - other.linear).amax() <= tolerance
            && (self.translation - other.translation).amax() <= tolerance
    }
}

impl Default for AffineTransform<2> {
    fn default() -> Self {
        Self::identity()
    }
}

impl Default for AffineTransform<3> {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    /// Counter-clockwise rotation about the origin
    pub fn rotation(angle: f64) -> Self {
        Self::from_parts(Rotation2::new(angle).into_inner(), VecN::zeros())
    }
}

impl Affine3 {
    /// Right-handed rotation of `angle` radians about `axis` through the origin
    pub fn rotation(axis: &Vector3<f64>, angle: f64) -> Result<Self> {
        if axis.norm() < GEOMETRY_EPSILON {
            return Err(GeometryError::InvalidGeometry("rotation axis has zero length".into()));
        }
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle);
        Ok(Self::from_parts(rotation.into_inner(), Vector3::zeros()))
    }

    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.linear);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        matrix
    }

    /// Accepts only matrices whose last row is `[0, 0, 0, 1]`
    pub fn from_homogeneous(matrix: &Matrix4<f64>) -> Result<Self> {
        let last_row = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)] - 1.0];
        if last_row.iter().any(|v| v.abs() > GEOMETRY_EPSILON) {
            return Err(GeometryError::invalid_input("projective matrix is not affine"));
        }
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let translation: Vector3<f64> = matrix.fixed_view::<3, 1>(0, 3).into_owned();
        Ok(Self::from_parts(linear, translation))
    }
}
