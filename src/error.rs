// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error kinds surfaced by the engine
//!
//! Every variant carries a diagnostic message meant for logs, not for end users.
//! Presentation layers decide how to phrase failures.

use thiserror::Error;

/// Errors produced by containers, geometry, codecs and solvers
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Index outside a container's extents, or a value outside a valid domain
    #[error("index out of range: {0}")]
    OutOfRange(String),

    /// Operands disagree in shape or dimension
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Byte stream inconsistent with its declared layout
    #[error("malformed file: {0}")]
    MalformedFile(String),

    /// Degenerate geometry (zero-volume bounds, zero-length direction, ...)
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Affine map whose linear part cannot be inverted
    #[error("singular transform: determinant {determinant:e}")]
    SingularTransform { determinant: f64 },

    /// Caller-supplied parameters violate a precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An iterative solver did not converge within its budget
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// A cooperative cancellation signal was observed
    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeometryError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFile(message.into())
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, GeometryError>;
