// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle mesh model, generators, validation and analytics

mod analytics;
mod model;
mod section;
pub mod shapes;
mod validate;

pub use analytics::{analyze, signed_volume, surface_area, GeometryStats};
pub use model::{Face, Mesh};
pub use section::{chain_segments, Contour};
pub use validate::{edge_usage, validate, MeshReport};
