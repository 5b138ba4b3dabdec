// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration
//!
//! Loaded from `shapekit.toml` when present, then overridden from the
//! environment (`SHAPEKIT_RESOLUTION`, `SHAPEKIT_MAX_DEGREE`, `SHAPEKIT_SEED`,
//! `SHAPEKIT_MAX_ITERATIONS`).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cluster::{self, Init, KMeans, SpectralClustering};
use crate::descriptor::MAX_DEGREE;
use crate::raster::RasterOptions;
use crate::random::DEFAULT_SEED;
use crate::stats::Metric;

/// File picked up by [`EngineConfig::load`] from the working directory
pub const CONFIG_FILE: &str = "shapekit.toml";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub raster: RasterOptions,
    pub descriptor: DescriptorConfig,
    pub kmeans: KMeansConfig,
    pub spectral: SpectralConfig,
}

/// Spherical-harmonic descriptor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Highest harmonic degree
    pub max_degree: usize,
    /// Scale energies to unit total before comparing shapes
    pub normalize: bool,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            max_degree: 8,
            normalize: false,
        }
    }
}

/// Seeding strategies expressible in a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitKind {
    RandomSample,
    #[default]
    PlusPlus,
}

impl From<InitKind> for Init {
    fn from(kind: InitKind) -> Self {
        match kind {
            InitKind::RandomSample => Init::RandomSample,
            InitKind::PlusPlus => Init::PlusPlus,
        }
    }
}

/// K-Means settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub init: InitKind,
    pub metric: Metric,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// MT19937 seed for every stochastic step
    pub seed: u32,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            init: InitKind::default(),
            metric: Metric::default(),
            max_iterations: cluster::DEFAULT_MAX_ITERATIONS,
            tolerance: cluster::DEFAULT_TOLERANCE,
            seed: DEFAULT_SEED,
        }
    }
}

impl KMeansConfig {
    pub fn build(&self, k: usize) -> KMeans {
        KMeans::new(k)
            .with_init(self.init.into())
            .with_metric(self.metric)
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
    }
}

/// Spectral clustering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Iteration budget of the Laplacian eigen-solve
    pub eigen_max_iterations: usize,
    /// Gaussian kernel width for point and mesh affinities
    pub sigma: f64,
    /// Nearest neighbours per point; 0 builds a dense affinity
    pub neighbours: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            eigen_max_iterations: cluster::DEFAULT_EIGEN_ITERATIONS,
            sigma: 1.0,
            neighbours: 0,
        }
    }
}

impl SpectralConfig {
    /// Spectral clustering whose embedding is grouped with `kmeans` settings
    pub fn build(&self, k: usize, kmeans: &KMeansConfig) -> SpectralClustering {
        SpectralClustering::from_kmeans(kmeans.build(k)).with_eigen_max_iterations(self.eigen_max_iterations)
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `shapekit.toml` if present, with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SHAPEKIT_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}: {:?}", key, value))
        }

        if let Some(value) = lookup("SHAPEKIT_RESOLUTION") {
            self.raster.resolution = parse("SHAPEKIT_RESOLUTION", &value)?;
        }
        if let Some(value) = lookup("SHAPEKIT_MAX_DEGREE") {
            self.descriptor.max_degree = parse("SHAPEKIT_MAX_DEGREE", &value)?;
        }
        if let Some(value) = lookup("SHAPEKIT_SEED") {
            self.kmeans.seed = parse("SHAPEKIT_SEED", &value)?;
        }
        if let Some(value) = lookup("SHAPEKIT_MAX_ITERATIONS") {
            self.kmeans.max_iterations = parse("SHAPEKIT_MAX_ITERATIONS", &value)?;
        }
        Ok(())
    }

    /// Reject settings every later call would fail on
    pub fn validate(&self) -> Result<()> {
        if self.raster.resolution == 0 {
            bail!("raster.resolution must be > 0");
        }
        if self.descriptor.max_degree > MAX_DEGREE {
            bail!("descriptor.max_degree must be <= {}", MAX_DEGREE);
        }
        if self.kmeans.max_iterations == 0 {
            bail!("kmeans.max_iterations must be > 0");
        }
        if !(self.kmeans.tolerance >= 0.0) {
            bail!("kmeans.tolerance must be >= 0");
        }
        if !(self.spectral.sigma > 0.0) {
            bail!("spectral.sigma must be > 0");
        }
        if self.spectral.eigen_max_iterations == 0 {
            bail!("spectral.eigen_max_iterations must be > 0");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
