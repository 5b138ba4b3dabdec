// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lloyd's K-Means with k-means++ seeding
//!
//! 1. Seed `k` centroids (random sample, k-means++ or caller supplied)
//! 2. Assign each point to its nearest centroid, ties to the lowest index
//! 3. Move each centroid to the mean of its members
//! 4. Repeat until assignments stop changing, centroids move less than the
//!    tolerance, or the iteration budget runs out
//!
//! Running out of iterations is reported through `converged`, not as an error.

use super::cancel::{self, CancelToken};
use crate::error::{GeometryError, Result};
use crate::stats::{squared_euclidean, Distance, Metric};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

const CHUNK: usize = 1024;

/// How the first centroids are chosen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Init {
    /// `k` distinct points drawn uniformly
    RandomSample,
    /// D² weighting (Arthur & Vassilvitskii)
    #[default]
    PlusPlus,
    /// Caller-supplied centroids; exactly `k` of the points' dimension
    Seeds(Vec<Vec<f64>>),
}

/// K-Means parameters
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    init: Init,
    metric: Metric,
    max_iterations: usize,
    tolerance: f64,
    cancel: Option<CancelToken>,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            init: Init::default(),
            metric: Metric::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            cancel: None,
        }
    }

    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Metric used for assignment and seeding; centroids are always means
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Largest centroid displacement still counted as converged
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Cluster `points`, drawing every random choice from `rng`
    pub fn fit<P, R>(&self, points: &[P], rng: &mut R) -> Result<KMeansResult>
    where
        P: AsRef<[f64]> + Sync,
        R: Rng + ?Sized,
    {
        let dim = point_dimension(points)?;
        let n = points.len();
        if self.k == 0 || self.k > n {
            return Err(GeometryError::invalid_input(format!(
                "k = {} must lie in 1..={}",
                self.k, n
            )));
        }
        if self.max_iterations == 0 {
            return Err(GeometryError::invalid_input("max_iterations must be > 0"));
        }
        if !(self.tolerance >= 0.0) {
            return Err(GeometryError::invalid_input("tolerance must be a non-negative number"));
        }
        cancel::check(self.cancel.as_ref())?;

        let mut centroids = self.initial_centroids(points, dim, rng)?;
        let mut labels = assign(points, &centroids, self.metric);
        fill_empty_clusters(points, &mut labels, &mut centroids, self.metric);
        let mut inertia = inertia_of(points, &labels, &centroids);
        let mut inertia_history = vec![inertia];
        let mut iterations = 0;
        let mut converged = false;

        for iteration in 1..=self.max_iterations {
            cancel::check(self.cancel.as_ref())?;

            let updated = self.update(points, &labels, &centroids, dim);
            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_euclidean(old, new).sqrt())
                .fold(0.0, f64::max);
            centroids = updated;

            let mut next = assign(points, &centroids, self.metric);
            let reseeded = fill_empty_clusters(points, &mut next, &mut centroids, self.metric);
            let changed = next != labels;
            labels = next;
            inertia = inertia_of(points, &labels, &centroids);
            inertia_history.push(inertia);
            iterations = iteration;
            trace!(iteration, inertia, shift, reseeded, "k-means iteration");

            if !changed || (shift <= self.tolerance && !reseeded) {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(k = self.k, n, iterations, inertia, "k-means converged");
        } else {
            warn!(k = self.k, n, iterations, inertia, "k-means stopped before converging");
        }

        Ok(KMeansResult {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
            inertia_history,
            metric: self.metric,
        })
    }

    fn initial_centroids<P, R>(&self, points: &[P], dim: usize, rng: &mut R) -> Result<Vec<Vec<f64>>>
    where
        P: AsRef<[f64]>,
        R: Rng + ?Sized,
    {
        match &self.init {
            Init::RandomSample => Ok(rand::seq::index::sample(rng, points.len(), self.k)
                .into_iter()
                .map(|i| points[i].as_ref().to_vec())
                .collect()),
            Init::PlusPlus => Ok(plus_plus(points, self.k, self.metric, rng)),
            Init::Seeds(seeds) => {
                if seeds.len() != self.k {
                    return Err(GeometryError::invalid_input(format!(
                        "{} seeds supplied for k = {}",
                        seeds.len(),
                        self.k
                    )));
                }
                if let Some(bad) = seeds.iter().find(|s| s.len() != dim) {
                    return Err(GeometryError::ShapeMismatch(format!(
                        "seed of dimension {} for points of dimension {}",
                        bad.len(),
                        dim
                    )));
                }
                Ok(seeds.clone())
            }
        }
    }

    /// Per-worker partial sums reduced into new means. A cluster without
    /// members keeps its old centroid.
    fn update<P>(&self, points: &[P], labels: &[usize], previous: &[Vec<f64>], dim: usize) -> Vec<Vec<f64>>
    where
        P: AsRef<[f64]> + Sync,
    {
        let k = self.k;
        // fixed chunks summed in order keep results independent of scheduling
        let partials: Vec<(Vec<f64>, Vec<usize>)> = points
            .par_chunks(CHUNK)
            .zip(labels.par_chunks(CHUNK))
            .map(|(points, labels)| {
                let mut sums = vec![0.0; k * dim];
                let mut counts = vec![0usize; k];
                for (point, &label) in points.iter().zip(labels) {
                    let row = &mut sums[label * dim..(label + 1) * dim];
                    row.iter_mut().zip(point.as_ref()).for_each(|(s, x)| *s += x);
                    counts[label] += 1;
                }
                (sums, counts)
            })
            .collect();
        let mut sums = vec![0.0; k * dim];
        let mut counts = vec![0usize; k];
        for (partial_sums, partial_counts) in &partials {
            sums.iter_mut().zip(partial_sums).for_each(|(a, b)| *a += b);
            counts.iter_mut().zip(partial_counts).for_each(|(a, b)| *a += b);
        }

        (0..k)
            .map(|j| match counts[j] {
                0 => previous[j].clone(),
                count => sums[j * dim..(j + 1) * dim]
                    .iter()
                    .map(|s| s / count as f64)
                    .collect(),
            })
            .collect()
    }
}

/// Give every empty cluster a member: the point lying farthest from its own
/// centroid, taken only from clusters that keep at least one other member.
/// The point is relabelled and the empty centroid moved onto it, so the
/// repair never raises inertia. Returns whether any cluster was reseeded.
fn fill_empty_clusters<P>(points: &[P], labels: &mut [usize], centroids: &mut [Vec<f64>], metric: Metric) -> bool
where
    P: AsRef<[f64]> + Sync,
{
    let mut counts = vec![0usize; centroids.len()];
    for &label in labels.iter() {
        counts[label] += 1;
    }
    if !counts.contains(&0) {
        return false;
    }

    let mut candidates: Vec<(usize, f64)> = points
        .par_iter()
        .zip(labels.par_iter())
        .map(|(point, &label)| metric.distance(point.as_ref(), &centroids[label]))
        .enumerate()
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut next = candidates.into_iter();
    for cluster in 0..centroids.len() {
        if counts[cluster] != 0 {
            continue;
        }
        let Some((point, distance)) = next.by_ref().find(|&(i, _)| counts[labels[i]] > 1) else {
            warn!(cluster, "no point available to reseed an empty cluster");
            continue;
        };
        counts[labels[point]] -= 1;
        counts[cluster] = 1;
        labels[point] = cluster;
        centroids[cluster] = points[point].as_ref().to_vec();
        debug!(cluster, point, distance, "reseeded empty cluster");
    }
    true
}

fn plus_plus<P, R>(points: &[P], k: usize, metric: Metric, rng: &mut R) -> Vec<Vec<f64>>
where
    P: AsRef<[f64]>,
    R: Rng + ?Sized,
{
    let n = points.len();
    let mut chosen = vec![false; n];
    let first = rng.gen_range(0..n);
    chosen[first] = true;
    let mut centroids = vec![points[first].as_ref().to_vec()];
    let mut weights = vec![f64::INFINITY; n];

    while centroids.len() < k {
        let last = &centroids[centroids.len() - 1];
        for (w, point) in weights.iter_mut().zip(points) {
            let d = metric.distance(point.as_ref(), last);
            *w = w.min(d * d);
        }

        let total: f64 = weights.iter().sum();
        let pick = if total > 0.0 && total.is_finite() {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            weights
                .iter()
                .position(|&w| {
                    cumulative += w;
                    w > 0.0 && cumulative > target
                })
                .or_else(|| weights.iter().rposition(|&w| w > 0.0))
        } else {
            None
        };
        // every point coincides with a centroid: fall back to the first unused one
        let index = pick.or_else(|| chosen.iter().position(|&c| !c)).unwrap_or(first);
        chosen[index] = true;
        centroids.push(points[index].as_ref().to_vec());
    }
    centroids
}

pub(super) fn point_dimension<P: AsRef<[f64]>>(points: &[P]) -> Result<usize> {
    let first = points
        .first()
        .ok_or_else(|| GeometryError::invalid_input("cannot cluster an empty point set"))?;
    let dim = first.as_ref().len();
    if dim == 0 {
        return Err(GeometryError::invalid_input("points must have at least one coordinate"));
    }
    for (i, point) in points.iter().enumerate() {
        let point = point.as_ref();
        if point.len() != dim {
            return Err(GeometryError::ShapeMismatch(format!(
                "point {} has dimension {}, expected {}",
                i,
                point.len(),
                dim
            )));
        }
        if point.iter().any(|x| !x.is_finite()) {
            return Err(GeometryError::invalid_input(format!("point {} has a non-finite coordinate", i)));
        }
    }
    Ok(dim)
}

/// Index and distance of the nearest centroid; ties go to the lowest index
fn nearest(point: &[f64], centroids: &[Vec<f64>], metric: Metric) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_d), (j, c)| {
            let d = metric.distance(point, c);
            if d < best_d {
                (j, d)
            } else {
                (best, best_d)
            }
        })
}

fn assign<P>(points: &[P], centroids: &[Vec<f64>], metric: Metric) -> Vec<usize>
where
    P: AsRef<[f64]> + Sync,
{
    points
        .par_iter()
        .map(|point| nearest(point.as_ref(), centroids, metric).0)
        .collect()
}

/// Within-cluster sum of squared Euclidean distances
fn inertia_of<P>(points: &[P], labels: &[usize], centroids: &[Vec<f64>]) -> f64
where
    P: AsRef<[f64]> + Sync,
{
    let partials: Vec<f64> = points
        .par_chunks(CHUNK)
        .zip(labels.par_chunks(CHUNK))
        .map(|(points, labels)| {
            points
                .iter()
                .zip(labels)
                .map(|(point, &label)| squared_euclidean(point.as_ref(), &centroids[label]))
                .sum::<f64>()
        })
        .collect();
    partials.iter().sum()
}

/// Outcome of [`KMeans::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    /// Cluster of each input point, in `0..k`
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
    /// Final within-cluster sum of squares
    pub inertia: f64,
    /// Inertia after the initial assignment and after every iteration
    pub inertia_history: Vec<f64>,
    pub metric: Metric,
}

impl KMeansResult {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Nearest centroid of a new point
    pub fn predict(&self, point: &[f64]) -> Result<usize> {
        let dim = self.centroids.first().map_or(0, Vec::len);
        if point.len() != dim {
            return Err(GeometryError::ShapeMismatch(format!(
                "point of dimension {}, centroids of dimension {}",
                point.len(),
                dim
            )));
        }
        Ok(nearest(point, &self.centroids, self.metric).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Mt19937;

    fn two_groups() -> Vec<[f64; 2]> {
        vec![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
        ]
    }

    fn blobs(rng: &mut Mt19937) -> Vec<Vec<f64>> {
        let centers = [[0.0, 0.0, 0.0], [5.0, 5.0, 0.0], [0.0, 5.0, 5.0], [5.0, 0.0, 5.0]];
        (0..200)
            .map(|i| {
                let c = centers[i % centers.len()];
                c.iter().map(|x| x + rng.gen_range(-1.0..1.0)).collect()
            })
            .collect()
    }

    #[test]
    fn test_separated_groups_for_several_seeds() {
        let points = two_groups();
        for seed in 0..10 {
            for init in [Init::PlusPlus, Init::RandomSample] {
                let mut rng = Mt19937::new(seed);
                let result = KMeans::new(2).with_init(init).fit(&points, &mut rng).unwrap();
                let l = &result.labels;
                assert!(l[0] == l[1] && l[1] == l[2], "seed {}", seed);
                assert!(l[3] == l[4] && l[4] == l[5], "seed {}", seed);
                assert_ne!(l[0], l[3], "seed {}", seed);
                assert!(result.converged);
            }
        }
    }

    #[test]
    fn test_inertia_non_increasing_and_clusters_non_empty() {
        let mut rng = Mt19937::new(11);
        let points = blobs(&mut rng);
        for init in [Init::PlusPlus, Init::RandomSample] {
            let result = KMeans::new(6).with_init(init).fit(&points, &mut rng).unwrap();
            for pair in result.inertia_history.windows(2) {
                assert!(pair[1] <= pair[0] + 1e-9, "{:?}", result.inertia_history);
            }
            assert!(result.cluster_sizes().iter().all(|&s| s > 0));
            assert_eq!(result.labels.len(), points.len());
            assert!(result.labels.iter().all(|&l| l < 6));
        }
    }

    #[test]
    fn test_empty_cluster_is_reseeded() {
        // the third seed is nearest to nothing
        let points = vec![[0.0], [1.0], [10.0], [11.0]];
        let seeds = vec![vec![0.5], vec![10.5], vec![100.0]];
        let mut rng = Mt19937::default();
        let result = KMeans::new(3).with_init(Init::Seeds(seeds)).fit(&points, &mut rng).unwrap();
        assert!(result.cluster_sizes().iter().all(|&s| s > 0));
    }

    #[test]
    fn test_coincident_points_fill_every_cluster() {
        let points = vec![[0.0]; 3];
        for seed in 0..5 {
            for init in [Init::PlusPlus, Init::RandomSample] {
                let mut rng = Mt19937::new(seed);
                let result = KMeans::new(2).with_init(init).fit(&points, &mut rng).unwrap();
                let mut sizes = result.cluster_sizes();
                sizes.sort_unstable();
                assert_eq!(sizes, vec![1, 2], "seed {}", seed);
                assert!(result.converged);
                assert_eq!(result.inertia, 0.0);
            }
        }
    }

    #[test]
    fn test_k_equal_to_duplicated_point_count() {
        let points = vec![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [4.0, 0.0]];
        let mut rng = Mt19937::new(9);
        let result = KMeans::new(4).fit(&points, &mut rng).unwrap();
        assert_eq!(result.cluster_sizes(), vec![1; 4]);
    }

    #[test]
    fn test_clusters_non_empty_when_budget_runs_out() {
        let mut points: Vec<[f64; 1]> = vec![[0.0]; 4];
        points.extend((1..=6).map(|i| [i as f64]));
        let seeds = vec![vec![0.0], vec![0.0], vec![50.0]];
        let mut rng = Mt19937::default();
        let result = KMeans::new(3)
            .with_init(Init::Seeds(seeds))
            .with_max_iterations(1)
            .fit(&points, &mut rng)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert!(result.cluster_sizes().iter().all(|&s| s > 0), "{:?}", result.cluster_sizes());
    }

    #[test]
    fn test_iteration_budget_is_a_flag() {
        let points: Vec<[f64; 1]> = (0..=10).map(|i| [i as f64]).collect();
        let seeds = vec![vec![0.0], vec![1.0]];
        let mut rng = Mt19937::default();
        let result = KMeans::new(2)
            .with_init(Init::Seeds(seeds))
            .with_max_iterations(1)
            .fit(&points, &mut rng)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
    }

    #[test]
    fn test_invalid_parameters() {
        let points = two_groups();
        let mut rng = Mt19937::default();
        assert!(matches!(KMeans::new(0).fit(&points, &mut rng), Err(GeometryError::InvalidInput(_))));
        assert!(matches!(KMeans::new(7).fit(&points, &mut rng), Err(GeometryError::InvalidInput(_))));

        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(KMeans::new(1).fit(&empty, &mut rng).is_err());

        let ragged = vec![vec![0.0, 1.0], vec![2.0]];
        assert!(matches!(KMeans::new(1).fit(&ragged, &mut rng), Err(GeometryError::ShapeMismatch(_))));

        let wrong_count = Init::Seeds(vec![vec![0.0, 0.0]]);
        assert!(KMeans::new(2).with_init(wrong_count).fit(&points, &mut rng).is_err());
        let wrong_dim = Init::Seeds(vec![vec![0.0], vec![1.0]]);
        assert!(matches!(
            KMeans::new(2).with_init(wrong_dim).fit(&points, &mut rng),
            Err(GeometryError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let mut rng = Mt19937::default();
        let result = KMeans::new(2).with_cancel_token(token).fit(&two_groups(), &mut rng);
        assert!(matches!(result, Err(GeometryError::Cancelled)));
    }

    #[test]
    fn test_predict() {
        let mut rng = Mt19937::new(3);
        let result = KMeans::new(2).fit(&two_groups(), &mut rng).unwrap();
        assert_eq!(result.predict(&[0.05, 0.05]).unwrap(), result.labels[0]);
        assert_eq!(result.predict(&[9.0, 9.5]).unwrap(), result.labels[3]);
        assert!(result.predict(&[1.0]).is_err());
    }

    #[test]
    fn test_other_metrics() {
        let mut rng = Mt19937::new(5);
        for metric in [Metric::Manhattan, Metric::Chebyshev, Metric::SquaredEuclidean] {
            let result = KMeans::new(2).with_metric(metric).fit(&two_groups(), &mut rng).unwrap();
            assert_ne!(result.labels[0], result.labels[3]);
        }
    }
}
