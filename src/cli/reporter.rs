// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::engine::ClusterOutcome;
use crate::mesh::{GeometryStats, MeshReport};
use crate::raster::VoxelGrid;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    fn field(name: &str, value: impl std::fmt::Display) {
        println!("  {} {}", format!("{}:", name).bright_black(), value.to_string().cyan());
    }

    /// Report mesh analytics and validation findings
    pub fn report_mesh(file: &str, stats: &GeometryStats, report: &MeshReport, duration: Duration) {
        println!();
        Self::rule();
        println!("{} {}", "Mesh:".bold(), file.cyan());
        Self::rule();

        Self::field("Vertices", stats.vertex_count);
        Self::field("Triangles", stats.triangle_count);
        let [sx, sy, sz] = stats.size();
        Self::field("Size", format!("{:.4} x {:.4} x {:.4}", sx, sy, sz));
        Self::field("Surface area", format!("{:.6}", stats.surface_area));
        Self::field("Volume", format!("{:.6}", stats.volume));
        let [cx, cy, cz] = stats.surface_centroid;
        Self::field("Surface centroid", format!("({:.4}, {:.4}, {:.4})", cx, cy, cz));

        println!("\n{}", "Validation:".bold());
        if report.is_clean() {
            println!("  {} {}", "✅".green(), "Watertight, no defects".green().bold());
        } else {
            Self::print_count("Degenerate faces", report.degenerate_faces.len());
            Self::print_count("Repeated-index faces", report.repeated_index_faces.len());
            Self::print_count("Non-manifold edges", report.non_manifold_edges.len());
            Self::print_count("Boundary edges", report.boundary_edges.len());
            if !report.is_watertight {
                println!("  {} {}", "⚠️ ".yellow(), "Not watertight".yellow());
            }
        }

        println!("\n{}", "Performance:".bold());
        println!("  {} {}", "Analysis:".bright_black(), Self::format_duration(duration).yellow());
        Self::rule();
    }

    /// Report voxelization output
    pub fn report_grid(file: &str, grid: &VoxelGrid, duration: Duration) {
        println!();
        Self::rule();
        println!("{} {}", "Voxelized:".bold(), file.cyan());
        Self::rule();
        let [nx, ny, nz] = grid.dims();
        Self::field("Dims", format!("{} x {} x {}", nx, ny, nz));
        let size = grid.mapping().cell_size();
        Self::field("Cell size", format!("{:.5} x {:.5} x {:.5}", size.x, size.y, size.z));
        Self::field("Occupied cells", grid.occupied_count());
        Self::field("Occupied volume", format!("{:.6}", grid.occupied_volume()));
        Self::field("Time", Self::format_duration(duration));
        Self::rule();
    }

    /// Report cluster sizes and convergence
    pub fn report_clusters(outcome: &ClusterOutcome, duration: Duration) {
        let mut sizes = vec![0usize; outcome.centroids.len()];
        for &label in &outcome.labels {
            sizes[label] += 1;
        }
        println!();
        Self::rule();
        println!("{} {}", "Clusters:".bold(), sizes.len().to_string().cyan());
        Self::rule();
        for (cluster, size) in sizes.iter().enumerate() {
            Self::field(&format!("Cluster {}", cluster), size);
        }
        Self::field("Iterations", outcome.iterations);
        Self::field("Inertia", format!("{:.6}", outcome.inertia));
        if outcome.converged {
            println!("  {} {}", "✅".green(), "Converged".green());
        } else {
            println!("  {} {}", "⚠️ ".yellow(), "Stopped at the iteration limit".yellow());
        }
        Self::field("Time", Self::format_duration(duration));
        Self::rule();
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning on stderr
    pub fn report_warning(message: &str) {
        eprintln!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        eprintln!("{} {}", "ℹ️".bright_blue(), message);
    }

    fn print_count(name: &str, count: usize) {
        let value = if count == 0 {
            count.to_string().green()
        } else {
            count.to_string().red()
        };
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(Reporter::format_duration(Duration::from_micros(500)), "500µs");
        assert_eq!(Reporter::format_duration(Duration::from_millis(5)), "5.00ms");
        assert_eq!(Reporter::format_duration(Duration::from_secs(2)), "2.00s");
    }
}
