//! Head-to-head comparison of two symbols.
//!
//! [`compute_metrics`] gathers the seven scored statistics for one series by
//! calling into `technical-analysis` and `quant-analysis`; [`compare`] scores
//! two snapshots against each other and tallies points.

pub mod comparison;
pub mod metrics;

pub use comparison::{compare, BenchmarkSource, ComparisonResult, ComparisonRow, MetricCell};
pub use metrics::{compute_metrics, Metric, MetricSnapshot, MetricsConfig};
