//! Shared utility functions for agent-bench.

pub mod template;

pub use template::render_template;

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
