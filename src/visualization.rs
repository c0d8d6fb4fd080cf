//! Visualization module - console status rows and sweep trajectory charts

pub mod dashboard;
pub mod trajectory;

pub use dashboard::{render_diagnostics, render_status};
pub use trajectory::{render_trajectory_svg, sweep_trajectory, TrajectoryPoint};
