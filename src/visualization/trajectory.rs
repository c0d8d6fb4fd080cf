use std::time::Duration;

use plotters::prelude::*;

use crate::mapping::Geometry;
use crate::sequencer::{SweepKind, SweepProfile};

/// Targets one arm receives at one sweep sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Time since the sweep started when this sample is sent.
    pub at: Duration,
    pub roll: i32,
    pub pitch: i32,
}

/// Offset-relative targets of `arm` over a full sweep.
pub fn sweep_trajectory(
    profile: &SweepProfile,
    geometry: &Geometry,
    kind: SweepKind,
    arm: usize,
) -> Vec<TrajectoryPoint> {
    let mapping = kind.mapping();
    let mut at = Duration::ZERO;
    profile
        .sequence()
        .filter_map(|sample| {
            let point = geometry
                .map_targets(mapping, sample.tilt, arm)
                .map(|t| TrajectoryPoint {
                    at,
                    roll: t.roll,
                    pitch: t.pitch,
                });
            at += sample.delay;
            point
        })
        .collect()
}

/// Roll (red) and pitch (blue) targets against time. Axes are left unlabelled
/// so no font backend is needed.
pub fn render_trajectory_svg(
    points: &[TrajectoryPoint],
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let end = points.last().map_or(1.0, |p| p.at.as_secs_f64()).max(1e-3);
    let peak = points
        .iter()
        .map(|p| p.roll.abs().max(p.pitch.abs()))
        .max()
        .unwrap_or(1)
        .max(1) as f64
        * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0.0..end, -peak..peak)?;

    chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (end, 0.0)], &BLACK))?;
    chart.draw_series(LineSeries::new(
        points.iter().map(|p| (p.at.as_secs_f64(), f64::from(p.roll))),
        &RED,
    ))?;
    chart.draw_series(LineSeries::new(
        points.iter().map(|p| (p.at.as_secs_f64(), f64::from(p.pitch))),
        &BLUE,
    ))?;
    root.present()?;
    Ok(())
}
