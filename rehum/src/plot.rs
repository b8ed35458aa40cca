//! Constellation rendering for visual inspection.

use anyhow::{Context, Result};
use libhum_audio::{Peak, SAMPLE_RATE};
use plotters::prelude::*;
use std::path::Path;

/// The y axis runs to the canonical Nyquist frequency.
const Y_MAX_HZ: f32 = SAMPLE_RATE as f32 / 2.0;

/// Render a peak constellation as a PNG scatter: seconds across, Hz up,
/// points kept small so structure stays visible in dense regions.
pub fn render_constellation(peaks: &[Peak], title: &str, output: &Path) -> Result<()> {
    let t_max = peaks.iter().map(|p| p.time_secs).fold(1.0f32, f32::max);

    let root = BitMapBackend::new(output, (1000, 300)).into_drawing_area();
    root.fill(&WHITE).context("Failed to clear canvas")?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0f32..t_max, 0.0f32..Y_MAX_HZ)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Frequency (Hz)")
        .draw()
        .context("Failed to draw axes")?;

    chart
        .draw_series(
            peaks
                .iter()
                .map(|p| Circle::new((p.time_secs, p.freq_hz as f32), 1, RED.filled())),
        )
        .context("Failed to draw constellation")?;

    root.present().context("Failed to write image")?;
    Ok(())
}
