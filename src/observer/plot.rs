//! Static trajectory plot observer: accumulates per-agent positions across a run
//! and renders them to a PNG with `plotters`, encoded via `image`.

use std::path::PathBuf;

use plotters::prelude::*;
use plotters::style::Palette99;

use super::{Observer, RunOutcome, Snapshot};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 800;

pub struct PlotObserver {
    output_path: PathBuf,
    trajectories: Vec<Vec<[f64; 3]>>,
}

impl PlotObserver {
    pub fn new(output_path: PathBuf, agents: usize) -> Self {
        Self {
            output_path,
            trajectories: vec![Vec::new(); agents],
        }
    }

    fn render(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut pixel_buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];

        let limit = self
            .trajectories
            .iter()
            .flatten()
            .flat_map(|p| [p[0].abs(), p[1].abs()])
            .fold(1.0_f64, f64::max)
            * 1.1;

        {
            let root = BitMapBackend::with_buffer(&mut pixel_buffer, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("agent trajectories (x/y)", ("sans-serif", 20).into_font())
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(30)
                .build_cartesian_2d(-limit..limit, -limit..limit)?;

            chart.configure_mesh().draw()?;

            for (i, trajectory) in self.trajectories.iter().enumerate() {
                let color = Palette99::pick(i).stroke_width(2);
                chart.draw_series(LineSeries::new(
                    trajectory.iter().map(|p| (p[0], p[1])),
                    color,
                ))?;
            }

            root.present()?;
        }

        let image_buffer = image::ImageBuffer::from_raw(WIDTH, HEIGHT, pixel_buffer)
            .ok_or("failed to assemble plot pixel buffer")?;
        image::DynamicImage::ImageRgb8(image_buffer).save(&self.output_path)?;
        Ok(())
    }
}

impl Observer for PlotObserver {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        for (i, &position) in snapshot.positions.iter().enumerate() {
            self.trajectories[i].push(position);
        }
    }

    fn on_finish(&mut self, _outcome: RunOutcome) {
        if let Err(error) = self.render() {
            tracing::error!(%error, path = %self.output_path.display(), "failed to write trajectory plot");
        }
    }
}
