//! GIF trajectory animation observer, encoded with the `image` crate's GIF
//! encoder: one frame per sampled tick.

use std::fs::File;
use std::path::PathBuf;

use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};
use plotters::prelude::*;
use plotters::style::Palette99;

use super::{Observer, RunOutcome, Snapshot};

const WIDTH: u32 = 500;
const HEIGHT: u32 = 500;

pub struct AnimationObserver {
    output_path: PathBuf,
    sample_every: u64,
    trajectories: Vec<Vec<[f64; 3]>>,
    frames: Vec<RgbaImage>,
}

impl AnimationObserver {
    pub fn new(output_path: PathBuf, agents: usize, sample_every: u64) -> Self {
        Self {
            output_path,
            sample_every: sample_every.max(1),
            trajectories: vec![Vec::new(); agents],
            frames: Vec::new(),
        }
    }

    fn render_frame(&self) -> Option<RgbaImage> {
        let limit = self
            .trajectories
            .iter()
            .flatten()
            .flat_map(|p| [p[0].abs(), p[1].abs()])
            .fold(1.0_f64, f64::max)
            * 1.1;

        let mut pixel_buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixel_buffer, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE).ok()?;

            let mut chart = ChartBuilder::on(&root)
                .margin(5)
                .x_label_area_size(0)
                .y_label_area_size(0)
                .build_cartesian_2d(-limit..limit, -limit..limit)
                .ok()?;

            for (i, trajectory) in self.trajectories.iter().enumerate() {
                let color = Palette99::pick(i).stroke_width(2);
                chart
                    .draw_series(LineSeries::new(trajectory.iter().map(|p| (p[0], p[1])), color))
                    .ok()?;
                if let Some(last) = trajectory.last() {
                    chart
                        .draw_series(std::iter::once(Circle::new((last[0], last[1]), 4, Palette99::pick(i).filled())))
                        .ok()?;
                }
            }

            root.present().ok()?;
        }

        let rgb = image::ImageBuffer::<image::Rgb<u8>, _>::from_raw(WIDTH, HEIGHT, pixel_buffer)?;
        let mut rgba = RgbaImage::new(WIDTH, HEIGHT);
        for (dst, src) in rgba.pixels_mut().zip(rgb.pixels()) {
            *dst = Rgba([src[0], src[1], src[2], 255]);
        }
        Some(rgba)
    }
}

impl Observer for AnimationObserver {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        for (i, &position) in snapshot.positions.iter().enumerate() {
            self.trajectories[i].push(position);
        }
        if snapshot.tick % self.sample_every == 0 {
            if let Some(frame) = self.render_frame() {
                self.frames.push(frame);
            }
        }
    }

    fn on_finish(&mut self, _outcome: RunOutcome) {
        if self.frames.is_empty() {
            return;
        }
        let result = (|| -> Result<(), Box<dyn std::error::Error>> {
            let file = File::create(&self.output_path)?;
            let mut encoder = GifEncoder::new(file);
            for image in &self.frames {
                encoder.encode_frame(Frame::from_parts(image.clone(), 0, 0, Delay::from_numer_denom_ms(33, 1)))?;
            }
            Ok(())
        })();
        if let Err(error) = result {
            tracing::error!(%error, path = %self.output_path.display(), "failed to write trajectory animation");
        }
    }
}
