//! Tracks a target through a sequence of frames and writes annotated output.
//!
//! Usage:
//!   cargo run --example track_sequence -- x y w h frame_0001.png frame_0002.png ...
//!
//! Without arguments a synthetic square drifting across the frame is tracked instead.

use image::RgbImage;
use similarity_tracker::{
    annotate_frame_with_region, save_debug_output, DebugOutputConfig, Frame, Region, SimilarityTracker,
    TrackerConfig,
};
use std::time::Instant;

fn synthetic_sequence() -> Result<(Region, Vec<Frame>), Box<dyn std::error::Error>> {
    let frames = (0..20u32)
        .map(|i| Frame::with_square(200, 160, (60 + 2 * i, 50 + i), 32, [240, 200, 40], [30, 30, 60]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((Region::from_values(&[60.0, 50.0, 32.0, 32.0], false)?, frames))
}

fn sequence_from_args(args: &[String]) -> Result<(Region, Vec<Frame>), Box<dyn std::error::Error>> {
    let values = args[..4].iter().map(|v| v.parse::<f32>()).collect::<Result<Vec<_>, _>>()?;
    let region = Region::from_values(&values, false)?;
    let frames = args[4..].iter().map(Frame::from_file).collect::<Result<Vec<_>, _>>()?;
    Ok((region, frames))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (region, frames) = if args.len() > 4 {
        sequence_from_args(&args)?
    } else {
        synthetic_sequence()?
    };
    let Some((first, rest)) = frames.split_first() else {
        return Err("no frames to track".into());
    };

    let debug_config = DebugOutputConfig {
        enabled: true,
        output_dir: Some("tracking_output".to_string()),
    };

    let mut tracker = SimilarityTracker::new(TrackerConfig::default())?;
    tracker.init(first, &region)?;

    let mut annotated: RgbImage = first.to_rgb8();
    annotate_frame_with_region(&mut annotated, &region, f32::INFINITY, None);
    save_debug_output(&annotated, "frame_0000.png", 0, std::time::Duration::ZERO, Some(&debug_config))?;

    for (i, frame) in rest.iter().enumerate() {
        let index = i + 1;
        let start_time = Instant::now();
        let tracked = tracker.update(frame)?;
        let elapsed_time = start_time.elapsed();

        let (psr, crop_size) = tracker
            .diagnostics()
            .map(|d| (d.psr, Some(d.crop_size)))
            .unwrap_or((0.0, None));

        let mut annotated = frame.to_rgb8();
        annotate_frame_with_region(&mut annotated, &tracked, psr, crop_size);
        save_debug_output(
            &annotated,
            format!("frame_{:04}.png", index),
            index,
            elapsed_time,
            Some(&debug_config),
        )?;

        println!("frame {:4}: {:?} psr {:.2}", index, tracked.to_values(), psr);
    }

    Ok(())
}
