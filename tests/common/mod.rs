// Shared fixtures for the integration tests
//
// Contains global constants for controlling test behaviour

#![allow(dead_code)]

use similarity_tracker::{Frame, TrackerConfig};

/// Controls whether annotated frames are saved during test execution
pub const DEBUG_OUTPUT: bool = false;

pub const FRAME_SIZE: u32 = 100;
pub const SQUARE_SIDE: u32 = 20;
pub const WHITE: [u8; 3] = [255, 255, 255];
pub const BLACK: [u8; 3] = [0, 0, 0];

/// Configuration whose geometry keeps a 20 px target at unit scale with one-pixel cells.
pub fn small_target_config() -> TrackerConfig {
    TrackerConfig {
        padding: 1.0,
        cell_size: 1,
        min_image_sample_size: 30 * 30,
        max_image_sample_size: 300 * 300,
        scale_size_window: (64, 64),
        ..TrackerConfig::default()
    }
}

/// 100x100 black frame with a white 20x20 square at `top_left`.
pub fn square_frame(top_left: (u32, u32)) -> Frame {
    Frame::with_square(FRAME_SIZE, FRAME_SIZE, top_left, SQUARE_SIDE, WHITE, BLACK).expect("valid synthetic frame")
}

pub fn centre_of(values: &[f32]) -> (f32, f32) {
    match values.len() {
        4 => (values[0] + values[2] / 2.0, values[1] + values[3] / 2.0),
        8 => (
            values.iter().step_by(2).sum::<f32>() / 4.0,
            values.iter().skip(1).step_by(2).sum::<f32>() / 4.0,
        ),
        n => panic!("unexpected region arity {}", n),
    }
}
