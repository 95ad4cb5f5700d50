//! Bounded re-detection loop that applies the estimated scale/rotation and keeps the best pose.

use log::{debug, trace};

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::tracking::detection::Detection;
use crate::tracking::state::{wrap_angle, Pose, WindowGeometry};

/// Iteration cap and the score blend used to rank iterations.
#[derive(Debug, Clone, Copy)]
pub struct Refinement {
    pub max_iterations: usize,
    /// Weight of the scale score; `1 - weight` goes to the PSR.
    pub scale_weight: f32,
}

/// Best pose found by the loop and the detection that produced it.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub pose: Pose,
    pub score: f32,
    /// Number of accepted iterations.
    pub iterations: usize,
    pub detection: Detection,
}

impl Refinement {
    pub const MAX_ITERATIONS: usize = 5;

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            max_iterations: Self::MAX_ITERATIONS,
            scale_weight: config.interp_n,
        }
    }

    pub fn score(&self, detection: &Detection) -> f32 {
        (1.0 - self.scale_weight) * detection.psr + self.scale_weight * detection.scale_score
    }

    /// Runs the loop from `start`, whose first detection is `first`.
    ///
    /// Each iteration applies the pending step (dropping a scale that collapses the model
    /// window), accepts the pose if its score is at least the best so far and re-detects;
    /// the first non-improving iteration stops the loop.
    pub fn run<F>(&self, geometry: &WindowGeometry, start: Pose, first: Detection, mut redetect: F) -> Result<RefinementOutcome>
    where
        F: FnMut(Pose, bool) -> Result<Detection>,
    {
        let mut pose = start;
        let mut detection = first;
        let mut best: Option<(Pose, f32, Detection)> = None;
        let mut best_score = f32::NEG_INFINITY;
        let mut accepted = 0;

        for iteration in 0..self.max_iterations {
            let step = if geometry.is_degenerate(pose.scale * detection.scale_step) {
                1.0
            } else {
                detection.scale_step
            };
            pose = Pose {
                centre: detection.centre,
                scale: pose.scale * step,
                rotation: wrap_angle(pose.rotation + detection.rotation_step),
            };

            let score = self.score(&detection);
            trace!(
                "refinement {}: score {:.4} (best {:.4}) at ({:.2}, {:.2}) scale {:.4} rotation {:.4}",
                iteration,
                score,
                best_score,
                pose.centre.0,
                pose.centre.1,
                pose.scale,
                pose.rotation
            );
            if score < best_score {
                debug!("refinement stopped after {} accepted iterations", accepted);
                break;
            }

            best_score = score;
            accepted += 1;
            let next = redetect(pose, iteration > 0)?;
            best = Some((pose, score, std::mem::replace(&mut detection, next)));
        }

        // Only empty with a zero iteration cap
        let (pose, score, detection) = match best {
            Some(best) => best,
            None => (start, self.score(&detection), detection),
        };
        Ok(RefinementOutcome {
            pose,
            score,
            iterations: accepted,
            detection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor2D;

    fn geometry() -> WindowGeometry {
        let config = TrackerConfig {
            padding: 1.0,
            cell_size: 1,
            min_image_sample_size: 30 * 30,
            max_image_sample_size: 300 * 300,
            ..TrackerConfig::default()
        };
        WindowGeometry::derive((20.0, 20.0), &config).unwrap().0
    }

    fn detection(x: f32, psr: f32, scale_step: f32) -> Detection {
        Detection {
            centre: (x, 0.0),
            scale_step,
            rotation_step: 0.0,
            psr,
            scale_score: 0.0,
            response: Tensor2D::zeros(1, 1),
        }
    }

    fn start() -> Pose {
        Pose {
            centre: (0.0, 0.0),
            scale: 1.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn stops_at_first_worse_iteration() {
        let refinement = Refinement {
            max_iterations: 5,
            scale_weight: 0.0,
        };
        let mut scores = vec![3.0, 1.0, 9.0].into_iter();
        let mut calls = 0;
        let outcome = refinement
            .run(&geometry(), start(), detection(1.0, 2.0, 1.0), |pose, _| {
                calls += 1;
                Ok(detection(pose.centre.0 + 1.0, scores.next().unwrap(), 1.0))
            })
            .unwrap();

        // 2.0 accepted, 3.0 accepted, 1.0 rejected; the 9.0 is never reached
        assert_eq!(calls, 2);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.score, 3.0);
        assert_eq!(outcome.pose.centre.0, 2.0);
    }

    #[test]
    fn never_exceeds_the_iteration_cap() {
        let refinement = Refinement {
            max_iterations: 5,
            scale_weight: 0.5,
        };
        let mut polish_flags = Vec::new();
        let outcome = refinement
            .run(&geometry(), start(), detection(0.0, 1.0, 1.0), |pose, polish| {
                polish_flags.push(polish);
                Ok(detection(pose.centre.0, 1.0, 1.0))
            })
            .unwrap();
        assert_eq!(outcome.iterations, 5);
        assert_eq!(polish_flags, vec![false, true, true, true, true]);
    }

    #[test]
    fn collapsing_scale_steps_are_dropped() {
        let refinement = Refinement {
            max_iterations: 1,
            scale_weight: 0.0,
        };
        let outcome = refinement
            .run(&geometry(), start(), detection(0.0, 1.0, 0.05), |pose, _| {
                Ok(detection(pose.centre.0, 0.0, 1.0))
            })
            .unwrap();
        assert_eq!(outcome.pose.scale, 1.0);

        let outcome = refinement
            .run(&geometry(), start(), detection(0.0, 1.0, 1.1), |pose, _| {
                Ok(detection(pose.centre.0, 0.0, 1.0))
            })
            .unwrap();
        assert!((outcome.pose.scale - 1.1).abs() < 1e-6);
    }
}
