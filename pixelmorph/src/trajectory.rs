//! Motion models that turn a [PixelMotion] into a position for a given frame.
//!
//! - **Linear-synchronized** ([linear_position]): a pure function of the motion
//!   and the frame index. Every pixel advances one unit per frame on each axis
//!   until that axis is done, so frame 0 is the source arrangement and frame
//!   `frame_count - 1` is the target arrangement.
//! - **Randomized-jitter** ([RandomWalk]): stateful. Each frame, every pixel that
//!   has not arrived advances by a random per-axis step scaled by the photo
//!   size. The generator is owned by the walk so a fixed seed gives a
//!   reproducible sequence.

use rand::Rng;

use crate::animation_plan::{AnimationPlan, PixelMotion};
use crate::photo::Bounds;

/// Photo dimension that corresponds to a scale factor of 1.
const STEP_REFERENCE_SIZE: f64 = 150.0;
/// Inclusive bounds of the unscaled random step.
const MIN_BASE_STEP: u32 = 1;
const MAX_BASE_STEP: u32 = 3;

/// Position of `motion` at `frame` under the linear-synchronized model.
///
/// Each axis moves `min(frame, |delta|)` units toward the target, so pixels
/// never overshoot and hold their target once reached.
pub fn linear_position(motion: &PixelMotion, frame: usize) -> (usize, usize) {
    (
        linear_axis(motion.start_x, motion.target_x, frame),
        linear_axis(motion.start_y, motion.target_y, frame),
    )
}

fn linear_axis(start: usize, target: usize, frame: usize) -> usize {
    let moved = frame.min(start.abs_diff(target));
    if target >= start {
        start + moved
    } else {
        start - moved
    }
}

/// Moves `current` toward `target` by `step`, snapping once within reach.
fn step_axis(current: usize, target: usize, step: usize) -> usize {
    if current.abs_diff(target) <= step {
        target
    } else if target > current {
        current + step
    } else {
        current - step
    }
}

/// Per-axis multiplier applied to the random base step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepScale {
    pub x: f64,
    pub y: f64,
}

impl StepScale {
    /// Larger photos take proportionally larger steps so the walk length stays bounded.
    pub fn for_bounds(bounds: Bounds) -> Self {
        StepScale {
            x: bounds.width as f64 / STEP_REFERENCE_SIZE,
            y: bounds.height as f64 / STEP_REFERENCE_SIZE,
        }
    }

    /// Draws one step: a base in `1..=3` times `scale`, rounded, never below 1.
    pub fn draw<R: Rng>(rng: &mut R, scale: f64) -> usize {
        let base = rng.random_range(MIN_BASE_STEP..=MAX_BASE_STEP) as f64;
        ((base * scale).round() as usize).max(1)
    }
}

/// Mutable state of the randomized-jitter model.
///
/// Frames depend on the previous frame, so a walk is driven strictly in order
/// by a single owner.
pub struct RandomWalk<'a, R: Rng> {
    plan: &'a AnimationPlan,
    positions: Vec<(usize, usize)>,
    scale: StepScale,
    rng: R,
    steps_taken: usize,
}

impl<'a, R: Rng> RandomWalk<'a, R> {
    /// Starts a walk with every pixel at its source coordinate.
    pub fn new(plan: &'a AnimationPlan, rng: R) -> Self {
        RandomWalk {
            plan,
            positions: plan.pixels.iter().map(|p| (p.start_x, p.start_y)).collect(),
            scale: StepScale::for_bounds(plan.bounds),
            rng,
            steps_taken: 0,
        }
    }

    pub fn plan(&self) -> &AnimationPlan {
        self.plan
    }

    /// Current position of every pixel, index-aligned with `plan.pixels`.
    pub fn positions(&self) -> &[(usize, usize)] {
        &self.positions
    }

    /// Number of [RandomWalk::advance] calls that moved at least one pixel.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn is_arrived(&self) -> bool {
        self.plan
            .pixels
            .iter()
            .zip(&self.positions)
            .all(|(m, &pos)| pos == (m.target_x, m.target_y))
    }

    /// Advances every pixel that has not yet arrived by one random step.
    ///
    /// Returns `false` without drawing any randomness once all pixels have arrived.
    pub fn advance(&mut self) -> bool {
        let mut moved = false;
        for (motion, pos) in self.plan.pixels.iter().zip(self.positions.iter_mut()) {
            let target = (motion.target_x, motion.target_y);
            if *pos == target {
                continue;
            }
            let step_x = StepScale::draw(&mut self.rng, self.scale.x);
            let step_y = StepScale::draw(&mut self.rng, self.scale.y);
            *pos = (
                step_axis(pos.0, target.0, step_x),
                step_axis(pos.1, target.1, step_y),
            );
            moved = true;
        }
        if moved {
            self.steps_taken += 1;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn motion(start: (usize, usize), target: (usize, usize)) -> PixelMotion {
        PixelMotion {
            start_x: start.0,
            start_y: start.1,
            target_x: target.0,
            target_y: target.1,
            color: [255, 0, 0, 255],
        }
    }

    fn plan(pixels: Vec<PixelMotion>, bounds: Bounds) -> AnimationPlan {
        let frame_count = pixels.iter().map(|p| p.chebyshev_distance()).max().map_or(0, |d| d + 1);
        AnimationPlan {
            pixels,
            frame_count,
            bounds,
        }
    }

    #[test]
    fn linear_model_moves_each_axis_independently() {
        let m = motion((5, 1), (1, 3));
        assert_eq!(linear_position(&m, 0), (5, 1));
        assert_eq!(linear_position(&m, 1), (4, 2));
        assert_eq!(linear_position(&m, 2), (3, 3));
        assert_eq!(linear_position(&m, 3), (2, 3));
        assert_eq!(linear_position(&m, 4), (1, 3));
    }

    #[test]
    fn linear_model_holds_position_after_arrival() {
        let m = motion((0, 0), (2, 0));
        assert_eq!(linear_position(&m, 2), (2, 0));
        assert_eq!(linear_position(&m, 50), (2, 0));
    }

    #[test]
    fn linear_model_never_overshoots() {
        let m = motion((7, 2), (0, 9));
        let mut prev = linear_position(&m, 0);
        for f in 1..=m.chebyshev_distance() {
            let cur = linear_position(&m, f);
            assert!(cur.0 <= prev.0);
            assert!(cur.1 >= prev.1 && cur.1 <= 9);
            prev = cur;
        }
        assert_eq!(prev, (0, 9));
    }

    #[test]
    fn small_photos_draw_steps_between_one_and_three() {
        let mut rng = StdRng::seed_from_u64(7);
        let scale = StepScale::for_bounds(Bounds::new(10, 10));
        for _ in 0..200 {
            let step = StepScale::draw(&mut rng, scale.x);
            assert_eq!(step, 1);
        }
        for _ in 0..200 {
            let step = StepScale::draw(&mut rng, 1.0);
            assert!((1..=3).contains(&step));
        }
    }

    #[test]
    fn large_photos_take_proportionally_larger_steps() {
        let mut rng = StdRng::seed_from_u64(11);
        let scale = StepScale::for_bounds(Bounds::new(300, 600));
        assert_eq!(scale, StepScale { x: 2.0, y: 4.0 });
        for _ in 0..200 {
            let sx = StepScale::draw(&mut rng, scale.x);
            let sy = StepScale::draw(&mut rng, scale.y);
            assert!([2, 4, 6].contains(&sx));
            assert!([4, 8, 12].contains(&sy));
        }
    }

    #[test]
    fn random_walk_reaches_every_target() {
        let p = plan(
            vec![motion((0, 0), (9, 4)), motion((9, 4), (0, 0)), motion((3, 3), (3, 3))],
            Bounds::new(10, 5),
        );
        let mut walk = RandomWalk::new(&p, StdRng::seed_from_u64(3));
        assert_eq!(walk.positions(), &[(0, 0), (9, 4), (3, 3)]);

        let mut guard = 0;
        while walk.advance() {
            guard += 1;
            assert!(guard <= 9, "walk must finish within the longest axis distance");
        }
        assert!(walk.is_arrived());
        assert_eq!(walk.positions(), &[(9, 4), (0, 0), (3, 3)]);
        assert_eq!(walk.steps_taken(), guard);
        assert!(!walk.advance());
    }

    #[test]
    fn same_seed_gives_the_same_walk() {
        let p = plan(vec![motion((0, 0), (299, 0)), motion((299, 0), (0, 0))], Bounds::new(300, 1));
        let trace = |seed| {
            let mut walk = RandomWalk::new(&p, StdRng::seed_from_u64(seed));
            let mut states = vec![walk.positions().to_vec()];
            while walk.advance() {
                states.push(walk.positions().to_vec());
            }
            states
        };
        assert_eq!(trace(42), trace(42));
    }
}
