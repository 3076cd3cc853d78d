//! Time-based driving of the transition value.

use super::compositor::Side;

/// Easing functions for the one-shot ramp.
///
/// These control the acceleration curve of the transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
}

impl Easing {
    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// How the driver moves its progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DriverMode {
    /// 0 → 1 over `period` seconds, then 1 → 0, forever.
    Oscillating { period: f32 },
    /// Idle until triggered, then 0 → 1 once over `duration` seconds.
    OneShot { duration: f32, easing: Easing },
}

impl Default for DriverMode {
    fn default() -> Self {
        DriverMode::Oscillating { period: 3.2 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Where a one-shot transition stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    ShowingA,
    Transitioning,
    /// Resolved. There is no way back.
    ShowingB,
}

/// Whether a frame goes through the compositor at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Render one host directly, compositor bypassed.
    Direct(Side),
    /// Let the compositor decide.
    Composite,
}

/// Advances the compositor's mix ratio over time.
#[derive(Debug)]
pub struct TransitionDriver {
    mode: DriverMode,
    progress: f32,
    direction: Direction,
    elapsed: f32,
    paused: bool,
    resolved: bool,
    transition_requested: bool,
}

impl TransitionDriver {
    pub fn new(mode: DriverMode) -> Self {
        Self {
            mode,
            progress: 0.0,
            direction: Direction::Forward,
            elapsed: 0.0,
            paused: false,
            resolved: false,
            transition_requested: false,
        }
    }

    pub fn oscillating(period: f32) -> Self {
        Self::new(DriverMode::Oscillating { period })
    }

    pub fn one_shot(duration: f32, easing: Easing) -> Self {
        Self::new(DriverMode::OneShot { duration, easing })
    }

    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn resolved(&self) -> bool {
        self.resolved
    }

    pub fn transition_requested(&self) -> bool {
        self.transition_requested
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Freeze or resume progress. Frames keep rendering while paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.paused || dt.is_nan() || dt < 0.0 {
            return;
        }

        match self.mode {
            DriverMode::Oscillating { period } => self.tick_oscillating(dt, period),
            DriverMode::OneShot { duration, .. } => self.tick_one_shot(dt, duration),
        }
    }

    fn tick_oscillating(&mut self, dt: f32, period: f32) {
        self.elapsed += dt;
        let leg = leg_progress(self.elapsed, period);
        self.progress = match self.direction {
            Direction::Forward => leg,
            Direction::Backward => 1.0 - leg,
        };

        // Land exactly on the endpoint and drop the overshoot
        if leg >= 1.0 {
            self.elapsed = 0.0;
            self.direction = match self.direction {
                Direction::Forward => Direction::Backward,
                Direction::Backward => Direction::Forward,
            };
        }
    }

    fn tick_one_shot(&mut self, dt: f32, duration: f32) {
        if !self.transition_requested || self.resolved {
            return;
        }

        self.elapsed += dt;
        self.progress = leg_progress(self.elapsed, duration);

        if self.progress >= 1.0 {
            self.resolved = true;
            log::info!("transition resolved after {:.2}s", self.elapsed);
        }
    }

    /// Start the one-shot ramp.
    ///
    /// Returns `false` when nothing started: oscillating mode, a ramp already
    /// running, or already resolved.
    pub fn trigger(&mut self) -> bool {
        if !matches!(self.mode, DriverMode::OneShot { .. }) || self.transition_requested || self.resolved {
            return false;
        }
        self.transition_requested = true;
        self.elapsed = 0.0;
        log::info!("transition triggered");
        true
    }

    /// Feed the result of a frustum visibility test on the transition
    /// subject. Losing sight of it starts the one-shot ramp.
    pub fn observe_subject_visible(&mut self, visible: bool) {
        if !visible && !self.transition_requested && !self.resolved && self.trigger() {
            log::debug!("subject left the view");
        }
    }

    pub fn phase(&self) -> Phase {
        if self.resolved {
            Phase::ShowingB
        } else if self.transition_requested || matches!(self.mode, DriverMode::Oscillating { .. }) {
            Phase::Transitioning
        } else {
            Phase::ShowingA
        }
    }

    /// Value to feed the compositor's mix ratio.
    ///
    /// Oscillating feeds progress directly. One-shot feeds `1 - eased`, so the
    /// ramp starts on scene A and ends on scene B.
    pub fn mix_ratio(&self) -> f32 {
        match self.mode {
            DriverMode::Oscillating { .. } => self.progress,
            DriverMode::OneShot { easing, .. } => 1.0 - easing.apply(self.progress),
        }
    }

    pub fn route(&self) -> Route {
        match self.mode {
            DriverMode::Oscillating { .. } => Route::Composite,
            DriverMode::OneShot { .. } => match self.phase() {
                Phase::ShowingA => Route::Direct(Side::A),
                Phase::Transitioning => Route::Composite,
                Phase::ShowingB => Route::Direct(Side::B),
            },
        }
    }
}

/// Fraction of a leg of length `length` covered after `elapsed` seconds.
/// Non-positive lengths complete immediately.
fn leg_progress(elapsed: f32, length: f32) -> f32 {
    if length > 0.0 {
        (elapsed / length).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?}");
            assert_eq!(easing.apply(-3.0), 0.0);
            assert_eq!(easing.apply(4.0), 1.0);
        }
        assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn default_leg_lasts_3200_ms() {
        assert_eq!(DriverMode::default(), DriverMode::Oscillating { period: 3.2 });

        let mut driver = TransitionDriver::new(DriverMode::default());
        driver.tick(1.6);
        assert!((driver.progress() - 0.5).abs() < 1e-6);
        driver.tick(1.6);
        assert_eq!(driver.progress(), 1.0);
    }

    #[test]
    fn oscillation_hits_both_endpoints_exactly() {
        let mut driver = TransitionDriver::oscillating(1.0);
        let mut seen = Vec::new();
        // 0.3 does not divide the period, so every leg overshoots
        for _ in 0..8 {
            driver.tick(0.3);
            seen.push(driver.mix_ratio());
        }

        assert_eq!(seen[3], 1.0);
        assert_eq!(seen[7], 0.0);
        assert!(seen[4] > 0.0 && seen[4] < 1.0);
        assert!(seen.iter().all(|m| (0.0..=1.0).contains(m)));
    }

    #[test]
    fn oscillation_reverses_after_a_leg() {
        let mut driver = TransitionDriver::oscillating(2.0);
        driver.tick(1.0);
        assert_eq!(driver.progress(), 0.5);
        driver.tick(1.0);
        assert_eq!(driver.progress(), 1.0);
        driver.tick(0.5);
        assert_eq!(driver.progress(), 0.75);
    }

    #[test]
    fn oscillating_driver_ignores_trigger() {
        let mut driver = TransitionDriver::oscillating(1.0);
        assert!(!driver.trigger());
        driver.observe_subject_visible(false);
        assert!(!driver.transition_requested());
        assert_eq!(driver.route(), Route::Composite);
    }

    #[test]
    fn paused_driver_holds_progress() {
        let mut driver = TransitionDriver::oscillating(1.0);
        driver.tick(0.25);
        driver.set_paused(true);
        driver.tick(0.5);
        assert_eq!(driver.progress(), 0.25);
        driver.set_paused(false);
        driver.tick(0.25);
        assert_eq!(driver.progress(), 0.5);
    }

    #[test]
    fn one_shot_idles_before_trigger() {
        let mut driver = TransitionDriver::one_shot(1.0, Easing::Linear);
        for _ in 0..10 {
            driver.tick(0.5);
        }
        assert_eq!(driver.progress(), 0.0);
        assert_eq!(driver.mix_ratio(), 1.0);
        assert_eq!(driver.phase(), Phase::ShowingA);
        assert_eq!(driver.route(), Route::Direct(Side::A));
    }

    #[test]
    fn one_shot_ramps_to_scene_b_and_resolves() {
        let mut driver = TransitionDriver::one_shot(1.0, Easing::EaseInOut);
        assert!(driver.trigger());
        assert!(!driver.trigger());

        driver.tick(0.5);
        assert_eq!(driver.phase(), Phase::Transitioning);
        assert_eq!(driver.route(), Route::Composite);
        assert_eq!(driver.mix_ratio(), 0.5);

        driver.tick(0.75);
        assert!(driver.resolved());
        assert_eq!(driver.mix_ratio(), 0.0);
        assert_eq!(driver.route(), Route::Direct(Side::B));
    }

    #[test]
    fn losing_the_subject_triggers_the_ramp() {
        let mut driver = TransitionDriver::one_shot(1.0, Easing::Linear);
        driver.observe_subject_visible(true);
        driver.tick(0.5);
        assert!(!driver.transition_requested());

        driver.observe_subject_visible(false);
        assert!(driver.transition_requested());
        driver.tick(0.5);
        assert_eq!(driver.progress(), 0.5);
    }

    #[test]
    fn resolution_is_permanent() {
        let mut driver = TransitionDriver::one_shot(0.2, Easing::Linear);
        driver.trigger();
        driver.tick(1.0);
        assert!(driver.resolved());

        driver.observe_subject_visible(true);
        driver.observe_subject_visible(false);
        assert!(!driver.trigger());
        driver.tick(1.0);

        assert!(driver.resolved());
        assert_eq!(driver.phase(), Phase::ShowingB);
        assert_eq!(driver.mix_ratio(), 0.0);
    }

    #[test]
    fn zero_duration_resolves_on_first_tick() {
        let mut driver = TransitionDriver::one_shot(0.0, Easing::Linear);
        driver.trigger();
        driver.tick(0.0);
        assert!(driver.resolved());
    }
}
