//! Frame-level coordination of the driver and the compositor.

use super::compositor::{Destination, FramePlan, FrameSink, TransitionCompositor};
use super::driver::{Phase, Route, TransitionDriver};

/// Ties a [`TransitionDriver`] to a [`TransitionCompositor`].
///
/// Holds no GPU resources; a [`FrameSink`] receives the resulting draws.
#[derive(Debug)]
pub struct Director {
    compositor: TransitionCompositor,
    driver: TransitionDriver,
    last_phase: Phase,
}

impl Director {
    pub fn new(compositor: TransitionCompositor, driver: TransitionDriver) -> Self {
        let mut director = Self {
            last_phase: driver.phase(),
            compositor,
            driver,
        };
        director.sync();
        director
    }

    /// Advance the driver and hand its value to the compositor.
    pub fn update(&mut self, dt: f32) {
        self.driver.tick(dt);
        self.sync();

        let phase = self.driver.phase();
        if phase != self.last_phase {
            log::info!("transition phase {:?} -> {:?}", self.last_phase, phase);
            self.last_phase = phase;
        }
    }

    fn sync(&mut self) {
        self.compositor.set_mix_ratio(self.driver.mix_ratio());
    }

    /// Issue this frame's draws.
    ///
    /// A direct route skips the compositor entirely.
    pub fn render<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> FramePlan {
        match self.driver.route() {
            Route::Direct(side) => {
                sink.render_scene(side, Destination::Screen);
                FramePlan::Direct(side)
            }
            Route::Composite => self.compositor.render(sink),
        }
    }

    /// Start a one-shot transition. See [`TransitionDriver::trigger`].
    pub fn trigger(&mut self) -> bool {
        let started = self.driver.trigger();
        self.update(0.0);
        started
    }

    pub fn observe_subject_visible(&mut self, visible: bool) {
        self.driver.observe_subject_visible(visible);
    }

    pub fn compositor(&self) -> &TransitionCompositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut TransitionCompositor {
        &mut self.compositor
    }

    pub fn driver(&self) -> &TransitionDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut TransitionDriver {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::TextureId;
    use crate::scene::compositor::{RecordingSink, Side};
    use crate::scene::driver::Easing;

    fn one_shot(duration: f32) -> Director {
        Director::new(
            TransitionCompositor::new(TextureId(0), 0.1).unwrap(),
            TransitionDriver::one_shot(duration, Easing::Linear),
        )
    }

    #[test]
    fn idle_one_shot_shows_scene_a_only() {
        let mut director = one_shot(1.0);
        let mut sink = RecordingSink::default();

        director.update(0.016);
        assert_eq!(director.render(&mut sink), FramePlan::Direct(Side::A));
        assert!(sink.scene_renders(Side::B).is_empty());
        assert!(sink.blends().is_empty());
    }

    #[test]
    fn one_shot_blends_while_transitioning() {
        let mut director = one_shot(1.0);
        director.trigger();
        director.update(0.5);

        let mut sink = RecordingSink::default();
        assert_eq!(director.render(&mut sink), FramePlan::Blend);
        assert_eq!(sink.blends().len(), 1);
        assert_eq!(sink.blends()[0].mix_ratio, 0.5);
    }

    #[test]
    fn resolved_director_never_blends_again() {
        let mut director = one_shot(0.5);
        director.trigger();
        director.update(1.0);
        assert!(director.driver().resolved());

        let mut sink = RecordingSink::default();
        for _ in 0..20 {
            director.observe_subject_visible(false);
            director.trigger();
            director.update(0.1);
            assert_eq!(director.render(&mut sink), FramePlan::Direct(Side::B));
        }
        assert!(sink.blends().is_empty());
        assert!(sink.scene_renders(Side::A).is_empty());
    }

    #[test]
    fn oscillating_director_rests_on_both_scenes() {
        let mut director = Director::new(
            TransitionCompositor::new(TextureId(0), 0.1).unwrap(),
            TransitionDriver::oscillating(1.0),
        );
        let mut plans = Vec::new();
        for _ in 0..8 {
            director.update(0.3);
            plans.push(director.render(&mut RecordingSink::default()));
        }
        assert_eq!(plans[3], FramePlan::Direct(Side::A));
        assert_eq!(plans[7], FramePlan::Direct(Side::B));
        assert_eq!(plans[0], FramePlan::Blend);
    }

    #[test]
    fn deferred_mask_lands_when_oscillation_reaches_a_boundary() {
        let mut director = Director::new(
            TransitionCompositor::new(TextureId(0), 0.1).unwrap(),
            TransitionDriver::oscillating(1.0),
        );
        director.update(0.5);
        director.compositor_mut().request_mask(TextureId(1));
        assert_eq!(director.compositor().mask(), TextureId(0));

        director.update(0.6);
        assert_eq!(director.compositor().mix_ratio(), 1.0);
        assert_eq!(director.compositor().mask(), TextureId(1));
    }
}
