//! Per-frame transition compositing decisions.
//!
//! The compositor decides, from the current mix ratio, which scene hosts
//! render and whether a blend draw is needed:
//!
//! | mix ratio     | scene A            | scene B            | blend |
//! |---------------|--------------------|--------------------|-------|
//! | `0`           | not rendered       | direct to screen   | no    |
//! | `1`           | direct to screen   | not rendered       | no    |
//! | `0 < m < 1`   | off-screen         | off-screen         | yes   |
//!
//! At rest only the visible scene pays its render cost.
//!
//! Rendering goes through the [`FrameSink`] trait so the decision logic runs
//! the same against the GPU and against a recording sink in tests.

use super::blend::BlendParams;
use crate::ecs::TextureId;
use crate::error::{Error, Result};

/// One of the two composited scenes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Where a scene host draws this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Into the host's own render target, for sampling later this frame.
    Offscreen,
    /// Straight to the output surface.
    Screen,
}

/// Receiver of the draw calls a frame issues, in order.
pub trait FrameSink {
    /// Render one scene host.
    fn render_scene(&mut self, side: Side, destination: Destination);

    /// Draw the full-screen blend of both hosts' targets to the output.
    ///
    /// Only called after both hosts rendered off-screen in the same frame.
    fn blend(&mut self, params: &BlendParams);
}

/// What a frame did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePlan {
    /// One scene rendered directly, no blend.
    Direct(Side),
    /// Both scenes off-screen, then one blend draw.
    Blend,
}

impl FramePlan {
    /// The plan for a given (already clamped) mix ratio.
    pub fn for_mix_ratio(mix_ratio: f32) -> Self {
        if mix_ratio <= 0.0 {
            FramePlan::Direct(Side::B)
        } else if mix_ratio >= 1.0 {
            FramePlan::Direct(Side::A)
        } else {
            FramePlan::Blend
        }
    }
}

/// Result of asking for a different mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskSwap {
    /// The mask changed immediately.
    Applied,
    /// A transition is in flight; the mask changes at the next boundary.
    Deferred,
}

/// Validate a wipe threshold.
pub fn check_threshold(threshold: f32) -> Result<f32> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(threshold)
    } else {
        Err(Error::InvalidThreshold(threshold))
    }
}

/// Blend state shared by every frame of a session.
#[derive(Debug)]
pub struct TransitionCompositor {
    mix_ratio: f32,
    threshold: f32,
    use_mask: bool,
    mask: TextureId,
    requested_mask: TextureId,
    pending_mask_swap: bool,
}

impl TransitionCompositor {
    /// Start at rest on scene B (`mix_ratio == 0`) with the given mask.
    pub fn new(mask: TextureId, threshold: f32) -> Result<Self> {
        Ok(Self {
            mix_ratio: 0.0,
            threshold: check_threshold(threshold)?,
            use_mask: true,
            mask,
            requested_mask: mask,
            pending_mask_swap: false,
        })
    }

    pub fn mix_ratio(&self) -> f32 {
        self.mix_ratio
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn use_mask(&self) -> bool {
        self.use_mask
    }

    /// The mask currently sampled by the blend.
    pub fn mask(&self) -> TextureId {
        self.mask
    }

    pub fn pending_mask_swap(&self) -> bool {
        self.pending_mask_swap
    }

    /// True when the mix ratio sits exactly on 0 or 1.
    pub fn at_boundary(&self) -> bool {
        self.mix_ratio == 0.0 || self.mix_ratio == 1.0
    }

    /// Set the mix ratio, clamped to `[0, 1]`. NaN counts as 0.
    ///
    /// Reaching a boundary applies a deferred mask swap.
    pub fn set_mix_ratio(&mut self, mix_ratio: f32) {
        self.mix_ratio = if mix_ratio.is_nan() {
            0.0
        } else {
            mix_ratio.clamp(0.0, 1.0)
        };
        self.settle_mask();
    }

    /// Change the wipe softness. Rejects zero, negative and non-finite values.
    pub fn set_threshold(&mut self, threshold: f32) -> Result<()> {
        self.threshold = check_threshold(threshold)?;
        Ok(())
    }

    /// Switch between the mask wipe and the plain crossfade.
    pub fn set_use_mask(&mut self, use_mask: bool) {
        self.use_mask = use_mask;
    }

    /// Ask for a different mask.
    ///
    /// At a boundary the mask changes now. Mid transition the request is
    /// remembered and applied when the mix ratio next reaches 0 or 1, so the
    /// wipe pattern never changes under a visible transition. A later request
    /// replaces an earlier pending one.
    pub fn request_mask(&mut self, mask: TextureId) -> MaskSwap {
        self.requested_mask = mask;
        if self.at_boundary() {
            self.settle_mask();
            MaskSwap::Applied
        } else {
            self.pending_mask_swap = self.requested_mask != self.mask;
            if self.pending_mask_swap {
                log::debug!("mask swap to {:?} deferred until boundary", mask);
            }
            MaskSwap::Deferred
        }
    }

    fn settle_mask(&mut self) {
        if !self.at_boundary() {
            return;
        }
        if self.requested_mask != self.mask {
            log::debug!("mask swapped {:?} -> {:?}", self.mask, self.requested_mask);
            self.mask = self.requested_mask;
        }
        self.pending_mask_swap = false;
    }

    /// Parameters the blend draw would use right now.
    pub fn blend_params(&self) -> BlendParams {
        BlendParams {
            mix_ratio: self.mix_ratio,
            threshold: self.threshold,
            use_mask: self.use_mask,
            mask: self.mask,
        }
    }

    /// Issue this frame's draws to `sink`.
    pub fn render<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> FramePlan {
        self.settle_mask();

        let plan = FramePlan::for_mix_ratio(self.mix_ratio);
        match plan {
            FramePlan::Direct(side) => sink.render_scene(side, Destination::Screen),
            FramePlan::Blend => {
                sink.render_scene(Side::A, Destination::Offscreen);
                sink.render_scene(Side::B, Destination::Offscreen);
                sink.blend(&self.blend_params());
            }
        }
        plan
    }
}

/// A [`FrameSink`] that records calls instead of drawing.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

#[cfg(test)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum SinkCall {
    Scene(Side, Destination),
    Blend(BlendParams),
}

#[cfg(test)]
impl RecordingSink {
    pub fn scene_renders(&self, side: Side) -> Vec<Destination> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Scene(s, d) if *s == side => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn blends(&self) -> Vec<BlendParams> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Blend(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl FrameSink for RecordingSink {
    fn render_scene(&mut self, side: Side, destination: Destination) {
        self.calls.push(SinkCall::Scene(side, destination));
    }

    fn blend(&mut self, params: &BlendParams) {
        self.calls.push(SinkCall::Blend(*params));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK_1: TextureId = TextureId(1);
    const MASK_2: TextureId = TextureId(2);

    fn compositor_at(mix: f32) -> TransitionCompositor {
        let mut c = TransitionCompositor::new(MASK_1, 0.1).unwrap();
        c.set_mix_ratio(mix);
        c
    }

    #[test]
    fn zero_renders_only_scene_b_directly() {
        let mut sink = RecordingSink::default();
        let plan = compositor_at(0.0).render(&mut sink);

        assert_eq!(plan, FramePlan::Direct(Side::B));
        assert_eq!(sink.calls, vec![SinkCall::Scene(Side::B, Destination::Screen)]);
        assert!(sink.scene_renders(Side::A).is_empty());
    }

    #[test]
    fn one_renders_only_scene_a_directly() {
        let mut sink = RecordingSink::default();
        let plan = compositor_at(1.0).render(&mut sink);

        assert_eq!(plan, FramePlan::Direct(Side::A));
        assert_eq!(sink.calls, vec![SinkCall::Scene(Side::A, Destination::Screen)]);
        assert!(sink.scene_renders(Side::B).is_empty());
    }

    #[test]
    fn midway_renders_both_offscreen_then_blends_once() {
        for mix in [0.001, 0.25, 0.5, 0.999] {
            let mut sink = RecordingSink::default();
            let plan = compositor_at(mix).render(&mut sink);

            assert_eq!(plan, FramePlan::Blend);
            assert_eq!(
                sink.calls[..2],
                [
                    SinkCall::Scene(Side::A, Destination::Offscreen),
                    SinkCall::Scene(Side::B, Destination::Offscreen),
                ]
            );
            assert_eq!(sink.scene_renders(Side::A), vec![Destination::Offscreen]);
            assert_eq!(sink.scene_renders(Side::B), vec![Destination::Offscreen]);
            assert_eq!(sink.blends().len(), 1);
            assert_eq!(sink.blends()[0].mix_ratio, mix);
            assert!(matches!(sink.calls.last(), Some(SinkCall::Blend(_))));
        }
    }

    #[test]
    fn mix_ratio_is_clamped() {
        let mut c = compositor_at(0.0);
        c.set_mix_ratio(1.7);
        assert_eq!(c.mix_ratio(), 1.0);
        c.set_mix_ratio(-0.3);
        assert_eq!(c.mix_ratio(), 0.0);
        c.set_mix_ratio(f32::NAN);
        assert_eq!(c.mix_ratio(), 0.0);
    }

    #[test]
    fn mask_request_at_rest_applies_immediately() {
        let mut c = compositor_at(0.0);
        assert_eq!(c.request_mask(MASK_2), MaskSwap::Applied);
        assert_eq!(c.mask(), MASK_2);
        assert!(!c.pending_mask_swap());
    }

    #[test]
    fn mask_swap_waits_for_the_next_boundary() {
        let mut c = compositor_at(0.0);
        let mut sink = RecordingSink::default();
        let mut swaps = 0;
        let mut seen = c.mask();
        let mut record = |c: &TransitionCompositor, swaps: &mut i32| {
            if c.mask() != seen {
                seen = c.mask();
                *swaps += 1;
            }
        };

        c.render(&mut sink);
        record(&c, &mut swaps);

        c.set_mix_ratio(0.5);
        assert_eq!(c.request_mask(MASK_2), MaskSwap::Deferred);
        c.render(&mut sink);
        record(&c, &mut swaps);
        assert_eq!(c.mask(), MASK_1);
        assert!(c.pending_mask_swap());
        assert_eq!(sink.blends().last().map(|p| p.mask), Some(MASK_1));

        c.set_mix_ratio(1.0);
        c.render(&mut sink);
        record(&c, &mut swaps);
        assert_eq!(c.mask(), MASK_2);
        assert!(!c.pending_mask_swap());

        c.set_mix_ratio(0.0);
        c.render(&mut sink);
        record(&c, &mut swaps);
        assert_eq!(c.mask(), MASK_2);

        assert_eq!(swaps, 1);
    }

    #[test]
    fn later_request_replaces_pending_one() {
        let mut c = compositor_at(0.4);
        c.request_mask(MASK_2);
        c.request_mask(TextureId(3));
        c.set_mix_ratio(0.0);
        assert_eq!(c.mask(), TextureId(3));
    }

    #[test]
    fn re_requesting_current_mask_mid_transition_is_not_pending() {
        let mut c = compositor_at(0.4);
        assert_eq!(c.request_mask(MASK_1), MaskSwap::Deferred);
        assert!(!c.pending_mask_swap());
    }

    #[test]
    fn threshold_must_be_positive_and_finite() {
        assert!(matches!(
            TransitionCompositor::new(MASK_1, 0.0),
            Err(Error::InvalidThreshold(_))
        ));
        let mut c = compositor_at(0.0);
        assert!(c.set_threshold(-1.0).is_err());
        assert!(c.set_threshold(f32::INFINITY).is_err());
        assert!(c.set_threshold(f32::NAN).is_err());
        assert_eq!(c.threshold(), 0.1);
        c.set_threshold(3.2).unwrap();
        assert_eq!(c.threshold(), 3.2);
    }

    #[test]
    fn crossfade_mode_is_forwarded_to_blend() {
        let mut c = compositor_at(0.5);
        c.set_use_mask(false);
        let mut sink = RecordingSink::default();
        c.render(&mut sink);
        assert!(!sink.blends()[0].use_mask);
    }
}
