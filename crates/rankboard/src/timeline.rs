//! Timed action sequences.
//!
//! A transition is planned up front as a [`Timeline`]: a flat list of
//! [`Step`]s, each an [`Action`] at an offset from the transition start.
//! Per-row chains (fade, slide, slide back) are written through a [`Track`],
//! which keeps a cursor the way an fx queue would.

use crate::row::RowKey;
use crate::surface::{Anchor, NodeId, Property, Target, Tween};

/// One surface mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Overlay a built proxy.
    Attach(NodeId),
    Stage { node: NodeId, anchor: Anchor },
    Reveal { node: NodeId, key: RowKey },
    Replace { old: NodeId, new: NodeId },
    Detach(NodeId),
    Style { target: Target, property: Property, value: f64 },
    Animate { target: Target, tween: Tween },
    Transitioning(bool),
}

impl Action {
    /// How long the action keeps running after it starts.
    pub fn duration_ms(&self) -> u64 {
        match self {
            Action::Animate { tween, .. } => tween.duration_ms,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Offset from the transition start.
    pub at_ms: u64,
    pub action: Action,
}

impl Step {
    pub fn end_ms(&self) -> u64 {
        self.at_ms + self.action.duration_ms()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    steps: Vec<Step>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at_ms: u64, action: Action) {
        self.steps.push(Step { at_ms, action });
    }

    pub fn animate(&mut self, at_ms: u64, target: Target, tween: Tween) {
        self.push(at_ms, Action::Animate { target, tween });
    }

    /// A sequential chain starting at `start_ms`.
    pub fn track(&mut self, start_ms: u64) -> Track<'_> {
        Track {
            timeline: self,
            cursor_ms: start_ms,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Instant the last action finishes, `0` when empty.
    pub fn end_ms(&self) -> u64 {
        self.steps.iter().map(Step::end_ms).max().unwrap_or(0)
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

/// Cursor over a timeline. `animate` and `pause` move the cursor; `with` and
/// `then` happen at the cursor.
pub struct Track<'a> {
    timeline: &'a mut Timeline,
    cursor_ms: u64,
}

impl Track<'_> {
    pub fn cursor_ms(&self) -> u64 {
        self.cursor_ms
    }

    /// Instant action at the cursor.
    pub fn then(&mut self, action: Action) -> &mut Self {
        self.timeline.push(self.cursor_ms, action);
        self
    }

    /// Tween starting at the cursor, running alongside the next one.
    pub fn with(&mut self, target: Target, tween: Tween) -> &mut Self {
        self.timeline.animate(self.cursor_ms, target, tween);
        self
    }

    /// Tween starting at the cursor; the cursor moves to its end.
    pub fn animate(&mut self, target: Target, tween: Tween) -> &mut Self {
        self.timeline.animate(self.cursor_ms, target, tween);
        self.cursor_ms += tween.duration_ms;
        self
    }

    pub fn pause(&mut self, ms: u64) -> &mut Self {
        self.cursor_ms += ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::TweenTo;

    fn fade(duration_ms: u64) -> Tween {
        Tween::new(Property::Opacity, TweenTo::Absolute(0.0), duration_ms)
    }

    #[test]
    fn track_chains_sequentially() {
        let node = NodeId(1);
        let mut timeline = Timeline::new();
        timeline
            .track(0)
            .with(Target::Cells(node), fade(100))
            .animate(Target::Row(node), fade(100))
            .pause(50)
            .animate(Target::Row(node), fade(200))
            .then(Action::Detach(node));

        let starts: Vec<u64> = timeline.steps().iter().map(|step| step.at_ms).collect();
        assert_eq!(starts, vec![0, 0, 150, 350]);
        assert_eq!(timeline.end_ms(), 350);
    }

    #[test]
    fn end_accounts_for_overlapping_tweens() {
        let mut timeline = Timeline::new();
        timeline.animate(0, Target::Row(NodeId(1)), fade(900));
        timeline.push(400, Action::Detach(NodeId(2)));
        assert_eq!(timeline.end_ms(), 900);
        assert_eq!(Timeline::new().end_ms(), 0);
    }
}
