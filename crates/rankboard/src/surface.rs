//! Rendering boundary.
//!
//! A [`Surface`] is the container a [`Reconciler`](crate::Reconciler) owns for
//! its whole life: a `<tbody>` in the browser, a plain vector of nodes in
//! [`MemorySurface`](crate::MemorySurface). The reconciler never touches
//! layout itself. It measures through the surface, creates detached rows and
//! proxies through it, and hands it timed style tweens to run.
//!
//! Timing belongs to the clock, not to the surface: `animate` only starts a
//! tween, and `frame` tells the surface what time it is.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::row::{Row, RowKey};

/// Handle of a node created or discovered by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a staged row enters the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Immediately after this attached node.
    After(NodeId),
    /// After every row.
    End,
}

/// Part of a node a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The node itself.
    Row(NodeId),
    /// Every cell of the node.
    Cells(NodeId),
    /// Only the cells declared mutable.
    MutableCells(NodeId),
    /// The direction icon cell of a proxy.
    Indicator(NodeId),
}

impl Target {
    pub fn node(&self) -> NodeId {
        match *self {
            Target::Row(node)
            | Target::Cells(node)
            | Target::MutableCells(node)
            | Target::Indicator(node) => node,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    /// Horizontal position in px.
    Left,
    /// Vertical position in px.
    Top,
}

impl Property {
    /// CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            Property::Opacity => "opacity",
            Property::Left => "left",
            Property::Top => "top",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTo {
    Absolute(f64),
    /// Relative to the value at the start of the tween.
    By(f64),
}

impl TweenTo {
    pub fn resolve(self, from: f64) -> f64 {
        match self {
            TweenTo::Absolute(to) => to,
            TweenTo::By(delta) => from + delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    #[default]
    Linear,
    /// jQuery's default curve: `0.5 - cos(p * PI) / 2`.
    Swing,
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve.
    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Easing::Linear => p,
            Easing::Swing => 0.5 - (p * PI).cos() / 2.0,
        }
    }

    /// CSS `transition-timing-function` value.
    pub fn css_name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Swing => "ease-in-out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub property: Property,
    pub to: TweenTo,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(property: Property, to: TweenTo, duration_ms: u64) -> Self {
        Self {
            property,
            to,
            duration_ms,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value at `elapsed_ms` into the tween.
    pub fn sample(&self, from: f64, elapsed_ms: u64) -> f64 {
        let to = self.to.resolve(from);
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return to;
        }
        let progress = self.easing.apply(elapsed_ms as f64 / self.duration_ms as f64);
        from + (to - from) * progress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Position of an attached row and of each of its cells. Cell rects are
/// relative to the row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowGeometry {
    pub rect: Rect,
    pub cells: SmallVec<[Rect; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyCell {
    pub class: String,
    pub html: String,
    pub left: f64,
    pub width: f64,
}

/// Absolutely positioned stand-in for a moving row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySpec {
    pub rect: Rect,
    pub cells: Vec<ProxyCell>,
    /// Cell holding the direction icon, if any.
    pub indicator: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    UnknownNode(NodeId),
    /// The node exists but is not part of the container.
    NotAttached(NodeId),
    /// Backend-specific failure (DOM exception, missing element).
    Backend(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::UnknownNode(node) => write!(f, "unknown node {}", node),
            SurfaceError::NotAttached(node) => write!(f, "node {} is not attached", node),
            SurfaceError::Backend(message) => write!(f, "surface error: {}", message),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The container of a ranked list.
pub trait Surface {
    /// Keyed rows currently attached, in display order. Rows whose key
    /// attribute is stripped (staged rows) and proxies are skipped.
    fn read_rows(&mut self) -> Result<Vec<(NodeId, Row)>, SurfaceError>;

    /// Geometry of an attached, visible row.
    fn measure(&self, node: NodeId) -> Result<RowGeometry, SurfaceError>;

    /// Rect of the `index`-th visible row slot. Slots past the last row are
    /// extrapolated downwards.
    fn measure_slot(&self, index: usize) -> Result<Rect, SurfaceError>;

    /// Create a detached row carrying its key.
    fn build_row(&mut self, row: &Row) -> Result<NodeId, SurfaceError>;

    /// Create a detached proxy. It carries no key.
    fn build_proxy(&mut self, spec: &ProxySpec) -> Result<NodeId, SurfaceError>;

    /// Put a proxy above the container's rows.
    fn attach(&mut self, proxy: NodeId) -> Result<(), SurfaceError>;

    /// Insert a detached row hidden, with its key attribute stripped.
    fn stage(&mut self, node: NodeId, anchor: Anchor) -> Result<(), SurfaceError>;

    /// Show a staged row and give it its key back.
    fn reveal(&mut self, node: NodeId, key: &RowKey) -> Result<(), SurfaceError>;

    /// Swap an attached row for a detached one in the same slot.
    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), SurfaceError>;

    /// Remove a row or proxy from the container and forget it.
    fn detach(&mut self, node: NodeId) -> Result<(), SurfaceError>;

    fn set_style(&mut self, target: Target, property: Property, value: f64) -> Result<(), SurfaceError>;

    /// Start a tween at `now_ms`, from the target's current value.
    fn animate(&mut self, target: Target, tween: &Tween, now_ms: u64) -> Result<(), SurfaceError>;

    /// Toggle the container's "rows are moving" state.
    fn set_transitioning(&mut self, on: bool) -> Result<(), SurfaceError>;

    /// Called before every batch of actions with the current virtual time.
    fn frame(&mut self, _now_ms: u64) {}
}
