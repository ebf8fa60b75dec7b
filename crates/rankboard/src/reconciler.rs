//! Keyed reconciliation of a ranked list.
//!
//! A [`Reconciler`] owns a [`Surface`] and the [`Snapshot`] it shows. Each
//! update is classified against the snapshot, planned as one [`Timeline`]
//! and fed into a [`VirtualClock`]. Nothing happens until a driver moves the
//! clock with [`Reconciler::advance_by`] or [`Reconciler::run_to_end`];
//! steps due at the call instant run before `reconcile` returns.
//!
//! A moving row never moves itself. Its old node fades out in place, a keyless
//! proxy slides from the old slot to the new one (sideways, down or up,
//! sideways back), and a hidden, keyless copy of the new row waits at the
//! destination. When the proxy lands the old node is detached first, then
//! the copy is revealed with its key, so a key is never shown twice.

use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexMap;

use crate::classify::{classify, Classification, Plan, RowChange};
use crate::clock::VirtualClock;
use crate::config::{CompletionPolicy, ConfigError, OverlapPolicy, TransitionConfig};
use crate::row::{Row, RowError, RowKey};
use crate::snapshot::{Snapshot, Update};
use crate::surface::{
    Anchor, NodeId, Property, ProxyCell, ProxySpec, RowGeometry, Surface, SurfaceError, Target,
    Tween, TweenTo,
};
use crate::timeline::{Action, Timeline};

type OnDone = Box<dyn FnOnce(&ReconcileSummary)>;

/// The container does not look like the snapshot it should show.
#[derive(Debug, Clone, PartialEq)]
pub enum StaleContainer {
    /// Keyed rows on the surface differ from the snapshot at `position`.
    Drifted {
        position: usize,
        expected: Option<RowKey>,
        found: Option<RowKey>,
    },
    /// An update row has a different number of cells than the container's
    /// columns.
    ColumnMismatch {
        key: RowKey,
        expected: usize,
        found: usize,
    },
    /// No surface node is known for a snapshot key.
    MissingNode(RowKey),
}

impl fmt::Display for StaleContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = |key: &Option<RowKey>| {
            key.as_ref()
                .map_or_else(|| "nothing".to_string(), |key| format!("'{}'", key))
        };
        match self {
            StaleContainer::Drifted {
                position,
                expected,
                found,
            } => write!(
                f,
                "container row {} should be {} but is {}",
                position,
                key(expected),
                key(found)
            ),
            StaleContainer::ColumnMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "row '{}' has {} cells, the container has {} columns",
                key, found, expected
            ),
            StaleContainer::MissingNode(key) => write!(f, "no container node for row '{}'", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// A transition is running and the overlap policy is `reject`.
    Busy,
    Row(RowError),
    StaleContainer(StaleContainer),
    Surface(SurfaceError),
    Config(ConfigError),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Busy => write!(f, "a transition is already running"),
            ReconcileError::Row(error) => write!(f, "invalid rows: {}", error),
            ReconcileError::StaleContainer(stale) => write!(f, "stale container: {}", stale),
            ReconcileError::Surface(error) => write!(f, "{}", error),
            ReconcileError::Config(error) => write!(f, "invalid transition config: {}", error),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<RowError> for ReconcileError {
    fn from(error: RowError) -> Self {
        ReconcileError::Row(error)
    }
}

impl From<StaleContainer> for ReconcileError {
    fn from(stale: StaleContainer) -> Self {
        ReconcileError::StaleContainer(stale)
    }
}

impl From<SurfaceError> for ReconcileError {
    fn from(error: SurfaceError) -> Self {
        ReconcileError::Surface(error)
    }
}

impl From<ConfigError> for ReconcileError {
    fn from(error: ConfigError) -> Self {
        ReconcileError::Config(error)
    }
}

/// What a completed reconciliation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub moved_up: usize,
    pub moved_down: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub inserted: usize,
    pub removed: usize,
    pub started_at_ms: u64,
    pub completed_at_ms: u64,
}

impl ReconcileSummary {
    fn from_plan(plan: &Plan, started_at_ms: u64) -> Self {
        Self {
            moved_up: plan.count(Classification::MovedUp),
            moved_down: plan.count(Classification::MovedDown),
            changed: plan.count(Classification::ChangedInPlace),
            unchanged: plan.count(Classification::Unchanged),
            inserted: plan.count(Classification::Inserted),
            removed: plan.count(Classification::Removed),
            started_at_ms,
            completed_at_ms: started_at_ms,
        }
    }

    pub fn moved(&self) -> usize {
        self.moved_up + self.moved_down
    }

    pub fn duration_ms(&self) -> u64 {
        self.completed_at_ms - self.started_at_ms
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} up, {} down, {} changed, {} unchanged, {} inserted, {} removed in {} ms",
            self.moved_up,
            self.moved_down,
            self.changed,
            self.unchanged,
            self.inserted,
            self.removed,
            self.duration_ms()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Steps are scheduled; completion fires at `completes_at_ms`.
    Started { completes_at_ms: u64 },
    /// Nothing to animate. Completion already fired.
    Completed(ReconcileSummary),
    /// Waiting behind `position` earlier updates (0 = next).
    Queued { position: usize },
}

#[derive(Debug, Clone)]
enum Scheduled {
    Run(Action),
    Complete,
}

struct Transition {
    next: Snapshot,
    next_nodes: IndexMap<RowKey, NodeId>,
    summary: ReconcileSummary,
    on_done: Option<OnDone>,
}

struct QueuedUpdate {
    update: Update,
    on_done: Option<OnDone>,
}

/// Completion callbacks that are due but not yet called.
///
/// A reconciler built with [`Reconciler::defer_callbacks`] hands these out
/// through [`Reconciler::take_callbacks`] instead of calling them itself, so
/// a caller sharing the reconciler behind a `RefCell` can release its borrow
/// first and let the callbacks reconcile again.
#[must_use]
pub struct Callbacks(Vec<(OnDone, ReconcileSummary)>);

impl Callbacks {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Call every callback in completion order.
    pub fn deliver(self) {
        for (on_done, summary) in self.0 {
            on_done(&summary);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(_, summary)| summary)).finish()
    }
}

pub struct Reconciler<S: Surface> {
    surface: S,
    config: TransitionConfig,
    snapshot: Snapshot,
    nodes: IndexMap<RowKey, NodeId>,
    clock: VirtualClock<Scheduled>,
    active: Option<Transition>,
    queued: VecDeque<QueuedUpdate>,
    finished: Vec<ReconcileSummary>,
    callbacks: Vec<(OnDone, ReconcileSummary)>,
    deliver_inline: bool,
    /// First queued update that failed to start since the last report.
    failed: Option<ReconcileError>,
}

impl<S: Surface> Reconciler<S> {
    /// Take over a container, reading the rows it already shows.
    pub fn new(mut surface: S, config: TransitionConfig) -> Result<Self, ReconcileError> {
        config.validate()?;
        let rows = surface.read_rows()?;
        let nodes = rows
            .iter()
            .map(|(node, row)| (row.key().clone(), *node))
            .collect();
        let snapshot = Snapshot::from_rows(rows.into_iter().map(|(_, row)| row))?;
        log::debug!("reconciler attached to {} rows", snapshot.len());
        Ok(Self {
            surface,
            config,
            snapshot,
            nodes,
            clock: VirtualClock::new(),
            active: None,
            queued: VecDeque::new(),
            finished: Vec::new(),
            callbacks: Vec::new(),
            deliver_inline: true,
            failed: None,
        })
    }

    /// Keep completion callbacks until [`take_callbacks`](Self::take_callbacks)
    /// instead of calling them before `reconcile`, `advance_by` or
    /// `run_to_end` return.
    pub fn defer_callbacks(mut self) -> Self {
        self.deliver_inline = false;
        self
    }

    pub fn take_callbacks(&mut self) -> Callbacks {
        Callbacks(std::mem::take(&mut self.callbacks))
    }

    pub fn reconcile(&mut self, update: Update) -> Result<Outcome, ReconcileError> {
        self.submit(update, None)
    }

    /// Like [`reconcile`](Self::reconcile), calling `on_done` exactly once
    /// when the transition completes.
    pub fn reconcile_with(
        &mut self,
        update: Update,
        on_done: impl FnOnce(&ReconcileSummary) + 'static,
    ) -> Result<Outcome, ReconcileError> {
        self.submit(update, Some(Box::new(on_done)))
    }

    fn submit(&mut self, update: Update, on_done: Option<OnDone>) -> Result<Outcome, ReconcileError> {
        if self.is_busy() {
            return match self.config.overlap {
                OverlapPolicy::Reject => {
                    log::warn!(
                        "update of {} rows rejected: a transition is still running",
                        update.len()
                    );
                    Err(ReconcileError::Busy)
                }
                OverlapPolicy::Queue => {
                    let position = self.queued.len();
                    self.queued.push_back(QueuedUpdate { update, on_done });
                    log::debug!("update queued at position {}", position);
                    Ok(Outcome::Queued { position })
                }
            };
        }
        let result = self.start(update, on_done).and_then(|outcome| {
            let now = self.clock.now_ms();
            self.run_until(now).map(|()| outcome)
        });
        self.deliver_callbacks();
        result
    }

    /// Advance virtual time, running every step that falls due. Returns the
    /// transitions that completed, in order.
    ///
    /// A queued update that fails to start is dropped and the queue moves on;
    /// the error is returned once time has fully advanced, and the
    /// completions of that call are returned by the next one.
    pub fn advance_by(&mut self, ms: u64) -> Result<Vec<ReconcileSummary>, ReconcileError> {
        let target = self.clock.now_ms() + ms;
        let result = self.run_until(target);
        if result.is_ok() {
            self.clock.advance_to(target);
            self.surface.frame(target);
        }
        self.finish(result)
    }

    /// Run every scheduled step, queued updates included.
    pub fn run_to_end(&mut self) -> Result<Vec<ReconcileSummary>, ReconcileError> {
        let result = self.run_until(u64::MAX);
        self.finish(result)
    }

    fn finish(&mut self, result: Result<(), ReconcileError>) -> Result<Vec<ReconcileSummary>, ReconcileError> {
        self.deliver_callbacks();
        result?;
        if let Some(error) = self.failed.take() {
            return Err(error);
        }
        Ok(std::mem::take(&mut self.finished))
    }

    fn deliver_callbacks(&mut self) {
        if self.deliver_inline {
            self.take_callbacks().deliver();
        }
    }

    /// Virtual time until the next scheduled step, `None` when idle.
    pub fn time_to_next_step(&self) -> Option<u64> {
        self.clock.time_to_next()
    }

    /// A transition is running or updates are queued.
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.queued.is_empty()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Rows as of the last completed transition.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn run_until(&mut self, until_ms: u64) -> Result<(), ReconcileError> {
        while let Some((at_ms, scheduled)) = self.clock.next_due(until_ms) {
            self.surface.frame(at_ms);
            match scheduled {
                Scheduled::Run(action) => self.apply(action, at_ms)?,
                Scheduled::Complete => self.complete(),
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: Action, at_ms: u64) -> Result<(), SurfaceError> {
        log::trace!("t={} {:?}", at_ms, action);
        match action {
            Action::Attach(proxy) => self.surface.attach(proxy),
            Action::Stage { node, anchor } => self.surface.stage(node, anchor),
            Action::Reveal { node, key } => self.surface.reveal(node, &key),
            Action::Replace { old, new } => self.surface.replace(old, new),
            Action::Detach(node) => self.surface.detach(node),
            Action::Style {
                target,
                property,
                value,
            } => self.surface.set_style(target, property, value),
            Action::Animate { target, tween } => self.surface.animate(target, &tween, at_ms),
            Action::Transitioning(on) => self.surface.set_transitioning(on),
        }
    }

    fn complete(&mut self) {
        let Some(transition) = self.active.take() else {
            return;
        };
        let mut summary = transition.summary;
        summary.completed_at_ms = self.clock.now_ms();
        self.snapshot = transition.next;
        self.nodes = transition.next_nodes;
        log::debug!("transition complete: {}", summary);
        if let Some(on_done) = transition.on_done {
            self.callbacks.push((on_done, summary));
        }
        self.finished.push(summary);

        while let Some(QueuedUpdate { update, on_done }) = self.queued.pop_front() {
            match self.start(update, on_done) {
                Ok(Outcome::Completed(summary)) => self.finished.push(summary),
                Ok(_) => break,
                Err(error) => {
                    log::warn!("queued update dropped: {}", error);
                    if self.failed.is_none() {
                        self.failed = Some(error);
                    }
                }
            }
        }
    }

    /// Re-read the container. Keys must match the snapshot in order; cell
    /// content is taken from the container.
    fn resync(&mut self) -> Result<(), ReconcileError> {
        let rows = self.surface.read_rows()?;
        {
            let expected: Vec<&RowKey> = self.snapshot.keys().collect();
            for position in 0..rows.len().max(expected.len()) {
                let found = rows.get(position).map(|(_, row)| row.key());
                let wanted = expected.get(position).copied();
                if found != wanted {
                    return Err(StaleContainer::Drifted {
                        position,
                        expected: wanted.cloned(),
                        found: found.cloned(),
                    }
                    .into());
                }
            }
        }
        self.nodes = rows
            .iter()
            .map(|(node, row)| (row.key().clone(), *node))
            .collect();
        self.snapshot = Snapshot::from_rows(rows.into_iter().map(|(_, row)| row))?;
        Ok(())
    }

    fn check_columns(&self, update: &Update) -> Result<(), StaleContainer> {
        let Some(expected) = self.snapshot.column_count() else {
            return Ok(());
        };
        match update.rows().find(|row| row.cell_count() != expected) {
            Some(row) => Err(StaleContainer::ColumnMismatch {
                key: row.key().clone(),
                expected,
                found: row.cell_count(),
            }),
            None => Ok(()),
        }
    }

    fn node_of(&self, key: &RowKey) -> Result<NodeId, StaleContainer> {
        self.nodes
            .get(key)
            .copied()
            .ok_or_else(|| StaleContainer::MissingNode(key.clone()))
    }

    fn tween(&self, property: Property, to: TweenTo) -> Tween {
        Tween::new(property, to, self.config.duration_ms).with_easing(self.config.easing)
    }

    /// Steps still pending from a transition that already completed (the
    /// cascade under a fixed budget) run now, before anything new is planned.
    fn flush_leftovers(&mut self) -> Result<(), ReconcileError> {
        let now = self.clock.now_ms();
        let leftovers = self.clock.drain();
        if !leftovers.is_empty() {
            log::debug!("flushing {} leftover steps at t={}", leftovers.len(), now);
        }
        for (_, scheduled) in leftovers {
            if let Scheduled::Run(action) = scheduled {
                self.apply(action, now)?;
            }
        }
        Ok(())
    }

    fn start(&mut self, update: Update, on_done: Option<OnDone>) -> Result<Outcome, ReconcileError> {
        self.flush_leftovers()?;
        self.resync()?;
        self.check_columns(&update)?;

        let plan = classify(&self.snapshot, &update);
        let now = self.clock.now_ms();
        let summary = ReconcileSummary::from_plan(&plan, now);

        if plan.is_noop() {
            log::debug!("update of {} rows changes nothing", update.len());
            self.snapshot = update.into_snapshot();
            if let Some(on_done) = on_done {
                self.callbacks.push((on_done, summary));
            }
            return Ok(Outcome::Completed(summary));
        }

        let (timeline, next_nodes, complete_at) = self.plan_transition(&plan, &update)?;
        log::debug!(
            "transition at t={}: {} moved, {} changed, {} inserted, {} removed, {} steps, completes at +{} ms",
            now,
            summary.moved(),
            summary.changed,
            summary.inserted,
            summary.removed,
            timeline.len(),
            complete_at
        );

        for step in timeline.into_steps() {
            self.clock.schedule_at(now + step.at_ms, Scheduled::Run(step.action));
        }
        self.clock.schedule_at(now + complete_at, Scheduled::Complete);
        self.active = Some(Transition {
            next: update.into_snapshot(),
            next_nodes,
            summary,
            on_done,
        });
        Ok(Outcome::Started {
            completes_at_ms: now + complete_at,
        })
    }

    /// Every step of a transition, relative to its start, plus the node of
    /// every key once it completes and the completion offset.
    fn plan_transition(
        &mut self,
        plan: &Plan,
        update: &Update,
    ) -> Result<(Timeline, IndexMap<RowKey, NodeId>, u64), ReconcileError> {
        let duration = self.config.duration_ms;
        let old_order = self
            .snapshot
            .keys()
            .map(|key| self.node_of(key))
            .collect::<Result<Vec<_>, _>>()?;
        // A row entering at index i goes right after the node now at i.
        let anchor = |index: usize| old_order.get(index).copied().map_or(Anchor::End, Anchor::After);

        let mut timeline = Timeline::new();
        timeline.push(0, Action::Transitioning(true));
        let mut next_nodes = IndexMap::with_capacity(update.len());
        let mut inserted = Vec::new();

        for change in plan.changes() {
            let key = &change.key;
            if change.class == Classification::Removed {
                let old = self.node_of(key)?;
                timeline.animate(0, Target::Cells(old), self.tween(Property::Opacity, TweenTo::Absolute(0.0)));
                timeline.push(duration, Action::Detach(old));
                continue;
            }
            let row = update
                .get(key)
                .ok_or_else(|| StaleContainer::MissingNode(key.clone()))?;
            let new_index = change.new_index.unwrap_or_default();

            let node = match change.class {
                Classification::Unchanged => self.node_of(key)?,
                Classification::ChangedInPlace => {
                    let old = self.node_of(key)?;
                    let new = self.surface.build_row(row)?;
                    timeline.animate(
                        0,
                        Target::MutableCells(old),
                        self.tween(Property::Opacity, TweenTo::Absolute(0.0)),
                    );
                    timeline.push(
                        duration,
                        Action::Style {
                            target: Target::MutableCells(new),
                            property: Property::Opacity,
                            value: 0.0,
                        },
                    );
                    timeline.push(duration, Action::Replace { old, new });
                    new
                }
                Classification::MovedUp | Classification::MovedDown => {
                    let old = self.node_of(key)?;
                    self.plan_move(&mut timeline, change, row, old, anchor(new_index))?
                }
                Classification::Inserted => {
                    let new = self.surface.build_row(row)?;
                    timeline.push(
                        0,
                        Action::Stage {
                            node: new,
                            anchor: anchor(new_index),
                        },
                    );
                    timeline.push(
                        0,
                        Action::Style {
                            target: Target::Cells(new),
                            property: Property::Opacity,
                            value: 0.0,
                        },
                    );
                    inserted.push((new, key.clone()));
                    new
                }
                Classification::Removed => continue,
            };
            next_nodes.insert(key.clone(), node);
        }

        let settle = match self.config.completion {
            CompletionPolicy::Derived => timeline.end_ms(),
            CompletionPolicy::FixedBudget => self.config.move_budget_ms(),
        };
        timeline.push(settle, Action::Transitioning(false));
        for (node, key) in inserted {
            timeline.push(settle, Action::Reveal { node, key });
        }
        for change in plan.changes() {
            let (Some(index), Some(node)) = (change.new_index, next_nodes.get(&change.key)) else {
                continue;
            };
            let target = match change.class {
                Classification::Unchanged => continue,
                Classification::Inserted => Target::Cells(*node),
                _ => Target::MutableCells(*node),
            };
            timeline.animate(
                settle + index as u64 * self.config.stagger_ms,
                target,
                self.tween(Property::Opacity, TweenTo::Absolute(1.0)),
            );
        }

        let complete_at = match self.config.completion {
            CompletionPolicy::Derived => timeline.end_ms(),
            CompletionPolicy::FixedBudget => settle,
        };
        Ok((timeline, next_nodes, complete_at))
    }

    /// Plan one moving row and return the node that replaces it.
    fn plan_move(
        &mut self,
        timeline: &mut Timeline,
        change: &RowChange,
        row: &Row,
        old: NodeId,
        anchor: Anchor,
    ) -> Result<NodeId, ReconcileError> {
        let up = change.class == Classification::MovedUp;
        let geometry = self.surface.measure(old)?;
        let destination = self
            .surface
            .measure_slot(change.new_index.unwrap_or_default())?;
        let proxy = self.surface.build_proxy(&self.proxy_spec(row, &geometry, up))?;
        let new = self.surface.build_row(row)?;
        let offset = if up {
            self.config.lateral_offset_px
        } else {
            -self.config.lateral_offset_px
        };

        let fade_out = self.tween(Property::Opacity, TweenTo::Absolute(0.0));
        timeline.animate(0, Target::MutableCells(old), fade_out);
        timeline.animate(0, Target::Cells(old), fade_out);
        timeline.push(
            0,
            Action::Style {
                target: Target::Row(proxy),
                property: Property::Opacity,
                value: 0.0,
            },
        );
        timeline.push(0, Action::Attach(proxy));
        timeline.push(0, Action::Stage { node: new, anchor });
        timeline.push(
            0,
            Action::Style {
                target: Target::MutableCells(new),
                property: Property::Opacity,
                value: 0.0,
            },
        );

        let pause = self.config.pause_ms();
        timeline
            .track(0)
            .with(Target::Row(proxy), self.tween(Property::Opacity, TweenTo::Absolute(1.0)))
            .animate(Target::Row(proxy), self.tween(Property::Left, TweenTo::By(offset)))
            .pause(pause)
            .animate(
                Target::Row(proxy),
                self.tween(Property::Top, TweenTo::Absolute(destination.top)),
            )
            .pause(pause)
            .with(Target::Indicator(proxy), fade_out)
            .animate(Target::Row(proxy), self.tween(Property::Left, TweenTo::By(-offset)))
            .then(Action::Detach(old))
            .then(Action::Reveal {
                node: new,
                key: row.key().clone(),
            })
            .then(Action::Detach(proxy));
        Ok(new)
    }

    /// The new row's cells laid over the old row's columns, mutable cells
    /// blank, the indicator cell showing the direction.
    fn proxy_spec(&self, row: &Row, geometry: &RowGeometry, up: bool) -> ProxySpec {
        let icon = if up {
            &self.config.up_icon
        } else {
            &self.config.down_icon
        };
        let indicator = self.config.indicator_cell;
        let cells = row
            .cells()
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let column = geometry.cells.get(index).copied().unwrap_or_default();
                let html = if index == indicator {
                    format!("<i class=\"{}\"></i>", icon)
                } else if cell.mutable {
                    String::new()
                } else {
                    cell.html.clone()
                };
                ProxyCell {
                    class: cell.class.clone(),
                    html,
                    left: column.left,
                    width: column.width,
                }
            })
            .collect();
        ProxySpec {
            rect: geometry.rect,
            cells,
            indicator: (indicator < row.cell_count()).then_some(indicator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemorySurface;
    use crate::row::Cell;

    fn row(key: &str, score: &str) -> Row {
        Row::new(
            RowKey::new(key).unwrap(),
            [Cell::mutable("0"), Cell::new(key), Cell::mutable(score)],
        )
        .unwrap()
    }

    fn reconciler(keys: &[&str]) -> Reconciler<MemorySurface> {
        let snapshot = Snapshot::from_rows(keys.iter().map(|key| row(key, "0"))).unwrap();
        Reconciler::new(MemorySurface::from_snapshot(&snapshot), TransitionConfig::default()).unwrap()
    }

    fn update(rows: &[(&str, &str)]) -> Update {
        Update::from_rows(rows.iter().map(|(key, score)| row(key, score))).unwrap()
    }

    #[test]
    fn swap_completes_after_cascade() {
        let mut reconciler = reconciler(&["a", "b"]);
        let outcome = reconciler.reconcile(update(&[("b", "0"), ("a", "0")])).unwrap();
        // 3 * 1200 + 2 * 400, then the second row's fade: 100 + 1200
        assert_eq!(outcome, Outcome::Started { completes_at_ms: 5700 });
        assert!(reconciler.surface().is_transitioning());
        assert_eq!(reconciler.surface().proxy_count(), 2);

        let done = reconciler.run_to_end().unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].moved_up, 1);
        assert_eq!(done[0].moved_down, 1);
        assert_eq!(done[0].completed_at_ms, 5700);
        assert!(!reconciler.is_busy());
        assert!(!reconciler.surface().is_transitioning());
    }

    #[test]
    fn proxy_shows_direction_and_hides_scores() {
        let reconciler = reconciler(&["a", "b"]);
        let geometry = reconciler.surface().measure(NodeId(1)).unwrap();
        let spec = reconciler.proxy_spec(&row("a", "9"), &geometry, true);
        assert_eq!(spec.indicator, Some(1));
        assert_eq!(spec.cells[0].html, "");
        assert_eq!(spec.cells[1].html, "<i class=\"fa fa-arrow-circle-up text-success\"></i>");
        assert_eq!(spec.cells[2].html, "");
        assert_eq!(spec.cells[2].left, geometry.cells[2].left);
    }

    #[test]
    fn drifted_container_is_reported() {
        let mut reconciler = reconciler(&["a", "b"]);
        reconciler.surface_mut().remove_row(&RowKey::new("a").unwrap());
        let error = reconciler.reconcile(update(&[("b", "1")])).unwrap_err();
        assert!(matches!(
            error,
            ReconcileError::StaleContainer(StaleContainer::Drifted { position: 0, .. })
        ));
        assert!(!reconciler.is_busy());
    }

    #[test]
    fn column_mismatch_is_reported() {
        let mut reconciler = reconciler(&["a"]);
        let narrow = Update::from_rows([Row::new(RowKey::new("a").unwrap(), [Cell::new("x")]).unwrap()])
            .unwrap();
        assert_eq!(
            reconciler.reconcile(narrow),
            Err(ReconcileError::StaleContainer(StaleContainer::ColumnMismatch {
                key: RowKey::new("a").unwrap(),
                expected: 3,
                found: 1,
            }))
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TransitionConfig {
            duration_ms: 0,
            ..TransitionConfig::default()
        };
        assert!(matches!(
            Reconciler::new(MemorySurface::new(), config),
            Err(ReconcileError::Config(ConfigError::ZeroDuration))
        ));
    }
}
