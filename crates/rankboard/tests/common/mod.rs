//! Shared helpers for reconciler tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use rankboard::{
    Cell, MemorySurface, ReconcileSummary, Reconciler, Row, RowKey, Snapshot, TransitionConfig, Update,
};

pub fn key(raw: &str) -> RowKey {
    RowKey::new(raw).unwrap()
}

/// Scoreboard row `[rank, name, score]`, rank and score mutable.
pub fn row(name: &str, rank: usize, score: u32) -> Row {
    Row::new(
        key(name),
        [
            Cell::mutable(rank.to_string()).with_class("sb-rank sb-update"),
            Cell::new(name).with_class("sb-name"),
            Cell::mutable(score.to_string()).with_class("sb-score sb-update"),
        ],
    )
    .unwrap()
}

/// Rows in display order, ranked by position.
pub fn rows(entries: &[(&str, u32)]) -> Vec<Row> {
    entries
        .iter()
        .enumerate()
        .map(|(index, (name, score))| row(name, index + 1, *score))
        .collect()
}

pub fn update(entries: &[(&str, u32)]) -> Update {
    Update::from_rows(rows(entries)).unwrap()
}

pub fn surface(entries: &[(&str, u32)]) -> MemorySurface {
    MemorySurface::from_snapshot(&Snapshot::from_rows(rows(entries)).unwrap())
}

pub fn reconciler(entries: &[(&str, u32)]) -> Reconciler<MemorySurface> {
    reconciler_with(entries, TransitionConfig::default())
}

pub fn reconciler_with(entries: &[(&str, u32)], config: TransitionConfig) -> Reconciler<MemorySurface> {
    Reconciler::new(surface(entries), config).unwrap()
}

pub fn names(keys: &[RowKey]) -> Vec<&str> {
    keys.iter().map(RowKey::as_str).collect()
}

pub fn visible(reconciler: &Reconciler<MemorySurface>) -> Vec<String> {
    reconciler
        .surface()
        .visible_keys()
        .iter()
        .map(|key| key.as_str().to_string())
        .collect()
}

/// Collects completion callbacks.
#[derive(Clone, Default)]
pub struct Completions(Rc<RefCell<Vec<ReconcileSummary>>>);

impl Completions {
    pub fn callback(&self) -> impl FnOnce(&ReconcileSummary) + 'static {
        let seen = self.0.clone();
        move |summary: &ReconcileSummary| seen.borrow_mut().push(*summary)
    }

    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn all(&self) -> Vec<ReconcileSummary> {
        self.0.borrow().clone()
    }
}

/// Advance in `step_ms` increments until nothing is scheduled, checking the
/// surface after every step. Returns every completed summary.
pub fn step_through(
    reconciler: &mut Reconciler<MemorySurface>,
    step_ms: u64,
    mut check: impl FnMut(&MemorySurface),
) -> Vec<ReconcileSummary> {
    let mut done = Vec::new();
    check(reconciler.surface());
    while reconciler.time_to_next_step().is_some() {
        done.extend(reconciler.advance_by(step_ms).unwrap());
        check(reconciler.surface());
    }
    done
}

pub fn assert_unique_keys(surface: &MemorySurface) {
    let keys = surface.attached_keys();
    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(
        unique.len(),
        keys.len(),
        "duplicate key at t={}: {:?}",
        surface.now_ms(),
        names(&keys)
    );
}

/// The board shows `expected` exactly: order, content, fully opaque.
pub fn assert_settled(reconciler: &Reconciler<MemorySurface>, expected: &Update) {
    let surface = reconciler.surface();
    let shown = surface.shown_rows();
    let shown_keys: Vec<_> = shown.iter().map(|shown| shown.key.clone()).collect();
    let expected_keys: Vec<_> = expected.keys().cloned().collect();
    assert_eq!(shown_keys, expected_keys);
    for (shown, row) in shown.iter().zip(expected.rows()) {
        assert!(shown.row.same_content(row), "content of '{}'", shown.key);
        assert!(
            shown.opacities.iter().all(|opacity| *opacity == 1.0),
            "'{}' not opaque: {:?}",
            shown.key,
            shown.opacities
        );
    }
    assert_eq!(surface.proxy_count(), 0);
    assert_eq!(surface.child_count(), expected.len());
    assert!(!surface.is_transitioning());

    let snapshot_keys: Vec<_> = reconciler.snapshot().keys().cloned().collect();
    assert_eq!(snapshot_keys, expected_keys);
}
