//! Rows entering and leaving the board.

mod common;

use common::*;
use rankboard::{Classification, MemorySurface, Outcome, Reconciler, TransitionConfig, classify};

#[test]
fn replaced_participant_fades_out_and_newcomer_fades_in() {
    let mut reconciler = reconciler(&[("a", 9), ("b", 5), ("c", 1)]);
    let next = update(&[("a", 9), ("d", 5), ("c", 1)]);

    let plan = classify(reconciler.snapshot(), &next);
    assert_eq!(plan.class_of(&key("b")), Some(Classification::Removed));
    assert_eq!(plan.class_of(&key("d")), Some(Classification::Inserted));

    let outcome = reconciler.reconcile(next.clone()).unwrap();
    // removal ends at 1200, d fades in from 1300 as the second row
    assert_eq!(outcome, Outcome::Started { completes_at_ms: 2500 });
    assert_eq!(visible(&reconciler), vec!["a", "b", "c"]);

    reconciler.advance_by(600).unwrap();
    assert_eq!(reconciler.surface().cell_opacity(&key("b"), 1), Some(0.5));
    assert_unique_keys(reconciler.surface());

    reconciler.advance_by(600).unwrap();
    assert_eq!(visible(&reconciler), vec!["a", "d", "c"]);
    assert_eq!(reconciler.surface().cell_opacity(&key("d"), 1), Some(0.0));

    reconciler.run_to_end().unwrap();
    assert_settled(&reconciler, &next);
}

#[test]
fn newcomer_at_the_bottom_joins_a_reorder() {
    let mut reconciler = reconciler(&[("a", 2), ("b", 1)]);
    let next = update(&[("b", 3), ("a", 2), ("c", 1)]);

    reconciler.reconcile(next.clone()).unwrap();
    let done = step_through(&mut reconciler, 100, assert_unique_keys);

    assert_eq!(done[0].inserted, 1);
    assert_eq!(done[0].moved(), 2);
    assert_settled(&reconciler, &next);
}

#[test]
fn newcomer_at_the_top_pushes_everyone_down() {
    let mut reconciler = reconciler(&[("a", 2), ("b", 1)]);
    let next = update(&[("z", 5), ("a", 2), ("b", 1)]);

    reconciler.reconcile(next.clone()).unwrap();
    let done = step_through(&mut reconciler, 100, assert_unique_keys);

    assert_eq!(done[0].moved_down, 2);
    assert_eq!(done[0].inserted, 1);
    assert_settled(&reconciler, &next);
}

#[test]
fn everyone_leaves() {
    let mut reconciler = reconciler(&[("a", 2), ("b", 1)]);
    reconciler.reconcile(update(&[])).unwrap();
    let done = reconciler.run_to_end().unwrap();

    assert_eq!(done[0].removed, 2);
    assert_eq!(done[0].completed_at_ms, 1200);
    assert_eq!(reconciler.surface().child_count(), 0);
    assert!(reconciler.snapshot().is_empty());
}

#[test]
fn empty_board_fills_up() {
    let mut reconciler = Reconciler::new(MemorySurface::new(), TransitionConfig::default()).unwrap();
    let next = update(&[("a", 2), ("b", 1)]);

    // nothing to wait for: rows appear at once and fade in
    let outcome = reconciler.reconcile(next.clone()).unwrap();
    assert_eq!(outcome, Outcome::Started { completes_at_ms: 1300 });
    assert_eq!(visible(&reconciler), vec!["a", "b"]);
    assert_eq!(reconciler.surface().cell_opacity(&key("b"), 1), Some(0.0));
    reconciler.run_to_end().unwrap();
    assert_settled(&reconciler, &next);
}
