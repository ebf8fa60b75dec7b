//! Rows that keep their position but change content.

mod common;

use common::*;
use rankboard::Outcome;

#[test]
fn score_change_fades_out_swaps_and_fades_in() {
    let mut reconciler = reconciler(&[("alice", 3), ("bob", 1)]);
    let next = update(&[("alice", 5), ("bob", 1)]);

    let outcome = reconciler.reconcile(next.clone()).unwrap();
    // replace at 1200, then alice's fade-in from 1200
    assert_eq!(outcome, Outcome::Started { completes_at_ms: 2400 });
    assert_eq!(reconciler.surface().proxy_count(), 0);

    reconciler.advance_by(600).unwrap();
    let surface = reconciler.surface();
    assert_eq!(surface.cell_opacity(&key("alice"), 2), Some(0.5));
    assert_eq!(surface.cell_opacity(&key("alice"), 1), Some(1.0));
    assert_eq!(surface.row(&key("alice")).unwrap().cells()[2].html, "3");

    reconciler.advance_by(600).unwrap();
    let surface = reconciler.surface();
    assert_eq!(surface.row(&key("alice")).unwrap().cells()[2].html, "5");
    assert_eq!(surface.cell_opacity(&key("alice"), 2), Some(0.0));
    assert_eq!(surface.child_count(), 2);

    reconciler.advance_by(600).unwrap();
    assert_eq!(reconciler.surface().cell_opacity(&key("alice"), 2), Some(0.5));

    let done = reconciler.advance_by(600).unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].changed, 1);
    assert_eq!(done[0].unchanged, 1);
    assert_settled(&reconciler, &next);
}

#[test]
fn unchanged_neighbours_are_left_alone() {
    let mut reconciler = reconciler(&[("alice", 3), ("bob", 1), ("carol", 0)]);
    reconciler
        .reconcile(update(&[("alice", 3), ("bob", 2), ("carol", 0)]))
        .unwrap();

    step_through(&mut reconciler, 100, |surface| {
        for name in ["alice", "carol"] {
            for cell in 0..3 {
                assert_eq!(surface.cell_opacity(&key(name), cell), Some(1.0));
            }
        }
    });
    assert_eq!(visible(&reconciler), vec!["alice", "bob", "carol"]);
}
