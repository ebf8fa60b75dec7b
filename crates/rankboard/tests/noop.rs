mod common;

use common::*;
use rankboard::{MemorySurface, Outcome, Reconciler, TransitionConfig, Update};

#[test]
fn identical_update_touches_nothing() {
    let completions = Completions::default();
    let mut reconciler = reconciler(&[("a", 3), ("b", 2)]);

    let outcome = reconciler
        .reconcile_with(update(&[("a", 3), ("b", 2)]), completions.callback())
        .unwrap();

    assert!(matches!(outcome, Outcome::Completed(summary) if summary.unchanged == 2));
    assert_eq!(completions.count(), 1);
    assert_eq!(reconciler.surface().mutations(), 0);
    assert_eq!(reconciler.time_to_next_step(), None);
    assert!(!reconciler.is_busy());

    assert!(reconciler.run_to_end().unwrap().is_empty());
    assert_eq!(completions.count(), 1);
}

#[test]
fn empty_list_stays_empty() {
    let mut reconciler = Reconciler::new(MemorySurface::new(), TransitionConfig::default()).unwrap();
    let outcome = reconciler.reconcile(Update::default()).unwrap();
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(reconciler.surface().mutations(), 0);
}
