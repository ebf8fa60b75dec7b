//! DOM backend, run with `wasm-pack test --headless --firefox -- --features web`.

#![cfg(all(feature = "web", target_arch = "wasm32"))]

use std::cell::Cell as Flag;
use std::rc::Rc;

use rankboard::platform::browser::{self, DomSurface};
use rankboard::surface::{Anchor, SurfaceError};
use rankboard::{Cell, Outcome, Reconciler, Row, RowKey, Surface, TransitionConfig, Update};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn table(id: &str, rows: &[(&str, &str)]) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let table = document.create_element("table").unwrap();
    let body = document.create_element("tbody").unwrap();
    body.set_id(id);
    let mut html = String::new();
    for (key, score) in rows {
        html.push_str(&format!(
            r#"<tr id="{key}"><td class="sb-update">{score}</td><td>{key}</td></tr>"#
        ));
    }
    body.set_inner_html(&html);
    table.append_child(&body).unwrap();
    document.body().unwrap().append_child(&table).unwrap();
    body.dyn_into::<HtmlElement>().unwrap()
}

fn update(rows: &[(&str, &str)]) -> Update {
    Update::from_rows(rows.iter().map(|(key, score)| {
        Row::new(
            RowKey::new(key).unwrap(),
            [Cell::mutable(*score).with_class("sb-update"), Cell::new(*key)],
        )
        .unwrap()
    }))
    .unwrap()
}

#[wasm_bindgen_test]
fn reads_server_rendered_rows() {
    let config = TransitionConfig::default();
    let mut surface = DomSurface::new(table("read", &[("sb-1", "10"), ("sb-2", "8")]), &config).unwrap();
    let rows = surface.read_rows().unwrap();
    let keys: Vec<_> = rows.iter().map(|(_, row)| row.key().as_str()).collect();
    assert_eq!(keys, vec!["sb-1", "sb-2"]);
    assert!(rows[0].1.cells()[0].mutable);
}

#[wasm_bindgen_test]
fn identical_update_completes_at_once() {
    let config = TransitionConfig::default();
    let body = table("noop", &[("sb-1", "10"), ("sb-2", "8")]);
    let surface = DomSurface::new(body, &config).unwrap();
    let mut reconciler = Reconciler::new(surface, config).unwrap();
    let outcome = reconciler
        .reconcile(update(&[("sb-1", "10"), ("sb-2", "8")]))
        .unwrap();
    assert!(matches!(outcome, Outcome::Completed(_)));
}

#[wasm_bindgen_test]
fn swap_stages_hidden_copies() {
    let config = TransitionConfig::default();
    let body = table("swap", &[("sb-1", "10"), ("sb-2", "8")]);
    let surface = DomSurface::new(body.clone(), &config).unwrap();
    let mut reconciler = Reconciler::new(surface, config).unwrap();
    reconciler
        .reconcile(update(&[("sb-2", "12"), ("sb-1", "10")]))
        .unwrap();

    // two old rows, two staged copies and their placeholders
    assert_eq!(body.children().length(), 6);
    let table = body.closest("table").unwrap().unwrap();
    assert!(table.class_list().contains("sb-moving"));

    reconciler.run_to_end().unwrap();
    assert_eq!(body.children().length(), 2);
    assert_eq!(body.first_element_child().unwrap().id(), "sb-2");
}

#[wasm_bindgen_test]
fn completion_callback_may_reconcile_again() {
    let config = TransitionConfig::default();
    let body = table("chain", &[("sb-1", "10"), ("sb-2", "8")]);
    let board = browser::shared(DomSurface::new(body, &config).unwrap(), config).unwrap();

    let chained = Rc::new(Flag::new(false));
    let inner = board.clone();
    let flag = chained.clone();
    board
        .borrow_mut()
        .reconcile_with(update(&[("sb-1", "10"), ("sb-2", "8")]), move |_| {
            let outcome = inner
                .borrow_mut()
                .reconcile(update(&[("sb-2", "12"), ("sb-1", "10")]))
                .unwrap();
            flag.set(matches!(outcome, Outcome::Started { .. }));
        })
        .unwrap();
    assert!(!chained.get());

    browser::drive(board.clone());
    assert!(chained.get());
    assert!(board.borrow().is_busy());
}

#[wasm_bindgen_test]
fn staging_after_a_detached_row_names_the_anchor() {
    let config = TransitionConfig::default();
    let mut surface = DomSurface::new(table("detached", &[("sb-1", "10")]), &config).unwrap();
    let rows = update(&[("sb-2", "8"), ("sb-3", "7")]);
    let mut built = rows.rows().map(|row| surface.build_row(row).unwrap());
    let (loose, staged) = (built.next().unwrap(), built.next().unwrap());

    assert_eq!(
        surface.stage(staged, Anchor::After(loose)),
        Err(SurfaceError::NotAttached(loose))
    );
}
