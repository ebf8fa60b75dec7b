//! A surface that writes down every mutation it performs.

use rankboard::surface::{
    Anchor, NodeId, Property, ProxySpec, Rect, RowGeometry, SurfaceError, Target, Tween, TweenTo,
};
use rankboard::{Row, RowKey, Surface};

pub struct Recorder<S> {
    inner: S,
    now_ms: u64,
    lines: Vec<String>,
}

impl<S: Surface> Recorder<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            now_ms: 0,
            lines: Vec::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Lines recorded since the last call.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    fn record(&mut self, text: String) {
        self.lines.push(format!("{:>7} ms  {}", self.now_ms, text));
    }
}

fn target(target: Target) -> String {
    match target {
        Target::Row(node) => format!("{}", node),
        Target::Cells(node) => format!("{} cells", node),
        Target::MutableCells(node) => format!("{} mutable cells", node),
        Target::Indicator(node) => format!("{} icon", node),
    }
}

fn tween(tween: &Tween) -> String {
    let to = match tween.to {
        TweenTo::Absolute(value) => format!("{}", value),
        TweenTo::By(delta) => format!("{:+}", delta),
    };
    format!(
        "{} -> {} over {} ms",
        tween.property.css_name(),
        to,
        tween.duration_ms
    )
}

impl<S: Surface> Surface for Recorder<S> {
    fn read_rows(&mut self) -> Result<Vec<(NodeId, Row)>, SurfaceError> {
        self.inner.read_rows()
    }

    fn measure(&self, node: NodeId) -> Result<RowGeometry, SurfaceError> {
        self.inner.measure(node)
    }

    fn measure_slot(&self, index: usize) -> Result<Rect, SurfaceError> {
        self.inner.measure_slot(index)
    }

    fn build_row(&mut self, row: &Row) -> Result<NodeId, SurfaceError> {
        self.inner.build_row(row)
    }

    fn build_proxy(&mut self, spec: &ProxySpec) -> Result<NodeId, SurfaceError> {
        self.inner.build_proxy(spec)
    }

    fn attach(&mut self, proxy: NodeId) -> Result<(), SurfaceError> {
        self.inner.attach(proxy)?;
        self.record(format!("attach proxy {}", proxy));
        Ok(())
    }

    fn stage(&mut self, node: NodeId, anchor: Anchor) -> Result<(), SurfaceError> {
        self.inner.stage(node, anchor)?;
        let place = match anchor {
            Anchor::After(after) => format!("after {}", after),
            Anchor::End => "at the end".to_string(),
        };
        self.record(format!("stage {} hidden {}", node, place));
        Ok(())
    }

    fn reveal(&mut self, node: NodeId, key: &RowKey) -> Result<(), SurfaceError> {
        self.inner.reveal(node, key)?;
        self.record(format!("reveal {} as '{}'", node, key));
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), SurfaceError> {
        self.inner.replace(old, new)?;
        self.record(format!("replace {} with {}", old, new));
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        self.inner.detach(node)?;
        self.record(format!("detach {}", node));
        Ok(())
    }

    fn set_style(&mut self, at: Target, property: Property, value: f64) -> Result<(), SurfaceError> {
        self.inner.set_style(at, property, value)?;
        self.record(format!("set {} {} = {}", target(at), property.css_name(), value));
        Ok(())
    }

    fn animate(&mut self, at: Target, motion: &Tween, now_ms: u64) -> Result<(), SurfaceError> {
        self.inner.animate(at, motion, now_ms)?;
        self.record(format!("animate {} {}", target(at), tween(motion)));
        Ok(())
    }

    fn set_transitioning(&mut self, on: bool) -> Result<(), SurfaceError> {
        self.inner.set_transitioning(on)?;
        self.record(if on { "rows moving" } else { "rows settled" }.to_string());
        Ok(())
    }

    fn frame(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.inner.frame(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankboard::{Cell, MemorySurface, Reconciler, Snapshot, TransitionConfig, Update};

    fn row(key: &str, score: &str) -> Row {
        Row::new(RowKey::new(key).unwrap(), [Cell::mutable(score), Cell::new(key)]).unwrap()
    }

    #[test]
    fn records_timed_steps() {
        let snapshot = Snapshot::from_rows([row("a", "1")]).unwrap();
        let surface = Recorder::new(MemorySurface::from_snapshot(&snapshot));
        let mut reconciler = Reconciler::new(surface, TransitionConfig::default()).unwrap();
        reconciler
            .reconcile(Update::from_rows([row("a", "2")]).unwrap())
            .unwrap();
        reconciler.run_to_end().unwrap();

        let lines = reconciler.surface_mut().drain();
        assert_eq!(lines[0], "      0 ms  rows moving");
        assert!(lines.iter().any(|line| line == "   1200 ms  replace #1 with #2"));
        assert!(reconciler.surface_mut().drain().is_empty());
        assert_eq!(reconciler.surface().inner().visible_keys().len(), 1);
    }
}
