//! In-memory container.
//!
//! `MemorySurface` models a table body closely enough to check a transition
//! frame by frame: rows flow top to bottom at a fixed height, hidden rows
//! take no space, proxies float above the flow, and every style value is a
//! tween sampled at the surface's current time.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::markup;
use crate::row::{Row, RowKey};
use crate::snapshot::Snapshot;
use crate::surface::{
    Anchor, NodeId, Property, ProxySpec, Rect, RowGeometry, Surface, SurfaceError, Target,
    Tween, TweenTo,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub row_height: f64,
    pub cell_width: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            row_height: 36.0,
            cell_width: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Part {
    Node,
    Cell(usize),
}

#[derive(Debug, Clone, Copy)]
struct StyleValue {
    from: f64,
    tween: Tween,
    start_ms: u64,
}

impl StyleValue {
    fn fixed(value: f64) -> Self {
        Self {
            from: value,
            tween: Tween::new(Property::Opacity, TweenTo::Absolute(value), 0),
            start_ms: 0,
        }
    }

    fn at(&self, now_ms: u64) -> f64 {
        self.tween
            .sample(self.from, now_ms.saturating_sub(self.start_ms))
    }

    fn end_ms(&self) -> u64 {
        self.start_ms + self.tween.duration_ms
    }
}

#[derive(Debug, Clone)]
enum Content {
    Row(Row),
    Proxy(ProxySpec),
}

#[derive(Debug, Clone)]
struct MemNode {
    content: Content,
    key_attr: Option<RowKey>,
    hidden: bool,
    styles: HashMap<(Part, Property), StyleValue>,
}

impl MemNode {
    fn cell_count(&self) -> usize {
        match &self.content {
            Content::Row(row) => row.cell_count(),
            Content::Proxy(spec) => spec.cells.len(),
        }
    }

    fn default_style(&self, property: Property) -> f64 {
        match (&self.content, property) {
            (_, Property::Opacity) => 1.0,
            (Content::Proxy(spec), Property::Left) => spec.rect.left,
            (Content::Proxy(spec), Property::Top) => spec.rect.top,
            (Content::Row(_), _) => 0.0,
        }
    }
}

/// A keyed row as the surface currently shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownRow {
    pub key: RowKey,
    pub row: Row,
    /// Opacity of each cell, row opacity folded in.
    pub opacities: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    nodes: HashMap<NodeId, MemNode>,
    /// Container children in document order.
    flow: Vec<NodeId>,
    /// Attached proxies.
    overlay: Vec<NodeId>,
    next_id: u64,
    transitioning: bool,
    now_ms: u64,
    metrics: Metrics,
    mutations: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Metrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// A container already showing `snapshot`, as served with the page.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut surface = Self::new();
        for row in snapshot.rows() {
            surface.push_row(row.clone());
        }
        surface.mutations = 0;
        surface
    }

    /// Append a keyed, visible row, bypassing any reconciler.
    pub fn push_row(&mut self, row: Row) -> NodeId {
        let node = self.allocate(Content::Row(row.clone()), Some(row.key().clone()));
        self.flow.push(node);
        self.mutations += 1;
        node
    }

    /// Remove the row carrying `key`, bypassing any reconciler.
    pub fn remove_row(&mut self, key: &RowKey) -> Option<Row> {
        let node = self.node_by_key(key)?;
        self.flow.retain(|child| *child != node);
        self.mutations += 1;
        match self.nodes.remove(&node)?.content {
            Content::Row(row) => Some(row),
            Content::Proxy(_) => None,
        }
    }

    fn allocate(&mut self, content: Content, key_attr: Option<RowKey>) -> NodeId {
        self.next_id += 1;
        let node = NodeId(self.next_id);
        self.nodes.insert(
            node,
            MemNode {
                content,
                key_attr,
                hidden: false,
                styles: HashMap::new(),
            },
        );
        node
    }

    fn node(&self, node: NodeId) -> Result<&MemNode, SurfaceError> {
        self.nodes.get(&node).ok_or(SurfaceError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemNode, SurfaceError> {
        self.nodes.get_mut(&node).ok_or(SurfaceError::UnknownNode(node))
    }

    fn node_by_key(&self, key: &RowKey) -> Option<NodeId> {
        self.flow
            .iter()
            .copied()
            .find(|node| self.nodes.get(node).and_then(|n| n.key_attr.as_ref()) == Some(key))
    }

    fn flow_position(&self, node: NodeId) -> Result<usize, SurfaceError> {
        self.flow
            .iter()
            .position(|child| *child == node)
            .ok_or(SurfaceError::NotAttached(node))
    }

    fn visible_flow(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flow
            .iter()
            .copied()
            .filter(move |node| self.nodes.get(node).is_some_and(|n| !n.hidden))
    }

    fn parts(&self, target: Target) -> Result<SmallVec<[Part; 4]>, SurfaceError> {
        let node = self.node(target.node())?;
        let parts = match target {
            Target::Row(_) => SmallVec::from_slice(&[Part::Node]),
            Target::Cells(_) => (0..node.cell_count()).map(Part::Cell).collect(),
            Target::MutableCells(_) => match &node.content {
                Content::Row(row) => row.mutable_indices().map(Part::Cell).collect(),
                Content::Proxy(_) => SmallVec::new(),
            },
            Target::Indicator(_) => match &node.content {
                Content::Proxy(ProxySpec {
                    indicator: Some(index),
                    ..
                }) => SmallVec::from_slice(&[Part::Cell(*index)]),
                _ => SmallVec::new(),
            },
        };
        Ok(parts)
    }

    fn style_value(&self, node: NodeId, part: Part, property: Property) -> Option<f64> {
        let mem = self.nodes.get(&node)?;
        Some(
            mem.styles
                .get(&(part, property))
                .map(|value| value.at(self.now_ms))
                .unwrap_or_else(|| mem.default_style(property)),
        )
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    /// Number of structural or style changes since the surface was built.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Keys carried by attached nodes, hidden ones included, in document
    /// order. This is what a `getElementById` would see.
    pub fn attached_keys(&self) -> Vec<RowKey> {
        self.flow
            .iter()
            .chain(self.overlay.iter())
            .filter_map(|node| self.nodes.get(node)?.key_attr.clone())
            .collect()
    }

    /// Keys of visible rows, top to bottom.
    pub fn visible_keys(&self) -> Vec<RowKey> {
        self.visible_flow()
            .filter_map(|node| self.nodes.get(&node)?.key_attr.clone())
            .collect()
    }

    pub fn proxy_count(&self) -> usize {
        self.overlay.len()
    }

    /// Number of container children, staged rows included.
    pub fn child_count(&self) -> usize {
        self.flow.len()
    }

    /// Visible keyed rows with sampled cell opacities.
    pub fn shown_rows(&self) -> Vec<ShownRow> {
        self.visible_flow()
            .filter_map(|node| {
                let mem = self.nodes.get(&node)?;
                let key = mem.key_attr.clone()?;
                let Content::Row(row) = &mem.content else {
                    return None;
                };
                let row_opacity = self.style_value(node, Part::Node, Property::Opacity)?;
                let opacities = (0..row.cell_count())
                    .map(|cell| {
                        let value = self
                            .style_value(node, Part::Cell(cell), Property::Opacity)
                            .unwrap_or(1.0);
                        value * row_opacity
                    })
                    .collect();
                Some(ShownRow {
                    key,
                    row: row.clone(),
                    opacities,
                })
            })
            .collect()
    }

    pub fn row(&self, key: &RowKey) -> Option<&Row> {
        let node = self.node_by_key(key)?;
        match &self.nodes.get(&node)?.content {
            Content::Row(row) => Some(row),
            Content::Proxy(_) => None,
        }
    }

    /// Sampled opacity of one cell of the row carrying `key`.
    pub fn cell_opacity(&self, key: &RowKey, cell: usize) -> Option<f64> {
        let node = self.node_by_key(key)?;
        self.style_value(node, Part::Cell(cell), Property::Opacity)
    }

    /// Sampled top/left of every attached proxy.
    pub fn proxy_positions(&self) -> Vec<(f64, f64)> {
        self.overlay
            .iter()
            .filter_map(|proxy| {
                Some((
                    self.style_value(*proxy, Part::Node, Property::Top)?,
                    self.style_value(*proxy, Part::Node, Property::Left)?,
                ))
            })
            .collect()
    }

    /// Instant the last running tween ends.
    pub fn tweens_end_ms(&self) -> u64 {
        self.nodes
            .values()
            .flat_map(|node| node.styles.values().map(StyleValue::end_ms))
            .max()
            .unwrap_or(0)
    }

    /// Plain-text board, one line per visible row.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for shown in self.shown_rows() {
            let cells: Vec<String> = shown
                .row
                .cells()
                .iter()
                .map(|cell| markup::text_content(&cell.html))
                .collect();
            out.push_str(&format!("{:<12} {}\n", shown.key.as_str(), cells.join(" | ")));
        }
        out
    }
}

impl Surface for MemorySurface {
    fn read_rows(&mut self) -> Result<Vec<(NodeId, Row)>, SurfaceError> {
        Ok(self
            .flow
            .iter()
            .filter_map(|node| {
                let mem = self.nodes.get(node)?;
                mem.key_attr.as_ref()?;
                match &mem.content {
                    Content::Row(row) => Some((*node, row.clone())),
                    Content::Proxy(_) => None,
                }
            })
            .collect())
    }

    fn measure(&self, node: NodeId) -> Result<RowGeometry, SurfaceError> {
        let mem = self.node(node)?;
        if let Content::Proxy(spec) = &mem.content {
            if !self.overlay.contains(&node) {
                return Err(SurfaceError::NotAttached(node));
            }
            let top = self.style_value(node, Part::Node, Property::Top).unwrap_or(spec.rect.top);
            let left = self.style_value(node, Part::Node, Property::Left).unwrap_or(spec.rect.left);
            return Ok(RowGeometry {
                rect: Rect::new(top, left, spec.rect.width, spec.rect.height),
                cells: spec
                    .cells
                    .iter()
                    .map(|cell| Rect::new(0.0, cell.left, cell.width, spec.rect.height))
                    .collect(),
            });
        }
        self.flow_position(node)?;
        if mem.hidden {
            return Err(SurfaceError::NotAttached(node));
        }
        let index = self
            .visible_flow()
            .position(|child| child == node)
            .ok_or(SurfaceError::NotAttached(node))?;
        let Metrics {
            row_height,
            cell_width,
        } = self.metrics;
        let cells = mem.cell_count();
        Ok(RowGeometry {
            rect: Rect::new(index as f64 * row_height, 0.0, cells as f64 * cell_width, row_height),
            cells: (0..cells)
                .map(|cell| Rect::new(0.0, cell as f64 * cell_width, cell_width, row_height))
                .collect(),
        })
    }

    fn measure_slot(&self, index: usize) -> Result<Rect, SurfaceError> {
        let columns = self
            .visible_flow()
            .next()
            .and_then(|node| self.nodes.get(&node))
            .map(MemNode::cell_count)
            .unwrap_or(0);
        let Metrics {
            row_height,
            cell_width,
        } = self.metrics;
        Ok(Rect::new(
            index as f64 * row_height,
            0.0,
            columns as f64 * cell_width,
            row_height,
        ))
    }

    fn build_row(&mut self, row: &Row) -> Result<NodeId, SurfaceError> {
        Ok(self.allocate(Content::Row(row.clone()), Some(row.key().clone())))
    }

    fn build_proxy(&mut self, spec: &ProxySpec) -> Result<NodeId, SurfaceError> {
        Ok(self.allocate(Content::Proxy(spec.clone()), None))
    }

    fn attach(&mut self, proxy: NodeId) -> Result<(), SurfaceError> {
        self.node(proxy)?;
        if !self.overlay.contains(&proxy) {
            self.overlay.push(proxy);
        }
        self.mutations += 1;
        Ok(())
    }

    fn stage(&mut self, node: NodeId, anchor: Anchor) -> Result<(), SurfaceError> {
        let position = match anchor {
            Anchor::After(after) => self.flow_position(after)? + 1,
            Anchor::End => self.flow.len(),
        };
        let mem = self.node_mut(node)?;
        mem.hidden = true;
        mem.key_attr = None;
        self.flow.insert(position, node);
        self.mutations += 1;
        Ok(())
    }

    fn reveal(&mut self, node: NodeId, key: &RowKey) -> Result<(), SurfaceError> {
        self.flow_position(node)?;
        let mem = self.node_mut(node)?;
        mem.hidden = false;
        mem.key_attr = Some(key.clone());
        self.mutations += 1;
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), SurfaceError> {
        self.node(new)?;
        let position = self.flow_position(old)?;
        self.flow[position] = new;
        self.nodes.remove(&old);
        self.mutations += 1;
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        self.node(node)?;
        self.flow.retain(|child| *child != node);
        self.overlay.retain(|child| *child != node);
        self.nodes.remove(&node);
        self.mutations += 1;
        Ok(())
    }

    fn set_style(&mut self, target: Target, property: Property, value: f64) -> Result<(), SurfaceError> {
        let parts = self.parts(target)?;
        let mem = self.node_mut(target.node())?;
        for part in parts {
            mem.styles.insert((part, property), StyleValue::fixed(value));
        }
        self.mutations += 1;
        Ok(())
    }

    fn animate(&mut self, target: Target, tween: &Tween, now_ms: u64) -> Result<(), SurfaceError> {
        self.now_ms = self.now_ms.max(now_ms);
        let parts = self.parts(target)?;
        let node = target.node();
        let starts: Vec<(Part, f64)> = parts
            .iter()
            .map(|part| {
                let from = self
                    .style_value(node, *part, tween.property)
                    .unwrap_or(0.0);
                (*part, from)
            })
            .collect();
        let mem = self.node_mut(node)?;
        for (part, from) in starts {
            mem.styles.insert(
                (part, tween.property),
                StyleValue {
                    from,
                    tween: *tween,
                    start_ms: now_ms,
                },
            );
        }
        self.mutations += 1;
        Ok(())
    }

    fn set_transitioning(&mut self, on: bool) -> Result<(), SurfaceError> {
        self.transitioning = on;
        self.mutations += 1;
        Ok(())
    }

    fn frame(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
