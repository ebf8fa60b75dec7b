//! DOM backend.
//!
//! `DomSurface` drives a real `<tbody>`. Tweens become CSS transitions, so
//! the browser interpolates and the reconciler only has to start them on
//! time; [`drive`] re-arms `window.setTimeout` for the next due step.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::config::TransitionConfig;
use crate::markup;
use crate::reconciler::{ReconcileError, Reconciler};
use crate::row::{Row, RowKey};
use crate::surface::{
    Anchor, NodeId, Property, ProxySpec, Rect, RowGeometry, Surface, SurfaceError, Target, Tween,
    TweenTo,
};

const NODE_ATTR: &str = "data-rb-node";
const INDICATOR_ATTR: &str = "data-rb-indicator";
const PROXY_CLASS: &str = "rb-proxy";
const PLACEHOLDER_CLASS: &str = "rb-placeholder";

fn backend(error: JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{:?}", error))
}

fn html_element(element: Element) -> Result<HtmlElement, SurfaceError> {
    element
        .dyn_into::<HtmlElement>()
        .map_err(|element| SurfaceError::Backend(format!("{:?} is not an HTML element", element)))
}

fn children(element: &Element) -> Vec<HtmlElement> {
    let collection = element.children();
    (0..collection.length())
        .filter_map(|index| collection.item(index))
        .filter_map(|child| child.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn parse_px(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

pub struct DomSurface {
    document: Document,
    container: HtmlElement,
    table: Option<Element>,
    nodes: HashMap<NodeId, HtmlElement>,
    /// Hidden companion row of each staged row, keeping `:nth-child`
    /// striping stable while the staged row is hidden.
    placeholders: HashMap<NodeId, HtmlElement>,
    next_id: u64,
    mutable_class: String,
    moving_class: String,
    /// A `setTimeout` from [`drive`] is pending.
    timer_armed: bool,
}

impl DomSurface {
    pub fn new(container: HtmlElement, config: &TransitionConfig) -> Result<Self, SurfaceError> {
        let document = container
            .owner_document()
            .ok_or_else(|| SurfaceError::Backend("container has no document".to_string()))?;
        let table = container.closest("table").map_err(backend)?;
        Ok(Self {
            document,
            container,
            table,
            nodes: HashMap::new(),
            placeholders: HashMap::new(),
            next_id: 0,
            mutable_class: config.mutable_class.clone(),
            moving_class: config.moving_class.clone(),
            timer_armed: false,
        })
    }

    /// Attach to the first element matching `selector`, usually a `tbody`.
    pub fn from_selector(selector: &str, config: &TransitionConfig) -> Result<Self, SurfaceError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| SurfaceError::Backend("no document".to_string()))?;
        let container = document
            .query_selector(selector)
            .map_err(backend)?
            .ok_or_else(|| SurfaceError::Backend(format!("nothing matches '{}'", selector)))?;
        Self::new(html_element(container)?, config)
    }

    fn register(&mut self, element: HtmlElement) -> Result<NodeId, SurfaceError> {
        self.next_id += 1;
        let node = NodeId(self.next_id);
        element
            .set_attribute(NODE_ATTR, &node.0.to_string())
            .map_err(backend)?;
        self.nodes.insert(node, element);
        Ok(node)
    }

    fn element(&self, node: NodeId) -> Result<&HtmlElement, SurfaceError> {
        self.nodes.get(&node).ok_or(SurfaceError::UnknownNode(node))
    }

    fn create(&self, tag: &str) -> Result<HtmlElement, SurfaceError> {
        html_element(self.document.create_element(tag).map_err(backend)?)
    }

    fn targets(&self, target: Target) -> Result<Vec<HtmlElement>, SurfaceError> {
        let element = self.element(target.node())?;
        Ok(match target {
            Target::Row(_) => vec![element.clone()],
            Target::Cells(_) => children(element),
            Target::MutableCells(_) => children(element)
                .into_iter()
                .filter(|cell| cell.class_list().contains(&self.mutable_class))
                .collect(),
            Target::Indicator(_) => children(element)
                .into_iter()
                .filter(|cell| cell.has_attribute(INDICATOR_ATTR))
                .collect(),
        })
    }

    fn geometry(element: &HtmlElement) -> RowGeometry {
        RowGeometry {
            rect: Rect::new(
                element.offset_top() as f64,
                element.offset_left() as f64,
                element.offset_width() as f64,
                element.offset_height() as f64,
            ),
            cells: children(element)
                .iter()
                .map(|cell| {
                    Rect::new(
                        cell.offset_top() as f64,
                        cell.offset_left() as f64,
                        cell.offset_width() as f64,
                        cell.offset_height() as f64,
                    )
                })
                .collect(),
        }
    }

    fn visible_rows(&self) -> Vec<HtmlElement> {
        children(&self.container)
            .into_iter()
            .filter(|row| row.style().get_property_value("display").ok().as_deref() != Some("none"))
            .collect()
    }

    fn current_value(element: &HtmlElement, property: Property) -> f64 {
        let style = element.style();
        let inline = style.get_property_value(property.css_name()).ok();
        let parsed = inline.as_deref().and_then(parse_px);
        match property {
            Property::Opacity => parsed.unwrap_or(1.0),
            Property::Left => parsed.unwrap_or(element.offset_left() as f64),
            Property::Top => parsed.unwrap_or(element.offset_top() as f64),
        }
    }

    fn write(element: &HtmlElement, property: Property, value: f64) -> Result<(), SurfaceError> {
        let value = match property {
            Property::Opacity => value.to_string(),
            Property::Left | Property::Top => format!("{}px", value),
        };
        element
            .style()
            .set_property(property.css_name(), &value)
            .map_err(backend)
    }
}

impl Surface for DomSurface {
    fn read_rows(&mut self) -> Result<Vec<(NodeId, Row)>, SurfaceError> {
        let mut rows = Vec::new();
        for element in children(&self.container) {
            if element.id().is_empty() {
                continue;
            }
            let node = match element.get_attribute(NODE_ATTR).and_then(|id| id.parse().ok()) {
                Some(id) if self.nodes.contains_key(&NodeId(id)) => NodeId(id),
                _ => self.register(element.clone())?,
            };
            let row = markup::parse_row(&element.outer_html(), &self.mutable_class)
                .map_err(|error| SurfaceError::Backend(format!("row {}: {}", element.id(), error)))?;
            rows.push((node, row));
        }
        Ok(rows)
    }

    fn measure(&self, node: NodeId) -> Result<RowGeometry, SurfaceError> {
        let element = self.element(node)?;
        if !element.is_connected() {
            return Err(SurfaceError::NotAttached(node));
        }
        Ok(Self::geometry(element))
    }

    fn measure_slot(&self, index: usize) -> Result<Rect, SurfaceError> {
        let rows = self.visible_rows();
        if let Some(row) = rows.get(index) {
            return Ok(Self::geometry(row).rect);
        }
        let Some(last) = rows.last() else {
            return Ok(Rect::default());
        };
        let rect = Self::geometry(last).rect;
        let beyond = (index + 1 - rows.len()) as f64;
        Ok(Rect::new(rect.top + beyond * rect.height, rect.left, rect.width, rect.height))
    }

    fn build_row(&mut self, row: &Row) -> Result<NodeId, SurfaceError> {
        let element = self.create("tr")?;
        element.set_id(row.key().as_str());
        element.set_inner_html(&markup::render_cells(row));
        self.register(element)
    }

    fn build_proxy(&mut self, spec: &ProxySpec) -> Result<NodeId, SurfaceError> {
        let proxy = self.create("div")?;
        proxy.set_class_name(PROXY_CLASS);
        let style = proxy.style();
        for (name, value) in [
            ("position", "absolute".to_string()),
            ("top", format!("{}px", spec.rect.top)),
            ("left", format!("{}px", spec.rect.left)),
            ("width", format!("{}px", spec.rect.width)),
            ("height", format!("{}px", spec.rect.height)),
        ] {
            style.set_property(name, &value).map_err(backend)?;
        }
        for (index, cell) in spec.cells.iter().enumerate() {
            let element = self.create("div")?;
            element.set_class_name(&cell.class);
            element.set_inner_html(&cell.html);
            let style = element.style();
            for (name, value) in [
                ("position", "absolute".to_string()),
                ("top", "0".to_string()),
                ("left", format!("{}px", cell.left)),
                ("width", format!("{}px", cell.width)),
            ] {
                style.set_property(name, &value).map_err(backend)?;
            }
            if spec.indicator == Some(index) {
                element.set_attribute(INDICATOR_ATTR, "").map_err(backend)?;
            }
            proxy.append_child(&element).map_err(backend)?;
        }
        self.register(proxy)
    }

    fn attach(&mut self, proxy: NodeId) -> Result<(), SurfaceError> {
        let element = self.element(proxy)?;
        // Offsets are relative to the offset parent, so the proxy lives there.
        let parent: Element = match self.container.offset_parent() {
            Some(parent) => parent,
            None => self
                .document
                .body()
                .ok_or_else(|| SurfaceError::Backend("document has no body".to_string()))?
                .into(),
        };
        parent.append_child(element).map_err(backend)?;
        Ok(())
    }

    fn stage(&mut self, node: NodeId, anchor: Anchor) -> Result<(), SurfaceError> {
        let element = self.element(node)?.clone();
        element.remove_attribute("id").map_err(backend)?;
        Self::write_display(&element, "none")?;

        let placeholder = self.create("tr")?;
        placeholder.set_class_name(PLACEHOLDER_CLASS);
        Self::write_display(&placeholder, "none")?;

        let next = match anchor {
            Anchor::After(after) => {
                let anchor = self.element(after)?;
                if !anchor.is_connected() {
                    return Err(SurfaceError::NotAttached(after));
                }
                anchor.next_sibling()
            }
            Anchor::End => None,
        };
        self.container
            .insert_before(&element, next.as_ref())
            .map_err(backend)?;
        self.container
            .insert_before(&placeholder, element.next_sibling().as_ref())
            .map_err(backend)?;
        self.placeholders.insert(node, placeholder);
        Ok(())
    }

    fn reveal(&mut self, node: NodeId, key: &RowKey) -> Result<(), SurfaceError> {
        let element = self.element(node)?;
        element.set_id(key.as_str());
        element
            .style()
            .remove_property("display")
            .map_err(backend)?;
        if let Some(placeholder) = self.placeholders.remove(&node) {
            placeholder.remove();
        }
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), SurfaceError> {
        let new_element = self.element(new)?.clone();
        let old_element = self.element(old)?.clone();
        if !old_element.is_connected() {
            return Err(SurfaceError::NotAttached(old));
        }
        self.container
            .replace_child(&new_element, &old_element)
            .map_err(backend)?;
        self.nodes.remove(&old);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), SurfaceError> {
        let element = self.nodes.remove(&node).ok_or(SurfaceError::UnknownNode(node))?;
        element.remove();
        if let Some(placeholder) = self.placeholders.remove(&node) {
            placeholder.remove();
        }
        Ok(())
    }

    fn set_style(&mut self, target: Target, property: Property, value: f64) -> Result<(), SurfaceError> {
        for element in self.targets(target)? {
            element
                .style()
                .set_property("transition", "none")
                .map_err(backend)?;
            Self::write(&element, property, value)?;
        }
        Ok(())
    }

    fn animate(&mut self, target: Target, tween: &Tween, _now_ms: u64) -> Result<(), SurfaceError> {
        for element in self.targets(target)? {
            let from = Self::current_value(&element, tween.property);
            let to = match tween.to {
                TweenTo::Absolute(to) => to,
                TweenTo::By(_) => tween.to.resolve(from),
            };
            let transition = format!(
                "{} {}ms {}",
                tween.property.css_name(),
                tween.duration_ms,
                tween.easing.css_name()
            );
            element
                .style()
                .set_property("transition", &transition)
                .map_err(backend)?;
            // Reading layout commits the start value before the transition.
            let _ = element.offset_height();
            Self::write(&element, tween.property, to)?;
        }
        Ok(())
    }

    fn set_transitioning(&mut self, on: bool) -> Result<(), SurfaceError> {
        let Some(table) = &self.table else {
            return Ok(());
        };
        let classes = table.class_list();
        if on {
            classes.add_1(&self.moving_class).map_err(backend)
        } else {
            classes.remove_1(&self.moving_class).map_err(backend)
        }
    }
}

impl DomSurface {
    fn write_display(element: &HtmlElement, value: &str) -> Result<(), SurfaceError> {
        element
            .style()
            .set_property("display", value)
            .map_err(backend)
    }
}

/// Build a reconciler to share with [`drive`] and with completion callbacks.
///
/// Callbacks are deferred, so `on_done` may borrow the returned cell and
/// reconcile again.
pub fn shared(
    surface: DomSurface,
    config: TransitionConfig,
) -> Result<Rc<RefCell<Reconciler<DomSurface>>>, ReconcileError> {
    Ok(Rc::new(RefCell::new(Reconciler::new(surface, config)?.defer_callbacks())))
}

/// Run a reconciler against wall-clock time: deliver due callbacks, wait for
/// the next due step with `setTimeout`, run it, repeat until nothing is
/// scheduled. Call it after every `reconcile`; a call while a timer is
/// pending only delivers callbacks.
pub fn drive(reconciler: Rc<RefCell<Reconciler<DomSurface>>>) {
    loop {
        let callbacks = reconciler.borrow_mut().take_callbacks();
        if callbacks.is_empty() {
            break;
        }
        callbacks.deliver();
    }

    let wait_ms = {
        let board = reconciler.borrow();
        if board.surface().timer_armed {
            return;
        }
        let Some(wait_ms) = board.time_to_next_step() else {
            return;
        };
        wait_ms
    };
    let Some(window) = web_sys::window() else {
        log::warn!("no window, transition left unfinished");
        return;
    };
    let next = reconciler.clone();
    let callback = Closure::once(move || {
        {
            let mut board = next.borrow_mut();
            board.surface_mut().timer_armed = false;
            if let Err(error) = board.advance_by(wait_ms) {
                log::warn!("transition step failed: {}", error);
            }
        }
        drive(next);
    });
    let timeout = i32::try_from(wait_ms).unwrap_or(i32::MAX);
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref::<js_sys::Function>(),
        timeout,
    ) {
        Ok(_) => {
            reconciler.borrow_mut().surface_mut().timer_armed = true;
            callback.forget();
        }
        Err(error) => log::warn!("setTimeout failed: {:?}", error),
    }
}
