//! DOM object graph for the Lumo script host.
//!
//! A deliberately small element tree: enough document/element surface for
//! a canvas-drawing application, none of the layout or styling machinery
//! of a real browser.
//!
//! # Design
//!
//! Nodes live in an arena (`Vec<Node>`) addressed by [`NodeId`] indices,
//! so script-side element wrappers can hold plain copyable ids instead of
//! fighting the borrow checker. Structural mutation returns
//! [`AppendEffect`] instructions — the embedding layer performs the side
//! effects (script evaluation, canvas attachment) because the tree itself
//! knows nothing about engines or host loops.
//!
//! Element lookup is intentionally shallow: `getElementById` and
//! `getElementsByTagName` inspect immediate children only. The hosted
//! application is written against that contract.

pub mod window;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lumo_canvas::{CanvasError, Context2d};
use lumo_common::handle::ScriptHandle;
use lumo_common::image::LoadedImage;

/// A type-safe index into the element arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// State for a `<script>` element.
///
/// The `onload` callback lives on the script-side wrapper object, like
/// every `on*` property; the tree only carries the source reference.
#[derive(Debug, Default)]
pub struct ScriptData {
    /// Source reference (a bundle-relative URL).
    pub src: Option<String>,
}

/// State for a `<style>` element: the raw rules inserted into its sheet,
/// in insertion order. Nothing interprets them.
#[derive(Debug, Default)]
pub struct StyleData {
    /// Raw rule strings, in `insertRule` order.
    pub rules: Vec<String>,
}

/// State for an `<input>` element.
#[derive(Debug, Default)]
pub struct InputData {
    /// The `type` attribute.
    pub input_type: Option<String>,
    /// The current value.
    pub value: Option<String>,
}

/// State for an image element.
///
/// `onload`/`onerror` live on the script-side wrapper object.
#[derive(Debug, Default)]
pub struct ImageData {
    /// Reported width; populated from the decoded bitmap on load.
    pub width: u32,
    /// Reported height; populated from the decoded bitmap on load.
    pub height: u32,
    /// The source URL, as last assigned.
    pub src: Option<String>,
    /// The decoded bitmap once a load succeeded.
    pub bitmap: Option<LoadedImage>,
}

/// Stub playback state for a `<video>` element. Actual playback belongs
/// to the platform media player outside this crate.
#[derive(Debug, Default)]
pub struct VideoData {
    /// Requested width.
    pub width: u32,
    /// Requested height.
    pub height: u32,
    /// The `src` attribute.
    pub src: String,
    /// Playback position stub.
    pub current_time: f64,
    /// Mute stub.
    pub muted: bool,
    /// Whether `play()` was called more recently than `pause()`.
    pub playing: bool,
}

/// State for a `<canvas>` element. The element exclusively owns its 2-D
/// context; the context itself holds no owning reference back.
#[derive(Default)]
pub struct CanvasData {
    /// The `width` attribute as the script set it (0 allowed here; the
    /// context coerces).
    pub width: u32,
    /// The `height` attribute as the script set it.
    pub height: u32,
    /// The lazily-created 2-D context, reused for the element's lifetime.
    pub context: Option<Rc<RefCell<Context2d>>>,
}

/// What kind of element a node is, with the subtype's state inline.
#[derive(Default)]
pub enum ElementKind {
    /// A plain element with no specialized behavior.
    #[default]
    Generic,
    /// The document root object.
    Document,
    /// `<body>`/`<head>` — append side effects live here.
    Body,
    /// `<script>`.
    Script(ScriptData),
    /// `<style>`.
    Style(StyleData),
    /// `<input>`.
    Input(InputData),
    /// An image element.
    Image(ImageData),
    /// `<video>`.
    Video(VideoData),
    /// `<canvas>`.
    Canvas(CanvasData),
}

impl ElementKind {
    /// The subtype-determined tag name.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Generic => "",
            Self::Document => "#document",
            Self::Body => "body",
            Self::Script(_) => "script",
            Self::Style(_) => "style",
            Self::Input(_) => "input",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Canvas(_) => "canvas",
        }
    }
}

/// One element in the arena.
#[derive(Default)]
pub struct Node {
    /// The `id` attribute; mutable, unique by convention only.
    pub id: String,
    /// Subtype and its state.
    pub kind: ElementKind,
    /// Owned children, in append order.
    pub children: Vec<NodeId>,
    /// Event listeners, at most one per event type; later registrations
    /// overwrite earlier ones.
    pub listeners: HashMap<String, ScriptHandle>,
}

/// Side effect requested by a structural mutation, to be performed by
/// the embedding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendEffect {
    /// Nothing beyond the append itself.
    None,
    /// A `<script>` landed in the body: load and evaluate its source,
    /// then fire its `onload`.
    LoadScript(NodeId),
    /// A `<canvas>` landed in the body: the host loop should start
    /// pumping frames for it.
    CanvasAttached(NodeId),
}

/// The element arena plus the document/body/head roots.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    body: NodeId,
    head: NodeId,
}

impl Dom {
    /// Create a tree with document, body, and head pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            body: NodeId(0),
            head: NodeId(0),
        };
        dom.document = dom.alloc(ElementKind::Document);
        dom.body = dom.alloc(ElementKind::Body);
        dom.head = dom.alloc(ElementKind::Body);
        dom
    }

    /// The document node.
    #[must_use]
    pub const fn document(&self) -> NodeId {
        self.document
    }

    /// The body node.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// The head node.
    #[must_use]
    pub const fn head(&self) -> NodeId {
        self.head
    }

    fn alloc(&mut self, kind: ElementKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            ..Node::default()
        });
        id
    }

    /// The element factory: a new node of the subtype matching `tag`
    /// (unknown tags produce a generic element).
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let kind = match tag {
            "script" => ElementKind::Script(ScriptData::default()),
            "style" => ElementKind::Style(StyleData::default()),
            "input" => ElementKind::Input(InputData::default()),
            "canvas" => ElementKind::Canvas(CanvasData::default()),
            "image" => ElementKind::Image(ImageData::default()),
            "video" => ElementKind::Video(VideoData::default()),
            _ => ElementKind::Generic,
        };
        self.alloc(kind)
    }

    /// Create a detached image element (the `Image` constructor path).
    pub fn create_image(&mut self, width: u32, height: u32) -> NodeId {
        self.alloc(ElementKind::Image(ImageData {
            width,
            height,
            ..ImageData::default()
        }))
    }

    /// Get a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Append `child` to `parent` and report the side effect the
    /// embedding layer must perform. Only the body/head specialization
    /// triggers effects; generic elements merely append.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> AppendEffect {
        let Some(node) = self.nodes.get_mut(parent.0) else {
            return AppendEffect::None;
        };
        node.children.push(child);
        let body_like = matches!(node.kind, ElementKind::Body);
        if !body_like {
            return AppendEffect::None;
        }
        match self.nodes.get(child.0).map(|n| &n.kind) {
            Some(ElementKind::Script(_)) => AppendEffect::LoadScript(child),
            Some(ElementKind::Canvas(_)) => AppendEffect::CanvasAttached(child),
            _ => AppendEffect::None,
        }
    }

    /// Find the first *immediate* child of `parent` with the given id.
    /// Grandchildren are deliberately not searched.
    #[must_use]
    pub fn get_element_by_id(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.get(child).is_some_and(|n| n.id == id))
    }

    /// Collect the *immediate* children of `parent` with the given tag.
    #[must_use]
    pub fn get_elements_by_tag_name(&self, parent: NodeId, tag: &str) -> Vec<NodeId> {
        self.get(parent).map_or_else(Vec::new, |node| {
            node.children
                .iter()
                .copied()
                .filter(|&child| self.get(child).is_some_and(|n| n.kind.tag() == tag))
                .collect()
        })
    }

    // ---- listeners ----

    /// Register a listener for an event type, returning the handle it
    /// replaced (the caller releases it).
    pub fn set_listener(
        &mut self,
        node: NodeId,
        event: &str,
        handle: ScriptHandle,
    ) -> Option<ScriptHandle> {
        self.get_mut(node)?.listeners.insert(event.to_string(), handle)
    }

    /// Remove a listener, returning its handle for release.
    pub fn remove_listener(&mut self, node: NodeId, event: &str) -> Option<ScriptHandle> {
        self.get_mut(node)?.listeners.remove(event)
    }

    /// Look up a listener without removing it.
    #[must_use]
    pub fn listener(&self, node: NodeId, event: &str) -> Option<ScriptHandle> {
        self.get(node)?.listeners.get(event).copied()
    }

    // ---- canvas plumbing ----

    /// Get or lazily create the 2-D context for a canvas element. The
    /// context is created once and reused; `None` for non-canvas nodes.
    ///
    /// # Errors
    ///
    /// [`CanvasError`] when the backing store cannot be allocated — fatal
    /// to context creation, the element stays context-less.
    pub fn canvas_context(
        &mut self,
        node: NodeId,
    ) -> Result<Option<Rc<RefCell<Context2d>>>, CanvasError> {
        let Some(Node {
            kind: ElementKind::Canvas(data),
            ..
        }) = self.nodes.get_mut(node.0)
        else {
            return Ok(None);
        };
        if data.context.is_none() {
            let context = Context2d::new(data.width, data.height)?;
            data.context = Some(Rc::new(RefCell::new(context)));
        }
        Ok(data.context.clone())
    }

    /// The canvas' existing context, if one was created.
    #[must_use]
    pub fn existing_canvas_context(&self, node: NodeId) -> Option<Rc<RefCell<Context2d>>> {
        match &self.get(node)?.kind {
            ElementKind::Canvas(data) => data.context.clone(),
            _ => None,
        }
    }

    /// Set a canvas dimension, resizing the backing store of an existing
    /// context in place (prior pixels are destroyed; zero coerces to 1
    /// inside the context).
    ///
    /// # Errors
    ///
    /// [`CanvasError`] when the reallocation fails.
    pub fn set_canvas_size(
        &mut self,
        node: NodeId,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<(), CanvasError> {
        let Some(Node {
            kind: ElementKind::Canvas(data),
            ..
        }) = self.nodes.get_mut(node.0)
        else {
            return Ok(());
        };
        if let Some(width) = width {
            data.width = width;
        }
        if let Some(height) = height {
            data.height = height;
        }
        if let Some(context) = &data.context {
            context.borrow_mut().resize(data.width, data.height)?;
        }
        Ok(())
    }

    // ---- typed state accessors ----

    /// Script element state.
    #[must_use]
    pub fn script(&self, node: NodeId) -> Option<&ScriptData> {
        match &self.get(node)?.kind {
            ElementKind::Script(data) => Some(data),
            _ => None,
        }
    }

    /// Script element state, mutably.
    pub fn script_mut(&mut self, node: NodeId) -> Option<&mut ScriptData> {
        match &mut self.get_mut(node)?.kind {
            ElementKind::Script(data) => Some(data),
            _ => None,
        }
    }

    /// Style element state, mutably.
    pub fn style_mut(&mut self, node: NodeId) -> Option<&mut StyleData> {
        match &mut self.get_mut(node)?.kind {
            ElementKind::Style(data) => Some(data),
            _ => None,
        }
    }

    /// Input element state, mutably.
    pub fn input_mut(&mut self, node: NodeId) -> Option<&mut InputData> {
        match &mut self.get_mut(node)?.kind {
            ElementKind::Input(data) => Some(data),
            _ => None,
        }
    }

    /// Image element state.
    #[must_use]
    pub fn image(&self, node: NodeId) -> Option<&ImageData> {
        match &self.get(node)?.kind {
            ElementKind::Image(data) => Some(data),
            _ => None,
        }
    }

    /// Image element state, mutably.
    pub fn image_mut(&mut self, node: NodeId) -> Option<&mut ImageData> {
        match &mut self.get_mut(node)?.kind {
            ElementKind::Image(data) => Some(data),
            _ => None,
        }
    }

    /// Video element state, mutably.
    pub fn video_mut(&mut self, node: NodeId) -> Option<&mut VideoData> {
        match &mut self.get_mut(node)?.kind {
            ElementKind::Video(data) => Some(data),
            _ => None,
        }
    }

    /// Canvas element state.
    #[must_use]
    pub fn canvas(&self, node: NodeId) -> Option<&CanvasData> {
        match &self.get(node)?.kind {
            ElementKind::Canvas(data) => Some(data),
            _ => None,
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
