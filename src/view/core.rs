use crate::dom::Attributes;
use crate::slot::SlotId;

/// Declarative description of a subtree, reconciled into the document by the
/// runtime.
#[derive(Debug, Clone)]
pub enum View {
    Text(String),
    Element(ElementView),
    Fragment(Vec<View>),
    Provider(ProviderView),
    Slot(SlotView),
    Portal(PortalView),
}

impl View {
    pub fn text(text: impl Into<String>) -> View {
        View::Text(text.into())
    }

    pub fn element(tag: impl Into<String>) -> ElementView {
        ElementView::new(tag)
    }

    pub fn fragment<I, V>(children: I) -> View
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        View::Fragment(children.into_iter().map(Into::into).collect())
    }

    pub fn empty() -> View {
        View::Fragment(Vec::new())
    }

    /// Wrap `children` in a provider that owns one slot registry.
    pub fn provider<I, V>(children: I) -> View
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        View::Provider(ProviderView {
            children: children.into_iter().map(Into::into).collect(),
        })
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

#[derive(Debug, Clone)]
pub struct ElementView {
    pub(crate) tag: String,
    pub(crate) attrs: Attributes,
    pub(crate) children: Vec<View>,
}

impl ElementView {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<ElementView> for View {
    fn from(view: ElementView) -> Self {
        View::Element(view)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderView {
    pub(crate) children: Vec<View>,
}

impl From<ProviderView> for View {
    fn from(view: ProviderView) -> Self {
        View::Provider(view)
    }
}

/// Producer element: a `div` mount point plus its own children.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub(crate) id: SlotId,
    pub(crate) class: String,
    pub(crate) attrs: Attributes,
    pub(crate) children: Vec<View>,
}

impl SlotView {
    pub(crate) fn new(id: SlotId) -> Self {
        Self {
            id,
            class: String::new(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    /// Extra class tokens merged after the slot's own class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Passthrough attribute for the mount element. `class` is routed through
    /// [`SlotView::class`] so the slot's own tokens are never lost.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if name == "class" {
            return self.class(value);
        }
        self.attrs.insert(name, value.into());
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<SlotView> for View {
    fn from(view: SlotView) -> Self {
        View::Slot(view)
    }
}

/// Consumer: no footprint of its own, projects `children` into the slot.
#[derive(Debug, Clone)]
pub struct PortalView {
    pub(crate) id: SlotId,
    pub(crate) children: Vec<View>,
}

impl PortalView {
    pub(crate) fn new(id: SlotId) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<PortalView> for View {
    fn from(view: PortalView) -> Self {
        View::Portal(view)
    }
}
