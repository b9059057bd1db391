pub mod writer;

/// Element kinds the result view is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Table,
    Caption,
    Row,
    Cell,
    Pre,
    Span,
}

impl Tag {
    pub fn name(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Caption => "caption",
            Self::Row => "tr",
            Self::Cell => "td",
            Self::Pre => "pre",
            Self::Span => "span",
        }
    }
}

/// Handle to an element of a [`RenderSurface`].
///
/// Handles carry the generation of the render pass that created them. Once the surface
/// is cleared, handles from earlier passes no longer resolve, so late asynchronous
/// updates holding such a handle are dropped instead of landing in the new result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub class: Option<&'static str>,
    /// Text preceding the children
    pub text: String,
    pub children: Vec<ElementId>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            class: None,
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class == Some(class)
    }
}

/// Arena-backed render target holding the current result set.
///
/// Owned by a single renderer; all mutation happens on one thread between suspension points.
#[derive(Debug, Default)]
pub struct RenderSurface {
    generation: u32,
    elements: Vec<Element>,
    roots: Vec<ElementId>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Default::default()
    }

    /// Removes all content and invalidates every handle handed out so far
    pub fn clear(&mut self) {
        self.elements.clear();
        self.roots.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn append_root(&mut self, element: Element) -> ElementId {
        let id = self.insert(element);
        self.roots.push(id);
        id
    }

    /// Returns `None` (and discards `element`) if `parent` belongs to a cleared result set
    pub fn append_child(&mut self, parent: ElementId, element: Element) -> Option<ElementId> {
        if !self.contains(parent) {
            return None;
        }

        let id = self.insert(element);
        self.elements[parent.index].children.push(id);
        Some(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.generation == self.generation && id.index < self.elements.len()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        if self.contains(id) {
            self.elements.get(id.index)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Element> {
        self.roots.iter().filter_map(|&id| self.get(id))
    }

    pub fn children<'a>(&'a self, element: &'a Element) -> impl Iterator<Item = &'a Element> {
        element.children.iter().filter_map(|&id| self.get(id))
    }

    /// Number of top-level elements with the given tag (and class, if given)
    pub fn count_roots(&self, tag: Tag, class: Option<&str>) -> usize {
        self.roots()
            .filter(|e| e.tag == tag && class.map_or(true, |c| e.has_class(c)))
            .count()
    }

    /// Concatenated text of an element and all of its descendants
    pub fn text_content(&self, element: &Element) -> String {
        let mut text = element.text.clone();
        for child in self.children(element) {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = ElementId {
            index: self.elements.len(),
            generation: self.generation,
        };
        self.elements.push(element);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_insertion_order() {
        let mut surface = RenderSurface::new();
        let cell = surface.append_root(Element::new(Tag::Cell).with_text("10.0.0.1"));
        surface
            .append_child(cell, Element::new(Tag::Span).with_class("port").with_text(":22"))
            .unwrap();
        surface
            .append_child(cell, Element::new(Tag::Span).with_class("hostname").with_text("a.example"))
            .unwrap();

        let cell = surface.get(cell).unwrap();
        assert_eq!(surface.text_content(cell), "10.0.0.1:22a.example");
        let classes: Vec<_> = surface.children(cell).map(|c| c.class).collect();
        assert_eq!(classes, [Some("port"), Some("hostname")]);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut surface = RenderSurface::new();
        let stale = surface.append_root(Element::new(Tag::Table));
        surface.clear();
        assert!(surface.is_empty());

        let fresh = surface.append_root(Element::new(Tag::Table));
        assert_eq!(stale.index, fresh.index);
        assert!(surface.get(stale).is_none());
        assert!(surface
            .append_child(stale, Element::new(Tag::Span))
            .is_none());
        assert!(surface.get(fresh).unwrap().children.is_empty());
    }

    #[test]
    fn count_roots_filters_by_class() {
        let mut surface = RenderSurface::new();
        surface.append_root(Element::new(Tag::Table));
        surface.append_root(Element::new(Tag::Pre));
        surface.append_root(Element::new(Tag::Pre).with_class("error"));

        assert_eq!(surface.count_roots(Tag::Table, None), 1);
        assert_eq!(surface.count_roots(Tag::Pre, None), 2);
        assert_eq!(surface.count_roots(Tag::Pre, Some("error")), 1);
    }
}
