use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Extent;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a drawable element attached to a container.
///
/// Ids are process-unique, so a remount never sees the id of a stale
/// element again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Host region an effect renders into.
///
/// The effect layer only ever appends its own element and removes it again
/// on teardown; it never touches children it did not create.
pub trait Container {
    /// Current content box in physical pixels.
    fn content_size(&self) -> Extent;

    /// Attaches a drawable element as the last child.
    fn append_child(&mut self, element: ElementId);

    /// Detaches `element`. Returns false when it was not a child.
    fn remove_child(&mut self, element: ElementId) -> bool;

    /// Number of attached children.
    fn child_count(&self) -> usize;

    /// Presentable target for GPU surfaces, when the host has one.
    ///
    /// Containers without a window return `None`; GPU contexts then render
    /// offscreen.
    fn gpu_target(&self) -> Option<wgpu::SurfaceTarget<'static>> {
        None
    }
}

/// Windowless container: a size and a child list.
#[derive(Debug, Clone, Default)]
pub struct HeadlessContainer {
    size: Extent,
    children: Vec<ElementId>,
}

impl HeadlessContainer {
    pub fn new(size: Extent) -> Self {
        Self {
            size,
            children: Vec::new(),
        }
    }

    /// Changes the content box. The caller is responsible for forwarding the
    /// change to any mounted effect.
    pub fn set_size(&mut self, size: Extent) {
        self.size = size;
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.children.contains(&element)
    }
}

impl Container for HeadlessContainer {
    fn content_size(&self) -> Extent {
        self.size
    }

    fn append_child(&mut self, element: ElementId) {
        self.children.push(element);
    }

    fn remove_child(&mut self, element: ElementId) -> bool {
        let before = self.children.len();
        self.children.retain(|&e| e != element);
        self.children.len() != before
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_are_unique() {
        let a = ElementId::next();
        let b = ElementId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn headless_container_tracks_children() {
        let mut c = HeadlessContainer::new(Extent::new(10, 10));
        let e = ElementId::next();
        c.append_child(e);
        assert!(c.contains(e));
        assert!(c.remove_child(e));
        assert!(!c.remove_child(e));
        assert_eq!(c.child_count(), 0);
    }
}
