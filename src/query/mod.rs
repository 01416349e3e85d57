//! Shadow-piercing element queries.
//!
//! Queries walk the descendants of a scope node in pre-order. With
//! [`ShadowMode::Pierce`] each element's open shadow tree is visited right
//! after the element itself and before its light children; closed shadow
//! roots are never entered.

mod view;

pub use view::TreeView;

use crate::dom::{Element, Node};
use crate::selector::{Selector, SelectorList};

/// Whether queries descend into open shadow roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowMode {
    /// Light tree only.
    Light,
    /// Descend into open shadow roots.
    #[default]
    Pierce,
}

impl From<bool> for ShadowMode {
    fn from(support_shadow_dom: bool) -> Self {
        if support_shadow_dom {
            ShadowMode::Pierce
        } else {
            ShadowMode::Light
        }
    }
}

/// First element below `root` matching the selector list.
///
/// Selectors are tried in order; the first one with any match wins.
pub fn query_first(root: &Node, selectors: &SelectorList, mode: ShadowMode) -> Option<Element> {
    let doc = root.document();
    let found = doc.with_view(|tree| first_match(tree, root.id(), selectors, mode))?;
    doc.element(found)
}

/// Every element below `root` matching the first selector of the list that matches anything.
pub fn query_all(root: &Node, selectors: &SelectorList, mode: ShadowMode) -> Vec<Element> {
    let doc = root.document();
    let found = doc.with_view(|tree| {
        selectors
            .iter()
            .map(|selector| all_matches(tree, root.id(), selector, mode))
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    });
    found
        .into_iter()
        .filter_map(|id| doc.element(id))
        .collect()
}

/// Tree-generic form of [`query_first`].
pub fn first_match<V: TreeView>(
    view: &V,
    scope: V::NodeId,
    selectors: &SelectorList,
    mode: ShadowMode,
) -> Option<V::NodeId> {
    selectors.iter().find_map(|selector| {
        walk(view, scope, mode).find(|&node| selector.matches(view, node, mode))
    })
}

fn all_matches<V: TreeView>(
    view: &V,
    scope: V::NodeId,
    selector: &Selector,
    mode: ShadowMode,
) -> Vec<V::NodeId> {
    walk(view, scope, mode)
        .filter(|&node| selector.matches(view, node, mode))
        .collect()
}

/// Pre-order iterator over the elements below `scope`.
fn walk<V: TreeView>(view: &V, scope: V::NodeId, mode: ShadowMode) -> Walk<'_, V> {
    let mut walk = Walk {
        view,
        mode,
        stack: Vec::new(),
    };
    walk.expand(scope);
    walk
}

struct Walk<'a, V: TreeView> {
    view: &'a V,
    mode: ShadowMode,
    stack: Vec<V::NodeId>,
}

impl<V: TreeView> Walk<'_, V> {
    /// Push the children of `node` so that shadow content pops before light children.
    fn expand(&mut self, node: V::NodeId) {
        self.stack
            .extend(self.view.children(node).iter().rev().copied());
        if self.mode == ShadowMode::Pierce {
            if let Some(shadow) = self.view.open_shadow_root(node) {
                self.stack
                    .extend(self.view.children(shadow).iter().rev().copied());
            }
        }
    }
}

impl<V: TreeView> Iterator for Walk<'_, V> {
    type Item = V::NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.expand(node);
            if self.view.tag_name(node).is_some() {
                return Some(node);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, ShadowRootMode};

    fn el(doc: &Document, tag: &str, class: &str) -> Element {
        let element = doc.create_element(tag);
        element.set_attribute("class", class);
        element
    }

    #[test]
    fn test_fallback_order_beats_document_order() {
        let doc = Document::new();
        let body = doc.body();
        let b = el(&doc, "div", "b");
        let a = el(&doc, "div", "a");
        // .b comes first in document order
        body.append_child(&b).unwrap();
        body.append_child(&a).unwrap();

        let list = SelectorList::parse([".a", ".b"]).unwrap();
        assert_eq!(query_first(&body, &list, ShadowMode::Light), Some(a.clone()));

        let list = SelectorList::parse([".missing", ".b"]).unwrap();
        assert_eq!(query_first(&body, &list, ShadowMode::Light), Some(b));
    }

    #[test]
    fn test_shadow_content_precedes_light_children() {
        let doc = Document::new();
        let host = el(&doc, "x-host", "hit");
        doc.body().append_child(&host).unwrap();
        let light_child = el(&doc, "span", "hit");
        host.append_child(&light_child).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Open).unwrap();
        let shadow_child = el(&doc, "span", "hit");
        shadow.append_child(&shadow_child).unwrap();

        let list = SelectorList::parse("span.hit").unwrap();
        let body = doc.body();
        assert_eq!(
            query_first(&body, &list, ShadowMode::Pierce),
            Some(shadow_child.clone())
        );
        assert_eq!(query_first(&body, &list, ShadowMode::Light), Some(light_child.clone()));

        let all = query_all(&body, &SelectorList::parse(".hit").unwrap(), ShadowMode::Pierce);
        assert_eq!(all, vec![host, shadow_child, light_child]);
    }

    #[test]
    fn test_closed_shadow_roots_are_absent() {
        let doc = Document::new();
        let host = doc.create_element("x-secret");
        doc.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Closed).unwrap();
        shadow.append_child(&el(&doc, "p", "inside")).unwrap();

        let list = SelectorList::parse(".inside").unwrap();
        assert_eq!(query_first(&doc.body(), &list, ShadowMode::Pierce), None);
    }

    #[test]
    fn test_nested_open_shadow_roots() {
        let doc = Document::new();
        let outer = doc.create_element("x-outer");
        doc.body().append_child(&outer).unwrap();
        let outer_shadow = outer.attach_shadow(ShadowRootMode::Open).unwrap();
        let inner = doc.create_element("x-inner");
        outer_shadow.append_child(&inner).unwrap();
        let inner_shadow = inner.attach_shadow(ShadowRootMode::Open).unwrap();
        let target = el(&doc, "input", "deep");
        inner_shadow.append_child(&target).unwrap();

        let list = SelectorList::parse("x-outer input.deep").unwrap();
        assert_eq!(
            query_first(&doc.body(), &list, ShadowMode::Pierce),
            Some(target)
        );
    }

    #[test]
    fn test_scope_itself_is_excluded() {
        let doc = Document::new();
        let body = doc.body();
        let list = SelectorList::parse("body").unwrap();
        assert_eq!(query_first(&body, &list, ShadowMode::Pierce), None);
        assert_eq!(query_first(&doc.root(), &list, ShadowMode::Pierce), Some(body));
    }
}
