//! Selector matching against any [`TreeView`].
//!
//! Matching runs right-to-left with backtracking over descendant and
//! subsequent-sibling combinators.

use super::parser::{AttrCondition, AttrOp, Combinator, Complex, Compound};
use crate::query::{ShadowMode, TreeView};

pub(crate) fn matches_complex<V: TreeView>(
    view: &V,
    node: V::NodeId,
    complex: &Complex,
    mode: ShadowMode,
) -> bool {
    match complex.len() {
        0 => false,
        len => matches_from(view, node, complex, len - 1, mode),
    }
}

fn matches_from<V: TreeView>(
    view: &V,
    node: V::NodeId,
    parts: &Complex,
    idx: usize,
    mode: ShadowMode,
) -> bool {
    let part = &parts[idx];
    if !matches_compound(view, node, &part.compound) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match part.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => parent_element(view, node, ShadowMode::Light)
            .is_some_and(|parent| matches_from(view, parent, parts, idx - 1, mode)),
        Combinator::Descendant => {
            let mut cursor = parent_element(view, node, mode);
            while let Some(ancestor) = cursor {
                if matches_from(view, ancestor, parts, idx - 1, mode) {
                    return true;
                }
                cursor = parent_element(view, ancestor, mode);
            }
            false
        }
        Combinator::NextSibling => previous_element_sibling(view, node)
            .is_some_and(|sibling| matches_from(view, sibling, parts, idx - 1, mode)),
        Combinator::SubsequentSibling => {
            let mut cursor = previous_element_sibling(view, node);
            while let Some(sibling) = cursor {
                if matches_from(view, sibling, parts, idx - 1, mode) {
                    return true;
                }
                cursor = previous_element_sibling(view, sibling);
            }
            false
        }
    }
}

fn matches_compound<V: TreeView>(view: &V, node: V::NodeId, compound: &Compound) -> bool {
    let Some(tag) = view.tag_name(node) else {
        return false;
    };

    if let Some(expected) = &compound.tag {
        if !tag.eq_ignore_ascii_case(expected) {
            return false;
        }
    }

    if !compound
        .ids
        .iter()
        .all(|id| view.attribute(node, "id") == Some(id.as_str()))
    {
        return false;
    }

    if !compound.classes.is_empty() {
        let class_attr = view.attribute(node, "class").unwrap_or_default();
        if !compound
            .classes
            .iter()
            .all(|class| class_attr.split_ascii_whitespace().any(|c| c == class))
        {
            return false;
        }
    }

    compound
        .attrs
        .iter()
        .all(|cond| matches_attr(view.attribute(node, &cond.name), cond))
}

fn matches_attr(actual: Option<&str>, cond: &AttrCondition) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    if cond.op == AttrOp::Exists {
        return true;
    }

    let (actual, expected) = if cond.case_insensitive {
        (actual.to_lowercase(), cond.value.to_lowercase())
    } else {
        (actual.to_string(), cond.value.clone())
    };

    match cond.op {
        AttrOp::Exists => true,
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|word| word == expected)
        }
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// The element a combinator steps to from `node`.
///
/// In [`ShadowMode::Pierce`] a shadow root's children see the shadow host as
/// their parent element.
fn parent_element<V: TreeView>(view: &V, node: V::NodeId, mode: ShadowMode) -> Option<V::NodeId> {
    let parent = view.parent(node)?;
    if view.tag_name(parent).is_some() {
        return Some(parent);
    }
    match mode {
        ShadowMode::Pierce => view.shadow_host(parent),
        ShadowMode::Light => None,
    }
}

fn previous_element_sibling<V: TreeView>(view: &V, node: V::NodeId) -> Option<V::NodeId> {
    let parent = view.parent(node)?;
    let siblings = view.children(parent);
    let index = siblings.iter().position(|&sibling| sibling == node)?;
    siblings[..index]
        .iter()
        .rev()
        .copied()
        .find(|&sibling| view.tag_name(sibling).is_some())
}
