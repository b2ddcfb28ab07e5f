//! Traversal over any tree that exposes element-tree style text slots.
//!
//! A node owns its children, its direct leading text (before the first
//! child) and its tail text (after its own closing tag, before the next
//! sibling). Both the text extractor and the substitution engine only rely
//! on this interface.

pub trait MarkupNode: Sized {
    fn children(&self) -> &[Self];
    fn children_mut(&mut self) -> &mut [Self];
    fn text(&self) -> Option<&str>;
    fn tail(&self) -> Option<&str>;
    fn set_text(&mut self, text: String);
    fn set_tail(&mut self, tail: String);
}

/// Pre-order iterator over the descendants of a node, root excluded.
pub struct Descendants<'a, N> {
    stack: Vec<&'a N>,
}

impl<'a, N: MarkupNode> Iterator for Descendants<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

pub fn descendants<N: MarkupNode>(root: &N) -> Descendants<'_, N> {
    Descendants {
        stack: root.children().iter().rev().collect(),
    }
}

/// Visits `node` and then every descendant in document order.
pub fn walk_mut<N, F>(node: &mut N, visit: &mut F)
where
    N: MarkupNode,
    F: FnMut(&mut N),
{
    visit(node);
    for child in node.children_mut() {
        walk_mut(child, visit);
    }
}

/// Concatenation of all text nested inside `node`: its own text, then each
/// child's nested text followed by that child's tail. The node's own tail is
/// not part of it.
pub fn itertext<N: MarkupNode>(node: &N) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text<N: MarkupNode>(node: &N, out: &mut String) {
    if let Some(text) = node.text() {
        out.push_str(text);
    }
    for child in node.children() {
        collect_text(child, out);
        if let Some(tail) = child.tail() {
            out.push_str(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Node {
        label: &'static str,
        text: Option<String>,
        tail: Option<String>,
        children: Vec<Node>,
    }

    impl MarkupNode for Node {
        fn children(&self) -> &[Self] {
            &self.children
        }
        fn children_mut(&mut self) -> &mut [Self] {
            &mut self.children
        }
        fn text(&self) -> Option<&str> {
            self.text.as_deref()
        }
        fn tail(&self) -> Option<&str> {
            self.tail.as_deref()
        }
        fn set_text(&mut self, text: String) {
            self.text = Some(text);
        }
        fn set_tail(&mut self, tail: String) {
            self.tail = Some(tail);
        }
    }

    fn node(label: &'static str, text: Option<&str>, tail: Option<&str>, children: Vec<Node>) -> Node {
        Node {
            label,
            text: text.map(str::to_string),
            tail: tail.map(str::to_string),
            children,
        }
    }

    // <a>x<b>y<d/>z</b>w<c/></a>
    fn sample() -> Node {
        node(
            "a",
            Some("x"),
            None,
            vec![
                node("b", Some("y"), Some("w"), vec![node("d", None, Some("z"), vec![])]),
                node("c", None, None, vec![]),
            ],
        )
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = sample();
        let labels: Vec<&str> = descendants(&root).map(|n| n.label).collect();
        assert_eq!(labels, vec!["b", "d", "c"]);
    }

    #[test]
    fn test_itertext_excludes_own_tail() {
        let root = sample();
        assert_eq!(itertext(&root), "xyzw");
        assert_eq!(itertext(&root.children[0]), "yz");
    }

    #[test]
    fn test_walk_mut_includes_root() {
        let mut root = sample();
        let mut seen = Vec::new();
        walk_mut(&mut root, &mut |n: &mut Node| {
            seen.push(n.label);
            if n.label == "c" {
                n.set_text("filled".to_string());
            }
        });

        assert_eq!(seen, vec!["a", "b", "d", "c"]);
        assert_eq!(root.children[1].text(), Some("filled"));
    }
}
