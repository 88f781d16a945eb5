//! Fail-fast pre-order traversal.

use super::{AsNode, Document, Node, NodeId};

/// Visits `root` and every node below it, depth-first in document order.
///
/// Attributes are not visited. The walk stops at the first `Err` returned by
/// `visit` and hands it back unchanged.
///
/// # Errors
///
/// Returns the first error produced by `visit`.
///
/// # Examples
///
/// ```
/// use xmldom::{tree::walk, Document};
///
/// let doc = Document::parse_str("<a><b><c/></b><d/></a>").unwrap();
/// let root = doc.document_element().unwrap();
/// let mut names = Vec::new();
/// walk(&doc, root, |node| {
///     names.push(doc.node_name(node));
///     Ok::<_, ()>(())
/// })
/// .unwrap();
/// assert_eq!(names, ["a", "b", "c", "d"]);
/// ```
pub fn walk<E, F>(doc: &Document, root: impl AsNode, mut visit: F) -> Result<(), E>
where
    F: FnMut(Node) -> Result<(), E>,
{
    let root = root.node_id();
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(id) = stack.pop() {
        visit(Node::from_kind(id, &doc.node(id).kind))?;
        let start = stack.len();
        stack.extend(doc.children(id));
        stack[start..].reverse();
    }
    Ok(())
}

impl Document {
    /// Walks the document element subtree with [`walk`]. Does nothing when
    /// there is no document element.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visit`.
    pub fn walk<E, F>(&self, visit: F) -> Result<(), E>
    where
        F: FnMut(Node) -> Result<(), E>,
    {
        match self.document_element() {
            Some(root) => walk(self, root, visit),
            None => Ok(()),
        }
    }
}
