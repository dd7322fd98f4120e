//! Persistent source tree with node tracking.
//!
//! A [`SourceTree`] is a versioned handle over a rowan green root. Each edit
//! returns a new tree one generation later and links one [`EditRecord`] onto
//! the edit log it shares with its ancestors, so older versions stay valid and
//! an edit costs no more than rebuilding the spine above it. A
//! [`TrackedNode`] remembers the child-index path of a node at the generation
//! it was tracked; [`SourceTree::current`] rebases that path through the
//! records written since instead of searching the tree.

use std::fmt;
use std::sync::Arc;

use rowan::{GreenNode, GreenToken, NodeOrToken};

type GreenElement = NodeOrToken<GreenNode, GreenToken>;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::syntax::{green_text, SyntaxKind, SyntaxNode};

/// Child indices from the root to a node. Indices count every child element,
/// tokens included.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    /// Path of `node` within the tree it was created from.
    pub fn of(node: &SyntaxNode) -> Self {
        let mut indices: Vec<usize> = node
            .ancestors()
            .filter(|n| n.parent().is_some())
            .map(|n| n.index())
            .collect();
        indices.reverse();
        NodePath(indices)
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }

    pub fn parent(&self) -> Option<NodePath> {
        let (_, init) = self.0.split_last()?;
        Some(NodePath(init.to_vec()))
    }

    /// Index of the node within its parent.
    pub fn index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_strict_prefix_of(&self, other: &NodePath) -> bool {
        self.0.len() < other.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// Byte range in a source text, in the shape reports serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl From<rowan::TextRange> for TextRange {
    fn from(range: rowan::TextRange) -> Self {
        TextRange::new(usize::from(range.start()), usize::from(range.end()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no node at path {0:?}")]
    MissingNode(NodePath),
    #[error("index {index} is out of bounds for a node with {len} children")]
    OutOfBounds { index: usize, len: usize },
    #[error("the root node has no siblings")]
    RootHasNoParent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRecord {
    Inserted {
        parent: NodePath,
        at: usize,
        count: usize,
    },
    /// The node at `target` was swapped for a new subtree. Paths through it
    /// keep their indices.
    Replaced { target: NodePath },
}

/// One link of the edit log. Versions share their common prefix.
#[derive(Debug)]
struct EditLog {
    record: EditRecord,
    prev: Option<Arc<EditLog>>,
}

/// A node reference that can be re-resolved in later versions of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedNode {
    kind: SyntaxKind,
    path: NodePath,
    generation: u32,
}

impl TrackedNode {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// Path at the generation the node was tracked.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    root: GreenNode,
    generation: u32,
    log: Option<Arc<EditLog>>,
}

impl SourceTree {
    pub fn new(root: GreenNode) -> Self {
        Self {
            root,
            generation: 0,
            log: None,
        }
    }

    /// Fresh red view of the root. Red nodes are cheap and not `Send`.
    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.root.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.root
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Every edit that led to this version, oldest first.
    pub fn history(&self) -> Vec<EditRecord> {
        self.records_since(0).into_iter().cloned().collect()
    }

    pub fn text(&self) -> String {
        green_text(&self.root)
    }

    pub fn node_at(&self, path: &NodePath) -> Option<SyntaxNode> {
        let mut node = self.root();
        for &index in path.indices() {
            node = node.children_with_tokens().nth(index)?.into_node()?;
        }
        Some(node)
    }

    /// `node` must come from this version of the tree.
    pub fn track(&self, node: &SyntaxNode) -> TrackedNode {
        TrackedNode {
            kind: node.kind(),
            path: NodePath::of(node),
            generation: self.generation,
        }
    }

    /// Resolves a tracked node in this version of the tree. Nodes inside a
    /// replaced subtree resolve to the same position in the replacement;
    /// `None` when nothing of the tracked kind is there any more.
    pub fn current(&self, tracked: &TrackedNode) -> Option<SyntaxNode> {
        if tracked.generation > self.generation {
            return None;
        }
        let mut path = tracked.path.clone();
        for record in self.records_since(tracked.generation) {
            if let EditRecord::Inserted { parent, at, count } = record {
                if parent.is_strict_prefix_of(&path) {
                    let slot = &mut path.0[parent.depth()];
                    if *slot >= *at {
                        *slot += count;
                    }
                }
            }
        }

        let node = self.node_at(&path)?;
        if node.kind() != tracked.kind {
            tracing::trace!(?path, found = ?node.kind(), expected = ?tracked.kind, "tracked node was replaced");
            return None;
        }
        Some(node)
    }

    /// Inserts `elements` into the children of `parent` before index `at`.
    pub fn insert_at(
        &self,
        parent: &NodePath,
        at: usize,
        elements: Vec<GreenElement>,
    ) -> Result<SourceTree, EditError> {
        if elements.is_empty() {
            return Ok(self.clone());
        }
        let node = self
            .node_at(parent)
            .ok_or_else(|| EditError::MissingNode(parent.clone()))?;
        let green = node.green();
        let len = green.children().len();
        if at > len {
            return Err(EditError::OutOfBounds { index: at, len });
        }
        let count = elements.len();
        let root = node.replace_with(green.splice_children(at..at, elements));
        Ok(self.next(
            root,
            EditRecord::Inserted {
                parent: parent.clone(),
                at,
                count,
            },
        ))
    }

    /// Inserts `elements` as siblings immediately before the node at `anchor`.
    pub fn insert_before(
        &self,
        anchor: &NodePath,
        elements: Vec<GreenElement>,
    ) -> Result<SourceTree, EditError> {
        let parent = anchor.parent().ok_or(EditError::RootHasNoParent)?;
        let at = anchor.index().ok_or(EditError::RootHasNoParent)?;
        self.insert_at(&parent, at, elements)
    }

    pub fn replace(&self, target: &NodePath, replacement: GreenNode) -> Result<SourceTree, EditError> {
        let node = self
            .node_at(target)
            .ok_or_else(|| EditError::MissingNode(target.clone()))?;
        let root = node.replace_with(replacement);
        Ok(self.next(
            root,
            EditRecord::Replaced {
                target: target.clone(),
            },
        ))
    }

    fn next(&self, root: GreenNode, record: EditRecord) -> SourceTree {
        SourceTree {
            root,
            generation: self.generation + 1,
            log: Some(Arc::new(EditLog {
                record,
                prev: self.log.clone(),
            })),
        }
    }

    /// Records written after `generation`, oldest first.
    fn records_since(&self, generation: u32) -> Vec<&EditRecord> {
        let mut records = Vec::new();
        let mut entry = self.log.as_deref();
        let mut remaining = self.generation.saturating_sub(generation);
        while remaining > 0 {
            let Some(link) = entry else {
                break;
            };
            records.push(&link.record);
            entry = link.prev.as_deref();
            remaining -= 1;
        }
        records.reverse();
        records
    }
}

/// Offset to 1-based line/column conversion. Columns count bytes.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

#[cfg(test)]
mod tests {
    use rowan::{GreenToken, NodeOrToken};

    use super::*;

    fn tok(kind: SyntaxKind, text: &str) -> GreenElement {
        NodeOrToken::Token(GreenToken::new(kind.into(), text))
    }

    fn word(kind: SyntaxKind, name: &str) -> GreenNode {
        GreenNode::new(kind.into(), vec![tok(SyntaxKind::Ident, name)])
    }

    fn ident(name: &str) -> GreenElement {
        NodeOrToken::Node(word(SyntaxKind::Other, name))
    }

    /// `{ a b }` as a block holding two opaque nodes.
    fn sample() -> SourceTree {
        let block = GreenNode::new(
            SyntaxKind::Block.into(),
            vec![
                tok(SyntaxKind::Punct, "{"),
                tok(SyntaxKind::Whitespace, " "),
                ident("a"),
                tok(SyntaxKind::Whitespace, " "),
                ident("b"),
                tok(SyntaxKind::Whitespace, " "),
                tok(SyntaxKind::Punct, "}"),
            ],
        );
        SourceTree::new(GreenNode::new(
            SyntaxKind::CompilationUnit.into(),
            vec![NodeOrToken::Node(block)],
        ))
    }

    #[test]
    fn text_round_trips() {
        assert_eq!(sample().text(), "{ a b }");
    }

    #[test]
    fn node_at_reports_offsets() {
        let tree = sample();
        let path = NodePath::root().child(0).child(4);
        let b = tree.node_at(&path).unwrap();
        assert_eq!(b.text().to_string(), "b");
        assert_eq!(TextRange::from(b.text_range()), TextRange::new(4, 5));
        assert_eq!(NodePath::of(&b), path);
        assert!(tree.node_at(&NodePath::root().child(0).child(1)).is_none());
    }

    #[test]
    fn tracked_node_is_rebased_after_sibling_insert() {
        let tree = sample();
        let b_path = NodePath::root().child(0).child(4);
        let tracked = tree.track(&tree.node_at(&b_path).unwrap());

        let edited = tree
            .insert_before(&b_path, vec![ident("x"), tok(SyntaxKind::Whitespace, " ")])
            .unwrap();
        assert_eq!(edited.text(), "{ a x b }");
        assert_eq!(edited.generation(), 1);
        assert!(matches!(
            edited.history().as_slice(),
            [EditRecord::Inserted { at: 4, count: 2, .. }]
        ));

        let current = edited.current(&tracked).unwrap();
        assert_eq!(current.text().to_string(), "b");
        assert_eq!(NodePath::of(&current), NodePath::root().child(0).child(6));
    }

    #[test]
    fn insert_after_tracked_node_does_not_move_it() {
        let tree = sample();
        let a_path = NodePath::root().child(0).child(2);
        let tracked = tree.track(&tree.node_at(&a_path).unwrap());
        let edited = tree
            .insert_at(&NodePath::root().child(0), 6, vec![tok(SyntaxKind::Punct, ";")])
            .unwrap();
        assert_eq!(NodePath::of(&edited.current(&tracked).unwrap()), a_path);
        assert_eq!(edited.text(), "{ a b ;}");
    }

    #[test]
    fn replaced_node_resolves_to_replacement() {
        let tree = sample();
        let a_path = NodePath::root().child(0).child(2);
        let tracked = tree.track(&tree.node_at(&a_path).unwrap());

        let edited = tree.replace(&a_path, word(SyntaxKind::Other, "renamed")).unwrap();
        assert_eq!(edited.text(), "{ renamed b }");
        assert_eq!(edited.current(&tracked).unwrap().text().to_string(), "renamed");
        assert_eq!(
            edited.history(),
            vec![EditRecord::Replaced { target: a_path }]
        );
    }

    #[test]
    fn nodes_inside_a_replaced_subtree_keep_their_position() {
        let tree = sample();
        let block_path = NodePath::root().child(0);
        let a = tree.track(&tree.node_at(&block_path.child(2)).unwrap());
        let b = tree.track(&tree.node_at(&block_path.child(4)).unwrap());

        // Same shape, but `b` becomes a bare token.
        let block = GreenNode::new(
            SyntaxKind::Block.into(),
            vec![
                tok(SyntaxKind::Punct, "{"),
                tok(SyntaxKind::Whitespace, " "),
                ident("q"),
                tok(SyntaxKind::Whitespace, " "),
                tok(SyntaxKind::Ident, "r"),
                tok(SyntaxKind::Whitespace, " "),
                tok(SyntaxKind::Punct, "}"),
            ],
        );
        let edited = tree.replace(&block_path, block).unwrap();

        assert_eq!(edited.current(&a).unwrap().text().to_string(), "q");
        assert!(edited.current(&b).is_none());
    }

    #[test]
    fn tracked_kind_must_match() {
        let tree = sample();
        let a_path = NodePath::root().child(0).child(2);
        let tracked = tree.track(&tree.node_at(&a_path).unwrap());
        let edited = tree.replace(&a_path, word(SyntaxKind::Type, "a")).unwrap();
        assert!(edited.current(&tracked).is_none());
        assert_eq!(tracked.kind(), SyntaxKind::Other);
    }

    #[test]
    fn original_tree_is_untouched_by_edits() {
        let tree = sample();
        let _ = tree
            .insert_before(&NodePath::root().child(0).child(2), vec![ident("z")])
            .unwrap();
        assert_eq!(tree.text(), "{ a b }");
        assert_eq!(tree.generation(), 0);
        assert!(tree.history().is_empty());
    }

    #[test]
    fn versions_share_their_edit_log() {
        let tree = sample();
        let block = NodePath::root().child(0);
        let first = tree.insert_at(&block, 1, vec![ident("x")]).unwrap();
        let second = first.insert_at(&block, 1, vec![ident("y")]).unwrap();
        let third = second.insert_at(&block, 1, vec![ident("z")]).unwrap();

        assert_eq!(third.text(), "{zyx a b }");
        assert_eq!(third.history().len(), 3);
        assert_eq!(first.history().len(), 1);
        let first_link = first.log.as_ref().unwrap();
        let shared = second.log.as_ref().unwrap().prev.as_ref().unwrap();
        assert!(Arc::ptr_eq(first_link, shared));

        let tracked = third.track(&third.node_at(&block.child(1)).unwrap());
        assert_eq!(tracked.generation(), 3);
        assert!(first.current(&tracked).is_none());
    }

    #[test]
    fn edits_report_bad_paths() {
        let tree = sample();
        assert_eq!(
            tree.insert_before(&NodePath::root(), vec![ident("z")]).unwrap_err(),
            EditError::RootHasNoParent
        );
        let err = tree
            .insert_at(&NodePath::root().child(0), 42, vec![ident("z")])
            .unwrap_err();
        assert_eq!(err, EditError::OutOfBounds { index: 42, len: 7 });
        let missing = NodePath::root().child(3);
        assert_eq!(
            tree.replace(&missing, word(SyntaxKind::Other, "z")).unwrap_err(),
            EditError::MissingNode(missing)
        );
    }

    #[test]
    fn line_index_maps_offsets() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(4), (2, 2));
    }
}
