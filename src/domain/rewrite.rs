//! Applies a constructor fix to a [`SourceTree`] as two edits: synthesized
//! properties go in front of the constructor, synthesized assignments go at
//! the end of its body.
//!
//! The constructor is tracked before the first edit and re-resolved in the
//! intermediate tree, so the body edit lands on the right node even though the
//! insertion shifted it. Only the inserted elements carry new trivia; every
//! pre-existing token is kept as is.

use rowan::GreenNode;

use super::ast::{AstNode, ConstructorDecl};
use super::make;
use super::model::{Assignment, PropertyDeclaration};
use super::syntax::{SyntaxElement, SyntaxKind, SyntaxNode};
use super::tree::{EditError, NodePath, SourceTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Added to the closing brace's indentation when an empty multi-line body
    /// receives its first statements. Tab-indented bodies always use a tab.
    pub indent_unit: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            indent_unit: "    ".to_string(),
        }
    }
}

pub fn rewrite(
    tree: &SourceTree,
    constructor: &SyntaxNode,
    properties: &[PropertyDeclaration],
    assignments: &[Assignment],
) -> Result<SourceTree, EditError> {
    rewrite_with(tree, constructor, properties, assignments, &RewriteOptions::default())
}

pub fn rewrite_with(
    tree: &SourceTree,
    constructor: &SyntaxNode,
    properties: &[PropertyDeclaration],
    assignments: &[Assignment],
    options: &RewriteOptions,
) -> Result<SourceTree, EditError> {
    let Some(ctor) = ConstructorDecl::cast(constructor.clone()) else {
        tracing::debug!(kind = ?constructor.kind(), "not a constructor, leaving tree unchanged");
        return Ok(tree.clone());
    };
    if properties.is_empty() && assignments.is_empty() {
        return Ok(tree.clone());
    }
    if ctor.body().is_none() {
        tracing::debug!("constructor has no block body, leaving tree unchanged");
        return Ok(tree.clone());
    }

    let tracked = tree.track(constructor);
    let with_properties = insert_properties(tree, constructor, properties)?;

    let current = with_properties
        .current(&tracked)
        .and_then(ConstructorDecl::cast)
        .ok_or_else(|| EditError::MissingNode(tracked.path().clone()))?;
    let body = current
        .body()
        .ok_or_else(|| EditError::MissingNode(NodePath::of(current.syntax())))?;

    let new_body = append_statements(body.syntax(), assignments, options);
    let result = with_properties.replace(&NodePath::of(body.syntax()), new_body)?;

    tracing::debug!(
        properties = properties.len(),
        assignments = assignments.len(),
        generation = result.generation(),
        "constructor rewritten"
    );
    Ok(result)
}

fn insert_properties(
    tree: &SourceTree,
    constructor: &SyntaxNode,
    properties: &[PropertyDeclaration],
) -> Result<SourceTree, EditError> {
    if properties.is_empty() {
        return Ok(tree.clone());
    }
    let parent = constructor.parent().ok_or(EditError::RootHasNoParent)?;
    let siblings: Vec<SyntaxElement> = parent.children_with_tokens().collect();

    let at = insertion_index(&siblings, constructor.index());
    let separator = at
        .checked_sub(1)
        .and_then(|i| whitespace_text(&siblings[i]))
        .and_then(line_tail)
        .unwrap_or(" ")
        .to_string();

    let mut elements = Vec::with_capacity(properties.len() * 2);
    for property in properties {
        elements.push(rowan::NodeOrToken::Node(make::property(property)));
        elements.push(make::whitespace(&separator));
    }
    tree.insert_at(&NodePath::of(&parent), at, elements)
}

fn whitespace_text(element: &SyntaxElement) -> Option<&str> {
    element
        .as_token()
        .filter(|t| t.kind() == SyntaxKind::Whitespace)
        .map(|t| t.text())
}

fn is_comment(element: &SyntaxElement) -> bool {
    element.kind() == SyntaxKind::Comment
}

/// Index in front of the constructor, moved up over a run of comments that
/// sits on its own lines directly above it.
fn insertion_index(siblings: &[SyntaxElement], ctor_index: usize) -> usize {
    let mut at = ctor_index;
    let mut i = ctor_index;
    while i > 0 {
        let element = &siblings[i - 1];
        if let Some(ws) = whitespace_text(element) {
            if ws.matches('\n').count() > 1 {
                break;
            }
            i -= 1;
        } else if is_comment(element) {
            let own_line = i >= 2
                && whitespace_text(&siblings[i - 2]).is_some_and(|ws| ws.contains('\n'));
            if !own_line {
                break;
            }
            i -= 1;
            at = i;
        } else {
            break;
        }
    }
    at
}

/// The final line break of `ws` and the indentation after it.
fn line_tail(ws: &str) -> Option<&str> {
    let nl = ws.rfind('\n')?;
    let start = if ws[..nl].ends_with('\r') { nl - 1 } else { nl };
    Some(&ws[start..])
}

fn append_statements(
    block: &SyntaxNode,
    assignments: &[Assignment],
    options: &RewriteOptions,
) -> GreenNode {
    let green = block.green();
    if assignments.is_empty() {
        return green.into_owned();
    }
    let children: Vec<SyntaxElement> = block.children_with_tokens().collect();
    let is_punct = |e: &SyntaxElement, text: &str| {
        e.as_token()
            .is_some_and(|t| t.kind() == SyntaxKind::Punct && t.text() == text)
    };
    let open = children.iter().position(|e| is_punct(e, "{")).unwrap_or(0);
    let close = children
        .iter()
        .rposition(|e| is_punct(e, "}"))
        .filter(|&close| close > open)
        .unwrap_or(children.len());

    let statements = assignments
        .iter()
        .map(|a| rowan::NodeOrToken::Node(make::assignment_statement(a)));

    let last = (open + 1..close)
        .rev()
        .find(|&i| children[i].kind() != SyntaxKind::Whitespace);
    match last {
        Some(last) => {
            let separator = statement_separator(&children, open, last, close, options);
            let mut elements = Vec::with_capacity(assignments.len() * 2);
            for statement in statements {
                elements.push(make::whitespace(&separator));
                elements.push(statement);
            }
            green.splice_children(last + 1..last + 1, elements)
        }
        None => {
            let inner: String = children[open + 1..close]
                .iter()
                .filter_map(whitespace_text)
                .collect();
            let mut elements = Vec::with_capacity(assignments.len() * 2 + 1);
            match inner.rfind('\n') {
                Some(nl) => {
                    let newline = if inner[..nl].ends_with('\r') { "\r\n" } else { "\n" };
                    let brace_indent = &inner[nl + 1..];
                    let unit = indent_unit(brace_indent, options);
                    for statement in statements {
                        elements.push(make::whitespace(&format!("{newline}{brace_indent}{unit}")));
                        elements.push(statement);
                    }
                    elements.push(make::whitespace(&format!("{newline}{brace_indent}")));
                }
                None => {
                    for statement in statements {
                        elements.push(make::whitespace(" "));
                        elements.push(statement);
                    }
                    elements.push(make::whitespace(" "));
                }
            }
            green.splice_children(open + 1..close, elements)
        }
    }
}

/// Trivia placed before each appended statement: the line break and
/// indentation of the last line that starts a statement, or a single space on
/// one-line bodies.
fn statement_separator(
    children: &[SyntaxElement],
    open: usize,
    last: usize,
    close: usize,
    options: &RewriteOptions,
) -> String {
    let preceding = (open + 1..last)
        .rev()
        .find_map(|i| whitespace_text(&children[i]).and_then(line_tail));
    if let Some(tail) = preceding {
        return tail.to_string();
    }

    let ends_line = match &children[last] {
        SyntaxElement::Token(t) => {
            t.kind() == SyntaxKind::Directive
                || (t.kind() == SyntaxKind::Comment && t.text().starts_with("//"))
        }
        SyntaxElement::Node(_) => false,
    };
    if !ends_line {
        return " ".to_string();
    }
    // Single-line body ending in a line comment: indent from the closing brace.
    let closing = children[last + 1..close]
        .iter()
        .filter_map(whitespace_text)
        .find_map(line_tail)
        .unwrap_or("\n");
    let brace_indent = closing.trim_start_matches(['\r', '\n']);
    format!("{closing}{}", indent_unit(brace_indent, options))
}

fn indent_unit<'o>(brace_indent: &str, options: &'o RewriteOptions) -> &'o str {
    if brace_indent.contains('\t') {
        "\t"
    } else {
        &options.indent_unit
    }
}
