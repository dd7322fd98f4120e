//! Plain values the fixer reasons about, detached from the tree.

use std::fmt;

use rowan::GreenNode;

use super::ast::{AstNode, Param};
use super::syntax::green_text;

/// A declared type, kept as the parameter's own green `Type` node so generic,
/// nullable and array spellings are reproduced exactly. Green nodes carry no
/// position, so the same node can be shared by the new property.
#[derive(Clone)]
pub struct TypeRef(GreenNode);

impl TypeRef {
    pub fn new(green: GreenNode) -> Self {
        TypeRef(green)
    }

    pub fn green(&self) -> &GreenNode {
        &self.0
    }

    pub fn text(&self) -> String {
        green_text(&self.0)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({:?})", self.text())
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.text() == other.text()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Identifier text without any `@` prefix. Empty when the declaration has
    /// no name.
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    /// `None` when the parameter has no declared type.
    pub fn from_syntax(param: &Param) -> Option<Self> {
        let ty = param.ty()?;
        Some(Parameter {
            name: param.name().unwrap_or_default(),
            ty: TypeRef::new(ty.syntax().green().into_owned()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Get,
}

/// `public <ty> <name> { get; }`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub ty: TypeRef,
    pub accessor: Accessor,
}

/// `<target> = <source>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: String,
    pub source: String,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {};", self.target, self.source)
    }
}
