//! Syntax kinds and the rowan language binding.
//!
//! Every byte of the parsed text lives in exactly one token, trivia included,
//! so concatenating the tokens of a tree reproduces the source verbatim.
//! Green nodes are immutable and shared between tree versions; red nodes
//! ([`SyntaxNode`]) add parent pointers and offsets on top of them.

use core::mem;

use rowan::{GreenNode, Language};

/// Token and node kinds for the C# subset the engine understands.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxKind {
    // Tokens
    Whitespace = 0,
    Comment,
    Directive,
    Ident,
    Keyword,
    Literal,
    Punct,
    /// Text the grammar could not place.
    Unknown,

    // Nodes
    CompilationUnit,
    UsingDirective,
    NamespaceDecl,
    TypeDecl,
    EnumDecl,
    MemberList,
    AttributeList,
    Attribute,
    FieldDecl,
    EventDecl,
    DelegateDecl,
    PropertyDecl,
    AccessorList,
    Accessor,
    MethodDecl,
    ConstructorDecl,
    ConstructorInitializer,
    ParamList,
    Param,
    Type,
    VariableDecl,
    VariableDeclarator,
    Block,
    ExprStmt,
    AssignExpr,
    ArrowExpr,
    /// Any other construct; kept opaque.
    Other,
    Error,
}

impl SyntaxKind {
    pub fn from_raw(raw: rowan::SyntaxKind) -> Self {
        if raw.0 <= SyntaxKind::Error as u16 {
            // SAFETY: the enum is `repr(u16)` with contiguous discriminants
            // starting at zero, and `raw` is within range.
            unsafe { mem::transmute::<u16, SyntaxKind>(raw.0) }
        } else {
            SyntaxKind::Unknown
        }
    }

    pub fn is_token(self) -> bool {
        (self as u16) < SyntaxKind::CompilationUnit as u16
    }

    /// Whitespace, comments and preprocessor lines.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace | SyntaxKind::Comment | SyntaxKind::Directive
        )
    }

    pub fn is_member(self) -> bool {
        matches!(
            self,
            SyntaxKind::FieldDecl
                | SyntaxKind::EventDecl
                | SyntaxKind::DelegateDecl
                | SyntaxKind::PropertyDecl
                | SyntaxKind::MethodDecl
                | SyntaxKind::ConstructorDecl
                | SyntaxKind::TypeDecl
                | SyntaxKind::EnumDecl
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

/// Marker type binding [`SyntaxKind`] to rowan's untyped trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CSharp {}

impl Language for CSharp {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        SyntaxKind::from_raw(raw)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<CSharp>;
pub type SyntaxToken = rowan::SyntaxToken<CSharp>;
pub type SyntaxElement = rowan::SyntaxElement<CSharp>;

/// Source text of a detached green node.
pub fn green_text(green: &GreenNode) -> String {
    SyntaxNode::new_root(green.clone()).text().to_string()
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Reserved words; identifiers spelled like these need an `@` prefix.
pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}
