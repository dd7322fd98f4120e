//! Typed views over [`SyntaxNode`]s.
//!
//! Each view wraps a node of one kind and exposes the pieces the fixer and the
//! analyzers read. Views are cheap to create; they hold a red node.

use serde::{Deserialize, Serialize};

use super::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

pub trait AstNode: Sized {
    const KIND: SyntaxKind;

    fn from_syntax(node: SyntaxNode) -> Self;

    fn syntax(&self) -> &SyntaxNode;

    fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == Self::KIND).then(|| Self::from_syntax(node))
    }
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            const KIND: SyntaxKind = SyntaxKind::$kind;

            fn from_syntax(node: SyntaxNode) -> Self {
                $name(node)
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(CompilationUnit, CompilationUnit);
ast_node!(
    /// `class`, `struct`, `record` or `interface` declaration.
    TypeDecl,
    TypeDecl
);
ast_node!(MemberList, MemberList);
ast_node!(ConstructorDecl, ConstructorDecl);
ast_node!(MethodDecl, MethodDecl);
ast_node!(ParamList, ParamList);
ast_node!(Param, Param);
ast_node!(TypeSyntax, Type);
ast_node!(Block, Block);
ast_node!(ExprStmt, ExprStmt);
ast_node!(AssignExpr, AssignExpr);
ast_node!(AttributeList, AttributeList);
ast_node!(Attribute, Attribute);

fn child<N: AstNode>(node: &SyntaxNode) -> Option<N> {
    node.children().find_map(N::cast)
}

fn children<N: AstNode>(node: &SyntaxNode) -> Vec<N> {
    node.children().filter_map(N::cast).collect()
}

/// Direct child tokens, trivia excluded.
pub fn significant_tokens(node: &SyntaxNode) -> Vec<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(SyntaxElement::into_token)
        .filter(|t| !t.kind().is_trivia())
        .collect()
}

fn first_ident(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(SyntaxElement::into_token)
        .find(|t| t.kind() == SyntaxKind::Ident)
}

fn ident_name(node: &SyntaxNode) -> Option<String> {
    first_ident(node).map(|t| identifier_text(t.text()).to_string())
}

/// Text of an identifier without the `@` verbatim prefix.
pub fn identifier_text(token: &str) -> &str {
    token.strip_prefix('@').unwrap_or(token)
}

impl CompilationUnit {
    /// Every type declaration, including nested and namespaced ones.
    pub fn type_decls(&self) -> Vec<TypeDecl> {
        self.0.descendants().filter_map(TypeDecl::cast).collect()
    }

    /// Constructors named after the type that declares them, in source order.
    pub fn constructors(&self) -> Vec<ConstructorDecl> {
        self.0
            .descendants()
            .filter_map(ConstructorDecl::cast)
            .filter(ConstructorDecl::names_its_type)
            .collect()
    }
}

impl TypeDecl {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    /// Declared members in source order.
    pub fn members(&self) -> Vec<SyntaxNode> {
        child::<MemberList>(&self.0)
            .map(|list| {
                list.0
                    .children()
                    .filter(|n| n.kind().is_member())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `(name, kind)` of every named member.
    pub fn member_names(&self) -> Vec<(String, MemberKind)> {
        self.members().iter().filter_map(member_name).collect()
    }
}

/// What kind of member a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
    NestedType,
    Other,
}

impl MemberKind {
    /// Fields and properties can be assigned from a constructor.
    pub fn is_storage(self) -> bool {
        matches!(self, MemberKind::Field | MemberKind::Property)
    }
}

/// Name and kind of a member declaration node. Fields declaring several
/// variables report the first one.
pub fn member_name(node: &SyntaxNode) -> Option<(String, MemberKind)> {
    let kind = match node.kind() {
        SyntaxKind::FieldDecl => MemberKind::Field,
        SyntaxKind::PropertyDecl => MemberKind::Property,
        SyntaxKind::MethodDecl => MemberKind::Method,
        SyntaxKind::ConstructorDecl => MemberKind::Constructor,
        SyntaxKind::TypeDecl | SyntaxKind::EnumDecl | SyntaxKind::DelegateDecl => {
            MemberKind::NestedType
        }
        SyntaxKind::EventDecl => MemberKind::Other,
        _ => return None,
    };
    let name = ident_name(node).or_else(|| {
        node.descendants()
            .find(|n| n.kind() == SyntaxKind::VariableDeclarator)
            .and_then(|declarator| ident_name(&declarator))
    })?;
    Some((name, kind))
}

impl ConstructorDecl {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    /// The name token, for diagnostics.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        first_ident(&self.0)
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child(&self.0)
    }

    pub fn params(&self) -> Vec<Param> {
        self.param_list().map(|l| l.params()).unwrap_or_default()
    }

    /// Block body; `None` for expression-bodied or bodiless constructors.
    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }

    pub fn has_initializer(&self) -> bool {
        self.0
            .children()
            .any(|n| n.kind() == SyntaxKind::ConstructorInitializer)
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        attributes_of(&self.0)
    }

    /// The nearest type declaration around the constructor.
    pub fn containing_type(&self) -> Option<TypeDecl> {
        self.0.ancestors().skip(1).find_map(TypeDecl::cast)
    }

    /// A method without a return type also parses as a constructor; only the
    /// ones named after their type are real. Without a known type the name
    /// cannot be checked and the constructor is kept.
    pub fn names_its_type(&self) -> bool {
        match self.containing_type().and_then(|ty| ty.name()) {
            Some(type_name) => self.name().as_deref() == Some(type_name.as_str()),
            None => true,
        }
    }
}

impl MethodDecl {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn params(&self) -> Vec<Param> {
        child::<ParamList>(&self.0)
            .map(|l| l.params())
            .unwrap_or_default()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        attributes_of(&self.0)
    }
}

fn attributes_of(node: &SyntaxNode) -> Vec<Attribute> {
    children::<AttributeList>(node)
        .into_iter()
        .flat_map(|list| list.attributes())
        .collect()
}

impl AttributeList {
    pub fn attributes(&self) -> Vec<Attribute> {
        children(&self.0)
    }
}

impl Attribute {
    /// Dotted name without arguments, e.g. `System.Obsolete`.
    pub fn name(&self) -> String {
        self.0
            .first_child_or_token()
            .map(|element| match element {
                SyntaxElement::Node(node) => node.text().to_string(),
                SyntaxElement::Token(token) => token.text().to_string(),
            })
            .unwrap_or_default()
    }

    /// Last segment of the name with any `Attribute` suffix removed.
    pub fn simple_name(&self) -> String {
        let name = self.name();
        let last = name.rsplit(['.', ':']).next().unwrap_or(&name);
        last.strip_suffix("Attribute").unwrap_or(last).to_string()
    }
}

impl ParamList {
    pub fn params(&self) -> Vec<Param> {
        children(&self.0)
    }
}

impl Param {
    /// Parameter name; `None` when the declaration has no identifier.
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn ty(&self) -> Option<TypeSyntax> {
        child(&self.0)
    }
}

impl TypeSyntax {
    pub fn text(&self) -> String {
        self.0.text().to_string()
    }
}

impl Block {
    pub fn statements(&self) -> Vec<Stmt> {
        self.0.children().map(Stmt::from_node).collect()
    }
}

/// A statement in a block. Only simple assignments are interpreted.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign(AssignExpr),
    Other(SyntaxNode),
}

impl Stmt {
    fn from_node(node: SyntaxNode) -> Self {
        if node.kind() == SyntaxKind::ExprStmt {
            if let Some(assign) = child::<AssignExpr>(&node).filter(AssignExpr::is_simple) {
                return Stmt::Assign(assign);
            }
        }
        Stmt::Other(node)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::Assign(assign) => assign.syntax(),
            Stmt::Other(node) => node,
        }
    }
}

/// Either side of `target = source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Identifier(String),
    Other,
}

impl AssignExpr {
    /// Plain `=`, not a compound assignment.
    pub fn is_simple(&self) -> bool {
        self.operator().is_some_and(|op| op.text() == "=")
    }

    fn operator(&self) -> Option<SyntaxToken> {
        significant_tokens(&self.0)
            .into_iter()
            .find(|t| t.kind() == SyntaxKind::Punct && t.text().ends_with('='))
    }

    /// Non-trivia children on each side of the operator.
    fn sides(&self) -> (Option<SyntaxElement>, Option<SyntaxElement>) {
        let Some(op) = self.operator() else {
            return (None, None);
        };
        let significant = |e: &SyntaxElement| !e.kind().is_trivia();
        let left = self
            .0
            .children_with_tokens()
            .take_while(|e| e.as_token() != Some(&op))
            .find(significant);
        let right = op.siblings_with_tokens(rowan::Direction::Next).skip(1).find(significant);
        (left, right)
    }

    fn operand(element: Option<SyntaxElement>) -> Operand {
        match element {
            Some(SyntaxElement::Token(token)) if token.kind() == SyntaxKind::Ident => {
                Operand::Identifier(identifier_text(token.text()).to_string())
            }
            _ => Operand::Other,
        }
    }

    pub fn target(&self) -> Operand {
        Self::operand(self.sides().0)
    }

    pub fn source(&self) -> Operand {
        Self::operand(self.sides().1)
    }
}
