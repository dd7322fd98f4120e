//! Factory for synthesized syntax. Generated nodes carry single-space trivia
//! only; line breaks and indentation are added by the rewriter.

use rowan::{GreenNode, GreenToken, NodeOrToken};

type GreenElement = NodeOrToken<GreenNode, GreenToken>;

use super::model::{Accessor, Assignment, PropertyDeclaration};
use super::syntax::{is_keyword, SyntaxKind};

fn token(kind: SyntaxKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

fn node(kind: SyntaxKind, children: Vec<GreenElement>) -> GreenElement {
    NodeOrToken::Node(GreenNode::new(kind.into(), children))
}

pub fn whitespace(text: &str) -> GreenElement {
    token(SyntaxKind::Whitespace, text)
}

fn punct(text: &str) -> GreenElement {
    token(SyntaxKind::Punct, text)
}

fn space() -> GreenElement {
    whitespace(" ")
}

/// Identifier token, escaped with `@` when the name is a reserved word.
pub fn ident(name: &str) -> GreenElement {
    if is_keyword(name) {
        token(SyntaxKind::Ident, &format!("@{name}"))
    } else {
        token(SyntaxKind::Ident, name)
    }
}

/// `public <Type> <Name> { get; }`
pub fn property(decl: &PropertyDeclaration) -> GreenNode {
    let accessors = match decl.accessor {
        Accessor::Get => vec![node(
            SyntaxKind::Accessor,
            vec![token(SyntaxKind::Keyword, "get"), punct(";")],
        )],
    };

    let mut list = vec![punct("{")];
    for accessor in accessors {
        list.push(space());
        list.push(accessor);
    }
    list.push(space());
    list.push(punct("}"));

    GreenNode::new(
        SyntaxKind::PropertyDecl.into(),
        vec![
            token(SyntaxKind::Keyword, "public"),
            space(),
            NodeOrToken::Node(decl.ty.green().clone()),
            space(),
            ident(&decl.name),
            space(),
            node(SyntaxKind::AccessorList, list),
        ],
    )
}

/// `<Target> = <source>;` as an expression statement.
pub fn assignment_statement(assignment: &Assignment) -> GreenNode {
    let expr = node(
        SyntaxKind::AssignExpr,
        vec![
            ident(&assignment.target),
            space(),
            punct("="),
            space(),
            ident(&assignment.source),
        ],
    );
    GreenNode::new(SyntaxKind::ExprStmt.into(), vec![expr, punct(";")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::{AssignExpr, AstNode, Operand};
    use crate::domain::model::TypeRef;
    use crate::domain::syntax::{green_text, SyntaxNode};

    fn ty(text: &str) -> TypeRef {
        TypeRef::new(GreenNode::new(
            SyntaxKind::Type.into(),
            vec![token(SyntaxKind::Ident, text)],
        ))
    }

    #[test]
    fn property_text() {
        let decl = PropertyDeclaration {
            name: "Arg".into(),
            ty: ty("string"),
            accessor: Accessor::Get,
        };
        assert_eq!(green_text(&property(&decl)), "public string Arg { get; }");
    }

    #[test]
    fn property_shares_the_parameter_type() {
        let decl = PropertyDeclaration {
            name: "Items".into(),
            ty: ty("List<int>"),
            accessor: Accessor::Get,
        };
        let node = SyntaxNode::new_root(property(&decl));
        let copied = node.children().find(|n| n.kind() == SyntaxKind::Type).unwrap();
        assert_eq!(copied.text().to_string(), "List<int>");
        assert_eq!(&*copied.green(), &**decl.ty.green());
    }

    #[test]
    fn assignment_escapes_reserved_words() {
        let stmt = SyntaxNode::new_root(assignment_statement(&Assignment {
            target: "Class".into(),
            source: "class".into(),
        }));
        assert_eq!(stmt.text().to_string(), "Class = @class;");
        let assign = stmt.children().find_map(AssignExpr::cast).unwrap();
        assert!(assign.is_simple());
        assert_eq!(assign.target(), Operand::Identifier("Class".into()));
        assert_eq!(assign.source(), Operand::Identifier("class".into()));
    }
}
