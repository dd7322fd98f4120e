//! C# parsing with tree-sitter, lowered into the lossless rowan tree.
//!
//! tree-sitter node ranges never include surrounding whitespace, so the text
//! between two siblings becomes `Whitespace` tokens owned by their parent.
//! Identifiers, modifiers, literals and comments become single tokens. The
//! parser never fails: `ERROR` nodes are kept (as `Error` nodes), missing
//! tokens are skipped, and both are reported through [`ParseError`]s, so the
//! text of the resulting tree always equals the input.

use rowan::{GreenNode, GreenToken, NodeOrToken};

type GreenElement = NodeOrToken<GreenNode, GreenToken>;
use tree_sitter::{Node, Parser, Tree};

use crate::domain::syntax::SyntaxKind;
use crate::domain::tree::{SourceTree, TextRange};
use crate::ports::{Parse, ParseError, SourceParser};

pub struct CSharpParser;

impl SourceParser for CSharpParser {
    fn parse(&self, text: &str) -> Parse {
        parse_source(text)
    }
}

pub fn parse_source(text: &str) -> Parse {
    let mut lowering = Lowering {
        text,
        errors: Vec::new(),
    };
    let root = match parse_tree(text) {
        Some(tree) => lowering.root(tree.root_node()),
        None => {
            lowering.error("the C# grammar could not be loaded", 0, text.len());
            let mut children = Vec::new();
            lowering.gap(0, text.len(), &mut children);
            GreenNode::new(SyntaxKind::CompilationUnit.into(), children)
        }
    };
    debug_assert_eq!(usize::from(root.text_len()), text.len());
    tracing::trace!(errors = lowering.errors.len(), "parsed source");
    Parse {
        tree: SourceTree::new(root),
        errors: lowering.errors,
    }
}

fn parse_tree(text: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(error) = parser.set_language(&tree_sitter_c_sharp::LANGUAGE.into()) {
        tracing::error!(%error, "failed to load the C# grammar");
        return None;
    }
    parser.parse(text, None)
}

/// Grammar nodes kept as one token.
fn token_kind(node: &Node<'_>, text: &str) -> Option<SyntaxKind> {
    let kind = node.kind();
    let token = match kind {
        "identifier" => SyntaxKind::Ident,
        "comment" => SyntaxKind::Comment,
        "modifier" | "predefined_type" => SyntaxKind::Keyword,
        "interpolated_string_expression" => SyntaxKind::Literal,
        _ if kind.ends_with("_literal") => SyntaxKind::Literal,
        _ if kind.starts_with("preproc_") && !is_preproc_container(kind) => SyntaxKind::Directive,
        _ if node.child_count() == 0 => {
            if node.is_error() {
                SyntaxKind::Unknown
            } else if text.starts_with(|c: char| c.is_alphabetic() || c == '_') {
                SyntaxKind::Keyword
            } else {
                SyntaxKind::Punct
            }
        }
        _ => return None,
    };
    Some(token)
}

/// Conditional directives wrap declarations, so their content is lowered.
fn is_preproc_container(kind: &str) -> bool {
    matches!(kind, "preproc_if" | "preproc_elif" | "preproc_else" | "preproc_if_in_attribute_list")
}

fn node_kind(kind: &str) -> SyntaxKind {
    match kind {
        "compilation_unit" => SyntaxKind::CompilationUnit,
        "using_directive" => SyntaxKind::UsingDirective,
        "namespace_declaration" | "file_scoped_namespace_declaration" => SyntaxKind::NamespaceDecl,
        "class_declaration"
        | "struct_declaration"
        | "record_declaration"
        | "record_struct_declaration"
        | "interface_declaration" => SyntaxKind::TypeDecl,
        "enum_declaration" => SyntaxKind::EnumDecl,
        "declaration_list" => SyntaxKind::MemberList,
        "attribute_list" => SyntaxKind::AttributeList,
        "attribute" => SyntaxKind::Attribute,
        "field_declaration" => SyntaxKind::FieldDecl,
        "event_field_declaration" | "event_declaration" => SyntaxKind::EventDecl,
        "delegate_declaration" => SyntaxKind::DelegateDecl,
        "property_declaration" => SyntaxKind::PropertyDecl,
        "accessor_list" => SyntaxKind::AccessorList,
        "accessor_declaration" => SyntaxKind::Accessor,
        "method_declaration" => SyntaxKind::MethodDecl,
        "constructor_declaration" => SyntaxKind::ConstructorDecl,
        "constructor_initializer" => SyntaxKind::ConstructorInitializer,
        "parameter_list" => SyntaxKind::ParamList,
        "parameter" => SyntaxKind::Param,
        "variable_declaration" => SyntaxKind::VariableDecl,
        "variable_declarator" => SyntaxKind::VariableDeclarator,
        "block" => SyntaxKind::Block,
        "expression_statement" => SyntaxKind::ExprStmt,
        "assignment_expression" => SyntaxKind::AssignExpr,
        "arrow_expression_clause" => SyntaxKind::ArrowExpr,
        "ERROR" => SyntaxKind::Error,
        _ => SyntaxKind::Other,
    }
}

/// Fields whose child is a type; the child gets a `Type` wrapper so the
/// declared type can be copied as one node.
fn is_type_field(field: Option<&str>) -> bool {
    matches!(field, Some("type" | "returns"))
}

struct Lowering<'s> {
    text: &'s str,
    errors: Vec<ParseError>,
}

impl<'s> Lowering<'s> {
    fn root(&mut self, node: Node<'_>) -> GreenNode {
        let mut children = Vec::new();
        let covered = self.children(node, 0, &mut children);
        self.gap(covered, self.text.len(), &mut children);
        GreenNode::new(SyntaxKind::CompilationUnit.into(), children)
    }

    /// Lowers the children of `node` into `out`, starting at byte `pos`.
    /// Returns the end of the text covered so far.
    fn children(&mut self, node: Node<'_>, mut pos: usize, out: &mut Vec<GreenElement>) -> usize {
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return pos;
        }
        loop {
            let child = cursor.node();
            let wrap = is_type_field(cursor.field_name());
            pos = self.child(child, wrap, pos, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        pos
    }

    fn child(&mut self, node: Node<'_>, wrap: bool, pos: usize, out: &mut Vec<GreenElement>) -> usize {
        let (start, end) = (node.start_byte(), node.end_byte());
        if node.is_missing() {
            self.error(&format!("missing `{}`", node.kind()), start, start);
            return pos;
        }
        if end <= pos {
            return pos;
        }
        let start = start.max(pos);
        self.gap(pos, start, out);
        let (element, covered) = self.lower(node, start, end);
        let element = if wrap {
            NodeOrToken::Node(GreenNode::new(SyntaxKind::Type.into(), vec![element]))
        } else {
            element
        };
        out.push(element);
        covered
    }

    fn lower(&mut self, node: Node<'_>, start: usize, end: usize) -> (GreenElement, usize) {
        let source = self.text;
        let text = &source[start..end];
        if node.is_error() {
            self.error("unexpected syntax", start, end);
        }
        if let Some(kind) = token_kind(&node, text) {
            return (NodeOrToken::Token(GreenToken::new(kind.into(), text)), end);
        }
        let mut children = Vec::new();
        let covered = self.children(node, start, &mut children);
        self.gap(covered, end, &mut children);
        let green = GreenNode::new(node_kind(node.kind()).into(), children);
        (NodeOrToken::Node(green), covered.max(end))
    }

    /// Text no grammar node covers: whitespace runs, plus anything else as
    /// `Unknown` tokens.
    fn gap(&mut self, start: usize, end: usize, out: &mut Vec<GreenElement>) {
        if start >= end {
            return;
        }
        let is_space = |c: char| c.is_whitespace() || c == '\u{feff}';
        let source = self.text;
        let mut run_start = start;
        let mut run_space = None;
        for (offset, c) in source[start..end].char_indices() {
            let at = start + offset;
            let space = is_space(c);
            match run_space {
                Some(previous) if previous != space => {
                    self.gap_run(run_start, at, previous, out);
                    run_start = at;
                }
                _ => {}
            }
            run_space = Some(space);
        }
        if let Some(space) = run_space {
            self.gap_run(run_start, end, space, out);
        }
    }

    fn gap_run(&mut self, start: usize, end: usize, space: bool, out: &mut Vec<GreenElement>) {
        let kind = if space {
            SyntaxKind::Whitespace
        } else {
            self.error("unexpected text", start, end);
            SyntaxKind::Unknown
        };
        let source = self.text;
        out.push(NodeOrToken::Token(GreenToken::new(kind.into(), &source[start..end])));
    }

    fn error(&mut self, message: &str, start: usize, end: usize) {
        self.errors.push(ParseError {
            message: message.to_string(),
            range: TextRange::new(start, end),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::syntax::{SyntaxElement, SyntaxNode};

    fn nodes_of(source: &str, kind: SyntaxKind) -> Vec<String> {
        parse_source(source)
            .tree
            .root()
            .descendants()
            .filter(|n| n.kind() == kind)
            .map(|n: SyntaxNode| n.text().to_string())
            .collect()
    }

    fn first(source: &str, kind: SyntaxKind) -> SyntaxNode {
        parse_source(source)
            .tree
            .root()
            .descendants()
            .find(|n| n.kind() == kind)
            .unwrap()
    }

    /// `(kind, text)` of the direct children of `node`.
    fn shape(node: &SyntaxNode) -> Vec<(SyntaxKind, String)> {
        node.children_with_tokens()
            .map(|e| match e {
                SyntaxElement::Node(n) => (n.kind(), n.text().to_string()),
                SyntaxElement::Token(t) => (t.kind(), t.text().to_string()),
            })
            .collect()
    }

    #[test]
    fn parse_is_lossless() {
        let sources = [
            "class C { public C(string arg) { } }",
            "namespace N;\n\npublic sealed class Foo<T> : Bar where T : new()\n{\n    // note\n    private int _x = 1;\n}\n",
            "class A { void M() { if (x) { y = z; } else return; } }",
            "\u{feff}using System;\r\n#region Types\r\nclass C { }\r\n#endregion\r\n",
            "class S { string s = $\"{a} and {b}\"; string v = @\"c:\\\"; }",
            "}}} garbage ((( ;",
            "   \n",
            "",
        ];
        for source in sources {
            let parse = parse_source(source);
            assert_eq!(parse.tree.text(), source);
        }
    }

    #[test]
    fn trivia_belongs_to_the_parent() {
        let list = first("class C\n{\n    int x;\n    C(int a) { }\n}", SyntaxKind::MemberList);
        let kinds: Vec<_> = shape(&list).into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Punct,
                SyntaxKind::Whitespace,
                SyntaxKind::FieldDecl,
                SyntaxKind::Whitespace,
                SyntaxKind::ConstructorDecl,
                SyntaxKind::Whitespace,
                SyntaxKind::Punct,
            ]
        );
        let ctor = first("class C\n{\n    C(int a) { }\n}", SyntaxKind::ConstructorDecl);
        assert_eq!(ctor.text().to_string(), "C(int a) { }");
    }

    #[test]
    fn comments_are_sibling_tokens() {
        let list = first(
            "class C {\n    /// <summary>Doc</summary>\n    C() { }\n}",
            SyntaxKind::MemberList,
        );
        assert!(shape(&list).contains(&(SyntaxKind::Comment, "/// <summary>Doc</summary>".to_string())));
    }

    #[test]
    fn parses_parameters_and_types() {
        let source = "class C { C(Dictionary<string, List<int>> map, int? count = 3, ref int total) { } }";
        assert_eq!(
            nodes_of(source, SyntaxKind::Param),
            vec!["Dictionary<string, List<int>> map", "int? count = 3", "ref int total"]
        );
        let param = first(source, SyntaxKind::Param);
        assert_eq!(
            shape(&param),
            vec![
                (SyntaxKind::Type, "Dictionary<string, List<int>>".to_string()),
                (SyntaxKind::Whitespace, " ".to_string()),
                (SyntaxKind::Ident, "map".to_string()),
            ]
        );
    }

    #[test]
    fn modifiers_and_predefined_types_are_keywords() {
        let prop = first("class C { public int Size { get; } }", SyntaxKind::PropertyDecl);
        let shape = shape(&prop);
        assert_eq!(shape[0], (SyntaxKind::Keyword, "public".to_string()));
        assert_eq!(shape[1], (SyntaxKind::Whitespace, " ".to_string()));
        assert_eq!(shape[2], (SyntaxKind::Type, "int".to_string()));
        assert_eq!(shape[4], (SyntaxKind::Ident, "Size".to_string()));
        assert_eq!(shape[6].0, SyntaxKind::AccessorList);
    }

    #[test]
    fn assignments_are_expression_statements() {
        let source = "class C { C(int a) { Arg = a; this.B = a; var x = a; Call(a); X += 1; } }";
        assert_eq!(
            nodes_of(source, SyntaxKind::AssignExpr),
            vec!["Arg = a", "this.B = a", "X += 1"]
        );
        assert_eq!(nodes_of(source, SyntaxKind::ExprStmt).len(), 4);
        let assign = first(source, SyntaxKind::AssignExpr);
        assert_eq!(
            shape(&assign),
            vec![
                (SyntaxKind::Ident, "Arg".to_string()),
                (SyntaxKind::Whitespace, " ".to_string()),
                (SyntaxKind::Punct, "=".to_string()),
                (SyntaxKind::Whitespace, " ".to_string()),
                (SyntaxKind::Ident, "a".to_string()),
            ]
        );
    }

    #[test]
    fn members_are_classified() {
        let source = r#"
class C
{
    [Obsolete("x")]
    public string Name { get; set; }
    private readonly int _count;
    public int Count => _count;
    public void Run<T>(T value) where T : class { }
    public static C operator +(C a, C b) => a;
    public event EventHandler Changed;
    class Nested { Nested() { } }
}"#;
        assert_eq!(nodes_of(source, SyntaxKind::PropertyDecl).len(), 2);
        assert_eq!(nodes_of(source, SyntaxKind::FieldDecl), vec!["private readonly int _count;"]);
        assert_eq!(nodes_of(source, SyntaxKind::MethodDecl).len(), 1);
        assert_eq!(nodes_of(source, SyntaxKind::EventDecl), vec!["public event EventHandler Changed;"]);
        assert_eq!(nodes_of(source, SyntaxKind::ConstructorDecl), vec!["Nested() { }"]);
        assert_eq!(nodes_of(source, SyntaxKind::Attribute), vec![r#"Obsolete("x")"#]);
        assert_eq!(nodes_of(source, SyntaxKind::TypeDecl).len(), 2);
    }

    #[test]
    fn constructor_initializer_and_expression_body() {
        let source = "class C { public C(int a) : base(a) { } public C() => Init(); }";
        assert_eq!(nodes_of(source, SyntaxKind::ConstructorInitializer), vec![": base(a)"]);
        assert_eq!(nodes_of(source, SyntaxKind::ConstructorDecl).len(), 2);
        assert_eq!(nodes_of(source, SyntaxKind::ArrowExpr), vec!["=> Init()"]);
    }

    #[test]
    fn valid_code_has_no_errors() {
        let source = "namespace N { class C { C() { if (a) { X = y; } else { Y = z; } try { } catch (E e) when (f) { } finally { } } } }";
        let parse = parse_source(source);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
    }

    #[test]
    fn reports_errors_without_losing_text() {
        let source = "class C { C(int a { } }";
        let parse = parse_source(source);
        assert!(!parse.errors.is_empty());
        assert_eq!(parse.tree.text(), source);
    }

    #[test]
    fn gaps_split_whitespace_from_unknown_text() {
        let mut lowering = Lowering {
            text: "  ?? \n",
            errors: Vec::new(),
        };
        let mut out = Vec::new();
        lowering.gap(0, 6, &mut out);
        let kinds: Vec<_> = out.iter().map(|e| SyntaxKind::from_raw(e.kind())).collect();
        assert_eq!(
            kinds,
            vec![SyntaxKind::Whitespace, SyntaxKind::Unknown, SyntaxKind::Whitespace]
        );
        assert_eq!(lowering.errors[0].range, TextRange::new(2, 4));
    }
}
