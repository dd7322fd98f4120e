//! Syntactic analyzers reporting candidates for the constructor fix and
//! primitive-typed parameters on methods marked `[NoPrimitiveTypes]`.

use super::ast::{AstNode, Attribute, CompilationUnit, ConstructorDecl, MethodDecl, Param};
use super::diagnostics::{Diagnostic, Rule, Severity};
use super::fix::{plan, FixOptions};
use super::tree::{LineIndex, SourceTree, TextRange};

pub trait Analyzer: Send + Sync {
    fn rule(&self) -> Rule;

    fn analyze(&self, tree: &SourceTree, lines: &LineIndex) -> Vec<Diagnostic>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Constructors
// ═══════════════════════════════════════════════════════════════════════════

pub const CONSTRUCTOR_RULE: Rule = Rule {
    id: "CP0001",
    category: "Naming",
    severity: Severity::Warning,
};

/// Flags every constructor, at its name.
#[derive(Debug, Clone, Default)]
pub struct ConstructorAnalyzer {
    pub options: FixOptions,
}

impl Analyzer for ConstructorAnalyzer {
    fn rule(&self) -> Rule {
        CONSTRUCTOR_RULE
    }

    fn analyze(&self, tree: &SourceTree, lines: &LineIndex) -> Vec<Diagnostic> {
        let Some(unit) = CompilationUnit::cast(tree.root()) else {
            return Vec::new();
        };
        unit.constructors()
            .into_iter()
            .map(|ctor| {
                let name = ctor.name().unwrap_or_default();
                let range = ctor
                    .name_token()
                    .map(|t| t.text_range())
                    .unwrap_or_else(|| ctor.syntax().text_range());
                let mut diagnostic = CONSTRUCTOR_RULE.at(
                    TextRange::from(range),
                    lines,
                    format!("Constructor '{name}' can expose its parameters as properties"),
                );
                diagnostic.fixable = plan(ctor.syntax(), &self.options).report.changed();
                diagnostic
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Primitive parameter types
// ═══════════════════════════════════════════════════════════════════════════

pub const NO_PRIMITIVE_TYPES_RULE: Rule = Rule {
    id: "C001",
    category: "",
    severity: Severity::Error,
};

const PRIMITIVE_ALIASES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "short", "int", "long", "object", "sbyte",
    "float", "string", "ushort", "uint", "ulong",
];

const PRIMITIVE_SYSTEM_NAMES: &[&str] = &[
    "Boolean", "Byte", "Char", "DateTime", "Decimal", "Double", "Enum", "Int16", "Int32",
    "Int64", "Object", "SByte", "Single", "String", "UInt16", "UInt32", "UInt64",
];

/// Whether a type spelling names one of the disallowed primitive types.
/// Nullable, array and generic spellings are not primitives themselves.
pub fn is_primitive_type(spelling: &str) -> bool {
    let compact: String = spelling.chars().filter(|c| !c.is_whitespace()).collect();
    if PRIMITIVE_ALIASES.contains(&compact.as_str()) {
        return true;
    }
    let unqualified = compact
        .strip_prefix("global::")
        .unwrap_or(&compact);
    unqualified
        .strip_prefix("System.")
        .is_some_and(|name| PRIMITIVE_SYSTEM_NAMES.contains(&name))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrimitiveTypesAnalyzer;

impl NoPrimitiveTypesAnalyzer {
    fn check(
        attributes: Vec<Attribute>,
        params: Vec<Param>,
        lines: &LineIndex,
        out: &mut Vec<Diagnostic>,
    ) {
        let has_primitive = params
            .iter()
            .filter_map(Param::ty)
            .any(|ty| is_primitive_type(&ty.text()));
        if !has_primitive {
            return;
        }
        for attribute in attributes {
            if attribute.simple_name() == "NoPrimitiveTypes" {
                out.push(NO_PRIMITIVE_TYPES_RULE.at(
                    attribute.syntax().text_range().into(),
                    lines,
                    "Primitive types are not allowed in this method".to_string(),
                ));
            }
        }
    }
}

impl Analyzer for NoPrimitiveTypesAnalyzer {
    fn rule(&self) -> Rule {
        NO_PRIMITIVE_TYPES_RULE
    }

    fn analyze(&self, tree: &SourceTree, lines: &LineIndex) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for node in tree.root().descendants() {
            if let Some(method) = MethodDecl::cast(node.clone()) {
                Self::check(method.attributes(), method.params(), lines, &mut out);
            } else if let Some(ctor) = ConstructorDecl::cast(node) {
                Self::check(ctor.attributes(), ctor.params(), lines, &mut out);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::parser::parse_source;

    fn run(analyzer: &dyn Analyzer, source: &str) -> Vec<Diagnostic> {
        let parse = parse_source(source);
        analyzer.analyze(&parse.tree, &LineIndex::new(source))
    }

    #[test]
    fn constructor_diagnostic_points_at_name() {
        let source = "class Person\n{\n    public Person(string name) { }\n}";
        let diags = run(&ConstructorAnalyzer::default(), source);
        assert_eq!(diags.len(), 1);
        let d = &diags[0];
        assert_eq!(d.id, "CP0001");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.message, "Constructor 'Person' can expose its parameters as properties");
        assert_eq!((d.line, d.column), (3, 12));
        assert_eq!(&source[d.range.start..d.range.end], "Person");
        assert!(d.fixable);
    }

    #[test]
    fn covered_constructor_is_not_fixable() {
        let diags = run(
            &ConstructorAnalyzer::default(),
            "class C { C() { } C(int a) { A = a; } void M(int b) { } }",
        );
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| !d.fixable));
    }

    #[test]
    fn primitive_type_set() {
        for ty in ["int", "string", "System.DateTime", "global::System.Int32", "System.Enum", "object"] {
            assert!(is_primitive_type(ty), "{ty}");
        }
        for ty in ["int?", "int[]", "List<int>", "DateTime", "Money", "System.Guid"] {
            assert!(!is_primitive_type(ty), "{ty}");
        }
    }

    #[test]
    fn flags_attributed_methods_and_constructors() {
        let source = r#"
class Account
{
    [NoPrimitiveTypes("value objects only")]
    public void Deposit(Money amount, string note) { }

    [NoPrimitiveTypesAttribute]
    public Account(Money opening) { }

    public void Withdraw(int cents) { }

    [Obsolete, Checks.NoPrimitiveTypes]
    public Account(System.Int64 id) { }
}
"#;
        let diags = run(&NoPrimitiveTypesAnalyzer, source);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.id == "C001" && d.severity == Severity::Error));
        assert_eq!(diags[0].message, "Primitive types are not allowed in this method");
        assert_eq!(diags[0].line, 4);
        assert_eq!(&source[diags[1].range.start..diags[1].range.end], "Checks.NoPrimitiveTypes");
    }
}
