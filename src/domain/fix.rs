//! Constructor fix orchestration.
//!
//! [`plan`] decides, without touching the tree, which parameters still need a
//! property and an assignment. [`fix_constructor`] runs the plan through the
//! rewriter, and [`fix_all`] repeats that for every constructor of a tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ast::{AstNode, CompilationUnit, ConstructorDecl, MemberKind};
use super::matcher::already_assigned;
use super::model::{Assignment, Parameter, PropertyDeclaration};
use super::rewrite::{rewrite_with, RewriteOptions};
use super::synth::{to_assignment, to_property, SynthError};
use super::syntax::SyntaxNode;
use super::tree::{EditError, SourceTree, TextRange};

/// What to do when a synthesized name is already declared in the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MemberPolicy {
    /// Assign existing fields and properties instead of declaring a duplicate;
    /// skip parameters whose name is taken by any other member.
    #[default]
    Reuse,
    /// Declare a property for every parameter without looking at existing
    /// members or at the resulting name.
    Ignore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixOptions {
    pub member_policy: MemberPolicy,
    pub rewrite: RewriteOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicable {
    NotAConstructor,
    /// Expression-bodied or extern constructors.
    NoBlockBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum FixStatus {
    Fixed,
    UpToDate,
    NotApplicable(NotApplicable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "member")]
pub enum SkipReason {
    EmptyName,
    MissingType,
    /// Capitalizing does not change the name, so `X = X` would assign the
    /// parameter to itself. Only checked under [`MemberPolicy::Reuse`].
    SameAsParameter,
    ConflictsWithType,
    ConflictsWithMember(MemberKind),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyName => write!(f, "parameter has no name"),
            SkipReason::MissingType => write!(f, "parameter has no declared type"),
            SkipReason::SameAsParameter => write!(f, "property name equals the parameter name"),
            SkipReason::ConflictsWithType => write!(f, "property name equals the enclosing type name"),
            SkipReason::ConflictsWithMember(kind) => {
                let kind = match kind {
                    MemberKind::Field => "field",
                    MemberKind::Property => "property",
                    MemberKind::Method => "method",
                    MemberKind::Constructor => "constructor",
                    MemberKind::NestedType => "nested type",
                    MemberKind::Other => "member",
                };
                write!(f, "a {kind} with that name already exists")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedParameter {
    pub parameter: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Per-constructor summary, detached from any tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorReport {
    pub name: Option<String>,
    /// Range of the constructor in the text the fix started from.
    pub range: TextRange,
    #[serde(flatten)]
    pub status: FixStatus,
    /// Properties declared by the fix, in parameter order.
    pub added: Vec<String>,
    /// Existing fields or properties that only received an assignment.
    pub reused: Vec<String>,
    pub skipped: Vec<SkippedParameter>,
}

impl ConstructorReport {
    pub fn changed(&self) -> bool {
        self.status == FixStatus::Fixed
    }
}

/// The edits a fix would make for one constructor.
#[derive(Debug, Clone)]
pub struct FixPlan {
    pub report: ConstructorReport,
    pub properties: Vec<PropertyDeclaration>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub tree: SourceTree,
    pub report: ConstructorReport,
}

#[derive(Debug, Clone)]
pub struct FixAllOutcome {
    pub tree: SourceTree,
    pub reports: Vec<ConstructorReport>,
}

impl FixAllOutcome {
    pub fn changed(&self) -> bool {
        self.reports.iter().any(ConstructorReport::changed)
    }
}

pub fn plan(constructor: &SyntaxNode, options: &FixOptions) -> FixPlan {
    let mut report = ConstructorReport {
        name: None,
        range: constructor.text_range().into(),
        status: FixStatus::UpToDate,
        added: Vec::new(),
        reused: Vec::new(),
        skipped: Vec::new(),
    };
    let mut properties = Vec::new();
    let mut assignments = Vec::new();

    let Some(ctor) = ConstructorDecl::cast(constructor.clone()) else {
        report.status = FixStatus::NotApplicable(NotApplicable::NotAConstructor);
        return FixPlan { report, properties, assignments };
    };
    report.name = ctor.name();
    let Some(body) = ctor.body() else {
        report.status = FixStatus::NotApplicable(NotApplicable::NoBlockBody);
        return FixPlan { report, properties, assignments };
    };

    let assigned = already_assigned(&body.statements());
    let guarded = options.member_policy == MemberPolicy::Reuse;
    let owner = ctor.containing_type().filter(|_| guarded);
    let type_name = owner.as_ref().and_then(|t| t.name());
    let members = owner.map(|t| t.member_names()).unwrap_or_default();

    for param in ctor.params() {
        let Some(parameter) = Parameter::from_syntax(&param) else {
            report.skipped.push(SkippedParameter {
                parameter: param.name().unwrap_or_default(),
                reason: SkipReason::MissingType,
            });
            continue;
        };
        if assigned.contains(&parameter.name) {
            continue;
        }
        let property = match to_property(&parameter) {
            Ok(property) => property,
            Err(SynthError::EmptyIdentifier) => {
                report.skipped.push(SkippedParameter {
                    parameter: parameter.name.clone(),
                    reason: SkipReason::EmptyName,
                });
                continue;
            }
        };

        let conflict = if guarded && property.name == parameter.name {
            Some(SkipReason::SameAsParameter)
        } else if type_name.as_deref() == Some(property.name.as_str()) {
            Some(SkipReason::ConflictsWithType)
        } else {
            match members.iter().find(|(name, _)| *name == property.name) {
                Some((_, kind)) if kind.is_storage() => {
                    assignments.push(to_assignment(&parameter, &property));
                    report.reused.push(property.name);
                    continue;
                }
                Some((_, kind)) => Some(SkipReason::ConflictsWithMember(*kind)),
                None => None,
            }
        };
        if let Some(reason) = conflict {
            report.skipped.push(SkippedParameter {
                parameter: parameter.name.clone(),
                reason,
            });
            continue;
        }

        assignments.push(to_assignment(&parameter, &property));
        report.added.push(property.name.clone());
        properties.push(property);
    }

    if !assignments.is_empty() {
        report.status = FixStatus::Fixed;
    }
    FixPlan {
        report,
        properties,
        assignments,
    }
}

/// Adds the missing properties and assignments for one constructor.
pub fn fix_constructor(
    tree: &SourceTree,
    constructor: &SyntaxNode,
    options: &FixOptions,
) -> Result<FixOutcome, EditError> {
    let FixPlan {
        report,
        properties,
        assignments,
    } = plan(constructor, options);

    if !report.changed() {
        tracing::debug!(name = ?report.name, status = ?report.status, "constructor left unchanged");
        return Ok(FixOutcome {
            tree: tree.clone(),
            report,
        });
    }
    let tree = rewrite_with(tree, constructor, &properties, &assignments, &options.rewrite)?;
    Ok(FixOutcome { tree, report })
}

/// [`fix_constructor`] with default options, returning only the new tree.
pub fn fix(tree: &SourceTree, constructor: &SyntaxNode) -> Result<SourceTree, EditError> {
    fix_constructor(tree, constructor, &FixOptions::default()).map(|outcome| outcome.tree)
}

/// Fixes every constructor in the tree, in source order. Constructors are
/// tracked before the first edit and re-resolved after each one.
pub fn fix_all(tree: &SourceTree, options: &FixOptions) -> Result<FixAllOutcome, EditError> {
    let tracked: Vec<_> = CompilationUnit::cast(tree.root())
        .map(|unit| unit.constructors())
        .unwrap_or_default()
        .iter()
        .map(|ctor| (tree.track(ctor.syntax()), TextRange::from(ctor.syntax().text_range())))
        .collect();

    let mut current = tree.clone();
    let mut reports = Vec::with_capacity(tracked.len());
    for (node, original_range) in tracked {
        let outcome = match current.current(&node) {
            Some(ctor) => fix_constructor(&current, &ctor, options)?,
            None => {
                tracing::debug!(path = ?node.path(), "constructor could not be re-resolved");
                continue;
            }
        };
        let mut report = outcome.report;
        report.range = original_range;
        reports.push(report);
        current = outcome.tree;
    }

    Ok(FixAllOutcome {
        tree: current,
        reports,
    })
}
