//! Finds parameters that already have a hand-written assignment.

use std::collections::BTreeSet;

use super::ast::{Operand, Stmt};

/// Identifier texts appearing on either side of `identifier = identifier`
/// statements. Other statements, and assignments with any other operand shape,
/// contribute nothing. Identifiers compare by exact text.
pub fn already_assigned(statements: &[Stmt]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for statement in statements {
        let Stmt::Assign(assign) = statement else {
            continue;
        };
        if let (Operand::Identifier(target), Operand::Identifier(source)) =
            (assign.target(), assign.source())
        {
            names.insert(target);
            names.insert(source);
        }
    }
    names
}
