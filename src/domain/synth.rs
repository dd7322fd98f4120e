//! Property and assignment synthesis for constructor parameters.

use thiserror::Error;

use super::model::{Accessor, Assignment, Parameter, PropertyDeclaration};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("parameter has no name")]
    EmptyIdentifier,
}

/// First character upper-cased, the rest unchanged. A character whose upper
/// case is longer than one character (`ß` -> `SS`) is kept as is.
pub fn capitalize(name: &str) -> Result<String, SynthError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(SynthError::EmptyIdentifier)?;
    let mut upper = first.to_uppercase();
    let head = match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => first,
    };
    Ok(std::iter::once(head).chain(chars).collect())
}

/// Public get-only auto-property named after the parameter.
pub fn to_property(parameter: &Parameter) -> Result<PropertyDeclaration, SynthError> {
    Ok(PropertyDeclaration {
        name: capitalize(&parameter.name)?,
        ty: parameter.ty.clone(),
        accessor: Accessor::Get,
    })
}

/// `Property = parameter`.
pub fn to_assignment(parameter: &Parameter, property: &PropertyDeclaration) -> Assignment {
    Assignment {
        target: property.name.clone(),
        source: parameter.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use rowan::{GreenNode, GreenToken, NodeOrToken};

    use super::*;
    use crate::domain::model::TypeRef;
    use crate::domain::syntax::SyntaxKind;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter {
            name: name.into(),
            ty: TypeRef::new(GreenNode::new(
                SyntaxKind::Type.into(),
                vec![NodeOrToken::Token(GreenToken::new(SyntaxKind::Keyword.into(), ty))],
            )),
        }
    }

    #[test]
    fn capitalizes_first_character_only() {
        assert_eq!(capitalize("arg").unwrap(), "Arg");
        assert_eq!(capitalize("myProperty").unwrap(), "MyProperty");
        assert_eq!(capitalize("isOK").unwrap(), "IsOK");
        assert_eq!(capitalize("_value").unwrap(), "_value");
        assert_eq!(capitalize("élan").unwrap(), "Élan");
    }

    #[test]
    fn multi_character_upper_case_keeps_the_original() {
        assert_eq!(capitalize("ßeta").unwrap(), "ßeta");
        assert_eq!(capitalize("ŉame").unwrap(), "ŉame");
        assert_eq!(capitalize("ǆungla").unwrap(), "Ǆungla");
    }

    #[test]
    fn property_keeps_parameter_type() {
        let p = param("count", "int");
        let prop = to_property(&p).unwrap();
        assert_eq!(prop.name, "Count");
        assert_eq!(prop.ty.text(), "int");
        assert_eq!(prop.accessor, Accessor::Get);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(to_property(&param("", "int")), Err(SynthError::EmptyIdentifier));
    }

    #[test]
    fn assignment_targets_property() {
        let p = param("arg", "string");
        let prop = to_property(&p).unwrap();
        assert_eq!(to_assignment(&p, &prop).to_string(), "Arg = arg;");
    }
}
