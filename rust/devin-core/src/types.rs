use serde::{Deserialize, Serialize};
use std::fmt;

/// The static type lattice (spec §3).
///
/// `Error` is bottom and absorbs into any comparison so a single type
/// mistake does not cascade into a wall of follow-on diagnostics. `Unknown`
/// plays the same absorbing role for an unannotated parameter/return type,
/// but retains the written name for diagnostics/equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Unit,
    Bool,
    Int,
    Float,
    Array(Box<Type>),
    Function(Vec<Type>, Box<Type>),
    Unknown(String),
    Error,
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(params, Box::new(ret))
    }

    /// Structural compatibility `~` (spec §3): reflexive, propagates into
    /// `Array`/`Function` structurally, and `Error ~ T` / `Unknown ~ T` for
    /// all `T`.
    pub fn is_compatible(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Unknown(_), _) | (_, Type::Unknown(_)) => true,
            (Type::Unit, Type::Unit) => true,
            (Type::Bool, Type::Bool) => true,
            (Type::Int, Type::Int) => true,
            (Type::Float, Type::Float) => true,
            (Type::Array(a), Type::Array(b)) => a.is_compatible(b),
            (Type::Function(ps1, r1), Type::Function(ps2, r2)) => {
                ps1.len() == ps2.len()
                    && ps1.iter().zip(ps2).all(|(a, b)| a.is_compatible(b))
                    && r1.is_compatible(r2)
            }
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// The element type of an `Array T`, or `None` if not an array
    /// (`Error`/`Unknown` report themselves back so callers can propagate
    /// them without a separate check).
    pub fn array_element(&self) -> Option<Type> {
        match self {
            Type::Array(t) => Some((**t).clone()),
            Type::Error => Some(Type::Error),
            Type::Unknown(n) => Some(Type::Unknown(n.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "Unit"),
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Array(t) => write!(f, "Array {}", t),
            Type::Function(params, ret) => {
                write!(f, "Function [")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, "] {}", ret)
            }
            Type::Unknown(name) => write!(f, "{}", name),
            Type::Error => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexive_compatibility() {
        assert!(Type::Int.is_compatible(&Type::Int));
        assert!(!Type::Int.is_compatible(&Type::Bool));
    }

    #[test]
    fn error_absorbs_both_sides() {
        assert!(Type::Error.is_compatible(&Type::Int));
        assert!(Type::Bool.is_compatible(&Type::Error));
    }

    #[test]
    fn unknown_absorbs_both_sides() {
        let u = Type::Unknown("T".into());
        assert!(u.is_compatible(&Type::Int));
        assert!(Type::array(Type::Int).is_compatible(&Type::array(u)));
    }

    #[test]
    fn arrays_compare_structurally() {
        assert!(Type::array(Type::Int).is_compatible(&Type::array(Type::Int)));
        assert!(!Type::array(Type::Int).is_compatible(&Type::array(Type::Bool)));
    }

    #[test]
    fn functions_compare_pointwise() {
        let f1 = Type::function(vec![Type::Int, Type::Bool], Type::Unit);
        let f2 = Type::function(vec![Type::Int, Type::Bool], Type::Unit);
        let f3 = Type::function(vec![Type::Int], Type::Unit);
        assert!(f1.is_compatible(&f2));
        assert!(!f1.is_compatible(&f3));
    }
}
