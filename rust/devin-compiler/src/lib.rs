//! Devin Compiler
//!
//! Lexes and parses Devin source into an untyped AST, then type-checks it
//! into a typed AST plus a diagnostics list, per the pipeline in spec §2:
//! `source text -> AST -> typed AST + diagnostics`.

pub mod display;
pub mod lexer;
pub mod parser;
pub mod typecheck;

use devin_core::ast::Devin;
use thiserror::Error;

pub use display::display_program;
pub use lexer::{tokenize, LexError};
pub use parser::{parse, ParseError};
pub use typecheck::{check, TypeDiagnostic};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{} type error(s)", .0.len())]
    Type(Vec<TypeDiagnostic>),
}

/// Runs the full front end: parse, then (if parsing succeeded) check.
/// A fatal diagnostic from an earlier stage prevents the later stage, per
/// spec §2's "control flow" rule.
pub fn compile(source: &str) -> Result<Devin, CompileError> {
    let (ast, mut errors) = parse(source);
    if !errors.is_empty() {
        return Err(CompileError::Parse(errors.remove(0)));
    }
    let ast = ast.expect("parse succeeds with no errors iff it returns an AST");
    let (checked, diagnostics) = check(ast);
    if !diagnostics.is_empty() {
        return Err(CompileError::Type(diagnostics));
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_well_typed_program() {
        let result = compile("def main() { var x = 1; assert x == 1; }");
        assert!(result.is_ok());
    }

    #[test]
    fn surfaces_type_errors() {
        let result = compile("def main() { assert y == 1; }");
        assert!(matches!(result, Err(CompileError::Type(_))));
    }

    #[test]
    fn surfaces_parse_errors() {
        let result = compile("def main( { }");
        assert!(matches!(result, Err(CompileError::Parse(_))));
    }
}
