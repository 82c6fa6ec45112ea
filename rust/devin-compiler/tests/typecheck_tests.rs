//! Dedicated type checker tests: the operator tables, tainting rule, two-pass
//! forward reference support, and the diagnostic catalog in spec §7.

use devin_core::ast::{BlockItem, Declaration, Expr, Stmt};
use devin_core::Type;
use devin_compiler::{check, parser::parse, TypeDiagnostic};

fn diagnostics_for(source: &str) -> Vec<TypeDiagnostic> {
    let (ast, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    let (_, diags) = check(ast.unwrap());
    diags
}

fn assert_clean(source: &str) {
    let diags = diagnostics_for(source);
    assert!(diags.is_empty(), "expected no diagnostics, got {:?}", diags);
}

#[test]
fn six_scenario_programs_check_clean() {
    let scenarios = [
        "def main() { var x = 1; var y = 2; var z = 2*y + x; assert z == 5; }",
        "def main() { var a1 = [4,-2,1,0]; var a2 = a1; a1[1] = 7; assert a1 == [4,7,1,0]; assert a2 == [4,-2,1,0]; }",
        "def main() { var a=[1,2]; assert a*5 == [1,2,1,2,1,2,1,2,1,2]; assert a*0 == []; assert a*(-2) == []; }",
        "def main() { assert factorial(6) == 720; } def factorial(n) { if n==0 { return 1; } return n*factorial(n-1); }",
        "def main() { var a=[9,7,2,5]; update(a, 1, -42); assert a == [9,-42,2,5]; } def update(ref a, i, v) { a[i] = v; }",
        "def main() { assert isOdd(69); assert isEven(420); } def isEven(n) { if n==0 return true; else return isOdd(n-1); } def isOdd(n) { if n==0 return false; else return isEven(n-1); }",
    ];
    for src in scenarios {
        assert_clean(src);
    }
}

#[test]
fn invalid_binary_operand_types_are_reported() {
    let diags = diagnostics_for("def main() { var x = true + 1; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::InvalidBinary { .. })));
}

#[test]
fn invalid_unary_operand_is_reported() {
    let diags = diagnostics_for("def main() { var x = not 1; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::InvalidUnary { .. })));
}

#[test]
fn error_taints_without_cascading() {
    // `y` is unknown (one diagnostic); using it in further arithmetic must
    // not emit a second InvalidBinary on top of the UnknownVariable.
    let diags = diagnostics_for("def main() { var x = (y + 1) * 2; }");
    assert_eq!(diags.len(), 1);
    assert!(matches!(diags[0], TypeDiagnostic::UnknownVariable { .. }));
}

#[test]
fn array_index_out_of_array_type_is_reported() {
    let diags = diagnostics_for("def main() { var x = 1; var y = x[0]; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::InvalidType { .. })));
}

#[test]
fn assign_to_non_lvalue_is_reported() {
    let diags = diagnostics_for("def main() { 1 = 2; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::InvalidAssign { .. })));
}

#[test]
fn missing_return_value_on_bare_return() {
    let diags = diagnostics_for("def f(): Int { return; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::MissingReturnValue { .. })));
}

#[test]
fn unannotated_parameters_are_unknown_and_permissive() {
    assert_clean("def add(a, b) { return a + b; } def main() { assert add(1, 2) == 3; }");
}

#[test]
fn unknown_function_records_a_placeholder_overload() {
    let diags = diagnostics_for("def main() { missing(1); missing(1); }");
    let unknown_fn_count = diags
        .iter()
        .filter(|d| matches!(d, TypeDiagnostic::UnknownFunction { .. }))
        .count();
    assert_eq!(unknown_fn_count, 1, "second identical call must not re-diagnose: {:?}", diags);
}

#[test]
fn unannotated_return_type_on_unresolved_name_is_reported() {
    let diags = diagnostics_for("def f(): Frobnicator { return; }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::UnknownType { .. })));
}

#[test]
fn return_value_type_mismatch_is_reported() {
    let diags = diagnostics_for("def f(): Int { return true; } def main() { f(); }");
    assert!(diags.iter().any(|d| matches!(d, TypeDiagnostic::InvalidReturnType { .. })));
}

#[test]
fn while_loop_body_checks_in_its_own_scope() {
    assert_clean("def main() { var i = 0; while i < 3 { i += 1; } assert i == 3; }");
}

#[test]
fn comparison_and_logical_ops_synthesize_bool_on_unknown_operands() {
    // `a`/`b` are unannotated, so their parameter type is `Unknown`. The
    // comparison/equality/logical operators must still type as `Bool` rather
    // than inheriting the operand's placeholder type.
    let cases = [
        ("def eq(a, b) { return a == b; }", "eq"),
        ("def lt(a, b) { return a < b; }", "lt"),
        ("def both(a, b) { return a and b; }", "both"),
    ];
    for (src, name) in cases {
        let (ast, errors) = parse(src);
        assert!(errors.is_empty(), "parse errors for {name}: {:?}", errors);
        let (checked, diags) = check(ast.unwrap());
        assert!(diags.is_empty(), "unexpected diagnostics for {name}: {:?}", diags);
        let f = checked
            .declarations
            .iter()
            .find_map(|d| match d {
                Declaration::Function(f) if f.name == name => Some(f),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no function named {name}"));
        let Stmt::Block(items, _) = f.body.as_ref() else { panic!("expected a block body") };
        let Some(BlockItem::Statement(Stmt::Return(Some(value), _))) = items.first() else {
            panic!("expected a single return statement in {name}");
        };
        let Expr::Binary(b) = value.as_ref() else { panic!("expected a binary expression") };
        assert_eq!(b.ty, Some(Type::Bool), "{name} should synthesize Bool");
    }
}

#[test]
fn nested_function_can_recurse_into_itself() {
    assert_clean(
        "def main() { \
            def fact(n) { if n == 0 { return 1; } return n * fact(n - 1); } \
            assert fact(5) == 120; \
         }",
    );
}

#[test]
fn nested_functions_can_be_mutually_recursive() {
    assert_clean(
        "def main() { \
            def isEven(n) { if n==0 return true; else return isOdd(n-1); } \
            def isOdd(n) { if n==0 return false; else return isEven(n-1); } \
            assert isOdd(69); \
            assert isEven(420); \
         }",
    );
}

#[test]
fn do_while_loop_checks_clean() {
    assert_clean("def main() { var i = 0; do { i += 1; } while i < 3; assert i == 3; }");
}
