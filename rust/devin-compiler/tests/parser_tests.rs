//! Dedicated parser tests covering grammar disambiguation and the
//! non-recovering error contract.

use devin_compiler::parser::parse;
use devin_core::ast::{Declaration, Expr};

fn parses_clean(source: &str) -> devin_core::ast::Devin {
    let (ast, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
    ast.expect("a successful parse returns an AST")
}

#[test]
fn six_scenario_programs_parse() {
    let scenarios = [
        "def main() { var x = 1; var y = 2; var z = 2*y + x; assert z == 5; }",
        "def main() { var a1 = [4,-2,1,0]; var a2 = a1; a1[1] = 7; assert a1 == [4,7,1,0]; assert a2 == [4,-2,1,0]; }",
        "def main() { var a=[1,2]; assert a*5 == [1,2,1,2,1,2,1,2,1,2]; assert a*0 == []; assert a*(-2) == []; }",
        "def main() { assert factorial(6) == 720; } def factorial(n) { if n==0 { return 1; } return n*factorial(n-1); }",
        "def main() { var a=[9,7,2,5]; update(a, 1, -42); assert a == [9,-42,2,5]; } def update(ref a, i, v) { a[i] = v; }",
        "def main() { assert isOdd(69); assert isEven(420); } def isEven(n) { if n==0 return true; else return isOdd(n-1); } def isOdd(n) { if n==0 return false; else return isEven(n-1); }",
    ];
    for src in scenarios {
        parses_clean(src);
    }
}

#[test]
fn nested_function_declaration_inside_block() {
    let ast = parses_clean("def outer() { def inner() { return; } inner(); }");
    assert_eq!(ast.declarations.len(), 1);
}

#[test]
fn array_literal_with_trailing_index_and_unary() {
    let ast = parses_clean("var a = not len [1,2,3] == 0;");
    match &ast.declarations[0] {
        Declaration::Variable(v) => assert!(matches!(v.initializer, Expr::Binary(_))),
        _ => panic!("expected variable decl"),
    }
}

#[test]
fn non_recovering_error_reports_single_record() {
    let (ast, errors) = parse("def main() { var x = ; }");
    assert!(ast.is_none());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].span.start > 0);
}

#[test]
fn while_and_do_while_conditions_need_no_parens() {
    parses_clean("def f() { var i = 0; while i < 3 { i = i + 1; } }");
    parses_clean("def f() { var i = 0; do { i = i + 1; } while i < 3; }");
}

#[test]
fn compound_assignment_operators_parse() {
    let ast = parses_clean("def f() { var x = 1; x += 2; x -= 1; x *= 3; x /= 2; x %= 2; }");
    assert_eq!(ast.declarations.len(), 1);
}
