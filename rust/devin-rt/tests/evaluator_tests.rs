//! End-to-end evaluator tests: compiles a source string through the full
//! pipeline (parse → check → evaluate) and asserts on the runtime outcome.

use devin_compiler::{check, parser::parse};
use devin_rt::{evaluate, EvalError, State};

fn run(source: &str) -> Result<(), EvalError> {
    let (ast, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    let (checked, diags) = check(ast.unwrap());
    assert!(diags.is_empty(), "type diagnostics: {:?}", diags);
    let mut state = State::new();
    evaluate(&checked, &mut state)
}

#[test]
fn six_scenario_programs_run_clean() {
    let scenarios = [
        "def main() { var x = 1; var y = 2; var z = 2*y + x; assert z == 5; }",
        "def main() { var a1 = [4,-2,1,0]; var a2 = a1; a1[1] = 7; assert a1 == [4,7,1,0]; assert a2 == [4,-2,1,0]; }",
        "def main() { var a=[1,2]; assert a*5 == [1,2,1,2,1,2,1,2,1,2]; assert a*0 == []; assert a*(-2) == []; }",
        "def main() { assert factorial(6) == 720; } def factorial(n) { if n==0 { return 1; } return n*factorial(n-1); }",
        "def main() { var a=[9,7,2,5]; update(a, 1, -42); assert a == [9,-42,2,5]; } def update(ref a, i, v) { a[i] = v; }",
        "def main() { assert isOdd(69); assert isEven(420); } def isEven(n) { if n==0 return true; else return isOdd(n-1); } def isOdd(n) { if n==0 return false; else return isEven(n-1); }",
    ];
    for src in scenarios {
        assert_eq!(run(src), Ok(()), "scenario failed: {}", src);
    }
}

#[test]
fn ref_aliases_the_callers_cell() {
    let result = run(
        "def bump(ref x) { x = x + 1; } \
         def main() { var n = 41; bump(n); assert n == 42; }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn by_value_scalar_does_not_propagate() {
    let result = run(
        "def bump(x) { x = x + 1; } \
         def main() { var n = 41; bump(n); assert n == 41; }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn by_value_array_still_shares_content() {
    let result = run(
        "def zero_first(a) { a[0] = 0; } \
         def main() { var xs = [1,2,3]; zero_first(xs); assert xs == [0,2,3]; }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn exact_rational_arithmetic_sums_to_one() {
    let result = run(
        "def main() { var third = 1.0/3.0; assert third + third + third == 1.0; }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn array_equality_breaks_after_mutation() {
    let result = run(
        "def main() { \
            var a = [1,2,3]; var b = [1,2,3]; \
            assert a == b; \
            a[0] = 99; \
            assert a != b; \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let result = run("def main() { var x = 1/0; }");
    assert!(matches!(result, Err(EvalError::DivisionByZero { .. })));
}

#[test]
fn float_division_by_zero_is_a_runtime_error() {
    let result = run("def main() { var x = 1.0/0.0; }");
    assert!(matches!(result, Err(EvalError::DivisionByZero { .. })));
}

#[test]
fn out_of_bounds_index_is_a_runtime_error() {
    let result = run("def main() { var a = [1,2,3]; var x = a[5]; }");
    assert!(matches!(result, Err(EvalError::IndexOutOfBounds { .. })));
}

#[test]
fn negative_index_is_out_of_bounds() {
    let result = run("def main() { var a = [1,2,3]; var x = a[-1]; }");
    assert!(matches!(result, Err(EvalError::IndexOutOfBounds { .. })));
}

#[test]
fn failing_assert_is_a_runtime_error() {
    let result = run("def main() { assert 1 == 2; }");
    assert!(matches!(result, Err(EvalError::AssertionFailure { .. })));
}

#[test]
fn no_main_is_a_runtime_error() {
    let result = run("def helper() { return 1; }");
    assert!(matches!(result, Err(EvalError::NoMain)));
}

#[test]
fn truncated_modulo_keeps_the_dividends_sign() {
    let result = run("def main() { assert (-7) % 2 == -1; assert 7 % (-2) == 1; }");
    assert_eq!(result, Ok(()));
}

#[test]
fn unbounded_recursion_overflows_the_stack() {
    let result = run("def loop(n) { return loop(n + 1); } def main() { loop(0); }");
    assert!(matches!(result, Err(EvalError::StackOverflow { .. })));
}

#[test]
fn while_loop_pre_tests_and_can_run_zero_times() {
    let result = run(
        "def main() { \
            var i = 0; var sum = 0; \
            while i < 5 { sum += i; i += 1; } \
            assert sum == 10; \
            while false { sum = 999; } \
            assert sum == 10; \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn do_while_runs_body_at_least_once() {
    let result = run(
        "def main() { \
            var i = 0; \
            do { i += 1; } while false; \
            assert i == 1; \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn nested_function_declaration_is_callable_inside_its_block() {
    let result = run(
        "def main() { \
            def double(n) { return n * 2; } \
            assert double(21) == 42; \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn nested_function_can_recurse_into_itself() {
    let result = run(
        "def main() { \
            def fact(n) { if n == 0 { return 1; } return n * fact(n - 1); } \
            assert fact(5) == 120; \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn nested_functions_can_be_mutually_recursive() {
    let result = run(
        "def main() { \
            def isEven(n) { if n==0 return true; else return isOdd(n-1); } \
            def isOdd(n) { if n==0 return false; else return isEven(n-1); } \
            assert isOdd(69); \
            assert isEven(420); \
         }",
    );
    assert_eq!(result, Ok(()));
}

#[test]
fn and_or_xor_evaluate_both_sides() {
    // Both operands are side-effecting calls; if evaluation short-circuited,
    // one of the two counters would never be incremented.
    let result = run(
        "def main() { \
            var counter = 0; \
            var t = bump(counter) or bump(counter); \
            assert counter == 2; \
         } \
         def bump(ref c) { c = c + 1; return true; }",
    );
    assert_eq!(result, Ok(()));
}
