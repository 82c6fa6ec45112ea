//! Canonical source rendering of a Devin AST (spec §6 "AST display").
//!
//! Output is not meant to match the original formatting byte-for-byte — only
//! to re-parse to an equivalent tree, which is what the round-trip property
//! in spec §8 actually requires ("modulo whitespace/comments").

use devin_core::ast::*;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::fmt::Write as _;

pub fn display_program(ast: &Devin) -> String {
    let mut out = String::new();
    for decl in &ast.declarations {
        display_declaration(decl, &mut out);
        out.push('\n');
    }
    out
}

fn display_declaration(decl: &Declaration, out: &mut String) {
    match decl {
        Declaration::Variable(v) => {
            write!(out, "var {}", v.name).unwrap();
            if let Some(ann) = &v.annotation {
                write!(out, ": {}", display_type_expr(ann)).unwrap();
            }
            write!(out, " = {};", display_expr(&v.initializer)).unwrap();
        }
        Declaration::Function(f) => {
            write!(out, "def {}(", f.name).unwrap();
            for (i, p) in f.parameters.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if p.is_ref {
                    out.push_str("ref ");
                }
                out.push_str(&p.name);
                if let Some(ann) = &p.annotation {
                    write!(out, ": {}", display_type_expr(ann)).unwrap();
                }
            }
            out.push(')');
            if let Some(ret) = &f.return_type {
                write!(out, ": {}", display_type_expr(ret)).unwrap();
            }
            out.push(' ');
            display_stmt(&f.body, out);
        }
    }
}

fn display_type_expr(te: &TypeExpr) -> String {
    match te {
        TypeExpr::Named(name, _) => name.clone(),
        TypeExpr::Array(inner, _) => format!("Array[{}]", display_type_expr(inner)),
    }
}

fn display_stmt(stmt: &Stmt, out: &mut String) {
    match stmt {
        Stmt::Expr(e, _) => write!(out, "{};", display_expr(e)).unwrap(),
        Stmt::If(cond, body, _) => {
            write!(out, "if ({}) ", display_expr(cond)).unwrap();
            display_stmt(body, out);
        }
        Stmt::IfElse(cond, then_branch, else_branch, _) => {
            write!(out, "if ({}) ", display_expr(cond)).unwrap();
            display_stmt(then_branch, out);
            out.push_str(" else ");
            display_stmt(else_branch, out);
        }
        Stmt::While(cond, body, _) => {
            write!(out, "while ({}) ", display_expr(cond)).unwrap();
            display_stmt(body, out);
        }
        Stmt::DoWhile(body, cond, _) => {
            out.push_str("do ");
            display_stmt(body, out);
            write!(out, " while ({});", display_expr(cond)).unwrap();
        }
        Stmt::Return(value, _) => match value {
            Some(v) => write!(out, "return {};", display_expr(v)).unwrap(),
            None => out.push_str("return;"),
        },
        Stmt::Assert(e, _) => write!(out, "assert {};", display_expr(e)).unwrap(),
        Stmt::Block(items, _) => {
            out.push('{');
            for item in items {
                out.push(' ');
                match item {
                    BlockItem::Declaration(d) => display_declaration(d, out),
                    BlockItem::Statement(s) => display_stmt(s, out),
                }
            }
            out.push_str(" }");
        }
        Stmt::Declaration(d, _) => display_declaration(d, out),
    }
}

fn display_expr(expr: &Expr) -> String {
    match expr {
        Expr::IntegerLit(n, _) => n.to_string(),
        Expr::RationalLit(r, _) => format_rational_literal(r),
        Expr::BoolLit(b, _) => b.to_string(),
        Expr::Variable(v) => v.name.clone(),
        Expr::Array(a) => {
            let elems: Vec<String> = a.elements.iter().map(display_expr).collect();
            format!("[{}]", elems.join(", "))
        }
        Expr::Call(c) => {
            let args: Vec<String> = c.args.iter().map(display_expr).collect();
            format!("{}({})", c.callee, args.join(", "))
        }
        Expr::Unary(u) => {
            let op = match u.op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
                UnaryOp::Not => "not ",
                UnaryOp::Len => "len ",
            };
            format!("{}{}", op, display_expr(&u.operand))
        }
        Expr::Binary(b) => {
            let op = match b.op {
                BinaryOp::Add => "+",
                BinaryOp::Sub => "-",
                BinaryOp::Mul => "*",
                BinaryOp::Div => "/",
                BinaryOp::Rem => "%",
                BinaryOp::Eq => "==",
                BinaryOp::Ne => "!=",
                BinaryOp::Lt => "<",
                BinaryOp::Le => "<=",
                BinaryOp::Gt => ">",
                BinaryOp::Ge => ">=",
                BinaryOp::And => "and",
                BinaryOp::Or => "or",
                BinaryOp::Xor => "xor",
            };
            format!("({} {} {})", display_expr(&b.left), op, display_expr(&b.right))
        }
        Expr::Assign(a) => {
            let op = match a.op {
                AssignOp::Assign => "=",
                AssignOp::AddAssign => "+=",
                AssignOp::SubAssign => "-=",
                AssignOp::MulAssign => "*=",
                AssignOp::DivAssign => "/=",
                AssignOp::RemAssign => "%=",
            };
            format!("{} {} {}", display_expr(&a.target), op, display_expr(&a.value))
        }
        Expr::Access(ac) => format!("{}[{}]", display_expr(&ac.array), display_expr(&ac.index)),
        Expr::Parenthesized(inner, _) => format!("({})", display_expr(inner)),
    }
}

/// Renders a `Float` value back as a Devin rational literal (`digits.digits`,
/// per spec §4.1's lexical rule — there is no exponent or fraction syntax).
///
/// When the reduced denominator's only prime factors are 2 and 5 the decimal
/// terminates and this round-trips exactly. Otherwise spec §9 explicitly
/// leaves the notation unspecified ("a repeating-decimal or truncated form");
/// this truncates to a fixed number of fractional digits, which re-parses to
/// a close but not bit-identical value.
fn format_rational_literal(r: &BigRational) -> String {
    const TRUNCATED_DIGITS: u32 = 24;
    let sign = if r.numer().is_negative() { "-" } else { "" };
    let numer = r.numer().abs();
    let denom = r.denom().abs();

    let digits = match terminating_scale(&denom) {
        Some(k) => {
            let pow10 = BigInt::from(10u32).pow(k);
            let factor = &pow10 / &denom;
            (numer * factor, k)
        }
        None => {
            let pow10 = BigInt::from(10u32).pow(TRUNCATED_DIGITS);
            (&numer * &pow10 / &denom, TRUNCATED_DIGITS)
        }
    };
    let (scaled, k) = digits;
    render_fixed_point(sign, &scaled, k)
}

/// If `denom`'s only prime factors are 2 and 5, returns the smallest `k` with
/// `denom | 10^k`; otherwise `None` (the decimal repeats).
fn terminating_scale(denom: &BigInt) -> Option<u32> {
    let mut d = denom.clone();
    let two = BigInt::from(2);
    let five = BigInt::from(5);
    let mut e2 = 0u32;
    while (&d % &two).is_zero() {
        d = &d / &two;
        e2 += 1;
    }
    let mut e5 = 0u32;
    while (&d % &five).is_zero() {
        d = &d / &five;
        e5 += 1;
    }
    if d == BigInt::from(1) {
        Some(e2.max(e5).max(1))
    } else {
        None
    }
}

/// Formats `scaled / 10^k` as `whole.frac`, zero-padding the fractional part
/// to `k` digits so the value round-trips through the lexer's
/// `digits '.' digits` rule.
fn render_fixed_point(sign: &str, scaled: &BigInt, k: u32) -> String {
    let scale = BigInt::from(10u32).pow(k);
    let whole = scaled / &scale;
    let frac = (scaled % &scale).to_string();
    let padded = "0".repeat(k as usize - frac.len()) + &frac;
    format!("{}{}.{}", sign, whole, padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trips_through_reparse() {
        let src = "def main() { var x = 1; var y = 2; var z = 2*y + x; assert z == 5; }";
        let (ast, errors) = parse(src);
        assert!(errors.is_empty());
        let rendered = display_program(&ast.unwrap());
        let (reparsed, errors2) = parse(&rendered);
        assert!(errors2.is_empty(), "re-parse of:\n{}\nfailed: {:?}", rendered, errors2);
        assert!(reparsed.is_some());
    }

    #[test]
    fn terminating_rational_round_trips_to_the_same_value() {
        let src = "var x = 3.14;";
        let (ast, errors) = parse(src);
        assert!(errors.is_empty());
        let ast = ast.unwrap();
        let rendered = display_program(&ast);
        let (reparsed, errors2) = parse(&rendered);
        assert!(errors2.is_empty(), "re-parse of:\n{}\nfailed: {:?}", rendered, errors2);
        let original = match &ast.declarations[0] {
            Declaration::Variable(v) => match &v.initializer {
                Expr::RationalLit(r, _) => r.clone(),
                _ => panic!("expected rational literal"),
            },
            _ => unreachable!(),
        };
        let reparsed_value = match &reparsed.unwrap().declarations[0] {
            Declaration::Variable(v) => match &v.initializer {
                Expr::RationalLit(r, _) => r.clone(),
                _ => panic!("expected rational literal"),
            },
            _ => unreachable!(),
        };
        assert_eq!(original, reparsed_value);
    }

    #[test]
    fn negative_rational_renders_with_leading_sign() {
        let rendered = format_rational_literal(&BigRational::new(BigInt::from(-5), BigInt::from(2)));
        assert_eq!(rendered, "-2.5");
    }
}
