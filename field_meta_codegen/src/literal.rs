//! Conversion of metadata expressions into registry values.

use field_meta::Value;
use quote::ToTokens;
use syn::{Expr, ExprGroup, ExprLit, ExprParen, ExprUnary, Lit, UnOp};

/// Resolves a layer expression to the value stored for it.
///
/// Literals map onto their [`Value`] kind, negated numeric literals are
/// folded, and anything else is carried as its token text.
pub(crate) fn value_from_expr(expr: &Expr) -> Value {
    let resolved = match expr {
        Expr::Lit(ExprLit { lit, .. }) => value_from_lit(lit),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => negated(inner),
        Expr::Paren(ExprParen { expr: inner, .. }) | Expr::Group(ExprGroup { expr: inner, .. }) => {
            Some(value_from_expr(inner))
        }
        _ => None,
    };
    resolved.unwrap_or_else(|| Value::Expr(expr.to_token_stream().to_string()))
}

fn value_from_lit(lit: &Lit) -> Option<Value> {
    match lit {
        Lit::Str(s) => Some(Value::Str(s.value())),
        Lit::Char(c) => Some(Value::Char(c.value())),
        Lit::Bool(b) => Some(Value::Bool(b.value)),
        Lit::Int(n) => n.base10_parse().ok().map(Value::Int),
        Lit::Float(n) => n.base10_parse().ok().map(Value::Float),
        _ => None,
    }
}

/// Folds `-literal`; parsing the signed digits keeps `i64::MIN` in range.
fn negated(inner: &Expr) -> Option<Value> {
    let Expr::Lit(ExprLit { lit, .. }) = inner else {
        return None;
    };
    match lit {
        Lit::Int(n) => format!("-{}", n.base10_digits()).parse().ok().map(Value::Int),
        Lit::Float(n) => format!("-{}", n.base10_digits()).parse().ok().map(Value::Float),
        _ => None,
    }
}
