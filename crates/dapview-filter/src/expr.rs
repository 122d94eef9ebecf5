//! Filter expression trees

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    /// Regular-expression match of the right operand against the left
    #[serde(rename = "~=")]
    Match,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Match => "~=",
        }
    }

    /// Operators that require an ordering between operands
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge
        )
    }
}

/// An immutable filter expression, as produced by the constraint parser.
///
/// In TOML requests this is written externally tagged, e.g.
/// `{ compare = { op = ">", lhs = { field = "depth" }, rhs = { literal = 100 } } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Field(String),
    Literal(Value),
}

impl Expr {
    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn compare(op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn field(name: impl Into<String>) -> Expr {
        Expr::Field(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    /// `field op literal`, the common shape
    pub fn field_cmp(name: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Expr {
        Expr::compare(op, Expr::field(name), Expr::literal(value))
    }
}

/// Constraint-string form: conjunctions joined by `,`, string literals quoted.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::And(l, r) => write!(f, "{},{}", l, r),
            Expr::Compare { op, lhs, rhs } => write!(f, "{}{}{}", lhs, op.symbol(), rhs),
            Expr::Field(name) => write!(f, "{}", name),
            Expr::Literal(v) => write!(f, "{}", v.to_literal()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Expr::and(
            Expr::field_cmp("depth", CompareOp::Gt, 100i64),
            Expr::field_cmp("name", CompareOp::Match, "st.*"),
        );
        assert_eq!(e.to_string(), "depth>100,name~=\"st.*\"");
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            expr: Expr,
        }
        let h: Holder = toml::from_str(
            r#"expr = { compare = { op = ">", lhs = { field = "depth" }, rhs = { literal = 100 } } }"#,
        )
        .unwrap();
        assert_eq!(h.expr, Expr::field_cmp("depth", CompareOp::Gt, 100i64));
    }

    #[test]
    fn test_operator_classes() {
        assert!(CompareOp::Ge.is_ordering());
        assert!(!CompareOp::Ne.is_ordering());
        assert!(!CompareOp::Match.is_ordering());
    }
}
