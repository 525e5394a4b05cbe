//! SPDX license expression parsing
//!
//! Syntax and SPDX identifiers are checked by the `spdx` crate in lax
//! mode (lower-case operators and `GPL-2.0+` style suffixes are
//! accepted). Validation against the ebuild license names is done by
//! [`crate::LicenseMapping::parse`].

use spdx::{
    expression::{ExprNode, Operator},
    Expression, ParseMode,
};

use crate::{Error, LicenseExpr, Result};

/// Push `rhs` into `lhs` when both use `op`, so operator chains stay flat.
fn join(lhs: LicenseExpr, rhs: LicenseExpr, is_and: bool) -> LicenseExpr {
    match (lhs, is_and) {
        (LicenseExpr::And(mut children), true) | (LicenseExpr::Or(mut children), false) => {
            children.push(rhs);
            if is_and {
                LicenseExpr::And(children)
            } else {
                LicenseExpr::Or(children)
            }
        }
        (lhs, true) => LicenseExpr::And(vec![lhs, rhs]),
        (lhs, false) => LicenseExpr::Or(vec![lhs, rhs]),
    }
}

fn syntax_error(input: &str, err: spdx::ParseError) -> Error {
    match err.reason {
        spdx::error::Reason::UnknownTerm => Error::UnknownLicense {
            expr: input.to_string(),
            license: err.original[err.span.clone()].to_string(),
        },
        _ => Error::Syntax(err),
    }
}

/// Parse an SPDX license expression into a tree.
///
/// A license with an exception (`Apache-2.0 WITH LLVM-exception`) is a
/// single atom. Operands of the same operator are collected in one node.
pub fn parse(input: &str) -> Result<LicenseExpr> {
    if input.trim().is_empty() {
        return Err(Error::EmptyExpression);
    }

    let expression =
        Expression::parse_mode(input, ParseMode::LAX).map_err(|e| syntax_error(input, e))?;

    // postfix node list
    let mut stack: Vec<LicenseExpr> = Vec::new();
    for node in expression.iter() {
        match node {
            ExprNode::Req(req) => stack.push(LicenseExpr::License(req.req.to_string())),
            ExprNode::Op(op) => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return Err(Error::EmptyExpression);
                };
                stack.push(join(lhs, rhs, matches!(op, Operator::And)));
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(Error::EmptyExpression),
    }
}
