//! License expression tree and boolean simplification

use std::fmt;

/// A boolean combination of license identifiers.
///
/// Variant order matters: the derived `Ord` sorts plain licenses before
/// OR groups and OR groups before AND groups, which is the order the
/// simplified tree is rendered in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LicenseExpr {
    /// A single license identifier (`MIT`, `Apache-2.0 WITH LLVM-exception`)
    License(String),
    /// Any of the children may be chosen
    Or(Vec<LicenseExpr>),
    /// All of the children apply
    And(Vec<LicenseExpr>),
}

impl LicenseExpr {
    pub fn license(id: impl Into<String>) -> Self {
        LicenseExpr::License(id.into())
    }

    pub fn is_license(&self) -> bool {
        matches!(self, LicenseExpr::License(_))
    }

    /// Rewrite every license identifier, keeping the tree shape.
    pub fn try_map_licenses<E, F>(self, f: &mut F) -> Result<Self, E>
    where
        F: FnMut(String) -> Result<String, E>,
    {
        Ok(match self {
            LicenseExpr::License(id) => LicenseExpr::License(f(id)?),
            LicenseExpr::Or(children) => LicenseExpr::Or(
                children
                    .into_iter()
                    .map(|c| c.try_map_licenses(f))
                    .collect::<Result<_, E>>()?,
            ),
            LicenseExpr::And(children) => LicenseExpr::And(
                children
                    .into_iter()
                    .map(|c| c.try_map_licenses(f))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }

    pub fn map_licenses<F>(self, f: &mut F) -> Self
    where
        F: FnMut(String) -> String,
    {
        match self {
            LicenseExpr::License(id) => LicenseExpr::License(f(id)),
            LicenseExpr::Or(children) => {
                LicenseExpr::Or(children.into_iter().map(|c| c.map_licenses(f)).collect())
            }
            LicenseExpr::And(children) => {
                LicenseExpr::And(children.into_iter().map(|c| c.map_licenses(f)).collect())
            }
        }
    }

    /// Simplify the expression.
    ///
    /// Nested chains of the same operator are flattened, children are
    /// sorted and deduplicated, absorbed terms are dropped and single-child
    /// groups collapse into their child. The result does not depend on the
    /// order of the input operands and simplifying it again is a no-op.
    pub fn simplify(self) -> Self {
        match self {
            LicenseExpr::License(_) => self,
            LicenseExpr::And(children) => simplify_chain(children, true),
            LicenseExpr::Or(children) => simplify_chain(children, false),
        }
    }
}

fn simplify_chain(children: Vec<LicenseExpr>, is_and: bool) -> LicenseExpr {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match child.simplify() {
            LicenseExpr::And(inner) if is_and => flat.extend(inner),
            LicenseExpr::Or(inner) if !is_and => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat.sort();
    flat.dedup();

    // a AND (a OR b) == a, a OR (a AND b) == a
    let absorbed: Vec<bool> = flat
        .iter()
        .map(|candidate| match (candidate, is_and) {
            (LicenseExpr::Or(inner), true) | (LicenseExpr::And(inner), false) => flat
                .iter()
                .any(|other| other != candidate && absorbs(other, inner, is_and)),
            _ => false,
        })
        .collect();
    let mut flat: Vec<LicenseExpr> = flat
        .into_iter()
        .zip(absorbed)
        .filter_map(|(expr, gone)| (!gone).then_some(expr))
        .collect();

    if flat.len() == 1 {
        return flat.remove(0);
    }
    if is_and {
        LicenseExpr::And(flat)
    } else {
        LicenseExpr::Or(flat)
    }
}

/// Whether `other`, as a sibling, makes the group with `inner` redundant.
fn absorbs(other: &LicenseExpr, inner: &[LicenseExpr], is_and: bool) -> bool {
    match (other, is_and) {
        (LicenseExpr::Or(terms), true) | (LicenseExpr::And(terms), false) => {
            terms.iter().all(|t| inner.contains(t))
        }
        _ => inner.contains(other),
    }
}

impl fmt::Display for LicenseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, op) = match self {
            LicenseExpr::License(id) => return f.write_str(id),
            LicenseExpr::Or(children) => (children, " OR "),
            LicenseExpr::And(children) => (children, " AND "),
        };
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(op)?;
            }
            if child.is_license() {
                write!(f, "{}", child)?;
            } else {
                write!(f, "({})", child)?;
            }
        }
        Ok(())
    }
}
