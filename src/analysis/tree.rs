//! The pruned structural representation of a guard condition.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::detect::{CapabilityRef, CheckRegistry};
use crate::frontend::Expr;

/// Boolean shape of a condition, reduced to the parts that carry a
/// capability check. A closed sum: every node is a `Leaf` or has at least
/// one descendant `Leaf`; check-free subtrees are pruned at construction
/// and never materialized. Children are exclusively owned, no parent links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionTree {
    Leaf(CapabilityRef),
    Unary {
        op: String,
        child: Box<ConditionTree>,
    },
    /// An absent side means that operand contained no capability check.
    /// At least one side is always present.
    Binary {
        op: String,
        left: Option<Box<ConditionTree>>,
        right: Option<Box<ConditionTree>>,
    },
}

impl ConditionTree {
    /// Build the pruned tree for `expr`, or `None` when no capability check
    /// occurs anywhere in it.
    ///
    /// Binary operands are searched right-first: in the idiomatic guard
    /// style the check is the last conjunct, so the common case resolves on
    /// the first recursion.
    pub fn build(registry: &CheckRegistry, expr: &Expr) -> Option<Self> {
        if let Some(cap) = registry.detect(expr) {
            return Some(Self::Leaf(cap));
        }
        match expr {
            Expr::Binary { op, lhs, rhs } => {
                if let Some(right) = Self::build(registry, rhs) {
                    Some(Self::Binary {
                        op: op.clone(),
                        left: Self::build(registry, lhs).map(Box::new),
                        right: Some(Box::new(right)),
                    })
                } else {
                    Self::build(registry, lhs).map(|left| Self::Binary {
                        op: op.clone(),
                        left: Some(Box::new(left)),
                        right: None,
                    })
                }
            }
            Expr::Unary { op, operand } => {
                Self::build(registry, operand).map(|child| Self::Unary {
                    op: op.clone(),
                    child: Box::new(child),
                })
            }
            // Calls were handled by detect(); other leaves cannot contain a
            // textually visible check.
            Expr::Call { .. } | Expr::Other(_) => None,
        }
    }

    /// Capabilities referenced in this tree, left to right.
    pub fn capabilities(&self) -> Vec<&CapabilityRef> {
        let mut out = Vec::new();
        self.collect_caps(&mut out);
        out
    }

    fn collect_caps<'a>(&'a self, out: &mut Vec<&'a CapabilityRef>) {
        match self {
            Self::Leaf(cap) => out.push(cap),
            Self::Unary { child, .. } => child.collect_caps(out),
            Self::Binary { left, right, .. } => {
                if let Some(l) = left {
                    l.collect_caps(out);
                }
                if let Some(r) = right {
                    r.collect_caps(out);
                }
            }
        }
    }
}

// Fixed rendering, shared by the record serializer: Leaf is the capability
// name as a string; Unary is {"op","child"}; Binary is {"op","left","right"}
// with a pruned side rendered as null so the record shape stays constant.
impl Serialize for ConditionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(cap) => serializer.serialize_str(&cap.name),
            Self::Unary { op, child } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("op", op)?;
                map.serialize_entry("child", child)?;
                map.end()
            }
            Self::Binary { op, left, right } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("op", op)?;
                map.serialize_entry("left", left)?;
                map.serialize_entry("right", right)?;
                map.end()
            }
        }
    }
}
