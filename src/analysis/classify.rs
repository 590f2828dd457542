//! Structural position of a capability check within a condition.

use serde::{Deserialize, Serialize};

use super::detect::CheckRegistry;
use crate::frontend::Expr;

/// Where the capability check sits in the condition. Derived per condition,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// No capability check anywhere in the condition.
    Absent,
    /// A check exists but is not the final operand.
    Subordinate,
    /// The check is the rightmost top-level operand, or the whole condition.
    Dominant,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Subordinate => write!(f, "subordinate"),
            Self::Dominant => write!(f, "dominant"),
        }
    }
}

/// Classify the position of a capability check in `expr`.
pub fn classify(registry: &CheckRegistry, expr: &Expr) -> Position {
    match rank(registry, expr) {
        0 => Position::Absent,
        1 => Position::Subordinate,
        _ => Position::Dominant,
    }
}

/// Positional rank: 2 for a direct check, 1 for a check somewhere off the
/// rightmost spine, 0 for none. The right operand wins ties by design: rank
/// 2 survives only along the chain of rightmost operands.
///
/// The rule is applied to every binary operator, not only `&&`/`||`; a check
/// compared with `==` still classifies positionally.
fn rank(registry: &CheckRegistry, expr: &Expr) -> u8 {
    if registry.detect(expr).is_some() {
        return 2;
    }
    match expr {
        Expr::Binary { lhs, rhs, .. } => {
            let r = rank(registry, rhs);
            if r >= 1 {
                r
            } else if rank(registry, lhs) >= 1 {
                1
            } else {
                0
            }
        }
        Expr::Unary { operand, .. } => rank(registry, operand),
        Expr::Call { .. } | Expr::Other(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::analysis::tree::ConditionTree;
    use crate::frontend::Expr;

    fn reg() -> CheckRegistry {
        CheckRegistry::default()
    }

    fn capable(cap: &str) -> Expr {
        Expr::call("capable", vec![Expr::other(cap)])
    }

    #[test]
    fn bare_check_is_dominant() {
        assert_eq!(classify(&reg(), &capable("CAP_SYS_ADMIN")), Position::Dominant);
    }

    #[test]
    fn check_as_rightmost_conjunct_is_dominant() {
        let expr = Expr::binary("&&", Expr::other("a"), capable("CAP_X"));
        assert_eq!(classify(&reg(), &expr), Position::Dominant);
    }

    #[test]
    fn check_as_left_conjunct_is_subordinate() {
        let expr = Expr::binary("&&", capable("CAP_X"), Expr::other("a"));
        assert_eq!(classify(&reg(), &expr), Position::Subordinate);
    }

    #[test]
    fn no_check_is_absent() {
        let expr = Expr::binary("==", Expr::other("x"), Expr::other("0"));
        assert_eq!(classify(&reg(), &expr), Position::Absent);
    }

    #[test]
    fn rank_propagates_through_unary() {
        let expr = Expr::unary("!", capable("CAP_X"));
        assert_eq!(classify(&reg(), &expr), Position::Dominant);
    }

    #[test]
    fn dominance_survives_rightmost_spine() {
        // a && (b && capable(CAP_X)): rightmost at every level.
        let expr = Expr::binary(
            "&&",
            Expr::other("a"),
            Expr::binary("&&", Expr::other("b"), capable("CAP_X")),
        );
        assert_eq!(classify(&reg(), &expr), Position::Dominant);
    }

    #[test]
    fn check_buried_left_of_rightmost_spine_is_subordinate() {
        // (capable(CAP_X) && a) && b
        let expr = Expr::binary(
            "&&",
            Expr::binary("&&", capable("CAP_X"), Expr::other("a")),
            Expr::other("b"),
        );
        assert_eq!(classify(&reg(), &expr), Position::Subordinate);
    }

    #[test]
    fn rule_applies_to_non_logical_operators() {
        // capable(CAP_X) == 0: check on the left of a comparison.
        let expr = Expr::binary("==", capable("CAP_X"), Expr::other("0"));
        assert_eq!(classify(&reg(), &expr), Position::Subordinate);
    }

    #[test]
    fn subordinate_check_under_right_unary_still_counts() {
        // a && !capable(CAP_X): the unary is rightmost, rank passes through.
        let expr = Expr::binary("&&", Expr::other("a"), Expr::unary("!", capable("CAP_X")));
        assert_eq!(classify(&reg(), &expr), Position::Dominant);
    }

    // Random expressions over a small grammar mixing checks and noise.
    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            Just(Expr::other("x")),
            Just(Expr::other("0")),
            Just(Expr::call("is_root", vec![])),
            Just(Expr::call("capable", vec![Expr::other("CAP_SYS_ADMIN")])),
            Just(Expr::call(
                "ns_capable",
                vec![Expr::other("ns"), Expr::other("CAP_NET_ADMIN")]
            )),
            // Recognized name, capability slot missing.
            Just(Expr::call("ns_capable", vec![Expr::other("ns")])),
        ];
        leaf.prop_recursive(6, 64, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone(), "(&&|\\|\\||==|\\|)")
                    .prop_map(|(l, r, op)| Expr::binary(op, l, r)),
                (inner, "(!|~)").prop_map(|(e, op)| Expr::unary(op, e)),
            ]
        })
    }

    proptest! {
        /// Builder and classifier agree: the tree is None exactly when the
        /// classification is Absent.
        #[test]
        fn builder_and_classifier_agree(expr in arb_expr()) {
            let registry = CheckRegistry::default();
            let tree = ConditionTree::build(&registry, &expr);
            let position = classify(&registry, &expr);
            prop_assert_eq!(tree.is_none(), position == Position::Absent);
        }

        /// Classification is pure: two runs over the same expression agree.
        #[test]
        fn classify_is_deterministic(expr in arb_expr()) {
            let registry = CheckRegistry::default();
            prop_assert_eq!(classify(&registry, &expr), classify(&registry, &expr));
        }
    }
}
