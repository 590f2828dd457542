//! Recognition of capability-check calls.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::frontend::Expr;

/// A named privilege token lifted out of a capability-check call.
///
/// Carries the argument's literal text; macro and constant expansion are
/// deliberately not attempted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CapabilityRef {
    pub name: String,
}

impl CapabilityRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for CapabilityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Built-in table of recognized check functions, mapping callee name to the
/// argument index holding the capability token. Extended by adding entries,
/// not by branching code.
static BUILTIN_CHECKS: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("capable", 0);
    m.insert("ns_capable", 1);
    m
});

/// The set of capability-check functions in effect for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    extra: HashMap<String, usize>,
}

impl CheckRegistry {
    /// Registry extended with additional `name -> capability-arg index`
    /// entries from configuration. Extras may shadow built-ins.
    pub fn with_extra(extra: HashMap<String, usize>) -> Self {
        Self { extra }
    }

    /// Capability-argument index for a callee, if it is a recognized check.
    pub fn arg_index(&self, callee: &str) -> Option<usize> {
        self.extra
            .get(callee)
            .copied()
            .or_else(|| BUILTIN_CHECKS.get(callee).copied())
    }

    /// All recognized check functions, sorted by name, for `list-checks`.
    pub fn entries(&self) -> Vec<(String, usize)> {
        let mut all: HashMap<String, usize> = BUILTIN_CHECKS
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        all.extend(self.extra.iter().map(|(k, v)| (k.clone(), *v)));
        let mut entries: Vec<_> = all.into_iter().collect();
        entries.sort();
        entries
    }

    /// Whether `expr` is directly a capability-check call, and if so the
    /// capability it tests. A recognized callee with too few arguments is
    /// conservatively not a check. Pure; no side effects.
    pub fn detect(&self, expr: &Expr) -> Option<CapabilityRef> {
        let Expr::Call { callee, args } = expr else {
            return None;
        };
        let idx = self.arg_index(callee)?;
        let arg = args.get(idx)?;
        Some(CapabilityRef::new(raw_text(arg)))
    }
}

/// Literal textual form of an argument expression.
fn raw_text(expr: &Expr) -> String {
    match expr {
        Expr::Other(text) => text.clone(),
        Expr::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(raw_text).collect();
            format!("{}({})", callee, args.join(", "))
        }
        Expr::Unary { op, operand } => format!("{}{}", op, raw_text(operand)),
        Expr::Binary { op, lhs, rhs } => {
            format!("{} {} {}", raw_text(lhs), op, raw_text(rhs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Expr;

    #[test]
    fn detects_capable_first_arg() {
        let reg = CheckRegistry::default();
        let expr = Expr::call("capable", vec![Expr::other("CAP_SYS_ADMIN")]);
        assert_eq!(reg.detect(&expr), Some(CapabilityRef::new("CAP_SYS_ADMIN")));
    }

    #[test]
    fn detects_ns_capable_second_arg() {
        let reg = CheckRegistry::default();
        let expr = Expr::call(
            "ns_capable",
            vec![Expr::other("user_ns"), Expr::other("CAP_NET_ADMIN")],
        );
        assert_eq!(reg.detect(&expr), Some(CapabilityRef::new("CAP_NET_ADMIN")));
    }

    #[test]
    fn unrelated_call_not_detected() {
        let reg = CheckRegistry::default();
        let expr = Expr::call("is_root", vec![]);
        assert_eq!(reg.detect(&expr), None);
    }

    #[test]
    fn non_call_not_detected() {
        let reg = CheckRegistry::default();
        assert_eq!(reg.detect(&Expr::other("x")), None);
    }

    #[test]
    fn malformed_check_call_is_not_a_check() {
        // ns_capable with one argument: the capability slot is missing.
        let reg = CheckRegistry::default();
        let expr = Expr::call("ns_capable", vec![Expr::other("user_ns")]);
        assert_eq!(reg.detect(&expr), None);
    }

    #[test]
    fn config_extra_entry_recognized() {
        let mut extra = HashMap::new();
        extra.insert("sockopt_ns_capable".to_string(), 1);
        let reg = CheckRegistry::with_extra(extra);
        let expr = Expr::call(
            "sockopt_ns_capable",
            vec![Expr::other("net"), Expr::other("CAP_NET_RAW")],
        );
        assert_eq!(reg.detect(&expr), Some(CapabilityRef::new("CAP_NET_RAW")));
    }

    #[test]
    fn capability_token_is_raw_text() {
        let reg = CheckRegistry::default();
        // The token is not evaluated, just rendered back.
        let expr = Expr::call("capable", vec![Expr::call("cap_of", vec![Expr::other("t")])]);
        assert_eq!(reg.detect(&expr), Some(CapabilityRef::new("cap_of(t)")));
    }

    #[test]
    fn entries_sorted_and_merged() {
        let mut extra = HashMap::new();
        extra.insert("file_ns_capable".to_string(), 2);
        let reg = CheckRegistry::with_extra(extra);
        let entries = reg.entries();
        assert_eq!(
            entries,
            vec![
                ("capable".to_string(), 0),
                ("file_ns_capable".to_string(), 2),
                ("ns_capable".to_string(), 1),
            ]
        );
    }
}
