//! Call-graph query: nearest externally visible entry point above a
//! function.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::frontend::ParsedFile;

/// Resolves zero or one reachable entry-point name per function. A compiler
/// integration would answer from its own call graph; the bundled
/// implementation is built from the parsed sources.
pub trait CallGraph: Send + Sync {
    fn entry_point_for(&self, function: &str) -> Option<String>;
}

/// Call graph over one scan's parsed files: reverse edges (callee to
/// callers) walked breadth-first until an entry point is hit. Nearest
/// caller wins; among callers at the same distance the lexicographically
/// smallest name wins, keeping resolution deterministic across runs.
#[derive(Debug, Default)]
pub struct SimpleCallGraph {
    callers: HashMap<String, Vec<String>>,
    entry_points: HashSet<String>,
}

impl SimpleCallGraph {
    pub fn build(files: &[ParsedFile]) -> Self {
        let mut callers: HashMap<String, Vec<String>> = HashMap::new();
        let mut entry_points = HashSet::new();
        for file in files {
            for func in &file.functions {
                if func.is_entry_point {
                    entry_points.insert(func.name.clone());
                }
                for callee in &func.calls {
                    callers
                        .entry(callee.clone())
                        .or_default()
                        .push(func.name.clone());
                }
            }
        }
        for list in callers.values_mut() {
            list.sort();
            list.dedup();
        }
        Self {
            callers,
            entry_points,
        }
    }
}

impl CallGraph for SimpleCallGraph {
    fn entry_point_for(&self, function: &str) -> Option<String> {
        if self.entry_points.contains(function) {
            return Some(function.to_string());
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(function);
        queue.push_back(function);
        while let Some(current) = queue.pop_front() {
            let Some(callers) = self.callers.get(current) else {
                continue;
            };
            // Caller lists are sorted, so the first entry point found at
            // this depth is the smallest name.
            for caller in callers {
                if self.entry_points.contains(caller) {
                    return Some(caller.clone());
                }
            }
            for caller in callers {
                if visited.insert(caller) {
                    queue.push_back(caller);
                }
            }
        }
        None
    }
}
