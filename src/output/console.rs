use crate::diagnostics::Diagnostic;
use crate::ScanSummary;

/// Render diagnostics and scan counts as human-readable console output,
/// sorted by file path then line.
pub fn render(diagnostics: &[Diagnostic], summary: &ScanSummary) -> String {
    let mut output = String::new();

    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then(a.location.line.cmp(&b.location.line))
    });

    if sorted.is_empty() {
        output.push_str("\n  No misplaced capability checks.\n\n");
    } else {
        output.push_str(&format!("\n  {} warning(s):\n\n", sorted.len()));
        for diag in &sorted {
            output.push_str(&format!(
                "  {}: {}: {}\n",
                diag.location, diag.severity, diag.message
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "  Conditions: {} analyzed, {} dominant, {} subordinate, {} absent",
        summary.conditions, summary.dominant, summary.subordinate, summary.absent
    ));
    if summary.skipped > 0 {
        output.push_str(&format!(", {} skipped", summary.skipped));
    }
    output.push_str("\n\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagSeverity;
    use crate::frontend::SourceLocation;

    #[test]
    fn clean_scan_message() {
        let summary = ScanSummary {
            conditions: 3,
            dominant: 1,
            subordinate: 0,
            absent: 2,
            skipped: 0,
        };
        let out = render(&[], &summary);
        assert!(out.contains("No misplaced capability checks"));
        assert!(out.contains("3 analyzed, 1 dominant, 0 subordinate, 2 absent"));
        assert!(!out.contains("skipped"));
    }

    #[test]
    fn warnings_sorted_by_file_then_line() {
        let summary = ScanSummary::default();
        let diags = vec![
            Diagnostic {
                location: SourceLocation::new("b.c", 2, 1),
                severity: DiagSeverity::Warning,
                message: "second".into(),
            },
            Diagnostic {
                location: SourceLocation::new("a.c", 9, 1),
                severity: DiagSeverity::Warning,
                message: "first".into(),
            },
        ];
        let out = render(&diags, &summary);
        let first = out.find("first").unwrap();
        let second = out.find("second").unwrap();
        assert!(first < second);
    }
}
