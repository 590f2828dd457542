//! Extraction of functions, `if` statements and call edges from C sources.
//!
//! This is not a C parser. It is a regex-and-brace-matching extractor in the
//! spirit of a lint tool: comments, string literals and preprocessor lines
//! are blanked out (preserving offsets and line numbers), function bodies are
//! found by matching `name(args) {` at brace depth zero, and `if` conditions
//! are cut out by paren matching and handed to [`expr_parser`].

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{Block, FunctionDef, IfStmt, ParsedFile, SourceLocation, Stmt};
use super::expr_parser;

/// Function definition header: optional qualifiers/return type words, the
/// function name, an argument list without `;` or `{`, then the body brace.
static FUNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[A-Za-z_][A-Za-z0-9_]*[ \t\r\n*]+)*?([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(([^;{}]*)\)[ \t\r\n]*\{").unwrap()
});

/// Syscall entry-point macro, e.g. `SYSCALL_DEFINE3(setpriority, ...)`.
static SYSCALL_DEFINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SYSCALL_DEFINE\d$").unwrap());

/// Call sites inside a body, for the call graph.
static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(").unwrap());

/// `if` keyword opening a condition.
static IF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif[ \t\r\n]*\(").unwrap());

const C_KEYWORDS: &[&str] = &[
    "if", "else", "while", "for", "do", "switch", "case", "return", "sizeof", "typeof", "goto",
    "break", "continue", "defined",
];

/// Parse one source file into the syntax model.
pub fn parse_source(path: &Path, content: &str) -> ParsedFile {
    let clean = blank_noise(content);
    let line_starts = compute_line_starts(&clean);
    let mut parsed = ParsedFile {
        path: path.to_path_buf(),
        ..Default::default()
    };

    for caps in FUNC_RE.captures_iter(&clean) {
        let whole = caps.get(0).unwrap();
        // Matches inside another body are call/if sites, not definitions.
        if brace_depth_at(&clean, whole.start()) != 0 {
            continue;
        }
        let name_match = caps.get(1).unwrap();
        let mut name = name_match.as_str().to_string();
        if C_KEYWORDS.contains(&name.as_str()) {
            continue;
        }

        let mut is_entry_point = false;
        if SYSCALL_DEFINE_RE.is_match(&name) {
            let first_arg = caps
                .get(2)
                .map(|a| a.as_str())
                .unwrap_or("")
                .split(',')
                .next()
                .unwrap_or("")
                .trim();
            if first_arg.is_empty() {
                continue;
            }
            name = format!("sys_{first_arg}");
            is_entry_point = true;
        } else if name.starts_with("sys_") || name.starts_with("__do_sys_") {
            is_entry_point = true;
        }

        let body_open = whole.end() - 1;
        let Some(body_close) = matching_brace(&clean, body_open) else {
            continue; // unbalanced body, skip the rest of the definition
        };
        let body = &clean[body_open + 1..body_close];
        let body_offset = body_open + 1;

        let mut ifs = Vec::new();
        collect_ifs(path, body, body_offset, &line_starts, &mut ifs);

        parsed.functions.push(FunctionDef {
            name,
            ifs,
            calls: collect_calls(body),
            is_entry_point,
            location: location_at(path, &line_starts, name_match.start()),
        });
    }

    parsed
}

/// Replace comments, string/char literal bodies and preprocessor lines with
/// spaces, keeping every byte offset and newline in place.
fn blank_noise(content: &str) -> String {
    let bytes = content.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let mut at_line_start = true;

    while i < bytes.len() {
        let c = bytes[i];
        if at_line_start {
            let mut j = i;
            while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'#' {
                // Preprocessor directive, including continuation lines.
                while i < bytes.len() {
                    if bytes[i] == b'\n' {
                        out.push(b'\n');
                        i += 1;
                        break;
                    }
                    if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        out.push(b' ');
                        out.push(b'\n');
                        i += 2;
                        continue;
                    }
                    out.push(b' ');
                    i += 1;
                }
                continue;
            }
        }
        at_line_start = false;
        match c {
            b'\n' => {
                out.push(b'\n');
                at_line_start = true;
                i += 1;
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out.push(b' ');
                    i += 1;
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                out.push(b' ');
                out.push(b' ');
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                        out.push(b' ');
                        out.push(b' ');
                        i += 2;
                        break;
                    }
                    out.push(if bytes[i] == b'\n' { b'\n' } else { b' ' });
                    i += 1;
                }
            }
            b'"' | b'\'' => {
                let quote = c;
                out.push(b' ');
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\\' {
                        out.push(b' ');
                        i += 1;
                        if i < bytes.len() {
                            out.push(if bytes[i] == b'\n' { b'\n' } else { b' ' });
                            i += 1;
                        }
                        continue;
                    }
                    let done = bytes[i] == quote;
                    out.push(if bytes[i] == b'\n' { b'\n' } else { b' ' });
                    i += 1;
                    if done {
                        break;
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    // blanking only ever substitutes ASCII spaces for ASCII bytes
    String::from_utf8(out).unwrap_or_default()
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn location_at(path: &Path, line_starts: &[usize], offset: usize) -> SourceLocation {
    let line_idx = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    SourceLocation::new(path, line_idx + 1, offset - line_starts[line_idx] + 1)
}

fn brace_depth_at(text: &str, offset: usize) -> i32 {
    let mut depth = 0;
    for b in text[..offset].bytes() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Offset of the `}` matching the `{` at `open`, if balanced.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(text.as_bytes()[open], b'{');
    let mut depth = 0;
    for (i, b) in text[open..].bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the `)` matching the `(` at `open`, if balanced.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(text.as_bytes()[open], b'(');
    let mut depth = 0;
    for (i, b) in text[open..].bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find every `if` in a body, at any nesting depth, in source order.
fn collect_ifs(
    path: &Path,
    body: &str,
    body_offset: usize,
    line_starts: &[usize],
    out: &mut Vec<IfStmt>,
) {
    for m in IF_RE.find_iter(body) {
        let cond_open = body[m.start()..m.end()]
            .rfind('(')
            .map(|i| m.start() + i)
            .unwrap_or(m.end() - 1);
        let Some(cond_close) = matching_paren(body, cond_open) else {
            continue;
        };
        let cond_text = &body[cond_open + 1..cond_close];
        let cond = expr_parser::parse_condition(cond_text);
        let then_block = parse_then_block(body, cond_close + 1);
        out.push(IfStmt {
            cond,
            then_block,
            location: location_at(path, line_starts, body_offset + m.start()),
        });
    }
}

/// Parse the true branch after an `if (...)`: either a braced block whose
/// top-level statements are classified, or a single statement up to `;`.
fn parse_then_block(body: &str, after_cond: usize) -> Block {
    let rest = &body[after_cond..];
    let skip = rest.len() - rest.trim_start().len();
    let start = after_cond + skip;
    if start >= body.len() {
        return Block::default();
    }

    if body.as_bytes()[start] == b'{' {
        let Some(close) = matching_brace(body, start) else {
            return Block::default();
        };
        let inner = &body[start + 1..close];
        Block {
            stmts: split_statements(inner),
        }
    } else {
        let stmt_end = body[start..].find(';').map(|i| start + i).unwrap_or(body.len());
        let stmt = body[start..stmt_end].trim();
        if stmt.is_empty() {
            Block::default()
        } else {
            Block {
                stmts: vec![classify_statement(stmt)],
            }
        }
    }
}

/// Split a block body into top-level statements, tracking nesting so `;`
/// inside a `for (...)` header or a nested block does not terminate one.
fn split_statements(inner: &str) -> Vec<Stmt> {
    let mut stmts = Vec::new();
    let bytes = inner.as_bytes();
    let mut depth_paren = 0i32;
    let mut depth_brace = 0i32;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth_paren += 1,
            b')' => depth_paren -= 1,
            b'{' => depth_brace += 1,
            b'}' => {
                depth_brace -= 1;
                // A compound statement (loop/if body) ends without `;`.
                if depth_brace == 0 && depth_paren == 0 {
                    let text = inner[start..=i].trim();
                    if !text.is_empty() {
                        stmts.push(Stmt::Other);
                    }
                    start = i + 1;
                }
            }
            b';' if depth_paren == 0 && depth_brace == 0 => {
                let text = inner[start..i].trim();
                if !text.is_empty() {
                    stmts.push(classify_statement(text));
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = inner[start.min(inner.len())..].trim();
    if !tail.is_empty() {
        stmts.push(Stmt::Other);
    }
    stmts
}

fn classify_statement(stmt: &str) -> Stmt {
    let first = stmt.split(|c: char| !c.is_ascii_alphanumeric() && c != '_').next();
    if first == Some("return") {
        Stmt::Return
    } else {
        Stmt::Other
    }
}

/// Deduplicated callee names in a body, keywords excluded.
fn collect_calls(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut calls = Vec::new();
    for caps in CALL_RE.captures_iter(body) {
        let name = caps.get(1).unwrap().as_str();
        if C_KEYWORDS.contains(&name) {
            continue;
        }
        if seen.insert(name.to_string()) {
            calls.push(name.to_string());
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(content: &str) -> ParsedFile {
        parse_source(Path::new("test.c"), content)
    }

    #[test]
    fn finds_function_and_if() {
        let src = r#"
static int do_thing(int nice)
{
	if (nice < 0 && !capable(CAP_SYS_NICE))
		return -EPERM;
	return 0;
}
"#;
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        let f = &parsed.functions[0];
        assert_eq!(f.name, "do_thing");
        assert!(!f.is_entry_point);
        assert_eq!(f.ifs.len(), 1);
        assert!(f.ifs[0].then_block.ends_in_return());
        assert!(f.calls.contains(&"capable".to_string()));
    }

    #[test]
    fn syscall_define_becomes_sys_function() {
        let src = r#"
SYSCALL_DEFINE2(setpriority, int, which)
{
	return do_thing(which);
}
"#;
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "sys_setpriority");
        assert!(parsed.functions[0].is_entry_point);
        assert_eq!(parsed.functions[0].calls, vec!["do_thing".to_string()]);
    }

    #[test]
    fn nested_ifs_collected_in_order() {
        let src = r#"
int outer(void)
{
	if (a) {
		if (capable(CAP_SYS_ADMIN)) {
			return 1;
		}
	}
	return 0;
}
"#;
        let parsed = parse(src);
        assert_eq!(parsed.functions[0].ifs.len(), 2);
    }

    #[test]
    fn braced_then_block_without_trailing_return() {
        let src = r#"
int f(void)
{
	if (capable(CAP_NET_ADMIN)) {
		audit_log();
		count++;
	}
	return 0;
}
"#;
        let parsed = parse(src);
        assert!(!parsed.functions[0].ifs[0].then_block.ends_in_return());
    }

    #[test]
    fn comments_and_strings_ignored() {
        let src = r#"
/* if (fake) { */
int f(void)
{
	const char *s = "if (x) {";
	// if (also_fake)
	if (capable(CAP_CHOWN))
		return 1;
	return 0;
}
"#;
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].ifs.len(), 1);
    }

    #[test]
    fn preprocessor_if_not_a_statement() {
        let src = r#"
#if defined(CONFIG_X)
#define GUARD(x) if (x) panic()
#endif
int f(void)
{
	return 0;
}
"#;
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        assert!(parsed.functions[0].ifs.is_empty());
    }

    #[test]
    fn condition_location_line_numbers() {
        let src = "int f(void)\n{\n\tif (capable(CAP_SYS_ADMIN))\n\t\treturn 1;\n\treturn 0;\n}\n";
        let parsed = parse(src);
        assert_eq!(parsed.functions[0].ifs[0].location.line, 3);
    }

    #[test]
    fn prototype_is_not_a_definition() {
        let src = "int do_thing(int which);\nint f(void)\n{\n\treturn 0;\n}\n";
        let parsed = parse(src);
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "f");
    }
}
