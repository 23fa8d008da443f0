//! Schema script splitting.
//!
//! The bootstrap script is a plain SQL file holding tables, indices, seed rows
//! and triggers. SQLite executes one statement per call, so the script is cut
//! into statements first. Trigger bodies contain semicolons of their own and
//! run until the literal `END;` that closes them.

/// Schema script bundled with the binary.
pub const BUNDLED_SCHEMA: &str = include_str!("../../data/schema.sql");

const LINE_COMMENT: &str = "--";
const TRIGGER_START: &str = "CREATE TRIGGER";
const TRIGGER_END: &str = "END;";

/// What bootstrap does when a single statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementFailurePolicy {
    /// Log and continue with the next statement. Re-running bootstrap on a
    /// populated store then only produces "already exists" failures.
    #[default]
    Ignore,
    /// Stop at the first failing statement.
    Abort,
}

/// Split a schema script into independently executable statements, in
/// source order.
pub fn split_statements(script: &str) -> Vec<String> {
    let bytes = script.as_bytes();
    let mut statements = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        if script[i..].starts_with(LINE_COMMENT) {
            match script[i..].find('\n') {
                Some(nl) => {
                    i += nl + 1;
                    continue;
                }
                None => break,
            }
        }

        let end = if starts_with_ignore_case(&script[i..], TRIGGER_START) {
            trigger_end(script, i)
        } else {
            statement_end(script, i)
        };

        let statement = script[i..end].trim();
        if !statement.is_empty() && statement != ";" && statement != TRIGGER_END {
            statements.push(statement.to_string());
        }
        i = end;
    }

    statements
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Scan state shared by both statement kinds: quoted literals and line
/// comments hide terminators.
enum Scan {
    Code,
    Quoted(u8),
    Comment,
}

/// Byte offset just past the `END;` closing the trigger starting at `start`,
/// or the end of the script.
fn trigger_end(script: &str, start: usize) -> usize {
    scan(script, start, |rest| {
        rest.starts_with(TRIGGER_END).then_some(TRIGGER_END.len())
    })
}

/// Byte offset just past the first terminating semicolon, or the end of the
/// script.
fn statement_end(script: &str, start: usize) -> usize {
    scan(script, start, |rest| rest.starts_with(';').then_some(1))
}

fn scan(script: &str, start: usize, terminator: impl Fn(&str) -> Option<usize>) -> usize {
    let bytes = script.as_bytes();
    let mut state = Scan::Code;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            Scan::Code => {
                if b == b'\'' || b == b'"' {
                    state = Scan::Quoted(b);
                } else if script[i..].starts_with(LINE_COMMENT) {
                    state = Scan::Comment;
                } else if let Some(len) = terminator(&script[i..]) {
                    return i + len;
                }
            }
            Scan::Quoted(quote) => {
                // A doubled quote is an escaped quote and keeps the literal open.
                if b == quote {
                    if bytes.get(i + 1) == Some(&quote) {
                        i += 1;
                    } else {
                        state = Scan::Code;
                    }
                }
            }
            Scan::Comment => {
                if b == b'\n' {
                    state = Scan::Code;
                }
            }
        }
        i += 1;
    }

    bytes.len()
}
