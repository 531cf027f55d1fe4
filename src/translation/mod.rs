use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, scan_digits};

/// Placeholder convention a backend expects in statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Numbered `$1`, `$2`, ... (PostgreSQL).
    Postgres,
    /// Positional `?` / `?N` (SQLite); the gateway's native form.
    Sqlite,
}

/// Rewrite `?` placeholders for the target backend.
///
/// The gateway writes statements with bare `?` markers. For PostgreSQL each
/// bare `?` becomes the next `$N` (counting from 1) and an explicit `?N` becomes
/// `$N`. Quoted strings, quoted identifiers, comments, and dollar-quoted blocks
/// are copied through untouched.
///
/// ```rust
/// use procedure_gateway::translation::{PlaceholderStyle, translate_placeholders};
///
/// let sql = translate_placeholders("call add_airport(?, ?, ?)", PlaceholderStyle::Postgres);
/// assert_eq!(sql, "call add_airport($1, $2, $3)");
/// ```
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    if target == PlaceholderStyle::Sqlite {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut copied_to = 0;
    let mut next_positional = 1usize;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    }
                }
                b'?' => {
                    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                    buf.push_str(&sql[copied_to..idx]);
                    buf.push('$');
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        buf.push_str(digits);
                        idx = digits_end - 1;
                    } else {
                        buf.push_str(&next_positional.to_string());
                        next_positional += 1;
                    }
                    copied_to = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}
