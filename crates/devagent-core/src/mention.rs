//! `@dev-agent` mention handling.
//!
//! Users address the agent either by typing `@dev-agent <command>` in the
//! chat input or by writing such a line anywhere in a source file.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// Prefix that addresses the agent explicitly.
pub const MENTION_PREFIX: &str = "@dev-agent";

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

fn mention_regex() -> &'static Regex {
    MENTION_RE.get_or_init(|| {
        // Static pattern, cannot fail to compile.
        Regex::new(r"@dev-agent\s+([^\n]+)").unwrap()
    })
}

/// A mention found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// The command following the prefix, trimmed.
    pub command: String,
    /// Byte range of the whole mention in the scanned text.
    pub range: Range<usize>,
}

/// Remove a leading `@dev-agent` prefix.
///
/// Returns the trimmed remainder when the trimmed input starts with the
/// prefix, otherwise the input unchanged.
pub fn strip_mention(text: &str) -> &str {
    match text.trim().strip_prefix(MENTION_PREFIX) {
        Some(rest) => rest.trim(),
        None => text,
    }
}

/// Find every `@dev-agent <command>` line in a document, in order.
pub fn find_mentions(text: &str) -> Vec<Mention> {
    mention_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let command = caps.get(1)?.as_str().trim().to_string();
            Some(Mention {
                command,
                range: whole.range(),
            })
        })
        .collect()
}
