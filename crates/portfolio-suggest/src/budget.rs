use std::borrow::Cow;

use tracing::info;

use crate::context::ENTRY_SEPARATOR;

pub const DEFAULT_CONTEXT_CHARS: usize = 24_000;

/// Character cap for inventory context, applied before prompt assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    max_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_CHARS)
    }
}

impl ContextBudget {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Keep whole entries (lines) while they fit and note how many were
    /// dropped. The result is never longer than the budget.
    pub fn fit<'a>(&self, context: &'a str) -> Cow<'a, str> {
        let total = context.chars().count();
        if total <= self.max_chars {
            return Cow::Borrowed(context);
        }

        let entries: Vec<&str> = context.split(ENTRY_SEPARATOR).collect();
        let n = entries.len();
        let sep_len = ENTRY_SEPARATOR.chars().count();

        let mut kept = 0;
        let mut kept_len = 0;
        for (i, entry) in entries.iter().enumerate() {
            let add = entry.chars().count() + if i > 0 { sep_len } else { 0 };
            let suffix_len = more_suffix(n - i - 1).chars().count();
            if kept_len + add + suffix_len > self.max_chars {
                break;
            }
            kept_len += add;
            kept = i + 1;
        }

        let out = if kept > 0 {
            format!("{}{}", entries[..kept].join(ENTRY_SEPARATOR), more_suffix(n - kept))
        } else {
            // even the first entry is too big: cut it
            let suffix = if n > 1 { more_suffix(n - 1) } else { String::new() };
            let suffix_len = suffix.chars().count();
            if suffix_len >= self.max_chars {
                context.chars().take(self.max_chars).collect()
            } else {
                let head: String = entries[0].chars().take(self.max_chars - suffix_len).collect();
                format!("{head}{suffix}")
            }
        };

        info!(
            original_chars = total,
            kept_entries = kept,
            dropped_entries = n - kept,
            "context truncated to budget"
        );
        Cow::Owned(out)
    }
}

fn more_suffix(dropped: usize) -> String {
    format!("\n(+{dropped} more)")
}
