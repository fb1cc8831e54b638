const FENCE: &str = "```";

/// Strip markdown code fences (```` ``` ```` plus an optional lowercase
/// language tag) and surrounding whitespace from model output.
///
/// Removal repeats until no fence is left, so backticks that only form a
/// fence after an inner one is cut are removed too and the function is
/// idempotent.
pub fn clean(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains(FENCE) {
        out = strip_fences_once(&out);
    }
    out.trim().to_string()
}

fn strip_fences_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(FENCE) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + FENCE.len()..];
        let tag_len = after.bytes().take_while(|b| b.is_ascii_lowercase()).count();
        rest = &after[tag_len..];
    }
    out.push_str(rest);
    out
}
