//! Structural checks on generated Mermaid source. Not a full grammar: it
//! catches the failure modes seen in model output (missing header, stray
//! fences, unbalanced brackets or quotes).

use serde::Serialize;

const FLOW_HEADERS: &[&str] = &["graph", "flowchart"];

const FLOW_DIRECTIONS: &[&str] = &["TB", "TD", "BT", "RL", "LR"];

const OTHER_HEADERS: &[&str] = &[
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "mindmap",
    "timeline",
    "gitGraph",
    "C4Context",
    "C4Container",
    "C4Component",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DiagramIssue {
    /// 1-based line number; 0 for problems with the whole document.
    pub line: usize,
    pub message: String,
}

impl DiagramIssue {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DiagramIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "line {}: {}", self.line, self.message)
        }
    }
}

/// Validate diagram source. An empty result means no problems were found.
pub fn validate(code: &str) -> Vec<DiagramIssue> {
    if code.trim().is_empty() {
        return vec![DiagramIssue::new(0, "diagram is empty")];
    }

    let mut issues = Vec::new();
    let lines: Vec<&str> = code.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if line.contains('`') {
            issues.push(DiagramIssue::new(i + 1, "stray backtick"));
        }
    }

    let Some(header_idx) = header_line(&lines) else {
        issues.push(DiagramIssue::new(0, "no diagram declaration found"));
        return issues;
    };

    let header = lines[header_idx].trim();
    let is_flowchart = match check_header(header) {
        Ok(flow) => flow,
        Err(msg) => {
            issues.push(DiagramIssue::new(header_idx + 1, msg));
            return issues;
        }
    };

    for (i, line) in lines.iter().enumerate().skip(header_idx + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        if let Err(msg) = check_quotes(trimmed) {
            issues.push(DiagramIssue::new(i + 1, msg));
            continue;
        }
        // other diagram types use brackets as operators (e.g. erDiagram `||--o{`)
        if is_flowchart {
            if let Err(msg) = check_brackets(trimmed) {
                issues.push(DiagramIssue::new(i + 1, msg));
            }
        }
    }

    issues
}

/// Index of the declaration line, skipping comments, directives and front matter.
fn header_line(lines: &[&str]) -> Option<usize> {
    let mut in_front_matter = false;
    for (i, line) in lines.iter().enumerate() {
        let t = line.trim();
        if t == "---" {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter || t.is_empty() || t.starts_with("%%") {
            continue;
        }
        return Some(i);
    }
    None
}

/// Ok(true) for flowcharts, Ok(false) for other known diagram types.
fn check_header(header: &str) -> Result<bool, String> {
    let mut tokens = header.split_whitespace();
    let kind = tokens.next().unwrap_or_default().trim_end_matches(';');

    if FLOW_HEADERS.contains(&kind) {
        if let Some(dir) = tokens.next() {
            let dir = dir.trim_end_matches(';');
            if !FLOW_DIRECTIONS.contains(&dir) {
                return Err(format!("unknown flowchart direction '{dir}'"));
            }
        }
        return Ok(true);
    }
    if OTHER_HEADERS.contains(&kind) {
        return Ok(false);
    }
    Err(format!("unknown diagram type '{kind}'"))
}

fn check_quotes(line: &str) -> Result<(), String> {
    if line.matches('"').count() % 2 != 0 {
        return Err("unterminated string".to_string());
    }
    Ok(())
}

fn check_brackets(line: &str) -> Result<(), String> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_quote = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        if ch == '"' {
            in_quote = !in_quote;
        } else if !in_quote {
            match ch {
                '(' | '[' | '{' => stack.push(ch),
                // asymmetric node shape `id>text]`; arrow heads and tags
                // such as `<br>` inside a label are not openers
                '>' if stack.is_empty() && prev.is_some_and(|p| p.is_alphanumeric() || p == '_') => {
                    stack.push('>')
                }
                ')' | ']' | '}' => {
                    let open = stack.pop();
                    let matched = matches!(
                        (open, ch),
                        (Some('('), ')') | (Some('['), ']') | (Some('{'), '}') | (Some('>'), ']')
                    );
                    if !matched {
                        return Err(format!("unmatched '{ch}'"));
                    }
                }
                _ => {}
            }
        }
        prev = Some(ch);
    }

    match stack.last() {
        Some(open) => Err(format!("unclosed '{open}'")),
        None => Ok(()),
    }
}
