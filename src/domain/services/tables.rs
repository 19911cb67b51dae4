#[cfg(test)]
#[path = "tables_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

/// Instruction suffix appended to comparative questions so the model answers
/// with a GFM table. History replay strips it back out of user rows.
pub const TABLE_HINT: &str = " Present this comparison as a GitHub-Flavored Markdown table ONLY (no additional text). \
Start with a header row (| Feature | Option A | Option B |), then a separator row (| --- | --- | --- |), then the data rows. \
Keep each cell to 1-2 lines max. Use bullet points (•) within cells if needed.";

static COMPARATIVE: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(
        r"(?i)\b(vs|versus|compare|comparison|differences?|pros\s*/?\s*cons|benefits|drawbacks|advantages|disadvantages)\b",
    )
    .unwrap();
});

static SEPARATOR_ROW: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"^\s*\|(?:\s*:?-+:?\s*\|)+\s*$").unwrap());

static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"^\s*[-*]\s*([^:]+):\s*(.+)$").unwrap());

pub fn looks_comparative(question: &str) -> bool {
    return COMPARATIVE.is_match(question) || question.to_lowercase().contains(" vs ");
}

/// Appends the table instruction to comparative questions; other questions
/// pass through untouched.
pub fn enhance(question: &str) -> String {
    if looks_comparative(question) {
        return format!("{question}{TABLE_HINT}");
    }

    return question.to_string();
}

pub fn strip_hint(text: &str) -> String {
    return text.replace(TABLE_HINT, "").trim().to_string();
}

/// Best-effort normalization of a reply to a comparative question into a
/// single Markdown table. Non-comparative replies are returned unchanged, as
/// is anything none of the matchers recognize. Multiple candidate tables
/// intentionally collapse to the first match.
pub fn normalize(text: &str, comparative: bool) -> String {
    if !comparative {
        return text.to_string();
    }

    if let Some(table) = extract_table(text) {
        return table;
    }

    if let Some(table) = from_pipe_rows(text) {
        return table;
    }

    if let Some(table) = from_bullet_list(text) {
        return table;
    }

    return text.to_string();
}

fn is_pipe_row(line: &str) -> bool {
    let trimmed = line.trim();
    return trimmed.len() >= 3 && trimmed.starts_with('|') && trimmed.ends_with('|');
}

/// Returns the first syntactically valid table: a pipe header row, a
/// separator row, and any pipe rows that follow. Surrounding prose is
/// dropped.
fn extract_table(text: &str) -> Option<String> {
    let lines = text.lines().collect::<Vec<&str>>();

    for idx in 0..lines.len().saturating_sub(1) {
        if !is_pipe_row(lines[idx]) || !SEPARATOR_ROW.is_match(lines[idx + 1]) {
            continue;
        }

        let mut end = idx + 2;
        while end < lines.len() && is_pipe_row(lines[end]) {
            end += 1;
        }

        return Some(lines[idx..end].join("\n"));
    }

    return None;
}

/// Pipe rows with no separator: treat the first row as the header and
/// synthesize a separator matching its shape, one dash per non-pipe
/// character.
fn from_pipe_rows(text: &str) -> Option<String> {
    let lines = text.lines().collect::<Vec<&str>>();
    let mut start = 0;

    while start < lines.len() {
        if !is_pipe_row(lines[start]) {
            start += 1;
            continue;
        }

        let mut end = start + 1;
        while end < lines.len() && is_pipe_row(lines[end]) {
            end += 1;
        }

        if end - start >= 2 {
            let header = lines[start].trim();
            let separator = header
                .chars()
                .map(|c| {
                    if c == '|' {
                        return '|';
                    }
                    return '-';
                })
                .collect::<String>();

            let mut rows = vec![header.to_string(), separator];
            rows.extend(lines[start + 1..end].iter().map(|e| return e.trim().to_string()));
            return Some(rows.join("\n"));
        }

        start = end;
    }

    return None;
}

/// `- label: value` bullet lines become a two-column table. Lines that do not
/// fit the shape are dropped.
fn from_bullet_list(text: &str) -> Option<String> {
    let rows = text
        .lines()
        .filter_map(|line| {
            let caps = BULLET_ITEM.captures(line)?;
            return Some(format!("| {} | {} |", caps[1].trim(), caps[2].trim()));
        })
        .collect::<Vec<String>>();

    if rows.is_empty() {
        return None;
    }

    return Some(format!("| Feature | Details |\n| --- | --- |\n{}", rows.join("\n")));
}
