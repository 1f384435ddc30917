//! Parser for makefile-style dependency reports.
//!
//! The tool is asked for `-MT<source> -MP -MM <source>`, which prints one
//! rule naming every non-system file the source includes, followed by an
//! empty phony rule per header:
//!
//! ```text
//! a.cc: a.cc include/h.h \
//!   include/g.h
//! include/h.h:
//! include/g.h:
//! ```
//!
//! [`parse`] returns the prerequisites of every rule, de-duplicated, in
//! first-seen order.

use std::collections::HashSet;

/// Extracts the prerequisite paths from a dependency report.
///
/// Line continuations are joined, comment lines skipped, each rule's target
/// stripped at the first `:` followed by whitespace or the end of the line,
/// and the remainder split on unescaped whitespace. `\ ` and `\#` unescape to
/// a space and `#`; `$$` unescapes to `$`.
pub fn parse(report: &str) -> Vec<String> {
    let joined = report.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for line in joined.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(prerequisites) = strip_target(line) else {
            continue;
        };
        for path in split_words(prerequisites) {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Returns the part of a rule line after its target separator, or `None` if
/// the line is not a rule.
fn strip_target(line: &str) -> Option<&str> {
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                // Escaped character; never a separator.
                chars.next();
            }
            ':' => {
                let at_separator = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                if at_separator {
                    return Some(&line[i + 1..]);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some(' ') | Some('#')) => {
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                }
            }
            '$' if chars.peek() == Some(&'$') => {
                chars.next();
                word.push('$');
            }
            c if c.is_whitespace() => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
            c => word.push(c),
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}
