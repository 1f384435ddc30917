//! Tokenizers for the per-unit attribute strings.
//!
//! Units carry their options and auxiliary sources as single strings. These
//! are split here, once, at the load boundary.

/// Splits an options string on whitespace.
///
/// An empty or all-whitespace string yields no tokens. Quoting is not
/// interpreted; option values containing spaces are not supported.
pub fn split_options(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// Tokenizes an auxiliary-sources string.
///
/// Tokens are separated by whitespace. A token wrapped in double or single
/// quotes keeps its inner whitespace and loses the quotes. In a bare token,
/// `\ ` stands for a literal space.
pub fn parse_sources(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut token = String::new();
            let mut closed = false;
            for inner in chars.by_ref() {
                if inner == c {
                    closed = true;
                    break;
                }
                token.push(inner);
            }
            if closed {
                tokens.push(token);
            } else {
                // Unterminated quote: keep the opening quote as part of a bare token.
                let mut bare = String::from(c);
                bare.push_str(&token);
                tokens.extend(split_bare(&bare));
            }
            continue;
        }

        let mut token = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_whitespace() {
                break;
            }
            chars.next();
            if next == '\\' && chars.peek() == Some(&' ') {
                chars.next();
                token.push(' ');
            } else {
                token.push(next);
            }
        }
        tokens.push(token);
    }

    tokens
}

fn split_bare(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}
