//! Tokenizer for command arguments.
//!
//! Splits on whitespace, honors single and double quotes with backslash
//! escapes, and recognizes `key=value` pairs.

/// A token parsed from command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain word.
    Word(String),
    /// A key=value pair. The value may be empty.
    KeyValue { key: String, value: String },
}

/// Tokenizes a command argument string.
///
/// `password="my secret"` yields `KeyValue { key: "password", value: "my secret" }`.
/// Only the first `=` in a token separates key from value.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut text = String::new();
        let mut key = None;

        while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
            match c {
                '"' | '\'' => text.push_str(&collect_quoted(&mut chars, c)),
                '=' if key.is_none() => key = Some(std::mem::take(&mut text)),
                _ => text.push(c),
            }
        }

        tokens.push(match key {
            Some(key) => Token::KeyValue { key, value: text },
            None => Token::Word(text),
        });
    }

    tokens
}

/// Collects characters up to the closing quote, handling escape sequences.
fn collect_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> String {
    let mut result = String::new();

    while let Some(c) = chars.next() {
        if c == quote {
            break;
        }
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(escaped @ ('\\' | '"' | '\'')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
