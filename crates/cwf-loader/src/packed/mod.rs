// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Packed module payloads
//!
//! A payload is `"<dictionary> <body>"`. The dictionary is a `|`-separated
//! token list; the body refers to token `i` by the base-62 numeral of `i`
//! written as a whole word. Decoding substitutes tokens from the highest
//! index down to zero, one pass per token, skipping empty tokens (an empty
//! token means the numeral stands for itself).
//!
//! Word characters are ASCII letters, digits and `_`.

mod packer;

pub use packer::pack;

use thiserror::Error;

/// Errors raised by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload has no space between dictionary and body
    #[error("Malformed payload: missing separator between dictionary and body")]
    MissingSeparator,
}

/// Number of distinct base-62 digits.
const RADIX: usize = 62;

/// Returns true for characters that form words in a payload body.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn digit_char(digit: usize) -> char {
    match digit {
        0..=9 => (b'0' + digit as u8) as char,
        10..=35 => (b'a' + (digit - 10) as u8) as char,
        _ => (digit as u8 + 29) as char,
    }
}

fn digit_value(c: char) -> Option<usize> {
    match c {
        '0'..='9' => Some(c as usize - '0' as usize),
        'a'..='z' => Some(c as usize - 'a' as usize + 10),
        'A'..='Z' => Some(c as usize - 'A' as usize + 36),
        _ => None,
    }
}

/// Renders `index` as a base-62 numeral (`0-9`, `a-z`, `A-Z`).
pub fn encode_index(index: usize) -> String {
    let mut out = if index < RADIX {
        String::new()
    } else {
        encode_index(index / RADIX)
    };
    out.push(digit_char(index % RADIX));
    out
}

/// Parses a canonical base-62 numeral, the inverse of [`encode_index`].
///
/// Non-canonical spellings (leading zeros) are rejected.
pub fn decode_index(text: &str) -> Option<usize> {
    if text.is_empty() {
        return None;
    }
    let mut value: usize = 0;
    for c in text.chars() {
        value = value.checked_mul(RADIX)?.checked_add(digit_value(c)?)?;
    }
    (encode_index(value) == text).then_some(value)
}

/// Replaces every whole-word occurrence of `word` in `text`.
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        let in_word = rest.starts_with(is_word_char);
        let end = rest
            .find(|c: char| is_word_char(c) != in_word)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        if in_word && run == word {
            out.push_str(replacement);
        } else {
            out.push_str(run);
        }
        rest = tail;
    }
    out
}

/// Decodes a packed payload into module text.
pub fn decode(packed: &str) -> Result<String, DecodeError> {
    let (dictionary, body) = packed
        .split_once(' ')
        .ok_or(DecodeError::MissingSeparator)?;
    let tokens: Vec<&str> = dictionary.split('|').collect();

    let mut text = body.to_string();
    for (index, token) in tokens.iter().enumerate().rev() {
        if !token.is_empty() {
            text = replace_word(&text, &encode_index(index), token);
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_index_digits() {
        assert_eq!(encode_index(0), "0");
        assert_eq!(encode_index(9), "9");
        assert_eq!(encode_index(10), "a");
        assert_eq!(encode_index(35), "z");
        assert_eq!(encode_index(36), "A");
        assert_eq!(encode_index(61), "Z");
        assert_eq!(encode_index(62), "10");
        assert_eq!(encode_index(62 * 62 + 1), "101");
    }

    #[test]
    fn test_decode_index_is_inverse() {
        for i in [0, 9, 10, 61, 62, 3843, 3844, 100_000] {
            assert_eq!(decode_index(&encode_index(i)), Some(i));
        }
        assert_eq!(decode_index("01"), None);
        assert_eq!(decode_index(""), None);
        assert_eq!(decode_index("a_b"), None);
    }

    #[test]
    fn test_decode_substitutes_whole_words() {
        assert_eq!(decode("alpha|beta 0 1 0").unwrap(), "alpha beta alpha");
        assert_eq!(decode("alpha 0x x0 0.0").unwrap(), "0x x0 alpha.alpha");
    }

    #[test]
    fn test_decode_skips_empty_tokens() {
        assert_eq!(decode("|beta 0 1").unwrap(), "0 beta");
    }

    #[test]
    fn test_decode_requires_separator() {
        assert_eq!(decode("alpha|beta"), Err(DecodeError::MissingSeparator));
    }

    #[test]
    fn test_decode_keeps_body_spaces() {
        assert_eq!(decode("x a = 0\nb = 0").unwrap(), "a = x\nb = x");
    }

    #[test]
    fn test_decode_order_is_descending() {
        // Token 0 spells the numeral of token 1; ascending passes would
        // rewrite the freshly inserted "1" a second time.
        let payload = "1|beta 0 1";
        assert_eq!(decode(payload).unwrap(), "1 beta");

        let (dictionary, body) = payload.split_once(' ').unwrap();
        let mut ascending = body.to_string();
        for (index, token) in dictionary.split('|').enumerate() {
            ascending = replace_word(&ascending, &encode_index(index), token);
        }
        assert_eq!(ascending, "beta beta");
    }

    #[test]
    fn test_replace_word_respects_boundaries() {
        assert_eq!(replace_word("a ab a_ ba a", "a", "X"), "X ab a_ ba X");
        assert_eq!(replace_word("é0é", "0", "X"), "éXé");
    }
}
