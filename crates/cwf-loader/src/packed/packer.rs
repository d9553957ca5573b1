// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Payload packer

use super::{decode_index, encode_index, is_word_char};
use rustc_hash::FxHashMap;

/// Splits text into alternating word and non-word runs.
fn runs(text: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let in_word = rest.starts_with(is_word_char);
        let end = rest
            .find(|c: char| is_word_char(c) != in_word)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some((in_word, run))
    })
}

/// Packs module text into a payload that [`decode`](super::decode)
/// restores exactly.
///
/// Unique words are ordered by frequency (first occurrence breaks ties).
/// A word that already is the numeral of a slot in range keeps that slot
/// with an empty token; every other word takes the next free slot and is
/// replaced in the body by the slot's numeral.
pub fn pack(source: &str) -> String {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    let mut words: Vec<&str> = Vec::new();
    for (is_word, run) in runs(source) {
        if is_word {
            let count = counts.entry(run).or_insert(0);
            if *count == 0 {
                words.push(run);
            }
            *count += 1;
        }
    }
    words.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let slots_len = words.len();
    let mut slots: Vec<Option<&str>> = vec![None; slots_len];
    let mut codes: FxHashMap<&str, String> = FxHashMap::default();

    for &word in &words {
        if let Some(index) = decode_index(word).filter(|i| *i < slots_len) {
            slots[index] = Some("");
            codes.insert(word, word.to_string());
        }
    }
    let free: Vec<usize> = (0..slots_len).filter(|i| slots[*i].is_none()).collect();
    let mut free = free.into_iter();
    for &word in &words {
        if codes.contains_key(word) {
            continue;
        }
        if let Some(index) = free.next() {
            slots[index] = Some(word);
            codes.insert(word, encode_index(index));
        }
    }

    let dictionary = slots
        .iter()
        .map(|slot| slot.unwrap_or(""))
        .collect::<Vec<_>>()
        .join("|");
    let body: String = runs(source)
        .map(|(is_word, run)| {
            if is_word {
                codes.get(run).map(String::as_str).unwrap_or(run)
            } else {
                run
            }
        })
        .collect();

    format!("{} {}", dictionary, body)
}
