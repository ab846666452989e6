//! Sentence segmentation and size-bounded sentence grouping.
//!
//! Every sentence-based strategy goes through [`group`]; only its parameters
//! differ.

use std::ops::Range;

/// Size window (in chars) and overlap (in sentences) for [`group`].
///
/// `min` is the size a strategy aims for; packing is driven by `max` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupParams {
    pub min: usize,
    pub max: usize,
    pub overlap: usize,
}

impl GroupParams {
    pub const fn new(min: usize, max: usize, overlap: usize) -> Self {
        Self { min, max, overlap }
    }
}

/// Split at `.`/`!`/`?` followed by whitespace, or at a blank line.
///
/// Pieces are trimmed and empty pieces dropped.
pub fn segment(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let sentence_end = c.is_whitespace() && matches!(prev, Some('.' | '!' | '?'));
        let paragraph_break = c == '\n' && matches!(iter.peek(), Some((_, '\n')));
        if sentence_end || paragraph_break {
            push_trimmed(&mut out, &text[start..i]);
            // swallow the whole whitespace run
            let mut next = text.len();
            while let Some(&(j, d)) = iter.peek() {
                if d.is_whitespace() {
                    iter.next();
                } else {
                    next = j;
                    break;
                }
            }
            start = next;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    if start < text.len() {
        push_trimmed(&mut out, &text[start..]);
    }
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece);
    }
}

/// Pack sentences into groups joined by single spaces.
///
/// A group is emitted when the next sentence would push it past `max`; the
/// following group starts with the last `overlap` sentences of the emitted
/// one (dropping leading overlap sentences if they would not leave room).
/// A sentence longer than `max` is emitted on its own. Every group ends past
/// the end of the one before it.
pub fn group(sentences: &[&str], params: &GroupParams) -> Vec<String> {
    group_ranges(sentences, params)
        .into_iter()
        .map(|r| sentences[r].join(" "))
        .collect()
}

/// Grouping expressed as contiguous ranges of sentence indexes.
pub fn group_ranges(sentences: &[&str], params: &GroupParams) -> Vec<Range<usize>> {
    let lens: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();
    let mut groups: Vec<Range<usize>> = Vec::new();
    let mut cur = 0..0;

    for i in 0..lens.len() {
        if !cur.is_empty() && joined_len(&lens, cur.start..i) + 1 + lens[i] > params.max {
            groups.push(cur.clone());
            let mut start = overlap_start(&cur, params.overlap);
            while start < i && joined_len(&lens, start..i) + 1 + lens[i] > params.max {
                start += 1;
            }
            cur = start..i;
        }
        cur.end = i + 1;
    }
    if !cur.is_empty() && groups.last().map_or(true, |last| cur.end > last.end) {
        groups.push(cur);
    }

    groups
}

fn overlap_start(emitted: &Range<usize>, overlap: usize) -> usize {
    if overlap > 0 && emitted.len() > overlap {
        emitted.end - overlap
    } else {
        emitted.end
    }
}

fn joined_len(lens: &[usize], r: Range<usize>) -> usize {
    if r.is_empty() {
        return 0;
    }
    lens[r.clone()].iter().sum::<usize>() + r.len() - 1
}
