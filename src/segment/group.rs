use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::subtitle::{normalize_text, Cue};

/// A contiguous run of cues believed to form one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGroup {
    /// First cue index (inclusive)
    pub start_idx: usize,
    /// Last cue index (inclusive)
    pub end_idx: usize,
    /// Normalized cue texts joined with single spaces
    pub text: String,
}

impl SentenceGroup {
    pub fn len(&self) -> usize {
        self.end_idx - self.start_idx + 1
    }

    pub fn is_single(&self) -> bool {
        self.start_idx == self.end_idx
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start_idx..=self.end_idx
    }
}

/// Merges cues until the merged text ends a sentence
#[derive(Debug, Clone)]
pub struct SentenceGrouper {
    terminals: HashSet<char>,
}

impl Default for SentenceGrouper {
    fn default() -> Self {
        Self::new(".?!。？！".chars())
    }
}

impl SentenceGrouper {
    pub fn new<I: IntoIterator<Item = char>>(terminals: I) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
        }
    }

    /// Empty text counts as terminal so a blank cue never pulls in its neighbours
    pub fn is_sentence_end(&self, text: &str) -> bool {
        match text.trim_end().chars().last() {
            Some(last) => self.terminals.contains(&last),
            None => true,
        }
    }

    /// Group the cues of one subtitle file. Every cue lands in exactly one group.
    pub fn group(&self, cues: &[Cue]) -> Vec<SentenceGroup> {
        let texts: Vec<String> = cues.iter().map(Cue::normalized_text).collect();
        self.group_texts(&texts)
    }

    pub fn group_texts<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SentenceGroup> {
        let mut groups = Vec::new();
        let last = texts.len().saturating_sub(1);

        let mut i = 0;
        while i < texts.len() {
            let start_idx = i;
            let mut merged = normalize_text(texts[i].as_ref());

            while i < last && !self.is_sentence_end(&merged) {
                i += 1;
                let next = normalize_text(texts[i].as_ref());
                if !next.is_empty() {
                    merged.push(' ');
                    merged.push_str(&next);
                }
            }

            groups.push(SentenceGroup {
                start_idx,
                end_idx: i,
                text: merged,
            });
            i += 1;
        }

        groups
    }
}
