use crate::error::{RedubError, Result};
use super::boundary::{find_boundary, BoundaryRule, PunctuationBoundary};
use super::group::SentenceGroup;

/// Redistributes one translated sentence over the cues of its group.
///
/// Each cue receives a share proportional to the character length of its
/// original text. Cut points are moved to a nearby boundary accepted by the
/// rule when one lies inside the search window.
#[derive(Debug, Clone)]
pub struct Splitter<R: BoundaryRule = PunctuationBoundary> {
    rule: R,
    window: usize,
    placeholder: String,
}

impl Default for Splitter<PunctuationBoundary> {
    fn default() -> Self {
        Self::new(PunctuationBoundary::full_width(), 15, "...")
    }
}

impl<R: BoundaryRule> Splitter<R> {
    pub fn new<S: Into<String>>(rule: R, window: usize, placeholder: S) -> Self {
        Self {
            rule,
            window,
            placeholder: placeholder.into(),
        }
    }

    /// Split `translated` into exactly `original_texts.len()` non-empty parts
    pub fn split<S: AsRef<str>>(&self, original_texts: &[S], translated: &str) -> Result<Vec<String>> {
        match original_texts.len() {
            0 => Err(RedubError::EmptyGroup),
            1 => Ok(vec![translated.to_string()]),
            _ => Ok(self.split_proportionally(original_texts, translated)),
        }
    }

    /// Same as [`Splitter::split`], checking the texts against the group's cue span first
    pub fn split_group<S: AsRef<str>>(
        &self,
        group: &SentenceGroup,
        original_texts: &[S],
        translated: &str,
    ) -> Result<Vec<String>> {
        if group.len() != original_texts.len() {
            return Err(RedubError::GroupMismatch {
                expected: group.len(),
                actual: original_texts.len(),
            });
        }
        self.split(original_texts, translated)
    }

    fn split_proportionally<S: AsRef<str>>(&self, original_texts: &[S], translated: &str) -> Vec<String> {
        let chars: Vec<char> = translated.chars().collect();
        let trans_len = chars.len();
        let ratios = length_ratios(original_texts);

        let mut parts = Vec::with_capacity(ratios.len());
        let mut start = 0;

        for ratio in &ratios[..ratios.len() - 1] {
            let share = (trans_len as f64 * ratio).round() as usize;
            let end = (start + share).min(trans_len);
            let window = self.window.min(end - start);

            let cut = find_boundary(&self.rule, &chars, start, end, window).unwrap_or(end);
            parts.push(chars[start..cut].iter().collect::<String>());
            start = cut;
        }
        parts.push(chars[start..].iter().collect::<String>());

        parts
            .into_iter()
            .map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    self.placeholder.clone()
                } else {
                    part.to_string()
                }
            })
            .collect()
    }
}

/// Character-length share of each text; equal shares when every text is empty
fn length_ratios<S: AsRef<str>>(texts: &[S]) -> Vec<f64> {
    let lengths: Vec<usize> = texts.iter().map(|t| t.as_ref().chars().count()).collect();
    let total: usize = lengths.iter().sum();

    if total == 0 {
        return vec![1.0 / texts.len() as f64; texts.len()];
    }
    lengths.iter().map(|&len| len as f64 / total as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cue_passes_through() {
        let splitter = Splitter::default();
        assert_eq!(splitter.split(&["anything"], "X").unwrap(), vec!["X"]);
        // no trimming or placeholder on the single-cue path
        assert_eq!(splitter.split(&["a"], " padded ").unwrap(), vec![" padded "]);
    }

    #[test]
    fn snaps_to_punctuation() {
        let parts = Splitter::default().split(&["Hello ", "world."], "你好，世界。").unwrap();
        assert_eq!(parts, vec!["你好，", "世界。"]);
    }

    #[test]
    fn prefers_nearby_clause_mark_over_raw_offset() {
        // raw cut would be at 5, the comma allows a cut at 4
        let parts = Splitter::default()
            .split(&["first half", "other half"], "我们发，现了这个问题")
            .unwrap();
        assert_eq!(parts, vec!["我们发，", "现了这个问题"]);
    }

    #[test]
    fn falls_back_to_raw_offset_without_punctuation() {
        let parts = Splitter::default().split(&["aaaa", "bbbb"], "一二三四五六七八").unwrap();
        assert_eq!(parts, vec!["一二三四", "五六七八"]);
    }

    #[test]
    fn window_bounds_the_search() {
        let splitter = Splitter::new(PunctuationBoundary::full_width(), 2, "...");
        // the comma is four characters left of the raw cut at 6
        let parts = splitter.split(&["aaa", "aaa"], "一，三四五六七八九十一二").unwrap();
        assert_eq!(parts, vec!["一，三四五六", "七八九十一二"]);
    }

    #[test]
    fn covers_the_whole_translation() {
        let splitter = Splitter::default();
        let cases: &[(&[&str], &str)] = &[
            (&["so the thing", "is that we", "never really knew."], "所以事情是，我们从来没有真正知道。"),
            (&["a", "much longer second cue", "ccc"], "一个，非常长的第二条字幕，还有丙。"),
            (&["one", "two", "three", "four"], "一、二、三、四。"),
            (&["left part", "right part"], "mixed 中文 and English，text here"),
        ];

        for (originals, translated) in cases {
            let parts = splitter.split(originals, translated).unwrap();
            assert_eq!(parts.len(), originals.len());
            assert!(parts.iter().all(|p| !p.is_empty()));

            let rebuilt: String = parts.concat();
            let expected: String = translated.chars().filter(|c| !c.is_whitespace()).collect();
            let rebuilt: String = rebuilt.chars().filter(|c| !c.is_whitespace()).collect();
            assert_eq!(rebuilt, expected, "parts: {:?}", parts);
        }
    }

    #[test]
    fn empty_shares_get_placeholder() {
        let parts = Splitter::default().split(&["aaaaa", "bbbbb", "ccccc"], "好").unwrap();
        assert_eq!(parts, vec!["...", "...", "好"]);
    }

    #[test]
    fn all_empty_originals_share_equally() {
        let parts = Splitter::default().split(&["", "", ""], "一二三四五六").unwrap();
        assert_eq!(parts, vec!["一二", "三四", "五六"]);
    }

    #[test]
    fn pluggable_rule() {
        let at_space = |text: &[char], pos: usize| text[pos - 1] == ' ';
        let splitter = Splitter::new(at_space, 15, "…");
        let parts = splitter.split(&["aaaaa", "bbbbb"], "hello wonderful world").unwrap();
        // spaces at 6 and 16 sit five away from the raw cut at 11; left wins the tie
        assert_eq!(parts, vec!["hello", "wonderful world"]);
    }

    #[test]
    fn empty_group_is_rejected() {
        let none: [&str; 0] = [];
        assert!(matches!(Splitter::default().split(&none, "x"), Err(RedubError::EmptyGroup)));
    }

    #[test]
    fn group_length_mismatch_is_rejected() {
        let group = SentenceGroup { start_idx: 3, end_idx: 5, text: "a b c".to_string() };
        let err = Splitter::default().split_group(&group, &["a", "b"], "甲乙").unwrap_err();
        assert!(matches!(err, RedubError::GroupMismatch { expected: 3, actual: 2 }));

        let ok = Splitter::default().split_group(&group, &["a", "b", "c"], "甲乙丙").unwrap();
        assert_eq!(ok, vec!["甲", "乙", "丙"]);
    }
}
