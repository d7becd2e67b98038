use std::collections::HashSet;

/// Decides whether a translated sentence may be cut at a character offset.
///
/// `pos` is a cut position in `text`: the left part is `text[..pos]`, the right
/// part `text[pos..]`. Implementations are only asked about `0 < pos < text.len()`.
pub trait BoundaryRule: Send + Sync {
    fn is_boundary(&self, text: &[char], pos: usize) -> bool;
}

/// Cut right after any character from a fixed punctuation set
#[derive(Debug, Clone)]
pub struct PunctuationBoundary {
    marks: HashSet<char>,
}

impl PunctuationBoundary {
    pub fn new<I: IntoIterator<Item = char>>(marks: I) -> Self {
        Self {
            marks: marks.into_iter().collect(),
        }
    }

    /// Full-width clause and sentence marks used in CJK text
    pub fn full_width() -> Self {
        Self::new("，。！？、；：".chars())
    }
}

impl Default for PunctuationBoundary {
    fn default() -> Self {
        Self::full_width()
    }
}

impl BoundaryRule for PunctuationBoundary {
    fn is_boundary(&self, text: &[char], pos: usize) -> bool {
        pos > 0 && text.get(pos - 1).is_some_and(|c| self.marks.contains(c))
    }
}

impl<F> BoundaryRule for F
where
    F: Fn(&[char], usize) -> bool + Send + Sync,
{
    fn is_boundary(&self, text: &[char], pos: usize) -> bool {
        self(text, pos)
    }
}

/// Find the cut closest to `target` accepted by `rule`.
///
/// Distances `0..window` are checked outward, left side before right side at
/// each distance. A left cut must stay after `floor`; a right cut must stay
/// strictly inside the text.
pub fn find_boundary<R: BoundaryRule + ?Sized>(
    rule: &R,
    text: &[char],
    floor: usize,
    target: usize,
    window: usize,
) -> Option<usize> {
    for distance in 0..window {
        if let Some(left) = target.checked_sub(distance) {
            if left > floor && rule.is_boundary(text, left) {
                return Some(left);
            }
        }

        let right = target + distance;
        if right < text.len() && rule.is_boundary(text, right) {
            return Some(right);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn punctuation_marks_the_following_position() {
        let rule = PunctuationBoundary::full_width();
        let text = chars("你好，世界。");
        assert!(!rule.is_boundary(&text, 2));
        assert!(rule.is_boundary(&text, 3));
        assert!(!rule.is_boundary(&text, 0));
    }

    #[test]
    fn nearest_boundary_wins() {
        let rule = PunctuationBoundary::full_width();
        // cuts after the commas are at 2 and 8
        let text = chars("一，二三四五六，七八九十");
        assert_eq!(find_boundary(&rule, &text, 0, 6, 15), Some(8));
        assert_eq!(find_boundary(&rule, &text, 0, 4, 15), Some(2));
        assert_eq!(find_boundary(&rule, &text, 0, 5, 15), Some(2));
    }

    #[test]
    fn left_is_checked_before_right_at_equal_distance() {
        let rule = PunctuationBoundary::full_width();
        let text = chars("一二，四五，七八");
        // target 4: left cut at 3 and right cut at 6 are one and two away; 3 wins
        assert_eq!(find_boundary(&rule, &text, 0, 4, 15), Some(3));
        // symmetric case: cuts at 3 and 5 around target 4
        let text = chars("一二，四，六七八");
        assert_eq!(find_boundary(&rule, &text, 0, 4, 15), Some(3));
    }

    #[test]
    fn window_and_floor_limit_the_search() {
        let rule = PunctuationBoundary::full_width();
        let text = chars("一，三四五六七八九十");
        assert_eq!(find_boundary(&rule, &text, 0, 6, 3), None);
        assert_eq!(find_boundary(&rule, &text, 2, 6, 15), None);
        assert_eq!(find_boundary(&rule, &text, 0, 6, 0), None);
    }

    #[test]
    fn closures_are_rules() {
        let at_space = |text: &[char], pos: usize| text[pos - 1] == ' ';
        let text = chars("ab cd ef");
        assert_eq!(find_boundary(&at_space, &text, 0, 4, 5), Some(3));
    }
}
