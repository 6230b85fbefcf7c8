//! Speaker style profiling.
//!
//! Summarizes how a speaker writes: the tokens they use most, which
//! informal expressions (ㅋㅋ, ㅠㅠ, ...) appear in their messages, and
//! their average message length in characters. The profile is embedded
//! verbatim into the generation prompt.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::ChatMessage;

/// Short informal expressions checked for by substring.
pub const DEFAULT_EXPRESSIONS: &[&str] = &["ㅋㅋ", "ㅎㅎ", "ㅠㅠ", "ㅇㅇ", "ㄷㄷ", "ㄱㄱ", "ㅜㅜ"];

/// Average length reported when a speaker has no messages.
pub const FALLBACK_AVG_LENGTH: usize = 15;

/// Top-K cutoff used by the interactive chat loop.
pub const INTERACTIVE_TOP_WORDS: usize = 10;

/// Top-K cutoff used by the advanced variant.
pub const ADVANCED_TOP_WORDS: usize = 50;

/// Knobs for [`compute_style_profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct StyleParams {
    /// Number of most-frequent tokens to keep.
    pub top_words: usize,
    /// Drop tokens that are themselves catalog expressions (applied
    /// after the top-K cut).
    pub exclude_expressions: bool,
    pub fallback_avg_length: usize,
    pub expressions: Vec<String>,
}

impl StyleParams {
    pub fn interactive() -> Self {
        Self {
            top_words: INTERACTIVE_TOP_WORDS,
            exclude_expressions: false,
            fallback_avg_length: FALLBACK_AVG_LENGTH,
            expressions: default_expressions(),
        }
    }

    pub fn advanced() -> Self {
        Self {
            top_words: ADVANCED_TOP_WORDS,
            exclude_expressions: true,
            ..Self::interactive()
        }
    }
}

impl Default for StyleParams {
    fn default() -> Self {
        Self::interactive()
    }
}

pub fn default_expressions() -> Vec<String> {
    DEFAULT_EXPRESSIONS.iter().map(|s| s.to_string()).collect()
}

/// Derived summary of a speaker's writing style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakerStyleProfile {
    pub top_words: Vec<String>,
    pub top_expressions: Vec<String>,
    pub avg_length: usize,
}

/// Compute the style profile for `speaker` over `corpus`.
///
/// Returns empty lists and `params.fallback_avg_length` when the speaker
/// has no messages.
pub fn compute_style_profile(
    corpus: &[ChatMessage],
    speaker: &str,
    params: &StyleParams,
) -> SpeakerStyleProfile {
    let texts: Vec<&str> = corpus
        .iter()
        .filter(|m| m.speaker == speaker)
        .map(|m| m.text.as_str())
        .collect();

    if texts.is_empty() {
        return SpeakerStyleProfile {
            top_words: Vec::new(),
            top_expressions: Vec::new(),
            avg_length: params.fallback_avg_length,
        };
    }

    let top_words: Vec<String> = top_tokens(&texts, params.top_words)
        .into_iter()
        .filter(|w| !(params.exclude_expressions && params.expressions.contains(w)))
        .collect();

    let top_expressions: Vec<String> = params
        .expressions
        .iter()
        .filter(|exp| texts.iter().any(|t| t.contains(exp.as_str())))
        .cloned()
        .collect();

    let total_chars: usize = texts.iter().map(|t| t.chars().count()).sum();

    SpeakerStyleProfile {
        top_words,
        top_expressions,
        avg_length: total_chars / texts.len(),
    }
}

/// The `k` most frequent whitespace-delimited tokens, by descending
/// count with ties in first-seen order.
pub fn top_tokens(texts: &[&str], k: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in texts.iter().flat_map(|t| t.split_whitespace()) {
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(k)
        .map(|(t, _)| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::corpus;

    #[test]
    fn test_empty_speaker_uses_fallback() {
        let c = corpus(&[("지영", "안녕")]);
        let p = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert!(p.top_words.is_empty());
        assert!(p.top_expressions.is_empty());
        assert_eq!(p.avg_length, 15);
    }

    #[test]
    fn test_fallback_is_configurable() {
        let params = StyleParams {
            fallback_avg_length: 20,
            ..StyleParams::advanced()
        };
        let p = compute_style_profile(&[], "민수", &params);
        assert_eq!(p.avg_length, 20);
    }

    #[test]
    fn test_repeated_laugh() {
        let c = corpus(&[("민수", "ㅋㅋㅋ"), ("민수", "ㅋㅋㅋ"), ("민수", "ㅋㅋㅋ")]);
        let p = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert_eq!(p.top_expressions, vec!["ㅋㅋ"]);
        assert_eq!(p.avg_length, "ㅋㅋㅋ".chars().count());
        assert_eq!(p.avg_length, 3);
    }

    #[test]
    fn test_avg_length_truncates() {
        // 2 + 3 = 5 chars over 2 messages -> 2
        let c = corpus(&[("민수", "ab"), ("민수", "abc")]);
        let p = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert_eq!(p.avg_length, 2);
    }

    #[test]
    fn test_top_words_by_frequency_then_first_seen() {
        let texts = ["b a c", "a c d", "c"];
        assert_eq!(top_tokens(&texts, 3), vec!["c", "a", "b"]);
        assert_eq!(top_tokens(&texts, 10), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_only_speaker_messages_counted() {
        let c = corpus(&[("민수", "밥 먹자"), ("지영", "싫어 싫어 싫어"), ("민수", "밥")]);
        let p = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert_eq!(p.top_words, vec!["밥", "먹자"]);
    }

    #[test]
    fn test_expressions_keep_catalog_order() {
        let c = corpus(&[("민수", "ㅠㅠ 슬퍼"), ("민수", "ㅎㅎ 좋아")]);
        let p = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert_eq!(p.top_expressions, vec!["ㅎㅎ", "ㅠㅠ"]);
    }

    #[test]
    fn test_advanced_excludes_expression_tokens() {
        let c = corpus(&[("민수", "ㅋㅋ 진짜"), ("민수", "ㅋㅋ 대박")]);
        let interactive = compute_style_profile(&c, "민수", &StyleParams::interactive());
        assert_eq!(interactive.top_words[0], "ㅋㅋ");

        let advanced = compute_style_profile(&c, "민수", &StyleParams::advanced());
        assert_eq!(advanced.top_words, vec!["진짜", "대박"]);
    }

    #[test]
    fn test_top_k_cutoff() {
        let text = (0..30).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let c = corpus(&[("민수", text.as_str())]);
        assert_eq!(
            compute_style_profile(&c, "민수", &StyleParams::interactive()).top_words.len(),
            10
        );
        assert_eq!(
            compute_style_profile(&c, "민수", &StyleParams::advanced()).top_words.len(),
            30
        );
    }
}
