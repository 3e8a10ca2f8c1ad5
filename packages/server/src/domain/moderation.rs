//! Content moderation gate.
//!
//! Every piece of user text passes through [`ModerationGate::sanitize`],
//! [`ModerationGate::validate_length`] and [`ModerationGate::classify`]
//! before it may be persisted or delivered. Keyword matching is pluggable
//! through [`KeywordMatcher`].

use std::ops::Range;

use serde::Serialize;

use super::{
    error::ValueObjectError,
    value_object::{MAX_CONTENT_LENGTH, MessageContent},
};

/// User-facing reason attached to filtered messages.
pub const FILTERED_REASON: &str = "부적절한 내용이 포함되어 있습니다.";

/// Profanity, personal-information solicitation and sexual content.
const DEFAULT_BLOCKLIST: &[&str] = &[
    "씨발", "시발", "병신", "개새끼", "좆", "지랄",
    "fuck", "shit", "bitch",
    "전화번호 알려", "주소 알려", "카톡 아이디", "카톡아이디", "phone number",
    "섹스", "야동", "성관계", "nude",
];

/// Self-harm and suicide-adjacent terms. Never blocked, only flagged.
const DEFAULT_CRISIS_TERMS: &[&str] = &[
    "자살", "죽고싶", "죽고 싶", "생을마감", "목숨을끊", "자해",
    "우울", "절망", "희망없", "희망이 없", "의미없", "사라지고 싶",
    "suicide", "kill myself", "self-harm",
];

/// Outcome of classifying one message. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationVerdict {
    pub is_filtered: bool,
    pub is_crisis: bool,
    /// Input with the matched blocklist term masked; the input itself when not filtered
    pub filtered_content: String,
    pub reason: Option<String>,
}

/// Finds keyword occurrences in text.
pub trait KeywordMatcher: Send + Sync {
    /// Character ranges (not byte ranges) of every non-overlapping occurrence
    /// of `term` in `text`, left to right.
    fn occurrences(&self, text: &str, term: &str) -> Vec<Range<usize>>;
}

/// Case-insensitive plain substring matching.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl KeywordMatcher for SubstringMatcher {
    fn occurrences(&self, text: &str, term: &str) -> Vec<Range<usize>> {
        let haystack: Vec<char> = text.chars().map(fold_case).collect();
        let needle: Vec<char> = term.chars().map(fold_case).collect();
        if needle.is_empty() || needle.len() > haystack.len() {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut start = 0;
        while start + needle.len() <= haystack.len() {
            if haystack[start..start + needle.len()] == needle[..] {
                found.push(start..start + needle.len());
                start += needle.len();
            } else {
                start += 1;
            }
        }
        found
    }
}

// One char in, one char out so positions line up with the original text.
fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Sanitize, validate and classify message text.
pub struct ModerationGate {
    blocklist: Vec<String>,
    crisis_terms: Vec<String>,
    matcher: Box<dyn KeywordMatcher>,
}

impl Default for ModerationGate {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            DEFAULT_CRISIS_TERMS.iter().map(|s| s.to_string()).collect(),
            Box::new(SubstringMatcher),
        )
    }
}

impl ModerationGate {
    pub fn new(
        blocklist: Vec<String>,
        crisis_terms: Vec<String>,
        matcher: Box<dyn KeywordMatcher>,
    ) -> Self {
        Self {
            blocklist,
            crisis_terms,
            matcher,
        }
    }

    /// Strip angle brackets, collapse whitespace, trim and truncate to
    /// [`MAX_CONTENT_LENGTH`] characters. Idempotent.
    pub fn sanitize(&self, text: &str) -> String {
        let without_markup: String = text.chars().filter(|c| *c != '<' && *c != '>').collect();
        let collapsed = without_markup.split_whitespace().collect::<Vec<_>>().join(" ");
        let truncated: String = collapsed.chars().take(MAX_CONTENT_LENGTH).collect();
        truncated.trim_end().to_string()
    }

    /// `1 <= chars <= MAX_CONTENT_LENGTH`
    pub fn validate_length(&self, text: &str) -> bool {
        let len = text.chars().count();
        (1..=MAX_CONTENT_LENGTH).contains(&len)
    }

    /// Length-check raw input, then sanitize it into message content.
    ///
    /// Input that sanitizes down to nothing (e.g. only markup or
    /// whitespace) is rejected as empty.
    pub fn prepare(&self, raw: &str) -> Result<MessageContent, ValueObjectError> {
        if !self.validate_length(raw) {
            let actual = raw.chars().count();
            return Err(if actual == 0 {
                ValueObjectError::MessageContentEmpty
            } else {
                ValueObjectError::MessageContentTooLong {
                    max: MAX_CONTENT_LENGTH,
                    actual,
                }
            });
        }
        MessageContent::new(self.sanitize(raw))
    }

    /// Check `text` against the blocklist and the crisis terms.
    ///
    /// The first blocklist term in list order that occurs decides the
    /// masking. Crisis detection is independent of the blocklist outcome.
    pub fn classify(&self, text: &str) -> ModerationVerdict {
        let blocked = self.blocklist.iter().find_map(|term| {
            let ranges = self.matcher.occurrences(text, term);
            (!ranges.is_empty()).then_some(ranges)
        });

        let is_crisis = self
            .crisis_terms
            .iter()
            .any(|term| !self.matcher.occurrences(text, term).is_empty());

        match blocked {
            Some(ranges) => ModerationVerdict {
                is_filtered: true,
                is_crisis,
                filtered_content: mask(text, &ranges),
                reason: Some(FILTERED_REASON.to_string()),
            },
            None => ModerationVerdict {
                is_filtered: false,
                is_crisis,
                filtered_content: text.to_string(),
                reason: None,
            },
        }
    }
}

fn mask(text: &str, ranges: &[Range<usize>]) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            if ranges.iter().any(|r| r.contains(&i)) {
                '*'
            } else {
                c
            }
        })
        .collect()
}
