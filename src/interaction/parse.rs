//! Free-text parsing of persona replies.
//!
//! Decision replies look like
//!
//! ```text
//! 👍
//! Comment: Yes
//! Forward: No
//! ```
//!
//! but models drift, so matching is by substring: the first emoji found in
//! priority order wins, and intent markers are matched case-insensitively in
//! either language regardless of the prompt locale.

use crate::types::{Emoji, Locale};

use crate::prompt::not_interested;

const COMMENT_MARKERS: [&str; 4] = ["评论：是", "评论:是", "comment: yes", "comment:yes"];
const FORWARD_MARKERS: [&str; 4] = ["转发：是", "转发:是", "forward: yes", "forward:yes"];

/// What a persona said it would do, before any probability gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedDecision {
    pub emoji: Option<Emoji>,
    pub will_comment: bool,
    pub will_forward: bool,
}

/// First reaction symbol present in `text`, checked in [`Emoji::ALL`] order.
pub fn parse_emoji(text: &str) -> Option<Emoji> {
    Emoji::ALL.into_iter().find(|emoji| match emoji {
        // Accept the heart with or without its variation selector.
        Emoji::Heart => text.contains('❤'),
        other => text.contains(other.symbol()),
    })
}

fn has_marker(lowered: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| lowered.contains(m))
}

pub fn parse_decision(text: &str) -> ParsedDecision {
    let lowered = text.trim().to_lowercase();
    ParsedDecision {
        emoji: parse_emoji(text),
        will_comment: has_marker(&lowered, &COMMENT_MARKERS),
        will_forward: has_marker(&lowered, &FORWARD_MARKERS),
    }
}

fn normalize_reply(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '。', '!', '！'])
        .trim()
        .to_lowercase()
}

/// Whether `text` is the "not interested" sentinel in either language.
pub fn is_not_interested(text: &str) -> bool {
    let reply = normalize_reply(text);
    [Locale::Zh, Locale::En]
        .into_iter()
        .any(|locale| reply == not_interested(locale).to_lowercase())
}

/// Whether a partial reply could still turn out to be the sentinel.
pub fn may_become_not_interested(partial: &str) -> bool {
    let reply = normalize_reply(partial);
    [Locale::Zh, Locale::En]
        .into_iter()
        .any(|locale| not_interested(locale).to_lowercase().starts_with(&reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_priority_beats_position() {
        assert_eq!(parse_emoji("👀 then 👍"), Some(Emoji::ThumbsUp));
        assert_eq!(parse_emoji("😄 👀"), Some(Emoji::Smile));
        assert_eq!(parse_emoji("❤ plain heart"), Some(Emoji::Heart));
        assert_eq!(parse_emoji("no reaction"), None);
    }

    #[test]
    fn english_markers() {
        let parsed = parse_decision("❤️\nComment: Yes\nForward: No");
        assert_eq!(parsed.emoji, Some(Emoji::Heart));
        assert!(parsed.will_comment);
        assert!(!parsed.will_forward);
    }

    #[test]
    fn chinese_markers() {
        let parsed = parse_decision("👀\n评论：否\n转发：是");
        assert_eq!(parsed.emoji, Some(Emoji::Eyes));
        assert!(!parsed.will_comment);
        assert!(parsed.will_forward);
    }

    #[test]
    fn markers_are_case_insensitive() {
        let parsed = parse_decision("COMMENT: YES\nforward: YES");
        assert_eq!(parsed.emoji, None);
        assert!(parsed.will_comment && parsed.will_forward);
    }

    #[test]
    fn sentinel_detection() {
        assert!(is_not_interested("不感兴趣"));
        assert!(is_not_interested("  Not interested.\n"));
        assert!(is_not_interested("not interested"));
        assert!(!is_not_interested("Not interested in the hype, but the numbers are great"));
    }

    #[test]
    fn sentinel_prefixes() {
        assert!(may_become_not_interested(""));
        assert!(may_become_not_interested("Not inter"));
        assert!(may_become_not_interested("不感"));
        assert!(may_become_not_interested("Not interested."));
        assert!(!may_become_not_interested("Nice"));
        assert!(!may_become_not_interested("Not interested in"));
    }
}
