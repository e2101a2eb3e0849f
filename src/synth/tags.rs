//! Tag extraction from generated post text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Topic keywords recognized in free text even without a `#`.
pub const KEYWORDS: [&str; 17] = [
    "人工智能",
    "AI",
    "机器学习",
    "ML",
    "深度学习",
    "DL",
    "自然语言处理",
    "NLP",
    "计算机视觉",
    "CV",
    "强化学习",
    "RL",
    "Hugging Face",
    "大语言模型",
    "LLM",
    "多模态",
    "Multimodal",
];

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_]+)").unwrap());

/// `#hashtags` (ASCII word characters, in order of appearance) followed by
/// every keyword found as a case-insensitive substring. Duplicates are
/// dropped only when they match exactly.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    let hashtags = HASHTAG.captures_iter(text).map(|cap| cap[1].to_string());

    let lowered = text.to_lowercase();
    let keywords = KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string());

    for tag in hashtags.chain(keywords) {
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags
}
