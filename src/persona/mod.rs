//! Persona registry: the synthetic authors of the feed.
//!
//! The roster is loaded once and never mutated. Each [`Persona`] carries the
//! behavioral knobs the interaction engine reads (`interaction_frequency`,
//! `opinionated`, `response_style`) and the [`ModelKind`] its text is routed
//! through. The current user lives outside the roster: it can author
//! comments but is never asked to interact.

mod roster;

pub use roster::{current_user, default_roster, CURRENT_USER_ID, DEFAULT_AUTHOR_ID};

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, FeedResult};
use crate::types::{Locale, ModelKind};

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Enthusiastic,
    Technical,
    Casual,
    Formal,
}

impl ResponseStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStyle::Enthusiastic => "enthusiastic",
            ResponseStyle::Technical => "technical",
            ResponseStyle::Casual => "casual",
            ResponseStyle::Formal => "formal",
        }
    }
}

impl std::fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub avatar_url: String,
    pub model: ModelKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Probability in `[0, 1]` of engaging with any given post.
    pub interaction_frequency: f64,
    /// `[0, 1]`; only surfaces in prompts.
    pub opinionated: f64,
    pub response_style: ResponseStyle,
}

impl Persona {
    pub fn is_current_user(&self) -> bool {
        self.id == CURRENT_USER_ID
    }
}

/// Render a `[0, 1]` score on a ten-point scale: `0.7` → `7`, `0.75` → `7.5`.
fn ten_point(score: f64) -> String {
    let scaled = (score * 100.0).round() / 10.0;
    if scaled.fract() == 0.0 {
        format!("{}", scaled as i64)
    } else {
        format!("{scaled:.1}")
    }
}

pub struct PersonaRegistry {
    personas: Vec<Persona>,
    current_user: Persona,
}

impl PersonaRegistry {
    /// Build a registry, rejecting duplicate ids/handles and out-of-range scores.
    pub fn new(personas: Vec<Persona>) -> FeedResult<Self> {
        let mut ids = HashSet::new();
        let mut handles = HashSet::new();
        for persona in &personas {
            if persona.id == CURRENT_USER_ID {
                return Err(FeedError::InvalidInput(format!(
                    "persona id '{CURRENT_USER_ID}' is reserved"
                )));
            }
            if !ids.insert(persona.id.as_str()) {
                return Err(FeedError::InvalidInput(format!(
                    "duplicate persona id '{}'",
                    persona.id
                )));
            }
            if !handles.insert(persona.handle.to_lowercase()) {
                return Err(FeedError::InvalidInput(format!(
                    "duplicate persona handle '{}'",
                    persona.handle
                )));
            }
            for (label, value) in [
                ("interactionFrequency", persona.interaction_frequency),
                ("opinionated", persona.opinionated),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(FeedError::InvalidInput(format!(
                        "{} {label} must be within [0, 1], got {value}",
                        persona.id
                    )));
                }
            }
        }
        Ok(Self {
            personas,
            current_user: current_user(),
        })
    }

    /// Load a roster from a JSON array of personas.
    pub fn from_json(json: &str) -> FeedResult<Self> {
        let personas: Vec<Persona> = serde_json::from_str(json)?;
        Self::new(personas)
    }

    pub fn from_file(path: impl AsRef<Path>) -> FeedResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Roster lookup. The current user is not part of the roster.
    pub fn get(&self, id: &str) -> FeedResult<&Persona> {
        self.personas
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| FeedError::persona_not_found(id))
    }

    /// Roster lookup that also accepts the current-user id.
    pub fn resolve(&self, id: &str) -> FeedResult<&Persona> {
        if id == CURRENT_USER_ID {
            return Ok(&self.current_user);
        }
        self.get(id)
    }

    pub fn current_user(&self) -> &Persona {
        &self.current_user
    }

    pub fn by_handle(&self, handle: &str) -> Option<&Persona> {
        let handle = handle.trim_start_matches('@');
        self.personas
            .iter()
            .find(|p| p.handle.eq_ignore_ascii_case(handle))
    }

    /// Everyone in the roster except `author_id`, in roster order.
    pub fn others<'a>(&'a self, author_id: &'a str) -> impl Iterator<Item = &'a Persona> + 'a {
        self.personas.iter().filter(move |p| p.id != author_id)
    }

    /// Roster personas `@mentioned` in `text`, in order of first mention.
    pub fn resolve_mentions(&self, text: &str) -> Vec<&Persona> {
        let mut seen = HashSet::new();
        MENTION
            .captures_iter(text)
            .filter_map(|cap| self.by_handle(&cap[1]))
            .filter(|p| seen.insert(p.id.clone()))
            .collect()
    }

    /// Personality description embedded in decision and comment prompts.
    pub fn personality_block(&self, persona: &Persona, locale: Locale) -> String {
        let interests = persona.interests.join(", ");
        let frequency = ten_point(persona.interaction_frequency);
        let opinion = ten_point(persona.opinionated);
        match locale {
            Locale::Zh => format!(
                "\n姓名: {}\n兴趣: {interests}\n互动频率: {frequency}/10\n主见程度: {opinion}/10\n回复风格: {}\n",
                persona.name, persona.response_style
            ),
            Locale::En => format!(
                "\nName: {}\nInterests: {interests}\nInteraction frequency: {frequency}/10\nOpinionatedness: {opinion}/10\nResponse style: {}\n",
                persona.name, persona.response_style
            ),
        }
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self {
            personas: default_roster(),
            current_user: current_user(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_has_six_personas() {
        let registry = PersonaRegistry::default();
        assert_eq!(registry.len(), 6);
        let names: Vec<_> = registry.all().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Huggingdog",
                "DeepDiver",
                "TechyTorch",
                "InferenceGuru",
                "DataWhisperer",
                "PolicyPundit"
            ]
        );
        assert!(PersonaRegistry::new(default_roster()).is_ok());
    }

    #[test]
    fn get_unknown_is_not_found() {
        let registry = PersonaRegistry::default();
        assert_eq!(registry.get("agent-2").unwrap().handle, "deep_diver");
        let err = registry.get("agent-42").unwrap_err();
        assert!(matches!(err, FeedError::PersonaNotFound { ref id } if id == "agent-42"));
    }

    #[test]
    fn current_user_resolves_outside_roster() {
        let registry = PersonaRegistry::default();
        assert!(registry.get(CURRENT_USER_ID).is_err());
        let user = registry.resolve(CURRENT_USER_ID).unwrap();
        assert!(user.is_current_user());
        assert_eq!(user.handle, "user");
    }

    #[test]
    fn personality_block_zh() {
        let registry = PersonaRegistry::default();
        let block = registry.personality_block(registry.get("agent-2").unwrap(), Locale::Zh);
        assert_eq!(
            block,
            "\n姓名: DeepDiver\n兴趣: 论文解读, 技术深度分析, 模型架构, 算法优化\n互动频率: 7/10\n主见程度: 8/10\n回复风格: technical\n"
        );
    }

    #[test]
    fn personality_block_en_labels() {
        let registry = PersonaRegistry::default();
        let block = registry.personality_block(registry.get("agent-1").unwrap(), Locale::En);
        assert!(block.contains("Name: Huggingdog"));
        assert!(block.contains("Interaction frequency: 10/10"));
        assert!(block.contains("Opinionatedness: 5/10"));
    }

    #[test]
    fn ten_point_scale() {
        assert_eq!(ten_point(0.7), "7");
        assert_eq!(ten_point(0.75), "7.5");
        assert_eq!(ten_point(0.0), "0");
    }

    #[test]
    fn mentions_resolve_in_order_without_duplicates() {
        let registry = PersonaRegistry::default();
        let mentioned = registry
            .resolve_mentions("@policy_pundit thoughts? cc @Inference_Guru @nobody @policy_pundit");
        let ids: Vec<_> = mentioned.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["agent-6", "agent-4"]);
    }

    #[test]
    fn others_excludes_author() {
        let registry = PersonaRegistry::default();
        let others: Vec<_> = registry.others("agent-1").map(|p| p.id.clone()).collect();
        assert_eq!(others.len(), 5);
        assert!(!others.contains(&"agent-1".to_string()));
    }

    #[test]
    fn rejects_invalid_rosters() {
        let mut dup = default_roster();
        dup.push(dup[0].clone());
        assert!(matches!(
            PersonaRegistry::new(dup),
            Err(FeedError::InvalidInput(_))
        ));

        let mut out_of_range = default_roster();
        out_of_range[0].interaction_frequency = 1.5;
        assert!(PersonaRegistry::new(out_of_range).is_err());
    }

    #[test]
    fn loads_from_json() {
        let json = r#"[{
            "id": "p1",
            "name": "Solo",
            "handle": "solo",
            "model": "Mistral",
            "interactionFrequency": 0.3,
            "opinionated": 0.2,
            "responseStyle": "casual"
        }]"#;
        let registry = PersonaRegistry::from_json(json).unwrap();
        let solo = registry.get("p1").unwrap();
        assert_eq!(solo.model, ModelKind::Mistral);
        assert_eq!(solo.response_style, ResponseStyle::Casual);
        assert!(solo.interests.is_empty());
    }
}
