//! Interaction engine: how the other personas respond to a finished post.
//!
//! Each persona passes through two independent gates:
//!
//! 1. [`InteractionEngine::decide`] asks the persona's model what it would do,
//!    then draws against `interaction_frequency`. Losing that draw means no
//!    interaction whatever the model said.
//! 2. The caller draws again against the returned `probability`, which is the
//!    strongest of `0.9·f` (emoji), `0.8·f` (comment) and `0.6·f` (forward).
//!
//! Only after both succeed is anything applied. Comments take a third call.

pub mod comment;
pub mod parse;

pub use comment::{default_comment_options, finish_comment, CommentStream};
pub use parse::{parse_decision, ParsedDecision};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chance::{bernoulli, Chance};
use crate::error::FeedResult;
use crate::persona::{Persona, PersonaRegistry};
use crate::prompt;
use crate::provider::ProviderRegistry;
use crate::types::{Comment, Emoji, GenerationOptions, Locale, Post};

use comment::comment_stream;

pub fn default_decision_options() -> GenerationOptions {
    GenerationOptions::new(0.7)
}

/// Outcome of the first gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionDecision {
    pub emoji: Option<Emoji>,
    pub will_comment: bool,
    pub will_forward: bool,
    /// Chance in `[0, 1]` that the second gate lets this through.
    pub probability: f64,
}

impl InteractionDecision {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.emoji.is_none() && !self.will_comment && !self.will_forward
    }

    /// Combine parsed intent with the persona's interaction frequency.
    pub fn from_parsed(parsed: ParsedDecision, frequency: f64) -> Self {
        let mut probability: f64 = 0.0;
        if parsed.emoji.is_some() {
            probability = 0.9 * frequency;
        }
        if parsed.will_comment {
            probability = probability.max(0.8 * frequency);
        }
        if parsed.will_forward {
            probability = probability.max(0.6 * frequency);
        }
        Self {
            emoji: parsed.emoji,
            will_comment: parsed.will_comment,
            will_forward: parsed.will_forward,
            probability,
        }
    }
}

/// A decision that passed both gates and is ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInteraction {
    pub persona_id: String,
    pub decision: InteractionDecision,
}

pub struct InteractionEngine {
    personas: Arc<PersonaRegistry>,
    providers: Arc<ProviderRegistry>,
    chance: Mutex<Box<dyn Chance>>,
    decision_options: GenerationOptions,
    comment_options: GenerationOptions,
    pacing: Duration,
}

impl InteractionEngine {
    pub fn new(personas: Arc<PersonaRegistry>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            personas,
            providers,
            chance: Mutex::new(Box::new(StdRng::from_os_rng())),
            decision_options: default_decision_options(),
            comment_options: default_comment_options(),
            pacing: Duration::ZERO,
        }
    }

    pub fn with_chance(mut self, chance: Box<dyn Chance>) -> Self {
        self.chance = Mutex::new(chance);
        self
    }

    pub fn with_options(mut self, decision: GenerationOptions, comment: GenerationOptions) -> Self {
        self.decision_options = decision;
        self.comment_options = comment;
        self
    }

    /// Delay between consecutive personas.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    fn draw(&self, p: f64) -> bool {
        let mut chance = self.chance.lock().unwrap();
        bernoulli(chance.as_mut(), p)
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }

    /// First gate. Errors only when the provider call fails.
    pub async fn decide(
        &self,
        persona: &Persona,
        post: &Post,
        locale: Locale,
    ) -> FeedResult<InteractionDecision> {
        if persona.id == post.author_id {
            return Ok(InteractionDecision::none());
        }

        let personality = self.personas.personality_block(persona, locale);
        let prompt = prompt::decision_prompt(&personality, &post.text, locale);
        let provider = self.providers.get(&persona.model);
        let reply = provider.complete(&prompt, &self.decision_options).await?;
        let parsed = parse_decision(&reply);

        if !self.draw(persona.interaction_frequency) {
            debug!(persona_id = %persona.id, post_id = %post.id, "frequency gate closed");
            return Ok(InteractionDecision::none());
        }

        Ok(InteractionDecision::from_parsed(
            parsed,
            persona.interaction_frequency,
        ))
    }

    /// Both gates for every persona but the author. Failures are logged and
    /// that persona is skipped.
    pub async fn plan_interactions(&self, post: &Post, locale: Locale) -> Vec<PlannedInteraction> {
        let mut planned = Vec::new();
        for (i, persona) in self.personas.others(&post.author_id).enumerate() {
            if i > 0 {
                self.pace().await;
            }
            let decision = match self.decide(persona, post, locale).await {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(persona_id = %persona.id, post_id = %post.id, error = %e, "interaction decision failed");
                    continue;
                }
            };
            if decision.is_none() || !self.draw(decision.probability) {
                continue;
            }
            debug!(
                persona_id = %persona.id,
                post_id = %post.id,
                emoji = ?decision.emoji,
                comment = decision.will_comment,
                forward = decision.will_forward,
                "interaction planned"
            );
            planned.push(PlannedInteraction {
                persona_id: persona.id.clone(),
                decision,
            });
        }
        planned
    }

    /// Plan and apply every persona's interaction to a copy of `post`.
    ///
    /// A persona whose decision or comment call fails is skipped; the rest
    /// are unaffected.
    pub async fn apply_interactions(&self, post: &Post, locale: Locale) -> Post {
        let mut updated = post.clone();
        for plan in self.plan_interactions(post, locale).await {
            if let Some(emoji) = plan.decision.emoji {
                updated.reactions.increment(emoji);
            }
            if plan.decision.will_forward {
                updated.forwards += 1;
            }
            if !plan.decision.will_comment {
                continue;
            }
            let Ok(persona) = self.personas.get(&plan.persona_id) else {
                continue;
            };
            match self.generate_comment(persona, post, locale).await {
                Ok(Some(comment)) => updated.comments.push(comment),
                Ok(None) => debug!(persona_id = %persona.id, "persona declined to comment"),
                Err(e) => {
                    warn!(persona_id = %persona.id, post_id = %post.id, error = %e, "comment generation failed")
                }
            }
        }
        updated
    }

    fn comment_prompt(&self, persona: &Persona, post: &Post, locale: Locale) -> String {
        let personality = self.personas.personality_block(persona, locale);
        prompt::comment_prompt(&personality, &post.text, locale)
    }

    /// One comment in a single call. `None` when the persona is not interested.
    pub async fn generate_comment(
        &self,
        persona: &Persona,
        post: &Post,
        locale: Locale,
    ) -> FeedResult<Option<Comment>> {
        let prompt = self.comment_prompt(persona, post, locale);
        let provider = self.providers.get(&persona.model);
        let reply = provider.complete(&prompt, &self.comment_options).await?;
        if parse::is_not_interested(&reply) {
            return Ok(None);
        }
        Ok(Some(Comment::new(persona.id.clone(), reply.trim())))
    }

    pub fn stream_comment(&self, persona: &Persona, post: &Post, locale: Locale) -> CommentStream {
        let prompt = self.comment_prompt(persona, post, locale);
        let provider = self.providers.get(&persona.model);
        comment_stream(provider, prompt, self.comment_options, persona.id.clone())
    }
}
