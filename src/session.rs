//! Chat session orchestration.
//!
//! A [`Session`] owns the corpus, the selected speaker, the lazily computed
//! style profile, and the conversation window. Each turn retrieves similar
//! messages, composes a prompt, calls a [`CompletionProvider`], and only
//! after a successful reply appends the user and speaker turns to the
//! window.

use anyhow::Result;
use futures::StreamExt;

use echochat_core::completion::{CompletionProvider, GenerationMode};
use echochat_core::history::push_turn;
use echochat_core::models::{ChatMessage, ConversationTurn};
use echochat_core::prompt::{compose_prompt, ComposedPrompt, PromptInput};
use echochat_core::retrieve::{retrieve, RetrievalParams};
use echochat_core::style::{compute_style_profile, SpeakerStyleProfile, StyleParams};

use crate::config::Config;

/// Tunables for a session, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub style: StyleParams,
    pub retrieval: RetrievalParams,
    pub history_limit: usize,
    pub system_prompt: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            style: config.style.params(),
            retrieval: config.retrieval.params(),
            history_limit: config.session.history_limit,
            system_prompt: config.llm.system_prompt().to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct Session {
    corpus: Vec<ChatMessage>,
    speaker: String,
    settings: SessionSettings,
    profile: Option<SpeakerStyleProfile>,
    history: Vec<ConversationTurn>,
}

impl Session {
    pub fn new(
        corpus: Vec<ChatMessage>,
        speaker: impl Into<String>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            corpus,
            speaker: speaker.into(),
            settings,
            profile: None,
            history: Vec::new(),
        }
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Style profile for the current speaker, computed on first access.
    pub fn profile(&mut self) -> &SpeakerStyleProfile {
        let (corpus, speaker, params) = (&self.corpus, &self.speaker, &self.settings.style);
        self.profile
            .get_or_insert_with(|| compute_style_profile(corpus, speaker, params))
    }

    /// Swap in a new corpus. Drops the cached profile and the window.
    pub fn replace_corpus(&mut self, corpus: Vec<ChatMessage>) {
        self.corpus = corpus;
        self.reset();
    }

    /// Talk to a different speaker. Drops the cached profile and the window.
    pub fn select_speaker(&mut self, speaker: impl Into<String>) {
        self.speaker = speaker.into();
        self.reset();
    }

    fn reset(&mut self) {
        self.profile = None;
        self.history.clear();
    }

    /// Retrieve context and compose the prompt for `user_input`.
    pub fn build_prompt(&mut self, user_input: &str) -> ComposedPrompt {
        let Self {
            ref corpus,
            ref speaker,
            ref settings,
            ref mut profile,
            ref history,
        } = *self;

        let retrieved = retrieve(corpus, speaker, user_input, &settings.retrieval);
        tracing::debug!(hits = retrieved.len(), "retrieved similar messages");

        let profile =
            profile.get_or_insert_with(|| compute_style_profile(corpus, speaker, &settings.style));

        let prompt = compose_prompt(
            &PromptInput {
                speaker,
                profile,
                retrieved: &retrieved,
                history,
                user_input,
            },
            &settings.system_prompt,
        );
        tracing::debug!(chars = prompt.user.chars().count(), "composed prompt");
        prompt
    }

    /// One turn with a blocking completion.
    pub async fn respond(
        &mut self,
        provider: &dyn CompletionProvider,
        user_input: &str,
    ) -> Result<String> {
        let prompt = self.build_prompt(user_input);
        let reply = provider.complete(&prompt.system, &prompt.user).await?;
        self.record(user_input, &reply);
        Ok(reply)
    }

    /// One turn with a streaming completion.
    ///
    /// Each fragment is passed to `on_chunk` as it arrives. The full reply
    /// is returned and recorded only if the stream ends without error.
    pub async fn respond_stream<F>(
        &mut self,
        provider: &dyn CompletionProvider,
        user_input: &str,
        mut on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let prompt = self.build_prompt(user_input);
        let mut stream = provider.complete_stream(&prompt.system, &prompt.user).await?;

        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            on_chunk(&chunk);
            reply.push_str(&chunk);
        }

        self.record(user_input, &reply);
        Ok(reply)
    }

    /// Dispatch to [`respond`](Self::respond) or
    /// [`respond_stream`](Self::respond_stream).
    pub async fn respond_with<F>(
        &mut self,
        provider: &dyn CompletionProvider,
        mode: GenerationMode,
        user_input: &str,
        mut on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        match mode {
            GenerationMode::Streaming => self.respond_stream(provider, user_input, on_chunk).await,
            GenerationMode::Blocking => {
                let reply = self.respond(provider, user_input).await?;
                on_chunk(&reply);
                Ok(reply)
            }
        }
    }

    fn record(&mut self, user_input: &str, reply: &str) {
        let limit = self.settings.history_limit;
        let window = std::mem::take(&mut self.history);
        let window = push_turn(window, ConversationTurn::user(user_input), limit);
        self.history = push_turn(
            window,
            ConversationTurn::speaker(self.speaker.clone(), reply),
            limit,
        );
    }
}
