//! Enhancement orchestrator: raw OCR text → one completion call → cleaned text.

use crate::config::{EnhancementLevel, Language, Model, OcrConfig, MAX_COMPLETION_TOKENS};
use crate::credential::Credential;
use crate::error::EnhancementError;
use crate::pipeline::llm::{CompletionClient, CompletionRequest, OpenAiClient};
use crate::pipeline::postprocess::strip_code_fence;
use crate::prompts::{build_user_prompt, SYSTEM_PROMPT};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to enhance and how.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementRequest {
    pub raw_text: String,
    pub language: Language,
    pub model: Model,
    pub level: EnhancementLevel,
}

impl EnhancementRequest {
    pub fn new(raw_text: impl Into<String>, config: &OcrConfig) -> Self {
        Self {
            raw_text: raw_text.into(),
            language: config.language,
            model: config.model,
            level: config.level,
        }
    }

    /// The completion request this enhancement sends, given an API key.
    pub fn to_completion(&self, api_key: String) -> CompletionRequest {
        CompletionRequest {
            api_key,
            model: self.model.id().to_string(),
            system: SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(self.language.code(), self.level, &self.raw_text),
            temperature: self.level.temperature(),
            max_tokens: MAX_COMPLETION_TOKENS,
        }
    }
}

/// Clean up OCR text with a single completion call.
///
/// - Whitespace-only text is returned unchanged without calling the client.
/// - Without a resolvable credential the client is never called.
/// - Any client failure becomes [`EnhancementError::Api`]; nothing is retried.
pub async fn enhance(
    request: &EnhancementRequest,
    credential: &Credential,
    client: &dyn CompletionClient,
) -> Result<String, EnhancementError> {
    match prepare(request, credential)? {
        Some(completion) => send(&completion, client).await,
        None => Ok(request.raw_text.clone()),
    }
}

/// Build the completion request, or `None` when the text is blank and
/// needs no call at all.
pub fn prepare(
    request: &EnhancementRequest,
    credential: &Credential,
) -> Result<Option<CompletionRequest>, EnhancementError> {
    if request.raw_text.trim().is_empty() {
        debug!("Nothing to enhance: text is blank");
        return Ok(None);
    }
    let api_key = credential
        .resolve()
        .ok_or(EnhancementError::MissingCredential)?;
    Ok(Some(request.to_completion(api_key)))
}

/// Send a prepared request once and strip any code fence from the reply.
pub async fn send(
    completion: &CompletionRequest,
    client: &dyn CompletionClient,
) -> Result<String, EnhancementError> {
    info!(
        "Enhancing {} chars with {} (temperature {})",
        completion.user.chars().count(),
        completion.model,
        completion.temperature
    );
    match client.complete(completion).await {
        Ok(reply) => Ok(strip_code_fence(&reply)),
        Err(e) => {
            warn!("Enhancement failed: {}", e);
            Err(e.into())
        }
    }
}

/// The injected client if there is one, else an OpenAI client for the
/// configured base URL.
pub fn client_for(config: &OcrConfig) -> Result<Arc<dyn CompletionClient>, EnhancementError> {
    if let Some(client) = &config.client {
        return Ok(Arc::clone(client));
    }
    let client = OpenAiClient::new(&config.api_base_url, config.api_timeout_secs)?;
    Ok(Arc::new(client))
}
