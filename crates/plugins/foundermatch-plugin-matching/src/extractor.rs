//! Tag extraction through a language model
//!
//! The idea text is dropped verbatim into the analyst prompt, the completion
//! is parsed as a JSON object, and the result must carry a non-empty `domain`
//! list plus non-empty `stage` and `region` strings. There is no fallback:
//! any deviation is an `Extraction` error.

use foundermatch_core::{
    ExtractedTags, MatchError, Result, TemplateEngine, TextCompletionService,
};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Shape the model is instructed to emit; unknown keys are ignored
#[derive(Debug, Deserialize)]
struct RawTags {
    domain: Vec<String>,
    stage: String,
    region: String,
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)\A```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\z").expect("valid fence regex")
    })
}

/// Parse a completion into tags.
///
/// Surrounding whitespace and one enclosing Markdown code fence are removed;
/// what remains must be a JSON object of the expected shape.
pub fn parse_tags(completion: &str) -> Result<ExtractedTags> {
    let trimmed = completion.trim();
    let body = code_fence()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    if body.is_empty() {
        return Err(MatchError::extraction("Language model returned an empty response"));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        MatchError::extraction(format!("Language model response is not valid JSON: {}", e))
    })?;
    if !value.is_object() {
        return Err(MatchError::extraction(
            "Language model response is not a JSON object",
        ));
    }

    let raw: RawTags = serde_json::from_value(value).map_err(|e| {
        MatchError::extraction(format!("Language model response has the wrong shape: {}", e))
    })?;

    ExtractedTags::new(
        raw.domain.into_iter().map(|d| d.trim().to_string()).collect(),
        raw.stage.trim(),
        raw.region.trim(),
    )
}

/// Turns a startup description into domain/stage/region tags
pub struct TagExtractor {
    completion: Arc<dyn TextCompletionService>,
    templates: TemplateEngine,
}

impl TagExtractor {
    pub fn new(completion: Arc<dyn TextCompletionService>) -> Result<Self> {
        Ok(Self {
            completion,
            templates: TemplateEngine::new()?,
        })
    }

    /// Extract tags for one idea. Not cached; every call hits the backend.
    pub async fn extract(&self, idea: &str) -> Result<ExtractedTags> {
        if idea.trim().is_empty() {
            return Err(MatchError::validation("Startup idea cannot be empty"));
        }

        let prompt = self.templates.render_tag_prompt(idea)?;
        let completion = self.completion.complete(&prompt).await.map_err(|e| match e {
            MatchError::Extraction(msg) => MatchError::Extraction(msg),
            other => MatchError::extraction(format!(
                "{} backend failed: {}",
                self.completion.name(),
                other
            )),
        })?;
        debug!("Tag extraction response: {} bytes", completion.len());

        let tags = parse_tags(&completion)?;
        debug!(
            domain = ?tags.domain,
            stage = %tags.stage,
            region = %tags.region,
            "Extracted tags"
        );
        Ok(tags)
    }
}
