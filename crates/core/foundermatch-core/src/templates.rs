//! Prompt templates

use crate::{MatchError, Result};
use handlebars::Handlebars;
use serde_json::json;

/// Instruction sent to the language model for tag extraction
pub const TAG_EXTRACTION_TEMPLATE: &str = r#"
You are an expert startup analyst.

Extract the following tags from the startup idea below:
1. Domain (e.g., AI, Fintech, SaaS, HealthTech, etc.)
2. Stage (Pre-Seed, Seed, Series A, Series B, Growth)
3. Region (e.g., India, USA, Europe, Global)

Startup Idea:
"""{{idea}}"""

Respond only with JSON:
{
  "domain": [...],
  "stage": "...",
  "region": "..."
}
"#;

const TAG_EXTRACTION: &str = "tag_extraction";

/// Handlebars wrapper holding the registered prompt templates
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// Create an engine with the built-in templates registered
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Prompts are plain text; a missing variable is a bug, not an empty string
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string(TAG_EXTRACTION, TAG_EXTRACTION_TEMPLATE)
            .map_err(|e| MatchError::configuration(format!("Invalid prompt template: {}", e)))?;

        Ok(Self { handlebars })
    }

    /// Fill the tag-extraction template with the idea text, verbatim
    pub fn render_tag_prompt(&self, idea: &str) -> Result<String> {
        self.handlebars
            .render(TAG_EXTRACTION, &json!({ "idea": idea }))
            .map_err(|e| MatchError::extraction(format!("Failed to render prompt: {}", e)))
    }
}
