use async_trait::async_trait;
use rig::completion::Prompt;
use rig::{agent::Agent, client::CompletionClient, providers::openrouter};
use tracing::info;

use crate::models::AnalysisResult;

/// Default OpenRouter model for summarization and keyword extraction.
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Remote analysis capability: text in, summary and keywords out.
///
/// Failures are unclassified; whatever message the transport or parser
/// produces travels up as-is.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, text: &str) -> anyhow::Result<AnalysisResult>;
}

/// rig-core backed client calling OpenRouter chat completions.
pub struct RigAnalysisClient {
    model: String,
}

impl RigAnalysisClient {
    pub fn new() -> Self {
        Self {
            model: std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}

impl Default for RigAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

fn get_llm_agent(model: &str, preamble: &str) -> anyhow::Result<Agent<openrouter::CompletionModel>> {
    let api_key = std::env::var("OPENROUTER_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
    let client = openrouter::Client::new(&api_key);
    Ok(client.agent(model).preamble(preamble).build())
}

#[async_trait]
impl AnalysisClient for RigAnalysisClient {
    async fn analyze(&self, text: &str) -> anyhow::Result<AnalysisResult> {
        let prompt = format!(
            r#"Analyze the following text and produce a concise summary and its key terms.

Requirements:
- Write the summary in the same language as the text itself.
- Return between 3 and 8 keywords, most important first.
- Return ONLY a JSON object of this exact shape, nothing else:
  {{"summary": "...", "keywords": ["...", "..."]}}

Text:
{}

JSON object only:"#,
            text
        );

        let agent = get_llm_agent(
            &self.model,
            "You are a text analysis assistant producing concise summaries and keywords.",
        )?;
        let response = agent.prompt(prompt.as_str()).await?;

        info!(model = %self.model, chars = response.len(), "analysis response received");

        parse_analysis_response(&response)
    }
}

/// Extract the outermost JSON object from the model response. Models wrap
/// JSON in prose or code fences often enough that strict parsing alone is
/// not reliable.
fn parse_analysis_response(response: &str) -> anyhow::Result<AnalysisResult> {
    if let Some(start) = response.find('{') {
        let end = response
            .rfind('}')
            .ok_or_else(|| anyhow::anyhow!("No closing brace in analysis response"))?;
        serde_json::from_str::<AnalysisResult>(&response[start..=end])
            .map_err(|e| anyhow::anyhow!("Failed to parse extracted JSON: {}", e))
    } else {
        serde_json::from_str::<AnalysisResult>(response)
            .map_err(|e| anyhow::anyhow!("Failed to parse response as JSON: {}", e))
    }
}
