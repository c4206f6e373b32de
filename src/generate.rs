//! Answer generation against retrieved context.
//!
//! Builds the strict-context prompt and invokes the generative model.
//! The prompt instructs the model to answer only from the supplied
//! context and to emit a fixed fallback sentence when the context is
//! insufficient; the model's own refusal is therefore ordinary answer
//! text, not an error.
//!
//! The only concrete backend is [`OllamaGenerator`] (`POST /api/generate`,
//! non-streaming). Same retry strategy as the embedding providers:
//! 429/5xx and network errors retry with exponential backoff, other 4xx
//! fail immediately.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;

/// Fallback sentence the model is told to emit for insufficient context.
pub const INSUFFICIENT_CONTEXT_SENTENCE: &str =
    "I cannot answer this based on the available information.";

/// Render the instruction template around a question and its retrieved
/// context block.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an assistant that answers strictly from the provided context.\n\
         If the context does not contain enough information, clearly say:\n\
         \"{}\"\n\n\
         Your response must be clear, friendly, and structured.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n\n\
         Answer:\n",
        INSUFFICIENT_CONTEXT_SENTENCE, context, question
    )
}

/// Trait for generative model backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"llama3"`).
    fn model_name(&self) -> &str;

    /// Complete a prompt synchronously, returning the model's trimmed
    /// output. An empty completion is a valid result; only transport and
    /// API failures are errors.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Instantiate the generator named by the configuration.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

/// Generator backed by a local Ollama instance.
///
/// Calls `POST /api/generate` with `stream: false` on the configured URL
/// (default: `http://localhost:11434`). Requires the model to be pulled
/// (e.g. `ollama pull llama3`).
pub struct OllamaGenerator {
    model: String,
    url: String,
    temperature: f64,
    client: reqwest::Client,
    max_retries: u32,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            temperature: config.temperature,
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(format!("{}/api/generate", self.url))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_ollama_completion(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Ollama API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

fn parse_ollama_completion(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("response")
        .and_then(|r| r.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_directive_context_and_question() {
        let prompt = build_prompt("What is parental leave?", "Leave policy text.");
        assert!(prompt.contains(INSUFFICIENT_CONTEXT_SENTENCE));
        assert!(prompt.contains("Context:\nLeave policy text."));
        assert!(prompt.contains("Question:\nWhat is parental leave?"));
        // Directive comes before the context block, context before the question.
        let ctx_pos = prompt.find("Context:").unwrap();
        let q_pos = prompt.find("Question:").unwrap();
        assert!(prompt.find(INSUFFICIENT_CONTEXT_SENTENCE).unwrap() < ctx_pos);
        assert!(ctx_pos < q_pos);
    }

    #[test]
    fn completion_output_is_trimmed() {
        let json = serde_json::json!({ "response": "  An answer.\n" });
        assert_eq!(parse_ollama_completion(&json).unwrap(), "An answer.");
    }

    #[test]
    fn missing_response_field_is_error() {
        let json = serde_json::json!({ "done": true });
        assert!(parse_ollama_completion(&json).is_err());
    }
}
