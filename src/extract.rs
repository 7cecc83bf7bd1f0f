//! Structured Command Extraction
//!
//! Asks the generation backend to express a free-text command as JSON and
//! parses the reply into a typed structure. An unusable reply is a typed
//! absence (`Ok(None)`), not an exception; only transport failures after
//! retries surface as errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use switchboard_llm::{GenerationOptions, LlmResult, TextGenerator};

/// First `{...}` block in a model reply; models often wrap JSON in prose.
static JSON_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("json block pattern"));

/// A command decomposed into action, target, and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Locate the first JSON object in `text` and deserialize it.
///
/// Returns `None` when no block is found or the block does not match `T`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let block = JSON_BLOCK_RE.find(text)?;
    match serde_json::from_str(block.as_str()) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!("model output contained no usable JSON object: {}", err);
            None
        }
    }
}

/// Parse a free-text command into a `ParsedCommand` via the generation
/// backend.
pub async fn parse_command(
    generator: &dyn TextGenerator,
    text: &str,
) -> LlmResult<Option<ParsedCommand>> {
    let prompt = format!(
        "Parse the following command and extract:\n\
         1. The main action (verb)\n\
         2. The target/object\n\
         3. Any parameters or options\n\n\
         Reply in JSON format with keys: action, target, parameters\n\n\
         Command: {text}\n\nJSON:"
    );

    let reply = generator
        .generate(&prompt, None, &GenerationOptions::deterministic(200))
        .await?;
    Ok(extract_json(&reply))
}
