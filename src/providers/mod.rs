//! Provider subsystem for model inference backends.
//!
//! Each provider implements the [`Provider`] trait defined in [`traits`] and
//! is registered in the factory function [`create_provider`] by its canonical
//! string key. The search assistant drives providers with deterministic
//! sampling (temperature 0) and a capped output length.

pub mod openai;
pub mod traits;

pub use openai::OpenAiProvider;
pub use traits::{
    ChatMessage, ChatRequest, ChatResponse, GenerationError, Provider, ToolInvocation,
};

use crate::config::Config;
use std::sync::Arc;

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Scrub known secret-like token prefixes from provider error strings.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 2] = ["sk-", "sk-proj-"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        loop {
            let Some(rel) = scrubbed[search_from..].find(prefix) else {
                break;
            };

            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Resolve the API key from config and environment variables. Shared by the
/// provider and embedder factories so both authenticate from the same source.
pub(crate) fn resolve_credential(config: &Config) -> Option<String> {
    if let Some(key) = config.api_key.as_deref() {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_owned());
        }
    }

    for env_var in ["LECTERN_API_KEY", "OPENAI_API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Factory: create the configured provider.
pub fn create_provider(config: &Config) -> anyhow::Result<Arc<dyn Provider>> {
    let key = resolve_credential(config);
    let name = config.provider.as_deref().unwrap_or("openai");

    match name {
        "openai" => Ok(Arc::new(OpenAiProvider::with_base_url(
            config.api_url.as_deref(),
            key.as_deref(),
        ))),
        _ => anyhow::bail!("Unknown provider: {name}. Only \"openai\" is currently supported."),
    }
}
