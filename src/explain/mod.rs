//! Direct AI-provider calls for code explanations. Mirrors the content
//! fetches: blocking requests issued from a worker thread, errors captured
//! into the explanation sub-phase rather than propagated.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROK_CHAT_URL: &str = "https://api.x.ai/v1/chat/completions";

const SYSTEM_PROMPT: &str =
    "You are a helpful code explainer. Provide clear, accurate, concise explanations.";

#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("an API key is required for the selected provider")]
    MissingCredential,

    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl ExplainError {
    /// Whether re-triggering the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MissingCredential => false,
            Self::Provider(_) | Self::EmptyResponse | Self::Network(_) => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Grok,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Grok];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Grok => "grok",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::Grok => "Grok",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::Grok => "grok-2-latest",
        }
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "grok" => Ok(Self::Grok),
            other => Err(anyhow::anyhow!(
                "unknown provider `{other}`; expected gemini, openai, or grok"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplainMode {
    /// High-level summary of a whole file.
    File,
    /// Focused explanation of a selected span.
    Selection,
}

#[derive(Clone, Debug)]
pub struct ExplainRequest {
    pub code: String,
    pub mode: ExplainMode,
    pub provider: Provider,
    /// Empty string means the provider default.
    pub model: String,
    pub api_key: String,
}

impl ExplainRequest {
    pub fn model_name(&self) -> &str {
        let trimmed = self.model.trim();
        if trimmed.is_empty() {
            self.provider.default_model()
        } else {
            trimmed
        }
    }
}

pub fn build_prompt(mode: ExplainMode, code: &str) -> String {
    match mode {
        ExplainMode::Selection => format!(
            "Explain the following line(s) of code. Be concise and clear:\n\n```\n{code}\n```"
        ),
        ExplainMode::File => format!(
            "Provide a high-level summary of the following code file. What is its primary \
             purpose and responsibility? Explain it to a new developer on the team:\n\n```\n{code}\n```"
        ),
    }
}

pub fn request_explanation(http: &Client, request: &ExplainRequest) -> Result<String, ExplainError> {
    if request.api_key.trim().is_empty() {
        return Err(ExplainError::MissingCredential);
    }

    let prompt = build_prompt(request.mode, &request.code);
    debug!(provider = %request.provider, model = request.model_name(), "explanation request");

    let text = match request.provider {
        Provider::Gemini => gemini_explain(http, request, &prompt)?,
        Provider::OpenAi => chat_explain(http, request, &prompt, OPENAI_CHAT_URL, true)?,
        Provider::Grok => chat_explain(http, request, &prompt, GROK_CHAT_URL, false)?,
    };

    let text = text.trim();
    if text.is_empty() {
        Err(ExplainError::EmptyResponse)
    } else {
        Ok(text.to_owned())
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: [GeminiContent<'a>; 1],
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

fn gemini_explain(
    http: &Client,
    request: &ExplainRequest,
    prompt: &str,
) -> Result<String, ExplainError> {
    let url = format!(
        "{GEMINI_BASE_URL}/{}:generateContent?key={}",
        request.model_name(),
        request.api_key
    );
    let payload = GeminiRequest {
        contents: [GeminiContent {
            parts: [GeminiPart { text: prompt }],
        }],
    };

    let response = http.post(&url).json(&payload).send()?;
    if !response.status().is_success() {
        return Err(provider_failure(response));
    }

    let parsed: GeminiResponse = response.json()?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or(ExplainError::EmptyResponse)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

fn chat_explain(
    http: &Client,
    request: &ExplainRequest,
    prompt: &str,
    url: &str,
    with_temperature: bool,
) -> Result<String, ExplainError> {
    let payload = ChatRequest {
        model: request.model_name(),
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: with_temperature.then_some(0.2),
    };

    let response = http
        .post(url)
        .bearer_auth(&request.api_key)
        .json(&payload)
        .send()?;
    if !response.status().is_success() {
        return Err(provider_failure(response));
    }

    let parsed: ChatResponse = response.json()?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(ExplainError::EmptyResponse)
}

fn provider_failure(response: reqwest::blocking::Response) -> ExplainError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let detail = body.chars().take(300).collect::<String>();
    ExplainError::Provider(format!("HTTP {status}: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wording_differs_per_mode() {
        let file = build_prompt(ExplainMode::File, "let x = 1;");
        let selection = build_prompt(ExplainMode::Selection, "let x = 1;");

        assert!(file.contains("high-level summary"));
        assert!(selection.contains("line(s) of code"));
        assert!(file.contains("let x = 1;"));
        assert!(selection.contains("let x = 1;"));
    }

    #[test]
    fn empty_model_falls_back_to_provider_default() {
        let request = ExplainRequest {
            code: String::new(),
            mode: ExplainMode::File,
            provider: Provider::OpenAi,
            model: "  ".to_owned(),
            api_key: "k".to_owned(),
        };
        assert_eq!(request.model_name(), "gpt-4o-mini");

        let request = ExplainRequest {
            provider: Provider::Gemini,
            ..request
        };
        assert_eq!(request.model_name(), "gemini-2.0-flash");

        let request = ExplainRequest {
            model: "gpt-4.1".to_owned(),
            provider: Provider::OpenAi,
            ..request
        };
        assert_eq!(request.model_name(), "gpt-4.1");
    }

    #[test]
    fn missing_credential_fails_fast_without_network() {
        let request = ExplainRequest {
            code: "fn main() {}".to_owned(),
            mode: ExplainMode::File,
            provider: Provider::Gemini,
            model: String::new(),
            api_key: "   ".to_owned(),
        };
        let error = request_explanation(&Client::new(), &request).unwrap_err();
        assert!(matches!(error, ExplainError::MissingCredential));
        assert!(!error.is_retryable());
    }

    #[test]
    fn provider_parsing_round_trips() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn gemini_response_shape_parses() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"It prints."}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "It prints.");
    }

    #[test]
    fn chat_response_shape_parses() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"A parser."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "A parser.");
    }
}
