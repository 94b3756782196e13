use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use lifeguide_types::models::{AiResponse, Mode, ReportType, ResponseMetadata, Urgency};

use crate::error::AssistantError;
use crate::prompts::{self, REPORT_TEMPERATURE};
use crate::{GeneratedReport, ReportContext};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion in JSON mode and parse the message body.
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<Value, AssistantError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                CompletionMessage { role: "system", content: system },
                CompletionMessage { role: "user", content: user },
            ],
            response_format: ResponseFormat { format_type: "json_object" },
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AssistantError::EmptyCompletion)?;

        debug!("Completion returned {} bytes", content.len());
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn chat(
        &self,
        mode: Mode,
        message: &str,
        context: &[String],
    ) -> Result<AiResponse, AssistantError> {
        let system = prompts::system_prompt(mode, context);
        let result = self
            .complete_json(&system, message, prompts::persona(mode).temperature)
            .await?;
        Ok(parse_chat_result(mode, &result))
    }

    pub async fn report(
        &self,
        report_type: ReportType,
        context: &ReportContext,
    ) -> Result<GeneratedReport, AssistantError> {
        let user_data = serde_json::to_value(context)?;
        let system = prompts::report_prompt(report_type, &user_data);
        let user = format!("Generate a {report_type} report for this user.");
        let result = self.complete_json(&system, &user, REPORT_TEMPERATURE).await?;
        Ok(parse_report_result(report_type, &result))
    }
}

/// Fill an `AiResponse` from the model's JSON, defaulting missing fields.
/// Only the dual persona may pick its own mode.
pub(crate) fn parse_chat_result(mode: Mode, result: &Value) -> AiResponse {
    let content = result
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(prompts::persona(mode).default_content)
        .to_string();

    let confidence = result
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| *c > 0.0)
        .map(|c| c.min(1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let suggestions = result
        .get("suggestions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let urgency = result
        .get("urgency")
        .and_then(Value::as_str)
        .and_then(Urgency::parse)
        .unwrap_or_default();

    let mode = match mode {
        Mode::Dual => result
            .get("mode")
            .and_then(Value::as_str)
            .and_then(Mode::parse)
            .unwrap_or(Mode::Dual),
        fixed => fixed,
    };

    AiResponse {
        content,
        metadata: ResponseMetadata {
            mode,
            confidence,
            suggestions: Some(suggestions),
            urgency,
        },
    }
}

pub(crate) fn parse_report_result(report_type: ReportType, result: &Value) -> GeneratedReport {
    let title = result
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Analysis Report", report_type.label()));

    let content = result
        .get("content")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| {
            serde_json::json!({ "summary": "Report generation in progress. Please try again." })
        });

    GeneratedReport { title, content }
}
