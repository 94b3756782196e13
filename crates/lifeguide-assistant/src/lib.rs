pub mod demo;
pub mod error;
pub mod openai;
pub mod prompts;

use serde::Serialize;
use tracing::{error, info};

use lifeguide_types::models::{
    AiResponse, Conversation, Mode, ReportType, ResponseMetadata, Urgency, UserProfile,
};

pub use demo::DemoResponder;
pub use error::AssistantError;
pub use openai::OpenAiClient;

/// How many recent conversations feed a report.
pub const REPORT_CONVERSATION_LIMIT: usize = 10;

/// User data a report is generated from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub profile: Option<UserProfile>,
    pub conversations: Vec<Conversation>,
}

impl ReportContext {
    /// Keeps only the most recent conversations.
    pub fn new(profile: Option<UserProfile>, mut conversations: Vec<Conversation>) -> Self {
        let skip = conversations.len().saturating_sub(REPORT_CONVERSATION_LIMIT);
        conversations.drain(..skip);
        Self {
            profile,
            conversations,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub title: String,
    pub content: serde_json::Value,
}

/// Response generator selected at start-up.
pub enum Assistant {
    OpenAi(OpenAiClient),
    Demo(DemoResponder),
}

impl Assistant {
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }

    /// Answer `message` in the persona for `mode`. Never fails: upstream
    /// errors are logged and turned into an apology with zero confidence.
    pub async fn respond(&self, mode: Mode, message: &str, context: &[String]) -> AiResponse {
        match self {
            Self::Demo(demo) => demo.respond(message, mode),
            Self::OpenAi(client) => match client.chat(mode, message, context).await {
                Ok(response) => response,
                Err(e) => {
                    error!("{} completion failed: {}", mode, e);
                    fallback_response(mode)
                }
            },
        }
    }

    pub async fn generate_report(
        &self,
        report_type: ReportType,
        context: &ReportContext,
    ) -> GeneratedReport {
        info!(
            "Generating {} report from {} conversations",
            report_type,
            context.conversations.len()
        );
        match self {
            Self::Demo(demo) => demo.report(report_type, context),
            Self::OpenAi(client) => match client.report(report_type, context).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Report generation failed: {}", e);
                    GeneratedReport {
                        title: "Report Generation Error".into(),
                        content: serde_json::json!({
                            "error": "Unable to generate report at this time. Please try again later."
                        }),
                    }
                }
            },
        }
    }
}

pub fn fallback_response(mode: Mode) -> AiResponse {
    AiResponse {
        content: prompts::persona(mode).apology.to_string(),
        metadata: ResponseMetadata {
            mode,
            confidence: 0.0,
            suggestions: None,
            urgency: Urgency::Low,
        },
    }
}
