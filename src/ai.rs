use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use crate::calendar::format_range;
use crate::config::{AiConfig, Credentials};
use crate::image::ImageData;
use crate::models::{EntryKind, TaskEntry};

const DESCRIBE_PROMPT: &str = "You are a design expert. Analyze this UI/UX design screenshot and provide a brief, professional description (2-3 sentences) covering:
- What type of design/screen this is
- Key UI elements and layout
- Overall style and color scheme

Keep it concise and suitable for a design log entry. Do not use markdown formatting.";

const COMPARE_PROMPT: &str = "Compare these two design iterations. The first is the rough draft (V1) and the second is the final version. Briefly describe what changed and improved (2-3 sentences). Do not use markdown formatting.";

const CHANGELOG_CLOSING: &str = "\n\nNow write the weekly design changelog based on what you observed in these designs:";

const SHORT_MAX_TOKENS: u32 = 1024;
const TEXT_MAX_TOKENS: u32 = 2048;
const CHANGELOG_MAX_TOKENS: u32 = 3000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("API key not set")]
    NotConfigured,
    #[error("{0}")]
    RequestFailed(String),
}

/// One block of a multimodal user message.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(image: &ImageData) -> Self {
        ContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: image.media_type(),
                data: image.base64_payload().to_string(),
            },
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Serialize, Debug)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize, Debug)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the remote multimodal messages endpoint.
pub struct AiClient {
    client: Client,
    config: AiConfig,
    credentials: Credentials,
}

impl AiClient {
    pub fn new(config: AiConfig, credentials: Credentials) -> Self {
        AiClient {
            client: Client::new(),
            config,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    /// Short description of a single design screenshot.
    pub async fn describe_image(&self, image: &ImageData) -> Result<String, AiError> {
        let blocks = vec![ContentBlock::image(image), ContentBlock::text(DESCRIBE_PROMPT)];
        self.send(MessageContent::Blocks(blocks), SHORT_MAX_TOKENS).await
    }

    /// Short summary of what changed between a draft and its final version.
    pub async fn compare_images(&self, before: &ImageData, after: &ImageData) -> Result<String, AiError> {
        let blocks = vec![
            ContentBlock::text(COMPARE_PROMPT),
            ContentBlock::image(before),
            ContentBlock::image(after),
        ];
        self.send(MessageContent::Blocks(blocks), SHORT_MAX_TOKENS).await
    }

    /// Single-turn free-form completion.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        self.send(MessageContent::Text(prompt.to_string()), TEXT_MAX_TOKENS).await
    }

    /// Markdown changelog grounded in every entry's screenshots and notes.
    pub async fn generate_weekly_changelog(
        &self,
        tasks: &[&TaskEntry],
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<String, AiError> {
        let blocks = weekly_changelog_content(tasks, week_start, week_end);
        self.send(MessageContent::Blocks(blocks), CHANGELOG_MAX_TOKENS).await
    }

    async fn send(&self, content: MessageContent, max_tokens: u32) -> Result<String, AiError> {
        let api_key = self.credentials.get().ok_or(AiError::NotConfigured)?;
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            messages: vec![Message { role: "user", content }],
        };

        debug!("sending request to {} (model {}, max_tokens {})", self.config.api_url, self.config.model, max_tokens);
        let response = self.client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("AI request could not be sent: {}", e);
                AiError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        debug!("AI service answered {}", status);
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|env| env.error)
                .and_then(|body| body.message)
                .unwrap_or_else(|| "API request failed".to_string());
            warn!("AI request failed with {}: {}", status, message);
            return Err(AiError::RequestFailed(message));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AiError::RequestFailed(format!("failed to parse response: {}", e)))?;
        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| AiError::RequestFailed("response contained no text".to_string()))
    }
}

/// Builds the message blocks for the weekly changelog request.
pub fn weekly_changelog_content(
    tasks: &[&TaskEntry],
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(tasks.len() * 4 + 2);
    blocks.push(ContentBlock::text(format!(
        "You are a design team lead writing a professional weekly changelog. Analyze these design tasks and their screenshots from the week of {}.

I will show you each design entry with its screenshot(s). Please write a comprehensive, professional changelog in markdown format that:
1. Summarizes the week's design work with specific visual details you observe
2. Groups work into \"New Designs\" and \"Iterations\" sections
3. Describes each design based on what you actually see in the screenshots
4. Ends with a brief progress summary

Here are the design entries for this week:",
        format_range(week_start, week_end)
    )));

    for task in tasks {
        let kind = task.kind();
        let mut header = format!(
            "\n--- Entry: \"{}\" ({}) - {} ---",
            task.name,
            kind,
            task.date.format("%-m/%-d/%Y")
        );
        if task.has_notes() {
            header.push_str(&format!("\nDesigner notes: {}", task.notes));
        }
        blocks.push(ContentBlock::text(header));
        blocks.push(ContentBlock::image(&task.rough_image));
        if let Some(final_image) = &task.final_image {
            if kind == EntryKind::Iteration {
                blocks.push(ContentBlock::text("(Above: V1 Draft, Below: Final Version)"));
            }
            blocks.push(ContentBlock::image(final_image));
        }
    }

    blocks.push(ContentBlock::text(CHANGELOG_CLOSING));
    blocks
}
