use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::links::{extract_link, InboundMessage, SenderId};
use crate::llm::{LlmProvider, SummarizerError};
use crate::preferences::PreferenceStore;
use crate::prompt::{build_prompt, Language};
use crate::scraping::ArticleSource;

/// Articles shorter than this many characters are not worth summarizing.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = common::MIN_CONTENT_CHARS;

pub const UNAUTHORIZED_TEXT: &str = "❌ You are not authorized to use this bot.";
pub const NO_CAPTION_TEXT: &str = "❌ Please send a message with a caption containing a link.";
pub const NO_LINK_TEXT: &str = "❌ Couldn't detect a link.";
pub const FETCHING_TEXT: &str = "🔍 Fetching article...";
pub const UNEXTRACTABLE_TEXT: &str = "⚠️ Couldn't extract meaningful article content.";
pub const WELCOME_TEXT: &str = "👋 Welcome! Send me an article (image + caption + link).\nChoose language:";

/// How the transport should render a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Plain,
    /// Model output using simple Markdown emphasis.
    Markdown,
    /// Plain text offered together with a one-time language keyboard.
    LanguageChoice,
}

/// Text sent back to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Markdown,
        }
    }

    pub fn language_choice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::LanguageChoice,
        }
    }
}

/// Outbound port towards the chat transport: "send this text to this sender".
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, reply: Reply) -> anyhow::Result<()>;
}

/// Progress of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingLink,
    LinkFound,
    ArticleFetched,
    PromptBuilt,
    Summarized,
}

/// Terminal failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error("sender is not authorized")]
    Unauthorized,

    #[error("message has no caption")]
    NoCaption,

    #[error("no link detected in caption")]
    NoLinkDetected,

    #[error("no meaningful content extracted from {url}")]
    ArticleUnextractable { url: String },

    #[error("summarization failed: {0}")]
    SummarizationFailed(#[from] SummarizerError),
}

impl PipelineFailure {
    /// Text shown to the sender. LLM failures include their detail for the operator.
    pub fn user_message(&self) -> String {
        match self {
            PipelineFailure::Unauthorized => UNAUTHORIZED_TEXT.to_string(),
            PipelineFailure::NoCaption => NO_CAPTION_TEXT.to_string(),
            PipelineFailure::NoLinkDetected => NO_LINK_TEXT.to_string(),
            PipelineFailure::ArticleUnextractable { .. } => UNEXTRACTABLE_TEXT.to_string(),
            PipelineFailure::SummarizationFailed(e) => format!("⚠️ LLM error: {}", e),
        }
    }
}

/// Article text accepted into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    pub source_url: String,
    pub body_text: String,
}

/// Successful pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: String,
    pub language: Language,
}

/// Authorize, extract, fetch, summarize, reply.
pub struct Pipeline {
    authorized: HashSet<SenderId>,
    preferences: Arc<PreferenceStore>,
    articles: Arc<dyn ArticleSource>,
    llm: Arc<dyn LlmProvider>,
    min_content_chars: usize,
}

impl Pipeline {
    pub fn new(
        authorized: HashSet<SenderId>,
        preferences: Arc<PreferenceStore>,
        articles: Arc<dyn ArticleSource>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            authorized,
            preferences,
            articles,
            llm,
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
        }
    }

    /// Raise the content threshold. Values below `DEFAULT_MIN_CONTENT_CHARS` are clamped up to it.
    pub fn with_min_content_chars(mut self, min_content_chars: usize) -> Self {
        if min_content_chars < DEFAULT_MIN_CONTENT_CHARS {
            warn!(
                requested = min_content_chars,
                min = DEFAULT_MIN_CONTENT_CHARS,
                "content threshold below the floor, clamping"
            );
        }
        self.min_content_chars = min_content_chars.max(DEFAULT_MIN_CONTENT_CHARS);
        self
    }

    pub fn is_authorized(&self, sender: SenderId) -> bool {
        self.authorized.contains(&sender)
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// `/start`: greet an authorized sender and offer the language choice.
    pub async fn handle_start(&self, sender: SenderId, responder: &dyn Responder) -> anyhow::Result<()> {
        if !self.is_authorized(sender) {
            info!(sender_id = sender, "start from unauthorized sender");
            return responder.reply(Reply::plain(UNAUTHORIZED_TEXT)).await;
        }
        responder.reply(Reply::language_choice(WELCOME_TEXT)).await
    }

    /// Store the sender's language selection.
    pub async fn handle_language(
        &self,
        sender: SenderId,
        text: &str,
        responder: &dyn Responder,
    ) -> anyhow::Result<()> {
        if !self.is_authorized(sender) {
            info!(sender_id = sender, "language selection from unauthorized sender");
            return responder.reply(Reply::plain(UNAUTHORIZED_TEXT)).await;
        }

        match Language::from_tag(text) {
            Some(language) => {
                self.preferences.set_language(sender, language);
                info!(sender_id = sender, language = language.tag(), "language preference updated");
                responder
                    .reply(Reply::plain(format!("🌐 Language set to: {}", language)))
                    .await
            }
            None => {
                let names: Vec<&str> = Language::ALL.iter().map(|l| l.display_name()).collect();
                responder
                    .reply(Reply::language_choice(format!(
                        "🌐 Supported languages: {}",
                        names.join(", ")
                    )))
                    .await
            }
        }
    }

    /// Summarize the article linked from `message` and send exactly one reply.
    ///
    /// The only other message is the fetching acknowledgment sent once a link was found.
    pub async fn handle_article(
        &self,
        message: &InboundMessage,
        responder: &dyn Responder,
    ) -> anyhow::Result<()> {
        let reply = match self.run(message, responder).await {
            Ok(summary) => Reply::markdown(summary.text),
            Err(failure) => {
                match &failure {
                    PipelineFailure::SummarizationFailed(e) => {
                        error!(sender_id = message.sender_id, error = %e, "LLM summarization failed");
                    }
                    other => {
                        warn!(sender_id = message.sender_id, reason = %other, "pipeline stopped");
                    }
                }
                Reply::plain(failure.user_message())
            }
        };
        responder.reply(reply).await
    }

    /// Run the pipeline to its terminal state without sending the final reply.
    pub async fn run(
        &self,
        message: &InboundMessage,
        responder: &dyn Responder,
    ) -> Result<SummaryResult, PipelineFailure> {
        let sender = message.sender_id;
        if !self.is_authorized(sender) {
            return Err(PipelineFailure::Unauthorized);
        }

        let caption = message.caption().ok_or(PipelineFailure::NoCaption)?;
        debug!(sender_id = sender, stage = ?Stage::AwaitingLink, "scanning caption for a link");

        let url = extract_link(Some(caption), &message.entities).ok_or(PipelineFailure::NoLinkDetected)?;
        debug!(sender_id = sender, stage = ?Stage::LinkFound, %url, "link extracted");

        if let Err(e) = responder.reply(Reply::plain(FETCHING_TEXT)).await {
            warn!(sender_id = sender, error = %e, "failed to send fetching acknowledgment");
        }

        let article = self.fetch(&url).await?;
        debug!(
            sender_id = sender,
            stage = ?Stage::ArticleFetched,
            url = %article.source_url,
            chars = article.body_text.chars().count(),
            "article fetched"
        );

        let language = self.preferences.language(sender);
        let prompt = build_prompt(&article.body_text, language);
        debug!(sender_id = sender, stage = ?Stage::PromptBuilt, language = language.tag(), "prompt built");

        let text = self.llm.summarize(&prompt).await?;
        info!(sender_id = sender, stage = ?Stage::Summarized, %url, chars = text.chars().count(), "article summarized");

        Ok(SummaryResult { text, language })
    }

    async fn fetch(&self, url: &str) -> Result<ArticleContent, PipelineFailure> {
        let unextractable = || PipelineFailure::ArticleUnextractable {
            url: url.to_string(),
        };

        let body_text = self.articles.fetch_article(url).await.ok_or_else(unextractable)?;
        let chars = body_text.chars().count();
        if chars < self.min_content_chars {
            debug!(%url, chars, min = self.min_content_chars, "article below content threshold");
            return Err(unextractable());
        }

        Ok(ArticleContent {
            source_url: url.to_string(),
            body_text,
        })
    }
}
