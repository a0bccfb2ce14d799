use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{
    KeyboardButton, KeyboardMarkup, Me, MessageEntity, MessageEntityKind, ParseMode, UserId,
};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::links::{EntityKind, InboundMessage, RichEntity, SenderId};
use crate::pipeline::{Pipeline, Reply, ReplyFormat, Responder};
use crate::prompt::Language;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and choose a summary language")]
    Start,
    #[command(description = "Show this help message")]
    Help,
}

/// Which entry point an incoming message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Start,
    Language(&'a str),
    Article,
}

/// Route on the message text: commands, then language names, everything else is an article.
/// Captioned media has no text and always lands on `Article`.
pub fn route<'a>(text: Option<&'a str>, bot_username: &str) -> Route<'a> {
    match text {
        Some(text) if Command::parse(text, bot_username).is_ok() => Route::Start,
        Some(text) if Language::from_tag(text).is_some() => Route::Language(text),
        _ => Route::Article,
    }
}

/// Replies to one chat through the Bot API.
pub struct TelegramResponder {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramResponder {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait::async_trait]
impl Responder for TelegramResponder {
    async fn reply(&self, reply: Reply) -> anyhow::Result<()> {
        match reply.format {
            ReplyFormat::Plain => {
                self.bot.send_message(self.chat_id, reply.text).await?;
            }
            ReplyFormat::LanguageChoice => {
                self.bot
                    .send_message(self.chat_id, reply.text)
                    .reply_markup(language_keyboard())
                    .await?;
            }
            // Summaries use legacy `**bold**` emphasis, which MarkdownV2 would reject unescaped
            #[allow(deprecated)]
            ReplyFormat::Markdown => {
                let sent = self
                    .bot
                    .send_message(self.chat_id, &reply.text)
                    .parse_mode(ParseMode::Markdown)
                    .await;
                if let Err(error) = sent {
                    // Model output is not always valid Telegram Markdown
                    warn!(%error, chat_id = ?self.chat_id, "markdown reply rejected, resending as plain text");
                    self.bot.send_message(self.chat_id, reply.text).await?;
                }
            }
        }
        Ok(())
    }
}

fn language_keyboard() -> KeyboardMarkup {
    let row: Vec<KeyboardButton> = Language::ALL
        .iter()
        .map(|lang| KeyboardButton::new(lang.display_name()))
        .collect();
    KeyboardMarkup::new(vec![row]).one_time_keyboard()
}

/// Map a Bot API entity onto the transport-neutral form.
pub fn convert_entity(entity: &MessageEntity) -> RichEntity {
    let kind = match &entity.kind {
        MessageEntityKind::TextLink { url } => EntityKind::ExplicitLink {
            target: url.to_string(),
        },
        MessageEntityKind::Url => EntityKind::PlainUrl,
        _ => EntityKind::Other,
    };
    RichEntity::new(kind, entity.offset, entity.length)
}

fn inbound_message(msg: &Message, sender_id: SenderId) -> InboundMessage {
    let entities = msg
        .caption_entities()
        .map(|entities| entities.iter().map(convert_entity).collect())
        .unwrap_or_default();
    InboundMessage::new(sender_id, msg.caption().map(str::to_string)).with_entities(entities)
}

/// Sender of an update, `None` for anonymous senders such as channel posts.
fn resolve_sender(from: Option<UserId>, chat_id: ChatId) -> Option<SenderId> {
    match from {
        Some(user_id) => Some(user_id.0 as SenderId),
        None => {
            debug!(chat_id = ?chat_id, "message without sender ignored");
            None
        }
    }
}

pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    me: Me,
    pipeline: Arc<Pipeline>,
) -> ResponseResult<()> {
    let Some(sender_id) = resolve_sender(msg.from.as_ref().map(|user| user.id), msg.chat.id) else {
        return Ok(());
    };

    let responder = TelegramResponder::new(bot, msg.chat.id);

    let result = match route(msg.text(), me.username()) {
        Route::Start => pipeline.handle_start(sender_id, &responder).await,
        Route::Language(text) => pipeline.handle_language(sender_id, text, &responder).await,
        Route::Article => {
            let inbound = inbound_message(&msg, sender_id);
            pipeline.handle_article(&inbound, &responder).await
        }
    };

    if let Err(error) = result {
        error!(%sender_id, error = %format!("{:#}", error), "failed to deliver reply");
    }

    Ok(())
}

/// Long-polling Telegram front end for the pipeline.
pub struct TelegramBot {
    bot: Bot,
    pipeline: Arc<Pipeline>,
}

impl TelegramBot {
    pub fn new(token: &str, pipeline: Arc<Pipeline>) -> Self {
        Self {
            bot: Bot::new(token),
            pipeline,
        }
    }

    pub async fn run(self) -> Result<(), teloxide::RequestError> {
        info!("Starting Telegram bot...");

        self.bot.set_my_commands(Command::bot_commands()).await?;

        let handler = Update::filter_message().endpoint(handle_message);

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.pipeline])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram bot stopped");
        Ok(())
    }
}
