//! Telegram adapter: long-polling dispatcher and the [`ChatTransport`]
//! implementation on top of teloxide.

use std::sync::Arc;

use storebot_core::{ChatId, MessageId, UserId};
use teloxide::Bot;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::payloads::{SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::ResponseResult;
use teloxide::requests::Requester;
use teloxide::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message, Update,
};

use super::{ChatTransport, Event, EventKind, Keyboard, TransportError};
use crate::commerce::Commerce;
use crate::controller::Controller;
use crate::error;
use crate::store::StateStore;

impl From<teloxide::RequestError> for TransportError {
    fn from(err: teloxide::RequestError) -> Self {
        Self::Request(err.to_string())
    }
}

/// Sends screens through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

const fn tg_chat(chat: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat.get())
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.data.clone()))
            .collect::<Vec<_>>()
    }))
}

impl ChatTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut request = self.bot.send_message(tg_chat(chat), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }

        let sent = request.await?;
        Ok(MessageId::new(sent.id.0))
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let url = url::Url::parse(photo_url)
            .map_err(|e| TransportError::InvalidPayload(format!("photo url {photo_url:?}: {e}")))?;

        let mut request = self
            .bot
            .send_photo(tg_chat(chat), InputFile::url(url))
            .caption(caption);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }

        let sent = request.await?;
        Ok(MessageId::new(sent.id.0))
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        self.bot
            .delete_message(tg_chat(chat), teloxide::types::MessageId(message.get()))
            .await?;
        Ok(())
    }
}

// =============================================================================
// Inbound
// =============================================================================

/// Classify message text as a command or free text.
///
/// `/start@storebot now` is the command `start`.
#[must_use]
pub fn parse_text(text: &str) -> EventKind {
    let trimmed = text.trim();
    match trimmed.strip_prefix('/') {
        Some(command) if !command.is_empty() => {
            let name = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default();
            EventKind::Command(name.to_lowercase())
        }
        _ => EventKind::Text(text.to_string()),
    }
}

fn user_id(user: &teloxide::types::User) -> Option<UserId> {
    i64::try_from(user.id.0).ok().map(UserId::new)
}

fn message_event(msg: &Message) -> Option<Event> {
    let sender = msg.from.as_ref()?;
    let text = msg.text()?;

    Some(Event {
        user: user_id(sender)?,
        chat: ChatId::new(msg.chat.id.0),
        message: Some(MessageId::new(msg.id.0)),
        sender_name: msg
            .chat
            .first_name()
            .unwrap_or(&sender.first_name)
            .to_string(),
        kind: parse_text(text),
    })
}

fn callback_event(query: &CallbackQuery) -> Option<Event> {
    let data = query.data.clone()?;
    let message = query.message.as_ref()?;

    Some(Event {
        user: user_id(&query.from)?,
        chat: ChatId::new(message.chat().id.0),
        message: Some(MessageId::new(message.id().0)),
        sender_name: query.from.first_name.clone(),
        kind: EventKind::Button(data),
    })
}

type TelegramController<C, S> = Controller<C, TelegramTransport, S>;

async fn handle_event<C, S>(controller: &TelegramController<C, S>, event: &Event)
where
    C: Commerce,
    S: StateStore,
{
    if let Err(e) = controller.handle(event).await {
        error::report(&e, event);
    }
}

async fn on_message<C, S>(msg: Message, controller: Arc<TelegramController<C, S>>) -> ResponseResult<()>
where
    C: Commerce + 'static,
    S: StateStore + 'static,
{
    match message_event(&msg) {
        Some(event) => handle_event(&controller, &event).await,
        None => tracing::debug!(chat = msg.chat.id.0, "Ignoring non-text message"),
    }
    Ok(())
}

async fn on_callback<C, S>(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<TelegramController<C, S>>,
) -> ResponseResult<()>
where
    C: Commerce + 'static,
    S: StateStore + 'static,
{
    // Stops the client's loading spinner regardless of the outcome.
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        tracing::warn!(error = %e, "Failed to answer callback query");
    }

    match callback_event(&query) {
        Some(event) => handle_event(&controller, &event).await,
        None => tracing::debug!(query = %query.id, "Ignoring callback without data or message"),
    }
    Ok(())
}

/// Long-poll Telegram until Ctrl+C, feeding every update to the controller.
pub async fn run<C, S>(bot: Bot, controller: Arc<TelegramController<C, S>>)
where
    C: Commerce + 'static,
    S: StateStore + 'static,
{
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message::<C, S>))
        .branch(Update::filter_callback_query().endpoint(on_callback::<C, S>));

    tracing::info!("Telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Telegram dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Button;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_text("/start"), EventKind::Command("start".into()));
        assert_eq!(parse_text("/Start@storebot now"), EventKind::Command("start".into()));
        assert_eq!(parse_text("  /help "), EventKind::Command("help".into()));
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            parse_text("buyer@example.com"),
            EventKind::Text("buyer@example.com".into())
        );
        assert_eq!(parse_text("/"), EventKind::Text("/".into()));
    }

    #[test]
    fn test_markup_preserves_rows() {
        let keyboard = Keyboard::default()
            .row(vec![Button::new("1 kg", "add:p:1"), Button::new("5 kg", "add:p:5")])
            .button(Button::new("Menu", "menu"));

        let markup = markup(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Menu");
    }
}
