mod capture;
mod outbound;

pub use capture::payload_from_message;
pub use outbound::{TelegramMembershipGate, TelegramTransport};

use crate::core::service_manager::{Error as ServiceManagerError, Service};
use crate::configuration::Context;
use crate::directory::UserDirectory;
use crate::engine::{CallbackAction, Command, ConversationEngine, Event, Inbound, Keyboard, Reply};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{ChatJoinRequest, MessageId};
use tracing::{debug, info, warn};

pub struct TelegramService {
    bot: Bot,
    context: Arc<Context>,
    engine: Arc<ConversationEngine>,
}

#[async_trait]
impl Service for TelegramService {
    type Context = Context;

    async fn new(context: Context) -> Self {
        let bot = Bot::new(context.config.bot_token.clone());
        let directory = UserDirectory::open(&context.config.database_path)
            .expect("failed to open the user directory");
        let gate = Arc::new(TelegramMembershipGate::new(
            bot.clone(),
            context.config.channels.clone(),
        ));
        let transport = Arc::new(TelegramTransport::new(bot.clone()));
        let engine = Arc::new(ConversationEngine::new(
            context.clone(),
            Arc::new(directory),
            gate,
            transport,
        ));

        Self {
            bot,
            context: Arc::new(context),
            engine,
        }
    }

    async fn run(self) -> Result<(), ServiceManagerError> {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback))
            .branch(Update::filter_chat_join_request().endpoint(on_join_request));

        info!("bot started polling");
        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.engine, self.context])
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        Ok(())
    }
}

async fn on_message(
    bot: Bot,
    msg: Message,
    engine: Arc<ConversationEngine>,
) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    let event = match command_of(&msg) {
        Some(command) => Event::Command(command),
        None => Event::Message(capture::payload_from_message(&msg)),
    };
    let inbound = Inbound {
        user_id: from.id.0 as i64,
        chat_id: msg.chat.id.0,
        full_name: Some(from.full_name()),
        event,
    };

    let replies = engine.handle(inbound).await;
    deliver_replies(&bot, msg.chat.id, None, replies).await
}

async fn on_callback(
    bot: Bot,
    q: CallbackQuery,
    engine: Arc<ConversationEngine>,
) -> ResponseResult<()> {
    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        debug!(user_id = q.from.id.0, "unknown callback token");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let Some(message) = q.message else {
        // The attached message is too old for the platform to reference.
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let inbound = Inbound {
        user_id: q.from.id.0 as i64,
        chat_id: message.chat.id.0,
        full_name: Some(q.from.full_name()),
        event: Event::Action(action),
    };
    let mut replies = engine.handle(inbound).await;

    // The callback is always answered; an alert reply rides on the answer.
    match replies
        .iter()
        .position(|reply| matches!(reply, Reply::Alert { .. }))
    {
        Some(idx) => {
            if let Reply::Alert { text, show_alert } = replies.remove(idx) {
                bot.answer_callback_query(q.id)
                    .text(text)
                    .show_alert(show_alert)
                    .await?;
            }
        }
        None => {
            bot.answer_callback_query(q.id).await?;
        }
    }

    deliver_replies(&bot, message.chat.id, Some(message.id), replies).await
}

async fn on_join_request(
    bot: Bot,
    request: ChatJoinRequest,
    engine: Arc<ConversationEngine>,
    context: Arc<Context>,
) -> ResponseResult<()> {
    let user_id = request.from.id.0 as i64;
    if !context.config.features.auto_approve_channel_join {
        debug!(user_id, "join request left for manual review");
        return Ok(());
    }

    match bot
        .approve_chat_join_request(request.chat.id, request.from.id)
        .await
    {
        Ok(_) => {
            info!(user_id, chat_id = request.chat.id.0, "join request approved");
            engine
                .record_channel_join(user_id, Some(request.from.full_name()))
                .await;
            // Best effort: the approval and directory write stand either way.
            if let Err(e) = bot.send_message(ChatId(user_id), engine.welcome_text()).await {
                warn!(user_id, error = %e, "welcome message failed");
            }
        }
        Err(e) => warn!(user_id, error = %e, "failed to approve join request"),
    }
    Ok(())
}

fn command_of(msg: &Message) -> Option<Command> {
    let text = msg.text()?;
    let first = text.split_whitespace().next()?;
    match first.split('@').next()? {
        "/start" => Some(Command::Start),
        "/cancel" => Some(Command::Cancel),
        _ => None,
    }
}

async fn deliver_replies(
    bot: &Bot,
    chat_id: ChatId,
    edit_target: Option<MessageId>,
    replies: Vec<Reply>,
) -> ResponseResult<()> {
    for reply in replies {
        match reply {
            Reply::Message { text, keyboard } => {
                send_message(bot, chat_id, text, keyboard).await?;
            }
            Reply::Edit { text, keyboard } => match edit_target {
                Some(message_id) => {
                    let mut req = bot.edit_message_text(chat_id, message_id, text);
                    if let Some(Keyboard::Inline(rows)) = &keyboard {
                        req = req.reply_markup(outbound::render_inline(rows));
                    }
                    req.await?;
                }
                // Nothing to edit; fall back to a fresh send.
                None => send_message(bot, chat_id, text, keyboard).await?,
            },
            Reply::Alert { text, .. } => {
                // Outside a callback there is no query to attach the alert to.
                bot.send_message(chat_id, text).await?;
            }
        }
    }
    Ok(())
}

async fn send_message(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    keyboard: Option<Keyboard>,
) -> ResponseResult<()> {
    let mut req = bot.send_message(chat_id, text);
    if let Some(keyboard) = keyboard {
        req = req.reply_markup(outbound::render_keyboard(&keyboard));
    }
    req.await?;
    Ok(())
}
