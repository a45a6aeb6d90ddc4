pub mod callback;
pub mod general_message;
pub mod message;

use std::sync::Arc;

use teloxide::{
    dispatching::{dialogue, UpdateHandler},
    prelude::*,
};

use crate::bot::state::{BookingDialogue, BookingState, BookingStorage};
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::booking::BookingLifecycle;
use crate::services::catalog::Catalog;
use crate::services::clock::Clock;
use crate::services::discount::DiscountOverlay;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

/// Everything a handler needs, cloned into each update.
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseManager,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub catalog: Catalog,
    pub bookings: BookingLifecycle,
    pub discounts: DiscountOverlay,
}

impl AppContext {
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.config.is_admin(user_id)
    }
}

pub struct BotHandler {
    pub ctx: AppContext,
}

impl BotHandler {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn schema(&self) -> UpdateHandler<HandlerError> {
        use teloxide::dispatching::UpdateFilterExt;

        let ctx_command = self.ctx.clone();
        let ctx_callback = self.ctx.clone();

        dialogue::enter::<Update, BookingStorage, BookingState, _>()
            .branch(
                Update::filter_message()
                    .filter_command::<crate::bot::commands::Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: crate::bot::commands::Command, dialogue: BookingDialogue| {
                        let ctx = ctx_command.clone();
                        async move { message::command_handler(bot, msg, cmd, dialogue, ctx).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(|bot: Bot, msg: Message| async move {
                general_message::handle_general_message(bot, msg).await
            }))
            .branch(Update::filter_callback_query().endpoint(
                move |bot: Bot, q: CallbackQuery, dialogue: BookingDialogue| {
                    let ctx = ctx_callback.clone();
                    async move { callback::callback_handler(bot, q, dialogue, ctx).await }
                },
            ))
    }
}
