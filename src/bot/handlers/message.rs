use teloxide::prelude::*;

use crate::bot::commands::{admin, booking, stats, Command, Screen};
use crate::bot::handlers::{AppContext, HandlerResult};
use crate::bot::state::BookingDialogue;
use crate::error::BookingError;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{
    log_access_denied, log_command_error, log_command_start, log_command_success,
    log_validation_error, Actor,
};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: BookingDialogue,
    ctx: AppContext,
) -> HandlerResult {
    let actor = Actor::from_message(&msg);
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);
    log_command_start(cmd.name(), &actor, cmd.args());

    if cmd.requires_admin() && !ctx.is_admin(actor.user_id) {
        log_access_denied(cmd.name(), &actor);
        feedback.booking_error(&BookingError::Forbidden).await?;
        return Ok(());
    }

    let is_admin = ctx.is_admin(actor.user_id);
    let outcome: Result<Screen, BookingError> = match &cmd {
        Command::Start => {
            dialogue.reset().await?;
            match msg.from() {
                Some(user) => booking::register_user(&ctx, user)
                    .await
                    .map(|user| booking::welcome(&user.first_name, is_admin)),
                None => Ok(booking::welcome("there", is_admin)),
            }
        }
        Command::Help => Ok(booking::help(is_admin)),
        Command::Book => {
            dialogue.reset().await?;
            match msg.from() {
                Some(user) => match booking::register_user(&ctx, user).await {
                    Ok(_) => booking::services(&ctx).await,
                    Err(e) => Err(e),
                },
                None => Err(BookingError::NotFound("user".to_string())),
            }
        }
        Command::MyBookings => booking::my_bookings(&ctx, actor.user_id).await,
        Command::Cancel => booking::cancel_menu(&ctx, actor.user_id).await,
        Command::Admin => Ok(admin::panel()),
        Command::Bookings(args) => admin::bookings(&ctx, args).await,
        Command::Stats => {
            stats::handle_stats(bot, msg.chat.id, &ctx).await?;
            log_command_success(cmd.name(), &actor, None);
            return Ok(());
        }
        Command::AddService(args) => admin::add_service(&ctx, args).await,
        Command::EditService(args) => admin::edit_service(&ctx, args).await,
        Command::ToggleService(args) => admin::toggle_service(&ctx, args).await,
        Command::DeleteService(args) => admin::delete_service(&ctx, args).await,
        Command::Discounts => admin::discounts(&ctx).await,
        Command::AddDiscount(args) => admin::add_discount(&ctx, args).await,
        Command::ToggleDiscount(args) => admin::toggle_discount(&ctx, args).await,
        Command::DeleteDiscount(args) => admin::delete_discount(&ctx, args).await,
        Command::Complete(args) => admin::complete(&ctx, args).await,
    };

    match outcome {
        Ok(screen) => {
            screen.send(&bot, msg.chat.id).await?;
            log_command_success(cmd.name(), &actor, None);
        }
        Err(err) => {
            report_failure(cmd.name(), cmd.args().unwrap_or_default(), &actor, &err);
            feedback.booking_error(&err).await?;
        }
    }
    Ok(())
}

/// Logs a failed command at the level its cause deserves.
pub fn report_failure(command: &str, input: &str, actor: &Actor, err: &BookingError) {
    match err {
        BookingError::InvalidInput(reason) => log_validation_error(command, input, reason, actor),
        BookingError::Database(e) => {
            tracing::error!("Database error in {}: {}", command, e);
            log_command_error(command, actor, &err.to_string());
        }
        _ => log_command_error(command, actor, &err.to_string()),
    }
}
