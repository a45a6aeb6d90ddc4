use chrono::Days;
use teloxide::prelude::*;

use crate::bot::callback_data::CallbackAction;
use crate::bot::commands::{admin, booking, stats, Screen};
use crate::bot::handlers::message::report_failure;
use crate::bot::handlers::{AppContext, HandlerResult};
use crate::bot::keyboards::BOOKING_HORIZON_DAYS;
use crate::bot::state::{BookingDialogue, BookingState};
use crate::database::models::booking::BookingDetails;
use crate::error::BookingError;
use crate::services::booking::BookingRequest;
use crate::services::messages::{booking_block, booking_created_user};
use crate::utils::logging::{
    log_access_denied, log_command_start, log_command_success, log_validation_error, Actor,
};
use crate::utils::markdown::bold;

const EXPIRED: &str = "This booking session has expired. Use /book to start again.";

/// What to do with the message a button was pressed on.
enum Reply {
    /// Replace the message in place.
    Edit(Screen),
    /// Post a new message below it.
    Send(Screen),
    /// Only show a short popup.
    Toast(String),
    /// Post the statistics report.
    Stats,
}

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BookingDialogue,
    ctx: AppContext,
) -> HandlerResult {
    let actor = Actor::from_callback(&q);
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            log_validation_error("callback", &data, &e.to_string(), &actor);
            bot.answer_callback_query(q.id).text("Unknown action").await?;
            return Ok(());
        }
    };
    log_command_start("callback", &actor, Some(&data));

    if action.requires_admin() && !ctx.is_admin(actor.user_id) {
        log_access_denied(&data, &actor);
        bot.answer_callback_query(q.id)
            .text(BookingError::Forbidden.user_message())
            .await?;
        return Ok(());
    }

    let Some(message) = q.message.clone() else {
        bot.answer_callback_query(q.id).text(EXPIRED).await?;
        return Ok(());
    };

    match handle_action(&q, action, &dialogue, &ctx).await {
        Ok(reply) => {
            match reply {
                Reply::Edit(screen) => {
                    bot.answer_callback_query(q.id).await?;
                    screen.edit(&bot, &message).await?;
                }
                Reply::Send(screen) => {
                    bot.answer_callback_query(q.id).await?;
                    screen.send(&bot, message.chat.id).await?;
                }
                Reply::Toast(text) => {
                    bot.answer_callback_query(q.id).text(text).await?;
                }
                Reply::Stats => {
                    bot.answer_callback_query(q.id).await?;
                    stats::handle_stats(bot.clone(), message.chat.id, &ctx).await?;
                }
            }
            log_command_success("callback", &actor, Some(&data));
        }
        Err(err) => {
            report_failure("callback", &data, &actor, &err);
            bot.answer_callback_query(q.id)
                .text(err.user_message())
                .show_alert(true)
                .await?;
        }
    }
    Ok(())
}

async fn current_state(dialogue: &BookingDialogue) -> BookingState {
    match dialogue.get().await {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read booking state for chat {}: {}", dialogue.chat_id(), e);
            BookingState::Idle
        }
    }
}

async fn set_state(dialogue: &BookingDialogue, state: BookingState) {
    if let Err(e) = dialogue.update(state).await {
        tracing::warn!("Failed to store booking state for chat {}: {}", dialogue.chat_id(), e);
    }
}

async fn handle_action(
    q: &CallbackQuery,
    action: CallbackAction,
    dialogue: &BookingDialogue,
    ctx: &AppContext,
) -> Result<Reply, BookingError> {
    let user_id = q.from.id.0 as i64;
    let state = current_state(dialogue).await;

    let reply = match action {
        CallbackAction::Book | CallbackAction::BackToServices => {
            set_state(dialogue, BookingState::Idle).await;
            booking::register_user(ctx, &q.from).await?;
            Reply::Edit(booking::services(ctx).await?)
        }
        CallbackAction::SelectService(service_id) => {
            let screen = booking::dates(ctx, service_id).await?;
            set_state(dialogue, BookingState::ChoosingDate { service_id }).await;
            Reply::Edit(screen)
        }
        CallbackAction::BackToDates => match state.service_id() {
            Some(service_id) => {
                let screen = booking::dates(ctx, service_id).await?;
                set_state(dialogue, BookingState::ChoosingDate { service_id }).await;
                Reply::Edit(screen)
            }
            None => Reply::Toast(EXPIRED.to_string()),
        },
        CallbackAction::SelectDate(date) => {
            let Some(service_id) = state.service_id() else {
                return Ok(Reply::Toast(EXPIRED.to_string()));
            };
            let today = ctx.clock.today();
            let last = today
                .checked_add_days(Days::new(BOOKING_HORIZON_DAYS - 1))
                .unwrap_or(today);
            if date < today || date > last {
                return Err(BookingError::InvalidInput(
                    "that date can no longer be booked".to_string(),
                ));
            }
            match booking::times(ctx, service_id, date, None).await? {
                Some(screen) => {
                    set_state(dialogue, BookingState::ChoosingTime { service_id, date }).await;
                    Reply::Edit(screen)
                }
                None => Reply::Toast("No free time on this day, please pick another date.".to_string()),
            }
        }
        CallbackAction::SelectTime(time) => match state {
            BookingState::ChoosingTime { service_id, date }
            | BookingState::Confirming { service_id, date, .. } => {
                if ctx.bookings.slots().grid().find(&time).is_none() {
                    return Err(BookingError::InvalidInput(format!("'{time}' is not a bookable time")));
                }
                let screen = booking::confirmation(ctx, service_id, date, &time).await?;
                set_state(dialogue, BookingState::Confirming { service_id, date, time }).await;
                Reply::Edit(screen)
            }
            _ => Reply::Toast(EXPIRED.to_string()),
        },
        CallbackAction::ConfirmBooking => {
            let BookingState::Confirming { service_id, date, time } = state else {
                return Ok(Reply::Toast(EXPIRED.to_string()));
            };
            booking::register_user(ctx, &q.from).await?;
            let request = BookingRequest::new(user_id, service_id, date, time);
            match ctx.bookings.create(&request, ctx.clock.now()).await {
                Ok(details) => {
                    if let Err(e) = dialogue.exit().await {
                        tracing::warn!("Failed to reset booking state: {}", e);
                    }
                    Reply::Edit(Screen::new(booking_created_user(&details).text))
                }
                Err(BookingError::SlotUnavailable) => {
                    let notice = BookingError::SlotUnavailable.user_message();
                    match booking::times(ctx, service_id, date, Some(&notice)).await? {
                        Some(screen) => {
                            set_state(dialogue, BookingState::ChoosingTime { service_id, date }).await;
                            Reply::Edit(screen)
                        }
                        None => {
                            set_state(dialogue, BookingState::ChoosingDate { service_id }).await;
                            Reply::Edit(booking::dates(ctx, service_id).await?)
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
        CallbackAction::AbortBooking => {
            if let Err(e) = dialogue.exit().await {
                tracing::warn!("Failed to reset booking state: {}", e);
            }
            Reply::Edit(Screen::new(
                "❌ Booking cancelled\\. Use /book whenever you want to start again\\.",
            ))
        }
        CallbackAction::CancelBooking(id) => {
            let cancelled = ctx.bookings.cancel(id, user_id).await?;
            Reply::Edit(booking::cancelled(&cancelled))
        }
        CallbackAction::Approve(id) => {
            let b = ctx.bookings.approve(id).await?;
            Reply::Edit(admin_outcome("✅", "Booking approved", &b))
        }
        CallbackAction::Reject(id) => {
            let b = ctx.bookings.reject(id).await?;
            Reply::Edit(admin_outcome("❌", "Booking rejected", &b))
        }
        CallbackAction::Complete(id) => {
            let b = ctx.bookings.complete(id).await?;
            Reply::Edit(admin_outcome("🏁", "Booking completed", &b))
        }
        CallbackAction::AdminCancel(id) => {
            let b = ctx.bookings.admin_cancel(id).await?;
            Reply::Edit(admin_outcome("🚫", "Booking cancelled", &b))
        }
        CallbackAction::MyBookings => Reply::Send(booking::my_bookings(ctx, user_id).await?),
        CallbackAction::Help => Reply::Send(booking::help(ctx.is_admin(user_id))),
        CallbackAction::AdminPanel => Reply::Send(admin::panel()),
        CallbackAction::AdminBookings => Reply::Send(admin::bookings(ctx, "").await?),
        CallbackAction::AdminServices => Reply::Send(admin::services(ctx).await?),
        CallbackAction::AdminDiscounts => Reply::Send(admin::discounts(ctx).await?),
        CallbackAction::AdminStats => Reply::Stats,
    };
    Ok(reply)
}

fn admin_outcome(emoji: &str, title: &str, booking: &BookingDetails) -> Screen {
    Screen::new(format!(
        "{} {} \\#{}\n\n{}",
        emoji,
        bold(title),
        booking.id,
        booking_block(booking)
    ))
}
