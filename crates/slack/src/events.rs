use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use lunchtrain_core::roster::{MessageHandle, TrainRoster};

use crate::blocks::{self, MessageTemplate, TrainMenu};
use crate::gateway::{ChatGateway, GatewayError, UserDirectory};

/// One interactive component click, already lifted out of the platform's
/// interaction payload by the enclosing transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: String,
    pub message_ts: String,
    pub user_id: String,
    pub action_id: String,
    /// Button value, when the component carries one.
    pub value: Option<String>,
    /// Complete checkbox state, for selection components.
    pub selected: Vec<String>,
    pub request_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action id `{0}`")]
    UnknownAction(String),
    #[error("action `{0}` requires a value payload")]
    MissingValue(String),
}

impl ActionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "That button is not wired to anything here.",
            Self::MissingValue(_) => "That action arrived without its value. Try again.",
        }
    }
}

/// Routes block actions to roster mutations.
///
/// The vote is recorded before any confirmation is rendered: a dropped
/// confirmation message is acceptable, a lost vote is not.
pub struct BlockActionRouter {
    roster: Arc<TrainRoster>,
    directory: Arc<dyn UserDirectory>,
    menu: TrainMenu,
}

impl BlockActionRouter {
    pub fn new(
        roster: Arc<TrainRoster>,
        directory: Arc<dyn UserDirectory>,
        menu: TrainMenu,
    ) -> Self {
        Self { roster, directory, menu }
    }

    pub async fn route(&self, event: &BlockActionEvent) -> Result<MessageTemplate, ActionError> {
        let template = match event.action_id.as_str() {
            "confirm_train_participation" => {
                self.roster.mark_participating(&event.user_id);
                let profile = self.directory.user_info(&event.user_id).await;
                blocks::boarding_confirmation(&profile.display_name, &self.menu)
            }
            "reject_train_participation" => {
                self.roster.mark_not_participating(&event.user_id);
                let profile = self.directory.user_info(&event.user_id).await;
                blocks::decline_confirmation(&profile.display_name)
            }
            "select_lunch_times" => {
                self.roster.replace_time_selection(&event.user_id, &event.selected);
                blocks::selection_confirmation("Lunch times", &event.selected)
            }
            "select_restaurants" => {
                self.roster.replace_restaurant_selection(&event.user_id, &event.selected);
                blocks::selection_confirmation("Restaurants", &event.selected)
            }
            "add_lunch_time" => {
                let value = required_value(event)?;
                self.roster.add_time_preference(&event.user_id, value);
                self.time_selection_reply(&event.user_id)
            }
            "remove_lunch_time" => {
                // No value means "clear my whole time selection".
                self.roster.remove_time_preference(&event.user_id, event.value.as_deref());
                self.time_selection_reply(&event.user_id)
            }
            "add_restaurant" => {
                let value = required_value(event)?;
                self.roster.add_restaurant_preference(&event.user_id, value);
                self.restaurant_selection_reply(&event.user_id)
            }
            "remove_restaurant" => {
                self.roster.remove_restaurant_preference(&event.user_id, event.value.as_deref());
                self.restaurant_selection_reply(&event.user_id)
            }
            other => return Err(ActionError::UnknownAction(other.to_owned())),
        };

        info!(
            event_name = "interaction.block_action.recorded",
            action_id = %event.action_id,
            user_id = %event.user_id,
            correlation_id = %event.request_id,
            "recorded block action"
        );

        Ok(template)
    }

    /// Remembers where a participant's private prompt landed so a later
    /// action can edit it.
    pub fn record_boarding_message(&self, user: &str, handle: MessageHandle) {
        self.roster.record_private_message(user, handle);
    }

    /// Re-renders a participant's private prompt in place. `Ok(false)` means
    /// no prompt was ever recorded for the user, which is a normal state and
    /// not an error. Unlike scheduler deliveries, gateway failures propagate
    /// here: the user just clicked something and deserves to see breakage.
    pub async fn refresh_boarding_message(
        &self,
        gateway: &dyn ChatGateway,
        user: &str,
        template: &MessageTemplate,
    ) -> Result<bool, GatewayError> {
        let Some(handle) = self.roster.private_message(user) else {
            return Ok(false);
        };
        gateway.update_message(&handle.channel, &handle.ts, template).await?;
        Ok(true)
    }

    fn time_selection_reply(&self, user: &str) -> MessageTemplate {
        let snapshot = self.roster.snapshot();
        let selected = snapshot.time_preferences.get(user).cloned().unwrap_or_default();
        blocks::selection_confirmation("Lunch times", &selected)
    }

    fn restaurant_selection_reply(&self, user: &str) -> MessageTemplate {
        let snapshot = self.roster.snapshot();
        let selected = snapshot.restaurant_preferences.get(user).cloned().unwrap_or_default();
        blocks::selection_confirmation("Restaurants", &selected)
    }
}

fn required_value(event: &BlockActionEvent) -> Result<&str, ActionError> {
    event
        .value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ActionError::MissingValue(event.action_id.clone()))
}
