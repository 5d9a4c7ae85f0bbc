use super::events::{Inbound, Keyboard, Reply};
use super::keyboards;
use super::session::{ConversationState, FunnelState, Session};
use super::ConversationEngine;
use crate::broadcast::BroadcastPayload;
use crate::directory::{DirectoryError, NewUser, UserStatus, UserUpdate};
use rand::Rng;
use tracing::{debug, error, info, warn};

const CODE_PREFIXES: [&str; 5] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣"];

/// Pure shape check: exactly 10 ASCII digits, nothing else.
pub(super) fn is_valid_account_id(text: &str) -> bool {
    text.len() == 10 && text.chars().all(|c| c.is_ascii_digit())
}

impl ConversationEngine {
    pub(super) async fn start_funnel(&self, inbound: &Inbound) -> Vec<Reply> {
        let user_id = inbound.user_id;
        let full_name = inbound
            .full_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());

        match self.directory.exists(user_id).await {
            Ok(true) => {
                if let Err(e) = self
                    .directory
                    .update(user_id, UserUpdate::full_name(full_name))
                    .await
                {
                    warn!(user_id, error = %e, "failed to refresh user record");
                } else {
                    info!(user_id, "returning user");
                }
            }
            Ok(false) => {
                let created = self
                    .directory
                    .create(NewUser {
                        id: user_id,
                        full_name,
                        status: UserStatus::Active,
                    })
                    .await;
                match created {
                    Ok(()) => info!(user_id, "new user registered"),
                    // The existence check just said no; a duplicate here is a bug.
                    Err(DirectoryError::DuplicateKey) => {
                        error!(user_id, "duplicate create for a user that did not exist")
                    }
                    Err(e) => warn!(user_id, error = %e, "failed to register user"),
                }
            }
            Err(e) => warn!(user_id, error = %e, "user lookup failed"),
        }

        self.sessions.put(user_id, Session::funnel()).await;
        vec![Reply::message_with(
            self.config().messages.start.clone(),
            keyboards::channel_list(self.config()),
        )]
    }

    pub(super) async fn cancel_funnel(&self, inbound: &Inbound) -> Vec<Reply> {
        if self.sessions.get(inbound.user_id).await.is_none() {
            return vec![];
        }
        self.sessions.remove(inbound.user_id).await;
        vec![Reply::message_with(
            self.config().messages.cancelled.clone(),
            Keyboard::Remove,
        )]
    }

    pub(super) async fn check_subscription(&self, inbound: &Inbound) -> Vec<Reply> {
        let user_id = inbound.user_id;
        let subscribed = if !self.config().features.enforce_membership_gate {
            debug!(user_id, "membership gate disabled, treating as subscribed");
            true
        } else {
            match self.gate.is_member_of_all(user_id).await {
                Ok(member) => member,
                Err(e) => {
                    warn!(user_id, error = %e, "membership query failed");
                    false
                }
            }
        };

        if !subscribed {
            return vec![Reply::alert(self.config().messages.not_subscribed.clone(), true)];
        }

        info!(user_id, "subscription verified");
        self.sessions
            .modify(user_id, |s| {
                s.state = ConversationState::Funnel(FunnelState::PickingApp)
            })
            .await;
        vec![self.catalog_prompt()]
    }

    pub(super) async fn on_funnel_message(
        &self,
        inbound: &Inbound,
        state: FunnelState,
        payload: &BroadcastPayload,
    ) -> Vec<Reply> {
        // The funnel only reacts to plain text.
        let Some(text) = payload.as_text() else {
            return vec![];
        };
        let user_id = inbound.user_id;
        let labels = &self.config().button_labels;

        match state {
            FunnelState::MainMenu => vec![],
            FunnelState::PickingApp => {
                if let Some(app) = self.config().find_app(text).cloned() {
                    info!(user_id, app = %app.name, "app selected");
                    let info_text =
                        format!("{}\n\n{}", app.info, self.config().messages.send_me_your_id);
                    let link = keyboards::app_link(&app);
                    self.sessions
                        .modify(user_id, |s| {
                            s.selected_app = Some(app);
                            s.state = ConversationState::Funnel(FunnelState::AwaitingAccountId);
                        })
                        .await;
                    vec![
                        Reply::message_with(info_text, link),
                        Reply::message_with(
                            self.config().messages.send_id_prompt.clone(),
                            keyboards::back_only(self.config()),
                        ),
                    ]
                } else if text == labels.help {
                    vec![
                        Reply::message_with(self.config().messages.help.clone(), Keyboard::Remove),
                        self.catalog_prompt(),
                    ]
                } else {
                    vec![]
                }
            }
            FunnelState::AwaitingAccountId => {
                if text == labels.back {
                    self.sessions
                        .modify(user_id, |s| {
                            s.state = ConversationState::Funnel(FunnelState::PickingApp)
                        })
                        .await;
                    return vec![self.catalog_prompt()];
                }
                if !is_valid_account_id(text) {
                    return vec![Reply::message_with(
                        self.config().messages.invalid_id.clone(),
                        keyboards::back_only(self.config()),
                    )];
                }

                if let Err(e) = self
                    .directory
                    .update(user_id, UserUpdate::status(UserStatus::IdVerified))
                    .await
                {
                    warn!(user_id, error = %e, "failed to mark user verified");
                }
                info!(user_id, "account id accepted");
                self.sessions
                    .modify(user_id, |s| {
                        s.state = ConversationState::Funnel(FunnelState::GeneratingCode)
                    })
                    .await;
                vec![Reply::message_with(
                    self.config().messages.congratulation.clone(),
                    keyboards::back_and_generate(self.config()),
                )]
            }
            FunnelState::GeneratingCode => {
                if text == labels.back {
                    self.sessions
                        .modify(user_id, |s| {
                            s.state = ConversationState::Funnel(FunnelState::PickingApp)
                        })
                        .await;
                    return vec![self.catalog_prompt()];
                }
                // The generate button, or any other text, draws a fresh result.
                let prefix = CODE_PREFIXES[rand::rng().random_range(0..CODE_PREFIXES.len())];
                vec![Reply::message_with(
                    format!("{} {}", prefix, self.config().messages.code_prefix),
                    keyboards::back_and_generate(self.config()),
                )]
            }
        }
    }

    fn catalog_prompt(&self) -> Reply {
        Reply::message_with(
            self.config().messages.check_success.clone(),
            keyboards::app_catalog(self.config()),
        )
    }
}
