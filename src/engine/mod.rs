mod admin;
mod events;
mod funnel;
mod keyboards;
mod session;

pub use events::{
    ButtonAction, CallbackAction, Command, Event, Inbound, InlineButton, Keyboard, Reply,
};
pub use session::{AdminState, ConversationState, FunnelState, Session, SessionStore};

use crate::broadcast::BroadcastTransport;
use crate::configuration::{Config, Context};
use crate::directory::{DirectoryError, NewUser, UserDirectory, UserStatus, UserUpdate};
use crate::membership::MembershipGate;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes each inbound event to a handler picked by the sender's current
/// state. Owns the per-user session slots; the directory is the only state
/// that survives a restart.
pub struct ConversationEngine {
    context: Context,
    directory: Arc<UserDirectory>,
    gate: Arc<dyn MembershipGate>,
    transport: Arc<dyn BroadcastTransport>,
    sessions: SessionStore,
}

impl ConversationEngine {
    pub fn new(
        context: Context,
        directory: Arc<UserDirectory>,
        gate: Arc<dyn MembershipGate>,
        transport: Arc<dyn BroadcastTransport>,
    ) -> Self {
        Self {
            context,
            directory,
            gate,
            transport,
            sessions: SessionStore::new(),
        }
    }

    fn config(&self) -> &Config {
        &self.context.config
    }

    pub async fn handle(&self, inbound: Inbound) -> Vec<Reply> {
        let user_id = inbound.user_id;
        let is_admin = self.config().is_admin(user_id);
        let session = self.sessions.get(user_id).await;

        let in_admin_track = matches!(
            session.as_ref().map(|s| s.state),
            Some(ConversationState::Admin(_))
        );
        let wants_admin_action = match &inbound.event {
            Event::Action(action) => action.is_admin_action(),
            _ => false,
        };

        // The only permission check on the admin track, evaluated before
        // any handler runs.
        if (in_admin_track || wants_admin_action) && !is_admin {
            warn!(user_id, "admin access denied");
            if in_admin_track {
                // A stray admin session on a non-admin is parked on the menu.
                self.sessions.put(user_id, Session::admin()).await;
            }
            return vec![Reply::alert(admin::PERMISSION_DENIED, true)];
        }

        match inbound.event.clone() {
            Event::Command(Command::Start) => {
                if is_admin {
                    self.start_admin(&inbound).await
                } else {
                    self.start_funnel(&inbound).await
                }
            }
            Event::Command(Command::Cancel) => {
                if in_admin_track {
                    self.admin_cancel(&inbound).await
                } else {
                    self.cancel_funnel(&inbound).await
                }
            }
            Event::Action(action) => match session.map(|s| s.state) {
                Some(ConversationState::Funnel(state)) => match (state, action) {
                    (FunnelState::MainMenu, CallbackAction::CheckSubscription) => {
                        self.check_subscription(&inbound).await
                    }
                    _ => vec![],
                },
                Some(ConversationState::Admin(state)) => {
                    self.on_admin_action(&inbound, state, action).await
                }
                None => {
                    debug!(user_id, "callback without a live session");
                    vec![]
                }
            },
            Event::Message(payload) => match session.map(|s| s.state) {
                Some(ConversationState::Funnel(state)) => {
                    self.on_funnel_message(&inbound, state, &payload).await
                }
                Some(ConversationState::Admin(state)) => {
                    self.on_admin_message(&inbound, state, payload).await
                }
                None => {
                    debug!(user_id, "message without a live session");
                    vec![]
                }
            },
        }
    }

    /// Records an approved channel join. Called after the platform approval
    /// has already succeeded; nothing here can undo it.
    pub async fn record_channel_join(&self, user_id: i64, full_name: Option<String>) {
        match self.directory.exists(user_id).await {
            Ok(true) => {
                let update = UserUpdate {
                    full_name,
                    status: Some(UserStatus::ChannelJoined),
                };
                if let Err(e) = self.directory.update(user_id, update).await {
                    warn!(user_id, error = %e, "failed to record channel join");
                }
            }
            Ok(false) => {
                let created = self
                    .directory
                    .create(NewUser {
                        id: user_id,
                        full_name: full_name.unwrap_or_else(|| "Unknown".to_string()),
                        status: UserStatus::ChannelJoined,
                    })
                    .await;
                match created {
                    Ok(()) => info!(user_id, "user created from channel join"),
                    Err(DirectoryError::DuplicateKey) => {
                        warn!(user_id, "duplicate create while recording channel join")
                    }
                    Err(e) => warn!(user_id, error = %e, "failed to record channel join"),
                }
            }
            Err(e) => warn!(user_id, error = %e, "user lookup failed during channel join"),
        }
    }

    pub fn welcome_text(&self) -> &str {
        &self.config().messages.welcome
    }
}
