use crate::broadcast::BroadcastPayload;
use crate::configuration::AppItem;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelState {
    MainMenu,
    PickingApp,
    AwaitingAccountId,
    GeneratingCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminState {
    Menu,
    AwaitingBroadcast,
    ConfirmingBroadcast,
    ViewingStats,
}

/// Two separate state types so the tracks cannot bleed into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Funnel(FunnelState),
    Admin(AdminState),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub state: ConversationState,
    pub selected_app: Option<AppItem>,
    pub pending_broadcast: Option<BroadcastPayload>,
}

impl Session {
    pub fn funnel() -> Self {
        Self {
            state: ConversationState::Funnel(FunnelState::MainMenu),
            selected_app: None,
            pending_broadcast: None,
        }
    }

    pub fn admin() -> Self {
        Self {
            state: ConversationState::Admin(AdminState::Menu),
            selected_app: None,
            pending_broadcast: None,
        }
    }
}

/// Transient per-user conversational state; process memory only, lost on
/// restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.lock().await.get(&user_id).cloned()
    }

    pub async fn put(&self, user_id: i64, session: Session) {
        self.sessions.lock().await.insert(user_id, session);
    }

    pub async fn modify<F>(&self, user_id: i64, f: F)
    where
        F: FnOnce(&mut Session),
    {
        if let Some(session) = self.sessions.lock().await.get_mut(&user_id) {
            f(session);
        }
    }

    pub async fn remove(&self, user_id: i64) {
        self.sessions.lock().await.remove(&user_id);
    }
}
