use super::events::{Inbound, Reply};
use super::keyboards;
use super::session::{AdminState, ConversationState, Session};
use super::ConversationEngine;
use crate::broadcast::{self, BroadcastPayload};
use crate::directory::{User, UserStatus};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

pub(super) const PERMISSION_DENIED: &str = "❌ You are not allowed to use the admin panel.";
const ADMIN_MENU_TEXT: &str = "👨‍💼 Admin panel\n\nChoose an action:";
const BROADCAST_PROMPT: &str =
    "📝 Send the message to deliver to all users.\n\nSend /cancel to return to the panel.";
const BROADCAST_RECEIVED: &str = "✅ Message received.\n\nDeliver it to every user?";
const BROADCAST_MISSING: &str = "❌ No captured message found. Please try again.";
const NO_RECIPIENTS: &str = "⚠️ There are no users to send to.";
const DIRECTORY_UNAVAILABLE: &str = "⚠️ Could not load the user list. Please try again.";
const PANEL_CLOSED: &str = "✅ Admin panel closed.";
const STATS_UNAVAILABLE: &str = "⚠️ Statistics are unavailable right now.";

impl ConversationEngine {
    pub(super) async fn start_admin(&self, inbound: &Inbound) -> Vec<Reply> {
        info!(user_id = inbound.user_id, "admin panel opened");
        self.sessions.put(inbound.user_id, Session::admin()).await;
        vec![Reply::message_with(
            ADMIN_MENU_TEXT,
            keyboards::admin_menu(),
        )]
    }

    /// `/cancel` anywhere on the admin track drops back to the menu.
    pub(super) async fn admin_cancel(&self, inbound: &Inbound) -> Vec<Reply> {
        self.sessions.put(inbound.user_id, Session::admin()).await;
        vec![Reply::message_with(
            ADMIN_MENU_TEXT,
            keyboards::admin_menu(),
        )]
    }

    pub(super) async fn on_admin_action(
        &self,
        inbound: &Inbound,
        state: AdminState,
        action: super::events::CallbackAction,
    ) -> Vec<Reply> {
        use super::events::CallbackAction::*;
        let user_id = inbound.user_id;

        match (state, action) {
            (AdminState::Menu, AdminBroadcast) => {
                self.sessions
                    .modify(user_id, |s| {
                        s.state = ConversationState::Admin(AdminState::AwaitingBroadcast)
                    })
                    .await;
                vec![Reply::edit(BROADCAST_PROMPT)]
            }
            (AdminState::Menu, AdminStats) => {
                self.sessions
                    .modify(user_id, |s| {
                        s.state = ConversationState::Admin(AdminState::ViewingStats)
                    })
                    .await;
                vec![self.stats_reply().await]
            }
            (_, AdminClose) => {
                self.sessions.remove(user_id).await;
                vec![Reply::edit(PANEL_CLOSED)]
            }
            (AdminState::ConfirmingBroadcast, ConfirmBroadcast) => {
                self.run_broadcast(inbound).await
            }
            (AdminState::ConfirmingBroadcast, CancelBroadcast) => {
                info!(user_id, "broadcast cancelled before sending");
                self.sessions.put(user_id, Session::admin()).await;
                vec![Reply::edit_with(ADMIN_MENU_TEXT, keyboards::admin_menu())]
            }
            (_, AdminBack) => {
                self.sessions.put(user_id, Session::admin()).await;
                vec![Reply::edit_with(ADMIN_MENU_TEXT, keyboards::admin_menu())]
            }
            _ => vec![],
        }
    }

    pub(super) async fn on_admin_message(
        &self,
        inbound: &Inbound,
        state: AdminState,
        payload: BroadcastPayload,
    ) -> Vec<Reply> {
        if state != AdminState::AwaitingBroadcast {
            return vec![];
        }
        // Captured verbatim, whatever the content kind turns out to be.
        info!(
            user_id = inbound.user_id,
            kind = payload.kind(),
            "broadcast message captured"
        );
        self.sessions
            .modify(inbound.user_id, |s| {
                s.pending_broadcast = Some(payload);
                s.state = ConversationState::Admin(AdminState::ConfirmingBroadcast);
            })
            .await;
        vec![Reply::message_with(
            BROADCAST_RECEIVED,
            keyboards::broadcast_confirm(),
        )]
    }

    async fn run_broadcast(&self, inbound: &Inbound) -> Vec<Reply> {
        let user_id = inbound.user_id;
        let payload = match self.sessions.get(user_id).await {
            Some(session) => session.pending_broadcast,
            None => None,
        };
        let Some(payload) = payload else {
            warn!(user_id, "confirm without a captured message");
            self.sessions.put(user_id, Session::admin()).await;
            return vec![Reply::edit(BROADCAST_MISSING)];
        };

        let users = match self.directory.list_all().await {
            Ok(users) => users,
            Err(e) => {
                error!(user_id, error = %e, "failed to snapshot the directory");
                self.sessions.put(user_id, Session::admin()).await;
                return vec![Reply::edit(DIRECTORY_UNAVAILABLE)];
            }
        };
        if users.is_empty() {
            self.sessions.put(user_id, Session::admin()).await;
            return vec![Reply::edit(NO_RECIPIENTS)];
        }

        // Snapshot of recipient ids, taken once at confirmation time.
        let recipients: Vec<i64> = users.iter().map(|u| u.id).collect();
        info!(
            user_id,
            recipients = recipients.len(),
            kind = payload.kind(),
            "broadcast starting"
        );

        let progress = format!(
            "📤 Sending the message to {} users...\nPlease wait...",
            recipients.len()
        );
        if let Err(e) = self
            .transport
            .deliver(inbound.chat_id, &BroadcastPayload::Text(progress))
            .await
        {
            warn!(user_id, error = %e, "failed to deliver progress notice");
        }

        let report = broadcast::fan_out(self.transport.as_ref(), &recipients, &payload).await;

        self.sessions.put(user_id, Session::admin()).await;
        let summary = format!(
            "✅ Broadcast finished\n\n📊 Results:\n✅ Delivered: {}\n❌ Failed: {}\n👥 Total users: {}",
            report.success,
            report.failed,
            report.total()
        );
        vec![Reply::message_with(summary, keyboards::back_to_menu())]
    }

    async fn stats_reply(&self) -> Reply {
        let total = self.directory.count().await;
        let active = self.directory.list_by_status(UserStatus::Active).await;
        let joined = self
            .directory
            .list_by_status(UserStatus::ChannelJoined)
            .await;
        let verified = self.directory.list_by_status(UserStatus::IdVerified).await;
        let all = self.directory.list_all().await;

        let (total, active, joined, verified, all) = match (total, active, joined, verified, all) {
            (Ok(t), Ok(a), Ok(j), Ok(v), Ok(all)) => (t, a.len(), j.len(), v.len(), all),
            _ => {
                error!("failed to aggregate directory statistics");
                return Reply::edit_with(STATS_UNAVAILABLE, keyboards::back_to_menu());
            }
        };
        let windows = date_windows(&all, Utc::now());

        let text = format!(
            "📊 Bot statistics\n\n\
             👥 Users:\n\
             • Total: {total}\n\
             • Joined a channel: {joined}\n\
             • Active: {active}\n\
             • Id verified: {verified}\n\
             • Not verified: {unverified}\n\n\
             📅 Signups:\n\
             • Today (all): {today}\n\
             • This week (all): {week}\n\
             • Channel today: {channel_today}\n\
             • Channel this week: {channel_week}",
            unverified = total - verified as u64,
            today = windows.today,
            week = windows.week,
            channel_today = windows.channel_today,
            channel_week = windows.channel_week,
        );
        Reply::edit_with(text, keyboards::stats_view())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct JoinWindows {
    pub today: u64,
    pub week: u64,
    pub channel_today: u64,
    pub channel_week: u64,
}

/// Signup windows by wall-clock day boundary: "today" means the same
/// calendar day, "week" means a floored day difference of at most 7.
pub(super) fn date_windows(users: &[User], now: DateTime<Utc>) -> JoinWindows {
    let today = now.date_naive();
    let mut windows = JoinWindows::default();
    for user in users {
        let days = (today - user.created_at.date_naive()).num_days();
        let is_today = days == 0;
        let in_week = (0..=7).contains(&days);
        if is_today {
            windows.today += 1;
        }
        if in_week {
            windows.week += 1;
        }
        if user.status == UserStatus::ChannelJoined {
            if is_today {
                windows.channel_today += 1;
            }
            if in_week {
                windows.channel_week += 1;
            }
        }
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: i64, status: UserStatus, created_at: DateTime<Utc>) -> User {
        User {
            id,
            full_name: format!("User {id}"),
            status,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn windows_exclude_old_signups() {
        let now = Utc::now();
        let users = vec![
            user(1, UserStatus::Active, now),
            user(2, UserStatus::Active, now),
            user(3, UserStatus::Active, now),
            user(4, UserStatus::Active, now - Duration::days(10)),
            user(5, UserStatus::Active, now - Duration::days(10)),
        ];

        let windows = date_windows(&users, now);
        assert_eq!(windows.today, 3);
        assert_eq!(windows.week, 3);
    }

    #[test]
    fn channel_windows_only_count_channel_joined() {
        let now = Utc::now();
        let users = vec![
            user(1, UserStatus::ChannelJoined, now),
            user(2, UserStatus::ChannelJoined, now - Duration::days(3)),
            user(3, UserStatus::Active, now),
            user(4, UserStatus::ChannelJoined, now - Duration::days(20)),
        ];

        let windows = date_windows(&users, now);
        assert_eq!(windows.channel_today, 1);
        assert_eq!(windows.channel_week, 2);
        assert_eq!(windows.today, 2);
        assert_eq!(windows.week, 3);
    }

    #[test]
    fn week_window_uses_day_boundaries() {
        let now = Utc::now();
        // Exactly seven calendar days back is still inside the window.
        let users = vec![
            user(1, UserStatus::Active, now - Duration::days(7)),
            user(2, UserStatus::Active, now - Duration::days(8)),
        ];

        let windows = date_windows(&users, now);
        assert_eq!(windows.week, 1);
        assert_eq!(windows.today, 0);
    }
}
