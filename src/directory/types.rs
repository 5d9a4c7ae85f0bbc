use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    ChannelJoined,
    IdVerified,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::ChannelJoined => "channel_joined",
            UserStatus::IdVerified => "id_verified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "channel_joined" => Some(UserStatus::ChannelJoined),
            "id_verified" => Some(UserStatus::IdVerified),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub full_name: String,
    pub status: UserStatus,
}

/// Field-level merge for `update`: only the populated fields are written.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub status: Option<UserStatus>,
}

impl UserUpdate {
    pub fn full_name(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn status(status: UserStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.status.is_none()
    }
}
