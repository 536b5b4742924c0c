//! Core data model for warning events.
//!
//! A warning event is one [`WarnContent`] row plus one [`UserWarn`] row per
//! recipient. Both are written once by the fan-out workflow and only read
//! afterwards.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type WarnContentId = i64;
pub type UserWarnId = i64;

/// Warning category. The integer tag is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarnType {
    Unknown,
    ProduceFailure,
    ConsumeFailure,
    ConsumeBlocked,
    ConsumeFallBehind,
    DeadMessage,
    QuotaExceeded,
    TrafficAbnormal,
    BrokerError,
    ClientError,
}

impl WarnType {
    pub const ALL: [WarnType; 10] = [
        WarnType::Unknown,
        WarnType::ProduceFailure,
        WarnType::ConsumeFailure,
        WarnType::ConsumeBlocked,
        WarnType::ConsumeFallBehind,
        WarnType::DeadMessage,
        WarnType::QuotaExceeded,
        WarnType::TrafficAbnormal,
        WarnType::BrokerError,
        WarnType::ClientError,
    ];

    /// Stable storage tag.
    pub fn tag(self) -> i32 {
        match self {
            WarnType::Unknown => 0,
            WarnType::ProduceFailure => 1,
            WarnType::ConsumeFailure => 2,
            WarnType::ConsumeBlocked => 3,
            WarnType::ConsumeFallBehind => 4,
            WarnType::DeadMessage => 5,
            WarnType::QuotaExceeded => 6,
            WarnType::TrafficAbnormal => 7,
            WarnType::BrokerError => 8,
            WarnType::ClientError => 9,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Short human-readable label used in console listings.
    pub fn label(self) -> &'static str {
        match self {
            WarnType::Unknown => "unknown",
            WarnType::ProduceFailure => "produce failure",
            WarnType::ConsumeFailure => "consume failure",
            WarnType::ConsumeBlocked => "consumer blocked",
            WarnType::ConsumeFallBehind => "consumer falling behind",
            WarnType::DeadMessage => "dead message",
            WarnType::QuotaExceeded => "quota exceeded",
            WarnType::TrafficAbnormal => "abnormal traffic",
            WarnType::BrokerError => "broker error",
            WarnType::ClientError => "client error",
        }
    }
}

impl fmt::Display for WarnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared warning text, persisted once per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarnContent {
    pub id: WarnContentId,
    pub content: String,
    pub create_time: DateTime<Utc>,
}

/// A per-user warning row before the store has assigned `id` and `create_time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserWarn {
    pub uid: UserId,
    pub warn_type: WarnType,
    pub resource: String,
    pub wid: WarnContentId,
}

/// A persisted per-user warning row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWarn {
    pub id: UserWarnId,
    pub uid: UserId,
    pub warn_type: WarnType,
    /// Affected entity, e.g. a topic or consumer group name.
    pub resource: String,
    pub wid: WarnContentId,
    pub create_time: DateTime<Utc>,
    /// Text of the referenced [`WarnContent`], joined on read.
    pub content: Option<String>,
}

/// Number of warnings a user received on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWarnCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Console user as seen by the monitor-user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub monitor: bool,
}
