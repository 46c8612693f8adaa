use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Name of a channel, the identity every task, product, and category entry
/// refers to.
///
/// Always trimmed and never empty. Serialized as a bare string so it can be
/// used as a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

/// Error returned when a channel name is blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("channel name must not be empty")]
pub struct ChannelNameError;

impl ChannelName {
    /// Trim and validate a raw channel name.
    pub fn parse(raw: &str) -> Result<Self, ChannelNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChannelNameError);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn seed(name: &'static str) -> Self {
        Self(name.to_owned())
    }
}

impl TryFrom<String> for ChannelName {
    type Error = ChannelNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}

impl FromStr for ChannelName {
    type Err = ChannelNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Borrow<str> for ChannelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------

/// Start time of a task on the 24-hour grid, formatted `HH:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

/// Error returned when parsing an invalid [`ClockTime`] string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time {0:?} (expected HH:mm, 24-hour)")]
pub struct ClockTimeParseError(pub String);

impl ClockTime {
    /// Build from hour and minute. Returns `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_from_midnight(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| ClockTimeParseError(s.to_owned()))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Parse an exact priority name, falling back to `Medium` for anything
    /// outside the enum.
    pub fn coerce(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Medium)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(PriorityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Priority`] string.
#[derive(Debug, Clone)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid priority: {:?}", self.0)
    }
}

impl std::error::Error for PriorityParseError {}

// ---------------------------------------------------------------------------

/// Persisted colour-scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Light => "light",
            Self::Dark => "dark",
        };
        f.write_str(s)
    }
}

impl FromStr for Theme {
    type Err = ThemeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ThemeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Theme`] string.
#[derive(Debug, Clone)]
pub struct ThemeParseError(pub String);

impl fmt::Display for ThemeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid theme: {:?}", self.0)
    }
}

impl std::error::Error for ThemeParseError {}

// ---------------------------------------------------------------------------
// Channels and categories
// ---------------------------------------------------------------------------

/// Display style tokens assigned to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStyle {
    pub color: &'static str,
    pub bg: &'static str,
    pub dark_bg: &'static str,
}

/// Style rotation for newly created channels.
pub const DEFAULT_CHANNEL_STYLES: [ChannelStyle; 6] = [
    ChannelStyle {
        color: "text-blue-700 dark:text-blue-300",
        bg: "bg-blue-100",
        dark_bg: "dark:bg-blue-900/50",
    },
    ChannelStyle {
        color: "text-purple-700 dark:text-purple-300",
        bg: "bg-purple-100",
        dark_bg: "dark:bg-purple-900/50",
    },
    ChannelStyle {
        color: "text-orange-700 dark:text-orange-300",
        bg: "bg-orange-100",
        dark_bg: "dark:bg-orange-900/50",
    },
    ChannelStyle {
        color: "text-green-700 dark:text-green-300",
        bg: "bg-green-100",
        dark_bg: "dark:bg-green-900/50",
    },
    ChannelStyle {
        color: "text-pink-700 dark:text-pink-300",
        bg: "bg-pink-100",
        dark_bg: "dark:bg-pink-900/50",
    },
    ChannelStyle {
        color: "text-cyan-700 dark:text-cyan-300",
        bg: "bg-cyan-100",
        dark_bg: "dark:bg-cyan-900/50",
    },
];

/// Target assigned to channels created at runtime.
pub const DEFAULT_CHANNEL_TARGET: u32 = 10;

/// A named content channel with a per-period task target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: ChannelName,
    pub color: String,
    pub bg: String,
    pub dark_bg: String,
    pub target: u32,
}

impl Channel {
    /// Build a channel using the style at `style_index` (wrapping).
    pub fn styled(name: ChannelName, style_index: usize, target: u32) -> Self {
        let style = DEFAULT_CHANNEL_STYLES[style_index % DEFAULT_CHANNEL_STYLES.len()];
        Self {
            name,
            color: style.color.to_owned(),
            bg: style.bg.to_owned(),
            dark_bg: style.dark_bg.to_owned(),
            target,
        }
    }
}

/// Channels keyed by name.
pub type ChannelMap = BTreeMap<ChannelName, Channel>;

/// Ordered sub-category names per channel.
pub type CategoryMap = BTreeMap<ChannelName, Vec<String>>;

const SEED_CHANNELS: [(&str, u32, &[&str]); 3] = [
    (
        "Gia dụng",
        50,
        &["Đồ nhà bếp", "Thiết bị điện", "Dụng cụ", "Đồ dọn dẹp"],
    ),
    ("Đạo lý", 30, &["Review sách", "Câu chuyện đạo lý"]),
    ("Sức khỏe", 20, &["Dinh dưỡng", "Thực phẩm chức năng"]),
];

/// Channels a fresh workspace starts with.
pub fn default_channels() -> ChannelMap {
    SEED_CHANNELS
        .iter()
        .enumerate()
        .map(|(idx, (name, target, _))| {
            let name = ChannelName::seed(name);
            (name.clone(), Channel::styled(name, idx, *target))
        })
        .collect()
}

/// Sub-categories a fresh workspace starts with.
pub fn default_categories() -> CategoryMap {
    SEED_CHANNELS
        .iter()
        .map(|(name, _, subs)| {
            (
                ChannelName::seed(name),
                subs.iter().map(|s| (*s).to_owned()).collect(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An inventory item waiting to be featured in content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub channel: ChannelName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Inline image payload (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Set whenever a task referencing this product is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scheduled_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Timestamp aging is measured from.
    pub fn reference_timestamp(&self) -> DateTime<Utc> {
        self.last_scheduled_at.unwrap_or(self.created_at)
    }
}

/// A scheduled piece of work on the calendar.
///
/// Overlapping tasks are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub channel: ChannelName,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    /// Length in minutes.
    pub duration: u32,
    #[serde(default)]
    pub is_completed: bool,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_synced: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

/// Integration settings captured by the settings screen. Stored, never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub notion_key: String,
    pub notion_db: String,
}

/// Generate a fresh entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
