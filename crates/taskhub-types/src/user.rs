//! User identity and subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the account was originally created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    Phone,
    Email,
    Wechat,
    Google,
    Github,
}

impl std::fmt::Display for LoginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::Email => write!(f, "email"),
            Self::Wechat => write!(f, "wechat"),
            Self::Google => write!(f, "google"),
            Self::Github => write!(f, "github"),
        }
    }
}

impl std::str::FromStr for LoginType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            "wechat" => Ok(Self::Wechat),
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            _ => Err(ParseEnumError::new("login type", s)),
        }
    }
}

/// Account tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Free tier
    Free,
    /// Paid tier - unlocks AI analysis and extended features
    Pro,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            _ => Err(ParseEnumError::new("account type", s)),
        }
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Subscription ran past its expiry
    Expired,
    /// Subscription was cancelled by the user or the provider
    Cancelled,
    /// Payment is past due
    PastDue,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::PastDue => write!(f, "past_due"),
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "past_due" => Ok(Self::PastDue),
            _ => Err(ParseEnumError::new("subscription status", s)),
        }
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Phone number (unique when present)
    pub phone: Option<String>,
    /// Email address (unique when present)
    pub email: Option<String>,
    /// WeChat open id (unique when present)
    pub wechat_open_id: Option<String>,
    /// Google account id (unique when present)
    pub google_id: Option<String>,
    /// GitHub account id (unique when present)
    pub github_id: Option<String>,
    /// Display name
    pub nickname: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
    /// How the account was created
    pub login_type: LoginType,
    /// Account tier
    pub account_type: AccountType,
    /// Subscription status
    pub subscription_status: SubscriptionStatus,
    /// When the subscription expires (if any)
    pub subscription_expires_at: Option<DateTime<Utc>>,
    /// Stripe customer ID (if any)
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription ID (if any)
    pub stripe_subscription_id: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the user currently has Pro access.
    ///
    /// Pro status is a pure function of the account tier, subscription
    /// status and expiry: all three must line up at `now`.
    pub fn is_pro(&self, now: DateTime<Utc>) -> bool {
        self.account_type == AccountType::Pro
            && self.subscription_status == SubscriptionStatus::Active
            && self.subscription_expires_at.is_some_and(|exp| exp > now)
    }
}

/// Error parsing a domain enum from its string form
#[derive(Debug, Clone)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}
