//! Orders, subscription plans and payment methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParseEnumError, UserId};

/// Unique order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Create a new random order ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscription plan tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// 30 days
    Monthly,
    /// 90 days
    Quarterly,
    /// 365 days
    Yearly,
}

impl Plan {
    /// All plans, shortest first
    pub const ALL: [Plan; 3] = [Self::Monthly, Self::Quarterly, Self::Yearly];

    /// Price in CNY cents
    pub const fn price_cents(&self) -> i64 {
        match self {
            Self::Monthly => 1_990,
            Self::Quarterly => 4_990,
            Self::Yearly => 14_990,
        }
    }

    /// Subscription duration in days
    pub const fn duration_days(&self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Yearly => 365,
        }
    }

    /// Human-readable plan name
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(ParseEnumError::new("plan", s)),
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Alipay,
    Wechat,
    Stripe,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alipay => write!(f, "alipay"),
            Self::Wechat => write!(f, "wechat"),
            Self::Stripe => write!(f, "stripe"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alipay" => Ok(Self::Alipay),
            "wechat" => Ok(Self::Wechat),
            "stripe" => Ok(Self::Stripe),
            _ => Err(ParseEnumError::new("payment method", s)),
        }
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
            Self::Refunded => write!(f, "refunded"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

/// A purchase transaction tied to a plan and payment method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Order number used with payment platforms (unique)
    pub order_no: String,
    /// Owning user
    pub user_id: UserId,
    /// Purchased plan
    pub plan: Plan,
    /// Amount in CNY cents
    pub amount_cents: i64,
    /// How the order is paid
    pub payment_method: PaymentMethod,
    /// Lifecycle status
    pub status: OrderStatus,
    /// External trade/transaction number (set on payment)
    pub trade_no: Option<String>,
    /// When the order was paid (if it was)
    pub paid_at: Option<DateTime<Utc>>,
    /// Payment page URL handed to the client
    pub pay_url: Option<String>,
    /// Stripe customer ID (stripe orders)
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription ID (stripe orders, after completion)
    pub stripe_subscription_id: Option<String>,
    /// Stripe checkout session ID (stripe orders)
    pub stripe_session_id: Option<String>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
}

/// Catalogue entry describing a purchasable plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanInfo {
    /// Plan tier
    pub plan: Plan,
    /// Display name
    pub name: &'static str,
    /// Price in CNY cents
    pub price_cents: i64,
    /// Formatted price, e.g. "¥19.90"
    pub price_display: String,
    /// Subscription duration in days
    pub duration_days: i64,
    /// Marketing feature list
    pub features: &'static [&'static str],
}

impl PlanInfo {
    /// Build the static plan catalogue
    pub fn catalogue() -> Vec<PlanInfo> {
        Plan::ALL
            .iter()
            .map(|&plan| {
                let features: &'static [&'static str] = match plan {
                    Plan::Monthly => &["AI analysis", "Unlimited todos", "Priority support"],
                    Plan::Quarterly => &[
                        "AI analysis",
                        "Unlimited todos",
                        "Priority support",
                        "History export",
                    ],
                    Plan::Yearly => &[
                        "AI analysis",
                        "Unlimited todos",
                        "Priority support",
                        "History export",
                        "Member badge",
                    ],
                };
                PlanInfo {
                    plan,
                    name: plan.display_name(),
                    price_cents: plan.price_cents(),
                    price_display: format!(
                        "¥{}.{:02}",
                        plan.price_cents() / 100,
                        plan.price_cents() % 100
                    ),
                    duration_days: plan.duration_days(),
                    features,
                }
            })
            .collect()
    }
}
