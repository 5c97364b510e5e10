//! Input validation tests
//!
//! Tests for the request-shape validation the API relies on: domain enum
//! parsing, matrix bounds, and identifier formats.

use taskhub_types::{
    urgency_is_valid, Importance, PaymentMethod, Plan, SubscriptionStatus, TodoStatus,
};

// ============================================================================
// Domain enum parsing (request payloads carry these as strings)
// ============================================================================

#[test]
fn test_plan_parsing_accepts_catalogue_values() {
    assert_eq!("monthly".parse::<Plan>().unwrap(), Plan::Monthly);
    assert_eq!("quarterly".parse::<Plan>().unwrap(), Plan::Quarterly);
    assert_eq!("yearly".parse::<Plan>().unwrap(), Plan::Yearly);
}

#[test]
fn test_plan_parsing_rejects_unknown_values() {
    assert!("weekly".parse::<Plan>().is_err());
    assert!("MONTHLY".parse::<Plan>().is_err());
    assert!("".parse::<Plan>().is_err());
}

#[test]
fn test_payment_method_parsing() {
    assert_eq!("alipay".parse::<PaymentMethod>().unwrap(), PaymentMethod::Alipay);
    assert_eq!("wechat".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wechat);
    assert_eq!("stripe".parse::<PaymentMethod>().unwrap(), PaymentMethod::Stripe);
    assert!("paypal".parse::<PaymentMethod>().is_err());
}

#[test]
fn test_importance_parsing_is_case_sensitive() {
    assert_eq!("A".parse::<Importance>().unwrap(), Importance::A);
    assert_eq!("D".parse::<Importance>().unwrap(), Importance::D);
    assert!("a".parse::<Importance>().is_err());
    assert!("E".parse::<Importance>().is_err());
}

#[test]
fn test_todo_status_parsing() {
    assert_eq!("pending".parse::<TodoStatus>().unwrap(), TodoStatus::Pending);
    assert_eq!(
        "in_progress".parse::<TodoStatus>().unwrap(),
        TodoStatus::InProgress
    );
    assert!("done".parse::<TodoStatus>().is_err());
    assert!("in-progress".parse::<TodoStatus>().is_err());
}

#[test]
fn test_subscription_status_accepts_stripe_spelling() {
    assert_eq!(
        "canceled".parse::<SubscriptionStatus>().unwrap(),
        SubscriptionStatus::Cancelled
    );
    assert_eq!(
        "cancelled".parse::<SubscriptionStatus>().unwrap(),
        SubscriptionStatus::Cancelled
    );
}

// ============================================================================
// Matrix bounds
// ============================================================================

#[test]
fn test_urgency_bounds() {
    for u in 1..=5 {
        assert!(urgency_is_valid(u), "urgency {u} should be valid");
    }
    assert!(!urgency_is_valid(0));
    assert!(!urgency_is_valid(6));
    assert!(!urgency_is_valid(-1));
    assert!(!urgency_is_valid(i16::MAX));
}

// ============================================================================
// Serde boundaries (what Json extractors will and will not accept)
// ============================================================================

#[test]
fn test_importance_serde_rejects_invalid_variants() {
    assert!(serde_json::from_str::<Importance>("\"A\"").is_ok());
    assert!(serde_json::from_str::<Importance>("\"X\"").is_err());
    assert!(serde_json::from_str::<Importance>("1").is_err());
}

#[test]
fn test_todo_status_serde_uses_snake_case() {
    assert_eq!(
        serde_json::from_str::<TodoStatus>("\"in_progress\"").unwrap(),
        TodoStatus::InProgress
    );
    assert!(serde_json::from_str::<TodoStatus>("\"InProgress\"").is_err());
}

#[test]
fn test_plan_serde_round_trip() {
    for plan in Plan::ALL {
        let encoded = serde_json::to_string(&plan).unwrap();
        let decoded: Plan = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, plan);
    }
}

// ============================================================================
// Identifier formats (mirrors the auth-core validation rules)
// ============================================================================

/// Mainland mobile number rule used by the auth service
fn phone_is_valid(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && bytes.iter().all(|b| b.is_ascii_digit())
}

#[test]
fn test_phone_format_boundaries() {
    assert!(phone_is_valid("13800138000"));
    assert!(phone_is_valid("19912345678"));

    assert!(!phone_is_valid("12800138000")); // 12x prefix not assigned
    assert!(!phone_is_valid("1380013800")); // 10 digits
    assert!(!phone_is_valid("138001380001")); // 12 digits
    assert!(!phone_is_valid("1380013800a"));
    assert!(!phone_is_valid("+8613800138000"));
    assert!(!phone_is_valid(""));
}

#[test]
fn test_order_no_shape() {
    let order_no = taskhub_billing_core::generate_order_no();
    assert!(order_no.starts_with("TD"));
    assert!(order_no.len() > 15);
    assert!(order_no[2..].bytes().all(|b| b.is_ascii_alphanumeric()));
}
