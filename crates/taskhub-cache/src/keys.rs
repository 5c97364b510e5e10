//! Cache key helpers
//!
//! One place for every key format so invalidation and debugging stay
//! greppable.

/// User profile cache key
pub fn user(user_id: &str) -> String {
    format!("user:{user_id}")
}

/// Todo statistics cache key
pub fn todo_stats(user_id: &str) -> String {
    format!("todo:stats:{user_id}")
}

/// AI analysis result cache key
pub fn ai_analysis(user_id: &str) -> String {
    format!("ai:analysis:{user_id}")
}

/// JWT logout blacklist key; `token_hash` is the SHA-256 hex of the token
pub fn jwt_blacklist(token_hash: &str) -> String {
    format!("jwt:blacklist:{token_hash}")
}

/// Fixed-window rate limit key for an action and identifier
pub fn rate_limit(action: &str, identifier: &str) -> String {
    format!("ratelimit:{action}:{identifier}")
}

/// SMS verification code key
pub fn sms_code(purpose: &str, phone: &str) -> String {
    format!("sms:code:{purpose}:{phone}")
}

/// SMS resend throttle key
pub fn sms_rate_limit(phone: &str) -> String {
    format!("sms:ratelimit:{phone}")
}

/// Payment completion lock key
pub fn payment_lock(order_no: &str) -> String {
    format!("payment:lock:{order_no}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(user("u1"), "user:u1");
        assert_eq!(todo_stats("u1"), "todo:stats:u1");
        assert_eq!(rate_limit("POST:/api/todos", "u1"), "ratelimit:POST:/api/todos:u1");
        assert_eq!(sms_code("register", "13800138000"), "sms:code:register:13800138000");
        assert_eq!(payment_lock("TD1"), "payment:lock:TD1");
    }
}
