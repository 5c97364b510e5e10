//! Order number generation

use chrono::Utc;
use rand::Rng;

const SUFFIX_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

/// Generate an order number: `TD` + millisecond timestamp + 6 uppercase
/// alphanumerics. The timestamp keeps numbers roughly sortable; the
/// random suffix disambiguates same-millisecond orders. Uniqueness is
/// ultimately enforced by the database constraint.
pub fn generate_order_no() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();
    format!("TD{}{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_numbers_have_the_expected_shape() {
        let no = generate_order_no();
        assert!(no.starts_with("TD"));
        // "TD" + 13-digit millis + 6-char suffix
        assert_eq!(no.len(), 2 + 13 + SUFFIX_LEN);
        assert!(no[2..].bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn order_numbers_do_not_collide_in_practice() {
        let numbers: HashSet<String> = (0..1000).map(|_| generate_order_no()).collect();
        assert_eq!(numbers.len(), 1000);
    }
}
