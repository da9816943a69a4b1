//! Low stock alert decisions.

use chrono::{DateTime, Duration, Utc};

/// Notification kind stored for threshold alerts
pub const LOW_STOCK_KIND: &str = "low_stock";

/// A subject is low on stock when it sits at or below its minimum.
pub fn is_low_stock(quantity: i64, min_quantity: i64) -> bool {
    quantity <= min_quantity
}

/// Whether the email cooldown window has fully elapsed since the last alert.
pub fn cooldown_elapsed(last_sent_at: DateTime<Utc>, now: DateTime<Utc>, cooldown: Duration) -> bool {
    now.signed_duration_since(last_sent_at) >= cooldown
}

/// Alert message shown in the notification feed and sent by email
pub fn low_stock_message(subject_name: &str, quantity: i64, min_quantity: i64) -> String {
    format!(
        "{} is low on stock: {} remaining (minimum {})",
        subject_name, quantity, min_quantity
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        assert!(is_low_stock(9, 10));
        assert!(is_low_stock(10, 10));
        assert!(!is_low_stock(11, 10));
        assert!(is_low_stock(0, 0));
    }

    #[test]
    fn test_cooldown_boundary() {
        let cooldown = Duration::seconds(360);
        let sent = Utc::now();

        assert!(!cooldown_elapsed(sent, sent + Duration::seconds(359), cooldown));
        assert!(cooldown_elapsed(sent, sent + Duration::seconds(360), cooldown));
        assert!(cooldown_elapsed(sent, sent + Duration::seconds(720), cooldown));
    }

    #[test]
    fn test_low_stock_message_mentions_quantities() {
        let message = low_stock_message("AA batteries", 3, 10);
        assert!(message.contains("AA batteries"));
        assert!(message.contains('3'));
        assert!(message.contains("10"));
    }
}
