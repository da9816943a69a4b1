//! Low stock alert tests
//!
//! Tests for threshold alerts and their delivery gates:
//! - Property 5: Alert Deduplication
//! - Property 6: Email Cooldown Gating

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use shared::{cooldown_elapsed, is_low_stock, low_stock_message, LOW_STOCK_KIND};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test the threshold boundary is inclusive
    #[test]
    fn test_at_minimum_is_low() {
        assert!(is_low_stock(10, 10));
        assert!(is_low_stock(9, 10));
        assert!(!is_low_stock(11, 10));
    }

    /// Test a zero minimum only alerts on empty stock
    #[test]
    fn test_zero_minimum() {
        assert!(is_low_stock(0, 0));
        assert!(!is_low_stock(1, 0));
    }

    /// Test the fallback minimum applied when a subject does not set one
    #[test]
    fn test_default_minimum() {
        let default_min = 10;

        assert!(is_low_stock(10, default_min));
        assert!(!is_low_stock(11, default_min));
    }

    /// Test the stored notification kind
    #[test]
    fn test_low_stock_kind() {
        assert_eq!(LOW_STOCK_KIND, "low_stock");
    }

    /// Test the alert message names the subject and both quantities
    #[test]
    fn test_alert_message_contents() {
        let message = low_stock_message("Paper cups", 4, 25);

        assert!(message.contains("Paper cups"));
        assert!(message.contains('4'));
        assert!(message.contains("25"));
    }

    /// Test the email cooldown window boundary
    #[test]
    fn test_cooldown_window_boundary() {
        let cooldown = Duration::seconds(360);
        let sent = Utc::now();

        assert!(!cooldown_elapsed(sent, sent + Duration::seconds(300), cooldown));
        assert!(!cooldown_elapsed(sent, sent + Duration::seconds(359), cooldown));
        assert!(cooldown_elapsed(sent, sent + Duration::seconds(360), cooldown));
        assert!(cooldown_elapsed(sent, sent + Duration::seconds(3600), cooldown));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i64> {
        0i64..=1_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// An alert fires exactly when quantity sits at or below the minimum
        #[test]
        fn prop_alert_iff_at_or_below_minimum(
            quantity in quantity_strategy(),
            min_quantity in quantity_strategy()
        ) {
            prop_assert_eq!(is_low_stock(quantity, min_quantity), quantity <= min_quantity);
        }

        /// No alert for any quantity strictly above the minimum
        #[test]
        fn prop_no_alert_above_minimum(
            min_quantity in quantity_strategy(),
            headroom in 1i64..=1_000
        ) {
            prop_assert!(!is_low_stock(min_quantity + headroom, min_quantity));
        }

        /// Once the cooldown has elapsed it stays elapsed
        #[test]
        fn prop_cooldown_elapse_is_monotone(
            cooldown_secs in 1i64..=86_400,
            elapsed_secs in 0i64..=86_400,
            later_secs in 0i64..=86_400
        ) {
            let cooldown = Duration::seconds(cooldown_secs);
            let sent = Utc::now();
            let now = sent + Duration::seconds(elapsed_secs);

            if cooldown_elapsed(sent, now, cooldown) {
                prop_assert!(cooldown_elapsed(sent, now + Duration::seconds(later_secs), cooldown));
            }
        }
    }
}

// ============================================================================
// Integration Test Helpers (for use with actual database)
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    /// In-memory model of the per-enterprise notification feed
    #[derive(Debug, Default)]
    pub struct AlertFeed {
        unread: HashSet<Uuid>,
        total_created: usize,
    }

    impl AlertFeed {
        /// Property 5: Alert Deduplication
        ///
        /// Called after every stock mutation. Creates an alert only when the
        /// subject is low and has no unread alert yet. Returns whether an
        /// alert was created.
        pub fn process_mutation(&mut self, subject: Uuid, quantity: i64, min_quantity: i64) -> bool {
            if !is_low_stock(quantity, min_quantity) {
                return false;
            }
            if !self.unread.insert(subject) {
                return false;
            }
            self.total_created += 1;
            true
        }

        pub fn mark_read(&mut self, subject: Uuid) {
            self.unread.remove(&subject);
        }

        pub fn unread_count(&self) -> usize {
            self.unread.len()
        }

        pub fn total_created(&self) -> usize {
            self.total_created
        }
    }

    /// Property 6: Email Cooldown Gating
    ///
    /// Decide whether an alert email may go out, given when the last one for
    /// this subject was accepted by the provider.
    pub fn may_send_email(
        last_sent_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> bool {
        match last_sent_at {
            Some(sent) => cooldown_elapsed(sent, now, cooldown),
            None => true,
        }
    }

    #[test]
    fn test_repeated_low_mutations_create_one_alert() {
        let mut feed = AlertFeed::default();
        let subject = Uuid::new_v4();

        assert!(feed.process_mutation(subject, 8, 10));
        assert!(!feed.process_mutation(subject, 6, 10));
        assert!(!feed.process_mutation(subject, 2, 10));

        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.total_created(), 1);
    }

    #[test]
    fn test_reading_the_alert_rearms_the_subject() {
        let mut feed = AlertFeed::default();
        let subject = Uuid::new_v4();

        assert!(feed.process_mutation(subject, 8, 10));
        feed.mark_read(subject);
        assert!(feed.process_mutation(subject, 5, 10));

        assert_eq!(feed.total_created(), 2);
    }

    #[test]
    fn test_recovery_does_not_clear_unread_alerts() {
        let mut feed = AlertFeed::default();
        let subject = Uuid::new_v4();

        assert!(feed.process_mutation(subject, 8, 10));
        // Back above the minimum: the unread alert stays until read
        assert!(!feed.process_mutation(subject, 50, 10));
        assert_eq!(feed.unread_count(), 1);
    }

    /// Two mutations racing on the same subject: both may observe no unread
    /// alert, but the insert itself is the gate, so exactly one alert lands.
    #[test]
    fn test_concurrent_low_mutations_create_one_alert() {
        let mut feed = AlertFeed::default();
        let subject = Uuid::new_v4();

        // Both writers passed the threshold check before either inserted
        let first = feed.process_mutation(subject, 7, 10);
        let second = feed.process_mutation(subject, 6, 10);

        assert!(first);
        assert!(!second);
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.total_created(), 1);
    }

    #[test]
    fn test_subjects_alert_independently() {
        let mut feed = AlertFeed::default();
        let cups = Uuid::new_v4();
        let lids = Uuid::new_v4();

        assert!(feed.process_mutation(cups, 3, 10));
        assert!(feed.process_mutation(lids, 9, 10));

        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn test_first_email_always_allowed() {
        let cooldown = Duration::seconds(360);
        assert!(may_send_email(None, Utc::now(), cooldown));
    }

    #[test]
    fn test_email_within_cooldown_is_suppressed() {
        let cooldown = Duration::seconds(360);
        let sent = Utc::now();

        assert!(!may_send_email(Some(sent), sent + Duration::seconds(120), cooldown));
        assert!(may_send_email(Some(sent), sent + Duration::seconds(400), cooldown));
    }

    #[test]
    fn test_failed_delivery_does_not_start_cooldown() {
        let cooldown = Duration::seconds(360);
        let now = Utc::now();

        // Provider rejected the first attempt, so no send was recorded
        let last_sent_at: Option<DateTime<Utc>> = None;
        assert!(may_send_email(last_sent_at, now, cooldown));

        // Only an accepted send arms the window
        let last_sent_at = Some(now);
        assert!(!may_send_email(last_sent_at, now + Duration::seconds(10), cooldown));
    }
}
