//! Engagement classification: which party owes the next response.
//!
//! This is the single canonical implementation. Per-ticket API responses,
//! the admin dashboard aggregate, and the inactivity auto-closer all funnel
//! through [`classify`] / [`classify_latest`]; no caller re-derives the rule
//! from raw reply rows.

use crate::models::reply::ReplySummary;

/// Which party is expected to respond next on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    /// No replies yet, or the customer spoke last.
    NeedsAdminResponse,
    /// A staff member spoke last.
    AwaitingCustomerResponse,
}

impl Engagement {
    pub fn needs_admin_response(&self) -> bool {
        matches!(self, Engagement::NeedsAdminResponse)
    }

    pub fn awaiting_customer(&self) -> bool {
        matches!(self, Engagement::AwaitingCustomerResponse)
    }
}

/// Selects the most recent reply from a history.
///
/// Ordering is by creation time with ties broken by ascending id (the later
/// id wins), so classification stays deterministic under coarse timestamp
/// resolution.
pub fn latest_reply(replies: &[ReplySummary]) -> Option<&ReplySummary> {
    replies
        .iter()
        .max_by_key(|reply| (reply.created_at, reply.id))
}

/// Classifies a ticket from its full reply history.
pub fn classify(replies: &[ReplySummary]) -> Engagement {
    classify_latest(latest_reply(replies))
}

/// Classifies a ticket from a pre-computed latest-reply projection.
///
/// Must agree with [`classify`] applied to the full history the projection
/// was taken from; repositories that fetch only the newest reply per ticket
/// use this entry point.
pub fn classify_latest(latest: Option<&ReplySummary>) -> Engagement {
    match latest {
        None => Engagement::NeedsAdminResponse,
        Some(reply) if reply.is_from_admin => Engagement::AwaitingCustomerResponse,
        Some(_) => Engagement::NeedsAdminResponse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(offset_mins: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(offset_mins)
    }

    fn reply(id: i64, is_from_admin: bool, offset_mins: i64) -> ReplySummary {
        ReplySummary {
            id,
            is_from_admin,
            created_at: at(offset_mins),
        }
    }

    #[test]
    fn test_no_replies_needs_admin_response() {
        assert_eq!(classify(&[]), Engagement::NeedsAdminResponse);
    }

    #[test]
    fn test_customer_spoke_last() {
        let history = [reply(1, true, 0), reply(2, false, 10)];
        assert_eq!(classify(&history), Engagement::NeedsAdminResponse);
    }

    #[test]
    fn test_staff_spoke_last() {
        let history = [reply(1, false, 0), reply(2, true, 10)];
        assert_eq!(classify(&history), Engagement::AwaitingCustomerResponse);
        assert!(classify(&history).awaiting_customer());
    }

    #[test]
    fn test_order_of_slice_is_irrelevant() {
        let newest_first = [reply(2, true, 10), reply(1, false, 0)];
        let oldest_first = [reply(1, false, 0), reply(2, true, 10)];
        assert_eq!(classify(&newest_first), classify(&oldest_first));
    }

    #[test]
    fn test_identical_timestamps_tie_break_by_id() {
        // Same instant: the higher id wins the "latest" slot.
        let history = [reply(5, false, 0), reply(6, true, 0)];
        assert_eq!(classify(&history), Engagement::AwaitingCustomerResponse);

        let history = [reply(6, false, 0), reply(5, true, 0)];
        assert_eq!(classify(&history), Engagement::NeedsAdminResponse);
    }

    #[test]
    fn test_classify_agrees_with_classify_latest() {
        let histories: Vec<Vec<ReplySummary>> = vec![
            vec![],
            vec![reply(1, false, 0)],
            vec![reply(1, true, 0)],
            vec![reply(1, false, 0), reply(2, true, 5)],
            vec![reply(1, true, 0), reply(2, false, 5), reply(3, true, 5)],
            vec![reply(3, false, 0), reply(2, true, 0), reply(1, false, 0)],
        ];

        for history in histories {
            assert_eq!(
                classify(&history),
                classify_latest(latest_reply(&history)),
                "history: {:?}",
                history
            );
        }
    }

    #[test]
    fn test_predicates_mutually_exclusive() {
        for history in [
            vec![reply(1, false, 0)],
            vec![reply(1, true, 0)],
            vec![reply(1, false, 0), reply(2, true, 1)],
        ] {
            let engagement = classify(&history);
            assert_ne!(
                engagement.needs_admin_response(),
                engagement.awaiting_customer()
            );
        }
    }
}
