//! Value-based identity resolution.
//!
//! Notifications carry no server-assigned id, so the only way to find "our"
//! notification is to list every notification of the budget and look for an
//! exact match on the comparison key.

use crate::{NotificationDescriptor, RemoteNotification};

/// Exact match on all four comparison-key fields (bit-exact threshold).
pub fn is_same_notification(a: &NotificationDescriptor, b: &NotificationDescriptor) -> bool {
    a.key() == b.key()
}

/// First remote notification whose normalized key equals `desired`.
///
/// Remote order is preserved. If several remote notifications share the key,
/// only the first is ever returned; the rest are invisible to the engine.
pub fn find_match(
    remote: &[RemoteNotification],
    desired: &NotificationDescriptor,
) -> Option<NotificationDescriptor> {
    remote
        .iter()
        .map(|r| r.normalize())
        .find(|n| is_same_notification(n, desired))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComparisonOperator, NotificationType, ThresholdType};

    fn remote(threshold: f64, tt: Option<ThresholdType>) -> RemoteNotification {
        RemoteNotification {
            comparison_operator: ComparisonOperator::GreaterThan,
            threshold,
            threshold_type: tt,
            notification_type: NotificationType::Actual,
        }
    }

    #[test]
    fn empty_listing_has_no_match() {
        let desired = remote(80.0, None).normalize();
        assert_eq!(find_match(&[], &desired), None);
    }

    #[test]
    fn missing_threshold_type_does_not_match_absolute_value() {
        let desired = NotificationDescriptor {
            threshold_type: ThresholdType::AbsoluteValue,
            ..remote(80.0, None).normalize()
        };
        assert_eq!(find_match(&[remote(80.0, None)], &desired), None);
    }

    #[test]
    fn negative_zero_threshold_is_a_different_key() {
        let desired = remote(0.0, Some(ThresholdType::Percentage)).normalize();
        assert_eq!(find_match(&[remote(-0.0, None)], &desired), None);
    }
}
