//! Pure transition rules for the two booking state machines.
//!
//! Each function takes the current state and the requested change and returns
//! either the new state or a [`LifecycleError`]. None of them touch a record or
//! storage; the reducer composes them and the caller persists the result.

use crate::error::LifecycleError;
use crate::status::{BookingStatus, ItemsDeliveryStatus};
use crate::validation::non_blank;
use std::collections::{BTreeSet, VecDeque};

/// Validates an explicit status change.
///
/// The transition table is checked before the cancellation reason, so a
/// cancel request on a terminal booking reports `InvalidTransition`.
///
/// A reason must accompany every cancelling call; blank text does not count.
///
/// # Errors
///
/// - [`LifecycleError::InvalidTransition`] if `requested` is not an allowed successor
/// - [`LifecycleError::MissingReason`] if cancelling without a reason
pub fn transition_status(
    current: BookingStatus,
    requested: BookingStatus,
    cancellation_reason: Option<&str>,
) -> Result<BookingStatus, LifecycleError> {
    if !current.can_transition_to(requested) {
        return Err(LifecycleError::InvalidTransition {
            from: current,
            to: requested,
        });
    }

    if requested == BookingStatus::Cancelled && non_blank(cancellation_reason).is_none() {
        return Err(LifecycleError::MissingReason);
    }

    Ok(requested)
}

/// Status after an operator is assigned.
///
/// Only a `new` booking advances (to `pujari_assigned`); any other status is kept.
#[must_use]
pub const fn status_after_assignment(current: BookingStatus) -> BookingStatus {
    match current {
        BookingStatus::New => BookingStatus::PujariAssigned,
        other => other,
    }
}

/// Items delivery accepts any member of its vocabulary from any member.
///
/// Delivery logistics are driven externally and never gate completion, so there
/// is no table; membership is enforced by the type.
#[must_use]
pub const fn transition_items(
    _current: ItemsDeliveryStatus,
    requested: ItemsDeliveryStatus,
) -> ItemsDeliveryStatus {
    requested
}

/// Every status reachable from `from` through the transition table, including `from`.
#[must_use]
pub fn reachable_from(from: BookingStatus) -> BTreeSet<BookingStatus> {
    let mut seen = BTreeSet::from([from]);
    let mut queue = VecDeque::from([from]);

    while let Some(status) = queue.pop_front() {
        for &next in status.allowed_next() {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = BookingStatus> {
        proptest::sample::select(BookingStatus::ALL.to_vec())
    }

    fn any_reason() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[ a-z]{0,12}")
    }

    #[test]
    fn happy_path() {
        let mut status = BookingStatus::New;
        for next in [
            BookingStatus::PujariAssigned,
            BookingStatus::ItemsPreparing,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
        ] {
            status = transition_status(status, next, None).unwrap();
        }
        assert_eq!(status, BookingStatus::Completed);
    }

    #[test]
    fn pujari_assigned_may_skip_items_preparing() {
        assert_eq!(
            transition_status(BookingStatus::PujariAssigned, BookingStatus::Confirmed, None),
            Ok(BookingStatus::Confirmed)
        );
    }

    #[test]
    fn terminal_cancel_reports_invalid_transition_before_missing_reason() {
        assert_eq!(
            transition_status(BookingStatus::Completed, BookingStatus::Cancelled, None),
            Err(LifecycleError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled,
            })
        );
    }

    #[test]
    fn blank_reason_is_missing() {
        assert_eq!(
            transition_status(BookingStatus::New, BookingStatus::Cancelled, Some("   ")),
            Err(LifecycleError::MissingReason)
        );
        assert_eq!(
            transition_status(BookingStatus::New, BookingStatus::Cancelled, Some("duplicate")),
            Ok(BookingStatus::Cancelled)
        );
    }

    #[test]
    fn assignment_only_advances_new() {
        assert_eq!(
            status_after_assignment(BookingStatus::New),
            BookingStatus::PujariAssigned
        );
        for status in BookingStatus::ALL.into_iter().skip(1) {
            assert_eq!(status_after_assignment(status), status);
        }
    }

    #[test]
    fn everything_is_reachable_from_new() {
        assert_eq!(
            reachable_from(BookingStatus::New),
            BookingStatus::ALL.into_iter().collect()
        );
        assert_eq!(
            reachable_from(BookingStatus::Completed),
            BTreeSet::from([BookingStatus::Completed])
        );
    }

    proptest! {
        #[test]
        fn cancelling_without_reason_fails_from_every_active_status(
            status in proptest::sample::select(BookingStatus::ACTIVE.to_vec())
        ) {
            prop_assert_eq!(
                transition_status(status, BookingStatus::Cancelled, None),
                Err(LifecycleError::MissingReason)
            );
        }

        #[test]
        fn accepted_transitions_follow_the_table(
            current in any_status(),
            requested in any_status(),
            reason in any_reason(),
        ) {
            match transition_status(current, requested, reason.as_deref()) {
                Ok(next) => {
                    prop_assert_eq!(next, requested);
                    prop_assert!(current.allowed_next().contains(&next));
                }
                Err(LifecycleError::InvalidTransition { from, to }) => {
                    prop_assert_eq!(from, current);
                    prop_assert_eq!(to, requested);
                    prop_assert!(!current.can_transition_to(requested));
                }
                Err(LifecycleError::MissingReason) => {
                    prop_assert_eq!(requested, BookingStatus::Cancelled);
                    prop_assert!(non_blank(reason.as_deref()).is_none());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        #[test]
        fn random_walks_never_leave_the_table(
            steps in proptest::collection::vec((any_status(), any_reason()), 0..40)
        ) {
            let mut status = BookingStatus::New;
            let mut visited = vec![status];
            for (requested, reason) in steps {
                if let Ok(next) = transition_status(status, requested, reason.as_deref()) {
                    status = next;
                    visited.push(status);
                }
            }

            let reachable = reachable_from(BookingStatus::New);
            for pair in visited.windows(2) {
                prop_assert!(pair[0].can_transition_to(pair[1]));
            }
            prop_assert!(visited.iter().all(|s| reachable.contains(s)));
            if status.is_terminal() {
                prop_assert!(status.allowed_next().is_empty());
            }
        }
    }
}
