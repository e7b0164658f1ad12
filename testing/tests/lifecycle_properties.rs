//! Property tests: arbitrary command sequences against the booking reducer.

#![allow(clippy::unwrap_used)]

use bmp_core::lifecycle::reachable_from;
use bmp_core::reducer::Reducer;
use bmp_core::{
    BookingAction, BookingEnvironment, BookingReducer, BookingState, BookingStatus,
    ItemsDeliveryStatus, LifecycleError, PujariId,
};
use bmp_testing::{fixtures, test_clock};
use proptest::prelude::*;
use std::sync::Arc;

fn any_status() -> impl Strategy<Value = BookingStatus> {
    proptest::sample::select(BookingStatus::ALL.to_vec())
}

fn any_items_status() -> impl Strategy<Value = ItemsDeliveryStatus> {
    proptest::sample::select(ItemsDeliveryStatus::ALL.to_vec())
}

fn any_command() -> impl Strategy<Value = BookingAction> {
    prop_oneof![
        Just(BookingAction::AssignPujari {
            pujari: PujariId::new()
        }),
        (
            any_status(),
            proptest::option::of("[a-z ]{0,8}"),
            proptest::option::of("[a-z ]{0,8}")
        )
            .prop_map(|(status, admin_notes, cancellation_reason)| {
                BookingAction::UpdateStatus {
                    status,
                    admin_notes,
                    cancellation_reason,
                }
            }),
        any_items_status().prop_map(|status| BookingAction::UpdateItemsStatus { status }),
    ]
}

proptest! {
    #[test]
    fn status_stays_within_the_reachable_set(
        commands in proptest::collection::vec(any_command(), 0..50)
    ) {
        let reducer = BookingReducer::new();
        let env = BookingEnvironment::new(Arc::new(test_clock()));
        let mut state = BookingState::loaded(fixtures::booking("BMP-20260211-A3F7"));
        let reachable = reachable_from(BookingStatus::New);

        for command in commands {
            let before = state.booking.clone().unwrap();
            let events = reducer.reduce(&mut state, command, &env);
            let after = state.booking.clone().unwrap();

            prop_assert!(reachable.contains(&after.status));

            if events.is_empty() {
                prop_assert!(state.last_error.is_some());
                prop_assert_eq!(&before, &after);
            } else {
                prop_assert_eq!(events.len(), 1);
                prop_assert!(state.last_error.is_none());
                prop_assert!(after.status == before.status || before.status.can_transition_to(after.status));
                if after.status == BookingStatus::Cancelled && before.status != BookingStatus::Cancelled {
                    prop_assert!(!after.cancellation_reason.trim().is_empty());
                }
            }

            if before.status.is_terminal() {
                prop_assert_eq!(after.status, before.status);
            }
        }
    }

    #[test]
    fn rejections_name_both_states(
        from in any_status(),
        to in any_status(),
    ) {
        let reducer = BookingReducer::new();
        let env = BookingEnvironment::new(Arc::new(test_clock()));
        let mut booking = fixtures::booking("BMP-20260211-A3F7");
        booking.status = from;
        let mut state = BookingState::loaded(booking);

        reducer.reduce(
            &mut state,
            BookingAction::UpdateStatus {
                status: to,
                admin_notes: None,
                cancellation_reason: Some("reason".to_string()),
            },
            &env,
        );

        if from.can_transition_to(to) {
            prop_assert_eq!(state.status(), Some(to));
        } else {
            prop_assert_eq!(
                state.last_error,
                Some(LifecycleError::InvalidTransition { from, to })
            );
        }
    }
}
