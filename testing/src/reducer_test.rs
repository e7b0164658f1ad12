//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use bmp_core::reducer::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for event assertion functions
type EventAssertion<A> = Box<dyn FnOnce(&[A])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use bmp_testing::ReducerTest;
///
/// ReducerTest::new(BookingReducer::new())
///     .with_env(BookingEnvironment::new(Arc::new(test_clock())))
///     .given_state(BookingState::loaded(booking))
///     .when_action(BookingAction::AssignPujari { pujari })
///     .then_state(|state| {
///         assert_eq!(state.status(), Some(BookingStatus::PujariAssigned));
///     })
///     .then_events(|events| {
///         assert_eq!(events.len(), 1);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    event_assertions: Vec<EventAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            event_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to run (When)
    ///
    /// Actions run in the order they were added; the event assertions see the
    /// events of the last one.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the emitted events (Then)
    #[must_use]
    pub fn then_events<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[A]) + 'static,
    {
        self.event_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut events = Vec::new();
        for action in self.actions {
            events = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.event_assertions {
            assertion(&events);
        }
    }
}

/// Helper assertions for emitted events
pub mod assertions {
    /// Assert that no events were emitted
    ///
    /// # Panics
    ///
    /// Panics if any event is present.
    pub fn assert_no_events<A: std::fmt::Debug>(events: &[A]) {
        assert!(events.is_empty(), "Expected no events, got: {events:?}");
    }

    /// Assert the number of emitted events
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    pub fn assert_events_count<A: std::fmt::Debug>(events: &[A], expected: usize) {
        assert_eq!(
            events.len(),
            expected,
            "Expected {expected} events, got: {events:?}"
        );
    }

    /// Assert that exactly one event was emitted and it matches `predicate`
    ///
    /// # Panics
    ///
    /// Panics if there is not exactly one event or it does not match.
    pub fn assert_single_event<A, F>(events: &[A], predicate: F)
    where
        A: std::fmt::Debug,
        F: FnOnce(&A) -> bool,
    {
        match events {
            [event] => assert!(predicate(event), "Unexpected event: {event:?}"),
            other => panic_on_count(other),
        }
    }

    #[allow(clippy::panic)]
    fn panic_on_count<A: std::fmt::Debug>(events: &[A]) {
        panic!("Expected exactly one event, got: {events:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmp_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        value: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Incremented { to: i32 },
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut TestState,
            action: TestAction,
            _env: &TestEnv,
        ) -> SmallVec<[TestAction; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![TestAction::Incremented { to: state.value }]
                }
                TestAction::Incremented { .. } => SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { value: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.value, 1);
            })
            .then_events(|events| {
                assertions::assert_single_event(events, |e| *e == TestAction::Incremented { to: 1 });
            })
            .run();
    }

    #[test]
    fn test_reducer_test_runs_actions_in_order() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { value: 0 })
            .when_action(TestAction::Increment)
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(state.value, 2))
            .then_events(|events| assertions::assert_events_count(events, 1))
            .run();
    }

    #[test]
    fn test_assertions_no_events() {
        assertions::assert_no_events::<TestAction>(&[]);
    }
}
