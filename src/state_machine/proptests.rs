//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::check_write;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ParticipantState> {
    prop_oneof![
        Just(ParticipantState::Idle),
        Just(ParticipantState::Reading),
        Just(ParticipantState::AwaitingWrite),
        Just(ParticipantState::AwaitingReceive),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::UnreadArrived),
        (0usize..3).prop_map(|pending_remaining| Event::EchoesChecked { pending_remaining }),
        (0usize..200).prop_map(|chars_read| Event::ReadFinished { chars_read }),
        Just(Event::ReadAborted),
        ("[a-z ]{0,12}", any::<bool>())
            .prop_map(|(text, greeting)| Event::WriteCommitted { text, greeting }),
        any::<bool>().prop_map(|history_empty| Event::ReplyAbandoned { history_empty }),
    ]
}

/// Apply events the way the coordinator does: errors leave the state alone
fn run(start: ParticipantState, events: Vec<Event>) -> Vec<(ParticipantState, Event, Result<TransitionResult, TransitionError>)> {
    let mut state = start;
    let mut trace = Vec::new();
    for event in events {
        let result = transition(state, event.clone());
        if let Ok(r) = &result {
            state = r.new_state;
        }
        trace.push((state, event, result));
    }
    trace
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A reply is only ever requested on entering AwaitingWrite from Reading
    #[test]
    fn reply_requested_only_into_awaiting_write(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(state, event) {
            if result.has_effect(&Effect::RequestReply) {
                prop_assert_eq!(state, ParticipantState::Reading);
                prop_assert_eq!(result.new_state, ParticipantState::AwaitingWrite);
            }
        }
    }

    /// Reading only begins from Idle
    #[test]
    fn reading_begins_only_from_idle(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(state, event) {
            if result.has_effect(&Effect::BeginReading) {
                prop_assert_eq!(state, ParticipantState::Idle);
                prop_assert_eq!(result.new_state, ParticipantState::Reading);
            }
        }
    }

    /// Committing pending text always lands in AwaitingReceive
    #[test]
    fn commit_lands_in_awaiting_receive(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(state, event) {
            let commits = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::CommitPending { .. }))
                .count();
            prop_assert!(commits <= 1);
            if commits == 1 {
                prop_assert_eq!(result.new_state, ParticipantState::AwaitingReceive);
            }
        }
    }

    /// Non-greeting writes outside AwaitingWrite are rejected
    #[test]
    fn write_guard_matches_check_write(state in arb_state(), text in "[a-z]{1,12}", greeting in any::<bool>()) {
        let result = transition(state, Event::WriteCommitted { text, greeting });
        prop_assert_eq!(result.is_ok(), check_write(state, greeting).is_ok());
    }

    /// Abandoning a reply always settles in Idle
    #[test]
    fn abandon_always_idles(state in arb_state(), history_empty in any::<bool>()) {
        let result = transition(state, Event::ReplyAbandoned { history_empty }).unwrap();
        prop_assert_eq!(result.new_state, ParticipantState::Idle);
    }

    /// Rejected events never move the state, and every sequence keeps
    /// exactly one well-formed state
    #[test]
    fn sequences_stay_consistent(start in arb_state(), events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut previous = start;
        for (state, _event, result) in run(start, events) {
            match result {
                Ok(r) => prop_assert_eq!(r.new_state, state),
                Err(_) => prop_assert_eq!(state, previous),
            }
            previous = state;
        }
    }

    /// Idempotence: a second identical echo check changes nothing
    #[test]
    fn echo_check_is_idempotent(state in arb_state(), pending in 0usize..3) {
        let first = transition(state, Event::EchoesChecked { pending_remaining: pending }).unwrap();
        let second = transition(first.new_state, Event::EchoesChecked { pending_remaining: pending }).unwrap();
        prop_assert_eq!(second.new_state, first.new_state);
    }
}
