//! Property-based tests for the dialog state machine
//!
//! These tests verify key invariants hold across arbitrary reply sequences.

use super::state::*;
use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn ctx() -> DialogContext {
    DialogContext::default()
}

fn run(events: Vec<Event>) -> Vec<(SessionRecord, TransitionResult)> {
    let ctx = ctx();
    let mut record = SessionRecord::default();
    let mut trace = Vec::new();
    for event in events {
        let result = transition(&record, &ctx, event);
        let before = std::mem::replace(&mut record, result.new_record.clone());
        trace.push((before, result));
    }
    trace
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Utterances biased toward inputs the wizard understands
fn arb_utterance() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("查詢累積字詞".to_string()),
        3 => prop::sample::select(vec!["康軒", "南一", "翰林"]).prop_map(String::from),
        3 => prop::sample::select(vec!["1", "2", "3", "4", "5", "6", "三", "上", "下學期"])
            .prop_map(String::from),
        2 => (1u32..30).prop_map(|n| n.to_string()),
        2 => prop::sample::select(vec!["照用上次設定", "修改課程", "重新設定"]).prop_map(String::from),
        2 => "[我好喜歡吃飯配菜abc]{1,12}",
        1 => Just("退出".to_string()),
        1 => prop::sample::select(vec!["重設偏好", "我的設定", "印字帖", "平板學寫字", "help"])
            .prop_map(String::from),
        1 => "[a-z0-9 ]{0,8}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        20 => arb_utterance().prop_map(Event::utterance),
        1 => Just(Event::NonText),
        1 => Just(Event::Follow),
        1 => Just(Event::Unfollow),
    ]
}

fn arb_record() -> impl Strategy<Value = SessionRecord> {
    (
        any::<bool>(),
        -3i64..8,
        prop::sample::select(vec!["", "康軒", "南一", "翰林", "其他"]),
        0u32..8,
        0u32..3,
        0u32..20,
        any::<bool>(),
    )
        .prop_map(|(in_query, step, publisher, grade, semester, lesson, prefs)| SessionRecord {
            mode: if in_query { Mode::CumulativeQuery } else { Mode::Idle },
            step,
            publisher: publisher.to_string(),
            grade,
            semester,
            lesson,
            preferred_publisher: if prefs { "南一".to_string() } else { String::new() },
            preferred_grade: if prefs { 2 } else { 0 },
            preferred_semester: if prefs { 1 } else { 0 },
        })
}

// ============================================================================
// State Validity Checkers
// ============================================================================

/// Working fields fill left to right
fn fill_order_holds(r: &SessionRecord) -> bool {
    (r.lesson == 0 || r.semester != 0)
        && (r.semester == 0 || r.grade != 0)
        && (r.grade == 0 || !r.publisher.is_empty())
}

/// Preferred triple is all set or all unset
fn preferences_atomic(r: &SessionRecord) -> bool {
    let set = [
        !r.preferred_publisher.is_empty(),
        r.preferred_grade != 0,
        r.preferred_semester != 0,
    ];
    set.iter().all(|s| *s) || set.iter().all(|s| !*s)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Every reachable record fills left to right
    #[test]
    fn prop_fill_order_holds(events in prop::collection::vec(arb_event(), 0..30)) {
        for (_, result) in run(events) {
            prop_assert!(fill_order_holds(&result.new_record), "{:?}", result.new_record);
        }
    }

    // Invariant 2: Preferred triple is written as a group
    #[test]
    fn prop_preferences_atomic(events in prop::collection::vec(arb_event(), 0..30)) {
        for (_, result) in run(events) {
            prop_assert!(preferences_atomic(&result.new_record), "{:?}", result.new_record);
        }
    }

    // Invariant 3: A changed record is always written
    #[test]
    fn prop_record_changes_are_written(record in arb_record(), event in arb_event()) {
        let result = transition(&record, &ctx(), event);
        if result.new_record != record {
            prop_assert!(
                result.effects.iter().any(Effect::is_write),
                "Record changed but no write: {:?} -> {:?}",
                record,
                result.new_record
            );
        }
    }

    // Invariant 4: Exit twice equals exit once, preferences untouched
    #[test]
    fn prop_exit_idempotent(record in arb_record()) {
        let once = transition(&record, &ctx(), Event::utterance("退出")).new_record;
        let twice = transition(&once, &ctx(), Event::utterance("退出")).new_record;
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.mode, Mode::Idle);
        prop_assert_eq!(&once.preferred_publisher, &record.preferred_publisher);
        prop_assert_eq!(once.preferred_grade, record.preferred_grade);
        prop_assert_eq!(once.preferred_semester, record.preferred_semester);
    }

    // Invariant 5: Unknown step tags always discard the session
    #[test]
    fn prop_unknown_step_discards(
        step in prop_oneof![i64::MIN..-1, 5i64..i64::MAX],
        text in "[我好a-z0-9]{1,6}"
    ) {
        let record = SessionRecord {
            mode: Mode::CumulativeQuery,
            step,
            ..SessionRecord::default()
        };
        let result = transition(&record, &ctx(), Event::utterance(text));
        prop_assert_eq!(result.new_record, SessionRecord::default());
        prop_assert!(result.effects.contains(&Effect::DeleteSession));
    }

    // Invariant 6: Every event except unfollow yields exactly one answer
    #[test]
    fn prop_one_answer_per_event(record in arb_record(), event in arb_event()) {
        let is_unfollow = event == Event::Unfollow;
        let result = transition(&record, &ctx(), event);
        let answers = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Reply(_) | Effect::RunCumulativeQuery { .. }))
            .count();
        prop_assert_eq!(answers, usize::from(!is_unfollow));
    }

    // Invariant 7: Writes come before the answer so a failed write sends nothing
    #[test]
    fn prop_writes_precede_answer(record in arb_record(), event in arb_event()) {
        let result = transition(&record, &ctx(), event);
        let first_answer = result.effects.iter().position(|e| !e.is_write());
        let last_write = result.effects.iter().rposition(Effect::is_write);
        if let (Some(answer), Some(write)) = (first_answer, last_write) {
            prop_assert!(write < answer, "{:?}", result.effects);
        }
    }

    // Invariant 8: Completing the semester step makes the next start a confirm prompt
    #[test]
    fn prop_preferences_round_trip(
        publisher in prop::sample::select(vec!["康軒", "南一", "翰林"]),
        grade in prop::sample::select(vec!["1", "二", "3", "四", "5", "六"]),
        semester in prop::sample::select(vec!["1", "2", "上", "下", "上學期", "下學期"])
    ) {
        let events = ["查詢累積字詞", publisher, grade, semester, "退出", "查詢累積字詞"]
            .into_iter()
            .map(Event::utterance)
            .collect();
        let (_, last) = run(events).pop().unwrap();
        prop_assert_eq!(last.new_record.step(), Ok(Step::ConfirmPreferences));
        prop_assert!(last.new_record.preferences().is_some());
    }
}
