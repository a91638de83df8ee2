//! Pure state transition function
//!
//! Given the stored session record and one channel event, decide the next
//! record and the effects to run. No I/O happens here.

use super::state::{Mode, SessionRecord, Step, UnknownStep};
use super::{DialogContext, Effect, Event};
use crate::command::{Command, ConfirmChoice, EXIT_KEYWORD};
use crate::lexicon::{self, Publisher};
use crate::reply::{self, Reply};

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_record: SessionRecord,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(record: SessionRecord) -> Self {
        Self {
            new_record: record,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Record changed: persist it, then reply
    fn persisted(record: SessionRecord, reply: Reply) -> Self {
        Self::new(record)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply(reply))
    }

    /// Record untouched: reply only
    fn unchanged(record: &SessionRecord, reply: Reply) -> Self {
        Self::new(record.clone()).with_effect(Effect::reply(reply))
    }

    /// The reply effect, if any
    #[cfg(test)]
    pub fn reply(&self) -> Option<&Reply> {
        self.effects.iter().find_map(|e| match e {
            Effect::Reply(reply) => Some(reply),
            _ => None,
        })
    }
}

/// Pure transition function
pub fn transition(record: &SessionRecord, context: &DialogContext, event: Event) -> TransitionResult {
    match event {
        Event::Unfollow => {
            TransitionResult::new(SessionRecord::default()).with_effect(Effect::DeleteSession)
        }
        Event::Follow => TransitionResult::unchanged(record, reply::welcome()),
        Event::NonText => TransitionResult::unchanged(record, reply::text_only()),
        Event::Utterance { text } => {
            let text = text.trim();

            // Exit wins over everything, in every mode
            if text == EXIT_KEYWORD {
                return TransitionResult::persisted(record.exited(), reply::exit_confirmation());
            }

            if record.in_query() {
                query_step(record, context, text)
            } else {
                dispatch_command(record, context, text)
            }
        }
    }
}

// ============================================================
// Idle mode: flat command dispatch
// ============================================================

fn dispatch_command(record: &SessionRecord, context: &DialogContext, text: &str) -> TransitionResult {
    let Some(command) = Command::parse(text) else {
        return TransitionResult::unchanged(record, reply::unknown_command());
    };

    match command {
        Command::StartQuery => start_query(record),
        Command::ResetPreferences => {
            if record.has_any_preference() {
                let mut next = record.clone();
                next.forget_preferences();
                TransitionResult::persisted(next, reply::preferences_cleared())
            } else {
                TransitionResult::unchanged(record, reply::no_preferences_to_clear())
            }
        }
        Command::ShowSettings => TransitionResult::unchanged(record, reply::settings(record.preferences())),
        Command::PrintWorksheet => TransitionResult::unchanged(
            record,
            reply::worksheet(&context.worksheet_url, record.preferences()),
        ),
        Command::TabletPractice => {
            TransitionResult::unchanged(record, reply::tablet_practice(&context.tablet_practice_url))
        }
        Command::Help => TransitionResult::unchanged(record, reply::help()),
    }
}

fn start_query(record: &SessionRecord) -> TransitionResult {
    let mut next = record.exited();
    next.mode = Mode::CumulativeQuery;

    if let Some(prefs) = record.preferences() {
        next.publisher = prefs.publisher.name().to_string();
        next.grade = prefs.grade;
        next.semester = prefs.semester;
        next.set_step(Step::ConfirmPreferences);
        TransitionResult::persisted(next, reply::confirm_preferences_prompt(prefs))
    } else {
        next.set_step(Step::AwaitingPublisher);
        TransitionResult::persisted(next, reply::publisher_prompt())
    }
}

// ============================================================
// Query mode: wizard steps
// ============================================================

fn query_step(record: &SessionRecord, context: &DialogContext, text: &str) -> TransitionResult {
    let step = match record.step() {
        Ok(step) => step,
        Err(UnknownStep(tag)) => {
            tracing::warn!(step = tag, "Discarding session with unknown step");
            return discard_session();
        }
    };

    let mut next = record.clone();
    match step {
        Step::ConfirmPreferences => match ConfirmChoice::parse(text) {
            Some(choice @ (ConfirmChoice::ReuseAsIs | ConfirmChoice::ReuseButEdit)) => {
                let Some(prefs) = record.working_preferences() else {
                    tracing::warn!(publisher = %record.publisher, "Confirm step without usable settings");
                    return discard_session();
                };
                next.set_step(Step::AwaitingLesson);
                let (name, grade, semester) = (prefs.publisher.name(), prefs.grade, prefs.semester);
                let reply = if choice == ConfirmChoice::ReuseAsIs {
                    reply::reuse_preferences(name, grade, semester)
                } else {
                    reply::edit_lesson(name, grade, semester)
                };
                TransitionResult::persisted(next, reply)
            }
            Some(ConfirmChoice::StartOver) => {
                next.clear_working();
                next.set_step(Step::AwaitingPublisher);
                TransitionResult::persisted(next, reply::restart_publisher_prompt())
            }
            None => TransitionResult::unchanged(record, reply::confirm_reprompt()),
        },

        Step::AwaitingPublisher => match Publisher::from_name(text) {
            Some(publisher) => {
                next.publisher = publisher.name().to_string();
                next.set_step(Step::AwaitingGrade);
                TransitionResult::persisted(next, reply::grade_prompt(publisher.name()))
            }
            None => TransitionResult::unchanged(record, reply::publisher_reprompt()),
        },

        Step::AwaitingGrade => match lexicon::parse_grade(text) {
            Some(grade) => {
                next.grade = grade;
                next.set_step(Step::AwaitingSemester);
                let reply = reply::semester_prompt(&next.publisher, grade);
                TransitionResult::persisted(next, reply)
            }
            None => TransitionResult::unchanged(record, reply::grade_reprompt()),
        },

        Step::AwaitingSemester => match lexicon::parse_semester(text) {
            Some(semester) => {
                next.semester = semester;
                next.remember_working();
                next.set_step(Step::AwaitingLesson);
                let reply = reply::lesson_prompt(&next.publisher, next.grade, semester);
                TransitionResult::persisted(next, reply)
            }
            None => TransitionResult::unchanged(record, reply::semester_reprompt()),
        },

        Step::AwaitingLesson => match lexicon::parse_lesson(text) {
            Some(lesson) => {
                next.lesson = lesson;
                next.remember_working();
                next.set_step(Step::Querying);
                match next.coordinate() {
                    Some(coordinate) => {
                        TransitionResult::persisted(next, reply::phrase_prompt(&coordinate))
                    }
                    None => {
                        tracing::warn!(publisher = %record.publisher, "Lesson step reached without a full coordinate");
                        discard_session()
                    }
                }
            }
            None => TransitionResult::unchanged(record, reply::lesson_reprompt()),
        },

        Step::Querying => {
            if !lexicon::is_query_phrase(text, context.max_query_chars) {
                return TransitionResult::unchanged(record, reply::phrase_reprompt(context.max_query_chars));
            }
            match record.coordinate() {
                Some(coordinate) => TransitionResult::new(record.clone()).with_effect(
                    Effect::RunCumulativeQuery {
                        coordinate,
                        phrase: text.to_string(),
                    },
                ),
                None => {
                    tracing::warn!(publisher = %record.publisher, "Query step without a full coordinate");
                    discard_session()
                }
            }
        }
    }
}

/// Unrecoverable state: drop the whole record and ask for a restart
fn discard_session() -> TransitionResult {
    TransitionResult::new(SessionRecord::default())
        .with_effect(Effect::DeleteSession)
        .with_effect(Effect::reply(reply::session_error()))
}
