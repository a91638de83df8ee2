//! Effects produced by state transitions

use super::state::Coordinate;
use crate::reply::Reply;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the new session record
    PersistSession,

    /// Remove the session record entirely
    DeleteSession,

    /// Send a reply to the user
    Reply(Reply),

    /// Aggregate the cumulative set for `coordinate` and reply with the
    /// learned / not-learned split of `phrase`
    RunCumulativeQuery {
        coordinate: Coordinate,
        phrase: String,
    },
}

impl Effect {
    pub fn reply(reply: Reply) -> Self {
        Effect::Reply(reply)
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Effect::PersistSession | Effect::DeleteSession)
    }
}
