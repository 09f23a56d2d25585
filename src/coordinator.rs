// Serializes exam assignments against the backend. Concurrent gestures for
// the same (subject, date, target) are collapsed to a single request, and
// gestures the drop policy rejects never reach the network at all.
use crate::client::ApiClient;
use crate::model::Id;
use crate::model::validate::{DropPolicy, DropRejection};

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;

/// One drop or move gesture, as produced by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignGesture {
    pub subject: Id,
    pub date: NaiveDate,
    /// `Some` when moving an already placed event, `None` for a fresh drop.
    pub event_id: Option<Id>,
}

impl AssignGesture {
    /// Dedup key. A move of event N and a fresh placement of the same
    /// subject on the same day are distinct operations.
    pub fn key(&self) -> String {
        match self.event_id {
            Some(id) => format!("{}-{}-{}", self.subject, self.date, id),
            None => format!("{}-{}-new", self.subject, self.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Saved,
    /// Saved, but a soft rule was violated; the message is shown to the user.
    SavedWithWarning(String),
    /// An identical gesture was already in flight; nothing was sent.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// Rejected locally before any request was made.
    Invalid(DropRejection),
    /// Rejected by the server; carries its message verbatim.
    Rejected(String),
}

impl AssignError {
    pub fn message(&self) -> String {
        match self {
            AssignError::Invalid(r) => r.message().to_string(),
            AssignError::Rejected(m) => m.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AssignmentCoordinator {
    inflight: Mutex<HashSet<String>>,
}

impl AssignmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates, dedups and submits one gesture. The dedup key is claimed
    /// before the request is issued and released once it settles, whatever
    /// the outcome.
    pub async fn assign(
        &self,
        client: &ApiClient,
        policy: &DropPolicy,
        calendar: Id,
        gesture: &AssignGesture,
    ) -> Result<AssignOutcome, AssignError> {
        if let Err(rejection) = policy.check(gesture.date) {
            return Err(AssignError::Invalid(rejection));
        }

        let key = gesture.key();
        {
            let mut inflight = self.inflight.lock().unwrap();
            if !inflight.insert(key.clone()) {
                return Ok(AssignOutcome::Duplicate);
            }
        }

        let result = client
            .assign_event(calendar, gesture.subject, gesture.date, gesture.event_id)
            .await;

        self.inflight.lock().unwrap().remove(&key);

        match result {
            Ok(response) => Ok(match response.warning {
                Some(w) => AssignOutcome::SavedWithWarning(w.message),
                None => AssignOutcome::Saved,
            }),
            Err(message) => Err(AssignError::Rejected(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_and_move_gestures_have_distinct_keys() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let fresh = AssignGesture {
            subject: 5,
            date,
            event_id: None,
        };
        let moved = AssignGesture {
            subject: 5,
            date,
            event_id: Some(9),
        };
        assert_eq!(fresh.key(), "5-2026-02-10-new");
        assert_eq!(moved.key(), "5-2026-02-10-9");
        assert_ne!(fresh.key(), moved.key());
    }
}
