//! In-memory port doubles shared by the service tests.

use std::sync::Mutex;

use skillbridge_domain::error::BackendError;
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination};
use skillbridge_domain::schedule::Schedule;

use crate::ports::{Backend, ScheduleStore, StateSample};

/// What a [`RecordingBackend`] answers.
#[derive(Clone, Copy)]
pub(crate) enum Outcome {
    Succeed,
    Fail,
}

/// Backend recording every call it receives.
pub(crate) struct RecordingBackend {
    kind: BackendKind,
    outcome: Outcome,
    state: Option<StateSample>,
    pub(crate) sent: Mutex<Vec<BackendPayload>>,
    pub(crate) queried: Mutex<Vec<Destination>>,
}

impl RecordingBackend {
    pub(crate) fn new(kind: BackendKind, outcome: Outcome) -> Self {
        Self {
            kind,
            outcome,
            state: None,
            sent: Mutex::new(Vec::new()),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_state(mut self, state: StateSample) -> Self {
        self.state = Some(state);
        self
    }

    pub(crate) fn sent(&self) -> Vec<BackendPayload> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.sent.lock().unwrap().len() + self.queried.lock().unwrap().len()
    }
}

impl Backend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn send(&self, payload: BackendPayload) -> Result<(), BackendError> {
        self.sent.lock().unwrap().push(payload);
        match self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(BackendError::Connection("broker unreachable".to_string())),
        }
    }

    async fn query(&self, destination: Destination) -> Result<StateSample, BackendError> {
        self.queried.lock().unwrap().push(destination);
        match (self.outcome, &self.state) {
            (Outcome::Succeed, Some(state)) => Ok(state.clone()),
            (Outcome::Succeed, None) => Err(BackendError::Unsupported("query")),
            (Outcome::Fail, _) => Err(BackendError::Status { status: 503 }),
        }
    }
}

/// Schedule store answering the same thing for every zone.
pub(crate) enum FixedSchedules {
    Found(f64),
    Nothing,
    Broken,
}

impl ScheduleStore for FixedSchedules {
    async fn latest_for_zone(&self, zone: &str) -> Result<Option<Schedule>, BackendError> {
        match self {
            Self::Found(target) => Ok(Some(Schedule {
                zone: zone.to_string(),
                temperature_target: *target,
            })),
            Self::Nothing => Ok(None),
            Self::Broken => Err(BackendError::Transport("history unavailable".to_string())),
        }
    }
}
