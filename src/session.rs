//! Interactive start/retry loop as an explicit state machine
//!
//! The session knows nothing about measurement; it only decides, from user
//! input and run completion, whether the next step is to wait, run or exit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an interactive session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for the user to ask for the first run
    WaitingForStart,
    /// A benchmark run is in progress
    Running,
    /// A run finished; waiting to retry or quit
    WaitingForRetry,
    /// The session is over
    Exit,
}

/// Discrete inputs that drive a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Enter pressed
    Start,
    /// Any other key
    Other,
    /// The current run completed, successfully or not
    RunFinished,
    /// Explicit quit, or end of input
    Quit,
}

impl SessionEvent {
    /// Map one line of user input to an event.
    ///
    /// `None` means the input stream ended.
    pub fn from_input(line: Option<&str>) -> Self {
        match line.map(str::trim) {
            None => Self::Quit,
            Some("") => Self::Start,
            Some(key) if key.eq_ignore_ascii_case("q") || key.eq_ignore_ascii_case("quit") => Self::Quit,
            Some(_) => Self::Other,
        }
    }
}

impl SessionState {
    /// Transition function of the session.
    ///
    /// Events that make no sense in a state leave it unchanged; `Exit` absorbs
    /// everything.
    pub fn next(self, event: SessionEvent) -> Self {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Exit, _) => Exit,
            (_, Quit) => Exit,
            (WaitingForStart, Start) => Running,
            (WaitingForStart, _) => WaitingForStart,
            (Running, RunFinished) => WaitingForRetry,
            (Running, _) => Running,
            (WaitingForRetry, Start) => Running,
            (WaitingForRetry, Other) => Exit,
            (WaitingForRetry, RunFinished) => WaitingForRetry,
        }
    }

    /// Whether this state reads user input
    pub fn awaits_input(&self) -> bool {
        matches!(self, Self::WaitingForStart | Self::WaitingForRetry)
    }

    /// Prompt shown while waiting for input
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::WaitingForStart => Some("Press Enter to start the speed test (q to quit)"),
            Self::WaitingForRetry => Some("Press Enter to run again, any other key to exit"),
            Self::Running | Self::Exit => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::WaitingForStart => "waiting for start",
            Self::Running => "running",
            Self::WaitingForRetry => "waiting for retry",
            Self::Exit => "exit",
        };
        f.write_str(label)
    }
}

/// Session state plus the number of runs started so far
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    runs_started: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::WaitingForStart,
            runs_started: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn runs_started(&self) -> usize {
        self.runs_started
    }

    /// Apply an event and return the new state
    pub fn apply(&mut self, event: SessionEvent) -> SessionState {
        let next = self.state.next(event);
        if next == SessionState::Running && self.state != SessionState::Running {
            self.runs_started += 1;
        }
        self.state = next;
        next
    }
}
