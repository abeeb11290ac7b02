use std::fmt;

use log::debug;
use tokio::sync::watch;

/// Signaling states of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// SETUP request sent, awaiting the peer's answer.
    PendingOutgoing,
    /// SETUP request received, awaiting the local answer.
    PendingIncoming,
    /// Lost a setup glare; awaiting the local re-answer.
    ConflictResolution,
    /// Both sides have exchanged SETUP; the data channel is not yet up.
    Answered,
    /// The application reported the data channel established.
    DatachanEstablished,
    /// UPDATE request sent, awaiting the response.
    UpdateSent,
    /// UPDATE request received, awaiting the local response.
    UpdateRecv,
    /// HANGUP request sent, awaiting the HANGUP response.
    HangupSent,
    /// HANGUP received; terminal shortly after.
    HangupRecv,
    /// Closing; the close notification fires once and the application is
    /// expected to destroy the connection.
    Terminating,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::PendingOutgoing => "PendingOutgoing",
            Self::PendingIncoming => "PendingIncoming",
            Self::ConflictResolution => "ConflictResolution",
            Self::Answered => "Answered",
            Self::DatachanEstablished => "DatachanEstablished",
            Self::UpdateSent => "UpdateSent",
            Self::UpdateRecv => "UpdateRecv",
            Self::HangupSent => "HangupSent",
            Self::HangupRecv => "HangupRecv",
            Self::Terminating => "Terminating",
        };
        f.write_str(name)
    }
}

/// Direction of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dir {
    /// No SETUP has been sent or received yet.
    #[default]
    Unknown,
    /// The peer initiated the call.
    Incoming,
    /// This endpoint initiated the call.
    Outgoing,
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        };
        f.write_str(name)
    }
}

/// Outcome of glare resolution, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conflict {
    /// No glare occurred.
    #[default]
    None,
    /// This endpoint won the glare and kept its own offer.
    Winner,
    /// This endpoint lost the glare and answered the peer's offer.
    Loser,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Winner => "winner",
            Self::Loser => "loser",
        };
        f.write_str(name)
    }
}

pub(crate) struct StateMachine {
    state: State,
    state_change_notifier: Option<watch::Sender<State>>,
}

impl StateMachine {
    pub fn new(state: State) -> Self {
        Self {
            state,
            state_change_notifier: None,
        }
    }

    /// Subscribe to state changes.
    ///
    /// Returns a watch::Receiver that can be used to monitor transitions.
    pub fn subscribe_state(&mut self) -> watch::Receiver<State> {
        match self.state_change_notifier {
            Some(ref sender) => sender.subscribe(),
            None => {
                let (sender, recv) = watch::channel(self.state);

                self.state_change_notifier = Some(sender);

                recv
            }
        }
    }

    fn notify_state_change(&self, state: State) {
        if let Some(sender) = self.state_change_notifier.as_ref() {
            let _result = sender.send(state);
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn set_state(&mut self, state: State) {
        debug!("state: {} -> {}", self.state, state);

        self.state = state;

        self.notify_state_change(state);
    }
}
