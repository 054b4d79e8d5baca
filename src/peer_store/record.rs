//! Per-peer record and its state machine.

use crate::channel::PeerChannel;
use crate::peer_store::routes::RouteSet;
use crate::peer_store::types::{PeerAddress, Protocol};
use crate::peer_store::{INITIAL_FAILED_BACKOFF, MAX_FAILED_ATTEMPTS_RTC, MAX_FAILED_ATTEMPTS_WS};

/// Lifecycle state of a known peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerState {
    /// Learned about, never dialed.
    New,
    /// A dial is in flight.
    Connecting,
    /// Live connection.
    Connected,
    /// Had a connection before, currently disconnected.
    Tried,
    /// Last dial failed.
    Failed,
    /// Excluded from selection until `banned_until`.
    Banned,
}

impl PeerState {
    pub fn is_connected(self) -> bool {
        self == PeerState::Connected
    }

    pub fn is_banned(self) -> bool {
        self == PeerState::Banned
    }

    /// States the dialer may pick candidates from.
    pub fn is_dialable(self) -> bool {
        matches!(self, PeerState::New | PeerState::Tried | PeerState::Failed)
    }
}

/// Input to the state machine reducer; one variant per book transition
/// method.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    Connecting,
    Connected { channel: PeerChannel },
    Disconnected { channel: Option<PeerChannel> },
    Failure,
    Unroutable { channel: PeerChannel },
    Ban { duration_ms: u64 },
}

/// Everything the book tracks for one peer address.
#[derive(Debug)]
pub struct PeerRecord {
    pub address: PeerAddress,
    pub state: PeerState,
    pub failed_attempts: u32,
    /// Present iff `state == Banned`.
    pub banned_until: Option<u64>,
    /// Duration of the next failure ban; doubles per escalation.
    pub ban_backoff: u64,
    pub last_connected: Option<u64>,
    pub routes: RouteSet,
}

impl PeerRecord {
    pub fn new(address: PeerAddress) -> Self {
        PeerRecord {
            address,
            state: PeerState::New,
            failed_attempts: 0,
            banned_until: None,
            ban_backoff: INITIAL_FAILED_BACKOFF,
            last_connected: None,
            routes: RouteSet::new(),
        }
    }

    /// Failed dials tolerated before the failure-ban policy kicks in.
    pub fn max_failed_attempts(&self) -> u32 {
        match self.address.protocol() {
            Protocol::Rtc => MAX_FAILED_ATTEMPTS_RTC,
            Protocol::Ws | Protocol::Dumb => MAX_FAILED_ATTEMPTS_WS,
        }
    }

    /// Whether the current ban (if any) came from the failure policy.
    pub fn is_failure_ban(&self) -> bool {
        self.failed_attempts >= self.max_failed_attempts()
    }

    /// The transition table. `Some(state)` is the state after the event
    /// (possibly unchanged); `None` means the event is illegal in the
    /// current state and must have no effect.
    pub fn next_state(&self, event: &PeerEvent) -> Option<PeerState> {
        use PeerState::*;

        if self.state == Banned {
            return match event {
                // A refreshed ban extends the exclusion.
                PeerEvent::Ban { .. } => Some(Banned),
                // Seeds are never observably banned; an inbound seed
                // connection must be recoverable.
                PeerEvent::Connected { .. } if self.address.is_seed() => Some(Connected),
                _ => None,
            };
        }

        match event {
            PeerEvent::Connecting => match self.state {
                New | Tried | Failed => Some(Connecting),
                Connecting => Some(Connecting),
                Connected => None,
                Banned => None,
            },
            PeerEvent::Connected { .. } => Some(Connected),
            PeerEvent::Disconnected { .. } => match self.state {
                New => None,
                Connecting | Connected => Some(Tried),
                Tried => Some(Tried),
                Failed => Some(Failed),
                Banned => None,
            },
            PeerEvent::Failure => Some(Failed),
            PeerEvent::Unroutable { .. } => Some(self.state),
            PeerEvent::Ban { .. } => Some(Banned),
        }
    }
}
