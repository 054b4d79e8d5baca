use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifies one open connection on the transport layer.
///
/// The address book never dereferences a channel; it only compares ids and
/// reads the close observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl From<u64> for ChannelId {
    fn from(id: u64) -> ChannelId {
        ChannelId(id)
    }
}

/// Opaque handle to a connection owned by the transport layer.
///
/// Clones share the close observation; equality is by channel id.
#[derive(Clone)]
pub struct PeerChannel {
    id: ChannelId,
    closed_by_remote: Arc<AtomicBool>,
}

impl PeerChannel {
    pub fn new(id: ChannelId) -> Self {
        PeerChannel {
            id,
            closed_by_remote: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Whether the remote end initiated the close of this channel.
    pub fn closed_by_remote(&self) -> bool {
        self.closed_by_remote.load(Ordering::Acquire)
    }

    /// Recorded by the transport layer when it observes a remote close.
    pub fn mark_closed_by_remote(&self) {
        self.closed_by_remote.store(true, Ordering::Release);
    }
}

impl PartialEq for PeerChannel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PeerChannel {}

impl fmt::Debug for PeerChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PeerChannel({})", self.id.0)
    }
}
