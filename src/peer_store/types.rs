use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

use crate::peer_store::{MAX_AGE_DUMB, MAX_AGE_RTC, MAX_AGE_WS};

/// Long-term identity of a peer; two addresses are the same peer iff their
/// identity keys are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(pub [u8; 32]);

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IdentityKey({:02x}{:02x}{:02x}{:02x}..)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Short id RTC peers are signalled under.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub [u8; 16]);

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PeerId({:02x}{:02x}{:02x}{:02x}..)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Transport a peer is reachable over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Directly dialable websocket-style server.
    Ws,
    /// Browser peer reachable through relayed WebRTC signalling.
    Rtc,
    /// Outbound-only client; cannot be dialed at all.
    Dumb,
}

impl Protocol {
    /// How old an address of this transport may get before it is stale.
    pub fn max_age(self) -> u64 {
        match self {
            Protocol::Ws => MAX_AGE_WS,
            Protocol::Rtc => MAX_AGE_RTC,
            Protocol::Dumb => MAX_AGE_DUMB,
        }
    }
}

bitflags::bitflags! {
    /// Protocol selector used by dialer queries.
    pub struct ProtocolFlags: u8 {
        const WS = 0b1;
        const RTC = 0b10;
        const DUMB = 0b100;
    }
}

impl From<Protocol> for ProtocolFlags {
    fn from(protocol: Protocol) -> ProtocolFlags {
        match protocol {
            Protocol::Ws => ProtocolFlags::WS,
            Protocol::Rtc => ProtocolFlags::RTC,
            Protocol::Dumb => ProtocolFlags::DUMB,
        }
    }
}

bitflags::bitflags! {
    /// Services a peer advertises.
    pub struct Services: u32 {
        /// Keeps headers only, needs proofs for everything else
        const NANO = 0b1;
        /// Keeps the recent chain state
        const LIGHT = 0b10;
        /// Keeps full history
        const FULL = 0b100;
    }
}

/// One advertised way to reach a peer.
///
/// Equality and hashing are by identity key only; the remaining fields are
/// claims that get refreshed as newer advertisements arrive.
#[derive(Debug, Clone)]
pub struct PeerAddress {
    pub protocol: Protocol,
    pub identity_key: IdentityKey,
    pub services: Services,
    /// Milliseconds since the unix epoch; `0` marks a seed.
    pub timestamp: u64,
    /// Observed source IP, when the transport could attest one.
    pub net_address: Option<IpAddr>,
    /// Relay hops to the peer; meaningful for RTC only.
    pub distance: u8,
    /// Signalling id; RTC only.
    pub peer_id: Option<PeerId>,
}

impl PeerAddress {
    pub fn new_ws(
        identity_key: IdentityKey,
        services: Services,
        timestamp: u64,
        net_address: Option<IpAddr>,
    ) -> Self {
        PeerAddress {
            protocol: Protocol::Ws,
            identity_key,
            services,
            timestamp,
            net_address,
            distance: 0,
            peer_id: None,
        }
    }

    pub fn new_rtc(
        identity_key: IdentityKey,
        peer_id: PeerId,
        services: Services,
        timestamp: u64,
        distance: u8,
    ) -> Self {
        PeerAddress {
            protocol: Protocol::Rtc,
            identity_key,
            services,
            timestamp,
            net_address: None,
            distance,
            peer_id: Some(peer_id),
        }
    }

    pub fn new_dumb(identity_key: IdentityKey, services: Services, timestamp: u64) -> Self {
        PeerAddress {
            protocol: Protocol::Dumb,
            identity_key,
            services,
            timestamp,
            net_address: None,
            distance: 0,
            peer_id: None,
        }
    }

    /// A bootstrap address baked into the binary.
    pub fn seed(identity_key: IdentityKey, net_address: Option<IpAddr>) -> Self {
        PeerAddress::new_ws(identity_key, Services::FULL, 0, net_address)
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_seed(&self) -> bool {
        self.timestamp == 0
    }

    /// Whether the advertisement is older than the transport allows.
    ///
    /// Pure arithmetic; the seed exemptions live in the policies that
    /// consult this, not here.
    pub fn exceeds_age(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) > self.protocol.max_age()
    }
}

impl PartialEq for PeerAddress {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key == other.identity_key
    }
}

impl Eq for PeerAddress {}

impl Hash for PeerAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key.hash(state);
    }
}
