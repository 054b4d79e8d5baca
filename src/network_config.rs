use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use log::debug;

use crate::errors::{ConfigError, Error};
use crate::peer_store::types::{IdentityKey, PeerAddress, Protocol};
use crate::peer_store::HOUSEKEEPING_INTERVAL;

/// Network-layer configuration consumed by the address book.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Our own advertised address; never admitted into the book.
    pub local_address: PeerAddress,
    /// Bootstrap addresses injected at construction. Defaults to the
    /// embedded seed list.
    pub seeds: Vec<PeerAddress>,
    pub housekeeping_interval: Duration,
}

impl NetworkConfig {
    pub fn new(local_address: PeerAddress) -> Result<Self, Error> {
        if local_address.is_seed() {
            return Err(ConfigError::SeedLocalAddress.into());
        }
        if local_address.protocol() == Protocol::Rtc && local_address.peer_id.is_none() {
            return Err(ConfigError::LocalPeerIdMissing.into());
        }
        debug!(target: "network", "network config with local address {:?}", local_address.identity_key);
        Ok(NetworkConfig {
            local_address,
            seeds: default_seeds(),
            housekeeping_interval: HOUSEKEEPING_INTERVAL,
        })
    }

    /// Replace the seed list; tests and private networks inject their own.
    pub fn with_seeds(mut self, seeds: Vec<PeerAddress>) -> Self {
        self.seeds = seeds;
        self
    }
}

/// Bootstrap identities baked into the binary.
const SEED_KEYS: [[u8; 32]; 3] = [
    [
        0x3c, 0x91, 0x5f, 0x0a, 0x7e, 0x22, 0xd4, 0x48, 0xb0, 0x6d, 0xe1, 0x83, 0x4f, 0x2a, 0x9c,
        0x55, 0x1b, 0xc8, 0x70, 0x34, 0xaa, 0x16, 0xe9, 0x02, 0x8d, 0x5e, 0xf3, 0x67, 0x29, 0xb1,
        0x44, 0xd0,
    ],
    [
        0xa7, 0x04, 0xc2, 0x6e, 0x31, 0x9b, 0x58, 0xec, 0x12, 0x85, 0x4a, 0xd9, 0x23, 0xf6, 0x0b,
        0x78, 0xce, 0x41, 0x97, 0x1d, 0x62, 0xb5, 0x08, 0xfa, 0x36, 0xc0, 0x7f, 0x93, 0x2e, 0x64,
        0xdb, 0x19,
    ],
    [
        0x58, 0xe6, 0x2b, 0x90, 0x47, 0xcd, 0x14, 0x7a, 0xf1, 0x3d, 0xb8, 0x05, 0x6c, 0x82, 0xe4,
        0x39, 0x50, 0xad, 0x26, 0xf8, 0x9e, 0x03, 0x71, 0xba, 0x45, 0xdc, 0x18, 0x87, 0x60, 0x2f,
        0xc9, 0x9a,
    ],
];

const SEED_HOSTS: [IpAddr; 3] = [
    IpAddr::V4(Ipv4Addr::new(163, 172, 89, 12)),
    IpAddr::V4(Ipv4Addr::new(95, 216, 34, 201)),
    IpAddr::V4(Ipv4Addr::new(144, 76, 110, 7)),
];

/// The embedded seed list; every entry carries the seed timestamp (`0`).
pub fn default_seeds() -> Vec<PeerAddress> {
    SEED_KEYS
        .iter()
        .zip(SEED_HOSTS.iter())
        .map(|(key, host)| PeerAddress::seed(IdentityKey(*key), Some(*host)))
        .collect()
}
