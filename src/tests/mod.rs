mod housekeeping;
mod routes;

use std::cell::Cell;
use std::net::{IpAddr, Ipv4Addr};
use std::rc::Rc;

use rand::Rng;

use crate::{
    AlwaysOnline, ChannelId, IdentityKey, NetworkConfig, PeerAddress, PeerAddressBook,
    PeerChannel, PeerId, Platform, Services,
};

fn random_identity() -> IdentityKey {
    let mut key = [0u8; 32];
    rand::thread_rng().fill(&mut key[..]);
    IdentityKey(key)
}

fn random_peer_id() -> PeerId {
    let mut id = [0u8; 16];
    rand::thread_rng().fill(&mut id[..]);
    PeerId(id)
}

fn ws_addr(timestamp: u64) -> PeerAddress {
    PeerAddress::new_ws(
        random_identity(),
        Services::FULL,
        timestamp,
        Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
    )
}

fn rtc_addr(timestamp: u64, distance: u8) -> PeerAddress {
    PeerAddress::new_rtc(
        random_identity(),
        random_peer_id(),
        Services::LIGHT,
        timestamp,
        distance,
    )
}

fn dumb_addr(timestamp: u64) -> PeerAddress {
    PeerAddress::new_dumb(random_identity(), Services::NANO, timestamp)
}

fn seed_addr() -> PeerAddress {
    PeerAddress::seed(random_identity(), None)
}

fn channel(id: u64) -> PeerChannel {
    PeerChannel::new(ChannelId(id))
}

struct TestPlatform {
    online: Cell<bool>,
}

impl TestPlatform {
    fn new(online: bool) -> Rc<Self> {
        Rc::new(TestPlatform {
            online: Cell::new(online),
        })
    }
}

impl Platform for TestPlatform {
    fn is_online(&self) -> bool {
        self.online.get()
    }
}

fn test_config() -> NetworkConfig {
    NetworkConfig::new(ws_addr(faketime::unix_time_as_millis()))
        .expect("valid network config")
        .with_seeds(Vec::new())
}

fn test_book() -> PeerAddressBook {
    PeerAddressBook::new(&test_config(), Rc::new(AlwaysOnline))
}
