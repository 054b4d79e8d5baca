//! The peer address book façade.
//!
//! Single owner of the [`AddressStore`]; the network layer reports what it
//! observes (`add`, the transition methods) and asks for connection
//! candidates (`query`, scoring). All methods are synchronous and never
//! suspend; consistency comes from the single-threaded execution model,
//! not from locks.

use std::cmp;
use std::rc::Rc;

use faketime::unix_time_as_millis;
use log::{debug, trace, warn};

use crate::channel::PeerChannel;
use crate::events::{AddressBookEvent, Notifier, SubscriberId};
use crate::network_config::NetworkConfig;
use crate::peer_store::address_store::AddressStore;
use crate::peer_store::record::{PeerEvent, PeerRecord, PeerState};
use crate::peer_store::score;
use crate::peer_store::types::{
    IdentityKey, PeerAddress, PeerId, Protocol, ProtocolFlags, Services,
};
use crate::peer_store::{
    INITIAL_FAILED_BACKOFF, MAX_DISTANCE, MAX_FAILED_BACKOFF, MAX_TIMESTAMP_DRIFT,
};
use crate::platform::Platform;

pub struct PeerAddressBook {
    store: AddressStore,
    local_address: PeerAddress,
    platform: Rc<dyn Platform>,
    notifier: Notifier<AddressBookEvent>,
}

impl PeerAddressBook {
    /// Build the book and inject the configured seed addresses.
    pub fn new(config: &NetworkConfig, platform: Rc<dyn Platform>) -> Self {
        let mut book = PeerAddressBook {
            store: AddressStore::new(),
            local_address: config.local_address.clone(),
            platform,
            notifier: Notifier::new(),
        };
        book.add(None, config.seeds.clone());
        book
    }

    pub fn subscribe<F: Fn(&AddressBookEvent) + 'static>(&mut self, subscriber: F) -> SubscriberId {
        self.notifier.register(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.notifier.deregister(id);
    }

    pub fn local_address(&self) -> &PeerAddress {
        &self.local_address
    }

    // === Admission ===

    /// Add a batch of learned addresses; `channel` is the connection they
    /// arrived over (`None` for seed injection). Emits one `Added` event
    /// with the admitted subset after the store is fully updated. Returns
    /// how many were admitted.
    pub fn add(&mut self, channel: Option<&PeerChannel>, addresses: Vec<PeerAddress>) -> usize {
        let mut added = Vec::new();
        for address in addresses {
            if let Some(stored) = self.admit(channel, address) {
                trace!(target: "network", "added peer address {:?}", stored.identity_key);
                added.push(stored);
            }
        }
        let count = added.len();
        if !added.is_empty() {
            self.notifier.notify(&AddressBookEvent::Added(added));
        }
        count
    }

    /// Single-address form of [`add`](Self::add).
    pub fn add_single(&mut self, channel: Option<&PeerChannel>, address: PeerAddress) -> bool {
        self.add(channel, vec![address]) == 1
    }

    fn admit(&mut self, channel: Option<&PeerChannel>, mut address: PeerAddress) -> Option<PeerAddress> {
        let now = unix_time_as_millis();

        // Ignore our own address.
        if address == self.local_address {
            return None;
        }

        // Ignore stale advertisements. Seed injection (no channel) is
        // exempt, which is what lets `timestamp == 0` through.
        if channel.is_some() && address.exceeds_age(now) {
            debug!(target: "network", "rejecting stale address {:?}", address.identity_key);
            return None;
        }

        // Ignore addresses from the future.
        if address.timestamp > now + MAX_TIMESTAMP_DRIFT {
            debug!(target: "network", "rejecting future-dated address {:?}", address.identity_key);
            return None;
        }

        if address.protocol() == Protocol::Rtc {
            let signal_channel = match channel {
                Some(channel) => channel,
                None => {
                    debug!(target: "network", "rejecting rtc address without signal channel");
                    return None;
                }
            };
            if address.peer_id.is_none() {
                debug!(target: "network", "rejecting rtc address without peer id");
                return None;
            }

            // The wire form carries the sender's distance; we store the
            // next-hop distance.
            address.distance = address.distance.saturating_add(1);
            if address.distance > MAX_DISTANCE {
                // Drop any route to this peer over the offending channel;
                // this may break a routing loop.
                if let Some(record) = self.store.get_mut(&address.identity_key) {
                    record.routes.delete_route(signal_channel);
                }
                debug!(
                    target: "network",
                    "rejecting rtc address {:?} beyond max distance",
                    address.identity_key
                );
                return None;
            }
        }

        match self.store.get_mut(&address.identity_key) {
            Some(record) => {
                // Banned peers and seeds are immutable to gossip.
                if record.state == PeerState::Banned {
                    return None;
                }
                if record.address.is_seed() {
                    return None;
                }

                // Never erase a known source IP.
                if address.net_address.is_none() {
                    address.net_address = record.address.net_address;
                }

                let mut changed = false;
                // WS freshness is monotone; RTC relies on routes instead.
                if record.address.timestamp < address.timestamp {
                    record.address = address.clone();
                    changed = true;
                }
                if address.protocol() == Protocol::Rtc {
                    if let Some(signal_channel) = channel {
                        changed |= record.routes.add_route(
                            signal_channel.clone(),
                            address.distance,
                            address.timestamp,
                        );
                    }
                }
                if changed {
                    Some(record.address.clone())
                } else {
                    None
                }
            }
            None => {
                let mut record = PeerRecord::new(address.clone());
                if address.protocol() == Protocol::Rtc {
                    if let Some(signal_channel) = channel {
                        record.routes.add_route(
                            signal_channel.clone(),
                            address.distance,
                            address.timestamp,
                        );
                    }
                }
                self.store.insert(record);
                if let Some(peer_id) = address.peer_id {
                    self.store.put_peer_id(peer_id, address.identity_key);
                }
                Some(address)
            }
        }
    }

    // === Transitions ===

    /// A dial to this address is in flight.
    pub fn connecting(&mut self, address: &PeerAddress) -> Option<PeerState> {
        let record = self.store.get(&address.identity_key)?;
        let next = record.next_state(&PeerEvent::Connecting)?;
        self.store.transition(&address.identity_key, next)
    }

    /// A connection to this address was established (possibly inbound and
    /// previously unknown).
    pub fn connected(&mut self, channel: &PeerChannel, address: &PeerAddress) -> Option<PeerState> {
        let now = unix_time_as_millis();

        if self.store.get(&address.identity_key).is_none() {
            self.store.insert(PeerRecord::new(address.clone()));
            if let Some(peer_id) = address.peer_id {
                self.store.put_peer_id(peer_id, address.identity_key);
            }
        }

        let record = self.store.get(&address.identity_key)?;
        let next = record.next_state(&PeerEvent::Connected {
            channel: channel.clone(),
        })?;
        self.store.transition(&address.identity_key, next);

        let record = self.store.get_mut(&address.identity_key)?;
        record.last_connected = Some(now);
        record.failed_attempts = 0;
        record.banned_until = None;
        record.ban_backoff = INITIAL_FAILED_BACKOFF;
        if !record.address.is_seed() {
            record.address = address.clone();
        }
        if record.address.protocol() == Protocol::Rtc {
            record
                .routes
                .add_route(channel.clone(), address.distance, address.timestamp);
        }
        Some(next)
    }

    /// A connection to this address closed; `channel` is the closing
    /// connection when the caller still has it.
    pub fn disconnected(
        &mut self,
        channel: Option<&PeerChannel>,
        address: &PeerAddress,
    ) -> Option<PeerState> {
        self.store.get(&address.identity_key)?;

        // The closing channel can no longer signal for anyone.
        if let Some(channel) = channel {
            self.purge_routes_over(channel);
        }

        let record = self.store.get(&address.identity_key)?;
        let next = record.next_state(&PeerEvent::Disconnected {
            channel: channel.cloned(),
        })?;
        self.store.transition(&address.identity_key, next);

        let closed_by_remote = channel.map(PeerChannel::closed_by_remote).unwrap_or(false);
        let protocol = self.store.get(&address.identity_key)?.address.protocol();
        // A remote close while we are online means the peer chose to drop
        // us; dumb peers cannot be re-dialed at all.
        if (closed_by_remote && self.platform.is_online()) || protocol == Protocol::Dumb {
            self.remove(&address.identity_key);
        }
        Some(next)
    }

    /// A dial to this address failed.
    pub fn failure(&mut self, address: &PeerAddress) -> Option<PeerState> {
        let now = unix_time_as_millis();
        let record = self.store.get(&address.identity_key)?;
        let next = record.next_state(&PeerEvent::Failure)?;
        self.store.transition(&address.identity_key, next);

        let record = self.store.get_mut(&address.identity_key)?;
        record.failed_attempts += 1;

        if record.failed_attempts >= record.max_failed_attempts() {
            let backoff = record.ban_backoff;
            if backoff >= MAX_FAILED_BACKOFF {
                // Out of backoffs; give up on the address.
                self.remove(&address.identity_key);
            } else {
                record.ban_backoff = cmp::min(MAX_FAILED_BACKOFF, backoff * 2);
                self.apply_ban(&address.identity_key, backoff, now);
            }
        }
        Some(next)
    }

    /// A signalled message for this peer bounced on `channel`.
    pub fn unroutable(&mut self, channel: &PeerChannel, address: &PeerAddress) -> Option<PeerState> {
        let record = self.store.get(&address.identity_key)?;
        match record.routes.best_route() {
            Some(best) if best.signal_channel == *channel => {}
            _ => {
                warn!(
                    target: "network",
                    "unroutable for {:?} reported on a non-best signal channel",
                    address.identity_key
                );
                return None;
            }
        }

        let next = record.next_state(&PeerEvent::Unroutable {
            channel: channel.clone(),
        })?;
        self.store.transition(&address.identity_key, next);

        let record = self.store.get_mut(&address.identity_key)?;
        record.routes.delete_best_route();
        if !record.routes.has_route() {
            self.remove(&address.identity_key);
        }
        Some(next)
    }

    /// Exclude this peer from selection for `duration_ms` (creating a
    /// record if the address is unknown).
    pub fn ban(&mut self, address: &PeerAddress, duration_ms: u64) -> Option<PeerState> {
        let now = unix_time_as_millis();
        if self.store.get(&address.identity_key).is_none() {
            self.store.insert(PeerRecord::new(address.clone()));
            if let Some(peer_id) = address.peer_id {
                self.store.put_peer_id(peer_id, address.identity_key);
            }
        }
        self.apply_ban(&address.identity_key, duration_ms, now)
    }

    fn apply_ban(&mut self, key: &IdentityKey, duration_ms: u64, now: u64) -> Option<PeerState> {
        let record = self.store.get(key)?;
        let next = record.next_state(&PeerEvent::Ban { duration_ms })?;
        self.store.transition(key, next);

        let record = self.store.get_mut(key)?;
        record.banned_until = Some(now + duration_ms);
        record.routes.delete_all();
        Some(next)
    }

    /// Forget an address. Seeds are re-banned instead of deleted and
    /// banned records survive until housekeeping reaps them.
    pub fn remove(&mut self, key: &IdentityKey) {
        let (is_seed, ban_backoff, state, peer_id) = match self.store.get(key) {
            Some(record) => (
                record.address.is_seed(),
                record.ban_backoff,
                record.state,
                record.address.peer_id,
            ),
            None => return,
        };

        if is_seed {
            // Keeps the seed out of dialer selection while still letting
            // its inbound connections recover the record.
            let now = unix_time_as_millis();
            self.apply_ban(key, ban_backoff, now);
            return;
        }

        if state == PeerState::Banned {
            if let Some(peer_id) = peer_id {
                self.store.remove_peer_id(&peer_id);
            }
            return;
        }

        self.store.remove(key);
    }

    fn purge_routes_over(&mut self, channel: &PeerChannel) {
        let mut lost: Vec<IdentityKey> = Vec::new();
        for record in self.store.values_mut() {
            if record.address.protocol() != Protocol::Rtc {
                continue;
            }
            if record.routes.delete_route(channel) && !record.routes.has_route() {
                lost.push(record.address.identity_key);
            }
        }
        for key in lost {
            self.remove(&key);
        }
    }

    // === Queries ===

    /// Up to `max_addresses` known addresses matching both masks, skipping
    /// banned, failed, stale and seed entries. Refreshes the relay
    /// timestamp of connected RTC peers it walks past.
    pub fn query(
        &mut self,
        protocol_mask: ProtocolFlags,
        service_mask: Services,
        max_addresses: usize,
    ) -> Vec<PeerAddress> {
        let now = unix_time_as_millis();
        let mut addresses = Vec::new();
        for record in self.store.values_mut() {
            if addresses.len() >= max_addresses {
                break;
            }
            if record.state == PeerState::Connected
                && record.address.protocol() == Protocol::Rtc
            {
                record.routes.refresh_best_route(now);
            }

            if record.state == PeerState::Banned || record.state == PeerState::Failed {
                continue;
            }
            if record.address.is_seed() {
                continue;
            }
            if !protocol_mask.intersects(record.address.protocol().into()) {
                continue;
            }
            if !service_mask.intersects(record.address.services) {
                continue;
            }
            if record.address.exceeds_age(now) {
                continue;
            }
            addresses.push(record.address.clone());
        }
        addresses
    }

    /// Ranked dial candidates for the outbound connection loop.
    pub fn dial_candidates(&self, count: usize) -> Vec<PeerAddress> {
        score::rank_candidates(&self.store, unix_time_as_millis(), count)
    }

    pub fn is_connected(&self, address: &PeerAddress) -> bool {
        self.store
            .get(&address.identity_key)
            .map(|record| record.state.is_connected())
            .unwrap_or(false)
    }

    /// Banned from the caller's point of view. Seeds always read as
    /// unbanned so inbound seed connections keep working while the ban
    /// only shields the dialer.
    pub fn is_banned(&self, address: &PeerAddress) -> bool {
        self.store
            .get(&address.identity_key)
            .map(|record| record.state.is_banned() && !record.address.is_seed())
            .unwrap_or(false)
    }

    pub fn state_of(&self, address: &PeerAddress) -> Option<PeerState> {
        self.store.get(&address.identity_key).map(|record| record.state)
    }

    pub fn get_by_peer_id(&self, peer_id: &PeerId) -> Option<PeerAddress> {
        self.store
            .get_by_peer_id(peer_id)
            .map(|record| record.address.clone())
    }

    /// The channel signalling for this RTC peer currently goes through.
    pub fn signal_channel_for(&self, peer_id: &PeerId) -> Option<PeerChannel> {
        self.store
            .get_by_peer_id(peer_id)
            .and_then(|record| record.routes.best_route())
            .map(|route| route.signal_channel.clone())
    }

    pub fn known_addresses_count(&self) -> usize {
        self.store.len()
    }

    pub fn known_addresses_count_for(&self, protocol: Protocol) -> usize {
        self.store
            .values()
            .filter(|record| record.address.protocol() == protocol)
            .count()
    }

    pub fn connecting_count(&self) -> u32 {
        self.store.connecting_count()
    }

    // === Housekeeping ===

    /// One sweep of the age, ban-expiry and route-freshness policy.
    ///
    /// The production driver calls this once per
    /// [`HOUSEKEEPING_INTERVAL`](crate::peer_store::HOUSEKEEPING_INTERVAL);
    /// tests drive it directly with a chosen `now_ms`.
    pub fn housekeeping(&mut self, now_ms: u64) {
        let mut unbanned: Vec<PeerAddress> = Vec::new();
        let mut to_remove: Vec<IdentityKey> = Vec::new();
        let mut to_reap: Vec<IdentityKey> = Vec::new();

        for record in self.store.values_mut() {
            match record.state {
                PeerState::New | PeerState::Tried | PeerState::Failed => {
                    // Seeds are exempt from aging.
                    if !record.address.is_seed() && record.address.exceeds_age(now_ms) {
                        to_remove.push(record.address.identity_key);
                        continue;
                    }

                    // The failure cooloff has elapsed; the address may be
                    // retried if selected again.
                    if record.state == PeerState::Failed
                        && record.failed_attempts >= record.max_failed_attempts()
                    {
                        if let Some(banned_until) = record.banned_until {
                            if banned_until <= now_ms {
                                record.banned_until = None;
                                record.failed_attempts = 0;
                                unbanned.push(record.address.clone());
                            }
                        }
                    }
                }
                PeerState::Banned => {
                    if let Some(banned_until) = record.banned_until {
                        if banned_until <= now_ms {
                            if record.is_failure_ban() || record.address.is_seed() {
                                // Back into the pool.
                                record.state = PeerState::New;
                                record.banned_until = None;
                                record.failed_attempts = 0;
                                unbanned.push(record.address.clone());
                            } else {
                                // Expired bans are the one path that drops
                                // a banned record.
                                to_reap.push(record.address.identity_key);
                            }
                        }
                    }
                }
                PeerState::Connected => {
                    if record.address.protocol() == Protocol::Rtc {
                        record.routes.refresh_best_route(now_ms);
                    }
                }
                // The dialer owns connect timeouts.
                PeerState::Connecting => {}
            }
        }

        for key in to_remove {
            self.remove(&key);
        }
        for key in to_reap {
            self.store.remove(&key);
        }

        if !unbanned.is_empty() {
            debug!(target: "network", "housekeeping unbanned {} addresses", unbanned.len());
            self.notifier.notify(&AddressBookEvent::Added(unbanned));
        }
    }

    #[cfg(test)]
    pub(crate) fn record(&self, key: &IdentityKey) -> Option<&PeerRecord> {
        self.store.get(key)
    }
}
