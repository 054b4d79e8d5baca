//! Primary and secondary peer maps plus the connecting counter.

use fnv::FnvHashMap;

use crate::peer_store::record::{PeerRecord, PeerState};
use crate::peer_store::types::{IdentityKey, PeerId};

/// Owns every `PeerRecord`; all mutation goes through the book.
#[derive(Default)]
pub struct AddressStore {
    records: FnvHashMap<IdentityKey, PeerRecord>,
    /// RTC signalling ids back to record keys.
    key_by_peer_id: FnvHashMap<PeerId, IdentityKey>,
    connecting_count: u32,
}

impl AddressStore {
    pub fn new() -> Self {
        AddressStore::default()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&PeerRecord> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &IdentityKey) -> Option<&mut PeerRecord> {
        self.records.get_mut(key)
    }

    pub fn insert(&mut self, record: PeerRecord) {
        if record.state == PeerState::Connecting {
            self.connecting_count += 1;
        }
        self.records.insert(record.address.identity_key, record);
    }

    /// Raw removal: drops the record, its peer-id index entry and its
    /// contribution to the connecting counter. Policy (seed re-bans, ban
    /// survival) lives in the book.
    pub fn remove(&mut self, key: &IdentityKey) -> Option<PeerRecord> {
        let record = self.records.remove(key)?;
        if let Some(peer_id) = record.address.peer_id.as_ref() {
            if self.key_by_peer_id.get(peer_id) == Some(key) {
                self.key_by_peer_id.remove(peer_id);
            }
        }
        if record.state == PeerState::Connecting {
            self.connecting_count -= 1;
        }
        Some(record)
    }

    pub fn put_peer_id(&mut self, peer_id: PeerId, key: IdentityKey) {
        self.key_by_peer_id.insert(peer_id, key);
    }

    pub fn remove_peer_id(&mut self, peer_id: &PeerId) {
        self.key_by_peer_id.remove(peer_id);
    }

    pub fn get_by_peer_id(&self, peer_id: &PeerId) -> Option<&PeerRecord> {
        self.key_by_peer_id
            .get(peer_id)
            .and_then(|key| self.records.get(key))
    }

    /// Move a record to `next`, keeping the connecting counter in step on
    /// every edge into or out of `Connecting`.
    pub fn transition(&mut self, key: &IdentityKey, next: PeerState) -> Option<PeerState> {
        let record = self.records.get_mut(key)?;
        let prev = record.state;
        record.state = next;
        if prev == PeerState::Connecting && next != PeerState::Connecting {
            self.connecting_count -= 1;
        } else if prev != PeerState::Connecting && next == PeerState::Connecting {
            self.connecting_count += 1;
        }
        Some(next)
    }

    pub fn values(&self) -> impl Iterator<Item = &PeerRecord> {
        self.records.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut PeerRecord> {
        self.records.values_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn connecting_count(&self) -> u32 {
        self.connecting_count
    }
}
