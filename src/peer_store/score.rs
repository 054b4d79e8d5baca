//! Dial-candidate ranking.
//!
//! Pure projection over the store: the dialer asks for the next addresses
//! worth attempting, the book answers from current record state.

use rand::seq::SliceRandom;

use crate::peer_store::address_store::AddressStore;
use crate::peer_store::record::{PeerRecord, PeerState};
use crate::peer_store::types::PeerAddress;

pub type Score = i32;

const NEW_SCORE: Score = 100;
const TRIED_SCORE: Score = 60;
const FAILED_SCORE: Score = 20;
const FAILED_ATTEMPT_PENALTY: Score = 10;

/// Score of one record as a dial candidate; `None` when it is not
/// dialable at all (wrong state, seed, stale).
pub fn connect_score(record: &PeerRecord, now_ms: u64) -> Option<Score> {
    let base = match record.state {
        PeerState::New => NEW_SCORE,
        PeerState::Tried => TRIED_SCORE,
        PeerState::Failed => FAILED_SCORE,
        PeerState::Connecting | PeerState::Connected | PeerState::Banned => return None,
    };
    if record.address.is_seed() || record.address.exceeds_age(now_ms) {
        return None;
    }
    Some(base - record.failed_attempts as Score * FAILED_ATTEMPT_PENALTY)
}

/// Up to `count` dialable addresses, best score first; equally scored
/// candidates come back in random order so the dialer spreads its load.
pub fn rank_candidates(store: &AddressStore, now_ms: u64, count: usize) -> Vec<PeerAddress> {
    let mut scored: Vec<(Score, PeerAddress)> = store
        .values()
        .filter_map(|record| {
            connect_score(record, now_ms).map(|score| (score, record.address.clone()))
        })
        .collect();
    scored.shuffle(&mut rand::thread_rng());
    // stable sort keeps the shuffle within equal scores
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(count);
    scored.into_iter().map(|(_, address)| address).collect()
}
