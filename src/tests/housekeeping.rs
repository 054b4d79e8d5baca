use std::cell::RefCell;
use std::rc::Rc;

use faketime::unix_time_as_millis;

use super::{channel, rtc_addr, seed_addr, test_config, ws_addr};
use crate::peer_store::{DEFAULT_BAN_TIME, MAX_AGE_WS};
use crate::{AddressBookEvent, AlwaysOnline, PeerAddressBook, PeerState};

#[test]
fn test_ages_out_stale_addresses() {
    let now = unix_time_as_millis();
    let mut book = super::test_book();
    let stale = ws_addr(now - MAX_AGE_WS - 1);
    let fresh = ws_addr(now);
    // seed injection bypasses the admission age gate
    book.add_single(None, stale.clone());
    book.add_single(Some(&channel(1)), fresh.clone());

    book.housekeeping(now);

    assert_eq!(book.state_of(&stale), None);
    assert_eq!(book.state_of(&fresh), Some(PeerState::New));
}

#[test]
fn test_seeds_are_exempt_from_aging() {
    let now = unix_time_as_millis();
    let seed = seed_addr();
    let config = test_config().with_seeds(vec![seed.clone()]);
    let mut book = PeerAddressBook::new(&config, Rc::new(AlwaysOnline));

    book.housekeeping(now + 365 * 24 * 3600 * 1000);

    assert_eq!(book.state_of(&seed), Some(PeerState::New));
}

#[test]
fn test_expired_plain_ban_is_reaped() {
    let now = unix_time_as_millis();
    let mut book = super::test_book();
    let addr = ws_addr(now);
    book.add_single(Some(&channel(1)), addr.clone());
    book.ban(&addr, 1_000);

    // not expired yet
    book.housekeeping(now);
    assert_eq!(book.state_of(&addr), Some(PeerState::Banned));

    // a ban without failures behind it is deleted outright
    book.housekeeping(now + DEFAULT_BAN_TIME + 1_001);
    assert_eq!(book.state_of(&addr), None);
}

#[cfg(not(disable_faketime))]
#[test]
fn test_expired_failure_ban_returns_to_new() {
    let faketime_file = faketime::millis_tempfile(500_000).expect("create faketime file");
    faketime::enable(&faketime_file);
    let now = unix_time_as_millis();

    let mut book = super::test_book();
    let addr = ws_addr(now);
    book.add_single(Some(&channel(1)), addr.clone());
    book.failure(&addr);
    book.failure(&addr);
    book.failure(&addr);
    assert_eq!(book.state_of(&addr), Some(PeerState::Banned));

    let unbanned: Rc<RefCell<Vec<crate::PeerAddress>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&unbanned);
    book.subscribe(move |event| {
        let AddressBookEvent::Added(addresses) = event;
        sink.borrow_mut().extend(addresses.clone());
    });

    book.housekeeping(now + 15_000);

    let record = book.record(&addr.identity_key).unwrap();
    assert_eq!(record.state, PeerState::New);
    assert_eq!(record.failed_attempts, 0);
    assert!(record.banned_until.is_none());
    assert_eq!(&*unbanned.borrow(), &vec![addr]);
}

#[test]
fn test_seed_unban_fires_added() {
    let seed = seed_addr();
    let config = test_config().with_seeds(vec![seed.clone()]);
    let mut book = PeerAddressBook::new(&config, Rc::new(AlwaysOnline));
    let now = unix_time_as_millis();
    book.ban(&seed, 0);
    assert_eq!(book.state_of(&seed), Some(PeerState::Banned));

    let unbanned: Rc<RefCell<Vec<crate::PeerAddress>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&unbanned);
    book.subscribe(move |event| {
        let AddressBookEvent::Added(addresses) = event;
        sink.borrow_mut().extend(addresses.clone());
    });

    book.housekeeping(now + 1_000);

    assert_eq!(book.state_of(&seed), Some(PeerState::New));
    assert_eq!(&*unbanned.borrow(), &vec![seed]);
}

#[test]
fn test_connecting_records_are_left_alone() {
    let now = unix_time_as_millis();
    let mut book = super::test_book();
    let addr = ws_addr(now);
    book.add_single(Some(&channel(1)), addr.clone());
    book.connecting(&addr);

    // even a long-stuck dial is the dialer's problem, not ours
    book.housekeeping(now + MAX_AGE_WS * 2);

    assert_eq!(book.state_of(&addr), Some(PeerState::Connecting));
    assert_eq!(book.connecting_count(), 1);
}

#[test]
fn test_connected_rtc_best_route_is_refreshed() {
    let now = unix_time_as_millis();
    let mut book = super::test_book();
    let addr = rtc_addr(now - 5_000, 0);
    book.connected(&channel(1), &addr);

    book.housekeeping(now + 30_000);

    let record = book.record(&addr.identity_key).unwrap();
    assert_eq!(record.routes.best_route().unwrap().timestamp, now + 30_000);
}

#[test]
fn test_connected_peers_are_not_aged_out() {
    let now = unix_time_as_millis();
    let mut book = super::test_book();
    let addr = ws_addr(now);
    book.connected(&channel(1), &addr);

    book.housekeeping(now + MAX_AGE_WS * 2);

    assert_eq!(book.state_of(&addr), Some(PeerState::Connected));
}
