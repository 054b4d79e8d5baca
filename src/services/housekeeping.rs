//! Periodic driver for the address book sweep.

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use faketime::unix_time_as_millis;
use futures::Future;
use tokio::time::{Interval, MissedTickBehavior};

use crate::peer_store::PeerAddressBook;

/// Runs the age-out / ban-expiry / route-refresh sweep on a fixed
/// interval. Never resolves; spawn it on the node's single-threaded
/// executor (`spawn_local`) next to the rest of the network tasks.
pub struct HousekeepingService {
    book: Rc<RefCell<PeerAddressBook>>,
    interval: Option<Interval>,
    sweep_interval: Duration,
}

impl HousekeepingService {
    pub fn new(book: Rc<RefCell<PeerAddressBook>>, sweep_interval: Duration) -> Self {
        HousekeepingService {
            book,
            interval: None,
            sweep_interval,
        }
    }
}

impl Future for HousekeepingService {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.interval.is_none() {
            self.interval = {
                let mut interval = tokio::time::interval(self.sweep_interval);
                // A missed sweep does not need to be compensated for,
                // ban expiry is sampled lazily anyway
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Some(interval)
            }
        }
        while self.interval.as_mut().unwrap().poll_tick(cx).is_ready() {
            self.book.borrow_mut().housekeeping(unix_time_as_millis());
        }
        Poll::Pending
    }
}
