//! Relay routes for RTC peers.
//!
//! An RTC peer can be signalable over several already-connected peers at
//! once; the set tracks one route per signal channel and caches the best
//! one (fewest hops, then most recently advertised).

use fnv::FnvHashMap;
use log::debug;

use crate::channel::{ChannelId, PeerChannel};
use crate::peer_store::MAX_DISTANCE;

/// One relay path to an RTC peer.
#[derive(Debug, Clone)]
pub struct SignalRoute {
    pub signal_channel: PeerChannel,
    pub distance: u8,
    pub timestamp: u64,
}

/// Routes keyed by signal channel, with a cached best route.
#[derive(Debug, Default)]
pub struct RouteSet {
    routes: FnvHashMap<ChannelId, SignalRoute>,
    best: Option<ChannelId>,
}

impl RouteSet {
    pub fn new() -> Self {
        RouteSet::default()
    }

    /// Upsert the route over `channel`.
    ///
    /// Returns whether a route was inserted or an existing one changed.
    /// Routes beyond [`MAX_DISTANCE`] never enter the set.
    pub fn add_route(&mut self, channel: PeerChannel, distance: u8, timestamp: u64) -> bool {
        if distance > MAX_DISTANCE {
            debug!(
                target: "network",
                "discarding route over {:?}: distance {} exceeds cap",
                channel, distance
            );
            return false;
        }

        let changed = match self.routes.get_mut(&channel.id()) {
            Some(route) => {
                if route.distance == distance && route.timestamp == timestamp {
                    false
                } else {
                    route.distance = distance;
                    route.timestamp = timestamp;
                    true
                }
            }
            None => {
                self.routes.insert(
                    channel.id(),
                    SignalRoute {
                        signal_channel: channel,
                        distance,
                        timestamp,
                    },
                );
                true
            }
        };

        if changed {
            self.reselect();
        }
        changed
    }

    /// Drop the route over `channel`, if any. Returns whether one existed.
    pub fn delete_route(&mut self, channel: &PeerChannel) -> bool {
        let existed = self.routes.remove(&channel.id()).is_some();
        if existed {
            self.reselect();
        }
        existed
    }

    /// Drop the current best route and promote the next best.
    pub fn delete_best_route(&mut self) {
        if let Some(id) = self.best {
            self.routes.remove(&id);
            self.reselect();
        }
    }

    pub fn delete_all(&mut self) {
        self.routes.clear();
        self.best = None;
    }

    pub fn has_route(&self) -> bool {
        !self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn best_route(&self) -> Option<&SignalRoute> {
        self.best.and_then(|id| self.routes.get(&id))
    }

    /// Mark the best route as fresh; used while the peer stays connected.
    pub fn refresh_best_route(&mut self, now_ms: u64) {
        if let Some(id) = self.best {
            if let Some(route) = self.routes.get_mut(&id) {
                route.timestamp = now_ms;
            }
        }
    }

    fn reselect(&mut self) {
        self.best = self
            .routes
            .values()
            .min_by(|a, b| {
                a.distance
                    .cmp(&b.distance)
                    .then(b.timestamp.cmp(&a.timestamp))
            })
            .map(|route| route.signal_channel.id());
    }
}
