use super::channel;
use crate::{ChannelId, RouteSet};

#[test]
fn test_add_and_best_route() {
    let mut routes = RouteSet::new();
    assert!(!routes.has_route());
    assert!(routes.best_route().is_none());

    assert!(routes.add_route(channel(1), 2, 100));
    assert!(routes.add_route(channel(2), 1, 50));
    assert_eq!(routes.len(), 2);

    // fewest hops wins
    let best = routes.best_route().unwrap();
    assert_eq!(best.signal_channel.id(), ChannelId(2));
    assert_eq!(best.distance, 1);
}

#[test]
fn test_best_route_tie_breaks_on_timestamp() {
    let mut routes = RouteSet::new();
    routes.add_route(channel(1), 1, 50);
    routes.add_route(channel(2), 1, 60);
    assert_eq!(routes.best_route().unwrap().signal_channel.id(), ChannelId(2));
}

#[test]
fn test_distance_cap() {
    let mut routes = RouteSet::new();
    assert!(!routes.add_route(channel(1), 5, 100));
    assert!(!routes.has_route());
    assert!(routes.best_route().is_none());
    // the cap itself is still allowed
    assert!(routes.add_route(channel(2), 4, 100));
}

#[test]
fn test_upsert_reports_changes() {
    let mut routes = RouteSet::new();
    assert!(routes.add_route(channel(1), 2, 100));
    // identical upsert is not a change
    assert!(!routes.add_route(channel(1), 2, 100));
    assert!(routes.add_route(channel(1), 1, 100));
    assert_eq!(routes.len(), 1);
    assert_eq!(routes.best_route().unwrap().distance, 1);
}

#[test]
fn test_delete_route_reselects() {
    let mut routes = RouteSet::new();
    routes.add_route(channel(1), 1, 100);
    routes.add_route(channel(2), 2, 100);
    assert!(routes.delete_route(&channel(1)));
    assert_eq!(routes.best_route().unwrap().signal_channel.id(), ChannelId(2));
    assert!(!routes.delete_route(&channel(1)));
}

#[test]
fn test_delete_best_route_promotes_next() {
    let mut routes = RouteSet::new();
    routes.add_route(channel(1), 1, 100);
    routes.add_route(channel(2), 2, 100);
    routes.add_route(channel(3), 3, 100);
    routes.delete_best_route();
    assert_eq!(routes.best_route().unwrap().signal_channel.id(), ChannelId(2));
    routes.delete_best_route();
    assert_eq!(routes.best_route().unwrap().signal_channel.id(), ChannelId(3));
    routes.delete_best_route();
    assert!(routes.best_route().is_none());
    assert!(!routes.has_route());
}

#[test]
fn test_delete_all() {
    let mut routes = RouteSet::new();
    routes.add_route(channel(1), 1, 100);
    routes.add_route(channel(2), 2, 100);
    routes.delete_all();
    assert!(routes.is_empty());
    assert!(routes.best_route().is_none());
}

#[test]
fn test_refresh_best_route() {
    let mut routes = RouteSet::new();
    routes.add_route(channel(1), 1, 100);
    routes.add_route(channel(2), 2, 100);
    routes.refresh_best_route(9_999);
    let best = routes.best_route().unwrap();
    assert_eq!(best.signal_channel.id(), ChannelId(1));
    assert_eq!(best.timestamp, 9_999);
}
