//! Integration test: determinism and coverage.
//!
//! The same key on the same membership always lands on the same address,
//! and every position on the ring resolves to some address.

use keyroute_balance::{BalanceConfig, ConsistentHashLoadBalance, LoadBalance};
use keyroute_integration_tests::{THREE, order_request, sample_keys};
use keyroute_ring::{DEFAULT_REPLICAS, DigestAlgorithm, HashRing};
use keyroute_types::{Address, AddressSnapshot, SnapshotToken};
use rand::Rng;

fn three() -> Vec<Address> {
    THREE.iter().map(|a| Address::new(a)).collect()
}

/// Concrete scenario: three addresses, 160 replicas, repeated selection.
#[test]
fn test_order_service_scenario() {
    let lb = ConsistentHashLoadBalance::default();
    let snapshot = AddressSnapshot::new(THREE);

    let first = lb
        .select("orderService", &snapshot, "orderService#[]")
        .unwrap();
    assert!(THREE.contains(&first.as_str()));

    for _ in 0..100 {
        assert_eq!(
            lb.select("orderService", &snapshot, "orderService#[]")
                .unwrap(),
            first
        );
    }

    let ring = lb.cache().get("orderService").unwrap();
    assert!(ring.vnode_count() <= 480);
    assert_eq!(lb.cache().rings_built(), 1);
}

/// Independently built rings for the same membership agree on every key.
#[test]
fn test_rings_agree_across_builds() {
    let r1 = HashRing::build_with(&three(), SnapshotToken::next(), 160, DigestAlgorithm::Md5)
        .unwrap();
    let r2 = HashRing::build_with(&three(), SnapshotToken::next(), 160, DigestAlgorithm::Md5)
        .unwrap();

    for key in sample_keys(5_000) {
        assert_eq!(r1.select(&key), r2.select(&key), "key {key} diverged");
    }
}

/// Balancers are stateless with respect to routing: two instances agree.
#[test]
fn test_balancers_agree_on_requests() {
    let a = ConsistentHashLoadBalance::default();
    let b = ConsistentHashLoadBalance::new(&BalanceConfig::default()).unwrap();
    let s1 = AddressSnapshot::new(THREE);
    let s2 = AddressSnapshot::new(THREE);

    for i in 0..500 {
        let req = order_request(i.to_string());
        assert_eq!(
            a.select_service_address(&s1, &req).unwrap(),
            b.select_service_address(&s2, &req).unwrap()
        );
    }
}

/// Any random 32-bit position, including those past the last vnode,
/// resolves to a member.
#[test]
fn test_every_position_resolves() {
    let ring = HashRing::build_with(
        &three(),
        SnapshotToken::next(),
        DEFAULT_REPLICAS,
        DigestAlgorithm::Md5,
    )
    .unwrap();
    let members = three();

    let mut rng = rand::rng();
    for _ in 0..10_000 {
        let position: u32 = rng.random();
        assert!(members.contains(ring.locate(position)));
    }
    for position in [0, 1, u32::MAX - 1, u32::MAX] {
        assert!(members.contains(ring.locate(position)));
    }
}

/// Positions above the highest vnode wrap to the lowest one.
#[test]
fn test_wrap_around_matches_lowest_vnode() {
    // 12 vnodes: the lowest one owns position 0 and everything past the
    // highest vnode.
    let ring = HashRing::build_with(&three(), SnapshotToken::next(), 4, DigestAlgorithm::Md5)
        .unwrap();
    assert_eq!(ring.vnode_count(), 12);
    assert_eq!(ring.locate(u32::MAX), ring.locate(0));
}
