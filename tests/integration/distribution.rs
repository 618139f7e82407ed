//! Integration test: load distribution.
//!
//! Over many keys each address receives roughly its share of virtual nodes.

use std::collections::HashMap;

use keyroute_integration_tests::{addresses, sample_keys};
use keyroute_ring::{DEFAULT_REPLICAS, DigestAlgorithm, HashRing};
use keyroute_types::{Address, SnapshotToken};

fn counts(ring: &HashRing, keys: &[String]) -> HashMap<Address, usize> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(ring.select(key).clone()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_equal_replicas_converge_to_equal_share() {
    for algo in [DigestAlgorithm::Md5, DigestAlgorithm::Blake3] {
        let members = addresses(8);
        let ring =
            HashRing::build_with(&members, SnapshotToken::next(), DEFAULT_REPLICAS, algo).unwrap();
        let keys = sample_keys(80_000);
        let counts = counts(&ring, &keys);

        assert_eq!(counts.len(), 8, "every address should receive keys");
        let expected = keys.len() as f64 / 8.0;
        for (addr, count) in &counts {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.35,
                "{algo}: {addr} got {count} keys, expected ~{expected:.0} ({deviation:.2})"
            );
        }
    }
}

/// Observed key share tracks the arc share computed from the ring itself.
#[test]
fn test_key_share_tracks_ring_share() {
    let members = addresses(4);
    let ring = HashRing::build_with(
        &members,
        SnapshotToken::next(),
        DEFAULT_REPLICAS,
        DigestAlgorithm::Md5,
    )
    .unwrap();
    let keys = sample_keys(100_000);
    let counts = counts(&ring, &keys);

    for (addr, share) in ring.shares() {
        let observed = counts.get(&addr).copied().unwrap_or(0) as f64 / keys.len() as f64;
        assert!(
            (observed - share).abs() < 0.02,
            "{addr}: ring share {share:.3}, observed {observed:.3}"
        );
    }
}

/// More virtual nodes smooth the distribution.
#[test]
fn test_more_replicas_tighter_spread() {
    let members = addresses(6);

    let spread = |replicas: u32| {
        let ring =
            HashRing::build_with(&members, SnapshotToken::next(), replicas, DigestAlgorithm::Md5)
                .unwrap();
        let shares = ring.shares();
        let max = shares.values().cloned().fold(f64::MIN, f64::max);
        let min = shares.values().cloned().fold(f64::MAX, f64::min);
        max - min
    };

    assert!(spread(640) < spread(4), "640 replicas should beat 4");
}
