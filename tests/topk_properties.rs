// tests/topk_properties.rs
// Randomized checks of the top-K collector: bounded size, nothing better is
// discarded, and the result does not depend on offer order or merge split.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rngs::StdRng};

use ferrous_search::{SearchHit, TopK};

fn random_hits(rng: &mut StdRng, n: usize) -> Vec<SearchHit> {
    // narrow score range forces plenty of ties
    (0..n)
        .map(|i| SearchHit::new(rng.gen_range(-20..20), rng.gen_range(0..3), i))
        .collect()
}

fn collect(hits: &[SearchHit], k: usize) -> Vec<SearchHit> {
    let mut top = TopK::new(k);
    for hit in hits {
        top.offer_hit(hit.clone());
    }
    top.drain_sorted()
}

#[test]
fn holds_min_of_k_and_n() {
    let mut rng = StdRng::seed_from_u64(1);
    for n in [0, 1, 5, 50, 300] {
        let hits = random_hits(&mut rng, n);
        for k in [1, 7, 50, 1000] {
            assert_eq!(collect(&hits, k).len(), k.min(n), "k={k} n={n}");
        }
    }
}

#[test]
fn retained_hits_outrank_discarded() {
    let mut rng = StdRng::seed_from_u64(2);
    let hits = random_hits(&mut rng, 500);
    let kept = collect(&hits, 25);

    let worst_kept = kept.last().unwrap();
    for hit in &hits {
        if !kept.contains(hit) {
            assert!(hit.score <= worst_kept.score);
            assert!(worst_kept.rank_cmp(hit).is_gt());
        }
    }
    for pair in kept.windows(2) {
        assert!(pair[0].rank_cmp(&pair[1]).is_gt(), "best first");
    }

    let mut expected = hits.clone();
    expected.sort_by(|a, b| b.rank_cmp(a));
    expected.truncate(25);
    assert_eq!(kept, expected);
}

#[test]
fn offer_order_does_not_matter() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut hits = random_hits(&mut rng, 400);
    let reference = collect(&hits, 30);
    for _ in 0..10 {
        hits.shuffle(&mut rng);
        assert_eq!(collect(&hits, 30), reference);
    }
}

#[test]
fn merging_partitions_matches_single_collector() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut hits = random_hits(&mut rng, 400);
    let reference = collect(&hits, 30);

    for parts in [2, 3, 8] {
        hits.shuffle(&mut rng);
        let mut collectors: Vec<TopK> = (0..parts).map(|_| TopK::new(30)).collect();
        for hit in &hits {
            let idx = rng.gen_range(0..parts);
            collectors[idx].offer_hit(hit.clone());
        }
        collectors.shuffle(&mut rng);

        let mut merged = TopK::new(30);
        for c in collectors {
            merged.merge(c);
        }
        assert_eq!(merged.drain_sorted(), reference, "{parts} partitions");
    }
}
