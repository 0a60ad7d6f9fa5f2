use crate::{plan, search, Index, IndexBuilder, IndexError, Searcher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build an index over `[0, max_id]` from per-tag id slices, using the
/// default dense threshold.
fn build_index(max_id: u32, tags: &[&[u32]]) -> Index {
    build_index_with_threshold(max_id, tags, crate::DENSE_THRESHOLD)
}

fn build_index_with_threshold(max_id: u32, tags: &[&[u32]], threshold: u32) -> Index {
    let mut builder = IndexBuilder::new(max_id, tags.len() as u32).with_dense_threshold(threshold);
    for (tag, ids) in tags.iter().enumerate() {
        builder.set_tag(tag as u32, ids).unwrap();
    }
    builder.finish()
}

/// Reference intersection over the raw id slices.
fn brute_force(tags: &[&[u32]], query: &[u32]) -> Vec<u32> {
    let mut result: Vec<u32> = tags[query[0] as usize].to_vec();
    for &tag in &query[1..] {
        let ids = tags[tag as usize];
        result.retain(|id| ids.binary_search(id).is_ok());
    }
    result
}

// ---- Planning ----

#[test]
fn test_plan_orders_by_selectivity() {
    let tags: Vec<Vec<u32>> = vec![
        (0..500).collect(), // tag 0: 500 items
        vec![],             // tag 1: empty
        vec![7, 9],         // tag 2: 2 items
        (0..90).collect(),  // tag 3: 90 items
    ];
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();
    let index = build_index(1000, &slices);

    let ordered = plan(&index, &[0, 1, 2, 3]).unwrap();
    assert_eq!(ordered, vec![1, 2, 3, 0]);
}

#[test]
fn test_plan_rejects_unknown_tags() {
    let index = build_index(10, &[&[1, 2]]);
    assert!(matches!(
        plan(&index, &[0, 9]),
        Err(IndexError::BadTagId { tag: 9, .. })
    ));
}

// ---- Edge cases ----

#[test]
fn test_search_empty_query_is_an_error() {
    let index = build_index(10, &[&[1, 2]]);
    assert!(matches!(
        search(&index, &[]),
        Err(IndexError::EmptyQuery)
    ));
}

#[test]
fn test_search_single_tag_returns_its_items() {
    let ids: Vec<u32> = vec![3, 17, 900, 4000];
    let index = build_index(5000, &[ids.as_slice()]);
    assert_eq!(search(&index, &[0]).unwrap(), ids);

    // Same tag forced dense.
    let index = build_index_with_threshold(5000, &[ids.as_slice()], 1);
    assert_eq!(search(&index, &[0]).unwrap(), ids);
}

#[test]
fn test_search_empty_tag_short_circuits() {
    let index = build_index(100, &[&[1, 2, 3], &[], &[2, 3]]);
    assert_eq!(search(&index, &[0, 1, 2]).unwrap(), Vec::<u32>::new());
    assert_eq!(search(&index, &[1]).unwrap(), Vec::<u32>::new());
}

#[test]
fn test_search_disjoint_tags_yield_nothing() {
    let evens: Vec<u32> = (0..1000).map(|i| i * 2).collect();
    let odds: Vec<u32> = (0..1000).map(|i| i * 2 + 1).collect();
    let index = build_index(2000, &[evens.as_slice(), odds.as_slice()]);
    assert_eq!(search(&index, &[0, 1]).unwrap(), Vec::<u32>::new());
}

// ---- Known-answer scenarios ----

#[test]
fn test_search_dense_and_dense() {
    // Multiples of 3 and of 5 in [0, 10^6]; both well past the threshold.
    let threes: Vec<u32> = (0..=1_000_000).filter(|i| i % 3 == 0).collect();
    let fives: Vec<u32> = (0..=1_000_000).filter(|i| i % 5 == 0).collect();
    let index = build_index(1_000_000, &[threes.as_slice(), fives.as_slice()]);

    assert!(matches!(
        index.entry(0).unwrap(),
        crate::TagEntry::Dense { .. }
    ));

    let expected: Vec<u32> = (0..=1_000_000).filter(|i| i % 15 == 0).collect();
    assert_eq!(search(&index, &[0, 1]).unwrap(), expected);
}

#[test]
fn test_search_dense_and_ids() {
    // Evens in [0, 10^5] load dense; the sparse probe keeps {0, 4, 100}.
    let evens: Vec<u32> = (0..=100_000).filter(|i| i % 2 == 0).collect();
    let probe: Vec<u32> = vec![0, 3, 4, 7, 100];
    let index = build_index(100_000, &[evens.as_slice(), probe.as_slice()]);

    assert!(matches!(
        index.entry(0).unwrap(),
        crate::TagEntry::Dense { .. }
    ));
    assert!(matches!(index.entry(1).unwrap(), crate::TagEntry::Ids(_)));

    assert_eq!(search(&index, &[0, 1]).unwrap(), vec![0, 4, 100]);
    assert_eq!(search(&index, &[1, 0]).unwrap(), vec![0, 4, 100]);
}

#[test]
fn test_search_sparse_and_sparse() {
    let a: Vec<u32> = vec![1, 4, 9, 16, 25, 36];
    let b: Vec<u32> = vec![2, 4, 6, 16, 30, 36, 40];
    let index = build_index(100, &[a.as_slice(), b.as_slice()]);
    assert_eq!(search(&index, &[0, 1]).unwrap(), vec![4, 16, 36]);
}

#[test]
fn test_search_ids_fold_keeps_same_word_survivors() {
    // Two postings in one word must both survive an Ids fold; the third
    // tag forces the bitmap path.
    let a: Vec<u32> = vec![3, 5, 70];
    let b: Vec<u32> = vec![3, 5, 64, 70];
    let all: Vec<u32> = (0..=150_000).collect();
    let index = build_index(150_000, &[a.as_slice(), b.as_slice(), all.as_slice()]);

    assert_eq!(search(&index, &[0, 1, 2]).unwrap(), vec![3, 5, 70]);
    assert_eq!(search(&index, &[2, 1, 0]).unwrap(), vec![3, 5, 70]);
}

#[test]
fn test_search_five_tags_mixed() {
    let all: Vec<u32> = (0..=200_000).collect();
    let evens: Vec<u32> = (0..=200_000).filter(|i| i % 2 == 0).collect();
    let threes: Vec<u32> = (0..=200_000).filter(|i| i % 3 == 0).collect();
    let sparse_a: Vec<u32> = (0..=200_000).filter(|i| i % 997 == 0).collect();
    let sparse_b: Vec<u32> = (0..=200_000).filter(|i| i % 6 == 0).collect();
    let tags: Vec<&[u32]> = vec![&all, &evens, &threes, &sparse_a, &sparse_b];
    let index = build_index(200_000, &tags);

    let query = [0, 1, 2, 3, 4];
    let expected = brute_force(&tags, &query);
    assert!(!expected.is_empty());
    assert_eq!(search(&index, &query).unwrap(), expected);
}

// ---- Algebraic laws ----

fn random_tags(rng: &mut StdRng, tag_count: usize, max_id: u32) -> Vec<Vec<u32>> {
    (0..tag_count)
        .map(|_| {
            let density = rng.gen_range(0.0..0.4);
            (0..=max_id).filter(|_| rng.gen_bool(density)).collect()
        })
        .collect()
}

#[test]
fn test_search_is_permutation_invariant() {
    let mut rng = StdRng::seed_from_u64(42);
    let tags = random_tags(&mut rng, 6, 4000);
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();
    // A low threshold mixes representations across the random tags.
    let index = build_index_with_threshold(4000, &slices, 700);

    let mut searcher = Searcher::new();
    for _ in 0..20 {
        let len = rng.gen_range(1..=4);
        let mut query: Vec<u32> = (0..len).map(|_| rng.gen_range(0..6)).collect();

        let baseline = searcher.search(&index, &query).unwrap();
        for _ in 0..5 {
            // Fisher-Yates shuffle.
            for i in (1..query.len()).rev() {
                query.swap(i, rng.gen_range(0..=i));
            }
            assert_eq!(searcher.search(&index, &query).unwrap(), baseline);
        }
    }
}

#[test]
fn test_search_is_idempotent_under_duplicates() {
    let mut rng = StdRng::seed_from_u64(43);
    let tags = random_tags(&mut rng, 4, 2000);
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();
    let index = build_index_with_threshold(2000, &slices, 400);

    let once = search(&index, &[0, 2]).unwrap();
    let repeated = search(&index, &[0, 2, 0, 2, 2]).unwrap();
    assert_eq!(once, repeated);
}

#[test]
fn test_search_is_monotone_in_query_length() {
    let mut rng = StdRng::seed_from_u64(44);
    let tags = random_tags(&mut rng, 5, 3000);
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();
    let index = build_index_with_threshold(3000, &slices, 500);

    let mut query = vec![1u32];
    let mut prev = search(&index, &query).unwrap();
    for tag in [3u32, 0, 4, 2] {
        query.push(tag);
        let next = search(&index, &query).unwrap();
        assert!(next.iter().all(|id| prev.binary_search(id).is_ok()));
        prev = next;
    }
}

#[test]
fn test_search_representation_equivalence() {
    let mut rng = StdRng::seed_from_u64(45);
    let tags = random_tags(&mut rng, 5, 2500);
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();

    // The same corpus three ways: all posting lists, all bitmaps, mixed.
    let as_ids = build_index_with_threshold(2500, &slices, u32::MAX);
    let as_dense = build_index_with_threshold(2500, &slices, 1);
    let mixed = build_index_with_threshold(2500, &slices, 600);

    let mut searcher = Searcher::new();
    let queries: [&[u32]; 5] = [&[0], &[0, 1], &[2, 3, 4], &[0, 1, 2, 3, 4], &[4, 0]];
    for query in queries {
        let expected = brute_force(&slices, query);
        assert_eq!(searcher.search(&as_ids, query).unwrap(), expected);
        assert_eq!(searcher.search(&as_dense, query).unwrap(), expected);
        assert_eq!(searcher.search(&mixed, query).unwrap(), expected);
    }
}

#[test]
fn test_search_output_is_sorted_and_bounded() {
    let mut rng = StdRng::seed_from_u64(46);
    let tags = random_tags(&mut rng, 6, 5000);
    let slices: Vec<&[u32]> = tags.iter().map(Vec::as_slice).collect();
    let index = build_index_with_threshold(5000, &slices, 900);

    let mut searcher = Searcher::new();
    for _ in 0..30 {
        let len = rng.gen_range(1..=5);
        let query: Vec<u32> = (0..len).map(|_| rng.gen_range(0..6)).collect();
        let result = searcher.search(&index, &query).unwrap();

        assert!(result.windows(2).all(|w| w[0] < w[1]));
        for &id in &result {
            assert!(id <= index.max_id());
            for &tag in &query {
                assert!(slices[tag as usize].binary_search(&id).is_ok());
            }
        }
    }
}

#[test]
fn test_searcher_reuse_leaves_no_state_behind() {
    let a: Vec<u32> = (0..=100_000).collect();
    let b: Vec<u32> = vec![10, 20, 30];
    let c: Vec<u32> = vec![20, 40];
    let index = build_index(100_000, &[a.as_slice(), b.as_slice(), c.as_slice()]);

    let mut searcher = Searcher::new();
    assert_eq!(searcher.search(&index, &[0, 1]).unwrap(), vec![10, 20, 30]);
    // A stale working bitmap would leak 10 and 30 into this result.
    assert_eq!(searcher.search(&index, &[0, 2]).unwrap(), vec![20, 40]);
    assert_eq!(searcher.search(&index, &[0, 1, 2]).unwrap(), vec![20]);
}

#[test]
fn test_search_into_reuses_the_output_vector() {
    let index = build_index(100, &[&[1, 2, 3], &[2, 3, 4]]);
    let mut searcher = Searcher::new();
    let mut out = vec![99, 98, 97];
    searcher.search_into(&index, &[0, 1], &mut out).unwrap();
    assert_eq!(out, vec![2, 3]);
}
