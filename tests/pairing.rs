//! Integration coverage for the cross-file pairing engine, exercising the
//! three phases together rather than in isolation.

use fastq_ingest_core::defline::cascade::classify_cascade;
use fastq_ingest_core::file_pairing::{SpotPairing, find_2d_companion, pair_strict, reconcile_orphans};

#[test]
fn strict_phase_handles_a_whole_lockstep_run() {
    let left: Vec<_> = (1..=4)
        .map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 1:N:18:ATCACG"), None))
        .collect();
    let right: Vec<_> = (1..=4)
        .map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 2:N:18:ATCACG"), None))
        .collect();

    let (paired, left_orphans, right_orphans) = pair_strict(&left, &right);

    assert_eq!(paired.len(), 4);
    assert!(left_orphans.is_empty());
    assert!(right_orphans.is_empty());
    for (i, p) in paired.iter().enumerate() {
        assert_eq!(*p, SpotPairing::Strict { left: i, right: i });
    }
}

#[test]
fn strict_phase_leaves_unequal_length_tails_as_orphans() {
    let left: Vec<_> = (1..=3)
        .map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 1:N:18:ATCACG"), None))
        .collect();
    let right: Vec<_> = (1..=1)
        .map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 2:N:18:ATCACG"), None))
        .collect();

    let (paired, left_orphans, right_orphans) = pair_strict(&left, &right);

    assert_eq!(paired.len(), 1);
    assert_eq!(left_orphans, vec![1, 2]);
    assert!(right_orphans.is_empty());
}

#[test]
fn strict_then_orphan_reconciliation_recovers_scrambled_mates() {
    // Three read-1 deflines interleaved with their mates in scrambled order
    // on the read-2 side, as if a downstream tool re-sorted one file.
    let left = [1, 2, 3].map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 1:N:18:ATCACG"), None));
    let right = [3, 1, 2].map(|i| classify_cascade(&format!("@EAS139:136:FC706VJ:2:2104:{i}:{i} 2:N:18:ATCACG"), None));

    let (strict_paired, left_orphans, right_orphans) = pair_strict(&left, &right);
    assert!(strict_paired.is_empty());
    assert_eq!(left_orphans, vec![0, 1, 2]);
    assert_eq!(right_orphans, vec![0, 1, 2]);

    let left_carry: Vec<_> = left_orphans.into_iter().map(|i| (i, left[i].clone())).collect();
    let right_carry: Vec<_> = right_orphans.into_iter().map(|i| (i, right[i].clone())).collect();

    let (reconciled, unmatched_left, unmatched_right) = reconcile_orphans(&left_carry, &right_carry, Some(7));

    assert_eq!(reconciled.len(), 3);
    assert!(unmatched_left.is_empty());
    assert!(unmatched_right.is_empty());
    for p in &reconciled {
        let SpotPairing::Reconciled { left_index, right_index } = p else { panic!("expected a reconciled pairing") };
        assert_eq!(left[*left_index].name, right[*right_index].name);
    }
}

#[test]
fn reconciliation_leaves_a_true_orphan_unmatched() {
    let left = vec![
        (0, classify_cascade("@EAS139:136:FC706VJ:2:2104:1:1 1:N:18:AAA", None)),
        (1, classify_cascade("@EAS139:136:FC706VJ:2:2104:99:99 1:N:18:AAA", None)),
    ];
    let right = vec![(0, classify_cascade("@EAS139:136:FC706VJ:2:2104:1:1 2:N:18:AAA", None))];

    let (paired, unmatched_left, unmatched_right) = reconcile_orphans(&left, &right, Some(3));

    assert_eq!(paired.len(), 1);
    assert_eq!(unmatched_left, vec![1]);
    assert!(unmatched_right.is_empty());
}

#[test]
fn nanopore_2d_companion_attaches_to_the_right_channel_and_read() {
    let template = classify_cascade("@channel_4_read_12_template", None);
    let complement = classify_cascade("@channel_4_read_12_complement", None);
    assert_eq!(template.name, complement.name);

    let two_d = vec![
        (2usize, classify_cascade("@channel_4_read_7_twodirections", None)),
        (5usize, classify_cascade("@channel_4_read_12_twodirections", None)),
    ];

    let found = find_2d_companion(&template.name, &two_d);
    assert_eq!(found, Some(5));
}

#[test]
fn nanopore_2d_companion_is_absent_when_no_consensus_was_emitted() {
    let template = classify_cascade("@channel_9_read_1_template", None);
    let two_d = vec![(0usize, classify_cascade("@channel_9_read_2_twodirections", None))];

    assert_eq!(find_2d_companion(&template.name, &two_d), None);
}
