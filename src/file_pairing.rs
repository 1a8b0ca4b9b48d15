//! The cross-file mate-pairing engine.
//!
//! Unlike [`crate::defline::pairing`], which only judges whether two
//! already-classified deflines describe the same spot, this module owns the
//! bookkeeping of matching up whole *files* of records: a strict phase that
//! assumes two files march in lockstep, an orphan-tolerant phase that
//! reconciles reads whose mates are scattered, and a Nanopore-specific phase
//! that attaches a two-directions companion read to an already-paired
//! template/complement spot.

use crate::defline::{Defline, is_paired_deflines, pairing::PairResult};
use crate::utils::SeededMap;

/// The number of records [`reconcile_orphans`] will scan looking for a
/// match before giving up on a given orphan.
pub const ORPHAN_SCAN_CAP: usize = 50_000;

/// One read carried forward while its mate has not yet been seen.
#[derive(Debug, Clone)]
pub struct OrphanCarrier {
    pub defline: Defline,
    pub index:   usize,
}

/// The result of pairing one spot across two record streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotPairing {
    /// Record at `left` in the first stream is read 1, `right` in the
    /// second stream is read 2.
    Strict { left: usize, right: usize },
    /// An orphan from `left_index` in the first stream found its mate at
    /// `right_index`, out of strict lockstep.
    Reconciled { left_index: usize, right_index: usize },
}

/// Phase A: walks both streams of already-classified deflines in lockstep,
/// assuming each position in stream 1 mates with the same position in
/// stream 2. Returns the pairing for as many positions as both streams
/// cover, plus the deflines that failed the strict check (for phase B).
#[must_use]
pub fn pair_strict(left: &[Defline], right: &[Defline]) -> (Vec<SpotPairing>, Vec<usize>, Vec<usize>) {
    let mut paired = Vec::new();
    let mut left_orphans = Vec::new();
    let mut right_orphans = Vec::new();

    let n = left.len().min(right.len());
    for i in 0..n {
        match is_paired_deflines(&left[i], &right[i], false) {
            PairResult::FirstIsRead1 | PairResult::Paired => paired.push(SpotPairing::Strict { left: i, right: i }),
            PairResult::FirstIsRead2 => paired.push(SpotPairing::Strict { left: i, right: i }),
            PairResult::NotPaired => {
                left_orphans.push(i);
                right_orphans.push(i);
            }
        }
    }
    for i in n..left.len() {
        left_orphans.push(i);
    }
    for i in n..right.len() {
        right_orphans.push(i);
    }

    (paired, left_orphans, right_orphans)
}

/// Phase B: for reads that failed strict lockstep pairing, reconciles them
/// against each other by canonical name, scanning at most
/// [`ORPHAN_SCAN_CAP`] candidates per orphan before giving up and leaving it
/// unpaired.
#[must_use]
pub fn reconcile_orphans(left: &[(usize, Defline)], right: &[(usize, Defline)], seed: Option<u64>) -> (Vec<SpotPairing>, Vec<usize>, Vec<usize>) {
    let mut by_name: SeededMap<String, Vec<usize>> = SeededMap::new(seed);
    for (pos, (_, defline)) in right.iter().enumerate() {
        by_name.get_mut(&defline.name).map(|v: &mut Vec<usize>| v.push(pos)).unwrap_or_else(|| {
            by_name.insert(defline.name.clone(), vec![pos]);
        });
    }

    let mut paired = Vec::new();
    let mut matched_right = vec![false; right.len()];
    let mut unmatched_left = Vec::new();

    for (scanned, (left_idx, left_defline)) in left.iter().enumerate() {
        if scanned > ORPHAN_SCAN_CAP {
            unmatched_left.push(*left_idx);
            continue;
        }
        let candidates = by_name.get(&left_defline.name);
        let found = candidates.and_then(|positions| {
            positions.iter().find(|&&pos| {
                !matched_right[pos] && is_paired_deflines(left_defline, &right[pos].1, false) != PairResult::NotPaired
            })
        });
        match found {
            Some(&pos) => {
                matched_right[pos] = true;
                paired.push(SpotPairing::Reconciled { left_index: *left_idx, right_index: right[pos].0 });
            }
            None => unmatched_left.push(*left_idx),
        }
    }

    let unmatched_right =
        right.iter().enumerate().filter(|(pos, _)| !matched_right[*pos]).map(|(_, (idx, _))| *idx).collect();

    (paired, unmatched_left, unmatched_right)
}

/// Phase C: attaches a Nanopore two-directions ("2D") consensus read to the
/// template/complement spot it summarizes, rather than treating it as a
/// third mate.
#[must_use]
pub fn find_2d_companion(spot_name: &str, two_d_reads: &[(usize, Defline)]) -> Option<usize> {
    two_d_reads.iter().find(|(_, d)| d.name == spot_name).map(|(idx, _)| *idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defline::cascade::classify_cascade;

    #[test]
    fn strict_pairs_matching_positions() {
        let left = vec![classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None)];
        let right = vec![classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 2:N:18:ATCACG", None)];
        let (paired, lo, ro) = pair_strict(&left, &right);
        assert_eq!(paired.len(), 1);
        assert!(lo.is_empty() && ro.is_empty());
    }

    #[test]
    fn orphans_reconcile_out_of_order() {
        let left = vec![
            (0, classify_cascade("@EAS139:136:FC706VJ:2:2104:1:1 1:N:18:AAA", None)),
            (1, classify_cascade("@EAS139:136:FC706VJ:2:2104:2:2 1:N:18:AAA", None)),
        ];
        let right = vec![
            (0, classify_cascade("@EAS139:136:FC706VJ:2:2104:2:2 2:N:18:AAA", None)),
            (1, classify_cascade("@EAS139:136:FC706VJ:2:2104:1:1 2:N:18:AAA", None)),
        ];
        let (paired, unmatched_left, unmatched_right) = reconcile_orphans(&left, &right, Some(1));
        assert_eq!(paired.len(), 2);
        assert!(unmatched_left.is_empty() && unmatched_right.is_empty());
    }

    #[test]
    fn nanopore_2d_finds_companion_by_name() {
        let two_d = vec![(5usize, classify_cascade("@channel_4_read_12_twodirections", None))];
        let found = find_2d_companion("channel_4_read_12", &two_d);
        assert_eq!(found, Some(5));
    }
}
