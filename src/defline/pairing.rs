//! The `is_paired_deflines` predicate, shared by the classifier and the
//! [`crate::file_pairing`] engine. This module answers one narrow question —
//! do two deflines describe mates of the same spot, and if so which one is
//! read 1 — it does not do any file-level bookkeeping.

use super::{Defline, Platform, PoreRead, TagType};

/// The outcome of comparing two deflines for mate-ness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairResult {
    /// The two deflines cannot be mates of the same spot.
    NotPaired,
    /// They are mates, but defline content alone does not establish order.
    Paired,
    /// They are mates, and `d1` is read 1.
    FirstIsRead1,
    /// They are mates, and `d2` is read 1.
    FirstIsRead2,
}

/// Compares two classified deflines and decides whether they are mates, and
/// if so, which is read 1.
///
/// `same_read_num` requests the seq/qual-pairing confirmation mode: it
/// reports [`PairResult::Paired`] when both names and `read_num`s agree
/// (and tag types agree, when both sides carry one), rather than assigning
/// an order — the two streams are already known to march in lockstep, so
/// there is nothing left to order.
#[must_use]
pub fn is_paired_deflines(d1: &Defline, d2: &Defline, same_read_num: bool) -> PairResult {
    if same_read_num {
        let names_and_read_nums_match =
            d1.name == d2.name && !d1.read_num.is_empty() && !d2.read_num.is_empty() && d1.read_num == d2.read_num;
        let tags_match = match (absolid_tag(d1), absolid_tag(d2)) {
            (Some(t1), Some(t2)) => t1 == t2,
            _ => true,
        };
        return if names_and_read_nums_match && tags_match { PairResult::Paired } else { PairResult::NotPaired };
    }

    if d1.name != d2.name {
        return PairResult::NotPaired;
    }

    match (d1.read_num.parse::<u32>(), d2.read_num.parse::<u32>()) {
        (Ok(r1), Ok(r2)) => {
            if r1 < r2 {
                PairResult::FirstIsRead1
            } else {
                PairResult::FirstIsRead2
            }
        }
        _ => match (d1.variant.platform(), d2.variant.platform()) {
            (Platform::Nanopore, Platform::Nanopore) => nanopore_pair(d1, d2),
            (Platform::Absolid, Platform::Absolid) => absolid_pair(d1, d2),
            _ => legacy_tie_break(d1, d2),
        },
    }
}

/// Nanopore mates pair a `Template` read with its `Complement`; a `TwoD`
/// (merged) read is never paired here — it is reconciled separately as a
/// companion of an already-paired template/complement spot. Names are
/// already known equal by the caller.
fn nanopore_pair(d1: &Defline, d2: &Defline) -> PairResult {
    let (Some(pr1), Some(pr2)) = (nanopore_pore_read(d1), nanopore_pore_read(d2)) else {
        return PairResult::NotPaired;
    };
    match (pr1, pr2) {
        (PoreRead::Template, PoreRead::Complement) => PairResult::FirstIsRead1,
        (PoreRead::Complement, PoreRead::Template) => PairResult::FirstIsRead2,
        _ => PairResult::NotPaired,
    }
}

fn nanopore_pore_read(d: &Defline) -> Option<PoreRead> {
    match d.platform_fields {
        super::PlatformFields::Nanopore { pore_read, .. } => pore_read,
        _ => None,
    }
}

/// ABSOLiD mate order is fixed by tag type rather than by position: an `F3`
/// tag always wins read-1 regardless of which file it appears in first.
fn absolid_pair(d1: &Defline, d2: &Defline) -> PairResult {
    if d1.name != d2.name {
        return PairResult::NotPaired;
    }
    let (Some(t1), Some(t2)) = (absolid_tag(d1), absolid_tag(d2)) else {
        return PairResult::NotPaired;
    };
    if t1 == t2 {
        return PairResult::NotPaired;
    }
    if t1 == TagType::F3 {
        PairResult::FirstIsRead1
    } else if t2 == TagType::F3 {
        PairResult::FirstIsRead2
    } else {
        PairResult::Paired
    }
}

fn absolid_tag(d: &Defline) -> Option<TagType> {
    match &d.platform_fields {
        super::PlatformFields::Absolid { tag_type, .. } => *tag_type,
        _ => None,
    }
}

/// For platforms with no structural mate-order signal (LS454, PacBio, Ion
/// Torrent, Sanger/Newbler, Undefined), two equal-name equal-variant
/// deflines are declared paired with the first-encountered one read 1. This
/// is a legacy convention rather than a structural fact about the data.
fn legacy_tie_break(d1: &Defline, d2: &Defline) -> PairResult {
    if d1.name == d2.name {
        PairResult::FirstIsRead1
    } else {
        let _ = d2;
        PairResult::NotPaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defline::cascade::classify_cascade;

    #[test]
    fn illumina_mates_by_read_num() {
        let d1 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None);
        let d2 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 2:N:18:ATCACG", None);
        assert_eq!(is_paired_deflines(&d1, &d2, false), PairResult::FirstIsRead1);
    }

    #[test]
    fn same_read_num_mode_confirms_matching_name_and_read_num() {
        let d1 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None);
        let d2 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None);
        assert_eq!(is_paired_deflines(&d1, &d2, true), PairResult::Paired);
    }

    #[test]
    fn same_read_num_mode_rejects_differing_read_num() {
        let d1 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None);
        let d2 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 2:N:18:ATCACG", None);
        assert_eq!(is_paired_deflines(&d1, &d2, true), PairResult::NotPaired);
    }

    fn absolid_defline(name: &str, read_num: &str, tag: TagType) -> Defline {
        Defline {
            variant: crate::defline::Variant::Absolid,
            raw: String::new(),
            name: name.to_owned(),
            read_num: read_num.to_owned(),
            filter_flag: 0,
            spot_group: String::new(),
            qiime_name: None,
            platform_fields: crate::defline::PlatformFields::Absolid { panel: name.to_owned(), tag_type: Some(tag) },
        }
    }

    #[test]
    fn same_read_num_mode_rejects_mismatched_tag_types() {
        let d1 = absolid_defline("1_58_36", "1", TagType::F3);
        let d2 = absolid_defline("1_58_36", "1", TagType::R3);
        assert_eq!(is_paired_deflines(&d1, &d2, true), PairResult::NotPaired);
    }

    #[test]
    fn same_read_num_mode_accepts_matching_tag_types() {
        let d1 = absolid_defline("1_58_36", "1", TagType::F3);
        let d2 = absolid_defline("1_58_36", "1", TagType::F3);
        assert_eq!(is_paired_deflines(&d1, &d2, true), PairResult::Paired);
    }

    #[test]
    fn absolid_f3_wins_regardless_of_order() {
        let d1 = classify_cascade("@1_58_36_R3", None);
        let d2 = classify_cascade("@1_58_36_F3", None);
        assert_eq!(is_paired_deflines(&d1, &d2, false), PairResult::FirstIsRead2);
    }

    #[test]
    fn nanopore_template_complement() {
        let d1 = classify_cascade("@channel_4_read_12_template", None);
        let d2 = classify_cascade("@channel_4_read_12_complement", None);
        assert_eq!(is_paired_deflines(&d1, &d2, false), PairResult::FirstIsRead1);
    }

    #[test]
    fn unrelated_names_never_pair() {
        let d1 = classify_cascade("@m140101_000000_00000_c000000000000000000_s1_p0/1/0_100", None);
        let d2 = classify_cascade("@m140101_000000_00000_c000000000000000000_s1_p0/2/0_100", None);
        assert_eq!(is_paired_deflines(&d1, &d2, false), PairResult::NotPaired);
    }
}
