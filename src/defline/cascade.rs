//! The ordered cascade of header-grammar matchers.
//!
//! Each `try_*` function either returns `Some(Defline)` or `None`; the
//! cascade tries them strictly in a fixed order because several grammars
//! accept strict supersets of others. [`classify_cascade`] runs the whole
//! cascade; [`classify_locked`] re-applies only a single, previously latched
//! variant against a static per-variant table rather than rebinding a regex
//! at runtime.

use super::{Defline, Direction, IlluminaFields, PlatformFields, PoreRead, TagType, Variant};

const ABSOLID_TAGS: &[(&str, TagType)] = &[
    ("F5-BC", TagType::F5Bc),
    ("F5-P2", TagType::F5P2),
    ("F5-RNA", TagType::F5Rna),
    ("F5-DNA", TagType::F5Dna),
    ("F3", TagType::F3),
    ("R3", TagType::R3),
    ("BC", TagType::Bc),
];

fn body_of(raw: &str) -> &str {
    raw.trim_start_matches(['@', '>'])
}

fn is_uint(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_int(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    is_uint(s)
}

fn apply_qiime_prefix(d: &mut Defline, title_prefix: Option<&str>) {
    if let Some(prefix) = title_prefix
        && !prefix.is_empty()
    {
        d.name = format!("{prefix}{}", d.name);
    }
}

/// Cascade item 1: HELICOS, a strictly numeric 5-tuple behind a `VHE-`
/// prefix.
fn try_helicos(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let rest = name_token.strip_prefix("VHE-")?;
    let fields: Vec<&str> = rest.split(['_', '-']).collect();
    if fields.len() < 5 {
        return None;
    }
    let tail = &fields[fields.len() - 5..];
    if !tail.iter().all(|f| !f.is_empty()) {
        return None;
    }
    let mut d = Defline {
        variant: Variant::Helicos,
        raw: raw.to_owned(),
        name: name_token.to_owned(),
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::Helicos {
            flowcell: tail[0].to_owned(),
            channel:  tail[1].to_owned(),
            field:    tail[2].to_owned(),
            camera:   tail[3].to_owned(),
            position: tail[4].to_owned(),
        },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 2: ABSOLiD, requiring one of the ABI tag-type suffixes.
fn try_absolid(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let (panel, tag) = ABSOLID_TAGS
        .iter()
        .find_map(|(suffix, tag)| name_token.strip_suffix(suffix).map(|panel| (panel, *tag)))?;
    let panel = panel.trim_end_matches('_');
    if panel.is_empty() {
        return None;
    }
    let mut d = Defline {
        variant: Variant::Absolid,
        raw: raw.to_owned(),
        name: panel.to_owned(),
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::Absolid { panel: panel.to_owned(), tag_type: Some(tag) },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

struct IlluminaNewMatch {
    prefix:      String,
    lane:        u32,
    tile:        u32,
    x:           i64,
    y:           i64,
    read_num:    String,
    filter_flag: u8,
    spot_group:  String,
    has_junk:    bool,
}

/// Parses the Illumina 1.8+ style header:
/// `<prefix>:<run>:<flowcell>:<lane>:<tile>:<x>:<y> <read>:<filter>:<control>:<index>[...]`.
/// `<prefix>` may be empty (the "no-prefix" sub-pattern).
fn parse_illumina_new(body: &str) -> Option<IlluminaNewMatch> {
    let mut parts = body.splitn(2, char::is_whitespace);
    let name_part = parts.next()?;
    let tag_part = parts.next()?.trim_start();

    let name_fields: Vec<&str> = name_part.split(':').collect();
    if name_fields.len() < 5 {
        return None;
    }
    let tail = &name_fields[name_fields.len() - 5..];
    if !tail.iter().all(|f| is_int(f)) {
        return None;
    }
    let lane: u32 = tail[1].parse().ok()?;
    let tile: u32 = tail[2].parse().ok()?;
    let x: i64 = tail[3].parse().ok()?;
    let y: i64 = tail[4].parse().ok()?;
    let prefix = name_fields[..name_fields.len() - 5].join(":");

    let tag_fields: Vec<&str> = tag_part.split(':').collect();
    if tag_fields.len() < 2 {
        return None;
    }
    let read_num = tag_fields[0].to_owned();
    let filter_flag = match tag_fields[1] {
        "Y" | "y" => 1,
        "N" | "n" => 0,
        _ => return None,
    };
    let spot_group = tag_fields.get(3).map(|s| s.to_string()).unwrap_or_default();
    let has_junk = tag_fields.len() > 4;

    Some(IlluminaNewMatch { prefix, lane, tile, x, y, read_num, filter_flag, spot_group, has_junk })
}

/// Doubled-defline detection and repair: when `spot_group` literally
/// contains `name` (both mates were concatenated in one header), trims
/// everything from that occurrence onward, stepping back over its
/// one-character separator so the second mate's text is removed. Returns
/// whether a repair was made.
fn repair_doubled_spot_group(spot_group: &mut String, name: &str) -> bool {
    match spot_group.find(name) {
        Some(pos) if pos > 0 => {
            spot_group.truncate(pos - 1);
            true
        }
        _ => false,
    }
}

/// Cascade item 3: ILLUMINA_NEW family (canonical / no-prefix / with-junk).
fn try_illumina_new(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let m = parse_illumina_new(body)?;
    let variant = if m.has_junk {
        Variant::IlluminaNewWithJunk
    } else if m.prefix.is_empty() {
        Variant::IlluminaNewNoPrefix
    } else {
        Variant::IlluminaNew
    };
    let name_field_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let name = body[..name_field_end].to_owned();
    let mut spot_group = m.spot_group;

    let variant = if repair_doubled_spot_group(&mut spot_group, &name) { Variant::IlluminaNewDouble } else { variant };

    let mut d = Defline {
        variant,
        raw: raw.to_owned(),
        name,
        read_num: m.read_num,
        filter_flag: m.filter_flag,
        spot_group,
        qiime_name: None,
        platform_fields: PlatformFields::Illumina(IlluminaFields {
            prefix: m.prefix,
            lane: Some(m.lane),
            tile: Some(m.tile),
            x: Some(m.x),
            y: Some(m.y),
        }),
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

struct IlluminaOldMatch {
    prefix:     String,
    lane:       i64,
    tile:       i64,
    x:          i64,
    y:          i64,
    spot_group: String,
    read_num:   String,
    delim:      char,
}

/// Parses the legacy Illumina header:
/// `<prefix><delim><lane><delim><tile><delim><x><delim><y>[#<barcode>][/<readnum>]`,
/// where `<delim>` is `:` or `_`.
fn parse_illumina_old(name_token: &str, delim: char) -> Option<IlluminaOldMatch> {
    let (core, read_num) = match name_token.rsplit_once('/') {
        Some((core, rn)) if !rn.is_empty() && rn.bytes().all(|b| b.is_ascii_digit()) => (core, rn.to_owned()),
        _ => (name_token, String::new()),
    };
    let (core, spot_group) = match core.rsplit_once('#') {
        Some((core, bc)) if !bc.is_empty() => (core, bc.to_owned()),
        _ => (core, String::new()),
    };

    let fields: Vec<&str> = core.split(delim).collect();
    if fields.len() < 4 {
        return None;
    }
    let tail = &fields[fields.len() - 4..];
    if !tail.iter().all(|f| is_int(f)) {
        return None;
    }
    let lane: i64 = tail[0].parse().ok()?;
    let tile: i64 = tail[1].parse().ok()?;
    let x: i64 = tail[2].parse().ok()?;
    let y: i64 = tail[3].parse().ok()?;
    let prefix = fields[..fields.len() - 4].join(&delim.to_string());

    Some(IlluminaOldMatch { prefix, lane, tile, x, y, spot_group, read_num, delim })
}

/// Discards up to two trailing numeric prefix fields that spill from the
/// lane/tile/x/y tuple when both `x<3` and `y<3`. Mutates `m` in place and
/// returns how many fields were discarded.
fn discard_illumina_extra_numbers(m: &mut IlluminaOldMatch) -> u8 {
    if m.y >= 3 || m.x >= 3 {
        return 0;
    }
    let mut prefix_fields: Vec<&str> = m.prefix.split(m.delim).collect();
    let mut discarded = 0u8;
    while discarded < 2 {
        let Some(last) = prefix_fields.last() else { break };
        if !is_int(last) {
            break;
        }
        prefix_fields.pop();
        discarded += 1;
    }
    if discarded > 0 {
        m.prefix = prefix_fields.join(&m.delim.to_string());
    }
    discarded
}

/// Cascade item 4: ILLUMINA_OLD family, run after ILLUMINA_NEW.
fn try_illumina_old(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;

    let (mut m, base_variant) = parse_illumina_old(name_token, ':')
        .map(|m| (m, Variant::IlluminaOld))
        .or_else(|| parse_illumina_old(name_token, '_').map(|m| (m, Variant::IlluminaOldUnderscore)))?;

    discard_illumina_extra_numbers(&mut m);

    let has_junk = body.find(char::is_whitespace).is_some() && body[name_token.len()..].trim().split(':').count() > 1;
    let variant = if has_junk {
        if base_variant == Variant::IlluminaOld {
            Variant::IlluminaOldWithJunkTail
        } else {
            Variant::IlluminaOldWithJunk2
        }
    } else if m.prefix.is_empty() {
        Variant::IlluminaOldNoPrefix
    } else {
        base_variant
    };

    let name = format!("{prefix}{d}{lane}{d}{tile}{d}{x}{d}{y}", prefix = m.prefix, d = m.delim, lane = m.lane, tile = m.tile, x = m.x, y = m.y);

    let mut d = Defline {
        variant,
        raw: raw.to_owned(),
        name,
        read_num: m.read_num,
        filter_flag: 0,
        spot_group: m.spot_group,
        qiime_name: None,
        platform_fields: PlatformFields::Illumina(IlluminaFields {
            prefix: m.prefix,
            lane: u32::try_from(m.lane).ok(),
            tile: u32::try_from(m.tile).ok(),
            x: Some(m.x),
            y: Some(m.y),
        }),
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

fn extract_qiime_bc_tags(body: &str) -> Option<(&str, bool)> {
    for key in ["orig_bc=", "new_bc=", "bc_diffs="] {
        if let Some(pos) = body.find(key) {
            return Some((body[..pos].trim_end(), true));
        }
    }
    None
}

fn qiime_label(head: &str) -> (String, String) {
    match head.rsplit_once('_') {
        Some((label, _index)) => (label.to_owned(), head.to_owned()),
        None => (head.to_owned(), head.to_owned()),
    }
}

/// Cascade items 5/6: QIIME-wrapped Illumina headers, upgrading the base
/// variant when `orig_bc=`/`new_bc=`/`bc_diffs=` is present.
fn try_qiime_illumina(raw: &str) -> Option<Defline> {
    let body = body_of(raw);
    let (head, has_bc) = extract_qiime_bc_tags(body)?;
    let mut pieces = head.splitn(2, char::is_whitespace);
    let qiime_part = pieces.next()?;
    let illumina_part = pieces.next()?;
    let (label, _) = qiime_label(qiime_part);

    let rebuilt = format!("@{illumina_part}");
    let mut inner = try_illumina_new(&rebuilt, None).or_else(|| try_illumina_old(&rebuilt, None))?;

    inner.raw = raw.to_owned();
    inner.qiime_name = Some(label);
    inner.variant = match inner.variant.platform() {
        super::Platform::Illumina if matches!(
            inner.variant,
            Variant::IlluminaNew | Variant::IlluminaNewNoPrefix | Variant::IlluminaNewWithJunk | Variant::IlluminaNewDouble
        ) =>
        {
            if has_bc {
                Variant::QiimeIlluminaNewBc
            } else {
                Variant::QiimeIlluminaNew
            }
        }
        _ => {
            if has_bc {
                Variant::QiimeIlluminaOldBc
            } else {
                Variant::QiimeIlluminaOld
            }
        }
    };
    Some(inner)
}

/// Cascade item 7: LS454 (Roche/454), `prefix? 7-alnum 2-digit 5-alnum [/n]`.
fn try_ls454(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let (core, read_num) = match name_token.rsplit_once('/') {
        Some((core, rn)) if !rn.is_empty() && rn.bytes().all(|b| b.is_ascii_digit()) => (core, rn.to_owned()),
        _ => (name_token, String::new()),
    };

    let alnum = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric());
    let (region_candidates, date_len) = if core.len() >= 14 { (core.len() - 14, 7) } else { return None };
    if region_candidates > 1 {
        return None;
    }
    let prefix = &core[..region_candidates];
    let rest = &core[region_candidates..];
    if rest.len() != 14 {
        return None;
    }
    let date_hash = &rest[..date_len];
    let region = &rest[date_len..date_len + 2];
    let xy = &rest[date_len + 2..];
    if !alnum(date_hash) || !region.bytes().all(|b| b.is_ascii_digit()) || !alnum(xy) {
        return None;
    }
    if !prefix.is_empty() && !prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    let mut d = Defline {
        variant: Variant::Ls454,
        raw: raw.to_owned(),
        name: core.to_owned(),
        read_num,
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::Ls454 { date_hash: date_hash.to_owned(), region: region.to_owned(), xy: xy.to_owned() },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 8: QIIME-wrapped 454 headers.
fn try_qiime_454(raw: &str) -> Option<Defline> {
    let body = body_of(raw);
    let (head, has_bc) = extract_qiime_bc_tags(body)?;
    let mut pieces = head.splitn(2, char::is_whitespace);
    let qiime_part = pieces.next()?;
    let rest_part = pieces.next()?;
    let (label, _) = qiime_label(qiime_part);

    let rebuilt = format!("@{rest_part}");
    let mut inner = try_ls454(&rebuilt, None)?;
    inner.raw = raw.to_owned();
    inner.qiime_name = Some(label);
    inner.variant = if has_bc { Variant::QiimeLs454Bc } else { Variant::QiimeLs454 };
    Some(inner)
}

/// Cascade item 9: PacBio, `m<digits>_<digits>_.../s<N>_p<N>/hole/start_end`.
fn try_pacbio(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    if !name_token.starts_with('m') {
        return None;
    }
    if !(name_token.contains("_s") && name_token.contains("_p") && name_token.contains('/')) {
        return None;
    }
    let mut d = Defline {
        variant: Variant::Pacbio,
        raw: raw.to_owned(),
        name: name_token.to_owned(),
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::None,
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 10: Ion Torrent, `<5-alnum>:<1-5 digit>:<1-5 digit>`.
fn try_ion_torrent(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let fields: Vec<&str> = name_token.split(':').collect();
    if fields.len() != 3 {
        return None;
    }
    let [run_id, row, column] = [fields[0], fields[1], fields[2]];
    if run_id.len() != 5 || !run_id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    if !(1..=5).contains(&row.len()) || !is_uint(row) {
        return None;
    }
    if !(1..=5).contains(&column.len()) || !is_uint(column) {
        return None;
    }
    let mut d = Defline {
        variant: Variant::IonTorrent,
        raw: raw.to_owned(),
        name: name_token.to_owned(),
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::IonTorrent {
            run_id: run_id.to_owned(),
            row: row.parse().unwrap_or_default(),
            column: column.parse().unwrap_or_default(),
        },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 11: degenerate ILLUMINA_OLD_BC_RN forms: a bare name with a
/// `#barcode` and/or `/readnum` suffix but no lane/tile/x/y tuple.
fn try_illumina_old_bc_rn(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let (core, read_num) = match name_token.rsplit_once('/') {
        Some((core, rn)) if !rn.is_empty() && rn.bytes().all(|b| b.is_ascii_digit()) => (core, rn.to_owned()),
        _ => (name_token, String::new()),
    };
    let (core, spot_group) = match core.rsplit_once('#') {
        Some((core, bc)) if !bc.is_empty() => (core, bc.to_owned()),
        _ => (core, String::new()),
    };
    if read_num.is_empty() && spot_group.is_empty() {
        return None;
    }
    if core.is_empty() {
        return None;
    }
    let mut d = Defline {
        variant: Variant::IlluminaOldBcRn,
        raw: raw.to_owned(),
        name: core.to_owned(),
        read_num,
        filter_flag: 0,
        spot_group,
        qiime_name: None,
        platform_fields: PlatformFields::None,
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 12: QIIME_GENERIC, a bare name with a `#barcode` tail and no
/// other recognizable grammar.
fn try_qiime_generic(raw: &str) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let (core, spot_group) = name_token.rsplit_once('#')?;
    if core.is_empty() || spot_group.is_empty() {
        return None;
    }
    let (label, _) = qiime_label(core);
    Some(Defline {
        variant: Variant::QiimeGeneric,
        raw: raw.to_owned(),
        name: core.to_owned(),
        read_num: String::new(),
        filter_flag: 0,
        spot_group: spot_group.to_owned(),
        qiime_name: Some(label),
        platform_fields: PlatformFields::None,
    })
}

fn normalize_pore_read(token: &str) -> Option<PoreRead> {
    let lower = token.to_ascii_lowercase();
    if lower.contains("template") {
        Some(PoreRead::Template)
    } else if lower.contains("complement") {
        Some(PoreRead::Complement)
    } else if lower.contains("twodirections") || lower.contains("2d") {
        Some(PoreRead::TwoD)
    } else {
        None
    }
}

/// Cascade item 13: Nanopore, three sub-patterns (`channel_N_read_N`,
/// `chN_fileN`, Metrichor 2D-prefixed).
fn try_nanopore(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let name_token = body.split_whitespace().next()?;
    let lower = name_token.to_ascii_lowercase();

    let (channel, read_no) = if let Some(pos) = lower.find("channel_") {
        let rest = &name_token[pos + "channel_".len()..];
        let mut fields = rest.splitn(2, '_');
        let channel: u32 = fields.next()?.parse().ok()?;
        let remainder = fields.next()?;
        let read_no = remainder
            .to_ascii_lowercase()
            .find("read_")
            .and_then(|p| remainder[p + 5..].split(['_', '.']).next())
            .and_then(|s| s.parse().ok());
        (Some(channel), read_no)
    } else if let Some(pos) = lower.find("ch") {
        let rest = &name_token[pos + 2..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        let after = &rest[digits.len()..];
        if !after.to_ascii_lowercase().contains("file") {
            return None;
        }
        (digits.parse().ok(), None)
    } else {
        return None;
    };

    let pore_read = normalize_pore_read(name_token);
    if channel.is_none() && pore_read.is_none() {
        return None;
    }

    // The spot name is everything up through the read number; only the
    // trailing strand descriptor (template/complement/twodirections) is
    // stripped, since template and complement share both channel and read
    // number for a single pore event.
    let name = ["_template", "_complement", "_twodirections", "_2d"]
        .iter()
        .find_map(|suffix| lower.find(suffix).map(|pos| name_token[..pos].to_owned()))
        .unwrap_or_else(|| name_token.to_owned());

    let mut d = Defline {
        variant: Variant::Nanopore,
        raw: raw.to_owned(),
        name,
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::Nanopore { channel, read_no, pore_read, pore_file: None },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 14: `read_id=... barcode=...` key/value headers.
fn try_readid_barcode(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let mut read_id = None;
    let mut barcode = None;
    for token in body.split_whitespace() {
        if let Some(v) = token.strip_prefix("read_id=") {
            read_id = Some(v.to_owned());
        } else if let Some(v) = token.strip_prefix("barcode=") {
            barcode = Some(v.to_owned());
        }
    }
    let name = read_id?;
    let mut d = Defline {
        variant: Variant::ReadIdBarcode,
        raw: raw.to_owned(),
        name,
        read_num: String::new(),
        filter_flag: 0,
        spot_group: barcode.unwrap_or_default(),
        qiime_name: None,
        platform_fields: PlatformFields::None,
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Cascade item 15: `template=X dir=F|R` Sanger/Newbler headers.
fn try_sanger_newbler(raw: &str, title_prefix: Option<&str>) -> Option<Defline> {
    let body = body_of(raw);
    let mut template = None;
    let mut dir = None;
    for token in body.split_whitespace() {
        if let Some(v) = token.strip_prefix("template=") {
            template = Some(v.to_owned());
        } else if let Some(v) = token.strip_prefix("dir=") {
            dir = match v {
                "F" => Some(Direction::Forward),
                "R" => Some(Direction::Reverse),
                _ => None,
            };
        }
    }
    let name = template?;
    dir?;
    let mut d = Defline {
        variant: Variant::SangerNewbler,
        raw: raw.to_owned(),
        name,
        read_num: String::new(),
        filter_flag: 0,
        spot_group: String::new(),
        qiime_name: None,
        platform_fields: PlatformFields::SangerNewbler { dir },
    };
    apply_qiime_prefix(&mut d, title_prefix);
    Some(d)
}

/// Runs the full ordered cascade of grammar matchers, falling back to
/// [`Variant::Undefined`] when nothing else matches.
#[must_use]
pub fn classify_cascade(raw: &str, title_prefix: Option<&str>) -> Defline {
    let mut d = try_helicos(raw, title_prefix)
        .or_else(|| try_absolid(raw, title_prefix))
        .or_else(|| try_illumina_new(raw, title_prefix))
        .or_else(|| try_illumina_old(raw, title_prefix))
        .or_else(|| try_qiime_illumina(raw))
        .or_else(|| try_ls454(raw, title_prefix))
        .or_else(|| try_qiime_454(raw))
        .or_else(|| try_pacbio(raw, title_prefix))
        .or_else(|| try_ion_torrent(raw, title_prefix))
        .or_else(|| try_illumina_old_bc_rn(raw, title_prefix))
        .or_else(|| try_qiime_generic(raw))
        .or_else(|| try_nanopore(raw, title_prefix))
        .or_else(|| try_readid_barcode(raw, title_prefix))
        .or_else(|| try_sanger_newbler(raw, title_prefix))
        .unwrap_or_else(|| Defline::undefined(raw));
    d.normalize_spot_group();
    d
}

/// Re-applies only the latched `variant`'s matcher. Used once a file's
/// grammar has locked in, so that a stray line resembling a different, more
/// permissive grammar cannot hijack the classification.
#[must_use]
pub fn classify_locked(raw: &str, variant: Variant, title_prefix: Option<&str>) -> Option<Defline> {
    let result = match variant {
        Variant::Helicos => try_helicos(raw, title_prefix),
        Variant::Absolid => try_absolid(raw, title_prefix),
        Variant::IlluminaNew | Variant::IlluminaNewNoPrefix | Variant::IlluminaNewWithJunk | Variant::IlluminaNewDouble => {
            try_illumina_new(raw, title_prefix)
        }
        Variant::IlluminaOld | Variant::IlluminaOldUnderscore | Variant::IlluminaOldWithJunkTail | Variant::IlluminaOldWithJunk2 | Variant::IlluminaOldNoPrefix => {
            try_illumina_old(raw, title_prefix)
        }
        Variant::QiimeIlluminaNew | Variant::QiimeIlluminaNewBc | Variant::QiimeIlluminaOld | Variant::QiimeIlluminaOldBc => {
            try_qiime_illumina(raw)
        }
        Variant::Ls454 => try_ls454(raw, title_prefix),
        Variant::QiimeLs454 | Variant::QiimeLs454Bc => try_qiime_454(raw),
        Variant::Pacbio => try_pacbio(raw, title_prefix),
        Variant::IonTorrent => try_ion_torrent(raw, title_prefix),
        Variant::IlluminaOldBcRn => try_illumina_old_bc_rn(raw, title_prefix),
        Variant::QiimeGeneric => try_qiime_generic(raw),
        Variant::Nanopore => try_nanopore(raw, title_prefix),
        Variant::ReadIdBarcode => try_readid_barcode(raw, title_prefix),
        Variant::SangerNewbler => try_sanger_newbler(raw, title_prefix),
        Variant::Undefined => Some(Defline::undefined(raw)),
    };
    result.map(|mut d| {
        d.normalize_spot_group();
        d
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illumina_new_canonical() {
        let d = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:Y:18:ATCACG", None);
        assert_eq!(d.variant, Variant::IlluminaNew);
        assert_eq!(d.read_num, "1");
        assert_eq!(d.filter_flag, 1);
        assert_eq!(d.spot_group, "ATCACG");
    }

    #[test]
    fn illumina_new_mates_share_name() {
        let d1 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:ATCACG", None);
        let d2 = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 2:N:18:ATCACG", None);
        assert_eq!(d1.name, d2.name);
        assert_ne!(d1.read_num, d2.read_num);
    }

    #[test]
    fn doubled_spot_group_trims_suffix_from_concatenated_name() {
        let mut spot_group = "ATCACG#EAS139:136:FC706VJ:2:2104:15343:197393".to_owned();
        let repaired = repair_doubled_spot_group(&mut spot_group, "EAS139:136:FC706VJ:2:2104:15343:197393");
        assert!(repaired);
        assert_eq!(spot_group, "ATCACG");
    }

    #[test]
    fn non_doubled_spot_group_is_left_untouched() {
        let mut spot_group = "ATCACG".to_owned();
        let repaired = repair_doubled_spot_group(&mut spot_group, "EAS139:136:FC706VJ:2:2104:15343:197393");
        assert!(!repaired);
        assert_eq!(spot_group, "ATCACG");
    }

    #[test]
    fn name_occurring_at_the_very_start_is_not_treated_as_doubled() {
        let mut spot_group = "EAS139:136:FC706VJ:2:2104:15343:197393".to_owned();
        let repaired = repair_doubled_spot_group(&mut spot_group, "EAS139:136:FC706VJ:2:2104:15343:197393");
        assert!(!repaired);
    }

    #[test]
    fn illumina_old_with_barcode_and_readnum() {
        let d = classify_cascade("@HWI-EAS209:7:100:1000:2788#ACCTCC/1", None);
        assert_eq!(d.variant, Variant::IlluminaOld);
        assert_eq!(d.spot_group, "ACCTCC");
        assert_eq!(d.read_num, "1");
    }

    #[test]
    fn helicos_matches_before_absolid() {
        let d = classify_cascade("@VHE-211783072615-15_1_1_1102_12455", None);
        assert_eq!(d.variant, Variant::Helicos);
    }

    #[test]
    fn absolid_tag_type() {
        let d = classify_cascade("@1_58_36_F3", None);
        assert_eq!(d.variant, Variant::Absolid);
        assert_eq!(d.name, "1_58_36");
    }

    #[test]
    fn ion_torrent_basic() {
        let d = classify_cascade("@GDTSG:00005:00042", None);
        assert_eq!(d.variant, Variant::IonTorrent);
    }

    #[test]
    fn nanopore_channel_read() {
        let d = classify_cascade("@channel_4_read_12_twodirections", None);
        assert_eq!(d.variant, Variant::Nanopore);
        if let PlatformFields::Nanopore { pore_read, .. } = d.platform_fields {
            assert_eq!(pore_read, Some(PoreRead::TwoD));
        } else {
            panic!("expected nanopore fields");
        }
    }

    #[test]
    fn sanger_newbler_dir() {
        let d = classify_cascade("@read001 template=ABC123 dir=F", None);
        assert_eq!(d.variant, Variant::SangerNewbler);
        assert_eq!(d.name, "ABC123");
    }

    #[test]
    fn undefined_fallback() {
        let d = classify_cascade("@totally-unrecognizable-header-text", None);
        assert_eq!(d.variant, Variant::Undefined);
        assert_eq!(d.name, "totally-unrecognizable-header-text");
    }

    #[test]
    fn spot_group_zero_normalizes_to_empty() {
        let d = classify_cascade("@EAS139:136:FC706VJ:2:2104:15343:197393 1:N:18:0", None);
        assert_eq!(d.spot_group, "");
    }
}
