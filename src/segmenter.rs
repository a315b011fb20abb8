//! Splitting text into segments.
//!
//! Two strategies are offered. [`make_segments`] classifies each character by the
//! most compact mode that can hold it and then greedily merges neighbouring runs
//! while merging does not cost bits. [`make_segments_optimally`] runs a dynamic
//! program over the characters and returns the segment list with the globally
//! smallest bit length, switching modes (kanji included, given a [`KanjiTable`])
//! wherever it pays off.

use std::ops::Range;

use tracing::debug;

use crate::error::{QrError, Result};
use crate::qrcode::{get_num_data_codewords, QrCodeEcc, Version};
use crate::segment::{alphanumeric_index, QrSegment, QrSegmentMode};

/// Maps characters to 13-bit QR kanji codes.
///
/// The table of Shift JIS kanji is not embedded in this crate; callers supply one.
pub trait KanjiTable {
    /// Returns the kanji code of `c`, or `None` if `c` is outside the kanji subset.
    fn kanji_code(&self, c: char) -> Option<u16>;
}

impl<F: Fn(char) -> Option<u16>> KanjiTable for F {
    fn kanji_code(&self, c: char) -> Option<u16> {
        self(c)
    }
}

/// Returns a segment list for `text` built from greedily merged single-mode runs.
///
/// # Errors
///
/// Returns [`QrError::DataTooLong`] if the segments do not fit in version 40 at `ecl`.
pub fn make_segments(text: &str, ecl: QrCodeEcc) -> Result<Vec<QrSegment>> {
    // Maximal runs of characters sharing their most compact mode, as byte ranges.
    let mut runs: Vec<(QrSegmentMode, Range<usize>)> = Vec::new();
    for (i, c) in text.char_indices() {
        let mode = simple_mode(c);
        match runs.last_mut() {
            Some((last, range)) if *last == mode => {
                range.end = i + c.len_utf8();
            }
            _ => runs.push((mode, i..i + c.len_utf8())),
        }
    }

    // Merge neighbours into the wider mode while that does not add bits.
    let ver = Version::MIN;
    loop {
        let mut merged = false;
        let mut i = 0;
        while i + 1 < runs.len() {
            let (lmode, left) = runs[i].clone();
            let (rmode, right) = runs[i + 1].clone();
            let wide = wider_mode(lmode, rmode);
            let joined = left.start..right.end;
            let separate = run_cost(lmode, &text[left], ver) + run_cost(rmode, &text[right], ver);
            if run_cost(wide, &text[joined.clone()], ver) <= separate {
                runs[i] = (wide, joined);
                runs.remove(i + 1);
                merged = true;
            } else {
                i += 1;
            }
        }
        if !merged {
            break;
        }
    }

    let segs = runs
        .into_iter()
        .map(|(mode, range)| make_run(mode, &text[range], None))
        .collect::<Result<Vec<_>>>()?;
    debug!(segments = ?plan(&segs), "greedy segmentation");
    check_fits(&segs, ecl, Version::MIN, Version::MAX)?;
    Ok(segs)
}

/// Returns the segment list for `text` with the smallest total bit length.
///
/// The character count field widths depend on the version class (1–9, 10–26,
/// 27–40), so the search is repeated per class starting at `minversion` and the
/// first result that fits at `ecl` is returned. Characters the `kanji` table maps
/// are eligible for kanji mode.
///
/// # Errors
///
/// Returns [`QrError::InvalidConfiguration`] if `minversion > maxversion`, and
/// [`QrError::DataTooLong`] if no version up to `maxversion` fits.
pub fn make_segments_optimally(
    text: &str,
    ecl: QrCodeEcc,
    minversion: Version,
    maxversion: Version,
    kanji: Option<&dyn KanjiTable>
) -> Result<Vec<QrSegment>> {
    if minversion > maxversion {
        return Err(
            QrError::InvalidConfiguration(
                format!(
                    "min version {} exceeds max version {}",
                    minversion.value(),
                    maxversion.value()
                )
            )
        );
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let chars: Vec<char> = text.chars().collect();
    let mut segs: Vec<QrSegment> = Vec::new();
    let mut version = minversion;
    loop {
        if version == minversion || version.value() == 10 || version.value() == 27 {
            let modes = compute_character_modes(&chars, version, kanji);
            segs = split_into_segments(&chars, &modes, kanji)?;
            debug!(version = version.value(), segments = ?plan(&segs), "optimal segmentation");
        }
        let capacity: usize = get_num_data_codewords(version, ecl) * 8;
        let used: Option<usize> = QrSegment::get_total_bits(&segs, version);
        if used.map_or(false, |n| n <= capacity) {
            return Ok(segs);
        }
        if version >= maxversion {
            return Err(QrError::DataTooLong { used, capacity });
        }
        version = Version::new(version.value() + 1);
    }
}

// Candidate modes in tie-break priority order.
const MODE_TYPES: [QrSegmentMode; 4] = [
    QrSegmentMode::Kanji,
    QrSegmentMode::Alphanumeric,
    QrSegmentMode::Numeric,
    QrSegmentMode::Byte,
];
const NUM_MODES: usize = MODE_TYPES.len();

// Costs are kept in sixths of a bit so numeric (10/3) and alphanumeric (11/2)
// characters have integer costs.
fn char_cost(mode: QrSegmentMode, c: char, kanji: Option<&dyn KanjiTable>) -> Option<usize> {
    match mode {
        QrSegmentMode::Byte => Some(c.len_utf8() * 8 * 6),
        QrSegmentMode::Alphanumeric => alphanumeric_index(c).map(|_| 33),
        QrSegmentMode::Numeric => c.is_ascii_digit().then_some(20),
        QrSegmentMode::Kanji => kanji.and_then(|t| t.kanji_code(c)).map(|_| 78),
        QrSegmentMode::Eci => None,
    }
}

/// Returns the mode of each character in a minimum-cost encoding at `version`.
fn compute_character_modes(
    chars: &[char],
    version: Version,
    kanji: Option<&dyn KanjiTable>
) -> Vec<QrSegmentMode> {
    let headcosts: [usize; NUM_MODES] = MODE_TYPES.map(
        |m| (4 + usize::from(m.num_char_count_bits(version))) * 6
    );

    // charmodes[i][j]: mode of character i in the cheapest encoding of the prefix
    // 0..=i whose last segment is MODE_TYPES[j].
    let mut charmodes: Vec<[Option<usize>; NUM_MODES]> = vec![[None; NUM_MODES]; chars.len()];
    // prevcosts[j]: exact cost of the prefix so far, ending in MODE_TYPES[j].
    let mut prevcosts: [usize; NUM_MODES] = headcosts;

    for (i, &c) in chars.iter().enumerate() {
        let mut curcosts = [0usize; NUM_MODES];
        // Extend a segment if possible
        for (j, &mode) in MODE_TYPES.iter().enumerate() {
            if let Some(cost) = char_cost(mode, c, kanji) {
                curcosts[j] = prevcosts[j] + cost;
                charmodes[i][j] = Some(j);
            }
        }
        // Start a new segment at the end to switch modes
        for j in 0..NUM_MODES {
            for k in 0..NUM_MODES {
                let newcost = ((curcosts[k] + 5) / 6) * 6 + headcosts[j];
                if
                    charmodes[i][k].is_some() &&
                    (charmodes[i][j].is_none() || newcost < curcosts[j])
                {
                    curcosts[j] = newcost;
                    charmodes[i][j] = Some(k);
                }
            }
        }
        prevcosts = curcosts;
    }

    // Find optimal ending mode
    let last = chars.len() - 1;
    let mut curmode: usize = (0..NUM_MODES)
        .filter(|&j| charmodes[last][j].is_some())
        .min_by_key(|&j| (prevcosts[j], j))
        .unwrap_or(NUM_MODES - 1);

    // Trace backwards
    let mut result = vec![QrSegmentMode::Byte; chars.len()];
    for i in (0..chars.len()).rev() {
        curmode = charmodes[i][curmode].unwrap_or(NUM_MODES - 1);
        result[i] = MODE_TYPES[curmode];
    }
    result
}

fn split_into_segments(
    chars: &[char],
    modes: &[QrSegmentMode],
    kanji: Option<&dyn KanjiTable>
) -> Result<Vec<QrSegment>> {
    let mut result: Vec<QrSegment> = Vec::new();
    let mut start: usize = 0;
    for i in 1..=chars.len() {
        if i < chars.len() && modes[i] == modes[start] {
            continue;
        }
        let run: String = chars[start..i].iter().collect();
        result.push(make_run(modes[start], &run, kanji)?);
        start = i;
    }
    Ok(result)
}

fn make_run(mode: QrSegmentMode, run: &str, kanji: Option<&dyn KanjiTable>) -> Result<QrSegment> {
    match mode {
        QrSegmentMode::Numeric => QrSegment::make_numeric(run),
        QrSegmentMode::Alphanumeric => QrSegment::make_alphanumeric(run),
        QrSegmentMode::Kanji => {
            let codes = run
                .chars()
                .enumerate()
                .map(|(position, c)| {
                    kanji.and_then(|t| t.kanji_code(c)).ok_or(QrError::InvalidCharacter {
                        mode: QrSegmentMode::Kanji,
                        position,
                        value: u32::from(c),
                    })
                })
                .collect::<Result<Vec<u16>>>()?;
            QrSegment::make_kanji(&codes)
        }
        _ => Ok(QrSegment::make_bytes(run.as_bytes())),
    }
}

fn simple_mode(c: char) -> QrSegmentMode {
    if c.is_ascii_digit() {
        QrSegmentMode::Numeric
    } else if alphanumeric_index(c).is_some() {
        QrSegmentMode::Alphanumeric
    } else {
        QrSegmentMode::Byte
    }
}

// Numeric ⊂ Alphanumeric ⊂ Byte
fn wider_mode(a: QrSegmentMode, b: QrSegmentMode) -> QrSegmentMode {
    let rank = |m: QrSegmentMode| match m {
        QrSegmentMode::Numeric => 0,
        QrSegmentMode::Alphanumeric => 1,
        _ => 2,
    };
    if rank(a) >= rank(b) { a } else { b }
}

fn run_cost(mode: QrSegmentMode, run: &str, ver: Version) -> usize {
    let numchars = match mode {
        QrSegmentMode::Byte => run.len(),
        _ => run.chars().count(),
    };
    let payload = QrSegment::bit_length(mode, numchars).unwrap_or(usize::MAX / 2);
    4 + usize::from(mode.num_char_count_bits(ver)) + payload
}

fn check_fits(
    segs: &[QrSegment],
    ecl: QrCodeEcc,
    minversion: Version,
    maxversion: Version
) -> Result<()> {
    let mut version = minversion;
    loop {
        let capacity: usize = get_num_data_codewords(version, ecl) * 8;
        let used = QrSegment::get_total_bits(segs, version);
        if used.map_or(false, |n| n <= capacity) {
            return Ok(());
        }
        if version >= maxversion {
            return Err(QrError::DataTooLong { used, capacity });
        }
        version = Version::new(version.value() + 1);
    }
}

fn plan(segs: &[QrSegment]) -> Vec<(QrSegmentMode, usize)> {
    segs.iter()
        .map(|s| (s.mode(), s.num_chars()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(segs: &[QrSegment], ver: u8) -> usize {
        QrSegment::get_total_bits(segs, Version::new(ver)).unwrap()
    }

    fn modes(segs: &[QrSegment]) -> Vec<QrSegmentMode> {
        segs.iter().map(|s| s.mode()).collect()
    }

    fn madoka_table(c: char) -> Option<u16> {
        match c {
            '「' => Some(0x0035),
            '魔' => Some(0x1002),
            '法' => Some(0x0fc0),
            '少' => Some(0x0aed),
            '女' => Some(0x0ad7),
            '」' => Some(0x0036),
            _ => None,
        }
    }

    #[test]
    fn test_simple_single_numeric() {
        let digits = "3141592653589793238462643383279502884197169399375105";
        let segs = make_segments(digits, QrCodeEcc::Medium).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mode(), QrSegmentMode::Numeric);
        assert_eq!(segs[0].num_chars(), 52);
        assert_eq!(segs[0].data().len(), 17 * 10 + 4);
    }

    #[test]
    fn test_simple_merges_short_runs_into_bytes() {
        let segs = make_segments("Hello, world!", QrCodeEcc::Low).unwrap();
        assert_eq!(modes(&segs), vec![QrSegmentMode::Byte]);
        assert_eq!(segs[0].num_chars(), 13);
    }

    #[test]
    fn test_simple_keeps_long_numeric_run() {
        let text = format!("shc:/{}", "0123456789".repeat(20));
        let segs = make_segments(&text, QrCodeEcc::Low).unwrap();
        assert_eq!(modes(&segs), vec![QrSegmentMode::Byte, QrSegmentMode::Numeric]);
        assert_eq!(segs[1].num_chars(), 200);
    }

    #[test]
    fn test_simple_empty() {
        assert!(make_segments("", QrCodeEcc::High).unwrap().is_empty());
    }

    #[test]
    fn test_simple_too_long() {
        let text = "a".repeat(3000);
        assert!(matches!(
            make_segments(&text, QrCodeEcc::High),
            Err(QrError::DataTooLong { .. })
        ));
    }

    #[test]
    fn test_optimal_alphanumeric_then_numeric() {
        let text = "THE SQUARE ROOT OF 2 IS \
            1.41421356237309504880168872420969807856967187537694807317667973799";
        let segs = make_segments_optimally(
            text,
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            None
        ).unwrap();
        assert_eq!(modes(&segs), vec![QrSegmentMode::Alphanumeric, QrSegmentMode::Numeric]);
        assert_eq!(segs[0].num_chars(), 26);
    }

    #[test]
    fn test_optimal_uses_kanji_table() {
        let text = "「魔法少女」";
        let table: &dyn KanjiTable = &madoka_table;
        let segs = make_segments_optimally(
            text,
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            Some(table)
        ).unwrap();
        assert_eq!(modes(&segs), vec![QrSegmentMode::Kanji]);
        assert_eq!(segs[0].decode_payload().unwrap(), vec![
            0x00, 0x35, 0x10, 0x02, 0x0f, 0xc0, 0x0a, 0xed, 0x0a, 0xd7, 0x00, 0x36
        ]);

        let bytes_only = make_segments_optimally(
            text,
            QrCodeEcc::Low,
            Version::MIN,
            Version::MAX,
            None
        ).unwrap();
        assert_eq!(modes(&bytes_only), vec![QrSegmentMode::Byte]);
        assert!(total(&segs, 1) < total(&bytes_only, 1));
    }

    #[test]
    fn test_optimal_never_worse_than_simple() {
        let samples = [
            "Hello, world!",
            "https://www.example.com/",
            "Golden ratio φ = 1.61803398874989484820458683436563811772030917980576286213\
             54486227052604628189024497072072041893911374......",
            "a1b2c3d4e5f6g7h8i9",
            "123ABC456def789",
            "維基百科（Wikipedia，聆聽i/ˌwɪkᵻˈpiːdi.ə/）\
             是一個自由內容、公開編輯且多語言的網路百科全書協作計畫",
            "DOLLAR-AMOUNT:$39.87 PERCENTAGE:100.00% OPERATIONS:+-*/",
            "0",
            "A",
        ];
        for text in samples {
            let chars: Vec<char> = text.chars().collect();
            let simple = make_segments(text, QrCodeEcc::Low).unwrap();
            for ver in [1u8, 10, 27] {
                let modes = compute_character_modes(&chars, Version::new(ver), None);
                let optimal = split_into_segments(&chars, &modes, None).unwrap();
                assert!(
                    total(&optimal, ver) <= total(&simple, ver),
                    "{:?} at version {}",
                    text,
                    ver
                );
            }
        }
    }

    #[test]
    fn test_optimal_single_digit() {
        let segs = make_segments_optimally("7", QrCodeEcc::Low, Version::MIN, Version::MIN, None)
            .unwrap();
        assert_eq!(modes(&segs), vec![QrSegmentMode::Numeric]);
        assert_eq!(total(&segs, 1), 18);
    }

    #[test]
    fn test_optimal_rejects_inverted_bounds() {
        assert!(matches!(
            make_segments_optimally("x", QrCodeEcc::Low, Version::new(5), Version::new(4), None),
            Err(QrError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_optimal_empty_and_deterministic() {
        assert!(make_segments_optimally("", QrCodeEcc::Low, Version::MIN, Version::MAX, None)
            .unwrap()
            .is_empty());
        let run = || {
            make_segments_optimally("abc123DEF", QrCodeEcc::Low, Version::MIN, Version::MAX, None)
        };
        let (a, b) = (run(), run());
        assert_eq!(a, b);
    }
}
