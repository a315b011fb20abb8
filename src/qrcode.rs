//! QR code symbol construction.
//!
//! This module turns segments into a finished module grid: version selection, codeword
//! assembly, error correction and interleaving, function pattern drawing, data placement
//! and masking. It covers QR Code Model 2, versions 1 to 40 and all four error
//! correction levels.

use tracing::{debug, trace};

use crate::bits::BitBuffer;
use crate::error::{QrError, Result};
use crate::grid::ModuleGrid;
use crate::mask::{self, Mask};
use crate::reed_solomon::ReedSolomonGenerator;
use crate::segment::QrSegment;
use crate::segmenter;

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// Instances are immutable after creation.
///
/// # Creation
///
/// - High-level: Use [`QrCode::encode_text`] or [`QrCode::encode_binary`].
/// - Mid-level: Build segments (by hand or with [`segmenter`]) and call
///   [`QrCode::encode_segments`] or [`QrCode::encode_segments_advanced`].
/// - Low-level: Assemble data codewords yourself and call [`QrCode::encode_codewords`].
///
/// # Example
///
/// ```rust
/// use qrmatrix::{QrCode, QrCodeEcc};
///
/// let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
/// assert_eq!(qr.version().value(), 1);
/// assert_eq!(qr.size(), 21);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    errorcorrectionlevel: QrCodeEcc,
    mask: Mask,
    // Between 21 and 177 modules wide; equal to version * 4 + 17.
    modules: ModuleGrid,
    // Interleaved data and error correction codewords, in placement order.
    codewords: Vec<u8>,
}

/// Options for [`QrCode::encode_segments_advanced`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EncodeOptions {
    /// Requested error correction level (default: Medium).
    pub ecl: QrCodeEcc,
    /// Smallest version to consider (default: 1).
    pub min_version: Version,
    /// Largest version to consider (default: 40).
    pub max_version: Version,
    /// Fixed mask, or `None` to pick the lowest-penalty mask (default).
    pub mask: Option<Mask>,
    /// Raise the correction level when the data still fits the chosen version (default: true).
    pub boost_ecl: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ecl: QrCodeEcc::Medium,
            min_version: Version::MIN,
            max_version: Version::MAX,
            mask: None,
            boost_ecl: true,
        }
    }
}

impl EncodeOptions {
    /// Default options with the given correction level.
    pub fn new(ecl: QrCodeEcc) -> Self {
        Self { ecl, ..Self::default() }
    }

    pub fn with_versions(mut self, min_version: Version, max_version: Version) -> Self {
        self.min_version = min_version;
        self.max_version = max_version;
        self
    }

    pub fn with_mask(mut self, mask: Option<Mask>) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_boost_ecl(mut self, boost_ecl: bool) -> Self {
        self.boost_ecl = boost_ecl;
        self
    }

    /// Checks that the version bounds are ordered.
    pub fn validate(&self) -> Result<()> {
        if self.min_version > self.max_version {
            return Err(
                QrError::InvalidConfiguration(
                    format!(
                        "min version {} exceeds max version {}",
                        self.min_version.value(),
                        self.max_version.value()
                    )
                )
            );
        }
        Ok(())
    }
}

impl QrCode {
    /// Encodes a text string at the given error correction level.
    ///
    /// The text is split into segments by [`segmenter::make_segments`]; the smallest
    /// fitting version is chosen, the correction level may be boosted and the mask is
    /// chosen automatically.
    ///
    /// # Example
    ///
    /// ```rust
    /// use qrmatrix::{QrCode, QrCodeEcc};
    ///
    /// let qr = QrCode::encode_text("HELLO WORLD", QrCodeEcc::Quartile).unwrap();
    /// assert!(qr.get_module(0, 0));
    /// ```
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self> {
        let segs: Vec<QrSegment> = segmenter::make_segments(text, ecl)?;
        QrCode::encode_segments(&segs, ecl)
    }

    /// Encodes binary data as a single byte-mode segment.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self> {
        let segs: [QrSegment; 1] = [QrSegment::make_bytes(data)];
        QrCode::encode_segments(&segs, ecl)
    }

    /// Encodes the given segments with default options at the given correction level.
    pub fn encode_segments(segs: &[QrSegment], ecl: QrCodeEcc) -> Result<Self> {
        QrCode::encode_segments_advanced(segs, &EncodeOptions::new(ecl))
    }

    /// Encodes the given segments with explicit options.
    ///
    /// The smallest version in `min_version..=max_version` that holds the data is used.
    /// If `boost_ecl` is set, the correction level may end up higher than requested
    /// when that does not increase the version. With `mask` set to `None` all eight
    /// masks are evaluated and the one with the lowest penalty score is used.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidConfiguration`] for inverted version bounds and
    /// [`QrError::DataTooLong`] if the data does not fit.
    pub fn encode_segments_advanced(segs: &[QrSegment], options: &EncodeOptions) -> Result<Self> {
        let (version, ecl, datacodewords) = QrCode::encode_segments_to_codewords(segs, options)?;
        QrCode::encode_codewords(version, ecl, &datacodewords, options.mask)
    }

    /// Chooses the version and correction level for the segments and assembles
    /// the data codewords: segment bits, terminator, byte padding and the
    /// alternating 0xEC/0x11 pad bytes.
    pub fn encode_segments_to_codewords(
        segs: &[QrSegment],
        options: &EncodeOptions
    ) -> Result<(Version, QrCodeEcc, Vec<u8>)> {
        options.validate()?;
        let mut ecl: QrCodeEcc = options.ecl;

        // Find the minimal version number to use
        let mut version: Version = options.min_version;
        let datausedbits: usize = loop {
            let datacapacitybits: usize = get_num_data_codewords(version, ecl) * 8;
            let dataused: Option<usize> = QrSegment::get_total_bits(segs, version);
            match dataused {
                Some(n) if n <= datacapacitybits => {
                    break n;
                }
                _ if version >= options.max_version => {
                    return Err(QrError::DataTooLong {
                        used: dataused,
                        capacity: datacapacitybits,
                    });
                }
                _ => {
                    version = Version::new(version.value() + 1);
                }
            }
        };
        debug!(
            version = version.value(),
            ecl = ?ecl,
            used_bits = datausedbits,
            capacity_bits = get_num_data_codewords(version, ecl) * 8,
            "version selected"
        );

        // Increase the error correction level while the data still fits
        if options.boost_ecl {
            for &newecl in &[QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
                if newecl > ecl && datausedbits <= get_num_data_codewords(version, newecl) * 8 {
                    debug!(from = ?ecl, to = ?newecl, "error correction level boosted");
                    ecl = newecl;
                }
            }
        }

        // Concatenate all segments to create the data bit string
        let datacapacitybits: usize = get_num_data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer::with_capacity(datacapacitybits);
        for seg in segs {
            let ccbits: u8 = seg.mode().num_char_count_bits(version);
            let numchars = u32::try_from(seg.num_chars()).map_err(|_| QrError::FieldOverflow {
                mode: seg.mode(),
                count: seg.num_chars(),
                bits: ccbits,
            })?;
            bb.append_bits(seg.mode().mode_bits(), 4);
            bb.append_bits(numchars, ccbits);
            bb.append_buffer(seg.data());
        }
        debug_assert_eq!(bb.len(), datausedbits);

        // Add terminator and pad up to a byte if applicable
        let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.len());
        bb.append_bits(0, numzerobits as u8);
        let numzerobits: usize = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        // Pad with alternating bytes until data capacity is reached
        for &padbyte in [0xec, 0x11].iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(padbyte, 8);
        }
        Ok((version, ecl, bb.into_bytes()))
    }

    /// Creates a QR Code from a version, correction level, complete data codewords
    /// and an optional mask.
    ///
    /// This is a low-level API that most users should not use directly.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidConfiguration`] if `datacodewords` is not exactly the
    /// data capacity of `version` at `ecl`.
    pub fn encode_codewords(
        version: Version,
        ecl: QrCodeEcc,
        datacodewords: &[u8],
        msk: Option<Mask>
    ) -> Result<Self> {
        let expected = get_num_data_codewords(version, ecl);
        if datacodewords.len() != expected {
            return Err(
                QrError::InvalidConfiguration(
                    format!(
                        "version {} at {:?} takes {} data codewords, got {}",
                        version.value(),
                        ecl,
                        expected,
                        datacodewords.len()
                    )
                )
            );
        }

        // Compute ECC, draw modules
        let allcodewords: Vec<u8> = add_ecc_and_interleave(datacodewords, version, ecl);
        let funcmods: ModuleGrid = function_modules_marked(version);
        let mut modules: ModuleGrid = funcmods.clone();
        draw_codewords(&mut modules, &funcmods, &allcodewords);
        draw_light_function_modules(&mut modules, version);

        // Do masking
        let msk: Mask = match msk {
            Some(m) => m,
            None => choose_mask(&mut modules, &funcmods, ecl),
        };
        msk.apply(&mut modules, &funcmods);
        draw_format_bits(&mut modules, ecl, msk);

        Ok(Self {
            version,
            errorcorrectionlevel: ecl,
            mask: msk,
            modules,
            codewords: allcodewords,
        })
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> i32 {
        i32::from(self.modules.size())
    }

    /// Returns this QR Code's error correction level.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.errorcorrectionlevel
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside
    /// the QR code's bounds return `false`, so renderers can draw a light border by
    /// iterating past the edges.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        self.modules.get(x, y)
    }

    /// The finished module grid.
    pub fn modules(&self) -> &ModuleGrid {
        &self.modules
    }

    /// Returns the grid as rows of booleans, top row first.
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        let size = self.size();
        (0..size).map(|y| (0..size).map(|x| self.get_module(x, y)).collect()).collect()
    }

    /// The data and error correction codewords in the order they were placed.
    pub fn codewords(&self) -> &[u8] {
        &self.codewords
    }

    /// Returns the structural penalty score of this symbol.
    pub fn penalty_score(&self) -> i32 {
        mask::penalty_score(&self.modules)
    }
}

// Evaluates all eight masks on the placed data and returns the lowest-scoring one.
// `modules` is left unmasked on return.
#[cfg(not(feature = "parallel"))]
fn choose_mask(modules: &mut ModuleGrid, funcmods: &ModuleGrid, ecl: QrCodeEcc) -> Mask {
    let mut scores: Vec<(Mask, i32)> = Vec::with_capacity(Mask::ALL.len());
    for m in Mask::ALL {
        m.apply(modules, funcmods);
        draw_format_bits(modules, ecl, m);
        let penalty: i32 = mask::penalty_score(modules);
        trace!(mask = m.value(), penalty, "mask candidate");
        scores.push((m, penalty));
        m.apply(modules, funcmods); // Undoes the mask due to XOR
    }
    log_choice(&scores)
}

#[cfg(feature = "parallel")]
fn choose_mask(modules: &mut ModuleGrid, funcmods: &ModuleGrid, ecl: QrCodeEcc) -> Mask {
    use rayon::prelude::*;

    let snapshot: &ModuleGrid = modules;
    let scores: Vec<(Mask, i32)> = Mask::ALL
        .par_iter()
        .map(|&m| {
            let mut candidate = snapshot.clone();
            m.apply(&mut candidate, funcmods);
            draw_format_bits(&mut candidate, ecl, m);
            let penalty: i32 = mask::penalty_score(&candidate);
            trace!(mask = m.value(), penalty, "mask candidate");
            (m, penalty)
        })
        .collect();
    log_choice(&scores)
}

fn log_choice(scores: &[(Mask, i32)]) -> Mask {
    let best = mask::select_best(scores).unwrap_or(Mask::new(0));
    debug!(mask = best.value(), "mask selected");
    best
}

// Splits the data into blocks, appends each block's ECC and interleaves the result.
fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
    assert_eq!(data.len(), get_num_data_codewords(ver, ecl));
    let numblocks: usize = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
    let blockecclen: usize = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
    let rawcodewords: usize = get_num_raw_data_modules(ver) / 8;
    let numshortblocks: usize = numblocks - (rawcodewords % numblocks);
    let shortblockdatalen: usize = rawcodewords / numblocks - blockecclen;

    let mut result = vec![0u8; rawcodewords];
    let rs = ReedSolomonGenerator::new(blockecclen);
    let mut ecc = vec![0u8; blockecclen];
    let mut dat: &[u8] = data;
    for i in 0..numblocks {
        let datlen: usize = shortblockdatalen + usize::from(i >= numshortblocks);
        rs.compute_remainder_into(&dat[..datlen], &mut ecc);
        // Short blocks have no codeword in the last data column.
        let mut k: usize = i;
        for (j, &b) in dat[..datlen].iter().enumerate() {
            if j == shortblockdatalen {
                k -= numshortblocks;
            }
            result[k] = b;
            k += numblocks;
        }
        let mut k: usize = data.len() + i;
        for &b in &ecc {
            result[k] = b;
            k += numblocks;
        }
        dat = &dat[datlen..];
    }
    debug_assert_eq!(dat.len(), 0);
    result
}

// Returns a grid with every function module (finders and separators, timing,
// alignment, format and version areas, dark module) set.
fn function_modules_marked(ver: Version) -> ModuleGrid {
    let size: u8 = ver.size();
    let mut result = ModuleGrid::new(size);

    // Timing patterns
    result.fill_rectangle(6, 0, 1, size);
    result.fill_rectangle(0, 6, size, 1);

    // Finder patterns, separators and format areas
    result.fill_rectangle(0, 0, 9, 9);
    result.fill_rectangle(size - 8, 0, 8, 9);
    result.fill_rectangle(0, size - 8, 9, 8);

    // Alignment patterns
    let alignpatpos: Vec<u8> = get_alignment_pattern_positions(ver);
    let numalign: usize = alignpatpos.len();
    for (i, &pos0) in alignpatpos.iter().enumerate() {
        for (j, &pos1) in alignpatpos.iter().enumerate() {
            // Don't draw on the three finder corners
            if !(
                (i == 0 && j == 0) ||
                (i == 0 && j == numalign - 1) ||
                (i == numalign - 1 && j == 0)
            ) {
                result.fill_rectangle(pos0 - 2, pos1 - 2, 5, 5);
            }
        }
    }

    // Version information
    if ver.value() >= 7 {
        result.fill_rectangle(size - 11, 0, 3, 6);
        result.fill_rectangle(0, size - 11, 6, 3);
    }
    result
}

// Clears the light modules of the function patterns in a grid produced by
// function_modules_marked() and draws the version information. Format bits are
// left dark as placeholders.
fn draw_light_function_modules(modules: &mut ModuleGrid, ver: Version) {
    let size: u8 = modules.size();

    // Timing patterns
    for i in (7..size - 7).step_by(2) {
        modules.set_bounded(6, i, false);
        modules.set_bounded(i, 6, false);
    }

    // Finder patterns and separators
    for dy in -4i32..=4 {
        for dx in -4i32..=4 {
            let dist: i32 = dx.abs().max(dy.abs());
            if dist == 2 || dist == 4 {
                modules.set_unbounded(3 + dx, 3 + dy, false);
                modules.set_unbounded(i32::from(size) - 4 + dx, 3 + dy, false);
                modules.set_unbounded(3 + dx, i32::from(size) - 4 + dy, false);
            }
        }
    }

    // Alignment patterns
    let alignpatpos: Vec<u8> = get_alignment_pattern_positions(ver);
    let numalign: usize = alignpatpos.len();
    for (i, &pos0) in alignpatpos.iter().enumerate() {
        for (j, &pos1) in alignpatpos.iter().enumerate() {
            if
                (i == 0 && j == 0) ||
                (i == 0 && j == numalign - 1) ||
                (i == numalign - 1 && j == 0)
            {
                continue;
            }
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    modules.set_bounded(
                        (i32::from(pos0) + dx) as u8,
                        (i32::from(pos1) + dy) as u8,
                        dx == 0 && dy == 0
                    );
                }
            }
        }
    }

    // Version information
    let ver = u32::from(ver.value());
    if ver >= 7 {
        // 18-bit BCH(18,6) code
        let bits: u32 = {
            let mut rem: u32 = ver;
            for _ in 0..12 {
                rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
            }
            (ver << 12) | rem
        };
        debug_assert_eq!(bits >> 18, 0);
        for i in 0u8..18 {
            let bit: bool = get_bit(bits, i);
            let a: u8 = size - 11 + (i % 3);
            let b: u8 = i / 3;
            modules.set_bounded(a, b, bit);
            modules.set_bounded(b, a, bit);
        }
    }
}

// Draws both copies of the 15-bit format information (BCH(15,5) code, XOR-masked)
// and the dark module.
fn draw_format_bits(modules: &mut ModuleGrid, ecl: QrCodeEcc, mask: Mask) {
    let bits: u32 = format_bits(ecl, mask);

    // First copy
    for i in 0..6 {
        modules.set_bounded(8, i, get_bit(bits, i));
    }
    modules.set_bounded(8, 7, get_bit(bits, 6));
    modules.set_bounded(8, 8, get_bit(bits, 7));
    modules.set_bounded(7, 8, get_bit(bits, 8));
    for i in 9..15 {
        modules.set_bounded(14 - i, 8, get_bit(bits, i));
    }

    // Second copy
    let size: u8 = modules.size();
    for i in 0..8 {
        modules.set_bounded(size - 1 - i, 8, get_bit(bits, i));
    }
    for i in 8..15 {
        modules.set_bounded(8, size - 15 + i, get_bit(bits, i));
    }
    modules.set_bounded(8, size - 8, true); // Always dark
}

fn format_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

// Places the codeword bits in the zigzag column-pair order, skipping function
// modules. Remainder modules stay light.
fn draw_codewords(modules: &mut ModuleGrid, funcmods: &ModuleGrid, data: &[u8]) {
    let size: i32 = i32::from(modules.size());
    let mut i: usize = 0;
    // Index of the right column in each column pair
    let mut right: i32 = size - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for vert in 0..size {
            for j in 0..2 {
                let x = (right - j) as u8;
                let upward: bool = ((right + 1) & 2) == 0;
                let y = (if upward { size - 1 - vert } else { vert }) as u8;
                if !funcmods.get_bounded(x, y) && i < data.len() * 8 {
                    modules.set_bounded(x, y, get_bit(data[i >> 3].into(), 7 - ((i as u8) & 7)));
                    i += 1;
                }
            }
        }
        right -= 2;
    }
    debug_assert_eq!(i, data.len() * 8);
}

/// Returns the ascending center coordinates of the alignment patterns for a version.
///
/// The same list applies to rows and columns; version 1 has none.
pub fn get_alignment_pattern_positions(ver: Version) -> Vec<u8> {
    let v: u8 = ver.value();
    if v == 1 {
        return Vec::new();
    }
    let numalign: u8 = v / 7 + 2;
    let step: u8 = if v == 32 { 26 } else { ((v * 4 + numalign * 2 + 1) / (numalign * 2 - 2)) * 2 };
    let mut result: Vec<u8> = (0..numalign - 1).map(|i| ver.size() - 7 - i * step).collect();
    result.push(6);
    result.reverse();
    result
}

/// Returns the number of data bits that can be stored in a QR Code of the given version,
/// after all function modules are excluded. This includes remainder bits, so it might
/// not be a multiple of 8.
pub fn get_num_raw_data_modules(ver: Version) -> usize {
    let ver = usize::from(ver.value());
    let mut result: usize = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let numalign: usize = ver / 7 + 2;
        result -= (25 * numalign - 10) * numalign - 55;
        if ver >= 7 {
            result -= 36;
        }
    }
    result
}

/// Returns the number of 8-bit data codewords (not error correction) in a QR Code of
/// the given version and correction level.
pub fn get_num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    get_num_raw_data_modules(ver) / 8 -
        table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl) *
            table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

fn get_bit(x: u32, i: u8) -> bool {
    ((x >> i) & 1) != 0
}

static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    // Version: (index 0 is padding)
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28,
        28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26,
        26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30,
        28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28,
        30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    // Version: (index 0 is padding)
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8,
        8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16,
        17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20,
        23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25,
        25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl Default for QrCodeEcc {
    fn default() -> Self {
        QrCodeEcc::Medium
    }
}

impl QrCodeEcc {
    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns the 2-bit value stored in the format information.
    fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Creates a version object, failing with [`QrError::InvalidConfiguration`]
    /// if the number is outside the range [1, 40].
    pub fn try_new(ver: u8) -> Result<Self> {
        if (Version::MIN.value()..=Version::MAX.value()).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(QrError::InvalidConfiguration(format!("version {} is outside 1..=40", ver)))
        }
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length of the symbol in modules: `4 * version + 17`.
    pub const fn size(self) -> u8 {
        self.0 * 4 + 17
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::QrSegmentMode;

    fn count_light(grid: &ModuleGrid) -> usize {
        let size = usize::from(grid.size());
        size * size - grid.count_dark()
    }

    #[test]
    fn test_alignment_positions() {
        assert!(get_alignment_pattern_positions(Version::new(1)).is_empty());
        assert_eq!(get_alignment_pattern_positions(Version::new(2)), vec![6, 18]);
        assert_eq!(get_alignment_pattern_positions(Version::new(7)), vec![6, 22, 38]);
        assert_eq!(
            get_alignment_pattern_positions(Version::new(32)),
            vec![6, 34, 60, 86, 112, 138]
        );
        assert_eq!(
            get_alignment_pattern_positions(Version::new(40)),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_function_plane_matches_raw_capacity() {
        for v in 1..=40 {
            let ver = Version::new(v);
            let funcs = function_modules_marked(ver);
            assert_eq!(count_light(&funcs), get_num_raw_data_modules(ver), "version {}", v);
        }
    }

    #[test]
    fn test_data_codeword_capacities() {
        assert_eq!(get_num_data_codewords(Version::new(1), QrCodeEcc::Low), 19);
        assert_eq!(get_num_data_codewords(Version::new(1), QrCodeEcc::High), 9);
        assert_eq!(get_num_data_codewords(Version::new(40), QrCodeEcc::Low), 2956);
        assert_eq!(get_num_data_codewords(Version::new(40), QrCodeEcc::High), 1276);
    }

    #[test]
    fn test_format_bits() {
        // Low, mask 4
        assert_eq!(format_bits(QrCodeEcc::Low, Mask::new(4)), 0b110011000101111);
        // Medium, mask 0
        assert_eq!(format_bits(QrCodeEcc::Medium, Mask::new(0)), 0b101010000010010);
    }

    #[test]
    fn test_codewords_hello_world_1m() {
        let segs = [QrSegment::make_alphanumeric("HELLO WORLD").unwrap()];
        let options = EncodeOptions::new(QrCodeEcc::Medium).with_boost_ecl(false);
        let (version, ecl, data) = QrCode::encode_segments_to_codewords(&segs, &options).unwrap();
        assert_eq!(version, Version::new(1));
        assert_eq!(ecl, QrCodeEcc::Medium);
        assert_eq!(data, vec![
            0x20, 0x5b, 0x0b, 0x78, 0xd1, 0x72, 0xdc, 0x4d, 0x43, 0x40, 0xec, 0x11, 0xec, 0x11,
            0xec, 0x11,
        ]);
        let qr = QrCode::encode_codewords(version, ecl, &data, Some(Mask::new(2))).unwrap();
        assert_eq!(&qr.codewords()[16..], &[
            0xc4, 0x23, 0x27, 0x77, 0xeb, 0xd7, 0xe7, 0xe2, 0x5d, 0x17,
        ]);
    }

    #[test]
    fn test_interleave_short_and_long_blocks() {
        // Version 5-Q: two blocks of 15 and two of 16 data codewords.
        let ver = Version::new(5);
        let data: Vec<u8> = (0..62).collect();
        let all = add_ecc_and_interleave(&data, ver, QrCodeEcc::Quartile);
        assert_eq!(all.len(), 134);
        assert_eq!(&all[..8], &[0, 15, 30, 46, 1, 16, 31, 47]);
        // Final data column only holds the two long blocks.
        assert_eq!(&all[60..62], &[45, 61]);
    }

    #[test]
    fn test_explicit_mask_pattern_on_grid() {
        let segs = [QrSegment::make_bytes(b"https://www.example.com/")];
        let fixed = |m: u8| {
            let options = EncodeOptions::new(QrCodeEcc::High).with_mask(Some(Mask::new(m)));
            QrCode::encode_segments_advanced(&segs, &options).unwrap()
        };
        let qr = fixed(3);
        assert_eq!(qr.mask(), Mask::new(3));
        let ver = qr.version();
        let funcs = function_modules_marked(ver);
        let mut placed = funcs.clone();
        draw_codewords(&mut placed, &funcs, qr.codewords());

        let size = ver.size();
        let mut inverted = 0;
        for y in 0..size {
            for x in 0..size {
                if funcs.get_bounded(x, y) {
                    continue;
                }
                let pattern = (u32::from(x) + u32::from(y)) % 3 == 0;
                inverted += usize::from(pattern);
                let module = qr.get_module(i32::from(x), i32::from(y));
                assert_eq!(module, placed.get_bounded(x, y) ^ pattern, "module ({}, {})", x, y);
            }
        }
        assert!(inverted > 0);

        // Other masks differ from mask 3 exactly where their predicates disagree.
        for k in [0u8, 1, 2, 4, 5, 6, 7] {
            let other = fixed(k);
            assert_eq!(other.codewords(), qr.codewords());
            for y in 0..size {
                for x in 0..size {
                    if funcs.get_bounded(x, y) {
                        continue;
                    }
                    let differs =
                        qr.get_module(i32::from(x), i32::from(y)) !=
                        other.get_module(i32::from(x), i32::from(y));
                    let expected = Mask::new(3).inverts(x, y) != Mask::new(k).inverts(x, y);
                    assert_eq!(differs, expected, "mask {} at ({}, {})", k, x, y);
                }
            }
        }
    }

    #[test]
    fn test_encode_codewords_rejects_wrong_length() {
        let err = QrCode::encode_codewords(Version::new(1), QrCodeEcc::Low, &[0u8; 5], None);
        assert!(matches!(err, Err(QrError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_boost_ecl() {
        let segs = [QrSegment::make_numeric("1234").unwrap()];
        let boosted = QrCode::encode_segments(&segs, QrCodeEcc::Low).unwrap();
        assert_eq!(boosted.error_correction_level(), QrCodeEcc::High);
        let options = EncodeOptions::new(QrCodeEcc::Low).with_boost_ecl(false);
        let plain = QrCode::encode_segments_advanced(&segs, &options).unwrap();
        assert_eq!(plain.error_correction_level(), QrCodeEcc::Low);
        assert_eq!(plain.version(), boosted.version());
    }

    #[test]
    fn test_version_minimality() {
        let segs = [QrSegment::make_bytes(&[b'x'; 100])];
        for &ecl in &[QrCodeEcc::Low, QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            let options = EncodeOptions::new(ecl).with_boost_ecl(false);
            let qr = QrCode::encode_segments_advanced(&segs, &options).unwrap();
            let v = qr.version();
            let needed = QrSegment::get_total_bits(&segs, v).unwrap();
            assert!(needed <= get_num_data_codewords(v, ecl) * 8);
            if v.value() > 1 {
                let prev = Version::new(v.value() - 1);
                let prevneeded = QrSegment::get_total_bits(&segs, prev).unwrap();
                assert!(prevneeded > get_num_data_codewords(prev, ecl) * 8);
            }
        }
    }

    #[test]
    fn test_min_version_respected() {
        let segs = [QrSegment::make_bytes(b"hi")];
        let options = EncodeOptions::new(QrCodeEcc::Low).with_versions(
            Version::new(7),
            Version::new(10)
        );
        let qr = QrCode::encode_segments_advanced(&segs, &options).unwrap();
        assert_eq!(qr.version(), Version::new(7));
        assert_eq!(qr.size(), 45);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let options = EncodeOptions::new(QrCodeEcc::Low).with_versions(
            Version::new(10),
            Version::new(7)
        );
        assert!(matches!(
            QrCode::encode_segments_advanced(&[], &options),
            Err(QrError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_max_version_limits() {
        let segs = [QrSegment::make_bytes(&[0u8; 100])];
        let options = EncodeOptions::new(QrCodeEcc::High).with_versions(
            Version::MIN,
            Version::new(3)
        );
        assert_eq!(
            QrCode::encode_segments_advanced(&segs, &options),
            Err(QrError::DataTooLong { used: Some(4 + 8 + 800), capacity: 26 * 8 })
        );
    }

    #[test]
    fn test_field_overflow_reported_as_too_long() {
        let segs = [QrSegment::make_bytes(&[0u8; 300])];
        let options = EncodeOptions::new(QrCodeEcc::Low).with_versions(
            Version::MIN,
            Version::new(9)
        );
        assert_eq!(
            QrCode::encode_segments_advanced(&segs, &options),
            Err(QrError::DataTooLong { used: None, capacity: 232 * 8 })
        );
    }

    #[test]
    fn test_version_info_drawn_for_version_7() {
        let segs = [QrSegment::make_bytes(b"version seven")];
        let options = EncodeOptions::new(QrCodeEcc::Low)
            .with_versions(Version::new(7), Version::new(7))
            .with_mask(Some(Mask::new(0)));
        let qr = QrCode::encode_segments_advanced(&segs, &options).unwrap();
        // Version 7 information is 0x07C94, least significant bit at (size-11, 0).
        let bits: u32 = 0x07c94;
        let size = qr.size() as u8;
        for i in 0u8..18 {
            let a = i32::from(size - 11 + (i % 3));
            let b = i32::from(i / 3);
            assert_eq!(qr.get_module(a, b), get_bit(bits, i));
            assert_eq!(qr.get_module(b, a), get_bit(bits, i));
        }
    }

    #[test]
    fn test_eci_segment_encodes() {
        let segs = [QrSegment::make_eci(26).unwrap(), QrSegment::make_bytes("αβγ".as_bytes())];
        let qr = QrCode::encode_segments(&segs, QrCodeEcc::Medium).unwrap();
        assert_eq!(segs[0].mode(), QrSegmentMode::Eci);
        assert_eq!(qr.version(), Version::new(1));
    }

    #[test]
    fn test_version_try_new() {
        assert!(Version::try_new(0).is_err());
        assert!(Version::try_new(41).is_err());
        assert_eq!(Version::try_new(40).unwrap(), Version::MAX);
    }
}
