//! Typed data segments.
//!
//! A segment is a contiguous run of input committed to one encoding mode. Segments are
//! immutable and created with factory functions like [`QrSegment::make_numeric`],
//! [`QrSegment::make_alphanumeric`] or [`QrSegment::make_bytes`]. The
//! [`segmenter`](crate::segmenter) module builds segment lists from text automatically.

use crate::bits::BitBuffer;
use crate::error::{QrError, Result};
use crate::qrcode::Version;

/// The 45 characters of alphanumeric mode, in code order.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Largest 13-bit kanji code value.
pub const MAX_KANJI_CODE: u16 = 0x1fff;

/// A segment of data in a QR code.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: QrSegmentMode,
    numchars: usize,
    data: BitBuffer,
}

impl QrSegment {
    /// Creates a segment for binary data in byte mode.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer::with_capacity(data.len() * 8);
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Self {
            mode: QrSegmentMode::Byte,
            numchars: data.len(),
            data: bb,
        }
    }

    /// Creates a segment for a string of decimal digits in numeric mode.
    ///
    /// Groups of three digits take 10 bits; a trailing pair takes 7 bits and a
    /// trailing single digit 4 bits.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidCharacter`] if `text` contains anything but `0`–`9`.
    pub fn make_numeric(text: &str) -> Result<Self> {
        let mut bb = BitBuffer::with_capacity(text.len() * 10 / 3 + 4);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for (position, c) in text.chars().enumerate() {
            let digit = c.to_digit(10).ok_or(
                QrError::InvalidCharacter {
                    mode: QrSegmentMode::Numeric,
                    position,
                    value: u32::from(c),
                }
            )?;
            accumdata = accumdata * 10 + digit;
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Ok(Self {
            mode: QrSegmentMode::Numeric,
            numchars: text.len(),
            data: bb,
        })
    }

    /// Creates a segment for alphanumeric text.
    ///
    /// Allowed characters: 0–9, A–Z (uppercase), space, `$`, `%`, `*`, `+`, `-`, `.`, `/`, `:`.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidCharacter`] for any other character.
    pub fn make_alphanumeric(text: &str) -> Result<Self> {
        let mut bb = BitBuffer::with_capacity(text.len() * 11 / 2 + 6);
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        let mut numchars: usize = 0;
        for (position, c) in text.chars().enumerate() {
            let i = alphanumeric_index(c).ok_or(QrError::InvalidCharacter {
                mode: QrSegmentMode::Alphanumeric,
                position,
                value: u32::from(c),
            })?;
            accumdata = accumdata * 45 + i;
            accumcount += 1;
            numchars += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            bb.append_bits(accumdata, 6);
        }
        Ok(Self {
            mode: QrSegmentMode::Alphanumeric,
            numchars,
            data: bb,
        })
    }

    /// Creates a kanji-mode segment from pre-computed 13-bit kanji code values,
    /// one per double-byte character.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidCharacter`] if a value does not fit in 13 bits.
    pub fn make_kanji(codes: &[u16]) -> Result<Self> {
        let mut bb = BitBuffer::with_capacity(codes.len() * 13);
        for (position, &code) in codes.iter().enumerate() {
            if code > MAX_KANJI_CODE {
                return Err(QrError::InvalidCharacter {
                    mode: QrSegmentMode::Kanji,
                    position,
                    value: u32::from(code),
                });
            }
            bb.append_bits(u32::from(code), 13);
        }
        Ok(Self {
            mode: QrSegmentMode::Kanji,
            numchars: codes.len(),
            data: bb,
        })
    }

    /// Creates a kanji-mode segment from Shift JIS double-byte data.
    ///
    /// Each byte pair in 0x8140..=0x9FFC or 0xE040..=0xEBBF is reduced to its
    /// 13-bit kanji code.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidCharacter`] if the data has odd length or holds a
    /// pair outside those ranges.
    pub fn make_kanji_sjis(data: &[u8]) -> Result<Self> {
        let mut codes: Vec<u16> = Vec::with_capacity(data.len() / 2);
        for (position, pair) in data.chunks(2).enumerate() {
            let invalid = |value: u32| QrError::InvalidCharacter {
                mode: QrSegmentMode::Kanji,
                position,
                value,
            };
            let &[hi, lo] = pair else {
                return Err(invalid(u32::from(pair[0])));
            };
            let code = sjis_to_kanji_code(hi, lo).ok_or_else(|| {
                invalid((u32::from(hi) << 8) | u32::from(lo))
            })?;
            codes.push(code);
        }
        Self::make_kanji(&codes)
    }

    /// Creates a segment representing an Extended Channel Interpretation
    /// (ECI) designator with the given assignment value.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidConfiguration`] if `assignval` is 1 000 000 or more.
    pub fn make_eci(assignval: u32) -> Result<Self> {
        let mut bb = BitBuffer::with_capacity(24);
        if assignval < 1 << 7 {
            bb.append_bits(assignval, 8);
        } else if assignval < 1 << 14 {
            bb.append_bits(0b10, 2);
            bb.append_bits(assignval, 14);
        } else if assignval < 1_000_000 {
            bb.append_bits(0b110, 3);
            bb.append_bits(assignval, 21);
        } else {
            return Err(
                QrError::InvalidConfiguration(
                    format!("ECI assignment value {} out of range", assignval)
                )
            );
        }
        Ok(Self {
            mode: QrSegmentMode::Eci,
            numchars: 0,
            data: bb,
        })
    }

    /// Creates a segment from an already-packed payload.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidConfiguration`] if the payload length is not the one
    /// `numchars` implies for `mode`.
    pub fn new(mode: QrSegmentMode, numchars: usize, data: BitBuffer) -> Result<Self> {
        let consistent = match mode {
            QrSegmentMode::Eci => numchars == 0 && [8, 16, 24].contains(&data.len()),
            _ => QrSegment::bit_length(mode, numchars) == Some(data.len()),
        };
        if !consistent {
            return Err(
                QrError::InvalidConfiguration(
                    format!(
                        "{:?} segment of {} characters cannot carry {} bits",
                        mode,
                        numchars,
                        data.len()
                    )
                )
            );
        }
        Ok(Self { mode, numchars, data })
    }

    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    /// Returns the character count: digits, characters, bytes or kanji codes.
    pub fn num_chars(&self) -> usize {
        self.numchars
    }

    pub fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Returns the payload size in bits for `numchars` characters of `mode`,
    /// excluding the mode indicator and count field.
    pub fn bit_length(mode: QrSegmentMode, numchars: usize) -> Option<usize> {
        let mul_frac_ceil = |numer: usize, denom: usize| {
            Some(numchars)
                .and_then(|x| x.checked_mul(numer))
                .and_then(|x| x.checked_add(denom - 1))
                .map(|x| x / denom)
        };
        use QrSegmentMode::*;
        match mode {
            Numeric => mul_frac_ceil(10, 3),
            Alphanumeric => mul_frac_ceil(11, 2),
            Byte => mul_frac_ceil(8, 1),
            Kanji => mul_frac_ceil(13, 1),
            Eci => None,
        }
    }

    /// Returns the number of bits needed to encode the given segments at the given
    /// version, or `None` if a character count overflows its field.
    pub fn get_total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits: u8 = seg.mode.num_char_count_bits(version);
            if let Some(limit) = (1usize).checked_shl(ccbits.into()) {
                if seg.numchars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }

    /// Like [`get_total_bits`](Self::get_total_bits), reporting which segment overflowed.
    pub fn total_bit_length(segs: &[Self], version: Version) -> Result<usize> {
        for seg in segs {
            let bits: u8 = seg.mode.num_char_count_bits(version);
            if seg.numchars >> bits != 0 {
                return Err(QrError::FieldOverflow {
                    mode: seg.mode,
                    count: seg.numchars,
                    bits,
                });
            }
        }
        QrSegment::get_total_bits(segs, version).ok_or(QrError::DataTooLong {
            used: None,
            capacity: 0,
        })
    }

    /// Unpacks the payload back into the data it was built from.
    ///
    /// Numeric and alphanumeric segments yield their ASCII text, byte segments their
    /// bytes, kanji segments each 13-bit code as a big-endian pair and ECI segments the
    /// assignment value as big-endian `u32`. Returns `None` on a malformed payload.
    pub fn decode_payload(&self) -> Option<Vec<u8>> {
        let mut r = self.data.reader();
        let mut out: Vec<u8> = Vec::with_capacity(self.numchars);
        match self.mode {
            QrSegmentMode::Numeric => {
                let mut left = self.numchars;
                while left > 0 {
                    let (n, bits) = match left {
                        1 => (1, 4),
                        2 => (2, 7),
                        _ => (3, 10),
                    };
                    let val = r.read_bits(bits)?;
                    let digits = format!("{:0width$}", val, width = n);
                    if digits.len() != n {
                        return None;
                    }
                    out.extend_from_slice(digits.as_bytes());
                    left -= n;
                }
            }
            QrSegmentMode::Alphanumeric => {
                let charset = ALPHANUMERIC_CHARSET.as_bytes();
                let mut left = self.numchars;
                while left > 0 {
                    if left >= 2 {
                        let val = usize::try_from(r.read_bits(11)?).ok()?;
                        out.push(*charset.get(val / 45)?);
                        out.push(*charset.get(val % 45)?);
                        left -= 2;
                    } else {
                        let val = usize::try_from(r.read_bits(6)?).ok()?;
                        out.push(*charset.get(val)?);
                        left -= 1;
                    }
                }
            }
            QrSegmentMode::Byte => {
                for _ in 0..self.numchars {
                    out.push(r.read_bits(8)? as u8);
                }
            }
            QrSegmentMode::Kanji => {
                for _ in 0..self.numchars {
                    let code = r.read_bits(13)? as u16;
                    out.extend_from_slice(&code.to_be_bytes());
                }
            }
            QrSegmentMode::Eci => {
                let assignval = match r.read_bits(1)? {
                    0 => r.read_bits(7)?,
                    _ =>
                        match r.read_bits(1)? {
                            0 => r.read_bits(14)?,
                            _ => {
                                r.read_bits(1)?;
                                r.read_bits(21)?
                            }
                        }
                };
                out.extend_from_slice(&assignval.to_be_bytes());
            }
        }
        if r.remaining() != 0 {
            return None;
        }
        Some(out)
    }

    /// Tests whether every character of `text` is a decimal digit.
    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    /// Tests whether every character of `text` is in the alphanumeric charset.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}

/// Returns the alphanumeric code of `c`.
pub(crate) fn alphanumeric_index(c: char) -> Option<u32> {
    ALPHANUMERIC_CHARSET.find(c).map(|i| i as u32)
}

fn sjis_to_kanji_code(hi: u8, lo: u8) -> Option<u16> {
    // Trail bytes run 0x40..=0xFC, skipping 0x7F.
    if lo < 0x40 || lo == 0x7f || lo > 0xfc {
        return None;
    }
    let cp = u16::from(hi) << 8 | u16::from(lo);
    let offset = match cp {
        0x8140..=0x9ffc => cp - 0x8140,
        0xe040..=0xebbf => cp - 0xc140,
        _ => {
            return None;
        }
    };
    Some((offset >> 8) * 0xc0 + (offset & 0xff))
}

/// Describes how a segment's data bits are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
}

impl QrSegmentMode {
    /// Returns the 4-bit mode indicator.
    pub fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Kanji => 0x8,
            Eci => 0x7,
        }
    }

    /// Returns the width of the character count field at the given version.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (
            match self {
                Numeric => [10, 12, 14],
                Alphanumeric => [9, 11, 13],
                Byte => [8, 16, 16],
                Kanji => [8, 10, 12],
                Eci => [0, 0, 0],
            }
        )[usize::from((ver.value() + 7) / 17)]
    }
}
