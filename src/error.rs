//! Error types for QR Code encoding.

use thiserror::Error;

use crate::segment::QrSegmentMode;

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, QrError>;

/// Errors that can occur while building a QR Code symbol.
///
/// Ways to handle [`QrError::DataTooLong`] include:
///
/// - Decrease the error correction level if it was greater than `QrCodeEcc::Low`.
/// - Increase the `max_version` option if it was less than `Version::MAX`.
/// - Split the text data into better or optimal segments to reduce the number of bits required.
/// - Change the text or binary data to be shorter.
/// - Propagate the error upward to the caller/user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    /// The data does not fit in any allowed version at the requested correction level.
    ///
    /// `used` is `None` when a segment's character count overflows its count field
    /// even at the largest allowed version.
    #[error("{}", data_too_long_message(.used, .capacity))]
    DataTooLong { used: Option<usize>, capacity: usize },

    /// The input holds a character the requested segment mode cannot represent.
    ///
    /// `value` is the Unicode scalar value for text input, or the raw code/byte value
    /// for kanji input.
    #[error("Value {value:#06x} at position {position} cannot be encoded in {mode:?} mode")]
    InvalidCharacter {
        mode: QrSegmentMode,
        position: usize,
        value: u32,
    },

    /// A character count does not fit in its mode's count field.
    #[error("{mode:?} segment of {count} characters overflows a {bits}-bit count field")]
    FieldOverflow {
        mode: QrSegmentMode,
        count: usize,
        bits: u8,
    },

    /// An option or argument is outside its permitted range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn data_too_long_message(used: &Option<usize>, capacity: &usize) -> String {
    match *used {
        Some(n) => format!("Data length = {} bits, Max capacity = {} bits", n, capacity),
        None => format!("Segment too long (max capacity = {} bits)", capacity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_too_long_message() {
        let err = QrError::DataTooLong { used: Some(30000), capacity: 10208 };
        assert_eq!(err.to_string(), "Data length = 30000 bits, Max capacity = 10208 bits");
        let err = QrError::DataTooLong { used: None, capacity: 128 };
        assert!(err.to_string().starts_with("Segment too long"));
    }

    #[test]
    fn test_invalid_character_message() {
        let err = QrError::InvalidCharacter {
            mode: QrSegmentMode::Numeric,
            position: 3,
            value: u32::from('x'),
        };
        assert_eq!(err.to_string(), "Value 0x0078 at position 3 cannot be encoded in Numeric mode");
    }
}
