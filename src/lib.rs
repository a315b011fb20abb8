//! # qrmatrix
//!
//! A Rust library for encoding text or binary data into QR Code symbols.
//!
//! `qrmatrix` turns data into the square module matrix of a QR Code Model 2 symbol. It
//! supports versions 1 to 40, the four error correction levels and the numeric,
//! alphanumeric, byte, kanji and ECI modes. Rendering the matrix (to pixels, SVG or a
//! terminal) is left to the caller.
//!
//! ## Features
//!
//! - Encode data in numeric, alphanumeric, byte, kanji or ECI modes.
//! - Split mixed text into segments greedily or with a bit-optimal search.
//! - Support four error correction levels: Low, Medium, Quartile, High.
//! - Pick the smallest fitting version and the lowest-penalty mask automatically,
//!   or fix either of them.
//! - Evaluate the eight masks in parallel with the `parallel` feature.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrmatrix = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Encode a string and print it as text:
//!
//! ```rust
//! use qrmatrix::{QrCode, QrCodeEcc};
//!
//! let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
//! for y in -1..=qr.size() {
//!     let line: String = (-1..=qr.size())
//!         .map(|x| if qr.get_module(x, y) { '#' } else { ' ' })
//!         .collect();
//!     println!("{}", line);
//! }
//! ```
//!
//! Choose the segmentation and the options yourself:
//!
//! ```rust
//! use qrmatrix::{make_segments_optimally, EncodeOptions, Mask, QrCode, QrCodeEcc, Version};
//!
//! let ecl = QrCodeEcc::Quartile;
//! let segs = make_segments_optimally("ABC-123456789", ecl, Version::MIN, Version::MAX, None)
//!     .unwrap();
//! let options = EncodeOptions::new(ecl).with_mask(Some(Mask::new(3)));
//! let qr = QrCode::encode_segments_advanced(&segs, &options).unwrap();
//! assert_eq!(qr.mask(), Mask::new(3));
//! ```
//!
//! ## Logging
//!
//! Version, correction level and mask decisions are reported through [`tracing`] at
//! `debug` level, and every mask candidate's penalty at `trace` level. The library
//! never installs a subscriber.
//!
//! ## Modules
//!
//! - [`qrcode`]: Symbol construction and the public [`QrCode`] type.
//! - [`segment`]: Segments and their bit encodings.
//! - [`segmenter`]: Splitting text into segments.
//! - [`bits`]: The append-only bit buffer.
//! - [`reed_solomon`]: Error correction codewords.
//! - [`mask`]: Mask patterns and penalty scoring.
//! - [`grid`]: Packed module planes.
//! - [`error`]: The crate's error type.
#![forbid(unsafe_code)]

pub mod bits;
pub mod error;
pub mod grid;
pub mod mask;
pub mod qrcode;
pub mod reed_solomon;
pub mod segment;
pub mod segmenter;

pub use bits::BitBuffer;
pub use error::{QrError, Result};
pub use mask::Mask;
pub use qrcode::{EncodeOptions, QrCode, QrCodeEcc, Version};
pub use segment::{QrSegment, QrSegmentMode};
pub use segmenter::{make_segments, make_segments_optimally, KanjiTable};
