//! Configuration options for decoding.
//!
//! Encoding has nothing to configure: there is exactly one valid encoding of
//! each value. Decoding can be tuned for untrusted input:
//!
//! - `max_depth` bounds how deeply lists, dicts and objects may nest.
//! - `canonical` rejects any input that would not re-encode to the same
//!   bytes. In binary that means non-minimal varints, unsorted dict keys and
//!   text that is not NFC. In JSON it means non-NFC text, unneeded `\`
//!   escapes, uppercase hex, and typed wrappers the encoder never writes
//!   (anything but `{"uint": n}` and `{"dict": {...}}` around a one-key dict).
//!
//! ## Examples
//!
//! ```rust
//! use serde_ots::{from_slice_with_options, DecodeOptions, Registry};
//!
//! let registry = Registry::default();
//! let options = DecodeOptions::canonical().with_max_depth(16);
//!
//! // 0x02 0x80 0x00 is zero with a redundant varint group
//! assert!(from_slice_with_options(&registry, &[0x02, 0x80, 0x00], &options).is_err());
//! assert!(from_slice_with_options(&registry, &[0x02, 0x00], &options).is_ok());
//! ```

/// Default nesting limit for decoded values.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration options for binary and JSON decoding.
///
/// # Examples
///
/// ```rust
/// use serde_ots::DecodeOptions;
///
/// let options = DecodeOptions::new();
/// assert_eq!(options.max_depth, 128);
/// assert!(!options.canonical);
///
/// let strict = DecodeOptions::canonical();
/// assert!(strict.canonical);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_depth: usize,
    pub canonical: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            canonical: false,
        }
    }
}

impl DecodeOptions {
    /// Creates default options (lenient, depth limit 128).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that only accept canonically encoded input.
    #[must_use]
    pub fn canonical() -> Self {
        DecodeOptions {
            canonical: true,
            ..Default::default()
        }
    }

    /// Sets the maximum nesting depth.
    ///
    /// Every list, dict or object opens one level; scalars open none. A limit
    /// of 0 therefore only admits a single scalar.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables canonical-only decoding.
    #[must_use]
    pub fn with_canonical(mut self, canonical: bool) -> Self {
        self.canonical = canonical;
        self
    }
}
