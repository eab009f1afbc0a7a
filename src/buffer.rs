//! Buffer sizing and the growable output buffer of the streaming engine.

use tracing::trace;

use crate::error::{Error, Result};

/// Default multiplier applied when a streaming buffer runs out of room.
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Compute the next buffer size: `ceil(current * growth_factor)`.
///
/// The result is strictly greater than `current` for any `current >= 1`.
/// Fails with [`Error::OutOfRange`] unless `growth_factor` is finite and
/// greater than 1, and with [`Error::Allocation`] if the size overflows.
///
/// # Examples
///
/// ```
/// use chatmark::next_size;
///
/// assert_eq!(next_size(10, 2.0).unwrap(), 20);
/// assert_eq!(next_size(10, 1.5).unwrap(), 15);
/// assert_eq!(next_size(3, 1.1).unwrap(), 4);
/// ```
pub fn next_size(current: usize, growth_factor: f64) -> Result<usize> {
    validate_growth_factor(growth_factor)?;
    let grown = (current as f64 * growth_factor).ceil();
    if !grown.is_finite() || grown >= isize::MAX as f64 {
        return Err(Error::Allocation {
            requested: usize::MAX,
        });
    }
    // Float rounding can swallow a tiny factor on huge sizes; zero grows to one.
    Ok((grown as usize).max(current + 1))
}

pub(crate) fn validate_growth_factor(growth_factor: f64) -> Result<()> {
    if growth_factor.is_finite() && growth_factor > 1.0 {
        Ok(())
    } else {
        Err(Error::OutOfRange(format!(
            "growth factor must be finite and greater than 1, got {growth_factor}"
        )))
    }
}

/// Allocate a zero-filled buffer of exactly `len` bytes.
pub(crate) fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { requested: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// An owned output buffer that is replaced by a larger one when full.
///
/// Growth allocates a fresh buffer of [`next_size`] bytes, copies the bytes
/// written so far and drops the old buffer. Written bytes are never lost.
#[derive(Debug)]
pub struct GrowableBuffer {
    buf: Vec<u8>,
    pos: usize,
    growth_factor: f64,
    growths: usize,
}

impl GrowableBuffer {
    /// Create a buffer of `hint` bytes (at least one).
    pub fn with_hint(hint: usize, growth_factor: f64) -> Result<Self> {
        validate_growth_factor(growth_factor)?;
        Ok(Self {
            buf: zeroed(hint.max(1))?,
            pos: 0,
            growth_factor,
            growths: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Number of times the buffer has been replaced.
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// Copy as much of `bytes` as fits, returning how many were taken.
    pub fn write_some(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.remaining());
        self.buf[self.pos..self.pos + take].copy_from_slice(&bytes[..take]);
        self.pos += take;
        take
    }

    /// Replace the storage with a strictly larger buffer.
    pub fn grow(&mut self) -> Result<()> {
        let old = self.buf.len();
        let new = next_size(old, self.growth_factor)?;
        let mut next = zeroed(new)?;
        next[..self.pos].copy_from_slice(&self.buf[..self.pos]);
        self.buf = next;
        self.growths += 1;
        trace!(from = old, to = new, written = self.pos, "grew stream buffer");
        Ok(())
    }

    /// The written bytes, dropping unused capacity.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.pos);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_size_rejects_bad_factor() {
        assert!(matches!(next_size(10, 1.0), Err(Error::OutOfRange(_))));
        assert!(matches!(next_size(10, 0.5), Err(Error::OutOfRange(_))));
        assert!(matches!(next_size(10, f64::NAN), Err(Error::OutOfRange(_))));
        assert!(matches!(
            next_size(10, f64::INFINITY),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn test_next_size_zero_stays_small() {
        assert_eq!(next_size(0, 2.0).unwrap(), 1);
    }

    #[test]
    fn test_next_size_overflow_is_allocation_error() {
        assert!(matches!(
            next_size(usize::MAX / 2, 4.0),
            Err(Error::Allocation { .. })
        ));
    }

    #[test]
    fn test_growable_buffer_keeps_written_bytes() {
        let mut buf = GrowableBuffer::with_hint(3, 2.0).unwrap();
        assert_eq!(buf.write_some(b"hello"), 3);
        buf.grow().unwrap();
        assert_eq!(buf.capacity(), 6);
        assert_eq!(buf.write_some(b"lo"), 2);
        assert_eq!(buf.growths(), 1);
        assert_eq!(buf.into_bytes(), b"hello");
    }

    #[test]
    fn test_zero_hint_gets_one_byte() {
        let buf = GrowableBuffer::with_hint(0, 2.0).unwrap();
        assert_eq!(buf.capacity(), 1);
        assert!(buf.is_empty());
    }

    proptest! {
        #[test]
        fn prop_next_size_strictly_grows(current in 1usize..1_000_000_000, factor in 1.0001f64..8.0) {
            let next = next_size(current, factor).unwrap();
            prop_assert!(next > current);
            prop_assert!(next as f64 >= current as f64 * factor - 1.0);
        }
    }
}
