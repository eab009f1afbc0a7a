//! Write targets for node rendering.
//!
//! Every node renders itself by pushing whole `&str` fragments into a
//! [`Sink`]. The same rendering code therefore serves measuring
//! ([`LengthCounter`]), bounded writing into a caller-owned slice
//! ([`SliceSink`]), and the rewriting and growable targets of the
//! streaming engine.

use crate::error::{Error, Result};

/// A destination for rendered text.
pub trait Sink {
    /// Append a fragment.
    fn push_str(&mut self, s: &str) -> Result<()>;

    /// Append a single character.
    fn push_char(&mut self, c: char) -> Result<()> {
        let mut utf8 = [0u8; 4];
        self.push_str(c.encode_utf8(&mut utf8))
    }

    /// Number of bytes accepted so far.
    fn written(&self) -> usize;

    /// Whether this sink only counts bytes.
    ///
    /// Measuring sinks accept [`Sink::skip`], which lets callers add an
    /// already-known length without producing the text.
    fn is_measuring(&self) -> bool {
        false
    }

    /// Account for `len` bytes without writing them (measuring sinks only).
    fn skip(&mut self, len: usize) -> Result<()> {
        let _ = len;
        Err(Error::OutOfRange(
            "skip is only supported by measuring sinks".to_string(),
        ))
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn push_str(&mut self, s: &str) -> Result<()> {
        (**self).push_str(s)
    }

    fn push_char(&mut self, c: char) -> Result<()> {
        (**self).push_char(c)
    }

    fn written(&self) -> usize {
        (**self).written()
    }

    fn is_measuring(&self) -> bool {
        (**self).is_measuring()
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        (**self).skip(len)
    }
}

/// Counts bytes without storing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthCounter {
    len: usize,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for LengthCounter {
    fn push_str(&mut self, s: &str) -> Result<()> {
        self.len += s.len();
        Ok(())
    }

    fn push_char(&mut self, c: char) -> Result<()> {
        self.len += c.len_utf8();
        Ok(())
    }

    fn written(&self) -> usize {
        self.len
    }

    fn is_measuring(&self) -> bool {
        true
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.len += len;
        Ok(())
    }
}

/// Bounded writer over a caller-owned byte slice.
///
/// A fragment that does not fit is rejected whole; bytes past the end of the
/// slice are never touched.
#[derive(Debug)]
pub struct SliceSink<'a> {
    dest: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(dest: &'a mut [u8]) -> Self {
        Self { dest, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.dest.len() - self.pos
    }
}

impl Sink for SliceSink<'_> {
    fn push_str(&mut self, s: &str) -> Result<()> {
        let end = self.pos + s.len();
        if end > self.dest.len() {
            return Err(Error::Capacity {
                required: end,
                available: self.dest.len(),
            });
        }
        self.dest[self.pos..end].copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }

    fn written(&self) -> usize {
        self.pos
    }
}

/// Captures the byte at one logical position of a rendered sequence.
///
/// Behaves like a sink with room for `target + 1` bytes: the fragment that
/// reaches the target is recorded and then refused with [`Error::Capacity`],
/// which ends the walk. Callers read [`UnitLocator::found`] regardless of
/// the returned error.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UnitLocator {
    target: usize,
    pos: usize,
    found: Option<u8>,
}

impl UnitLocator {
    pub(crate) fn new(target: usize) -> Self {
        Self {
            target,
            pos: 0,
            found: None,
        }
    }

    pub(crate) fn found(&self) -> Option<u8> {
        self.found
    }
}

impl Sink for UnitLocator {
    fn push_str(&mut self, s: &str) -> Result<()> {
        let end = self.pos + s.len();
        if self.target < end {
            if self.found.is_none() {
                self.found = self
                    .target
                    .checked_sub(self.pos)
                    .and_then(|offset| s.as_bytes().get(offset).copied());
            }
            return Err(Error::Capacity {
                required: end,
                available: self.target + 1,
            });
        }
        self.pos = end;
        Ok(())
    }

    fn written(&self) -> usize {
        self.pos
    }
}
