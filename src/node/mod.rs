//! The node contract and the leaf nodes the core ships with.
//!
//! A [`Node`] is an immutable rendered-text fragment that knows its exact
//! length before it is written. Composites own their inner node by value
//! and are generic over its type, so a tree like
//! `Bold<Italic<&str>>` is a single nested value resolved at compile time:
//! no boxing, no vtables, no allocation per level.
//!
//! Lengths are in UTF-8 bytes and are always measured under
//! [`FormatContext::INVARIANT`]. Rendering under another context goes
//! through [`Node::try_format`] or [`Node::render_with`].

mod composite;

pub use composite::{Envelope, Wrapped};

use tracing::debug;

use crate::buffer::zeroed;
use crate::error::{Error, Result};
use crate::format::{FormatContext, Scalar, scalar_length, write_scalar};
use crate::memo::Memo;
use crate::sink::{Sink, SliceSink, UnitLocator};
use crate::stream::{StreamConfig, render_streaming};

/// A measurable, renderable fragment of markup.
///
/// Implementors provide the lengths and [`Node::write_to`]; every other
/// operation is derived from those. Invariants every implementation keeps:
///
/// - `syntax_length() <= total_length()`, and both are stable for the
///   lifetime of the value.
/// - `write_to` under the invariant context pushes exactly
///   `total_length()` bytes.
/// - `unit_at(i)` agrees with byte `i` of the written sequence.
pub trait Node {
    /// Exact rendered length in bytes.
    fn total_length(&self) -> usize;

    /// Bytes of markup literals this node itself contributes.
    ///
    /// Inner nodes count as content, whatever markup they carry, so
    /// `total_length() - syntax_length()` is the sum of the inner nodes'
    /// total lengths. Leaves return zero and concatenations sum their parts.
    fn syntax_length(&self) -> usize;

    /// Push the rendered text into `sink`, formatting scalars with `ctx`.
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()>;

    /// The byte at `index` of the rendered text, or `None` past the end.
    ///
    /// The default walks the node without storing its output; composites
    /// override it to jump straight to the part containing `index`.
    fn unit_at(&self, index: usize) -> Option<u8> {
        if index >= self.total_length() {
            return None;
        }
        let mut locator = UnitLocator::new(index);
        // The locator ends the walk with an error once it holds the byte.
        let _ = self.write_to(&mut locator, &FormatContext::INVARIANT);
        locator.found()
    }

    /// Write the rendered text at the start of `dest`, returning the byte count.
    ///
    /// Fails with [`Error::Capacity`] before writing anything when `dest` is
    /// shorter than [`Node::total_length`].
    fn copy_to(&self, dest: &mut [u8]) -> Result<usize> {
        let required = self.total_length();
        if dest.len() < required {
            return Err(Error::Capacity {
                required,
                available: dest.len(),
            });
        }
        let mut sink = SliceSink::new(&mut dest[..required]);
        self.write_to(&mut sink, &FormatContext::INVARIANT)?;
        let written = sink.written();
        if written != required {
            return Err(Error::Incomplete {
                declared: required,
                written,
            });
        }
        Ok(written)
    }

    /// Write the text rendered under `ctx` into `dest`.
    ///
    /// The length under a non-invariant context is not known up front, so an
    /// undersized `dest` is reported as [`Error::Capacity`] once the first
    /// fragment fails to fit; nothing is written past the end of `dest`.
    fn try_format(&self, dest: &mut [u8], ctx: &FormatContext) -> Result<usize> {
        if ctx.is_invariant() {
            return self.copy_to(dest);
        }
        let mut sink = SliceSink::new(dest);
        self.write_to(&mut sink, ctx)?;
        Ok(sink.written())
    }

    /// Render into a string allocated once at the exact length.
    fn render(&self) -> Result<String> {
        let mut buf = zeroed(self.total_length())?;
        self.copy_to(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Render under `ctx`, growing the output from a `total_length` hint.
    fn render_with(&self, ctx: &FormatContext) -> Result<String> {
        if ctx.is_invariant() {
            return self.render();
        }
        render_streaming(self, ctx, &StreamConfig::default())
    }
}

impl Node for str {
    fn total_length(&self) -> usize {
        self.len()
    }

    fn syntax_length(&self) -> usize {
        0
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, _ctx: &FormatContext) -> Result<()> {
        sink.push_str(self)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }
}

impl Node for String {
    fn total_length(&self) -> usize {
        self.len()
    }

    fn syntax_length(&self) -> usize {
        0
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, _ctx: &FormatContext) -> Result<()> {
        sink.push_str(self)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }
}

impl Node for char {
    fn total_length(&self) -> usize {
        self.len_utf8()
    }

    fn syntax_length(&self) -> usize {
        0
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, _ctx: &FormatContext) -> Result<()> {
        sink.push_char(*self)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        let mut utf8 = [0u8; 4];
        self.encode_utf8(&mut utf8).as_bytes().get(index).copied()
    }
}

impl<N: Node + ?Sized> Node for &N {
    fn total_length(&self) -> usize {
        (**self).total_length()
    }

    fn syntax_length(&self) -> usize {
        (**self).syntax_length()
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        (**self).write_to(sink, ctx)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        (**self).unit_at(index)
    }

    fn render_with(&self, ctx: &FormatContext) -> Result<String> {
        (**self).render_with(ctx)
    }
}

/// A culture-aware scalar leaf.
///
/// The invariant length is computed on first use and cached. A custom
/// [`Scalar`] whose invariant text cannot be produced measures as zero and
/// fails with [`Error::Format`] when written.
#[derive(Debug, Clone, Default)]
pub struct Number<T> {
    value: T,
    length: Memo,
}

impl<T: Scalar> Number<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            length: Memo::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Scalar> Node for Number<T> {
    fn total_length(&self) -> usize {
        self.length.get_or_init(|| {
            scalar_length(&self.value, &FormatContext::INVARIANT).unwrap_or_else(|err| {
                debug!(error = %err, "scalar has no invariant text, measuring as zero");
                0
            })
        })
    }

    fn syntax_length(&self) -> usize {
        0
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        write_scalar(&self.value, ctx, sink)
    }
}

// Concatenation: a tuple of nodes renders its parts back to back.
macro_rules! impl_node_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Node),+> Node for ($($name,)+) {
            fn total_length(&self) -> usize {
                0 $(+ self.$idx.total_length())+
            }

            fn syntax_length(&self) -> usize {
                0 $(+ self.$idx.syntax_length())+
            }

            fn write_to<Sk: Sink + ?Sized>(&self, sink: &mut Sk, ctx: &FormatContext) -> Result<()> {
                $(self.$idx.write_to(sink, ctx)?;)+
                Ok(())
            }

            fn unit_at(&self, index: usize) -> Option<u8> {
                let mut index = index;
                $(
                    let len = self.$idx.total_length();
                    if index < len {
                        return self.$idx.unit_at(index);
                    }
                    index -= len;
                )+
                let _ = index;
                None
            }
        }
    };
}

impl_node_tuple!(A: 0, B: 1);
impl_node_tuple!(A: 0, B: 1, C: 2);
impl_node_tuple!(A: 0, B: 1, C: 2, D: 3);
