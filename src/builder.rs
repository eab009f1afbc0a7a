//! Two-phase builders: measure the exact length, allocate once, write once.
//!
//! - [`FixedBuilder`] takes the final length from the caller (usually the sum
//!   of each fragment's `total_length`) and fails on the append that would
//!   overflow it.
//! - [`build`] / [`build_with`] run one closure twice, first against a
//!   length-counting [`Writer`], then against a writer bound to the exactly
//!   sized buffer, so measuring and writing can never disagree.
//!
//! # Example
//!
//! ```
//! use chatmark::{build, markdown::bold};
//!
//! let text = build(|w| {
//!     w.push_str("Fruit: ")?;
//!     w.join(", ", [bold("Apple"), bold("Banana")])
//! })
//! .unwrap();
//! assert_eq!(text, "Fruit: **Apple**, **Banana**");
//! ```

use tracing::debug;

use crate::buffer::zeroed;
use crate::error::{Error, Result};
use crate::format::{FormatContext, FormatSpec, Scalar, write_scalar};
use crate::node::Node;
use crate::sink::{LengthCounter, Sink, SliceSink};

/// Builder over a buffer of a caller-declared, exact length.
#[derive(Debug)]
pub struct FixedBuilder {
    buf: Vec<u8>,
    pos: usize,
}

impl FixedBuilder {
    /// Allocate exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            buf: zeroed(capacity)?,
            pos: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn push_str(&mut self, s: &str) -> Result<()> {
        let end = self.pos + s.len();
        if end > self.buf.len() {
            return Err(Error::Capacity {
                required: end,
                available: self.buf.len(),
            });
        }
        self.buf[self.pos..end].copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }

    pub fn push_char(&mut self, c: char) -> Result<()> {
        let mut utf8 = [0u8; 4];
        self.push_str(c.encode_utf8(&mut utf8))
    }

    /// Append a node's invariant rendering.
    pub fn push_node<N: Node + ?Sized>(&mut self, node: &N) -> Result<()> {
        let written = node.copy_to(&mut self.buf[self.pos..]).map_err(|err| match err {
            Error::Capacity { required, .. } => Error::Capacity {
                required: self.pos + required,
                available: self.buf.len(),
            },
            other => other,
        })?;
        self.pos += written;
        Ok(())
    }

    /// Return the text, failing if fewer bytes were written than declared.
    pub fn finish(self) -> Result<String> {
        if self.pos != self.buf.len() {
            return Err(Error::Incomplete {
                declared: self.buf.len(),
                written: self.pos,
            });
        }
        Ok(String::from_utf8(self.buf)?)
    }
}

impl Sink for FixedBuilder {
    fn push_str(&mut self, s: &str) -> Result<()> {
        FixedBuilder::push_str(self, s)
    }

    fn written(&self) -> usize {
        self.pos
    }
}

/// The context handed to a [`build`] closure.
///
/// During the first pass the writer only counts; during the second it
/// writes into the final buffer. The closure cannot tell the difference.
pub struct Writer<'a> {
    sink: &'a mut dyn Sink,
    ctx: FormatContext,
}

impl<'a> Writer<'a> {
    fn new(sink: &'a mut dyn Sink, ctx: FormatContext) -> Self {
        Self { sink, ctx }
    }

    /// The format context scalars and nodes are rendered with.
    pub fn context(&self) -> &FormatContext {
        &self.ctx
    }

    pub fn push_str(&mut self, s: &str) -> Result<()> {
        self.sink.push_str(s)
    }

    pub fn push_char(&mut self, c: char) -> Result<()> {
        self.sink.push_char(c)
    }

    /// Append a node.
    ///
    /// While measuring under the invariant context the node's cached
    /// `total_length` is used instead of walking it.
    pub fn push_node<N: Node + ?Sized>(&mut self, node: &N) -> Result<()> {
        if self.sink.is_measuring() && self.ctx.is_invariant() {
            return self.sink.skip(node.total_length());
        }
        node.write_to(&mut *self.sink, &self.ctx)
    }

    /// Append a scalar formatted with the builder's context.
    pub fn push_scalar<T: Scalar + ?Sized>(&mut self, value: &T) -> Result<()> {
        write_scalar(value, &self.ctx, &mut *self.sink)
    }

    /// Append a scalar with an explicit format spec and the builder's locale.
    pub fn push_scalar_with<T: Scalar + ?Sized>(&mut self, value: &T, spec: FormatSpec) -> Result<()> {
        let ctx = self.ctx.with_spec(spec);
        write_scalar(value, &ctx, &mut *self.sink)
    }

    /// Append `items` separated by `separator`.
    ///
    /// No separator is written for zero or one items.
    pub fn join<I>(&mut self, separator: &str, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Node,
    {
        if self.sink.is_measuring() && self.ctx.is_invariant() {
            let mut count = 0usize;
            let mut total = 0usize;
            for item in items {
                count += 1;
                total += item.total_length();
            }
            let separators = count.saturating_sub(1) * separator.len();
            return self.sink.skip(total + separators);
        }

        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sink.push_str(separator)?;
            }
            item.write_to(&mut *self.sink, &self.ctx)?;
        }
        Ok(())
    }
}

/// Build a string with the invariant format context.
pub fn build<F>(compose: F) -> Result<String>
where
    F: FnMut(&mut Writer<'_>) -> Result<()>,
{
    build_with(FormatContext::INVARIANT, compose)
}

/// Build a string, measuring with `compose` first and writing with it second.
pub fn build_with<F>(ctx: FormatContext, mut compose: F) -> Result<String>
where
    F: FnMut(&mut Writer<'_>) -> Result<()>,
{
    let mut counter = LengthCounter::new();
    compose(&mut Writer::new(&mut counter, ctx))?;
    let declared = counter.len();

    let mut buf = zeroed(declared)?;
    let mut sink = SliceSink::new(&mut buf);
    if let Err(err) = compose(&mut Writer::new(&mut sink, ctx)) {
        if matches!(err, Error::Capacity { .. }) {
            debug!(declared, "build closure wrote more than it measured");
        }
        return Err(err);
    }
    let written = sink.written();
    if written != declared {
        debug!(declared, written, "build closure wrote less than it measured");
        return Err(Error::Incomplete { declared, written });
    }
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Locale;
    use crate::markdown::{Header, bold, list};

    #[test]
    fn test_fixed_builder_exact() {
        let title = Header::new(3, "Title").unwrap();
        let body = bold("bold");
        let mut builder =
            FixedBuilder::with_capacity(title.total_length() + 1 + body.total_length()).unwrap();
        builder.push_node(&title).unwrap();
        builder.push_char('\n').unwrap();
        builder.push_node(&body).unwrap();
        assert_eq!(builder.finish().unwrap(), "### Title\n**bold**");
    }

    #[test]
    fn test_fixed_builder_too_small_fails() {
        let mut builder = FixedBuilder::with_capacity(5).unwrap();
        builder.push_str("abc").unwrap();
        let err = builder.push_node(&bold("x")).unwrap_err();
        assert_eq!(
            err,
            Error::Capacity {
                required: 8,
                available: 5
            }
        );
        assert_eq!(builder.remaining(), 2);
    }

    #[test]
    fn test_fixed_builder_too_large_fails() {
        let mut builder = FixedBuilder::with_capacity(10).unwrap();
        builder.push_str("short").unwrap();
        assert_eq!(
            builder.finish().unwrap_err(),
            Error::Incomplete {
                declared: 10,
                written: 5
            }
        );
    }

    #[test]
    fn test_join_two_items() {
        let text = build(|w| w.join(", ", ["Apple", "Banana"])).unwrap();
        assert_eq!(text, "Apple, Banana");
        assert_eq!(text.len(), 13);
    }

    #[test]
    fn test_join_zero_and_one_items() {
        let empty: [&str; 0] = [];
        assert_eq!(build(|w| w.join(", ", empty)).unwrap(), "");
        assert_eq!(build(|w| w.join(", ", ["solo"])).unwrap(), "solo");
    }

    #[test]
    fn test_build_mixes_nodes_and_scalars() {
        let items = list("milk\neggs");
        let text = build(|w| {
            w.push_str("Buy ")?;
            w.push_scalar(&2)?;
            w.push_str(" things:\n")?;
            w.push_node(&items)
        })
        .unwrap();
        assert_eq!(text, "Buy 2 things:\n- milk\n- eggs");
    }

    #[test]
    fn test_build_with_locale() {
        let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::DE_DE);
        let text = build_with(ctx, |w| {
            w.push_scalar(&1234567)?;
            w.push_str(" / ")?;
            w.push_scalar_with(&0.5f64, FormatSpec::GENERAL.with_precision(2))
        })
        .unwrap();
        assert_eq!(text, "1.234.567 / 0,50");
    }

    #[test]
    fn test_build_detects_drift() {
        let mut calls = 0;
        let err = build(|w| {
            calls += 1;
            w.push_str(if calls == 1 { "ab" } else { "abc" })
        })
        .unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));

        let mut calls = 0;
        let err = build(|w| {
            calls += 1;
            w.push_str(if calls == 1 { "abc" } else { "ab" })
        })
        .unwrap_err();
        assert_eq!(
            err,
            Error::Incomplete {
                declared: 3,
                written: 2
            }
        );
    }

    #[test]
    fn test_build_propagates_format_error() {
        let ctx = FormatContext::INVARIANT.with_spec(FormatSpec::GENERAL.with_precision(99));
        let err = build_with(ctx, |w| w.push_scalar(&1.5f64)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
