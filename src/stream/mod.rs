//! Content-dependent rewriting: line prefixes injected after separators.
//!
//! Lists and multi-line quotes cannot be rendered as prefix + inner +
//! suffix: every line of the inner content, however deeply it is nested,
//! needs the prefix again. [`LinePrefixed`] measures its inner node once
//! (`(inner_len, separators)`), caches the resulting lengths, and renders
//! through an [`InjectingSink`] that splits the inner stream at each
//! separator.
//!
//! When the exact length is not known (rendering under a non-invariant
//! format context), [`StreamWriter`] renders into a buffer that grows on
//! demand instead.

mod writer;

pub use writer::{StreamConfig, StreamWriter, render_streaming};

use memchr::memchr_iter;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::FormatContext;
use crate::memo::LengthCache;
use crate::node::Node;
use crate::sink::{Sink, UnitLocator};

/// A prefix injected at the start and after every occurrence of a separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Injection<'p> {
    separator: u8,
    prefix: &'p str,
}

impl<'p> Injection<'p> {
    /// Inject `prefix` after every `separator`.
    ///
    /// The separator must be ASCII so the byte stream is only ever split at
    /// character boundaries.
    pub fn new(separator: char, prefix: &'p str) -> Result<Self> {
        if !separator.is_ascii() {
            return Err(Error::OutOfRange(format!(
                "separator {separator:?} is not an ASCII character"
            )));
        }
        Ok(Self {
            separator: separator as u8,
            prefix,
        })
    }

    /// Inject `prefix` at the start of every line.
    pub const fn lines(prefix: &'p str) -> Self {
        Self {
            separator: b'\n',
            prefix,
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    pub fn prefix(&self) -> &'p str {
        self.prefix
    }

    /// Bytes injected into content containing `separators` separators.
    pub fn injected_length(&self, separators: usize) -> usize {
        (separators + 1) * self.prefix.len()
    }
}

/// Wraps a sink, writing the injection prefix after every separator.
///
/// The leading prefix is not written here; callers emit it before the
/// first fragment.
pub struct InjectingSink<'s, 'p, S: ?Sized> {
    sink: &'s mut S,
    injection: Injection<'p>,
}

impl<'s, 'p, S: Sink + ?Sized> InjectingSink<'s, 'p, S> {
    pub fn new(sink: &'s mut S, injection: Injection<'p>) -> Self {
        Self { sink, injection }
    }
}

impl<S: Sink + ?Sized> Sink for InjectingSink<'_, '_, S> {
    fn push_str(&mut self, s: &str) -> Result<()> {
        let mut start = 0;
        for at in memchr_iter(self.injection.separator, s.as_bytes()) {
            self.sink.push_str(&s[start..=at])?;
            self.sink.push_str(self.injection.prefix)?;
            start = at + 1;
        }
        if start < s.len() {
            self.sink.push_str(&s[start..])?;
        }
        Ok(())
    }

    fn written(&self) -> usize {
        self.sink.written()
    }
}

/// Counts bytes and separator occurrences of a rendered stream.
#[derive(Debug, Clone, Copy)]
struct SeparatorCounter {
    separator: u8,
    len: usize,
    separators: usize,
}

impl Sink for SeparatorCounter {
    fn push_str(&mut self, s: &str) -> Result<()> {
        self.len += s.len();
        self.separators += memchr_iter(self.separator, s.as_bytes()).count();
        Ok(())
    }

    fn written(&self) -> usize {
        self.len
    }
}

/// An inner node with a prefix at the start of every line.
///
/// Lengths: with `k` separators in the inner content,
/// `total = inner_len + (k + 1) * prefix_len`. They are measured on first
/// access by one walk over the inner node and frozen afterwards.
#[derive(Debug, Clone)]
pub struct LinePrefixed<N> {
    inner: N,
    injection: Injection<'static>,
    lengths: LengthCache,
}

impl<N: Node> LinePrefixed<N> {
    pub fn new(inner: N, injection: Injection<'static>) -> Self {
        Self {
            inner,
            injection,
            lengths: LengthCache::new(),
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn injection(&self) -> Injection<'static> {
        self.injection
    }

    /// Walk the inner node once, returning `(inner_len, separators)`.
    ///
    /// An inner node that fails to write under the invariant context
    /// measures as its own `total_length()` with no separators; writing it
    /// still reports the failure.
    pub fn measure_inner(&self) -> (usize, usize) {
        let mut counter = SeparatorCounter {
            separator: self.injection.separator,
            len: 0,
            separators: 0,
        };
        match self.inner.write_to(&mut counter, &FormatContext::INVARIANT) {
            Ok(()) => (counter.len, counter.separators),
            Err(err) => {
                debug!(error = %err, "inner node failed to measure, assuming no separators");
                (self.inner.total_length(), 0)
            }
        }
    }

    fn lengths(&self) -> (usize, usize) {
        self.lengths.get_or_measure(|| {
            let (inner_len, separators) = self.measure_inner();
            let injected = self.injection.injected_length(separators);
            (inner_len + injected, injected)
        })
    }

    /// Render under `ctx` through the growable streaming writer.
    pub fn render_streaming(&self, ctx: &FormatContext, config: &StreamConfig) -> Result<String> {
        config.validate()?;
        let hint = config
            .initial_hint
            .unwrap_or_else(|| self.total_length());
        let mut writer = StreamWriter::new(hint, config.growth_factor, Some(self.injection))?;
        self.inner.write_to(&mut writer, ctx)?;
        writer.finish()
    }
}

impl<N: Node> Node for LinePrefixed<N> {
    fn total_length(&self) -> usize {
        self.lengths().0
    }

    fn syntax_length(&self) -> usize {
        self.lengths().1
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        sink.push_str(self.injection.prefix)?;
        self.inner
            .write_to(&mut InjectingSink::new(sink, self.injection), ctx)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        let prefix = self.injection.prefix.as_bytes();
        if index < prefix.len() {
            return Some(prefix[index]);
        }
        if index >= self.total_length() {
            return None;
        }
        let mut locator = UnitLocator::new(index);
        let _ = self.write_to(&mut locator, &FormatContext::INVARIANT);
        locator.found()
    }

    fn render_with(&self, ctx: &FormatContext) -> Result<String> {
        if ctx.is_invariant() {
            return self.render();
        }
        self.render_streaming(ctx, &StreamConfig::default())
    }
}
