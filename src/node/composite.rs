//! Fixed-envelope composites.
//!
//! An [`Envelope`] is a zero-sized marker carrying the literal prefix and
//! suffix of one markup construct. [`Wrapped`] pairs an envelope with an
//! inner node of any type; nesting wraps by value, so the whole tree is a
//! single stack value.

use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::format::FormatContext;
use crate::sink::Sink;

use super::Node;

/// Literal markup placed around a wrapped node.
pub trait Envelope {
    const PREFIX: &'static str;
    const SUFFIX: &'static str;
}

/// `E::PREFIX`, the inner node, then `E::SUFFIX`.
pub struct Wrapped<E, N> {
    inner: N,
    envelope: PhantomData<fn() -> E>,
}

impl<E: Envelope, N: Node> Wrapped<E, N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            envelope: PhantomData,
        }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    pub fn into_inner(self) -> N {
        self.inner
    }
}

impl<E: Envelope, N: Node> Node for Wrapped<E, N> {
    fn total_length(&self) -> usize {
        E::PREFIX.len() + self.inner.total_length() + E::SUFFIX.len()
    }

    /// The envelope literals only; the inner node counts as content.
    fn syntax_length(&self) -> usize {
        E::PREFIX.len() + E::SUFFIX.len()
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        sink.push_str(E::PREFIX)?;
        self.inner.write_to(sink, ctx)?;
        sink.push_str(E::SUFFIX)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        let prefix = E::PREFIX.as_bytes();
        if index < prefix.len() {
            return Some(prefix[index]);
        }
        let index = index - prefix.len();
        let inner_len = self.inner.total_length();
        if index < inner_len {
            return self.inner.unit_at(index);
        }
        E::SUFFIX.as_bytes().get(index - inner_len).copied()
    }
}

impl<E, N: Clone> Clone for Wrapped<E, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            envelope: PhantomData,
        }
    }
}

impl<E: Envelope, N: fmt::Debug> fmt::Debug for Wrapped<E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("prefix", &E::PREFIX)
            .field("inner", &self.inner)
            .field("suffix", &E::SUFFIX)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stars;
    impl Envelope for Stars {
        const PREFIX: &'static str = "**";
        const SUFFIX: &'static str = "**";
    }

    struct Ticks;
    impl Envelope for Ticks {
        const PREFIX: &'static str = "`";
        const SUFFIX: &'static str = "`";
    }

    #[test]
    fn test_wrap_bold() {
        let node = Wrapped::<Stars, _>::new("bold");
        assert_eq!(node.total_length(), 8);
        assert_eq!(node.syntax_length(), 4);
        assert_eq!(node.render().unwrap(), "**bold**");
    }

    #[test]
    fn test_nested_envelopes_add_up() {
        let node = Wrapped::<Stars, _>::new(Wrapped::<Ticks, _>::new("x"));
        assert_eq!(node.render().unwrap(), "**`x`**");
        assert_eq!(node.total_length(), 7);
        assert_eq!(node.syntax_length(), 4);
        assert_eq!(node.inner().syntax_length(), 2);
        let units: Vec<u8> = (0..7).map(|i| node.unit_at(i).unwrap()).collect();
        assert_eq!(units, b"**`x`**");
        assert_eq!(node.unit_at(7), None);
    }

    #[test]
    fn test_empty_inner() {
        let node = Wrapped::<Ticks, _>::new("");
        assert_eq!(node.render().unwrap(), "``");
        assert_eq!(node.unit_at(1), Some(b'`'));
    }
}
