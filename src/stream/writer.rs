//! Growable streaming writer.
//!
//! Used when only a size hint is known up front: the writer starts with a
//! hint-sized [`GrowableBuffer`] and replaces it with a larger one whenever
//! the next byte does not fit. With an [`Injection`] it also rewrites the
//! stream, emitting the prefix at the start and after every separator.
//!
//! Per write the writer runs a small state machine:
//!
//! ```text
//! Scanning ──separator──▶ Emitting ──prefix done──▶ Scanning
//!    │                       │
//!    └──full──▶ Growing ◀──full┘      (Growing resumes the prior state)
//!
//! finish() consumes the writer and hands back the text
//! ```

use memchr::memchr;
use tracing::debug;

use crate::buffer::{DEFAULT_GROWTH_FACTOR, GrowableBuffer, validate_growth_factor};
use crate::error::Result;
use crate::format::FormatContext;
use crate::node::Node;
use crate::sink::Sink;

use super::Injection;

/// Configuration for streaming renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    /// Initial buffer size. `None` uses the node's invariant `total_length`.
    pub initial_hint: Option<usize>,
    /// Multiplier applied on each growth; must be finite and above 1.
    pub growth_factor: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            initial_hint: None,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl StreamConfig {
    pub fn with_hint(mut self, hint: usize) -> Self {
        self.initial_hint = Some(hint);
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_growth_factor(self.growth_factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Scanning,
    Emitting { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Copying source bytes through, looking for the next separator.
    Scanning,
    /// Mid-way through writing the injected prefix.
    Emitting { offset: usize },
    /// Out of room; the buffer is replaced before resuming.
    Growing { resume: Resume },
}

/// A [`Sink`] writing into a growable buffer, optionally injecting a prefix.
#[derive(Debug)]
pub struct StreamWriter<'p> {
    buffer: GrowableBuffer,
    injection: Option<Injection<'p>>,
    state: State,
}

impl<'p> StreamWriter<'p> {
    /// Create a writer with a `hint`-sized buffer.
    ///
    /// With an injection, the leading prefix is written immediately so that
    /// even empty content renders as one prefixed line.
    pub fn new(hint: usize, growth_factor: f64, injection: Option<Injection<'p>>) -> Result<Self> {
        let state = match injection {
            Some(_) => State::Emitting { offset: 0 },
            None => State::Scanning,
        };
        let mut writer = Self {
            buffer: GrowableBuffer::with_hint(hint, growth_factor)?,
            injection,
            state,
        };
        writer.run(&[])?;
        Ok(writer)
    }

    /// Number of buffer replacements so far.
    pub fn growths(&self) -> usize {
        self.buffer.growths()
    }

    /// Stop writing and return the rendered text.
    ///
    /// This is the terminal state: the writer is consumed, so no write can
    /// follow it.
    pub fn finish(self) -> Result<String> {
        let growths = self.buffer.growths();
        let bytes = self.buffer.into_bytes();
        if growths > 0 {
            debug!(len = bytes.len(), growths, "streaming render outgrew its hint");
        }
        Ok(String::from_utf8(bytes)?)
    }

    fn prefix(&self) -> &'p [u8] {
        self.injection
            .map(|injection| injection.prefix().as_bytes())
            .unwrap_or_default()
    }

    fn run(&mut self, chunk: &[u8]) -> Result<()> {
        let mut rest = chunk;
        loop {
            match self.state {
                State::Scanning => {
                    if rest.is_empty() {
                        return Ok(());
                    }
                    let hit = self
                        .injection
                        .and_then(|injection| memchr(injection.separator(), rest));
                    let segment = match hit {
                        Some(at) => &rest[..=at],
                        None => rest,
                    };
                    let taken = self.buffer.write_some(segment);
                    rest = &rest[taken..];
                    if taken < segment.len() {
                        self.state = State::Growing {
                            resume: Resume::Scanning,
                        };
                    } else if hit.is_some() {
                        self.state = State::Emitting { offset: 0 };
                    }
                }
                State::Emitting { offset } => {
                    let prefix = self.prefix();
                    let offset = offset + self.buffer.write_some(&prefix[offset..]);
                    self.state = if offset == prefix.len() {
                        State::Scanning
                    } else {
                        State::Growing {
                            resume: Resume::Emitting { offset },
                        }
                    };
                }
                State::Growing { resume } => {
                    self.buffer.grow()?;
                    self.state = match resume {
                        Resume::Scanning => State::Scanning,
                        Resume::Emitting { offset } => State::Emitting { offset },
                    };
                }
            }
        }
    }
}

impl Sink for StreamWriter<'_> {
    fn push_str(&mut self, s: &str) -> Result<()> {
        self.run(s.as_bytes())
    }

    fn written(&self) -> usize {
        self.buffer.len()
    }
}

/// Render `node` under `ctx` without knowing its exact length up front.
///
/// The buffer starts at `config.initial_hint` (or the node's invariant
/// length) and grows by `config.growth_factor` as needed.
pub fn render_streaming<N: Node + ?Sized>(
    node: &N,
    ctx: &FormatContext,
    config: &StreamConfig,
) -> Result<String> {
    config.validate()?;
    let hint = config
        .initial_hint
        .unwrap_or_else(|| node.total_length());
    let mut writer = StreamWriter::new(hint, config.growth_factor, None)?;
    node.write_to(&mut writer, ctx)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn stream(chunks: &[&str], hint: usize, injection: Option<Injection<'_>>) -> (String, usize) {
        let mut writer = StreamWriter::new(hint, 2.0, injection).unwrap();
        for chunk in chunks {
            writer.push_str(chunk).unwrap();
        }
        let growths = writer.growths();
        (writer.finish().unwrap(), growths)
    }

    #[test]
    fn test_passthrough_grows_from_tiny_hint() {
        let (text, growths) = stream(&["hello ", "world"], 1, None);
        assert_eq!(text, "hello world");
        assert_eq!(growths, 4);
    }

    #[test]
    fn test_injection_with_exact_hint_never_grows() {
        let (text, growths) = stream(&["a\nb\nc"], 11, Some(Injection::lines("- ")));
        assert_eq!(text, "- a\n- b\n- c");
        assert_eq!(growths, 0);
    }

    #[test]
    fn test_growth_in_the_middle_of_a_prefix() {
        // Hint 5 fills up right after "- a\n" + "-".
        let (text, growths) = stream(&["a\nb"], 5, Some(Injection::lines("- ")));
        assert_eq!(text, "- a\n- b");
        assert!(growths >= 1);
    }

    #[test]
    fn test_separator_split_across_chunks() {
        let (text, _) = stream(&["a", "\n", "", "b\n"], 1, Some(Injection::lines("> ")));
        assert_eq!(text, "> a\n> b\n> ");
    }

    #[test]
    fn test_finish_after_prefix_emitted_through_growth() {
        // Hint 4 is exactly "- a\n"; the trailing prefix needs a new buffer.
        let (text, growths) = stream(&["a\n"], 4, Some(Injection::lines("- ")));
        assert_eq!(text, "- a\n- ");
        assert_eq!(growths, 1);
    }

    #[test]
    fn test_empty_content_gets_leading_prefix() {
        let (text, _) = stream(&[], 0, Some(Injection::lines(">>> ")));
        assert_eq!(text, ">>> ");
    }

    #[test]
    fn test_multibyte_prefix_split_by_growth() {
        let (text, _) = stream(&["x\ny"], 2, Some(Injection::lines("• ")));
        assert_eq!(text, "• x\n• y");
    }

    #[test]
    fn test_render_streaming_rejects_bad_factor() {
        let config = StreamConfig::default().with_growth_factor(1.0);
        assert!(matches!(
            render_streaming("x", &FormatContext::INVARIANT, &config),
            Err(Error::OutOfRange(_))
        ));
    }
}
