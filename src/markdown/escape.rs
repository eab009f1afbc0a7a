//! Markdown escaping and fence sizing.
//!
//! Escaping is streamed: [`escape_into`] pushes unescaped runs of the input
//! straight into a sink and only adds the backslashes, so the [`Escaped`]
//! leaf can measure and render without building an intermediate string.

use tracing::debug;

use crate::error::Result;
use crate::format::FormatContext;
use crate::memo::Memo;
use crate::node::Node;
use crate::sink::Sink;

/// Call `on_escape` with the byte offset of every character needing a backslash.
///
/// Escapes characters that have special meaning in Markdown:
/// - Backslash: `\\`
/// - Emphasis: `*`, `_`
/// - Links: `[`, `]`
/// - Code: `` ` ``
/// - Headings: `#` (only at line start)
/// - Tables and spoilers: `|`
/// - HTML and quotes: `<`, `>`
/// - Strikethrough: `~`
/// - Images: `!` (when followed by `[`)
fn for_each_escape(text: &str, mut on_escape: impl FnMut(usize)) {
    let bytes = text.as_bytes();
    let mut at_line_start = true;

    for (i, &b) in bytes.iter().enumerate() {
        let escape = match b {
            b'\\' | b'*' | b'_' | b'[' | b']' | b'`' | b'|' | b'<' | b'>' | b'~' => true,
            b'#' => at_line_start,
            b'!' => bytes.get(i + 1) == Some(&b'['),
            _ => false,
        };
        if escape {
            on_escape(i);
        }
        at_line_start = b == b'\n';
    }
}

/// Number of backslashes [`escape_markdown`] adds to `text`.
pub fn escape_count(text: &str) -> usize {
    let mut count = 0;
    for_each_escape(text, |_| count += 1);
    count
}

/// Push `text` into `sink` with Markdown metacharacters escaped.
pub fn escape_into<S: Sink + ?Sized>(text: &str, sink: &mut S) -> Result<()> {
    let mut start = 0;
    let mut result = Ok(());
    for_each_escape(text, |at| {
        if result.is_err() {
            return;
        }
        result = sink
            .push_str(&text[start..at])
            .and_then(|()| sink.push_str("\\"));
        start = at;
    });
    result?;
    sink.push_str(&text[start..])
}

/// Escape special Markdown characters in text.
///
/// # Examples
///
/// ```
/// use chatmark::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("[link]"), "\\[link\\]");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + escape_count(text));
    let mut start = 0;
    for_each_escape(text, |at| {
        out.push_str(&text[start..at]);
        out.push('\\');
        start = at;
    });
    out.push_str(&text[start..]);
    out
}

/// A text leaf rendered with Markdown metacharacters escaped.
#[derive(Debug, Clone)]
pub struct Escaped<'a> {
    text: &'a str,
    escapes: Memo,
}

impl<'a> Escaped<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            escapes: Memo::new(),
        }
    }

    fn escapes(&self) -> usize {
        self.escapes.get_or_init(|| escape_count(self.text))
    }
}

impl Node for Escaped<'_> {
    fn total_length(&self) -> usize {
        self.text.len() + self.escapes()
    }

    fn syntax_length(&self) -> usize {
        self.escapes()
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, _ctx: &FormatContext) -> Result<()> {
        escape_into(self.text, sink)
    }
}

/// Tracks the longest run of one byte across a rendered stream.
#[derive(Debug, Clone, Copy)]
struct RunCounter {
    unit: u8,
    current: usize,
    longest: usize,
    len: usize,
}

impl Sink for RunCounter {
    fn push_str(&mut self, s: &str) -> Result<()> {
        for &b in s.as_bytes() {
            if b == self.unit {
                self.current += 1;
                self.longest = self.longest.max(self.current);
            } else {
                self.current = 0;
            }
        }
        self.len += s.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.len
    }
}

/// Longest run of `unit` in the invariant rendering of `node`.
///
/// A node that fails to write counts only the runs pushed before the
/// failure.
pub fn longest_run<N: Node + ?Sized>(node: &N, unit: u8) -> usize {
    let mut counter = RunCounter {
        unit,
        current: 0,
        longest: 0,
        len: 0,
    };
    if let Err(err) = node.write_to(&mut counter, &FormatContext::INVARIANT) {
        debug!(error = %err, written = counter.len, "node failed while counting runs");
    }
    counter.longest
}

/// Calculate the minimum fence length needed for a code block.
///
/// Returns the smallest number of fence characters (at least 3) that
/// doesn't appear as a run in the content.
///
/// # Examples
///
/// ```
/// use chatmark::markdown::calculate_fence_length;
///
/// // Normal content needs 3 backticks
/// assert_eq!(calculate_fence_length("let x = 1;", '`'), 3);
///
/// // Content with 3 backticks needs 4
/// assert_eq!(calculate_fence_length("```rust\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length<N: Node + ?Sized>(content: &N, fence_char: char) -> usize {
    let mut utf8 = [0u8; 4];
    let unit = fence_char.encode_utf8(&mut utf8).as_bytes()[0];
    longest_run(content, unit).max(2) + 1
}

/// Calculate the minimum backtick count needed for inline code.
///
/// Returns the smallest number of backticks (at least 1) that doesn't
/// appear as a run in the content.
///
/// # Examples
///
/// ```
/// use chatmark::markdown::calculate_inline_code_ticks;
///
/// // Normal content needs 1 backtick
/// assert_eq!(calculate_inline_code_ticks("code"), 1);
///
/// // Content with backticks needs more
/// assert_eq!(calculate_inline_code_ticks("code with ` backtick"), 2);
/// ```
pub fn calculate_inline_code_ticks<N: Node + ?Sized>(content: &N) -> usize {
    longest_run(content, b'`') + 1
}
