//! Markdown node catalog for chat platforms.

use crate::error::{Error, Result};
use crate::format::FormatContext;
use crate::memo::Memo;
use crate::node::{Envelope, Node, Wrapped};
use crate::sink::Sink;
use crate::stream::{Injection, LinePrefixed};

use super::escape::{calculate_fence_length, calculate_inline_code_ticks};

macro_rules! envelope {
    ($(#[$meta:meta])* $name:ident, $prefix:expr, $suffix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Envelope for $name {
            const PREFIX: &'static str = $prefix;
            const SUFFIX: &'static str = $suffix;
        }
    };
}

envelope!(
    /// `**text**`
    BoldSyntax, "**", "**"
);
envelope!(
    /// `_text_`
    ItalicSyntax, "_", "_"
);
envelope!(
    /// `__text__` (Discord)
    UnderlineSyntax, "__", "__"
);
envelope!(
    /// `~~text~~`
    StrikethroughSyntax, "~~", "~~"
);
envelope!(
    /// `||text||` (Discord)
    SpoilerSyntax, "||", "||"
);
envelope!(
    /// `>>> text`: quotes everything up to the end of the message (Discord).
    BlockQuoteSyntax, ">>> ", ""
);

pub type Bold<N> = Wrapped<BoldSyntax, N>;
pub type Italic<N> = Wrapped<ItalicSyntax, N>;
pub type Underline<N> = Wrapped<UnderlineSyntax, N>;
pub type Strikethrough<N> = Wrapped<StrikethroughSyntax, N>;
pub type Spoiler<N> = Wrapped<SpoilerSyntax, N>;
pub type BlockQuote<N> = Wrapped<BlockQuoteSyntax, N>;

/// Bulleted list: `- ` before every line.
pub type List<N> = LinePrefixed<N>;
/// Quote: `> ` before every line.
pub type Quote<N> = LinePrefixed<N>;

pub const LIST_ITEM: Injection<'static> = Injection::lines("- ");
pub const QUOTE_LINE: Injection<'static> = Injection::lines("> ");

pub fn bold<N: Node>(inner: N) -> Bold<N> {
    Wrapped::new(inner)
}

pub fn italic<N: Node>(inner: N) -> Italic<N> {
    Wrapped::new(inner)
}

pub fn underline<N: Node>(inner: N) -> Underline<N> {
    Wrapped::new(inner)
}

pub fn strikethrough<N: Node>(inner: N) -> Strikethrough<N> {
    Wrapped::new(inner)
}

pub fn spoiler<N: Node>(inner: N) -> Spoiler<N> {
    Wrapped::new(inner)
}

pub fn block_quote<N: Node>(inner: N) -> BlockQuote<N> {
    Wrapped::new(inner)
}

pub fn list<N: Node>(inner: N) -> List<N> {
    LinePrefixed::new(inner, LIST_ITEM)
}

pub fn quote<N: Node>(inner: N) -> Quote<N> {
    LinePrefixed::new(inner, QUOTE_LINE)
}

const HASHES: &str = "######";
const TICKS: &str = "````````````````";

/// Push `n` backticks.
fn push_ticks<S: Sink + ?Sized>(sink: &mut S, mut n: usize) -> Result<()> {
    while n > 0 {
        let chunk = n.min(TICKS.len());
        sink.push_str(&TICKS[..chunk])?;
        n -= chunk;
    }
    Ok(())
}

/// `#`-style heading of level 1 to 6.
#[derive(Debug, Clone)]
pub struct Header<N> {
    level: u8,
    inner: N,
}

impl<N: Node> Header<N> {
    pub const MAX_LEVEL: u8 = 6;

    pub fn new(level: u8, inner: N) -> Result<Self> {
        if !(1..=Self::MAX_LEVEL).contains(&level) {
            return Err(Error::OutOfRange(format!(
                "header level must be between 1 and {}, got {level}",
                Self::MAX_LEVEL
            )));
        }
        Ok(Self { level, inner })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    fn prefix_len(&self) -> usize {
        usize::from(self.level) + 1
    }
}

impl<N: Node> Node for Header<N> {
    fn total_length(&self) -> usize {
        self.prefix_len() + self.inner.total_length()
    }

    fn syntax_length(&self) -> usize {
        self.prefix_len()
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        sink.push_str(&HASHES[..usize::from(self.level)])?;
        sink.push_char(' ')?;
        self.inner.write_to(sink, ctx)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        let level = usize::from(self.level);
        match index {
            i if i < level => Some(b'#'),
            i if i == level => Some(b' '),
            i => self.inner.unit_at(i - level - 1),
        }
    }
}

/// `[text](target)`
#[derive(Debug, Clone)]
pub struct Link<N, U> {
    text: N,
    target: U,
}

impl<N: Node, U: AsRef<str>> Link<N, U> {
    /// Fails when `target` is empty or contains whitespace or `)`.
    pub fn new(text: N, target: U) -> Result<Self> {
        let url = target.as_ref();
        if url.is_empty() {
            return Err(Error::OutOfRange("link target is empty".to_string()));
        }
        if url.contains(|c: char| c.is_whitespace() || c == ')') {
            return Err(Error::OutOfRange(format!(
                "link target {url:?} contains whitespace or ')'"
            )));
        }
        Ok(Self { text, target })
    }

    pub fn target(&self) -> &str {
        self.target.as_ref()
    }
}

impl<N: Node, U: AsRef<str>> Node for Link<N, U> {
    fn total_length(&self) -> usize {
        4 + self.text.total_length() + self.target().len()
    }

    fn syntax_length(&self) -> usize {
        4 + self.target().len()
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        sink.push_char('[')?;
        self.text.write_to(sink, ctx)?;
        sink.push_str("](")?;
        sink.push_str(self.target())?;
        sink.push_char(')')
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        if index == 0 {
            return Some(b'[');
        }
        let index = index - 1;
        let text_len = self.text.total_length();
        if index < text_len {
            return self.text.unit_at(index);
        }
        let index = index - text_len;
        let target = self.target().as_bytes();
        match index {
            0 => Some(b']'),
            1 => Some(b'('),
            i if i - 2 < target.len() => Some(target[i - 2]),
            i if i - 2 == target.len() => Some(b')'),
            _ => None,
        }
    }
}

/// Inline code span with as many backticks as the content requires.
///
/// Content starting or ending with a backtick is padded with one space on
/// each side so the delimiters stay unambiguous.
#[derive(Debug, Clone)]
pub struct InlineCode<N> {
    inner: N,
    ticks: Memo,
    padded: Memo,
}

impl<N: Node> InlineCode<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            ticks: Memo::new(),
            padded: Memo::new(),
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks
            .get_or_init(|| calculate_inline_code_ticks(&self.inner))
    }

    fn pad(&self) -> usize {
        self.padded.get_or_init(|| {
            let len = self.inner.total_length();
            let edge = |i| self.inner.unit_at(i) == Some(b'`');
            usize::from(len > 0 && (edge(0) || edge(len - 1)))
        })
    }
}

impl<N: Node> Node for InlineCode<N> {
    fn total_length(&self) -> usize {
        2 * (self.ticks() + self.pad()) + self.inner.total_length()
    }

    fn syntax_length(&self) -> usize {
        2 * (self.ticks() + self.pad())
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        let ticks = self.ticks();
        let pad = self.pad() == 1;
        push_ticks(sink, ticks)?;
        if pad {
            sink.push_char(' ')?;
        }
        self.inner.write_to(sink, ctx)?;
        if pad {
            sink.push_char(' ')?;
        }
        push_ticks(sink, ticks)
    }

    fn unit_at(&self, index: usize) -> Option<u8> {
        let open = self.ticks() + self.pad();
        let inner_len = self.inner.total_length();
        if index >= 2 * open + inner_len {
            return None;
        }
        if index < self.ticks() {
            return Some(b'`');
        }
        if index < open {
            return Some(b' ');
        }
        if index < open + inner_len {
            return self.inner.unit_at(index - open);
        }
        let tail = index - open - inner_len;
        if tail < self.pad() {
            Some(b' ')
        } else {
            Some(b'`')
        }
    }
}

/// Fenced code block with an optional language tag.
#[derive(Debug, Clone)]
pub struct CodeBlock<N> {
    inner: N,
    language: String,
    fence: Memo,
}

impl<N: Node> CodeBlock<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            language: String::new(),
            fence: Memo::new(),
        }
    }

    /// Tag the block with a language; fails on whitespace or backticks.
    pub fn with_language(mut self, language: impl Into<String>) -> Result<Self> {
        let language = language.into();
        if language.contains(|c: char| c.is_whitespace() || c == '`') {
            return Err(Error::OutOfRange(format!(
                "code block language {language:?} contains whitespace or '`'"
            )));
        }
        self.language = language;
        Ok(self)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn fence_length(&self) -> usize {
        self.fence
            .get_or_init(|| calculate_fence_length(&self.inner, '`'))
    }
}

impl<N: Node> Node for CodeBlock<N> {
    fn total_length(&self) -> usize {
        self.syntax_length() + self.inner.total_length()
    }

    fn syntax_length(&self) -> usize {
        2 * self.fence_length() + self.language.len() + 2
    }

    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S, ctx: &FormatContext) -> Result<()> {
        let fence = self.fence_length();
        push_ticks(sink, fence)?;
        sink.push_str(&self.language)?;
        sink.push_char('\n')?;
        self.inner.write_to(sink, ctx)?;
        sink.push_char('\n')?;
        push_ticks(sink, fence)
    }
}
