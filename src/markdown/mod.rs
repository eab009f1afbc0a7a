//! Markdown dialect nodes for chat platforms.
//!
//! Discord, Slack-compatible Markdown and most bot frameworks share the same
//! core syntax. This module provides the nodes for it:
//!
//! - `escape`: streamed escaping of Markdown metacharacters and fence sizing
//! - `nodes`: the catalog, built on [`crate::node::Wrapped`] envelopes,
//!   variable-literal composites and [`crate::stream::LinePrefixed`]
//!
//! ## Design Notes
//!
//! - **Fixed envelopes** (`**`, `_`, `~~`, `||`) are zero-sized markers, so
//!   `Bold<Italic<&str>>` costs nothing beyond the inner value
//! - **Dynamic code fence length**: code spans and blocks use the minimum
//!   tick count that doesn't conflict with their content, computed once
//! - **Per-line prefixes**: lists and quotes re-inject their prefix after
//!   every newline, however deeply it is nested in the content
//!
//! Other dialects (Telegram HTML, Slack mrkdwn) plug in the same way: an
//! [`crate::node::Envelope`] marker per construct and an
//! [`crate::stream::Injection`] per line prefix.

mod escape;
mod nodes;

pub use escape::{
    Escaped, calculate_fence_length, calculate_inline_code_ticks, escape_count, escape_into,
    escape_markdown, longest_run,
};
pub use nodes::{
    BlockQuote, BlockQuoteSyntax, Bold, BoldSyntax, CodeBlock, Header, InlineCode, Italic,
    ItalicSyntax, LIST_ITEM, Link, List, QUOTE_LINE, Quote, Spoiler, SpoilerSyntax,
    Strikethrough, StrikethroughSyntax, Underline, UnderlineSyntax, block_quote, bold, italic,
    list, quote, spoiler, strikethrough, underline,
};
