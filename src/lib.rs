//! # chatmark
//!
//! Compose chat markup (bold, italic, code, quotes, lists, links) from small
//! immutable nodes and render the result into one exactly sized buffer.
//!
//! ## Features
//!
//! - Every [`Node`] knows its exact rendered length before it is written
//! - Composites are generic over their inner node: nesting costs no boxing
//!   and no dynamic dispatch
//! - Lists and quotes re-inject their line prefix after every newline in
//!   their content, at any nesting depth
//! - Two-phase builders measure first and allocate exactly once
//! - Culture-aware numbers without heap formatting
//!
//! ## Quick Start
//!
//! ```
//! use chatmark::Node;
//! use chatmark::markdown::{Header, bold, list};
//!
//! let title = Header::new(3, "Title").unwrap();
//! assert_eq!(title.render().unwrap(), "### Title");
//!
//! let items = list("a\nb\nc");
//! assert_eq!(items.total_length(), 11);
//! assert_eq!(items.render().unwrap(), "- a\n- b\n- c");
//!
//! let node = (bold("Note:"), " see below");
//! assert_eq!(node.render().unwrap(), "**Note:** see below");
//! ```
//!
//! ## Building Messages
//!
//! [`build`] runs a closure twice, once to measure and once to write, so
//! the output is allocated exactly once:
//!
//! ```
//! use chatmark::{FormatContext, FormatSpec, Locale, build_with};
//! use chatmark::markdown::bold;
//!
//! let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::EN_US);
//! let text = build_with(ctx, |w| {
//!     w.push_node(&bold("Users"))?;
//!     w.push_str(": ")?;
//!     w.push_scalar(&1234567)
//! })
//! .unwrap();
//! assert_eq!(text, "**Users**: 1,234,567");
//! ```

pub mod buffer;
pub mod builder;
pub mod error;
pub mod format;
pub mod markdown;
pub mod memo;
pub mod node;
pub mod sink;
pub mod stream;

pub use buffer::{GrowableBuffer, next_size};
pub use builder::{FixedBuilder, Writer, build, build_with};
pub use error::{Error, Result};
pub use format::{FormatContext, FormatSpec, Locale, MAX_PRECISION, Scalar, Scratch};
pub use node::{Envelope, Node, Number, Wrapped};
pub use sink::{LengthCounter, Sink, SliceSink};
pub use stream::{InjectingSink, Injection, LinePrefixed, StreamConfig, StreamWriter, render_streaming};
