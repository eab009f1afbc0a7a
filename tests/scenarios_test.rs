//! End-to-end rendering scenarios.

use chatmark::markdown::{CodeBlock, Escaped, Header, InlineCode, Link, bold, italic, list, quote, spoiler};
use chatmark::{
    Error, FixedBuilder, FormatContext, FormatSpec, Locale, Node, Number, StreamConfig, build,
    build_with, render_streaming,
};

// ============================================================================
// Composite Algebra
// ============================================================================

#[test]
fn test_bold_wraps_with_two_char_envelope() {
    let node = bold("bold");
    assert_eq!(node.total_length(), 8);
    assert_eq!(node.syntax_length(), 4);
    assert_eq!(node.render().unwrap(), "**bold**");
}

#[test]
fn test_three_level_header() {
    let node = Header::new(3, "Title").unwrap();
    assert_eq!(node.total_length(), 9);
    assert_eq!(node.render().unwrap(), "### Title");
}

#[test]
fn test_header_level_checked_at_construction() {
    let err = Header::new(9, "Title").unwrap_err();
    assert!(matches!(err, Error::OutOfRange(_)));
}

#[test]
fn test_list_injects_prefix_per_line() {
    let node = list("a\nb\nc");
    assert_eq!(node.total_length(), 11);
    assert_eq!(node.syntax_length(), 6);
    assert_eq!(node.render().unwrap(), "- a\n- b\n- c");
}

#[test]
fn test_quote_of_nested_list() {
    let node = quote((italic("Todo"), "\n", list("write\ntest")));
    assert_eq!(node.render().unwrap(), "> _Todo_\n> - write\n> - test");
    assert_eq!(node.total_length(), node.render().unwrap().len());
}

#[test]
fn test_lengths_are_stable_across_reads() {
    let node = quote(list(bold("x\ny\nz")));
    let first = (node.total_length(), node.syntax_length());
    for _ in 0..3 {
        assert_eq!((node.total_length(), node.syntax_length()), first);
    }
}

// ============================================================================
// Capacity and Index Boundaries
// ============================================================================

#[test]
fn test_copy_to_boundary() {
    let node = Link::new(spoiler("secret"), "https://example.com/x").unwrap();
    let len = node.total_length();

    let mut exact = vec![0u8; len];
    assert_eq!(node.copy_to(&mut exact).unwrap(), len);
    assert_eq!(exact, node.render().unwrap().into_bytes());

    let mut short = vec![b'.'; len - 1];
    assert_eq!(
        node.copy_to(&mut short).unwrap_err(),
        Error::Capacity {
            required: len,
            available: len - 1
        }
    );
    assert!(short.iter().all(|&b| b == b'.'));
}

#[test]
fn test_unit_at_boundaries() {
    let node = InlineCode::new("code");
    assert_eq!(node.unit_at(0), Some(b'`'));
    assert_eq!(node.unit_at(node.total_length() - 1), Some(b'`'));
    assert_eq!(node.unit_at(node.total_length()), None);
    assert_eq!(node.unit_at(usize::MAX), None);
}

#[test]
fn test_try_format_undersized_never_overruns() {
    let node = (bold("n="), Number::new(9876543));
    let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::EN_US);
    let mut buf = [b'#'; 12];
    let (head, tail) = buf.split_at_mut(8);
    assert!(matches!(
        node.try_format(head, &ctx),
        Err(Error::Capacity { .. })
    ));
    assert!(tail.iter().all(|&b| b == b'#'));

    let mut buf = [0u8; 15];
    assert_eq!(node.try_format(&mut buf, &ctx).unwrap(), 15);
    assert_eq!(&buf, b"**n=**9,876,543");
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_join_with_separator() {
    let text = build(|w| w.join(", ", ["Apple", "Banana"])).unwrap();
    assert_eq!(text, "Apple, Banana");
    assert_eq!(text.len(), 13);
}

#[test]
fn test_fixed_builder_declared_too_small() {
    let mut builder = FixedBuilder::with_capacity(6).unwrap();
    builder.push_node(&bold("hi")).unwrap();
    assert!(matches!(
        builder.push_str("!"),
        Err(Error::Capacity { .. })
    ));
}

#[test]
fn test_fixed_builder_from_summed_lengths() {
    let title = Header::new(1, "Release").unwrap();
    let notes = list("faster\nsmaller");
    let mut builder =
        FixedBuilder::with_capacity(title.total_length() + 1 + notes.total_length()).unwrap();
    builder.push_node(&title).unwrap();
    builder.push_char('\n').unwrap();
    builder.push_node(&notes).unwrap();
    assert_eq!(builder.finish().unwrap(), "# Release\n- faster\n- smaller");
}

#[test]
fn test_self_measuring_builder_with_culture() {
    let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::FR_FR);
    let text = build_with(ctx, |w| {
        w.push_node(&bold("Total"))?;
        w.push_str(" : ")?;
        w.push_scalar_with(&1234.5f64, FormatSpec::GENERAL.with_grouping(true).with_precision(2))?;
        w.push_char('€')
    })
    .unwrap();
    assert_eq!(text, "**Total** : 1\u{202F}234,50€");
}

#[test]
fn test_join_nodes_under_culture() {
    let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::DE_DE);
    let values = [Number::new(1000), Number::new(25), Number::new(1000000)];
    let text = build_with(ctx, |w| w.join(" | ", values.iter())).unwrap();
    assert_eq!(text, "1.000 | 25 | 1.000.000");
}

// ============================================================================
// Streaming
// ============================================================================

#[test]
fn test_streaming_from_tiny_hint_matches_bounded() {
    let node = quote(list(("alpha\n", CodeBlock::new("x = 1").with_language("py").unwrap())));
    let config = StreamConfig::default().with_hint(1).with_growth_factor(1.5);
    let streamed = node.render_streaming(&FormatContext::INVARIANT, &config).unwrap();
    assert_eq!(streamed, node.render().unwrap());

    let generic = render_streaming(&node, &FormatContext::INVARIANT, &config).unwrap();
    assert_eq!(generic, streamed);
}

#[test]
fn test_streaming_grows_past_invariant_hint() {
    let node = list(("a ", Number::new(1234567890u64), "\nb"));
    let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::FR_FR);
    let text = node.render_with(&ctx).unwrap();
    assert_eq!(text, "- a 1\u{202F}234\u{202F}567\u{202F}890\n- b");
    assert!(text.len() > node.total_length());
}

#[test]
fn test_escaped_user_text_inside_markup() {
    let node = bold(Escaped::new("2*3 = [six]"));
    assert_eq!(node.render().unwrap(), "**2\\*3 = \\[six\\]**");
    assert_eq!(node.syntax_length(), 4);
    assert_eq!(node.inner().syntax_length(), 3);
}
