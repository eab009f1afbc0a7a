//! Culture-aware scalar formatting.
//!
//! Numbers are rendered in two steps: the value writes its plain text
//! (`-`, ASCII digits, `.`, fraction) into a fixed stack [`Scratch`] buffer,
//! and [`write_scalar`] then streams that text into a sink, substituting
//! the locale's decimal separator and inserting group separators. Neither
//! step touches the heap.

use std::fmt::{self, Write};

use crate::error::{Error, Result};
use crate::sink::Sink;

/// Largest fractional precision a [`FormatSpec`] may request.
pub const MAX_PRECISION: u8 = 64;

// f64::MAX is 309 integer digits; sign, point and MAX_PRECISION decimals fit.
const SCRATCH_LEN: usize = 512;

/// Number formatting conventions of a culture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    /// Decimal separator.
    pub decimal: char,
    /// Digit group separator, if the culture groups digits.
    pub group: Option<char>,
    /// Digits per group.
    pub group_size: u8,
}

impl Locale {
    /// Culture-independent formatting: `1234567.5`.
    pub const INVARIANT: Locale = Locale {
        decimal: '.',
        group: None,
        group_size: 3,
    };

    /// `1,234,567.5`
    pub const EN_US: Locale = Locale {
        decimal: '.',
        group: Some(','),
        group_size: 3,
    };

    /// `1.234.567,5`
    pub const DE_DE: Locale = Locale {
        decimal: ',',
        group: Some('.'),
        group_size: 3,
    };

    /// `1 234 567,5` with a narrow no-break space (U+202F).
    pub const FR_FR: Locale = Locale {
        decimal: ',',
        group: Some('\u{202F}'),
        group_size: 3,
    };

    pub const fn new(decimal: char, group: Option<char>, group_size: u8) -> Self {
        Self {
            decimal,
            group,
            group_size,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::INVARIANT
    }
}

/// How a scalar should be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSpec {
    /// Fixed number of fractional digits (floats only).
    pub precision: Option<u8>,
    /// Insert the locale's group separator into the integer part.
    pub grouping: bool,
}

impl FormatSpec {
    /// Shortest round-trip representation, no grouping.
    pub const GENERAL: FormatSpec = FormatSpec {
        precision: None,
        grouping: false,
    };

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_grouping(mut self, grouping: bool) -> Self {
        self.grouping = grouping;
        self
    }
}

/// Format and culture propagated through a node tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatContext {
    pub spec: FormatSpec,
    pub locale: Locale,
}

impl FormatContext {
    /// The context every node's `total_length` is measured under.
    pub const INVARIANT: FormatContext = FormatContext {
        spec: FormatSpec::GENERAL,
        locale: Locale::INVARIANT,
    };

    pub const fn new(spec: FormatSpec, locale: Locale) -> Self {
        Self { spec, locale }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_spec(mut self, spec: FormatSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn is_invariant(&self) -> bool {
        *self == Self::INVARIANT
    }
}

/// Fixed-size stack buffer receiving a scalar's plain text.
pub struct Scratch {
    buf: [u8; SCRATCH_LEN],
    len: usize,
}

impl Scratch {
    fn new() -> Self {
        Self {
            buf: [0; SCRATCH_LEN],
            len: 0,
        }
    }

    fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.buf[..self.len])
            .map_err(|e| Error::Format(format!("scalar produced invalid UTF-8: {e}")))
    }
}

impl Write for Scratch {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > SCRATCH_LEN {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// A value that can be rendered by [`write_scalar`].
pub trait Scalar {
    /// Write the culture-independent text of the value.
    ///
    /// The output must consist of an optional `-`, ASCII digits, and an
    /// optional `.` followed by ASCII digits. Anything else (`NaN`, `inf`)
    /// is passed through unlocalized.
    fn write_plain(&self, spec: &FormatSpec, out: &mut Scratch) -> fmt::Result;
}

macro_rules! impl_scalar_int {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn write_plain(&self, _spec: &FormatSpec, out: &mut Scratch) -> fmt::Result {
                    write!(out, "{}", self)
                }
            }
        )*
    };
}

macro_rules! impl_scalar_float {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn write_plain(&self, spec: &FormatSpec, out: &mut Scratch) -> fmt::Result {
                    match spec.precision {
                        Some(precision) => write!(out, "{:.*}", usize::from(precision), self),
                        None => write!(out, "{}", self),
                    }
                }
            }
        )*
    };
}

impl_scalar_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_scalar_float!(f32, f64);

impl<T: Scalar + ?Sized> Scalar for &T {
    fn write_plain(&self, spec: &FormatSpec, out: &mut Scratch) -> fmt::Result {
        (**self).write_plain(spec, out)
    }
}

/// Render `value` under `ctx` into `sink`.
///
/// Fails with [`Error::Format`] when the spec is not renderable (precision
/// above [`MAX_PRECISION`]) or the plain text overflows the scratch buffer.
pub fn write_scalar<T, S>(value: &T, ctx: &FormatContext, sink: &mut S) -> Result<()>
where
    T: Scalar + ?Sized,
    S: Sink + ?Sized,
{
    if let Some(precision) = ctx.spec.precision
        && precision > MAX_PRECISION
    {
        return Err(Error::Format(format!(
            "precision {precision} exceeds maximum of {MAX_PRECISION}"
        )));
    }

    let mut scratch = Scratch::new();
    value
        .write_plain(&ctx.spec, &mut scratch)
        .map_err(|_| Error::Format("scalar text exceeds scratch buffer".to_string()))?;
    localize(scratch.as_str()?, ctx, sink)
}

/// Length in bytes of `value` rendered under `ctx`.
pub fn scalar_length<T: Scalar + ?Sized>(value: &T, ctx: &FormatContext) -> Result<usize> {
    let mut counter = crate::sink::LengthCounter::new();
    write_scalar(value, ctx, &mut counter)?;
    Ok(counter.len())
}

fn localize<S: Sink + ?Sized>(plain: &str, ctx: &FormatContext, sink: &mut S) -> Result<()> {
    let (negative, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, plain),
    };
    if !unsigned.starts_with(|c: char| c.is_ascii_digit()) {
        return sink.push_str(plain);
    }

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    if negative {
        sink.push_char('-')?;
    }

    let size = usize::from(ctx.locale.group_size);
    match ctx.locale.group {
        Some(group) if ctx.spec.grouping && size > 0 && integer.len() > size => {
            let mut head = integer.len() % size;
            if head == 0 {
                head = size;
            }
            sink.push_str(&integer[..head])?;
            let mut rest = &integer[head..];
            while !rest.is_empty() {
                sink.push_char(group)?;
                sink.push_str(&rest[..size])?;
                rest = &rest[size..];
            }
        }
        _ => sink.push_str(integer)?,
    }

    if let Some(fraction) = fraction {
        sink.push_char(ctx.locale.decimal)?;
        sink.push_str(fraction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Scalar>(value: T, ctx: FormatContext) -> Result<String> {
        let mut out = String::new();
        struct StringSink<'a>(&'a mut String);
        impl Sink for StringSink<'_> {
            fn push_str(&mut self, s: &str) -> Result<()> {
                self.0.push_str(s);
                Ok(())
            }
            fn written(&self) -> usize {
                self.0.len()
            }
        }
        write_scalar(&value, &ctx, &mut StringSink(&mut out))?;
        Ok(out)
    }

    #[test]
    fn test_invariant_integer() {
        assert_eq!(render(1234567, FormatContext::INVARIANT).unwrap(), "1234567");
        assert_eq!(render(-42i64, FormatContext::INVARIANT).unwrap(), "-42");
    }

    #[test]
    fn test_grouping_by_locale() {
        let spec = FormatSpec::GENERAL.with_grouping(true);
        let en = FormatContext::new(spec, Locale::EN_US);
        let de = FormatContext::new(spec, Locale::DE_DE);
        assert_eq!(render(1234567, en).unwrap(), "1,234,567");
        assert_eq!(render(-1234567.5f64, de).unwrap(), "-1.234.567,5");
        assert_eq!(render(123, en).unwrap(), "123");
        assert_eq!(render(123456, en).unwrap(), "123,456");
    }

    #[test]
    fn test_grouping_requires_spec_flag() {
        let ctx = FormatContext::INVARIANT.with_locale(Locale::EN_US);
        assert_eq!(render(1234567, ctx).unwrap(), "1234567");
    }

    #[test]
    fn test_precision_and_decimal_separator() {
        let ctx = FormatContext::new(FormatSpec::GENERAL.with_precision(2), Locale::DE_DE);
        assert_eq!(render(3.14159f64, ctx).unwrap(), "3,14");
    }

    #[test]
    fn test_multibyte_group_separator_length() {
        let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::FR_FR);
        let text = render(1234567, ctx).unwrap();
        assert_eq!(text, "1\u{202F}234\u{202F}567");
        assert_eq!(scalar_length(&1234567, &ctx).unwrap(), text.len());
    }

    #[test]
    fn test_non_finite_passes_through() {
        let ctx = FormatContext::new(FormatSpec::GENERAL.with_grouping(true), Locale::DE_DE);
        assert_eq!(render(f64::NAN, ctx).unwrap(), "NaN");
        assert_eq!(render(f64::NEG_INFINITY, ctx).unwrap(), "-inf");
    }

    #[test]
    fn test_excess_precision_is_format_error() {
        let ctx = FormatContext::INVARIANT.with_spec(FormatSpec::GENERAL.with_precision(65));
        assert!(matches!(render(1.0f64, ctx), Err(Error::Format(_))));
    }

    #[test]
    fn test_largest_float_fits_scratch() {
        let ctx = FormatContext::INVARIANT.with_spec(FormatSpec::GENERAL.with_precision(MAX_PRECISION));
        let text = render(f64::MAX, ctx).unwrap();
        assert_eq!(text.len(), 309 + 1 + 64);
    }
}
