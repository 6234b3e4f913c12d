use std::fmt;

/// A region of the source code
///
/// Positions are byte offsets into the source string. Line and column
/// information is derived from the offsets at report-rendering time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A span covering a single byte
    pub fn single(position: usize) -> Self {
        Self::new(position, position + 1)
    }

    /// An empty span, e.g. for the end of input
    pub fn marker(position: usize) -> Self {
        Self::new(position, position)
    }

    /// The smallest span enclosing both `self` and `other`
    pub fn to(self, other: Span) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end - span.start).into()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
