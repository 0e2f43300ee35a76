//! OSC address pattern matching.
//!
//! The matcher walks a pattern and an address side by side, one unit at a
//! time:
//! - `layout`: the special characters of the pattern syntax
//! - `reader`: bounds-checked byte access (out of range reads as `END`)
//! - `class`: single units (`?`, literals, `[...]` classes, `{a,b}` lists)
//! - `star`: `*` runs, including the backtracking fallbacks
//!
//! Matching is pure and allocation free. The result reports how far each
//! side got and whether each side was consumed entirely; a prefix match is
//! usable for hierarchical routing when the address remainder starts at a
//! `/`.

mod class;
mod layout;
mod reader;
mod star;

use serde::Serialize;

use reader::ByteView;

/// Outcome of matching a pattern against an address.
///
/// # Examples
/// ```
/// use oscwire_core::match_pattern;
///
/// let full = match_pattern("/foo/*", "/foo/bar");
/// assert!(full.is_full());
///
/// let prefix = match_pattern("/foo/*", "/foo/bar/baz");
/// assert!(!prefix.is_full());
/// assert_eq!(prefix.route_offset("/foo/bar/baz"), Some(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MatchResult {
    /// Pattern bytes consumed.
    pub pattern_offset: usize,
    /// Address bytes consumed.
    pub address_offset: usize,
    /// The whole pattern was consumed.
    pub pattern_complete: bool,
    /// The whole address was consumed.
    pub address_complete: bool,
}

impl MatchResult {
    fn failed() -> Self {
        Self::default()
    }

    /// Both sides were consumed: an exact match.
    pub fn is_full(&self) -> bool {
        self.pattern_complete && self.address_complete
    }

    /// Address length matched by a full or prefix match.
    ///
    /// A prefix match counts only when the pattern was fully consumed and
    /// the unmatched address remainder starts at a `/`.
    pub fn route_offset(&self, address: &str) -> Option<usize> {
        if self.is_full() {
            return Some(self.address_offset);
        }
        let at_boundary = address.as_bytes().get(self.address_offset) == Some(&layout::SEPARATOR);
        if self.pattern_complete && self.address_offset > 0 && at_boundary {
            Some(self.address_offset)
        } else {
            None
        }
    }
}

/// Match an OSC address pattern against an address.
///
/// Wildcards are also honoured on the address side: a `*` in the address
/// skips the current run on both sides.
///
/// # Examples
/// ```
/// use oscwire_core::match_pattern;
///
/// assert!(match_pattern("/foo/[a-c]", "/foo/b").is_full());
/// assert!(!match_pattern("/foo/[!a-c]", "/foo/b").is_full());
/// assert!(match_pattern("/foo/{bar,baz}", "/foo/baz").is_full());
/// ```
pub fn match_pattern(pattern: &str, address: &str) -> MatchResult {
    if pattern == address {
        return MatchResult {
            pattern_offset: pattern.len(),
            address_offset: address.len(),
            pattern_complete: true,
            address_complete: true,
        };
    }

    let pat = ByteView::new(pattern.as_bytes());
    let addr = ByteView::new(address.as_bytes());
    let mut p: isize = 0;
    let mut a: isize = 0;

    while addr.at(a) != layout::END && pat.at(p) != layout::END {
        if pat.at(p) == layout::WILDCARD {
            if !star::match_star(pat, p, addr, a) {
                return MatchResult::failed();
            }
            p = pat.run_end(p);
            a = addr.run_end(a);
        } else if addr.at(a) == layout::WILDCARD {
            p = pat.run_end(p);
            a = addr.run_end(a);
        } else {
            let width = class::match_unit(pat, p, addr, a);
            if width == 0 {
                return MatchResult::failed();
            }
            match pat.at(p) {
                layout::CLASS_OPEN => {
                    p = pat.skip_past(p, layout::CLASS_CLOSE);
                    a += 1;
                }
                layout::ALT_OPEN => {
                    p = pat.skip_past(p, layout::ALT_CLOSE);
                    a += width as isize;
                }
                _ => {
                    p += 1;
                    a += 1;
                }
            }
        }
    }

    MatchResult {
        pattern_offset: p as usize,
        address_offset: a as usize,
        pattern_complete: pat.at(p) == layout::END,
        address_complete: addr.at(a) == layout::END,
    }
}
