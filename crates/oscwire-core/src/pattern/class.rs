use super::layout;
use super::reader::ByteView;

/// Match one pattern unit at `p` against the address at `a`.
///
/// Returns the number of address bytes the unit covers, `0` on mismatch.
/// When `p` sits on a closing `]` or `}` the unit is resolved from its
/// opening bracket, which lets backward scans match classes from the end.
pub fn match_unit(pattern: ByteView<'_>, p: isize, address: ByteView<'_>, a: isize) -> usize {
    match pattern.at(p) {
        layout::CLASS_OPEN => match_class(pattern, p, address, a),
        layout::CLASS_CLOSE => match pattern.rfind(p, &[layout::CLASS_OPEN]) {
            Some(open) => match_class(pattern, open, address, a),
            None => 0,
        },
        layout::ALT_OPEN => match_alternatives(pattern, p, address, a),
        layout::ALT_CLOSE => match pattern.rfind(p, &[layout::ALT_OPEN]) {
            Some(open) => match_alternatives(pattern, open, address, a),
            None => 0,
        },
        layout::ANY_CHAR => 1,
        literal => usize::from(literal == address.at(a)),
    }
}

/// `[...]` class starting at `open`, with optional `!` and `x-y` ranges.
pub fn match_class(pattern: ByteView<'_>, open: isize, address: ByteView<'_>, a: isize) -> usize {
    let mut p = open + 1;
    let mut positive = true;
    if pattern.at(p) == layout::CLASS_NEGATE {
        positive = false;
        p += 1;
    }
    let target = address.at(a);
    loop {
        let current = pattern.at(p);
        if current == layout::CLASS_CLOSE || current == layout::END {
            break;
        }
        if pattern.at(p + 1) == layout::CLASS_RANGE {
            if target >= current && target <= pattern.at(p + 2) {
                return usize::from(positive);
            }
            p += 3;
        } else {
            if current == target {
                return usize::from(positive);
            }
            p += 1;
        }
    }
    usize::from(!positive)
}

/// `{a,b,c}` alternation starting at `open`. Returns the length of the
/// first alternative found at `a`. Reaching an empty alternative ends the
/// search with a mismatch.
pub fn match_alternatives(
    pattern: ByteView<'_>,
    open: isize,
    address: ByteView<'_>,
    a: isize,
) -> usize {
    let mut start = open + 1;
    loop {
        let mut end = start;
        while !is_alternative_end(pattern.at(end)) && pattern.at(end) != layout::ALT_SEPARATOR {
            end += 1;
        }
        let len = (end - start) as usize;
        if len == 0 {
            return 0;
        }
        if matches_alternative(pattern, start, len, address, a) {
            return len;
        }
        if is_alternative_end(pattern.at(end)) {
            return 0;
        }
        start = end + 1;
    }
}

fn is_alternative_end(byte: u8) -> bool {
    byte == layout::ALT_CLOSE || byte == layout::END || byte == layout::SEPARATOR
}

fn matches_alternative(
    pattern: ByteView<'_>,
    start: isize,
    len: usize,
    address: ByteView<'_>,
    a: isize,
) -> bool {
    (0..len as isize).all(|i| pattern.at(start + i) == address.at(a + i))
}
