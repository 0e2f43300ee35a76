use super::class::match_unit;
use super::layout;
use super::reader::{ByteView, is_run_boundary};

/// Match the wildcard run starting at pattern position `p` (a `*`) against
/// the address run starting at `a`.
///
/// One star anchors the tail and matches it backward. Two stars also try
/// every split of the middle, right to left. More fall back to recursive
/// backtracking, exponential in the worst case.
pub fn match_star(pattern: ByteView<'_>, p: isize, address: ByteView<'_>, a: isize) -> bool {
    if address.at(a) == layout::END {
        return false;
    }
    let address_last = address.run_end(a) - 1;
    let pattern_end = pattern.run_end(p);
    let stars = (p..pattern_end)
        .filter(|&i| pattern.at(i) == layout::WILDCARD)
        .count();
    let pattern_last = pattern_end - 1;

    match stars {
        0 | 1 => match_tail(pattern, pattern_last, address, address_last).is_some(),
        2 => match_two(pattern, p, pattern_last, address, a, address_last),
        _ => match_backtracking(pattern, p, address, a),
    }
}

/// Walk backward from the last units of both runs until the pattern hits a
/// `*`. Returns the star position and the address position left over.
fn match_tail(
    pattern: ByteView<'_>,
    mut pp: isize,
    address: ByteView<'_>,
    mut aa: isize,
) -> Option<(isize, isize)> {
    while pp >= 0 && pattern.at(pp) != layout::WILDCARD {
        if match_unit(pattern, pp, address, aa) == 0 {
            return None;
        }
        pp = rewind_bracket(pattern, pp) - 1;
        aa -= 1;
    }
    if pp < 0 { None } else { Some((pp, aa)) }
}

fn match_two(
    pattern: ByteView<'_>,
    first_star: isize,
    pattern_last: isize,
    address: ByteView<'_>,
    address_start: isize,
    address_last: isize,
) -> bool {
    let Some((second_star, tail_start)) = match_tail(pattern, pattern_last, address, address_last)
    else {
        return false;
    };

    // one past the tail so the second star may match nothing
    let mut split = tail_start + 1;
    while split > address_start {
        let mut pp = second_star - 1;
        let mut aa = split - 1;
        while pp >= 0 && pattern.at(pp) != layout::WILDCARD {
            if match_unit(pattern, pp, address, aa) == 0 {
                break;
            }
            pp = rewind_bracket(pattern, pp) - 1;
            aa -= 1;
        }
        if pp == first_star {
            return true;
        }
        split -= 1;
    }
    false
}

fn match_backtracking(pattern: ByteView<'_>, p: isize, address: ByteView<'_>, a: isize) -> bool {
    if is_run_boundary(address.at(a)) {
        let current = pattern.at(p);
        return is_run_boundary(current)
            || (current == layout::WILDCARD && is_run_boundary(pattern.at(p + 1)));
    }
    if pattern.at(p) == layout::WILDCARD {
        return match_backtracking(pattern, p + 1, address, a)
            || match_backtracking(pattern, p, address, a + 1);
    }
    if match_unit(pattern, p, address, a) == 0 {
        return false;
    }
    let mut next = p;
    if matches!(pattern.at(next), layout::CLASS_OPEN | layout::ALT_OPEN) {
        while !matches!(
            pattern.at(next),
            layout::CLASS_CLOSE | layout::ALT_CLOSE | layout::END
        ) {
            next += 1;
        }
    }
    match_backtracking(pattern, next + 1, address, a + 1)
}

/// From a closing `]`/`}` move back to its opening bracket; other
/// positions are returned unchanged.
fn rewind_bracket(pattern: ByteView<'_>, pp: isize) -> isize {
    match pattern.at(pp) {
        layout::CLASS_CLOSE | layout::ALT_CLOSE => pattern
            .rfind(pp, &[layout::CLASS_OPEN, layout::ALT_OPEN])
            .unwrap_or(-1),
        _ => pp,
    }
}
