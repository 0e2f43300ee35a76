use super::layout;

/// Bounds-checked view over a pattern or address.
///
/// Positions are signed so that backward scans may step one past the start;
/// every out-of-range read yields `layout::END`.
#[derive(Clone, Copy)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> isize {
        self.bytes.len() as isize
    }

    pub fn at(&self, pos: isize) -> u8 {
        if pos < 0 {
            return layout::END;
        }
        self.bytes.get(pos as usize).copied().unwrap_or(layout::END)
    }

    /// Position of the `/` or end that closes the run containing `pos`.
    pub fn run_end(&self, pos: isize) -> isize {
        let mut pos = pos;
        while !is_run_boundary(self.at(pos)) {
            pos += 1;
        }
        pos
    }

    /// Position just past the first `close` at or after `pos`, or the end
    /// of the string when there is none.
    pub fn skip_past(&self, pos: isize, close: u8) -> isize {
        let mut pos = pos;
        while pos < self.len() {
            if self.at(pos) == close {
                return pos + 1;
            }
            pos += 1;
        }
        self.len()
    }

    /// Nearest position at or before `pos` holding one of `targets`.
    pub fn rfind(&self, pos: isize, targets: &[u8]) -> Option<isize> {
        let mut pos = pos.min(self.len() - 1);
        while pos >= 0 {
            if targets.contains(&self.at(pos)) {
                return Some(pos);
            }
            pos -= 1;
        }
        None
    }
}

pub fn is_run_boundary(byte: u8) -> bool {
    byte == layout::SEPARATOR || byte == layout::END
}

#[cfg(test)]
mod tests {
    use super::ByteView;

    #[test]
    fn reads_outside_are_terminators() {
        let view = ByteView::new(b"ab");
        assert_eq!(view.at(-1), 0);
        assert_eq!(view.at(0), b'a');
        assert_eq!(view.at(2), 0);
    }

    #[test]
    fn run_end_stops_at_separator() {
        let view = ByteView::new(b"/foo/bar");
        assert_eq!(view.run_end(1), 4);
        assert_eq!(view.run_end(5), 8);
    }

    #[test]
    fn skip_past_unterminated_goes_to_end() {
        let view = ByteView::new(b"[abc");
        assert_eq!(view.skip_past(0, b']'), 4);
        assert_eq!(ByteView::new(b"[a]x").skip_past(0, b']'), 3);
    }

    #[test]
    fn rfind_scans_backward() {
        let view = ByteView::new(b"x[ab]");
        assert_eq!(view.rfind(4, b"[{"), Some(1));
        assert_eq!(view.rfind(0, b"[{"), None);
        assert_eq!(view.rfind(99, b"]"), Some(4));
    }
}
