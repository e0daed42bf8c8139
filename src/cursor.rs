/// A read position into an immutable byte buffer.
///
/// Every grammar in this crate walks its input through a `Cursor`, so the
/// offset reported by an error is always `cursor.pos()` at the moment the
/// mismatch was seen.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    mark: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            mark: 0,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Look `n` bytes past the current position without moving.
    #[inline]
    pub(crate) fn peek_at(&self, n: usize) -> Option<u8> {
        self.buf.get(self.pos + n).copied()
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        if self.pos < self.buf.len() {
            self.pos += 1;
        }
    }

    /// Consume the next byte if it equals `expected`.
    #[inline]
    pub(crate) fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    pub(crate) fn mark(&mut self) {
        self.mark = self.pos;
    }

    #[inline]
    pub(crate) fn marked(&self) -> usize {
        self.mark
    }

    /// Bytes between the last mark and the current position.
    #[inline]
    pub(crate) fn since_mark(&self) -> &'a [u8] {
        &self.buf[self.mark..self.pos]
    }

    /// Move back to an earlier position, e.g. when an optional header is
    /// skipped.
    #[inline]
    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }

    /// Everything from the current position to the end of input. The cursor
    /// ends up at EOF.
    #[inline]
    pub(crate) fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    /// Consume bytes while `f` holds, at most `max` of them.
    pub(crate) fn take_while<F>(&mut self, max: usize, f: F) -> &'a [u8]
    where
        F: Fn(u8) -> bool,
    {
        let start = self.pos;
        while self.pos - start < max {
            match self.peek() {
                Some(ch) if f(ch) => self.pos += 1,
                _ => break,
            }
        }

        &self.buf[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn mark_and_slice() {
        let mut cursor = Cursor::new(b"host app");
        cursor.mark();
        let host = cursor.take_while(usize::MAX, |c| c != b' ');
        assert_eq!(host, b"host");
        assert_eq!(cursor.since_mark(), b"host");
        assert_eq!(cursor.marked(), 0);
        assert!(cursor.eat(b' '));
        assert_eq!(cursor.take_rest(), b"app");
        assert!(cursor.is_eof());
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn lookahead_does_not_move() {
        let mut cursor = Cursor::new(b"<13>");
        assert_eq!(cursor.peek_at(3), Some(b'>'));
        assert_eq!(cursor.peek_at(4), None);
        assert_eq!(cursor.pos(), 0);
        assert!(!cursor.eat(b'1'));
        cursor.bump();
        assert_eq!(cursor.peek(), Some(b'1'));
    }

    #[test]
    fn take_while_respects_max() {
        let mut cursor = Cursor::new(b"aaaaa");
        assert_eq!(cursor.take_while(3, |c| c == b'a'), b"aaa");
        assert_eq!(cursor.pos(), 3);
        cursor.rewind(100);
        assert!(cursor.is_eof());
        cursor.bump();
        assert_eq!(cursor.pos(), 5);
    }
}
