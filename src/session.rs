//! Cursor over the filtered building list.

/// Where the reviewer currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The filtered list is empty; nothing can be shown, navigated, or
    /// validated until the filters change.
    Idle,
    /// Showing the record at this position of the filtered list.
    AtRecord(usize),
}

/// Position plus the length of the list it points into. Moving past either
/// end is a silent no-op and never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewSession {
    cursor: usize,
    len: usize,
}

impl ReviewSession {
    pub fn new(len: usize) -> Self {
        Self { cursor: 0, len }
    }

    pub fn state(&self) -> SessionState {
        if self.len == 0 {
            SessionState::Idle
        } else {
            SessionState::AtRecord(self.cursor)
        }
    }

    /// Current position, `None` while idle.
    pub fn position(&self) -> Option<usize> {
        match self.state() {
            SessionState::Idle => None,
            SessionState::AtRecord(cursor) => Some(cursor),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        if self.len > 0 && self.cursor < self.len - 1 {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the cursor moved.
    pub fn prev(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Adopt a freshly filtered list. A cursor that still fits is kept,
    /// otherwise it goes back to the first record.
    pub fn refilter(&mut self, len: usize) {
        self.len = len;
        if self.cursor >= len {
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_idle() {
        let mut session = ReviewSession::new(0);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.next());
        assert!(!session.prev());
        assert_eq!(session.position(), None);
    }

    #[test]
    fn stops_at_both_ends_without_wrapping() {
        let mut session = ReviewSession::new(5);
        while session.next() {}
        assert_eq!(session.position(), Some(4));

        assert!(!session.next());
        assert_eq!(session.position(), Some(4));

        for _ in 0..4 {
            assert!(session.prev());
        }
        assert_eq!(session.position(), Some(0));
        assert!(!session.prev());
        assert_eq!(session.position(), Some(0));
    }

    #[test]
    fn cursor_never_leaves_bounds() {
        for len in 1..6 {
            let mut session = ReviewSession::new(len);
            for _ in 0..10 {
                session.next();
                assert!(session.position().unwrap() < len);
            }
            for _ in 0..10 {
                session.prev();
                assert_eq!(session.state(), SessionState::AtRecord(session.position().unwrap()));
            }
            assert_eq!(session.position(), Some(0));
        }
    }

    #[test]
    fn refilter_keeps_fitting_cursor_and_clamps_the_rest() {
        let mut session = ReviewSession::new(5);
        session.next();
        session.next();

        session.refilter(4);
        assert_eq!(session.position(), Some(2));

        session.refilter(2);
        assert_eq!(session.position(), Some(0));

        session.refilter(0);
        assert_eq!(session.state(), SessionState::Idle);

        session.refilter(3);
        assert_eq!(session.state(), SessionState::AtRecord(0));
    }

    #[test]
    fn reset_returns_to_first_record() {
        let mut session = ReviewSession::new(3);
        session.next();
        session.next();
        session.reset();
        assert_eq!(session.position(), Some(0));
    }
}
