/// Host-driven frame metadata.
///
/// The layer owns no clock: a frame exists only because the host map asked for
/// one, so the index counts host render callbacks rather than elapsed time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// 0-based index of the host render callback.
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn frames_are_plain_values() {
        assert_eq!(Frame::new(10), Frame::new(10));
        assert_eq!(Frame::default(), Frame::new(0));
    }

    #[test]
    fn next_advances_index() {
        let f0 = Frame::new(0);
        assert_eq!(f0.next().index, 1);
        assert_eq!(f0.next().next(), Frame::new(2));
    }
}
