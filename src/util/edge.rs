/// A transition of a boolean signal, as reported by [`EdgeDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Detects transitions of a boolean signal between consecutive updates.
///
/// The signal is considered to have been `false` before the first update.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Feed the current value, and get the transition from the previous value (if any).
    pub fn update(&mut self, value: bool) -> Option<Edge> {
        let previous = std::mem::replace(&mut self.previous, value);
        match (previous, value) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        }
    }

    pub fn current(&self) -> bool {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let mut detector = EdgeDetector::default();
        assert_eq!(detector.update(false), None);
        assert_eq!(detector.update(true), Some(Edge::Rising));
        assert_eq!(detector.update(true), None);
        assert!(detector.current());
        assert_eq!(detector.update(false), Some(Edge::Falling));
        assert_eq!(detector.update(false), None);
        assert_eq!(detector.update(true), Some(Edge::Rising));
    }
}
