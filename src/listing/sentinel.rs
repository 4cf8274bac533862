/// The visible window of a list: first visible row, number of rows that fit,
/// and how many rows the list holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
    pub total: usize,
}

impl Viewport {
    pub fn new(offset: usize, height: usize, total: usize) -> Self {
        Self { offset, height, total }
    }
}

/// Watches the trailing marker that sits right after the last row and reports
/// when it comes within `threshold` rows of the visible window.
///
/// Reports are edge-like: a check yields `Some` only when the intersection
/// flips, or when the marker is visible and the list length changed (the
/// marker moved, so the observer fires again), or after [`Self::rearm`]. Short lists that never fill
/// the window therefore keep requesting pages until they do.
#[derive(Debug, Clone)]
pub struct VisibilitySentinel {
    threshold: usize,
    observing: bool,
    last_intersecting: Option<bool>,
    last_total: usize,
}

impl VisibilitySentinel {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            observing: false,
            last_intersecting: None,
            last_total: 0,
        }
    }

    pub fn observe(&mut self) {
        self.observing = true;
        self.last_intersecting = None;
        self.last_total = 0;
    }

    pub fn disconnect(&mut self) {
        self.observing = false;
        self.last_intersecting = None;
    }

    /// Forget the last report so the next check fires if the marker is still
    /// in reach. Call after every applied page: a page made only of duplicates
    /// leaves the list length unchanged and would otherwise never re-trigger.
    pub fn rearm(&mut self) {
        self.last_intersecting = None;
    }

    /// Whether the marker at index `total` is within reach of the window.
    pub fn intersects(&self, viewport: Viewport) -> bool {
        let window_end = viewport.offset.saturating_add(viewport.height);
        window_end.saturating_add(self.threshold) >= viewport.total
    }

    pub fn check(&mut self, viewport: Viewport) -> Option<bool> {
        if !self.observing {
            return None;
        }
        let now = self.intersects(viewport);
        let changed = self.last_intersecting != Some(now);
        let moved = now && viewport.total != self.last_total;
        self.last_intersecting = Some(now);
        self.last_total = viewport.total;
        if changed || moved {
            Some(now)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_sentinel_is_silent() {
        let mut sentinel = VisibilitySentinel::new(2);
        assert_eq!(sentinel.check(Viewport::new(0, 10, 0)), None);
        sentinel.observe();
        assert_eq!(sentinel.check(Viewport::new(0, 10, 0)), Some(true));
        sentinel.disconnect();
        assert_eq!(sentinel.check(Viewport::new(0, 10, 5)), None);
    }

    #[test]
    fn test_reports_only_on_change() {
        let mut sentinel = VisibilitySentinel::new(0);
        sentinel.observe();
        // 30 rows, window shows 0..10: marker far away
        assert_eq!(sentinel.check(Viewport::new(0, 10, 30)), Some(false));
        assert_eq!(sentinel.check(Viewport::new(5, 10, 30)), None);
        // scrolled to the bottom
        assert_eq!(sentinel.check(Viewport::new(20, 10, 30)), Some(true));
        assert_eq!(sentinel.check(Viewport::new(20, 10, 30)), None);
        // new page appended, marker pushed away
        assert_eq!(sentinel.check(Viewport::new(20, 10, 40)), Some(false));
    }

    #[test]
    fn test_short_list_fires_again_after_growth() {
        let mut sentinel = VisibilitySentinel::new(0);
        sentinel.observe();
        assert_eq!(sentinel.check(Viewport::new(0, 20, 5)), Some(true));
        assert_eq!(sentinel.check(Viewport::new(0, 20, 5)), None);
        assert_eq!(sentinel.check(Viewport::new(0, 20, 10)), Some(true));
    }

    #[test]
    fn test_rearm_fires_again_without_growth() {
        let mut sentinel = VisibilitySentinel::new(0);
        sentinel.observe();
        assert_eq!(sentinel.check(Viewport::new(0, 20, 2)), Some(true));
        // page of duplicates: nothing moved
        assert_eq!(sentinel.check(Viewport::new(0, 20, 2)), None);
        sentinel.rearm();
        assert_eq!(sentinel.check(Viewport::new(0, 20, 2)), Some(true));
        // out of reach after rearm reports false, not a load
        sentinel.rearm();
        assert_eq!(sentinel.check(Viewport::new(0, 10, 40)), Some(false));
    }

    #[test]
    fn test_rearm_is_silent_when_disconnected() {
        let mut sentinel = VisibilitySentinel::new(0);
        sentinel.rearm();
        assert_eq!(sentinel.check(Viewport::new(0, 20, 2)), None);
    }

    #[test]
    fn test_threshold_reaches_ahead() {
        let sentinel = VisibilitySentinel::new(3);
        assert!(!sentinel.intersects(Viewport::new(0, 10, 14)));
        assert!(sentinel.intersects(Viewport::new(0, 10, 13)));
    }
}
