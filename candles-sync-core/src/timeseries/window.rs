use core::iter::FusedIterator;

/// Evenly spaced boundaries between `start` and `end`, inclusive of both.
///
/// Produced by [`window_boundaries`]. The iterator is lazy and `Clone`, so a
/// clone taken before iteration replays the same sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBoundaries {
    start: i64,
    end: i64,
    steps: u64,
    next: u64,
}

/// Boundaries splitting `[start, end]` into `steps` windows.
///
/// Yields exactly `steps + 1` values; the first is `start` and the last is
/// `end`. Interior boundaries use integer arithmetic in `i128`, so no span
/// overflows. `steps == 0` yields `[start, end]`.
///
/// ```
/// use candles_sync_core::window_boundaries;
///
/// let b: Vec<i64> = window_boundaries(0, 100, 4).collect();
/// assert_eq!(b, vec![0, 25, 50, 75, 100]);
/// assert_eq!(window_boundaries(10, 20, 0).collect::<Vec<_>>(), vec![10, 20]);
/// ```
#[must_use]
pub const fn window_boundaries(start: i64, end: i64, steps: u32) -> WindowBoundaries {
    WindowBoundaries {
        start,
        end,
        steps: steps as u64,
        next: 0,
    }
}

impl WindowBoundaries {
    /// Number of boundaries the sequence produces in total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        if self.steps == 0 { 2 } else { self.steps + 1 }
    }

    fn at(&self, i: u64) -> i64 {
        let last = self.total() - 1;
        if i == 0 {
            return self.start;
        }
        if i >= last {
            return self.end;
        }
        let span = i128::from(self.end) - i128::from(self.start);
        let offset = span * i128::from(i) / i128::from(last);
        // |offset| < |span| and start + offset lies between start and end.
        (i128::from(self.start) + offset) as i64
    }

    /// Adapt the boundaries into `[b[i], b[i + 1])` window pairs.
    #[must_use]
    pub fn pairs(self) -> WindowPairs {
        WindowPairs {
            inner: self,
            prev: None,
        }
    }
}

impl Iterator for WindowBoundaries {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.next >= self.total() {
            return None;
        }
        let value = self.at(self.next);
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.total() - self.next).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl ExactSizeIterator for WindowBoundaries {}
impl FusedIterator for WindowBoundaries {}

/// Adjacent boundary pairs of a [`WindowBoundaries`] sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPairs {
    inner: WindowBoundaries,
    prev: Option<i64>,
}

impl Iterator for WindowPairs {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<(i64, i64)> {
        let lo = match self.prev {
            Some(p) => p,
            None => self.inner.next()?,
        };
        let hi = self.inner.next()?;
        self.prev = Some(hi);
        Some((lo, hi))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (left, _) = self.inner.size_hint();
        let pairs = if self.prev.is_some() {
            left
        } else {
            left.saturating_sub(1)
        };
        (pairs, Some(pairs))
    }
}

impl ExactSizeIterator for WindowPairs {}
impl FusedIterator for WindowPairs {}
