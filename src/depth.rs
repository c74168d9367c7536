/// Depth tracks minimum, maximum and average leaf-node depth observed
/// while validating a [`Shelf`](crate::Shelf) tree. Tests use it to
/// bound the height of the balanced index.
#[derive(Clone, Debug, Default)]
pub struct Depth {
    samples: usize,
    min: usize,
    max: usize,
    total: usize,
}

impl Depth {
    pub(crate) fn sample(&mut self, depth: usize) {
        self.samples += 1;
        self.total += depth;
        if self.min == 0 || depth < self.min {
            self.min = depth
        }
        if depth > self.max {
            self.max = depth
        }
    }

    /// Number of nil-terminated paths sampled.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Shortest root-to-nil path seen.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Longest root-to-nil path seen.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Average root-to-nil path length.
    pub fn mean(&self) -> usize {
        if self.samples == 0 {
            0
        } else {
            self.total / self.samples
        }
    }
}
