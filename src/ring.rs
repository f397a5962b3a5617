//! Fixed-capacity history buffers.

/// Circular buffer read most-recent-first.
///
/// `get(0)` is the newest sample, `get(len - 1)` the oldest still kept.
/// Pushing into a full buffer overwrites the oldest slot in place.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![T::default(); capacity],
            head: capacity - 1,
            len: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        let cap = self.data.len();
        self.head = (self.head + 1) % cap;
        self.data[self.head] = value;
        self.len = (self.len + 1).min(cap);
    }

    /// Sample `age` pushes ago, `None` if not recorded yet.
    pub fn get(&self, age: usize) -> Option<T> {
        if age >= self.len {
            return None;
        }
        let cap = self.data.len();
        Some(self.data[(self.head + cap - age) % cap])
    }

    pub fn latest(&self) -> Option<T> {
        self.get(0)
    }

    pub fn oldest(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|age| self.get(age))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(move |age| self.get(age))
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}
