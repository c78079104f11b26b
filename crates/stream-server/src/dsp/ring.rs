/// Fixed-capacity buffers for the real-time path
///
/// Both types allocate once at construction; pushing never reallocates.
use std::collections::VecDeque;

/// Index-based FIFO ring buffer that evicts its oldest entry when full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head: usize, // index of the oldest entry
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create an empty ring buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Append a value, returning the evicted oldest value if the buffer was full
    #[inline]
    pub fn push(&mut self, value: T) -> Option<T> {
        let cap = self.slots.len();
        if self.len == cap {
            let evicted = self.slots[self.head];
            self.slots[self.head] = value;
            self.head = (self.head + 1) % cap;
            Some(evicted)
        } else {
            let tail = (self.head + self.len) % cap;
            self.slots[tail] = value;
            self.len += 1;
            None
        }
    }

    /// Oldest value, if any
    pub fn front(&self) -> Option<T> {
        (self.len > 0).then(|| self.slots[self.head])
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let cap = self.slots.len();
        (0..self.len).map(move |i| self.slots[(self.head + i) % cap])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Fill to capacity with `value`
    pub fn fill(&mut self, value: T) {
        self.slots.fill(value);
        self.head = 0;
        self.len = self.slots.len();
    }
}

/// Sliding-window maximum over the last `capacity` pushed values
///
/// Keeps the raw window in a [`RingBuffer`] and a monotonically decreasing
/// queue of candidates, so `max()` is O(1) and `push()` is O(1) amortized.
#[derive(Debug, Clone)]
pub struct SlidingMax {
    window: RingBuffer<f32>,
    candidates: VecDeque<(u64, f32)>,
    next_index: u64,
}

impl SlidingMax {
    pub fn new(capacity: usize) -> Self {
        let window = RingBuffer::new(capacity);
        let candidates = VecDeque::with_capacity(window.capacity());
        Self {
            window,
            candidates,
            next_index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    #[inline]
    pub fn push(&mut self, value: f32) {
        let index = self.next_index;
        self.next_index += 1;
        self.window.push(value);

        // Expire first so the queue never holds more than `capacity` entries
        let window = self.window.capacity() as u64;
        while matches!(self.candidates.front(), Some(&(i, _)) if i + window <= index) {
            self.candidates.pop_front();
        }

        while matches!(self.candidates.back(), Some(&(_, v)) if v <= value) {
            self.candidates.pop_back();
        }
        self.candidates.push_back((index, value));
    }

    /// Largest value in the window, 0.0 when empty
    #[inline]
    pub fn max(&self) -> f32 {
        self.candidates.front().map_or(0.0, |&(_, v)| v)
    }

    /// Raw window contents, oldest first
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.window.iter()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.candidates.clear();
        self.next_index = 0;
    }

    /// Reset to a full window of `value`
    pub fn fill(&mut self, value: f32) {
        self.clear();
        for _ in 0..self.window.capacity() {
            self.push(value);
        }
    }
}
