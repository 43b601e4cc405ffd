/// Marks a slot that has never been written. Below absolute zero, so no
/// real reading can collide with it.
pub const SENTINEL: f64 = -274.0;

/// One hour of readings at the device's 1 Hz reporting rate.
pub const LOG_CAPACITY: usize = 3600;

#[derive(Debug, Clone)]
pub struct TemperatureLog {
    slots: Box<[f64]>,
    next: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSnapshot {
    pub slots: Box<[f64]>,
    pub next: usize,
}

impl Default for TemperatureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureLog {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![SENTINEL; capacity].into_boxed_slice(),
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn append(&mut self, value: f64) {
        self.slots[self.next] = value;
        self.next = (self.next + 1) % self.slots.len();
    }

    pub fn latest(&self) -> Option<f64> {
        let index = self.next.checked_sub(1).unwrap_or(self.slots.len() - 1);
        let value = self.slots[index];
        (value != SENTINEL).then_some(value)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|value| **value != SENTINEL).count()
    }

    pub fn is_empty(&self) -> bool {
        self.latest().is_none()
    }

    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            slots: self.slots.clone(),
            next: self.next,
        }
    }
}

impl LogSnapshot {
    /// Written values, oldest first.
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.slots.split_at(self.next);
        older
            .iter()
            .chain(newer.iter())
            .copied()
            .filter(|value| *value != SENTINEL)
    }
}
