use serde::Serialize;

/// A click counter that can go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

impl Counter {
    pub fn value(&self) -> i64 {
        self.count
    }

    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn decrement(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn apply(&mut self, action: CounterAction) -> i64 {
        match action {
            CounterAction::Increment => self.increment(),
            CounterAction::Decrement => self.decrement(),
            CounterAction::Reset => self.reset(),
        }
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_both_ways_and_resets() {
        let mut counter = Counter::default();
        counter.increment();
        counter.increment();
        counter.decrement();
        assert_eq!(counter.value(), 1);
        assert_eq!(counter.apply(CounterAction::Decrement), 0);
        assert_eq!(counter.apply(CounterAction::Decrement), -1);
        assert_eq!(counter.apply(CounterAction::Reset), 0);
    }
}
