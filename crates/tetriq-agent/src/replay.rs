use std::collections::VecDeque;

/// Index of one action in the value table: state index plus the action's
/// position in that state's stored set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRef {
    pub state: usize,
    pub action: usize,
}

/// One step of experience: the action taken, the best action at the
/// following state (`None` on the terminal step), and the shaped reward.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub action: ActionRef,
    pub next: Option<ActionRef>,
    pub reward: f64,
}

/// Fixed-capacity FIFO of recent transitions. Pushing past capacity evicts
/// the oldest entry.
#[derive(Debug)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push_back(transition);
        if self.transitions.len() > self.capacity {
            self.transitions.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(state: usize) -> Transition {
        Transition {
            action: ActionRef { state, action: 0 },
            next: None,
            reward: 0.0,
        }
    }

    #[test]
    fn push_never_exceeds_capacity() {
        let mut buffer = ReplayBuffer::new(5);
        for i in 0..100 {
            buffer.push(transition(i));
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..5 {
            buffer.push(transition(i));
        }
        let states: Vec<usize> = buffer.iter().map(|t| t.action.state).collect();
        assert_eq!(states, vec![2, 3, 4]);
    }
}
