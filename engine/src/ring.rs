use std::collections::{VecDeque, vec_deque};

/// Fixed-capacity queue that drops its oldest entry when full.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RingBuffer<T> {
  capacity: usize,
  vec: VecDeque<T>,
}

impl<T> RingBuffer<T> {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      vec: VecDeque::with_capacity(capacity),
    }
  }

  pub fn push(&mut self, value: T) {
    if self.capacity == 0 {
      return;
    }

    if self.vec.len() == self.capacity {
      self.vec.pop_front();
    }

    self.vec.push_back(value);
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.vec.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vec.is_empty()
  }

  pub fn last(&self) -> Option<&T> {
    self.vec.back()
  }

  pub fn iter(&self) -> vec_deque::Iter<'_, T> {
    self.vec.iter()
  }
}
