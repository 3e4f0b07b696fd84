//! A fixed-capacity ring buffer.
//!
//! The ring is the unit of storage for every series. Once full, each push
//! evicts the oldest element so that memory use is bounded by the capacity
//! given at construction, no matter how quickly points arrive.

use std::collections::vec_deque;
use std::collections::VecDeque;
use std::error;
use std::fmt;

/// Errors from ring construction
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A ring must be able to hold at least one element.
    ZeroCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ZeroCapacity => write!(f, "ring capacity must be greater than zero"),
        }
    }
}

impl error::Error for Error {}

/// Append-only FIFO with oldest eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    inner: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a ring holding at most `capacity` elements
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestats::ring::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(2).unwrap();
    /// ring.push(1);
    /// ring.push(2);
    /// assert_eq!(Some(1), ring.push(3));
    /// assert_eq!(vec![2, 3], ring.to_vec());
    ///
    /// assert!(RingBuffer::<u8>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<RingBuffer<T>, Error> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(RingBuffer {
            inner: VecDeque::with_capacity(capacity),
            capacity: capacity,
        })
    }

    /// Append `value`, returning the evicted element if the ring was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.inner.len() == self.capacity {
            self.inner.pop_front()
        } else {
            None
        };
        self.inner.push_back(value);
        evicted
    }

    /// Most elements the ring holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if nothing has been pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The most recently pushed element
    pub fn latest(&self) -> Option<&T> {
        self.inner.back()
    }

    /// The oldest retained element
    pub fn oldest(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<T> {
        self.inner.iter()
    }

    /// Drop every element, keeping the capacity.
    pub fn clear(&mut self) {
        self.inner.clear()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the contents out, oldest to newest.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(Err(Error::ZeroCapacity), RingBuffer::<f64>::new(0));
    }

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut ring = RingBuffer::new(4).unwrap();
        assert!(ring.is_empty());
        assert_eq!(None, ring.push(1));
        assert_eq!(None, ring.push(2));
        assert_eq!(2, ring.len());
        assert_eq!(Some(&1), ring.oldest());
        assert_eq!(Some(&2), ring.latest());
    }

    #[test]
    fn push_past_capacity_evicts_oldest() {
        let mut ring = RingBuffer::new(3).unwrap();
        for i in 0..3 {
            ring.push(i);
        }
        assert_eq!(Some(0), ring.push(3));
        assert_eq!(Some(1), ring.push(4));
        assert_eq!(vec![2, 3, 4], ring.to_vec());
        assert_eq!(3, ring.capacity());
    }

    #[test]
    fn capacity_one_holds_latest() {
        let mut ring = RingBuffer::new(1).unwrap();
        ring.push("a");
        ring.push("b");
        assert_eq!(vec!["b"], ring.to_vec());
    }

    #[test]
    fn clear_empties() {
        let mut ring = RingBuffer::new(2).unwrap();
        ring.push(1);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(None, ring.latest());
    }

    #[test]
    fn retains_most_recent_in_order() {
        fn inner(capacity: u8, values: Vec<u32>) -> TestResult {
            if capacity == 0 {
                return TestResult::discard();
            }
            let capacity = capacity as usize;
            let mut ring = RingBuffer::new(capacity).unwrap();
            for v in &values {
                ring.push(*v);
            }

            let expected_len = ::std::cmp::min(values.len(), capacity);
            assert_eq!(expected_len, ring.len());
            let tail = &values[values.len() - expected_len..];
            assert_eq!(tail.to_vec(), ring.to_vec());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(u8, Vec<u32>) -> TestResult);
    }
}
