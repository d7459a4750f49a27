use std::iter::FusedIterator;

/// Lazy enumeration of every ordering of a sequence (Heap's algorithm).
///
/// The first item is the input order itself; each following ordering differs
/// from the previous one by a single swap. Yields `n!` owned vectors, including
/// repeated value sequences when the input contains duplicates.
#[derive(Debug, Clone)]
pub struct Permutations<T> {
    items: Vec<T>,
    counters: Vec<usize>,
    index: usize,
    started: bool,
}

impl<T: Clone> Permutations<T> {
    pub fn new(items: Vec<T>) -> Self {
        let n = items.len();
        Self {
            items,
            counters: vec![0; n],
            index: 1,
            started: false,
        }
    }
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if !self.started {
            self.started = true;
            return Some(self.items.clone());
        }

        while self.index < self.items.len() {
            let i = self.index;
            if self.counters[i] < i {
                let k = if i % 2 == 0 { 0 } else { self.counters[i] };
                self.items.swap(i, k);
                self.counters[i] += 1;
                self.index = 1;
                return Some(self.items.clone());
            }
            self.counters[i] = 0;
            self.index += 1;
        }
        None
    }
}

impl<T: Clone> FusedIterator for Permutations<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_yields_all_orderings_once() {
        let all: Vec<Vec<u8>> = Permutations::new(vec![1, 2, 3, 4]).collect();
        assert_eq!(all.len(), 24);
        let unique: HashSet<Vec<u8>> = all.iter().cloned().collect();
        assert_eq!(unique.len(), 24);
        assert_eq!(all[0], vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_duplicates_repeat_value_sequences() {
        let all: Vec<Vec<u8>> = Permutations::new(vec![1, 2, 2]).collect();
        assert_eq!(all.len(), 6);
        let unique: HashSet<Vec<u8>> = all.into_iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_trivial_inputs() {
        assert_eq!(Permutations::<u8>::new(vec![]).count(), 1);
        assert_eq!(Permutations::new(vec![7u8]).count(), 1);
    }

    #[test]
    fn test_fused_after_exhaustion() {
        let mut perms = Permutations::new(vec![1u8, 2]);
        assert!(perms.next().is_some());
        assert!(perms.next().is_some());
        assert!(perms.next().is_none());
        assert!(perms.next().is_none());
    }

    #[test]
    fn test_yielded_orderings_do_not_alias() {
        let mut perms = Permutations::new(vec![1u8, 2, 3]);
        let mut first = perms.next().unwrap();
        first[0] = 99;
        let second = perms.next().unwrap();
        assert!(!second.contains(&99));
    }
}
