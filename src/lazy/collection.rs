//! Capability contract for collections produced by a lazy load.

use std::collections::VecDeque;

// == Collection ==
/// Read operations a resolved lazy collection exposes through its proxy.
pub trait Collection {
    type Item;

    fn count(&self) -> usize;

    fn item_at(&self, index: usize) -> Option<&Self::Item>;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn first(&self) -> Option<&Self::Item> {
        self.item_at(0)
    }

    fn last(&self) -> Option<&Self::Item> {
        self.count().checked_sub(1).and_then(|i| self.item_at(i))
    }

    fn index_of(&self, item: &Self::Item) -> Option<usize>
    where
        Self::Item: PartialEq,
    {
        (0..self.count()).find(|&i| self.item_at(i) == Some(item))
    }
}

impl<T> Collection for Vec<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }

    fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|x| x == item)
    }
}

impl<T> Collection for VecDeque<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn item_at(&self, index: usize) -> Option<&T> {
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collection() {
        let items = vec!["a", "b", "c"];
        assert_eq!(Collection::count(&items), 3);
        assert_eq!(Collection::first(&items), Some(&"a"));
        assert_eq!(Collection::last(&items), Some(&"c"));
        assert_eq!(Collection::index_of(&items, &"b"), Some(1));
        assert_eq!(Collection::index_of(&items, &"z"), None);
    }

    #[test]
    fn test_empty_deque_collection() {
        let items: VecDeque<i32> = VecDeque::new();
        assert!(Collection::is_empty(&items));
        assert_eq!(Collection::last(&items), None);
    }
}
