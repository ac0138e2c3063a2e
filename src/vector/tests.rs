use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

use proptest::prelude::*;

use itertools::assert_equal;

use allocated::{AllocErrorWithLayout, CountingAllocator};
use core::alloc::Layout;
use typenum::{U4, U8};

use super::sorted::{FixedSortedMultiMap, FixedSortedVector, SortedMultiMap, SortedVector};
use super::*;
use crate::stack::StackBuffer;

/// Counts drops so tests can check every element is destroyed exactly once.
#[derive(Clone)]
struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_empty() {
    let v = Vector::<u32>::new();

    assert_eq!(v.len(), 0);
    assert_eq!(v.capacity(), 0);
    assert!(v.is_empty());
    assert_eq!(v.find(&1), None);
    assert_equal(v.iter(), Vec::<&u32>::new());
}

#[test]
fn test_push_growth() {
    let mut v = Vector::new();
    v.push(0u32);
    assert_eq!(v.capacity(), Vector::<u32>::INITIAL_CAPACITY);

    for i in 1..17 {
        v.push(i);
    }

    assert_eq!(v.len(), 17);
    assert_eq!(v.capacity(), 32);
    assert_equal(v.iter().copied(), 0..17);
}

#[test]
fn test_accessors() {
    let mut v: Vector<u32> = (10..15).collect();

    assert_eq!(*v.front(), 10);
    assert_eq!(*v.back(), 14);
    assert_eq!(*v.at(2), 12);

    *v.at_mut(2) = 99;
    *v.front_mut() += 1;
    *v.back_mut() -= 1;
    assert_eq!(v.as_slice(), &[11, 11, 99, 13, 13]);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_at_out_of_bounds() {
    let v: Vector<u32> = (0..3).collect();
    v.at(3);
}

#[test]
#[should_panic]
fn test_front_of_empty() {
    let v = Vector::<u32>::new();
    v.front();
}

#[test]
fn test_pop_back() {
    let mut v: Vector<u32> = (0..3).collect();

    assert_eq!(v.pop_back(), Some(2));
    assert_eq!(v.pop_back(), Some(1));
    assert_eq!(v.pop_back(), Some(0));
    assert_eq!(v.pop_back(), None);
    assert_eq!(v.capacity(), 16);
}

#[test]
fn test_insert() {
    let mut v: Vector<u32> = (0..5).collect();

    assert_eq!(v.insert(0, 100), 0);
    assert_eq!(v.insert(3, 200), 3);
    assert_eq!(v.insert(v.len(), 300), 7);

    assert_eq!(v.as_slice(), &[100, 0, 1, 200, 2, 3, 4, 300]);
}

#[test]
fn test_insert_grows_full_buffer() {
    let mut v: Vector<u32> = (0..16).collect();
    assert_eq!(v.capacity(), 16);

    v.insert(8, 100);

    assert_eq!(v.capacity(), 32);
    assert_eq!(v[8], 100);
    assert_eq!(v[9], 8);
    assert_eq!(v.len(), 17);
}

#[test]
#[should_panic(expected = "insert index 4 out of bounds (len 3)")]
fn test_insert_out_of_bounds() {
    let mut v: Vector<u32> = (0..3).collect();
    v.insert(4, 0);
}

#[test]
fn test_insert_n_middle() {
    let mut v: Vector<u32> = (0..5).collect();

    assert_eq!(v.insert_n(2, 3, 9), 2);

    assert_eq!(v.as_slice(), &[0, 1, 9, 9, 9, 2, 3, 4]);
}

#[test]
fn test_insert_n_past_old_end() {
    // More new elements than the tail being shifted.
    let mut v: Vector<u32> = (0..4).collect();

    v.insert_n(3, 10, 7);

    assert_eq!(v.len(), 14);
    assert_eq!(&v[..3], &[0, 1, 2]);
    assert!(v[3..13].iter().all(|&x| x == 7));
    assert_eq!(v[13], 3);
}

#[test]
fn test_insert_n_grows_to_fit() {
    let mut v: Vector<u32> = (0..16).collect();

    v.insert_n(0, 40, 1);

    assert_eq!(v.len(), 56);
    assert_eq!(v.capacity(), 56);
    assert_eq!(v[40], 0);
}

#[test]
fn test_insert_n_zero_is_noop() {
    let mut v = Vector::<u32>::new();

    assert_eq!(v.insert_n(0, 0, 5), 0);
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_erase_returns_next_index() {
    let mut v: Vector<u32> = (0..5).collect();

    assert_eq!(v.erase(1), 1);
    assert_eq!(v[1], 2);
    assert_eq!(v.erase(3), 3);
    assert_eq!(v.len(), 3);
    assert_eq!(v.as_slice(), &[0, 2, 3]);
}

#[test]
#[should_panic(expected = "erase index 3 out of bounds (len 3)")]
fn test_erase_out_of_bounds() {
    let mut v: Vector<u32> = (0..3).collect();
    v.erase(3);
}

#[test]
fn test_erase_range() {
    let mut v: Vector<u32> = (0..10).collect();

    assert_eq!(v.erase_range(2..5), 2);
    assert_eq!(v.as_slice(), &[0, 1, 5, 6, 7, 8, 9]);

    assert_eq!(v.erase_range(5..7), 5);
    assert_eq!(v.as_slice(), &[0, 1, 5, 6, 7]);
}

#[test]
#[allow(clippy::reversed_empty_ranges)]
fn test_erase_empty_range() {
    let mut v: Vector<u32> = (0..4).collect();

    assert_eq!(v.erase_range(2..2), 4);
    assert_eq!(v.erase_range(3..1), 4);
    assert_eq!(v.len(), 4);
}

#[test]
fn test_erase_range_drops_each_once() {
    let drops = Rc::new(Cell::new(0));
    let mut v = Vector::new();
    for _ in 0..6 {
        v.push(DropCounter(drops.clone()));
    }

    v.erase_range(1..4);
    assert_eq!(drops.get(), 3);
    assert_eq!(v.len(), 3);

    drop(v);
    assert_eq!(drops.get(), 6);
}

#[test]
fn test_remove_and_swap_erase() {
    let mut v: Vector<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

    assert_eq!(v.remove(1), "b");
    assert_eq!(v.swap_erase(0), "a");

    assert_eq!(v.as_slice(), &["d".to_string(), "c".to_string()]);
}

#[test]
fn test_resize() {
    let mut v: Vector<u32> = (1..4).collect();

    v.resize(6);
    assert_eq!(v.as_slice(), &[1, 2, 3, 0, 0, 0]);

    v.resize(2);
    assert_eq!(v.as_slice(), &[1, 2]);

    v.resize_with_value(4, 8);
    assert_eq!(v.as_slice(), &[1, 2, 8, 8]);

    v.resize_with_value(1, 8);
    assert_eq!(v.as_slice(), &[1]);
}

#[test]
fn test_reserve_and_set_capacity() {
    let mut v: Vector<u32> = (0..5).collect();

    v.reserve(10);
    assert_eq!(v.capacity(), 16);

    v.reserve(100);
    assert_eq!(v.capacity(), 100);
    assert_equal(v.iter().copied(), 0..5);

    v.set_capacity(3);
    assert_eq!(v.capacity(), 3);
    assert_eq!(v.as_slice(), &[0, 1, 2]);
}

#[test]
fn test_clear_and_reset() {
    let mut v: Vector<u32> = (0..5).collect();

    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 16);

    v.push(1);
    v.reset();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_assign() {
    let mut v: Vector<u32> = (0..3).collect();

    v.assign(&[7, 8]);
    assert_eq!(v.as_slice(), &[7, 8]);
    assert_eq!(v.capacity(), 16);

    let big: Vec<u32> = (0..40).collect();
    v.assign(&big);
    assert_eq!(v.as_slice(), big.as_slice());
    assert_eq!(v.capacity(), 40);
}

#[test]
fn test_find_and_index_of() {
    let v: Vector<u32> = [3, 1, 4, 1, 5].into_iter().collect();

    assert_eq!(v.find(&1), Some(1));
    assert_eq!(v.find(&9), None);
    assert_eq!(v.index_of(&1, 0), Some(1));
    assert_eq!(v.index_of(&1, 2), Some(3));
    assert_eq!(v.index_of(&1, 4), None);
    assert_eq!(v.index_of(&1, 5), None);
}

#[test]
#[should_panic(expected = "start index 6 out of bounds")]
fn test_index_of_out_of_bounds() {
    let v: Vector<u32> = (0..5).collect();
    v.index_of(&1, 6);
}

#[test]
fn test_clone_and_eq() {
    let v: Vector<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    let w = v.clone();

    assert_eq!(v, w);
    assert_eq!(w.capacity(), v.capacity());

    let mut fixed = FixedVector::<String, U4>::new_fixed();
    fixed.extend(v.iter().cloned());
    assert_eq!(v, fixed);
    assert_eq!(fixed.clone(), fixed);
}

#[test]
fn test_clone_empty() {
    let v = Vector::<u32>::new();
    let w = v.clone();

    assert!(w.is_empty());
    assert_eq!(w.capacity(), 0);
}

#[test]
fn test_with_len_and_from_slice() {
    let v = Vector::<u32, _>::with_len_in(3, Global);
    assert_eq!(v.as_slice(), &[0, 0, 0]);

    let w = Vector::from_slice_in(&[1u8, 2, 3][..], Global);
    assert_eq!(w.as_slice(), &[1, 2, 3]);
}

#[test]
fn test_into_iter_drops_rest() {
    let drops = Rc::new(Cell::new(0));
    let mut v = Vector::new();
    for _ in 0..5 {
        v.push(DropCounter(drops.clone()));
    }

    let mut iter = v.into_iter();
    let first = iter.next();
    let last = iter.next_back();
    assert_eq!(iter.len(), 3);
    assert_eq!(drops.get(), 0);

    drop(iter);
    assert_eq!(drops.get(), 3);

    drop((first, last));
    assert_eq!(drops.get(), 5);
}

#[test]
fn test_zero_sized() {
    let mut v = Vector::new();
    for _ in 0..100 {
        v.push(());
    }

    assert_eq!(v.len(), 100);
    v.erase_range(10..90);
    assert_eq!(v.len(), 20);
}

#[test]
fn test_allocations_released() {
    let alloc = CountingAllocator::default();
    {
        let mut v = Vector::new_in(&alloc);
        for i in 0..17u64 {
            v.push(i);
        }
        assert_eq!(alloc.n_allocations(), 2);
        assert_eq!(alloc.n_deallocations(), 1);

        v.insert_n(5, 100, 0);
        v.erase_range(0..50);
        v.assign(&[1, 2, 3]);
    }

    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);
}

#[test]
fn test_allocator_swap_before_first_allocation() {
    let first = CountingAllocator::default();
    let second = CountingAllocator::default();
    {
        let mut v = Vector::new_in(&first);
        v.set_allocator(&second);
        v.push(1u32);

        // Ignored once a buffer exists.
        v.set_allocator(&first);
        v.push(2);
    }

    assert_eq!(first.n_allocations(), 0);
    assert_eq!(second.n_allocations(), 1);
    assert_eq!(second.net_allocations(), 0);
}

#[test]
fn test_fixed_vector() {
    let mut v = FixedVector::<u32, U4>::new_fixed();
    assert_eq!(v.capacity(), 4);

    for i in 0..4 {
        v.push(i);
    }
    v.erase(0);
    v.insert(3, 9);

    assert_eq!(v.as_slice(), &[1, 2, 3, 9]);
    assert_eq!(v.capacity(), 4);
}

#[test]
#[should_panic(expected = "fixed-capacity storage cannot grow")]
fn test_fixed_vector_overflow() {
    let mut v = FixedVector::<u32, U4>::new_fixed();
    for i in 0..5 {
        v.push(i);
    }
}

#[test]
#[should_panic(expected = "fixed-capacity storage cannot grow")]
fn test_fixed_vector_try_push_still_fatal() {
    let mut v = FixedVector::<u32, U4>::new_fixed();
    v.extend(0..4);
    let _ = v.try_push(4);
}

#[test]
fn test_fixed_vector_drops_elements() {
    let drops = Rc::new(Cell::new(0));
    {
        let mut v = FixedVector::<DropCounter, U8>::new_fixed();
        for _ in 0..5 {
            v.push(DropCounter(drops.clone()));
        }
        v.truncate(2);
        assert_eq!(drops.get(), 3);
    }
    assert_eq!(drops.get(), 5);
}

#[test]
fn test_sorted_vector() {
    let mut map = SortedVector::new();

    assert_eq!(map.insert(5, 'e'), (0, true));
    assert_eq!(map.insert(1, 'a'), (0, true));
    assert_eq!(map.insert(3, 'c'), (1, true));
    assert_eq!(map.insert(3, 'x'), (1, false));

    assert_eq!(map.as_slice(), &[(1, 'a'), (3, 'c'), (5, 'e')]);
    assert_eq!(map.find(&3), Some(1));
    assert_eq!(map.find(&4), None);
    assert_eq!(map.lower_bound(&4), 2);
    assert_eq!(map.upper_bound(&3), 2);

    *map.get_mut(&5).unwrap() = 'E';
    assert_eq!(map.get(&5), Some(&'E'));

    assert_eq!(map.erase(&1), 1);
    assert_eq!(map.erase(&1), 0);
    assert_eq!(map.remove(&3), Some((3, 'c')));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_sorted_vector_from_iter_keeps_first() {
    let map: SortedVector<u32, &str> = [(2, "b"), (1, "a"), (2, "B"), (0, "z")].into_iter().collect();

    assert_equal(map.iter().copied(), [(0, "z"), (1, "a"), (2, "b")]);
}

#[test]
fn test_fixed_sorted_vector() {
    let mut map = FixedSortedVector::<u32, u32, U4>::new_fixed();
    for k in [4, 3, 2, 1] {
        map.insert(k, k * 10);
    }

    assert_eq!(map.capacity(), 4);
    assert_equal(map.iter().map(|(k, _)| *k), [1, 2, 3, 4]);
}

#[test]
fn test_sorted_vector_from_iter_drops_duplicates() {
    let drops = Rc::new(Cell::new(0));
    let pairs = (0..100u32).map(|i| (i % 7, (i, DropCounter(drops.clone()))));
    let map = SortedVector::from_iter_in(pairs, Global);

    assert_eq!(drops.get(), 93);
    assert_equal(map.iter().map(|(k, (first, _))| (*k, *first)), (0..7).map(|k| (k, k)));

    drop(map);
    assert_eq!(drops.get(), 100);
}

#[test]
fn test_sorted_multimap() {
    let mut map = SortedMultiMap::new();

    assert_eq!(map.insert(2, 'b'), 0);
    assert_eq!(map.insert(1, 'a'), 0);
    assert_eq!(map.insert(2, 'B'), 2);
    assert_eq!(map.insert(3, 'c'), 3);
    assert_eq!(map.insert(2, 'x'), 3);

    assert_eq!(map.as_slice(), &[(1, 'a'), (2, 'b'), (2, 'B'), (2, 'x'), (3, 'c')]);
    assert_eq!(map.lower_bound(&2), 1);
    assert_eq!(map.upper_bound(&2), 4);
    assert_eq!(map.equal_range(&2), 1..4);
    assert_eq!(map.equal_range(&0), 0..0);
    assert_eq!(map.equal_range(&9), 5..5);
    assert_eq!(map.count(&2), 3);
    assert_eq!(map.find(&2), Some(1));
    assert_eq!(map.find(&4), None);
    assert_eq!(map.get_all(&2), &[(2, 'b'), (2, 'B'), (2, 'x')]);
    assert!(map.get_all(&7).is_empty());
}

#[test]
fn test_sorted_multimap_find_value() {
    let map: SortedMultiMap<u32, char> = [(1, 'a'), (2, 'b'), (2, 'a'), (3, 'a')].into_iter().collect();

    assert_eq!(map.find_value(&'a', 0..map.len()), Some(0));
    assert_eq!(map.find_value(&'a', map.equal_range(&2)), Some(2));
    assert_eq!(map.find_value(&'b', map.equal_range(&3)), None);
    assert_eq!(map.find_value(&'z', 0..map.len()), None);
    assert_eq!(map.find_value(&'a', 2..2), None);
}

#[test]
#[should_panic]
fn test_sorted_multimap_find_value_out_of_bounds() {
    let map: SortedMultiMap<u32, char> = [(1, 'a')].into_iter().collect();
    map.find_value(&'a', 0..2);
}

#[test]
fn test_sorted_multimap_erase() {
    let mut map: SortedMultiMap<u32, u32> = [(1, 10), (2, 20), (2, 21), (3, 30)].into_iter().collect();

    assert_eq!(map.erase(&2), 2);
    assert_eq!(map.erase(&2), 0);
    assert_eq!(map.erase_at(0), 0);
    assert_eq!(map.as_slice(), &[(3, 30)]);

    map.clear();
    assert!(map.is_empty());
}

#[test]
fn test_fixed_sorted_multimap() {
    let mut map = FixedSortedMultiMap::<u32, u32, U4>::new_fixed();
    for (k, v) in [(2, 0), (1, 1), (2, 2), (1, 3)] {
        map.insert(k, v);
    }

    assert_eq!(map.capacity(), 4);
    assert_eq!(map.as_slice(), &[(1, 1), (1, 3), (2, 0), (2, 2)]);
}

#[test]
fn test_sorted_multimap_allocations_balance() {
    let alloc = CountingAllocator::default();
    {
        let mut map = SortedMultiMap::<u32, String, _>::new_in(&alloc);
        for i in 0..40 {
            map.insert(i % 3, i.to_string());
        }
        map.erase(&1);
    }

    assert_eq!(alloc.net_allocations(), 0);
}

#[test]
fn test_buffer_sized_by_element_count() {
    let alloc = CountingAllocator::default();
    let mut v = Vector::<u32, _>::new_in(&alloc);

    v.push(1);
    assert_eq!(alloc.n_bytes_allocated(), 16 * 4);

    v.reserve(100);
    assert_eq!(alloc.n_bytes_allocated(), 16 * 4 + 100 * 4);

    drop(v);
    assert_eq!(alloc.n_bytes_deallocated(), 16 * 4 + 100 * 4);
}

#[test]
fn test_try_reserve_reports_failed_layout() {
    let buffer = StackBuffer::<typenum::U128>::new();
    let mut v = Vector::<u32, _>::new_in(buffer.allocator());
    v.extend(0..4);

    let err = v.try_reserve(64).unwrap_err();
    assert_eq!(err, AllocErrorWithLayout::from(Layout::array::<u32>(64).unwrap()));
    assert_equal(v.iter().copied(), 0..4);
    assert_eq!(v.capacity(), 16);
}

#[test]
#[should_panic(expected = "capacity overflow")]
fn test_reserve_capacity_overflow() {
    let mut v = Vector::<u64>::new();
    v.reserve(usize::MAX / 4);
}

#[test]
#[should_panic(expected = "capacity overflow")]
fn test_try_reserve_capacity_overflow() {
    let mut v = Vector::<u64>::new();
    let _ = v.try_reserve(usize::MAX / 4);
}

proptest! {
    #[test]
    fn test_capacity_never_shrinks_on_push(n in 0..200usize) {
        let mut v = Vector::new();
        let mut last = 0;
        for i in 0..n {
            v.push(i);
            prop_assert!(v.capacity() >= last);
            prop_assert!(v.len() <= v.capacity());
            last = v.capacity();
        }
        prop_assert_eq!(v.len(), n);
    }
}

proptest! {
    #[test]
    fn test_insert_then_erase_restores(
        items in prop::collection::vec(any::<u32>(), 0..64),
        value in any::<u32>(),
        at in any::<prop::sample::Index>(),
    ) {
        let mut v: Vector<u32> = items.iter().copied().collect();
        let index = at.index(items.len() + 1);

        let i = v.insert(index, value);
        prop_assert_eq!(v[i], value);
        prop_assert_eq!(v.len(), items.len() + 1);

        v.erase(i);
        prop_assert_eq!(v.as_slice(), items.as_slice());
    }
}

proptest! {
    #[test]
    fn test_matches_vec(ops in prop::collection::vec((0..5u8, any::<u16>(), any::<prop::sample::Index>()), 1..150)) {
        let alloc = CountingAllocator::default();
        {
            let mut v = Vector::new_in(&alloc);
            let mut model = Vec::new();

            for (op, value, at) in ops {
                match op {
                    0 => {
                        v.push(value);
                        model.push(value);
                    }
                    1 => {
                        let i = at.index(model.len() + 1);
                        v.insert(i, value);
                        model.insert(i, value);
                    }
                    2 if !model.is_empty() => {
                        let i = at.index(model.len());
                        prop_assert_eq!(v.remove(i), model.remove(i));
                    }
                    3 if !model.is_empty() => {
                        let a = at.index(model.len());
                        let b = (a + usize::from(value % 4)).min(model.len());
                        v.erase_range(a..b);
                        model.drain(a..b);
                    }
                    4 => {
                        let i = at.index(model.len() + 1);
                        let n = usize::from(value % 5);
                        v.insert_n(i, n, value);
                        for _ in 0..n {
                            model.insert(i, value);
                        }
                    }
                    _ => {}
                }
                prop_assert_eq!(v.as_slice(), model.as_slice());
            }
        }

        prop_assert_eq!(alloc.net_allocations(), 0);
    }
}

proptest! {
    #[test]
    fn test_sorted_vector_stays_ordered(ops in prop::collection::vec((any::<bool>(), 0..50u32), 1..200)) {
        let mut map = SortedVector::new();
        let mut model = alloc::collections::BTreeMap::new();

        for (insert, k) in ops {
            if insert {
                let (_, inserted) = map.insert(k, k);
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(k);
            } else {
                prop_assert_eq!(map.erase(&k), usize::from(model.remove(&k).is_some()));
            }
            prop_assert!(map.as_slice().windows(2).all(|w| w[0].0 < w[1].0));
        }

        prop_assert!(map.iter().map(|(k, v)| (k, v)).eq(model.iter()));
    }
}

proptest! {
    #[test]
    fn test_sorted_multimap_matches_model(ops in prop::collection::vec((0..4u8, 0..20u32, any::<u16>()), 1..200)) {
        let mut map = SortedMultiMap::new();
        let mut model: Vec<(u32, u16)> = Vec::new();

        for (op, k, v) in ops {
            match op {
                0 | 1 => {
                    let at = model.partition_point(|(mk, _)| *mk <= k);
                    model.insert(at, (k, v));
                    prop_assert_eq!(map.insert(k, v), at);
                }
                2 => {
                    let before = model.len();
                    model.retain(|(mk, _)| *mk != k);
                    prop_assert_eq!(map.erase(&k), before - model.len());
                }
                _ => {
                    let start = model.partition_point(|(mk, _)| *mk < k);
                    let end = model.partition_point(|(mk, _)| *mk <= k);
                    prop_assert_eq!(map.equal_range(&k), start..end);
                    prop_assert_eq!(map.get_all(&k), &model[start..end]);
                    prop_assert_eq!(
                        map.find_value(&v, 0..map.len()),
                        model.iter().position(|(_, mv)| *mv == v)
                    );
                }
            }
            prop_assert_eq!(map.as_slice(), model.as_slice());
        }
    }
}
