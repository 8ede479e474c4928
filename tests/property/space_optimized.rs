//! The space-optimized adaptor must be observably identical to a fixed ring
//! of its logical capacity while keeping its internal block within bounds.

use proptest::prelude::*;

use circular_rs::{CapacityControl, CircularBuffer, SpaceOptimized};

#[derive(Debug, Clone)]
enum Op {
    PushBack(u32),
    PushFront(u32),
    PopBack,
    PopFront,
    Insert(usize, u32),
    RInsert(usize, u32),
    InsertIter(usize, Vec<u32>),
    RInsertIter(usize, Vec<u32>),
    Erase(usize),
    EraseBegin(usize),
    EraseEnd(usize),
    Rotate(usize),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let pos = any::<usize>();
    let items = prop::collection::vec(any::<u32>(), 0..24);
    prop_oneof![
        6 => any::<u32>().prop_map(Op::PushBack),
        2 => any::<u32>().prop_map(Op::PushFront),
        2 => Just(Op::PopBack),
        2 => Just(Op::PopFront),
        1 => (pos.clone(), any::<u32>()).prop_map(|(p, v)| Op::Insert(p, v)),
        1 => (pos.clone(), any::<u32>()).prop_map(|(p, v)| Op::RInsert(p, v)),
        1 => (pos.clone(), items.clone()).prop_map(|(p, v)| Op::InsertIter(p, v)),
        1 => (pos.clone(), items).prop_map(|(p, v)| Op::RInsertIter(p, v)),
        1 => pos.clone().prop_map(Op::Erase),
        1 => pos.clone().prop_map(Op::EraseBegin),
        1 => pos.clone().prop_map(Op::EraseEnd),
        1 => pos.prop_map(Op::Rotate),
        1 => Just(Op::Clear),
    ]
}

fn control_strategy() -> impl Strategy<Value = CapacityControl> {
    (0usize..40, any::<usize>()).prop_map(|(cap, min_seed)| {
        CapacityControl::new(cap, min_seed % (cap + 1)).expect("min <= capacity")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn adaptor_matches_fixed_ring(
        control in control_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..96),
    ) {
        let mut so = SpaceOptimized::new(control).unwrap();
        let mut fixed = CircularBuffer::with_capacity(control.capacity());

        for op in &ops {
            let len = fixed.len();
            let at = |seed: usize| seed % (len + 1);
            match op {
                Op::PushBack(v) => {
                    so.push_back(*v).unwrap();
                    fixed.push_back(*v);
                }
                Op::PushFront(v) => {
                    so.push_front(*v).unwrap();
                    fixed.push_front(*v);
                }
                Op::PopBack => {
                    prop_assert_eq!(so.pop_back(), fixed.pop_back());
                }
                Op::PopFront => {
                    prop_assert_eq!(so.pop_front(), fixed.pop_front());
                }
                Op::Insert(seed, v) => {
                    let pos = at(*seed);
                    prop_assert_eq!(so.insert(pos, *v).unwrap(), fixed.insert(pos, *v));
                }
                Op::RInsert(seed, v) => {
                    let pos = at(*seed);
                    prop_assert_eq!(so.rinsert(pos, *v).unwrap(), fixed.rinsert(pos, *v));
                }
                Op::InsertIter(seed, items) => {
                    let pos = at(*seed);
                    prop_assert_eq!(
                        so.insert_iter(pos, items.iter().copied()).unwrap(),
                        fixed.insert_iter(pos, items.iter().copied())
                    );
                }
                Op::RInsertIter(seed, items) => {
                    let pos = at(*seed);
                    prop_assert_eq!(
                        so.rinsert_iter(pos, items.iter().copied()).unwrap(),
                        fixed.rinsert_iter(pos, items.iter().copied())
                    );
                }
                Op::Erase(seed) => {
                    if len > 0 {
                        let pos = seed % len;
                        prop_assert_eq!(so.erase(pos), fixed.erase(pos));
                    }
                }
                Op::EraseBegin(seed) => {
                    let n = at(*seed);
                    so.erase_begin(n);
                    fixed.erase_begin(n);
                }
                Op::EraseEnd(seed) => {
                    let n = at(*seed);
                    so.erase_end(n);
                    fixed.erase_end(n);
                }
                Op::Rotate(seed) => {
                    let pos = at(*seed);
                    so.rotate(pos);
                    fixed.rotate(pos);
                }
                Op::Clear => {
                    so.clear();
                    fixed.clear();
                }
            }
            so.check_invariants();
            prop_assert_eq!(so.as_ring(), &fixed, "after {:?}", op);
            prop_assert_eq!(so.is_full(), fixed.is_full());
            prop_assert_eq!(so.reserve(), fixed.reserve());
        }
    }

    #[test]
    fn sparse_buffers_release_memory(control in control_strategy(), fill in 0usize..40) {
        let mut so = SpaceOptimized::new(control).unwrap();
        so.extend(0..fill as u32);
        so.clear();
        prop_assert!(so.internal_capacity() <= control.min_capacity().max(1) * 2);
        prop_assert!(so.internal_capacity() >= control.min_capacity());
    }
}
