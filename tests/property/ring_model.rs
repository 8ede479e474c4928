//! Differential tests against a `VecDeque` model.
//!
//! The model applies each operation with plain deque edits plus the
//! overwrite rule spelled out step by step (one element at a time). The ring
//! must agree on contents, capacity, and every returned position, whatever
//! physical layout it happens to be in.

use std::collections::VecDeque;

use proptest::prelude::*;

use circular_rs::CircularBuffer;

#[derive(Debug, Clone)]
enum Op {
    PushBack(u16),
    PushFront(u16),
    PopBack,
    PopFront,
    Insert(usize, u16),
    RInsert(usize, u16),
    InsertIter { pos: usize, items: Vec<u16>, exact: bool },
    RInsertIter { pos: usize, items: Vec<u16>, exact: bool },
    InsertN(usize, usize, u16),
    RInsertN(usize, usize, u16),
    Erase(usize),
    RErase(usize),
    EraseRange(usize, usize),
    REraseRange(usize, usize),
    EraseBegin(usize),
    EraseEnd(usize),
    Remove(usize),
    Rotate(usize),
    Linearize,
    SetCapacity(usize),
    RSetCapacity(usize),
    Resize(usize, u16),
    RResize(usize, u16),
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let pos = any::<usize>();
    let items = prop::collection::vec(any::<u16>(), 0..10);
    prop_oneof![
        4 => any::<u16>().prop_map(Op::PushBack),
        2 => any::<u16>().prop_map(Op::PushFront),
        1 => Just(Op::PopBack),
        1 => Just(Op::PopFront),
        2 => (pos.clone(), any::<u16>()).prop_map(|(p, v)| Op::Insert(p, v)),
        2 => (pos.clone(), any::<u16>()).prop_map(|(p, v)| Op::RInsert(p, v)),
        1 => (pos.clone(), items.clone(), any::<bool>())
            .prop_map(|(pos, items, exact)| Op::InsertIter { pos, items, exact }),
        1 => (pos.clone(), items, any::<bool>())
            .prop_map(|(pos, items, exact)| Op::RInsertIter { pos, items, exact }),
        1 => (pos.clone(), 0usize..12, any::<u16>()).prop_map(|(p, n, v)| Op::InsertN(p, n, v)),
        1 => (pos.clone(), 0usize..12, any::<u16>()).prop_map(|(p, n, v)| Op::RInsertN(p, n, v)),
        1 => pos.clone().prop_map(Op::Erase),
        1 => pos.clone().prop_map(Op::RErase),
        1 => (pos.clone(), pos.clone()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => (pos.clone(), pos.clone()).prop_map(|(a, b)| Op::REraseRange(a, b)),
        1 => pos.clone().prop_map(Op::EraseBegin),
        1 => pos.clone().prop_map(Op::EraseEnd),
        1 => pos.clone().prop_map(Op::Remove),
        1 => pos.prop_map(Op::Rotate),
        1 => Just(Op::Linearize),
        1 => (0usize..12).prop_map(Op::SetCapacity),
        1 => (0usize..12).prop_map(Op::RSetCapacity),
        1 => (0usize..14, any::<u16>()).prop_map(|(n, v)| Op::Resize(n, v)),
        1 => (0usize..14, any::<u16>()).prop_map(|(n, v)| Op::RResize(n, v)),
        1 => Just(Op::Clear),
    ]
}

/// Reference ring: a deque plus a capacity, edited one element at a time.
struct Model {
    cap: usize,
    items: VecDeque<u16>,
}

impl Model {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            items: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn reserve(&self) -> usize {
        self.cap - self.items.len()
    }

    fn push_back(&mut self, v: u16) {
        if self.cap == 0 {
            return;
        }
        if self.len() == self.cap {
            self.items.pop_front();
        }
        self.items.push_back(v);
    }

    fn push_front(&mut self, v: u16) {
        if self.cap == 0 {
            return;
        }
        if self.len() == self.cap {
            self.items.pop_back();
        }
        self.items.push_front(v);
    }

    fn insert(&mut self, pos: usize, v: u16) -> usize {
        if self.cap == 0 {
            return 0;
        }
        if self.len() < self.cap {
            self.items.insert(pos, v);
            return pos;
        }
        if pos == 0 {
            return 0;
        }
        self.items.pop_front();
        self.items.insert(pos - 1, v);
        pos - 1
    }

    fn rinsert(&mut self, pos: usize, v: u16) -> usize {
        if self.cap == 0 {
            return 0;
        }
        if self.len() < self.cap {
            self.items.insert(pos, v);
            return pos;
        }
        if pos == self.len() {
            return pos;
        }
        self.items.pop_back();
        self.items.insert(pos, v);
        pos
    }

    fn insert_all(&mut self, pos: usize, items: &[u16]) -> usize {
        if pos + self.reserve() == 0 {
            return pos;
        }
        let mut at = pos;
        for &v in items {
            at = self.insert(at, v) + 1;
        }
        at
    }

    fn rinsert_all(&mut self, pos: usize, items: &[u16]) -> usize {
        let limit = self.len() - pos + self.reserve();
        let mut at = pos;
        for &v in items.iter().take(limit) {
            at = self.rinsert(at, v) + 1;
        }
        at
    }

    fn set_capacity(&mut self, n: usize) {
        self.items.truncate(n);
        self.cap = n;
    }

    fn rset_capacity(&mut self, n: usize) {
        let excess = self.len().saturating_sub(n);
        self.items.drain(..excess);
        self.cap = n;
    }

    fn resize(&mut self, n: usize, v: u16) {
        self.cap = self.cap.max(n);
        self.items.resize(n, v);
    }

    fn rresize(&mut self, n: usize, v: u16) {
        self.cap = self.cap.max(n);
        if n < self.len() {
            let excess = self.len() - n;
            self.items.drain(..excess);
        }
        while self.len() < n {
            self.items.push_front(v);
        }
    }
}

/// Applies `op` to both and returns the pair of reported positions, if the
/// operation reports one.
fn apply(buf: &mut CircularBuffer<u16>, model: &mut Model, op: &Op) -> Option<(usize, usize)> {
    let len = model.len();
    let at = |seed: usize| seed % (len + 1);
    let live = |seed: usize| seed % len;
    match *op {
        Op::PushBack(v) => {
            buf.push_back(v);
            model.push_back(v);
        }
        Op::PushFront(v) => {
            buf.push_front(v);
            model.push_front(v);
        }
        Op::PopBack => assert_eq!(buf.pop_back(), model.items.pop_back()),
        Op::PopFront => assert_eq!(buf.pop_front(), model.items.pop_front()),
        Op::Insert(seed, v) => {
            let pos = at(seed);
            return Some((buf.insert(pos, v), model.insert(pos, v)));
        }
        Op::RInsert(seed, v) => {
            let pos = at(seed);
            return Some((buf.rinsert(pos, v), model.rinsert(pos, v)));
        }
        Op::InsertIter {
            pos: seed,
            ref items,
            exact,
        } => {
            let pos = at(seed);
            let got = if exact {
                buf.insert_iter(pos, items.iter().copied())
            } else {
                buf.insert_iter(pos, items.iter().copied().filter(|_| true))
            };
            return Some((got, model.insert_all(pos, items)));
        }
        Op::RInsertIter {
            pos: seed,
            ref items,
            exact,
        } => {
            let pos = at(seed);
            let got = if exact {
                buf.rinsert_iter(pos, items.iter().copied())
            } else {
                buf.rinsert_iter(pos, items.iter().copied().filter(|_| true))
            };
            return Some((got, model.rinsert_all(pos, items)));
        }
        Op::InsertN(seed, n, v) => {
            let pos = at(seed);
            return Some((buf.insert_n(pos, n, &v), model.insert_all(pos, &vec![v; n])));
        }
        Op::RInsertN(seed, n, v) => {
            let pos = at(seed);
            return Some((buf.rinsert_n(pos, n, &v), model.rinsert_all(pos, &vec![v; n])));
        }
        Op::Erase(seed) if len > 0 => {
            let pos = live(seed);
            model.items.remove(pos);
            return Some((buf.erase(pos), pos));
        }
        Op::RErase(seed) if len > 0 => {
            let pos = live(seed);
            model.items.remove(pos);
            return Some((buf.rerase(pos), pos.saturating_sub(1)));
        }
        Op::EraseRange(a, b) => {
            let (a, b) = (at(a), at(b));
            let (start, end) = (a.min(b), a.max(b));
            model.items.drain(start..end);
            return Some((buf.erase_range(start..end), start));
        }
        Op::REraseRange(a, b) => {
            let (a, b) = (at(a), at(b));
            let (start, end) = (a.min(b), a.max(b));
            model.items.drain(start..end);
            return Some((buf.rerase_range(start..end), start.saturating_sub(1)));
        }
        Op::EraseBegin(seed) => {
            let n = at(seed);
            buf.erase_begin(n);
            model.items.drain(..n);
        }
        Op::EraseEnd(seed) => {
            let n = at(seed);
            buf.erase_end(n);
            model.items.truncate(len - n);
        }
        Op::Remove(seed) => {
            let pos = at(seed);
            let expected = if pos < len {
                model.items.remove(pos)
            } else {
                None
            };
            assert_eq!(buf.remove(pos), expected);
        }
        Op::Rotate(seed) => {
            let pos = at(seed);
            buf.rotate(pos);
            model.items.rotate_left(pos);
        }
        Op::Linearize => {
            let slice = buf.linearize().to_vec();
            assert!(slice.iter().eq(model.items.iter()));
            assert!(buf.is_linearized());
        }
        Op::SetCapacity(n) => {
            buf.set_capacity(n).unwrap();
            model.set_capacity(n);
        }
        Op::RSetCapacity(n) => {
            buf.rset_capacity(n).unwrap();
            model.rset_capacity(n);
        }
        Op::Resize(n, v) => {
            buf.resize(n, v).unwrap();
            model.resize(n, v);
        }
        Op::RResize(n, v) => {
            buf.rresize(n, v).unwrap();
            model.rresize(n, v);
        }
        Op::Clear => {
            buf.clear();
            model.items.clear();
        }
        Op::Erase(_) | Op::RErase(_) => {}
    }
    None
}

fn arb_ring() -> impl Strategy<Value = CircularBuffer<u16>> {
    (1usize..10, prop::collection::vec(any::<u16>(), 0..20), any::<usize>()).prop_map(
        |(cap, items, drop_seed)| {
            let mut buf = CircularBuffer::from_iter_with_capacity(cap, items);
            buf.erase_begin(drop_seed % (buf.len() + 1));
            buf.extend([1, 2, 3].into_iter().take(drop_seed % 3));
            buf
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn ring_matches_model(cap in 0usize..8, ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut buf = CircularBuffer::with_capacity(cap);
        let mut model = Model::new(cap);
        for op in &ops {
            if let Some((got, expected)) = apply(&mut buf, &mut model, op) {
                prop_assert_eq!(got, expected, "position after {:?}", op);
            }
            buf.check_invariants();
            prop_assert_eq!(buf.capacity(), model.cap);
            prop_assert!(buf.iter().eq(model.items.iter()), "contents after {:?}", op);
            prop_assert!(buf.iter().rev().eq(model.items.iter().rev()));
            prop_assert_eq!(buf.is_full(), model.len() == model.cap);
        }
    }

    #[test]
    fn erase_undoes_insert_when_not_full(buf in arb_ring(), seed in any::<usize>(), v in any::<u16>()) {
        prop_assume!(!buf.is_full());
        let pos = seed % (buf.len() + 1);
        let mut edited = buf.clone();
        let at = edited.insert(pos, v);
        prop_assert_eq!(at, pos);
        prop_assert_eq!(edited[pos], v);
        edited.erase(at);
        prop_assert_eq!(edited, buf);
    }

    #[test]
    fn linearize_preserves_order_and_is_idempotent(mut buf in arb_ring()) {
        let before: Vec<u16> = buf.iter().copied().collect();
        let (ptr, slice) = {
            let s = buf.linearize();
            (s.as_ptr(), s.to_vec())
        };
        prop_assert_eq!(&slice, &before);
        let again = buf.linearize();
        prop_assert_eq!(again.as_ptr(), ptr);
        prop_assert_eq!(again.to_vec(), before);
    }

    #[test]
    fn cursors_follow_logical_order(buf in arb_ring(), a in any::<usize>(), b in any::<usize>()) {
        let i = a % (buf.len() + 1);
        let j = b % (buf.len() + 1);
        let (ci, cj) = (buf.cursor(i), buf.cursor(j));
        prop_assert_eq!(ci < cj, i < j);
        prop_assert_eq!(cj - ci, j as isize - i as isize);
        prop_assert_eq!(ci.get(), buf.get(i));
        prop_assert_eq!(ci.offset(j as isize - i as isize), cj);
        if let Some(slot) = ci.physical() {
            prop_assert!(slot < buf.capacity());
        }
    }
}
