#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;

use circular_rs::CircularBuffer;

// Interprets a byte stream as an operation sequence against `CircularBuffer`,
// checking contents after every step against a `VecDeque` model that applies
// the overwrite rule one element at a time.
//
// Byte layout:
// - Byte 0 → initial capacity (`% 17`)
// - Remaining bytes as `(opcode, operand)` pairs:
//   - 0 → `push_back(operand)`
//   - 1 → `push_front(operand)`
//   - 2 → `pop_back()` / 3 → `pop_front()`
//   - 4 → `insert(operand % (len + 1), operand)`
//   - 5 → `rinsert(operand % (len + 1), operand)`
//   - 6 → `erase(operand % len)` / 7 → `rerase(operand % len)`
//   - 8 → `erase_begin(operand % (len + 1))` / 9 → `erase_end(..)`
//   - 10 → `rotate(operand % (len + 1))`
//   - 11 → `linearize()`
//   - 12 → `set_capacity(operand % 17)` / 13 → `rset_capacity(..)`
//   - 14 → `resize(operand % 17, operand)` / 15 → `rresize(..)`
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut cap = data[0] as usize % 17;
    let mut ring = CircularBuffer::with_capacity(cap);
    let mut model: VecDeque<u8> = VecDeque::new();

    let ops = &data[1..];
    let mut i = 0;
    while i + 1 < ops.len() {
        let opcode = ops[i];
        let operand = ops[i + 1];
        i += 2;
        let len = model.len();
        let full = len == cap;

        match opcode % 16 {
            0 => {
                ring.push_back(operand);
                if cap > 0 {
                    if full {
                        model.pop_front();
                    }
                    model.push_back(operand);
                }
            }
            1 => {
                ring.push_front(operand);
                if cap > 0 {
                    if full {
                        model.pop_back();
                    }
                    model.push_front(operand);
                }
            }
            2 => assert_eq!(ring.pop_back(), model.pop_back()),
            3 => assert_eq!(ring.pop_front(), model.pop_front()),
            4 => {
                let pos = operand as usize % (len + 1);
                let at = ring.insert(pos, operand);
                let expected = if !full {
                    model.insert(pos, operand);
                    pos
                } else if pos == 0 {
                    0
                } else {
                    model.pop_front();
                    model.insert(pos - 1, operand);
                    pos - 1
                };
                assert_eq!(at, expected, "insert({pos}) position");
            }
            5 => {
                let pos = operand as usize % (len + 1);
                let at = ring.rinsert(pos, operand);
                if !full {
                    model.insert(pos, operand);
                } else if pos < len {
                    model.pop_back();
                    model.insert(pos, operand);
                }
                assert_eq!(at, pos, "rinsert({pos}) position");
            }
            6 => {
                if len > 0 {
                    let pos = operand as usize % len;
                    assert_eq!(ring.erase(pos), pos);
                    model.remove(pos);
                }
            }
            7 => {
                if len > 0 {
                    let pos = operand as usize % len;
                    assert_eq!(ring.rerase(pos), pos.saturating_sub(1));
                    model.remove(pos);
                }
            }
            8 => {
                let n = operand as usize % (len + 1);
                ring.erase_begin(n);
                model.drain(..n);
            }
            9 => {
                let n = operand as usize % (len + 1);
                ring.erase_end(n);
                model.truncate(len - n);
            }
            10 => {
                let pos = operand as usize % (len + 1);
                ring.rotate(pos);
                if len > 0 {
                    model.rotate_left(pos % len);
                }
            }
            11 => {
                let slice = ring.linearize();
                assert!(slice.iter().eq(model.iter()));
            }
            12 => {
                cap = operand as usize % 17;
                ring.set_capacity(cap).unwrap();
                model.truncate(cap);
            }
            13 => {
                cap = operand as usize % 17;
                ring.rset_capacity(cap).unwrap();
                let excess = model.len().saturating_sub(cap);
                model.drain(..excess);
            }
            14 => {
                let n = operand as usize % 17;
                ring.resize(n, operand).unwrap();
                model.resize(n, operand);
                cap = cap.max(n);
            }
            _ => {
                let n = operand as usize % 17;
                ring.rresize(n, operand).unwrap();
                if n < len {
                    model.drain(..len - n);
                } else {
                    for _ in len..n {
                        model.push_front(operand);
                    }
                }
                cap = cap.max(n);
            }
        }

        ring.check_invariants();
        assert_eq!(ring.capacity(), cap);
        assert!(
            ring.iter().eq(model.iter()),
            "opcode {opcode}: ring {ring:?} != model {model:?}"
        );
    }
});
