// Fail-fast cursor test suite.
//
// Invariants exercised:
// - A cursor snapshots the structural version at creation.
// - Structural mutation through the table (new key, remove, clear) fails
//   the next advance/remove with ConcurrentModification.
// - Overwriting an existing key's value is not structural.
// - Removal through the cursor resynchronizes it.
// - remove without a preceding advance is IllegalState; advancing past
//   the end is NoSuchElement.
use chained_hashmap::{ChainedHashMap, Error};
use std::collections::BTreeSet;

fn numbers(n: i32) -> ChainedHashMap<i32, i32> {
    (0..n).map(|i| (i, i * i)).collect()
}

fn is_cme<T>(r: &Result<T, Error>) -> bool {
    matches!(r, Err(Error::ConcurrentModification { .. }))
}

// Test: new key between has_next and advance.
// Verifies: the next advance reports ConcurrentModification.
#[test]
fn put_new_key_between_has_next_and_advance() {
    let mut m = numbers(5);
    let mut c = m.keys().cursor();
    assert!(c.has_next());
    c.advance(&m).unwrap();
    assert!(c.has_next());
    m.put(100, 0);
    assert!(is_cme(&c.advance(&m)));
}

// Test: has_next after external remove and put.
// Assumes: has_next only reports whether a node is staged.
// Verifies: has_next stays true while the following advance fails.
#[test]
fn has_next_ignores_interference() {
    let mut m = numbers(3);
    let mut c = m.values().cursor();
    m.remove(&0);
    m.put(7, 7);
    assert!(c.has_next());
    assert!(c.has_next(), "has_next is idempotent");
    assert!(is_cme(&c.advance(&m)));
    assert!(c.has_next(), "a failed advance does not consume the staged node");
}

// Test: value overwrite during traversal.
// Assumes: overwrite is not a structural mutation.
// Verifies: traversal continues and observes the new value.
#[test]
fn overwrite_does_not_trip_cursor() {
    let mut m = numbers(10);
    let mut c = m.entries().cursor();
    m.put(3, -1);
    let mut saw = None;
    while c.has_next() {
        let (k, v) = c.advance(&m).unwrap();
        if *k == 3 {
            saw = Some(*v);
        }
    }
    assert_eq!(saw, Some(-1));
}

// Test: external remove and clear.
// Verifies: both are structural and fail the next step, including remove.
#[test]
fn external_remove_and_clear_are_detected() {
    let mut m = numbers(4);
    let mut c = m.keys().cursor();
    c.advance(&m).unwrap();
    m.remove(&2);
    assert!(is_cme(&c.remove(&mut m)));
    assert_eq!(m.len(), 3, "failed cursor remove must not touch the table");

    let mut c = m.keys().cursor();
    m.clear();
    assert!(is_cme(&c.advance(&m)));
}

// Test: removal through the cursor.
// Verifies: the following advance succeeds; the whole table drains.
#[test]
fn cursor_remove_drains_table() {
    let mut m = numbers(50);
    let mut c = m.entries().cursor();
    let mut removed = BTreeSet::new();
    while c.has_next() {
        c.advance(&m).unwrap();
        let (k, v) = c.remove(&mut m).unwrap();
        assert_eq!(v, k * k);
        removed.insert(k);
    }
    assert!(m.is_empty());
    assert_eq!(removed, (0..50).collect());
}

// Test: cursor state errors.
// Verifies: IllegalState before advance and after a remove; NoSuchElement
// at the end; errors leave the table untouched.
#[test]
fn cursor_state_errors() {
    let mut m = numbers(1);
    let mut c = m.keys().cursor();
    assert_eq!(c.remove(&mut m), Err(Error::IllegalState));
    assert_eq!(c.advance(&m), Ok(&0));
    assert!(!c.has_next());
    assert_eq!(c.advance(&m), Err(Error::NoSuchElement));
    assert_eq!(c.remove(&mut m), Ok((0, 0)));
    assert_eq!(c.remove(&mut m), Err(Error::IllegalState));
    assert!(m.is_empty());
}

// Test: removal from one cursor invalidates another.
// Verifies: each cursor only resynchronizes itself.
#[test]
fn sibling_cursor_sees_removal() {
    let mut m = numbers(6);
    let mut a = m.keys().cursor();
    let mut b = m.keys().cursor();
    a.advance(&m).unwrap();
    a.remove(&mut m).unwrap();
    assert!(a.advance(&m).is_ok());
    assert!(is_cme(&b.advance(&m)));
}

// Test: cursor across a resize.
// Verifies: a put that grows the table is detected like any new key.
#[test]
fn resize_is_detected() {
    let mut m = ChainedHashMap::with_capacity(2).unwrap();
    m.put(1, 1);
    let mut c = m.keys().cursor();
    m.put(2, 2);
    assert_eq!(m.capacity(), 4);
    assert!(is_cme(&c.advance(&m)));
}

// Test: cursor handed a different table in the same state.
// Assumes: both tables saw the same number of structural mutations.
// Verifies: advance and remove against the other table fail, and the other
// table is untouched.
#[test]
fn cursor_is_bound_to_its_table() {
    let mut a = numbers(3);
    let mut b = numbers(3);
    let mut c = a.keys().cursor();
    assert!(is_cme(&c.advance(&b)));
    c.advance(&a).unwrap();
    assert!(is_cme(&c.remove(&mut b)));
    assert_eq!(b.len(), 3);
    c.remove(&mut a).unwrap();
    assert_eq!(a.len(), 2);
}
