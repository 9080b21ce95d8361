use core::cell::Cell;
use core::ptr::NonNull;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::RbTree;
use crate::node::{Color, RbNode};
use crate::{InvariantViolation, Linked, MAX_DEPTH};

struct Entry {
    key: i32,
    node: RbNode,
}

crate::impl_linked!(Entry, node);

impl Entry {
    fn new(key: i32) -> Self {
        Self { key, node: RbNode::new() }
    }

    fn link(&self) -> NonNull<RbNode> {
        unsafe { <Self as Linked>::links(NonNull::from(self)) }
    }
}

fn key_of(node: NonNull<RbNode>) -> i32 {
    unsafe { Entry::from_links(node).as_ref().key }
}

/// Strict order: new nodes go after their equals.
fn fifo(a: NonNull<RbNode>, b: NonNull<RbNode>) -> bool {
    key_of(a) < key_of(b)
}

/// Non-strict order: new nodes go in front of their equals.
fn lifo(a: NonNull<RbNode>, b: NonNull<RbNode>) -> bool {
    key_of(a) <= key_of(b)
}

fn init_logging() {
    use simplelog::*;
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

fn entries(keys: &[i32]) -> Vec<Entry> {
    keys.iter().copied().map(Entry::new).collect()
}

fn shuffled(n: i32, seed: u64) -> Vec<i32> {
    let mut keys: Vec<i32> = (0..n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

fn keys_in_order<C>(tree: &mut RbTree<C>) -> Vec<i32> {
    tree.iter().map(key_of).collect()
}

fn assert_valid<C>(tree: &RbTree<C>)
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    if let Err(violation) = tree.validate() {
        panic!("invalid tree: {violation}");
    }
}

#[test]
fn empty_tree() {
    init_logging();
    let mut tree = RbTree::new(fifo);
    let stranger = Entry::new(1);

    assert!(tree.is_empty());
    assert_eq!(tree.get_min(), None);
    assert_eq!(tree.get_max(), None);
    assert!(!tree.contains(stranger.link()));
    assert_eq!(tree.iter().next(), None);
    assert_eq!(tree.validate(), Ok(0));

    unsafe { tree.remove(stranger.link()) };
    assert!(tree.is_empty());
    assert_eq!(tree.max_depth(), 0);
}

#[test]
fn scrambled_inserts_come_out_sorted() {
    init_logging();
    let store = entries(&[5, 3, 8, 1, 4, 7, 9, 2, 6, 0]);
    let mut tree = RbTree::new(fifo);

    for e in &store {
        unsafe { tree.insert(e.link()) };
        assert_valid(&tree);
        assert!(tree.contains(e.link()));
    }

    assert_eq!(keys_in_order(&mut tree), (0..10).collect::<Vec<_>>());
    assert_eq!(tree.get_min().map(key_of), Some(0));
    assert_eq!(tree.get_max().map(key_of), Some(9));
}

#[test]
fn random_inserts_then_remove_roots() {
    init_logging();
    const ITER: i32 = 150;
    let store = entries(&shuffled(ITER, 0x5eed));
    let mut tree = RbTree::new(fifo);

    let (mut min, mut max) = (i32::MAX, i32::MIN);
    for (i, e) in store.iter().enumerate() {
        for earlier in &store[..i] {
            assert!(tree.contains(earlier.link()));
        }
        assert!(!tree.contains(e.link()));

        unsafe { tree.insert(e.link()) };
        assert_valid(&tree);
        min = min.min(e.key);
        max = max.max(e.key);
        assert_eq!(tree.get_min().map(key_of), Some(min));
        assert_eq!(tree.get_max().map(key_of), Some(max));
    }

    // height stays within 2 * log2(n + 1)
    let bound = 2.0 * ((ITER + 1) as f64).log2();
    assert!((tree.max_depth() as f64) <= bound + 1.0, "depth {} over {bound}", tree.max_depth());
    assert!(tree.max_depth() <= MAX_DEPTH);

    for removed in 1..=ITER {
        let root = tree.root().expect("tree emptied early");
        unsafe { tree.remove(root) };
        assert_valid(&tree);
        assert!(!tree.contains(root));

        let left: Vec<i32> = keys_in_order(&mut tree);
        assert_eq!(left.len(), (ITER - removed) as usize);
        assert!(left.is_sorted());
    }

    assert!(tree.is_empty());
    assert_eq!(tree.get_min(), None);
    assert_eq!(tree.get_max(), None);
    assert!(store.iter().all(|e| !tree.contains(e.link())));
}

#[test]
fn remove_in_random_order() {
    init_logging();
    let store = entries(&shuffled(200, 7));
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }

    let mut order: Vec<usize> = (0..store.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(11));

    for (done, &i) in order.iter().enumerate() {
        unsafe { tree.remove(store[i].link()) };
        assert_valid(&tree);
        assert!(!tree.contains(store[i].link()));

        // everything not yet removed is still there
        for &j in &order[done + 1..] {
            assert!(tree.contains(store[j].link()));
        }

        let (lo, hi) = order[done + 1..]
            .iter()
            .map(|&j| store[j].key)
            .fold((None, None), |(lo, hi): (Option<i32>, Option<i32>), k| {
                (Some(lo.map_or(k, |lo| lo.min(k))), Some(hi.map_or(k, |hi| hi.max(k))))
            });
        assert_eq!(tree.get_min().map(key_of), lo);
        assert_eq!(tree.get_max().map(key_of), hi);
    }
    assert!(tree.is_empty());
}

#[test]
fn interleaved_inserts_and_removes() {
    init_logging();
    let store = entries(&shuffled(120, 42));
    let mut tree = RbTree::new(fifo);
    let mut members = Vec::new();

    for (i, e) in store.iter().enumerate() {
        unsafe { tree.insert(e.link()) };
        members.push(e.key);
        if i % 3 == 2 {
            // drop the middle member each third round
            members.sort();
            let victim = members.remove(members.len() / 2);
            let node = store.iter().find(|e| e.key == victim).map(Entry::link).expect("key from the store");
            unsafe { tree.remove(node) };
        }
        assert_valid(&tree);
    }

    members.sort();
    assert_eq!(keys_in_order(&mut tree), members);
}

#[test]
fn reinsert_after_remove() {
    init_logging();
    let store = entries(&[10, 20, 30, 40, 50]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }

    let node = store[2].link();
    unsafe { tree.remove(node) };
    assert!(!tree.contains(node));
    assert_eq!(keys_in_order(&mut tree), [10, 20, 40, 50]);

    unsafe { tree.insert(node) };
    assert_valid(&tree);
    assert!(tree.contains(node));
    assert_eq!(keys_in_order(&mut tree), [10, 20, 30, 40, 50]);

    // and once more as the very last member
    for e in &store {
        unsafe { tree.remove(e.link()) };
    }
    assert!(tree.is_empty());
    unsafe { tree.insert(node) };
    assert_eq!(tree.root(), Some(node));
    assert_eq!(tree.validate(), Ok(1));
}

#[test]
fn equal_keys_keep_insertion_order() {
    init_logging();
    let store = entries(&[4, 2, 4, 4, 1, 4, 9, 4]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
        assert_valid(&tree);
    }

    let walked: Vec<NonNull<RbNode>> = tree.iter().collect();
    let fours: Vec<_> = walked.iter().copied().filter(|&n| key_of(n) == 4).collect();
    let expected: Vec<_> = store.iter().filter(|e| e.key == 4).map(Entry::link).collect();
    assert_eq!(fours, expected);

    // every duplicate is found by identity, and a stranger with the same key is not
    for e in &store {
        assert!(tree.contains(e.link()));
    }
    let stranger = Entry::new(4);
    assert!(!tree.contains(stranger.link()));

    // removing one duplicate leaves the others alone
    unsafe { tree.remove(store[3].link()) };
    assert_valid(&tree);
    assert!(!tree.contains(store[3].link()));
    for (i, e) in store.iter().enumerate() {
        assert_eq!(tree.contains(e.link()), i != 3);
    }
}

#[test]
fn lifo_comparator_puts_new_equals_first() {
    init_logging();
    let store = entries(&[3, 3, 1, 3, 5, 3]);
    let mut tree = RbTree::new(lifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
        assert_valid(&tree);
    }

    let threes: Vec<_> = tree.iter().filter(|&n| key_of(n) == 3).collect();
    let mut expected: Vec<_> = store.iter().filter(|e| e.key == 3).map(Entry::link).collect();
    expected.reverse();
    assert_eq!(threes, expected);

    for e in &store {
        assert!(tree.contains(e.link()));
    }
    for e in &store {
        unsafe { tree.remove(e.link()) };
        assert_valid(&tree);
        assert!(!tree.contains(e.link()));
    }
    assert!(tree.is_empty());
}

#[test]
fn many_duplicates() {
    init_logging();
    let keys: Vec<i32> = shuffled(300, 3).into_iter().map(|k| k % 5).collect();
    let store = entries(&keys);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    assert_valid(&tree);

    for e in store.iter().rev() {
        assert!(tree.contains(e.link()));
        unsafe { tree.remove(e.link()) };
        assert!(!tree.contains(e.link()));
        assert_valid(&tree);
    }
    assert!(tree.is_empty());
}

#[test]
fn removing_a_stranger_changes_nothing() {
    init_logging();
    let store = entries(&[1, 2, 3, 4, 5, 6, 7]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    let root = tree.root();

    let stranger = Entry::new(4);
    let outsider = Entry::new(100);
    unsafe {
        tree.remove(stranger.link());
        tree.remove(outsider.link());
    }

    assert_eq!(tree.root(), root);
    assert_eq!(keys_in_order(&mut tree), [1, 2, 3, 4, 5, 6, 7]);
    assert_valid(&tree);
}

#[test]
fn iteration_is_fused_and_restartable_per_call() {
    init_logging();
    let store = entries(&[2, 1, 3]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }

    let mut it = tree.iter();
    assert_eq!(it.next().map(key_of), Some(1));
    assert_eq!(it.next().map(key_of), Some(2));
    assert_eq!(it.next().map(key_of), Some(3));
    assert_eq!(it.next(), None);
    assert_eq!(it.next(), None);

    // a new walk starts from the beginning again
    assert_eq!(keys_in_order(&mut tree), [1, 2, 3]);

    let mut seen = Vec::new();
    for node in &mut tree {
        seen.push(key_of(node));
    }
    assert_eq!(seen, [1, 2, 3]);
}

#[test]
fn walk_visits_in_order() {
    init_logging();
    let store = entries(&shuffled(64, 9));
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }

    let mut visited = Vec::new();
    tree.walk(|node| visited.push(key_of(node)));
    assert_eq!(visited, (0..64).collect::<Vec<_>>());
}

#[test]
fn clear_forgets_members() {
    init_logging();
    let store = entries(&[3, 1, 2]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    assert!(tree.max_depth() >= 2);

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.max_depth(), 0);
    assert!(!tree.contains(store[0].link()));

    // the nodes can go straight back in
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    assert_eq!(keys_in_order(&mut tree), [1, 2, 3]);
}

#[test]
fn ascending_inserts_stay_balanced() {
    init_logging();
    let store = entries(&(0..1000).collect::<Vec<_>>());
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    let black_height = tree.validate().expect("valid tree");
    assert!(black_height >= 5);
    assert!(tree.max_depth() <= 2 * black_height);
}

#[test]
fn validate_reports_broken_trees() {
    init_logging();
    let store = entries(&[2, 1, 3]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    assert_eq!(tree.validate(), Ok(1));

    // 2 is the black root with two red children
    let root = unsafe { tree.root().expect("non-empty").as_ref() };
    root.set_color(Color::Red);
    assert_eq!(tree.validate(), Err(InvariantViolation::RedRoot));

    root.set_color(Color::Black);
    store[1].node.set_color(Color::Black);
    assert_eq!(tree.validate(), Err(InvariantViolation::BlackHeight { expected: 2, found: 1 }));
    store[1].node.set_color(Color::Red);
    assert_eq!(tree.validate(), Ok(1));
}

#[test]
fn validate_catches_red_red_edges() {
    init_logging();
    let store = entries(&[2, 1, 3, 4]);
    let mut tree = RbTree::new(fifo);
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    // the aunt recolor left 2, 1 and 3 black, with 4 red under 3
    assert_eq!(tree.validate(), Ok(2));
    assert!(store[2].node.is_black());
    assert!(!store[3].node.is_black());

    store[2].node.set_color(Color::Red);
    assert_eq!(tree.validate(), Err(InvariantViolation::RedRed { node: store[2].link() }));

    store[2].node.set_color(Color::Black);
    assert_eq!(tree.validate(), Ok(2));
}

#[test]
fn validate_catches_misordered_members() {
    init_logging();
    let flipped = Cell::new(false);
    let store = entries(&[2, 1, 3]);
    let mut tree = RbTree::new(|a: NonNull<RbNode>, b: NonNull<RbNode>| {
        if flipped.get() { key_of(b) < key_of(a) } else { key_of(a) < key_of(b) }
    });
    for e in &store {
        unsafe { tree.insert(e.link()) };
    }
    assert_eq!(tree.validate(), Ok(1));

    flipped.set(true);
    assert_eq!(
        tree.validate(),
        Err(InvariantViolation::OutOfOrder { prev: store[1].link(), next: store[0].link() })
    );

    flipped.set(false);
    assert_eq!(tree.validate(), Ok(1));
}

#[test]
fn validate_catches_overlong_paths() {
    init_logging();
    let keys: Vec<i32> = (0..=MAX_DEPTH as i32).rev().collect();
    let chain = entries(&keys);
    for pair in chain.windows(2) {
        pair[0].node.reset();
        pair[0].node.set_child(crate::Side::Left, Some(pair[1].link()));
    }
    if let Some(last) = chain.last() {
        last.node.reset();
    }

    // an all-black left spine one node longer than any real tree can get
    let mut tree = RbTree::new(fifo);
    tree.root = Some(chain[0].link());
    assert_eq!(tree.validate(), Err(InvariantViolation::TooDeep));

    tree.clear();
    assert_eq!(tree.validate(), Ok(0));
}
