//! Walks through the containers and storage engines.

use allocated_containers::{FixedVector, KeyWrapper, RbMap, RbSet, StackBuffer, Vector};
use allocated_containers::typenum::{U1024, U8};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Vector ===\n");
    vector_demo()?;

    println!("\n=== Red-black tree ===\n");
    tree_demo();

    println!("\n=== Map ===\n");
    map_demo();

    Ok(())
}

fn vector_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut v = Vector::new();
    for i in 0..17 {
        v.try_push(i)?;
    }
    println!("len {} capacity {}", v.len(), v.capacity());

    v.insert_n(2, 3, 100);
    v.erase_range(10..15);
    println!("after insert_n/erase_range: {:?}", v);

    // Growing past the inline buffer is fatal, so check first.
    let mut fixed = FixedVector::<u32, U8>::new_fixed();
    for i in 0..20 {
        if fixed.len() == fixed.capacity() {
            println!("fixed vector full at {} elements", fixed.len());
            break;
        }
        fixed.push(i);
    }

    let buffer = StackBuffer::<U1024>::new();
    let mut on_stack = Vector::new_in(buffer.allocator());
    let mut pushed = 0u64;
    while on_stack.try_push(pushed).is_ok() {
        pushed += 1;
    }
    println!(
        "stack buffer held {} u64s before running out ({} of {} bytes used)",
        pushed,
        buffer.used(),
        buffer.capacity()
    );

    Ok(())
}

fn tree_demo() {
    let mut tree = RbSet::new();
    for k in [5, 3, 8, 1, 4, 7, 9] {
        tree.insert(KeyWrapper(k));
    }
    println!("black height {}", tree.validate());

    tree.traverse(|node, is_left, depth| {
        let side = match is_left {
            None => "root",
            Some(true) => "left",
            Some(false) => "right",
        };
        println!(
            "{:indent$}{} {:?} ({:?})",
            "",
            side,
            node.value().0,
            node.color(),
            indent = depth * 2
        );
    });

    tree.erase(&5);
    println!("\nafter erasing 5: {:?}", tree);
    println!("\n{}", tree.to_dot());
}

fn map_demo() {
    let mut map = RbMap::new();
    map.insert(3, "three");
    map.insert(1, "one");
    map.insert(4, "four");
    if let Some(old) = map.insert(1, "ONE") {
        println!("replaced {}", old);
    }

    for (k, v) in &map {
        println!("  {} -> {}", k, v);
    }

    if let Some(v) = map.remove(&3) {
        println!("removed {}", v);
    }
    println!("final count: {}", map.len());
}
