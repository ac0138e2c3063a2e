use rand::Rng;

use allocated::CountingAllocator;

use allocated_containers::{AllocResult, KeyWrapper, RbTree, SortedVector, Vector};

fn main() -> AllocResult<()> {
    for i in 0..100 {
        let tree_alloc = CountingAllocator::default();
        let mut tree = RbTree::new_in(&tree_alloc);

        let sorted_alloc = CountingAllocator::default();
        let mut sorted = SortedVector::<u32, u32, _>::new_in(&sorted_alloc);

        let vector_alloc = CountingAllocator::default();
        let mut vector = Vector::new_in(&vector_alloc);

        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let k: u32 = rng.gen();
            let v: u32 = rng.gen();

            tree.try_insert(KeyWrapper(k))?;
            sorted.try_insert(k, v)?;
            vector.try_push(v)?;

            println!(
                "{},rbtree,{},{},{}",
                i,
                tree.len(),
                tree_alloc.n_allocations(),
                tree_alloc.n_bytes_allocated()
            );
            println!(
                "{},sorted,{},{},{}",
                i,
                sorted.len(),
                sorted_alloc.n_allocations(),
                sorted_alloc.n_bytes_allocated()
            );
            println!(
                "{},vector,{},{},{}",
                i,
                vector.len(),
                vector_alloc.n_allocations(),
                vector_alloc.n_bytes_allocated()
            );
        }

        tree.validate();

        std::mem::drop(tree);
        std::mem::drop(sorted);
        std::mem::drop(vector);

        assert_eq!(tree_alloc.net_allocations(), 0);
        assert_eq!(sorted_alloc.net_allocations(), 0);
        assert_eq!(vector_alloc.net_allocations(), 0);
    }

    Ok(())
}
