//! Concurrent branch creation against one parent.

use std::sync::Arc;
use std::thread;

use story_crypto::Keypair;
use story_program::{create_branch, create_root, NodeArgs, ProgramError, Runtime};

#[test]
fn concurrent_branches_count_exactly() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 10;

    let rt = Arc::new(Runtime::in_memory());
    let owner = Keypair::generate();
    let (ix, root) =
        create_root(rt.deriver(), owner.address(), NodeArgs::new("Hub", "c", "")).unwrap();
    rt.submit(&owner, vec![ix]).unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                let author = Keypair::generate();
                for i in 0..PER_THREAD {
                    let (ix, _) = create_branch(
                        rt.deriver(),
                        author.address(),
                        root,
                        NodeArgs::new(format!("branch {t}-{i}"), "c", ""),
                    )
                    .unwrap();
                    rt.submit(&author, vec![ix]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let hub = rt.fetch_node(&root).unwrap().unwrap();
    assert_eq!(hub.children_count, (THREADS * PER_THREAD) as u64);
    assert_eq!(rt.store().scan().unwrap().len(), 1 + THREADS * PER_THREAD);
}

#[test]
fn racing_identical_mints_admit_one() {
    let rt = Arc::new(Runtime::in_memory());
    let author = Arc::new(Keypair::generate());

    let results: Vec<Result<_, ProgramError>> = (0..6)
        .map(|_| {
            let rt = Arc::clone(&rt);
            let author = Arc::clone(&author);
            thread::spawn(move || {
                let (ix, _) = create_root(
                    rt.deriver(),
                    author.address(),
                    NodeArgs::new("Contested", "c", ""),
                )?;
                rt.submit(&author, vec![ix])
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ProgramError::AccountAlreadyInUse(_))));
}
