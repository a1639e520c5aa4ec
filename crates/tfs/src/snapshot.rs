//! Global coordination between mutating operations and tree snapshots.
//!
//! Any number of mutators run in parallel, isolated from each other only
//! by the per-inode lock chains. A snapshot waits for the in-flight
//! mutators to drain, excludes new ones for its whole duration, and then
//! walks the tree knowing it cannot change. Read-only lookups never
//! register here; they are pure readers and may overlap a snapshot
//! freely.

use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    running_mutators: usize,
    printing: bool,
}

#[derive(Debug, Default)]
pub struct SnapshotCoordinator {
    state: Mutex<State>,
    can_print: Condvar,
    can_mutate: Condvar,
}

impl SnapshotCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mutating operation, waiting out any snapshot in
    /// progress. Dropping the guard deregisters it, on every exit path.
    pub fn mutator(&self) -> MutatorGuard<'_> {
        let mut state = self.state.lock();
        while state.printing {
            self.can_mutate.wait(&mut state);
        }
        state.running_mutators += 1;
        MutatorGuard { coordinator: self }
    }

    /// Takes the snapshot role once every in-flight mutator has drained.
    ///
    /// The returned guard keeps the coordinator mutex for the snapshot's
    /// duration, so late mutators queue in their prologue until it
    /// drops.
    pub fn snapshot(&self) -> SnapshotGuard<'_> {
        let mut state = self.state.lock();
        while state.running_mutators > 0 {
            self.can_print.wait(&mut state);
        }
        state.printing = true;
        SnapshotGuard {
            coordinator: self,
            state: Some(state),
        }
    }

    #[cfg(test)]
    fn running_mutators(&self) -> usize {
        self.state.lock().running_mutators
    }
}

/// Registration of one in-flight mutator.
pub struct MutatorGuard<'c> {
    coordinator: &'c SnapshotCoordinator,
}

impl Drop for MutatorGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.coordinator.state.lock();
        state.running_mutators -= 1;
        self.coordinator.can_print.notify_all();
    }
}

/// Exclusive snapshot role; mutators are shut out while it lives.
pub struct SnapshotGuard<'c> {
    coordinator: &'c SnapshotCoordinator,
    state: Option<MutexGuard<'c, State>>,
}

impl Drop for SnapshotGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.printing = false;
            self.coordinator.can_mutate.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_mutator_count_follows_guards() {
        let coordinator = SnapshotCoordinator::new();
        assert_eq!(coordinator.running_mutators(), 0);
        {
            let _a = coordinator.mutator();
            let _b = coordinator.mutator();
            assert_eq!(coordinator.running_mutators(), 2);
        }
        assert_eq!(coordinator.running_mutators(), 0);
    }

    #[test]
    fn test_snapshot_waits_for_mutators() {
        let coordinator = Arc::new(SnapshotCoordinator::new());
        let snapshot_done = Arc::new(AtomicBool::new(false));

        let mutator = coordinator.mutator();

        let handle = {
            let coordinator = Arc::clone(&coordinator);
            let snapshot_done = Arc::clone(&snapshot_done);
            thread::spawn(move || {
                let _snapshot = coordinator.snapshot();
                snapshot_done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!snapshot_done.load(Ordering::SeqCst));

        drop(mutator);
        handle.join().unwrap();
        assert!(snapshot_done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_snapshot_excludes_new_mutators() {
        let coordinator = Arc::new(SnapshotCoordinator::new());
        let mutated = Arc::new(AtomicBool::new(false));

        let snapshot = coordinator.snapshot();

        let handle = {
            let coordinator = Arc::clone(&coordinator);
            let mutated = Arc::clone(&mutated);
            thread::spawn(move || {
                let _mutator = coordinator.mutator();
                mutated.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!mutated.load(Ordering::SeqCst));

        drop(snapshot);
        handle.join().unwrap();
        assert!(mutated.load(Ordering::SeqCst));
    }
}
