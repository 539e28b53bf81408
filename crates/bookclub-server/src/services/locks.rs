use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = HashMap<Uuid, Arc<Mutex<()>>>;

/// One async mutex per club.
///
/// Holding the guard serializes a read/decide/write sequence against every
/// other sequence on the same club. Different clubs never contend. An entry
/// lives only while some task holds or waits for it.
#[derive(Clone, Default)]
pub struct ClubLocks {
    locks: Arc<StdMutex<LockMap>>,
}

/// Exclusive hold on one club. Dropping it releases the club and forgets the
/// entry once nobody else is waiting.
pub struct ClubGuard {
    guard: Option<OwnedMutexGuard<()>>,
    club_id: Uuid,
    locks: Arc<StdMutex<LockMap>>,
}

impl ClubLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, club_id: Uuid) -> ClubGuard {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(club_id)
            .or_default()
            .clone();

        ClubGuard {
            guard: Some(lock.lock_owned().await),
            club_id,
            locks: self.locks.clone(),
        }
    }

    /// Number of clubs with a live entry
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for ClubGuard {
    fn drop(&mut self) {
        // Release first so our own reference no longer counts
        drop(self.guard.take());

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&self.club_id) {
            // Waiters clone the Arc under this map lock, so a count of one means
            // the map holds the only reference.
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.club_id);
            }
        }
    }
}
