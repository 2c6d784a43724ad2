//! In-process serialization of runs for the same content.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use reelscore_models::ContentId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<ContentId, Slot>>>;

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

/// One async lock per content identifier currently being processed.
///
/// Entries are created on first use and removed when the last holder or
/// waiter is gone, so the map only ever holds in-flight identifiers. A
/// waiter that is cancelled before it gets the lock still counts down.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    slots: Slots,
}

/// Registration of one holder or waiter on an entry. Counts down on drop.
struct SlotUser {
    slots: Slots,
    id: ContentId,
}

/// Exclusive claim on one content identifier. Released on drop.
pub struct InFlightGuard {
    // Field order matters: the lock is released before the entry counts down.
    _lock: OwnedMutexGuard<()>,
    _user: SlotUser,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds `id`, then claim it.
    pub async fn acquire(&self, id: &ContentId) -> InFlightGuard {
        let (user, lock) = self.register(id);
        let lock = lock.lock_owned().await;
        InFlightGuard { _lock: lock, _user: user }
    }

    fn register(&self, id: &ContentId) -> (SlotUser, Arc<AsyncMutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots.entry(id.clone()).or_insert_with(|| Slot {
            lock: Arc::default(),
            users: 0,
        });
        slot.users += 1;

        let user = SlotUser {
            slots: Arc::clone(&self.slots),
            id: id.clone(),
        };
        (user, Arc::clone(&slot.lock))
    }

    /// True if some run currently holds or waits on `id`.
    pub fn is_in_flight(&self, id: &ContentId) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SlotUser {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.get_mut(&self.id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.id);
            }
        }
    }
}
