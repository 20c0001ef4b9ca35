use std::sync::mpsc::Sender;

use tracing::debug;

use super::snapshot::SessionUpdate;

/// Receives session updates on the worker thread.
///
/// Returning `false` means the observer is gone and should be dropped.
pub trait SessionObserver: Send {
    fn notify(&mut self, update: &SessionUpdate) -> bool;
}

impl SessionObserver for Sender<SessionUpdate> {
    fn notify(&mut self, update: &SessionUpdate) -> bool {
        self.send(update.clone()).is_ok()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<dyn SessionObserver>)>,
}

impl Observers {
    /// Register `observer`, handing it `initial` right away.
    pub fn add(&mut self, mut observer: Box<dyn SessionObserver>, initial: &SessionUpdate) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        if observer.notify(initial) {
            self.entries.push((id, observer));
        }
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    pub fn broadcast(&mut self, update: &SessionUpdate) {
        self.entries.retain_mut(|(id, observer)| {
            let alive = observer.notify(update);
            if !alive {
                debug!(?id, "dropping disconnected observer");
            }
            alive
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
