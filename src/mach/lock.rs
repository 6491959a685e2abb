use crate::error;
use crate::lang::Error;
use log::debug;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};

type Result<T> = std::result::Result<T, Error>;

/// ## Named locks
///
/// Shared between sessions, possibly on different threads. A lock whose
/// holder released it or went away stays `Owned` by that session until
/// someone else claims it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unowned,
    Owned(usize),
    Held(usize, usize),
}

#[derive(Debug, Default)]
pub struct NamedLocks {
    locks: Mutex<HashMap<String, LockState>>,
    released: Condvar,
}

fn poisoned<T>(_: T) -> Error {
    error!(InternalError; "LOCK TABLE POISONED")
}

impl NamedLocks {
    pub fn new() -> NamedLocks {
        NamedLocks::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<String, LockState>>> {
        self.locks.lock().map_err(poisoned)
    }

    pub fn state(&self, name: &str) -> Result<LockState> {
        Ok(self
            .table()?
            .get(name)
            .copied()
            .unwrap_or(LockState::Unowned))
    }

    /// Block until `session` holds the lock. Re-acquiring counts.
    pub fn acquire(&self, name: &str, session: usize) -> Result<()> {
        let mut table = self.table()?;
        loop {
            let state = table.get(name).copied().unwrap_or(LockState::Unowned);
            let next = match state {
                LockState::Held(owner, count) if owner == session => {
                    Some(LockState::Held(session, count + 1))
                }
                LockState::Held(..) => None,
                LockState::Unowned | LockState::Owned(_) => Some(LockState::Held(session, 1)),
            };
            match next {
                Some(next) => {
                    table.insert(name.to_string(), next);
                    return Ok(());
                }
                None => {
                    debug!("session {} waiting for lock {}", session, name);
                    table = self.released.wait(table).map_err(poisoned)?;
                }
            }
        }
    }

    pub fn release(&self, name: &str, session: usize) -> Result<()> {
        let mut table = self.table()?;
        match table.get(name).copied() {
            Some(LockState::Held(owner, count)) if owner == session => {
                let next = if count > 1 {
                    LockState::Held(session, count - 1)
                } else {
                    LockState::Owned(session)
                };
                table.insert(name.to_string(), next);
                if count == 1 {
                    self.released.notify_all();
                }
                Ok(())
            }
            _ => Err(error!(LockNotHeld; name)),
        }
    }

    /// Give up every lock held by a departing session.
    pub fn release_all(&self, session: usize) -> Result<()> {
        let mut table = self.table()?;
        let mut released = false;
        for state in table.values_mut() {
            if let LockState::Held(owner, _) = *state {
                if owner == session {
                    *state = LockState::Owned(session);
                    released = true;
                }
            }
        }
        if released {
            self.released.notify_all();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counted_hold() {
        let locks = NamedLocks::new();
        locks.acquire("A", 1).unwrap();
        locks.acquire("A", 1).unwrap();
        assert_eq!(locks.state("A"), Ok(LockState::Held(1, 2)));
        locks.release("A", 1).unwrap();
        locks.release("A", 1).unwrap();
        assert_eq!(locks.state("A"), Ok(LockState::Owned(1)));
        assert!(locks.release("A", 1).is_err());
        assert!(locks.release("B", 1).is_err());
    }

    #[test]
    fn test_waiter_claims_released_lock() {
        let locks = Arc::new(NamedLocks::new());
        locks.acquire("A", 1).unwrap();
        let waiter = {
            let locks = locks.clone();
            thread::spawn(move || locks.acquire("A", 2))
        };
        locks.release_all(1).unwrap();
        waiter.join().unwrap().unwrap();
        assert_eq!(locks.state("A"), Ok(LockState::Held(2, 1)));
    }
}
