//! Bounded mutual exclusion around the state shared by every caller.
//!
//! On target this is the equivalent of masking interrupts. Here the section
//! owns the data it protects and hands out a scoped guard, so the state can
//! only be touched while the section is held and is released on every exit
//! path.
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct CriticalSection<T> {
    inner: Mutex<T>,
}

impl<T> CriticalSection<T> {
    pub const fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Enters the section. A caller that panicked while holding it does not
    /// wedge the recorder, the state is handed over as is.
    pub fn enter(&self) -> CriticalSectionGuard<'_, T> {
        CriticalSectionGuard {
            guard: self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct CriticalSectionGuard<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for CriticalSectionGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for CriticalSectionGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_exclusive_increments() {
        let section = Arc::new(CriticalSection::new(0_u64));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let section = section.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        *section.enter() += 1;
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(*section.enter(), 4000);
    }

    #[test]
    fn test_released_after_panic() {
        let section = Arc::new(CriticalSection::new(1_u32));
        let cloned = section.clone();
        let result = std::thread::spawn(move || {
            let mut guard = cloned.enter();
            *guard = 2;
            panic!("holder panicked");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(*section.enter(), 2);
    }
}
