//! Engine-wide reentrancy guard

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EngineError, EngineResult};

/// Engaged/free flag around every mutating entry point
///
/// A second `enter` while the flag is engaged fails immediately instead of
/// blocking, so a collaborator calling back into the engine cannot deadlock
/// it.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    engaged: AtomicBool,
}

/// Held for the duration of one operation; releases the guard on drop
#[derive(Debug)]
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> EngineResult<GuardToken<'_>> {
        self.engaged
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| EngineError::Reentrancy)?;
        Ok(GuardToken { guard: self })
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.engaged.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_enter_rejected() {
        let guard = ReentrancyGuard::new();
        let token = guard.enter().unwrap();
        assert!(guard.is_engaged());

        assert_eq!(guard.enter().unwrap_err(), EngineError::Reentrancy);

        drop(token);
        assert!(!guard.is_engaged());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn test_released_on_early_return() {
        fn failing(guard: &ReentrancyGuard) -> EngineResult<()> {
            let _token = guard.enter()?;
            Err(EngineError::ZeroAmount)
        }

        let guard = ReentrancyGuard::new();
        assert!(failing(&guard).is_err());
        assert!(!guard.is_engaged());
    }
}
