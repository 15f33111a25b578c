//! Ambient account switching
//!
//! Calculators receive the target account explicitly. Some collaborators only
//! read "the current account" though, so calculators whose output varies by
//! the user context run with the ambient identity switched to the target.
//! [`SwitchGuard`] restores it when dropped, on every exit path.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};
use warden_core::Account;

/// Identifies one `switch_to` so exactly that switch can be undone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchToken(u64);

impl SwitchToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Collaborator holding the ambient ("currently authenticated") account
pub trait AccountSwitcher: Send + Sync {
    fn current(&self) -> Account;

    fn switch_to(&self, account: Account) -> SwitchToken;

    /// Undo the switch identified by `token`; switches made after it stay in effect
    fn switch_back(&self, token: SwitchToken);
}

/// Switcher keeping one stack of switches per thread on top of the caller's account.
///
/// Permission calculation never awaits while a switch is active, so a
/// thread-local view keeps concurrent resolutions from seeing each other's
/// target account.
pub struct InMemoryAccountSwitcher {
    caller: Account,
    next_token: AtomicU64,
    switches: Mutex<HashMap<ThreadId, Vec<(SwitchToken, Account)>>>,
}

impl InMemoryAccountSwitcher {
    pub fn new(caller: Account) -> Self {
        Self {
            caller,
            next_token: AtomicU64::new(1),
            switches: Mutex::new(HashMap::new()),
        }
    }

    /// Number of switches in effect on the calling thread
    pub fn depth(&self) -> usize {
        self.switches
            .lock()
            .get(&thread::current().id())
            .map_or(0, Vec::len)
    }
}

impl AccountSwitcher for InMemoryAccountSwitcher {
    fn current(&self) -> Account {
        self.switches
            .lock()
            .get(&thread::current().id())
            .and_then(|stack| stack.last())
            .map_or_else(|| self.caller.clone(), |(_, account)| account.clone())
    }

    fn switch_to(&self, account: Account) -> SwitchToken {
        let token = SwitchToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.switches
            .lock()
            .entry(thread::current().id())
            .or_default()
            .push((token, account));
        token
    }

    fn switch_back(&self, token: SwitchToken) {
        let mut switches = self.switches.lock();
        let thread = thread::current().id();

        // A guard may have been moved to another thread before dropping
        let owner = if switches.get(&thread).is_some_and(|stack| stack.iter().any(|(t, _)| *t == token)) {
            Some(thread)
        } else {
            switches
                .iter()
                .find(|(_, stack)| stack.iter().any(|(t, _)| *t == token))
                .map(|(owner, _)| *owner)
        };

        let Some(owner) = owner else {
            warn!("switch_back called with unknown token {:?}", token);
            return;
        };

        if let Some(stack) = switches.get_mut(&owner) {
            stack.retain(|(t, _)| *t != token);
            if stack.is_empty() {
                switches.remove(&owner);
            }
        }
    }
}

/// Restores the ambient account on drop
#[must_use = "the previous account is restored as soon as the guard is dropped"]
pub struct SwitchGuard<'a> {
    switcher: &'a dyn AccountSwitcher,
    token: Option<SwitchToken>,
}

impl<'a> SwitchGuard<'a> {
    /// Switch to `target` unless it already is the ambient account
    pub fn switch_to(switcher: &'a dyn AccountSwitcher, target: &Account) -> Self {
        if switcher.current().id == target.id {
            return Self::inactive(switcher);
        }

        debug!("Switching ambient account to {}", target.id);
        let token = switcher.switch_to(target.clone());
        Self {
            switcher,
            token: Some(token),
        }
    }

    /// Guard that does nothing on drop
    pub fn inactive(switcher: &'a dyn AccountSwitcher) -> Self {
        Self { switcher, token: None }
    }

    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.switcher.switch_back(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_on_drop() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        {
            let guard = SwitchGuard::switch_to(&switcher, &Account::new(2));
            assert!(guard.is_active());
            assert_eq!(switcher.current().id.0, 2);
        }
        assert_eq!(switcher.current().id.0, 1);
        assert_eq!(switcher.depth(), 0);
    }

    #[test]
    fn test_no_switch_for_same_account() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        let guard = SwitchGuard::switch_to(&switcher, &Account::new(1));
        assert!(!guard.is_active());
        assert_eq!(switcher.depth(), 0);
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        fn failing(switcher: &InMemoryAccountSwitcher) -> Result<(), String> {
            let _guard = SwitchGuard::switch_to(switcher, &Account::new(9));
            Err("calculator failed".to_string())?;
            Ok(())
        }

        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        assert!(failing(&switcher).is_err());
        assert_eq!(switcher.current().id.0, 1);
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = SwitchGuard::switch_to(&switcher, &Account::new(9));
            panic!("calculator panicked");
        }));
        assert!(result.is_err());
        assert_eq!(switcher.current().id.0, 1);
    }

    #[test]
    fn test_unknown_token_keeps_caller() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        switcher.switch_back(SwitchToken::new(42));
        assert_eq!(switcher.current().id.0, 1);
        assert_eq!(switcher.depth(), 0);
    }

    #[test]
    fn test_depth_counts_nested_switches() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        assert_eq!(switcher.depth(), 0);

        let outer = SwitchGuard::switch_to(&switcher, &Account::new(2));
        let inner = SwitchGuard::switch_to(&switcher, &Account::new(3));
        assert_eq!(switcher.depth(), 2);

        drop(inner);
        drop(outer);
        assert_eq!(switcher.depth(), 0);
    }

    #[test]
    fn test_out_of_order_drop_keeps_later_switch() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        let first = SwitchGuard::switch_to(&switcher, &Account::new(7));
        let second = SwitchGuard::switch_to(&switcher, &Account::new(8));

        drop(first);
        assert_eq!(switcher.current().id.0, 8);
        assert_eq!(switcher.depth(), 1);

        drop(second);
        assert_eq!(switcher.current().id.0, 1);
        assert_eq!(switcher.depth(), 0);
    }

    #[test]
    fn test_threads_see_their_own_switch() {
        let switcher = InMemoryAccountSwitcher::new(Account::new(1));
        let barrier = std::sync::Barrier::new(2);

        std::thread::scope(|scope| {
            for target in [7_u64, 8] {
                let switcher = &switcher;
                let barrier = &barrier;
                scope.spawn(move || {
                    let _guard = SwitchGuard::switch_to(switcher, &Account::new(target));
                    barrier.wait();
                    assert_eq!(switcher.current().id.0, target);
                    barrier.wait();
                });
            }
        });

        assert_eq!(switcher.current().id.0, 1);
    }
}
