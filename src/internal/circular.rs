//! Runtime detection of re-entrant initialization.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;

const MAX_DEPTH: usize = 1024;

// Keys whose initializer (or transient factory) is running on this thread.
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<ServiceKey>> = const { RefCell::new(Vec::new()) };
}

/// Marks `key` as being initialized on the current thread until dropped.
///
/// Entering a key that is already on the stack means an initializer
/// transitively requires the service it is initializing. For a singleton
/// that would block forever on its own cell, so it is reported instead.
pub(crate) struct ResolutionGuard {
    key: ServiceKey,
}

impl ResolutionGuard {
    pub(crate) fn enter(key: ServiceKey) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.contains(&key) {
                let mut path: Vec<&'static str> = stack
                    .iter()
                    .skip_while(|k| **k != key)
                    .map(ServiceKey::name)
                    .collect();
                path.push(key.name());
                return Err(DiError::Circular(path));
            }

            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let last = stack.borrow_mut().pop();
            debug_assert_eq!(last, Some(self.key));
        });
    }
}
