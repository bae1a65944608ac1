//! Cancellable deferred action, advanced by the tick loop
//!
//! Holds at most one pending action. Every schedule gets a fresh handle, so a
//! caller that remembers the handle it expects can ignore stale fires.

/// Identifies one scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    handle: ActionHandle,
    remaining_ms: f64,
    payload: T,
}

/// Single-slot timer carrying a payload
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_handle: u64,
    pending: Option<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            pending: None,
        }
    }

    /// Schedule `payload` to fire after `delay_ms`, replacing anything pending
    pub fn schedule(&mut self, delay_ms: u32, payload: T) -> ActionHandle {
        let handle = ActionHandle(self.next_handle);
        self.next_handle += 1;
        if self.pending.is_some() {
            log::debug!("replacing pending action");
        }
        self.pending = Some(Pending {
            handle,
            remaining_ms: f64::from(delay_ms),
            payload,
        });
        handle
    }

    /// Drop whatever is pending. Returns true if something was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle of the pending action, if any
    pub fn pending_handle(&self) -> Option<ActionHandle> {
        self.pending.as_ref().map(|p| p.handle)
    }

    pub fn remaining_ms(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.remaining_ms.max(0.0))
    }

    /// Count down by `elapsed_ms`; yields the payload once it is due
    pub fn advance(&mut self, elapsed_ms: f64) -> Option<(ActionHandle, T)> {
        let pending = self.pending.as_mut()?;
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            pending.remaining_ms -= elapsed_ms;
        }
        if pending.remaining_ms > 0.0 {
            return None;
        }
        self.pending.take().map(|p| (p.handle, p.payload))
    }
}
