//! Non-blocking admission control for service calls.
//!
//! Each class of work has a fixed number of slots. A call either takes a
//! slot immediately or is rejected; nothing ever queues. A capacity of
//! zero makes the class permanently saturated.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The admission class a call is charged against.
///
/// Uploads and downloads share the `Transfer` class; directory listings
/// have their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionClass {
    Transfer,
    List,
}

/// A held admission slot. Dropping the permit releases the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

/// Fixed-capacity admission gate over the service's call classes.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    transfer: Arc<Semaphore>,
    list: Arc<Semaphore>,
}

impl AdmissionGate {
    pub fn new(transfer_capacity: usize, list_capacity: usize) -> Self {
        Self {
            transfer: Arc::new(Semaphore::new(transfer_capacity)),
            list: Arc::new(Semaphore::new(list_capacity)),
        }
    }

    fn class(&self, class: AdmissionClass) -> &Arc<Semaphore> {
        match class {
            AdmissionClass::Transfer => &self.transfer,
            AdmissionClass::List => &self.list,
        }
    }

    /// Try to take a slot in the given class without waiting.
    ///
    /// Returns `None` when the class is saturated.
    pub fn try_acquire(&self, class: AdmissionClass) -> Option<AdmissionPermit> {
        self.class(class)
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }

    /// Number of free slots currently available in the given class.
    pub fn available(&self, class: AdmissionClass) -> usize {
        self.class(class).available_permits()
    }
}
