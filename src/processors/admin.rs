//! Admin Assignment Processors
//!
//! Pins specific pool entries to specific identities ahead of a launch. The
//! admin gate itself lives in the HTTP layer; these operations trust their caller.

use log::info;
use serde::Serialize;
use solana_program::pubkey::Pubkey;
use std::sync::Arc;

use crate::{
    constants::MAX_ALLOCATION_ROUNDS,
    error::LaunchError,
    state::{EntryFilter, KeypairStore},
    types::{KeypairState, KeypairView},
    utils::validate_assignment_note,
};

/// One page of the public "next address" queue.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QueuePage {
    pub entries: Vec<KeypairView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

pub struct AdminAssignments {
    store: Arc<dyn KeypairStore>,
}

impl AdminAssignments {
    pub fn new(store: Arc<dyn KeypairStore>) -> Self {
        Self { store }
    }

    /// Pins `address` to `identity`.
    ///
    /// Only general-pool entries can be pinned. Re-assigning to the same
    /// identity just replaces the note.
    pub async fn assign(
        &self,
        address: &Pubkey,
        identity: &Pubkey,
        note: Option<String>,
    ) -> Result<KeypairView, LaunchError> {
        validate_assignment_note(note.as_deref())?;

        for _ in 0..MAX_ALLOCATION_ROUNDS {
            let entry = self
                .store
                .get(address)
                .await?
                .ok_or(LaunchError::KeypairNotFound { mint: *address })?;

            match (entry.state, entry.assigned_to) {
                (KeypairState::Used, _) => return Err(LaunchError::AlreadyUsed { mint: *address }),
                (_, Some(current)) if current != *identity => {
                    return Err(LaunchError::AlreadyAssigned {
                        mint: *address,
                        assigned_to: current,
                    })
                }
                (KeypairState::Reserved, _) => {
                    return Err(LaunchError::AssignmentConflict {
                        mint: *address,
                        reason: "reserved by an in-flight creation".into(),
                    })
                }
                _ => {}
            }

            let next = entry.assigned(*identity, note.clone());
            if self.store.compare_and_swap(&entry, &next).await? {
                info!("Assigned {} to {}", address, identity);
                return Ok(next.view());
            }
        }
        Err(LaunchError::AssignmentConflict {
            mint: *address,
            reason: "entry is changing concurrently, retry".into(),
        })
    }

    /// Removes a pin. An unpinned entry is left untouched.
    pub async fn unassign(&self, address: &Pubkey) -> Result<KeypairView, LaunchError> {
        for _ in 0..MAX_ALLOCATION_ROUNDS {
            let entry = self
                .store
                .get(address)
                .await?
                .ok_or(LaunchError::KeypairNotFound { mint: *address })?;
            if entry.state == KeypairState::Used {
                return Err(LaunchError::AlreadyUsed { mint: *address });
            }
            if entry.assigned_to.is_none() {
                return Ok(entry.view());
            }
            let next = entry.unassigned();
            if self.store.compare_and_swap(&entry, &next).await? {
                info!("Unassigned {}", address);
                return Ok(next.view());
            }
        }
        Err(LaunchError::AssignmentConflict {
            mint: *address,
            reason: "entry is changing concurrently, retry".into(),
        })
    }

    /// Pins held by `identity` that have not been consumed yet.
    pub async fn list_assignments(&self, identity: &Pubkey) -> Result<Vec<KeypairView>, LaunchError> {
        let entries = self
            .store
            .scan(EntryFilter::AssignedTo(*identity), 0, usize::MAX)
            .await?;
        Ok(entries
            .iter()
            .filter(|e| e.state != KeypairState::Used)
            .map(|e| e.view())
            .collect())
    }

    /// General-pool entries in queue order.
    pub async fn list_queue(&self, offset: usize, limit: usize) -> Result<QueuePage, LaunchError> {
        let entries = self.store.scan(EntryFilter::OpenPool, offset, limit).await?;
        let total = self.store.count(EntryFilter::OpenPool).await?;
        Ok(QueuePage {
            entries: entries.iter().map(|e| e.view()).collect(),
            total,
            offset,
            limit,
        })
    }
}
