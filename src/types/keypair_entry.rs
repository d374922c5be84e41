//! Keypair Pool Entry
//!
//! A pre-generated mint keypair together with its lifecycle state. Every
//! transition below returns a new revision of the entry; persisting it is the
//! store's job and always goes through a compare-and-swap on `version`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Serialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::fmt;

use crate::error::LaunchError;

/// Lifecycle of a pool entry.
///
/// ```text
/// Available ──reserve──▶ Reserved ──mark_used──▶ Used
///     ▲  │                 │  ▲
///     │  assign     release│  │reserve (pinned requester only)
///     │  ▼                 ▼  │
///     └─unassign── Assigned ◀─┘
/// ```
#[derive(BorshSerialize, BorshDeserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeypairState {
    /// In the general pool
    Available,
    /// Held by an in-flight creation
    Reserved,
    /// Pinned to one identity by an admin, not in flight
    Assigned,
    /// Terminal, the mint exists on chain
    Used,
}

impl KeypairState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeypairState::Available => "available",
            KeypairState::Reserved => "reserved",
            KeypairState::Assigned => "assigned",
            KeypairState::Used => "used",
        }
    }
}

/// One pre-generated mint keypair.
///
/// The secret half is private to the crate: it only leaves the entry as a
/// [`Keypair`] handed to the transaction assembler or the finalizer.
#[derive(BorshSerialize, BorshDeserialize, Clone, PartialEq, Eq)]
pub struct KeypairEntry {
    /// Public address, doubles as the mint address of the created token
    pub address: Pubkey,

    secret: [u8; 64],

    pub state: KeypairState,

    /// Requester holding the current reservation
    pub reserved_by: Option<Pubkey>,

    /// Unix timestamp the current reservation started
    pub reserved_at: Option<i64>,

    /// Identity pinned by an admin; survives reservation cycles
    pub assigned_to: Option<Pubkey>,

    pub assignment_note: Option<String>,

    /// Stable ordering used for the public "next address" queue
    pub queue_position: u64,

    pub used_at: Option<i64>,

    /// Revision counter, the compare-and-swap token at the storage boundary
    pub version: u64,
}

impl KeypairEntry {
    /// Creates a fresh `Available` entry from a generated keypair.
    pub fn new(keypair: &Keypair, queue_position: u64) -> Self {
        Self {
            address: keypair.pubkey(),
            secret: keypair.to_bytes(),
            state: KeypairState::Available,
            reserved_by: None,
            reserved_at: None,
            assigned_to: None,
            assignment_note: None,
            queue_position,
            used_at: None,
            version: 0,
        }
    }

    /// Rebuilds the signing keypair. Only the assembler and the finalizer call this.
    pub(crate) fn signer(&self) -> Result<Keypair, LaunchError> {
        Keypair::from_bytes(&self.secret).map_err(|e| LaunchError::Signing {
            reason: format!("stored secret for {} is unreadable: {}", self.address, e),
        })
    }

    /// True when the secret actually belongs to `address`.
    pub fn is_consistent(&self) -> bool {
        self.signer().map(|k| k.pubkey() == self.address).unwrap_or(false)
    }

    fn next_revision(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version.wrapping_add(1);
        next
    }

    /// Whether `requester` may take this entry right now.
    pub fn is_eligible_for(&self, requester: &Pubkey) -> bool {
        match self.state {
            KeypairState::Available => self.assigned_to.is_none(),
            KeypairState::Assigned => self.assigned_to.as_ref() == Some(requester),
            KeypairState::Reserved | KeypairState::Used => false,
        }
    }

    pub fn is_reservation_expired(&self, now: i64, ttl_secs: i64) -> bool {
        match (self.state, self.reserved_at) {
            (KeypairState::Reserved, Some(at)) => now >= at.saturating_add(ttl_secs),
            // A reserved entry without a timestamp can only come from a bad write
            (KeypairState::Reserved, None) => true,
            _ => false,
        }
    }

    pub fn reservation_expires_at(&self, ttl_secs: i64) -> Option<i64> {
        self.reserved_at.map(|at| at.saturating_add(ttl_secs))
    }

    pub(crate) fn reserved(&self, requester: Pubkey, now: i64) -> Self {
        let mut next = self.next_revision();
        next.state = KeypairState::Reserved;
        next.reserved_by = Some(requester);
        next.reserved_at = Some(now);
        next
    }

    /// Back to the pool; a pinned entry goes back to its pin.
    pub(crate) fn released(&self) -> Self {
        let mut next = self.next_revision();
        next.state = if next.assigned_to.is_some() {
            KeypairState::Assigned
        } else {
            KeypairState::Available
        };
        next.reserved_by = None;
        next.reserved_at = None;
        next
    }

    pub(crate) fn used(&self, now: i64) -> Self {
        let mut next = self.next_revision();
        next.state = KeypairState::Used;
        next.used_at = Some(now);
        next
    }

    pub(crate) fn assigned(&self, identity: Pubkey, note: Option<String>) -> Self {
        let mut next = self.next_revision();
        next.state = KeypairState::Assigned;
        next.assigned_to = Some(identity);
        next.assignment_note = note;
        next
    }

    pub(crate) fn unassigned(&self) -> Self {
        let mut next = self.next_revision();
        if next.state == KeypairState::Assigned {
            next.state = KeypairState::Available;
        }
        next.assigned_to = None;
        next.assignment_note = None;
        next
    }

    /// Public projection with no secret material.
    pub fn view(&self) -> KeypairView {
        KeypairView {
            address: self.address.to_string(),
            state: self.state,
            queue_position: self.queue_position,
            reserved_by: self.reserved_by.map(|k| k.to_string()),
            reserved_at: self.reserved_at,
            assigned_to: self.assigned_to.map(|k| k.to_string()),
            assignment_note: self.assignment_note.clone(),
        }
    }
}

impl fmt::Debug for KeypairEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairEntry")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .field("state", &self.state)
            .field("reserved_by", &self.reserved_by)
            .field("reserved_at", &self.reserved_at)
            .field("assigned_to", &self.assigned_to)
            .field("queue_position", &self.queue_position)
            .field("version", &self.version)
            .finish()
    }
}

/// What the outside world may see of a pool entry.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct KeypairView {
    pub address: String,
    pub state: KeypairState,
    pub queue_position: u64,
    pub reserved_by: Option<String>,
    pub reserved_at: Option<i64>,
    pub assigned_to: Option<String>,
    pub assignment_note: Option<String>,
}
