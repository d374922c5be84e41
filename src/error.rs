use solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Broad classes used to decide how a failure is surfaced and whether the
/// caller may retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The keypair pool has nothing to hand out right now
    Exhaustion,
    /// The client's window to complete the flow has closed; restart from prepare
    Expiry,
    /// Permanent for the given input
    Conflict,
    /// The chain or the RPC node rejected or lost the transaction
    Chain,
    /// Malformed request, never touches the pool
    Validation,
    /// Identity missing or not allowed
    Authorization,
    /// Storage or transport hiccup
    Transient,
    /// A bug or a misconfigured signer
    Internal,
}

/// Errors raised by the persistent stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Backend(String),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Record already exists: {0}")]
    AlreadyExists(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Errors raised by the network collaborator before classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The node or the runtime rejected the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// No confirmation arrived in time
    #[error("Timed out waiting for confirmation")]
    Timeout,

    /// The request never reached the node
    #[error("RPC transport failure: {0}")]
    Transport(String),
}

impl ChainError {
    /// Maps a raw network failure onto the launch error taxonomy by message content.
    ///
    /// Order matters: node messages for an expired blockhash are wrapped in a
    /// "simulation failed" envelope, so the blockhash and funds checks run first.
    pub fn classify(&self) -> LaunchError {
        let message = match self {
            ChainError::Timeout => return LaunchError::SubmissionTimeout,
            ChainError::Transport(m) => {
                let lower = m.to_lowercase();
                if lower.contains("timed out") || lower.contains("timeout") {
                    return LaunchError::SubmissionTimeout;
                }
                return LaunchError::NetworkFailure { message: m.clone() };
            }
            ChainError::Rejected(m) => m,
        };

        let lower = message.to_lowercase();
        let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.contains("blockhashnotfound") || compact.contains("blockhashexpired") {
            LaunchError::BlockhashExpired
        } else if compact.contains("insufficientfunds") || compact.contains("insufficientlamports") {
            LaunchError::InsufficientFunds { message: message.clone() }
        } else if lower.contains("timed out") || lower.contains("timeout") {
            LaunchError::SubmissionTimeout
        } else {
            LaunchError::SimulationFailed { message: message.clone() }
        }
    }
}

/// Error type for every launch pipeline operation.
///
/// Each variant has a stable numeric code, a string code for HTTP clients and
/// an [`ErrorClass`] that drives retry and status mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("No mint keypairs available, retry shortly")]
    NoAvailableKeypairs,

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("A token with {field} '{value}' was launched recently ({existing_mint})")]
    DuplicateToken {
        field: String,
        value: String,
        existing_mint: Pubkey,
    },

    #[error("Reservation for {mint} expired or was released")]
    KeypairExpired { mint: Pubkey },

    #[error("Transaction blockhash expired, prepare a new transaction")]
    BlockhashExpired,

    #[error("Project session for {mint} expired")]
    ProjectSessionExpired { mint: Pubkey },

    #[error("Keypair {mint} is already assigned to {assigned_to}")]
    AlreadyAssigned { mint: Pubkey, assigned_to: Pubkey },

    #[error("Keypair {mint} cannot be assigned: {reason}")]
    AssignmentConflict { mint: Pubkey, reason: String },

    #[error("Keypair {mint} has already been used")]
    AlreadyUsed { mint: Pubkey },

    #[error("Keypair {mint} not found")]
    KeypairNotFound { mint: Pubkey },

    #[error("Keypair {mint} is not reserved")]
    NotReserved { mint: Pubkey },

    #[error("Invalid launch configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Insufficient funds: {message}")]
    InsufficientFunds { message: String },

    #[error("Simulation failed: {message}")]
    SimulationFailed { message: String },

    #[error("Submission timed out before confirmation")]
    SubmissionTimeout,

    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("Missing or invalid wallet identity")]
    Unauthorized,

    #[error("Admin privileges required")]
    Forbidden,

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Signing failed: {reason}")]
    Signing { reason: String },
}

impl LaunchError {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        LaunchError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns a unique error code for each error variant.
    ///
    /// Codes are part of the public response contract and must stay stable.
    pub fn error_code(&self) -> u32 {
        match self {
            LaunchError::NoAvailableKeypairs => 2001,
            LaunchError::RateLimited { .. } => 2002,
            LaunchError::DuplicateToken { .. } => 2003,
            LaunchError::KeypairExpired { .. } => 2004,
            LaunchError::BlockhashExpired => 2005,
            LaunchError::ProjectSessionExpired { .. } => 2006,
            LaunchError::AlreadyAssigned { .. } => 2007,
            LaunchError::AssignmentConflict { .. } => 2008,
            LaunchError::AlreadyUsed { .. } => 2009,
            LaunchError::KeypairNotFound { .. } => 2010,
            LaunchError::NotReserved { .. } => 2011,
            LaunchError::InvalidConfig { .. } => 2012,
            LaunchError::InsufficientFunds { .. } => 2013,
            LaunchError::SimulationFailed { .. } => 2014,
            LaunchError::SubmissionTimeout => 2015,
            LaunchError::NetworkFailure { .. } => 2016,
            LaunchError::Validation { .. } => 2017,
            LaunchError::InvalidSignature { .. } => 2018,
            LaunchError::Unauthorized => 2019,
            LaunchError::Forbidden => 2020,
            LaunchError::Storage(_) => 2021,
            LaunchError::Signing { .. } => 2022,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LaunchError::NoAvailableKeypairs | LaunchError::RateLimited { .. } => ErrorClass::Exhaustion,
            LaunchError::KeypairExpired { .. }
            | LaunchError::BlockhashExpired
            | LaunchError::ProjectSessionExpired { .. } => ErrorClass::Expiry,
            LaunchError::DuplicateToken { .. }
            | LaunchError::AlreadyAssigned { .. }
            | LaunchError::AssignmentConflict { .. }
            | LaunchError::AlreadyUsed { .. }
            | LaunchError::KeypairNotFound { .. }
            | LaunchError::NotReserved { .. } => ErrorClass::Conflict,
            LaunchError::InsufficientFunds { .. }
            | LaunchError::SimulationFailed { .. }
            | LaunchError::SubmissionTimeout
            | LaunchError::NetworkFailure { .. } => ErrorClass::Chain,
            LaunchError::InvalidConfig { .. }
            | LaunchError::Validation { .. }
            | LaunchError::InvalidSignature { .. } => ErrorClass::Validation,
            LaunchError::Unauthorized | LaunchError::Forbidden => ErrorClass::Authorization,
            LaunchError::Storage(_) => ErrorClass::Transient,
            LaunchError::Signing { .. } => ErrorClass::Internal,
        }
    }

    /// Whether the same request (or a fresh prepare) can reasonably succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LaunchError::NoAvailableKeypairs
                | LaunchError::RateLimited { .. }
                | LaunchError::KeypairExpired { .. }
                | LaunchError::BlockhashExpired
                | LaunchError::ProjectSessionExpired { .. }
                | LaunchError::SubmissionTimeout
                | LaunchError::NetworkFailure { .. }
                | LaunchError::Storage(_)
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            LaunchError::NoAvailableKeypairs => 503,
            LaunchError::RateLimited { .. } => 429,
            LaunchError::DuplicateToken { .. } => 409,
            LaunchError::KeypairExpired { .. } | LaunchError::BlockhashExpired => 410,
            LaunchError::ProjectSessionExpired { .. } => 400,
            LaunchError::AlreadyAssigned { .. }
            | LaunchError::AssignmentConflict { .. }
            | LaunchError::AlreadyUsed { .. }
            | LaunchError::NotReserved { .. } => 409,
            LaunchError::KeypairNotFound { .. } => 404,
            LaunchError::InvalidConfig { .. } => 400,
            LaunchError::InsufficientFunds { .. } => 402,
            LaunchError::SimulationFailed { .. } => 400,
            LaunchError::SubmissionTimeout => 504,
            LaunchError::NetworkFailure { .. } => 502,
            LaunchError::Validation { .. } | LaunchError::InvalidSignature { .. } => 400,
            LaunchError::Unauthorized => 401,
            LaunchError::Forbidden => 403,
            LaunchError::Storage(_) => 503,
            LaunchError::Signing { .. } => 500,
        }
    }

    /// String code returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            LaunchError::NoAvailableKeypairs => "SERVICE_UNAVAILABLE",
            LaunchError::RateLimited { .. } => "RATE_LIMITED",
            LaunchError::DuplicateToken { .. } => "DUPLICATE_TOKEN",
            LaunchError::KeypairExpired { .. } => "KEYPAIR_EXPIRED",
            LaunchError::BlockhashExpired => "BLOCKHASH_EXPIRED",
            LaunchError::ProjectSessionExpired { .. } => "EXPIRED",
            LaunchError::AlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            LaunchError::AssignmentConflict { .. } => "CONFLICT",
            LaunchError::AlreadyUsed { .. } => "ALREADY_USED",
            LaunchError::KeypairNotFound { .. } => "NOT_FOUND",
            LaunchError::NotReserved { .. } => "NOT_RESERVED",
            LaunchError::InvalidConfig { .. } => "INVALID_CONFIG",
            LaunchError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LaunchError::SimulationFailed { .. } => "SIMULATION_FAILED",
            LaunchError::SubmissionTimeout => "SUBMISSION_TIMEOUT",
            LaunchError::NetworkFailure { .. } => "NETWORK_ERROR",
            LaunchError::Validation { .. } => "VALIDATION_ERROR",
            LaunchError::InvalidSignature { .. } => "INVALID_SIGNATURE",
            LaunchError::Unauthorized => "UNAUTHORIZED",
            LaunchError::Forbidden => "FORBIDDEN",
            LaunchError::Storage(_) => "STORAGE_UNAVAILABLE",
            LaunchError::Signing { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<ChainError> for LaunchError {
    fn from(e: ChainError) -> Self {
        e.classify()
    }
}
