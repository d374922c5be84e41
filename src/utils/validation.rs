//! Request validation
//!
//! Pure checks run before anything touches the pool. A request rejected here
//! never reserves a keypair.

use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::{
    constants::{
        MAX_ASSIGNMENT_NOTE_LEN, MAX_AUX_METADATA_REFS, MAX_DESCRIPTION_LEN, MAX_INITIAL_BUY_LAMPORTS, MAX_NAME_LEN,
        MAX_QUEUE_PAGE_SIZE, MAX_SYMBOL_LEN, MAX_URI_LEN,
    },
    error::LaunchError,
    types::LaunchParams,
};

/// Parses a base58 address carried in a request field.
pub fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, LaunchError> {
    Pubkey::from_str(value.trim()).map_err(|_| LaunchError::validation(field, "not a valid base58 address"))
}

/// Validates every user-supplied field of a launch.
///
/// # Arguments
/// * `params` - Launch parameters with the creator already taken from the verified identity
///
/// # Returns
/// * `Result<(), LaunchError>` - `Validation` for malformed fields, `InvalidConfig`
///   for an unsupported fee tier and protection pair
pub fn validate_launch_params(params: &LaunchParams) -> Result<(), LaunchError> {
    validate_name(&params.name)?;
    validate_symbol(&params.symbol)?;

    if params.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LaunchError::validation(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        ));
    }

    validate_uri("image_uri", &params.image_uri)?;

    if let Some(lamports) = params.initial_buy_lamports {
        if lamports == 0 {
            return Err(LaunchError::validation("initial_buy", "must be greater than zero when present"));
        }
        if lamports > MAX_INITIAL_BUY_LAMPORTS {
            return Err(LaunchError::validation(
                "initial_buy",
                format!("must be at most {} lamports", MAX_INITIAL_BUY_LAMPORTS),
            ));
        }
    }

    params.protection.validate_with(params.fee_tier)
}

pub fn validate_name(name: &str) -> Result<(), LaunchError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::validation("name", "must not be empty"));
    }
    if trimmed.len() != name.len() {
        return Err(LaunchError::validation("name", "must not start or end with whitespace"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(LaunchError::validation("name", format!("must be at most {} characters", MAX_NAME_LEN)));
    }
    if name.chars().any(char::is_control) {
        return Err(LaunchError::validation("name", "must not contain control characters"));
    }
    Ok(())
}

pub fn validate_symbol(symbol: &str) -> Result<(), LaunchError> {
    if symbol.is_empty() {
        return Err(LaunchError::validation("symbol", "must not be empty"));
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(LaunchError::validation("symbol", format!("must be at most {} characters", MAX_SYMBOL_LEN)));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LaunchError::validation("symbol", "must be ASCII letters and digits only"));
    }
    Ok(())
}

fn validate_uri(field: &str, uri: &str) -> Result<(), LaunchError> {
    if uri.is_empty() {
        return Err(LaunchError::validation(field, "must not be empty"));
    }
    if uri.len() > MAX_URI_LEN {
        return Err(LaunchError::validation(field, format!("must be at most {} characters", MAX_URI_LEN)));
    }
    if !(uri.starts_with("https://") || uri.starts_with("ipfs://") || uri.starts_with("ar://")) {
        return Err(LaunchError::validation(field, "must be an https, ipfs or ar reference"));
    }
    if uri.chars().any(char::is_whitespace) {
        return Err(LaunchError::validation(field, "must not contain whitespace"));
    }
    Ok(())
}

pub fn validate_assignment_note(note: Option<&str>) -> Result<(), LaunchError> {
    match note {
        Some(n) if n.chars().count() > MAX_ASSIGNMENT_NOTE_LEN => Err(LaunchError::validation(
            "note",
            format!("must be at most {} characters", MAX_ASSIGNMENT_NOTE_LEN),
        )),
        _ => Ok(()),
    }
}

/// Auxiliary layout/page references attached after a successful creation.
pub fn validate_aux_metadata(refs: &[String]) -> Result<(), LaunchError> {
    if refs.len() > MAX_AUX_METADATA_REFS {
        return Err(LaunchError::validation(
            "aux_metadata",
            format!("at most {} references allowed", MAX_AUX_METADATA_REFS),
        ));
    }
    for r in refs {
        validate_uri("aux_metadata", r)?;
    }
    Ok(())
}

/// Clamps a queue page request to `1..=MAX_QUEUE_PAGE_SIZE`.
pub fn page_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(MAX_QUEUE_PAGE_SIZE / 2).clamp(1, MAX_QUEUE_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeeTier, LaunchProtectionMode};

    fn params() -> LaunchParams {
        LaunchParams {
            creator: Pubkey::new_unique(),
            name: "Moon Cat".into(),
            symbol: "MCAT".into(),
            description: "a cat".into(),
            image_uri: "ipfs://bafybeigdyrzt".into(),
            initial_buy_lamports: None,
            fee_tier: FeeTier::Bps100,
            protection: LaunchProtectionMode::Off,
        }
    }

    #[test]
    fn test_valid_params_pass() {
        assert!(validate_launch_params(&params()).is_ok());
    }

    #[test]
    fn test_field_rejections() {
        let mut p = params();
        p.name = "  ".into();
        assert!(matches!(validate_launch_params(&p), Err(LaunchError::Validation { field, .. }) if field == "name"));

        let mut p = params();
        p.symbol = "M-CAT".into();
        assert!(matches!(validate_launch_params(&p), Err(LaunchError::Validation { field, .. }) if field == "symbol"));

        let mut p = params();
        p.image_uri = "http://insecure.example/img.png".into();
        assert!(validate_launch_params(&p).is_err());

        let mut p = params();
        p.initial_buy_lamports = Some(0);
        assert!(validate_launch_params(&p).is_err());

        let mut p = params();
        p.fee_tier = FeeTier::Bps25;
        p.protection = LaunchProtectionMode::Extended;
        assert!(matches!(validate_launch_params(&p), Err(LaunchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_page_limit_clamps() {
        assert_eq!(page_limit(Some(0)), 1);
        assert_eq!(page_limit(Some(10_000)), MAX_QUEUE_PAGE_SIZE);
        assert_eq!(page_limit(None), MAX_QUEUE_PAGE_SIZE / 2);
    }

    #[test]
    fn test_parse_pubkey() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkey("mint", &key.to_string()).unwrap(), key);
        assert!(parse_pubkey("mint", "not-a-key").is_err());
    }
}
