use thiserror::Error;

pub const KEY_PREFIXES: [&str; 2] = ["sk-", "sk-proj-"];
pub const MIN_KEY_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No API key has been set")]
    Missing,
    #[error("API key must start with 'sk-' or 'sk-proj-'")]
    UnknownPrefix,
    #[error("API key is too short ({0} characters, need at least {MIN_KEY_LEN})")]
    TooShort(usize),
}

/// Shape check only. The provider is the one that actually authenticates the key.
pub fn validate_api_key(key: &str) -> Result<(), CredentialError> {
    if key.is_empty() {
        return Err(CredentialError::Missing);
    }
    if !KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
        return Err(CredentialError::UnknownPrefix);
    }
    let len = key.chars().count();
    if len < MIN_KEY_LEN {
        return Err(CredentialError::TooShort(len));
    }
    Ok(())
}
