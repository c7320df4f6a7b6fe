//! Result type alias for the vault

use super::errors::VaultError;

/// Result type alias for vault operations
///
/// # Examples
///
/// ```
/// use dhp_vault::domain::result::Result;
/// use dhp_vault::domain::errors::VaultError;
///
/// fn failing_function() -> Result<()> {
///     Err(VaultError::InvalidSteps(0))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VaultError>;
