use crate::auth::store::StoreError;

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown login or wrong password.
    #[error("invalid user/password")]
    InvalidCredentials,

    /// Ticket does not name a redeemable account.
    #[error("invalid ticket")]
    InvalidTicket,

    /// Credential or session store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
