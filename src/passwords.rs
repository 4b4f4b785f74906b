use crate::error::CpMigrateError;

/// Turns a password as stored by older panel releases into the form the
/// services read now.
///
/// The legacy cipher is owned by the host installation, so the engine only
/// depends on this seam.
pub trait PasswordDecoder {
    fn decode(&self, stored: &str) -> Result<String, CpMigrateError>;
}

/// For installations whose passwords are already stored in clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearTextPasswords;

impl PasswordDecoder for ClearTextPasswords {
    fn decode(&self, stored: &str) -> Result<String, CpMigrateError> {
        Ok(stored.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_text_passwords_is_identity() {
        let decoder = ClearTextPasswords;
        assert_eq!(decoder.decode("s3cret").unwrap(), "s3cret");
        assert_eq!(decoder.decode("").unwrap(), "");
    }
}
