//! API key checks shared by the gateways.

use std::env;

/// Compares a provided API key with the expected one.
#[allow(clippy::result_large_err)]
pub fn check_api_key(provided_key: &str, expected_key: &str) -> Result<(), tonic::Status> {
    if expected_key.is_empty() {
        return Err(tonic::Status::internal("API_KEY is empty"));
    }
    if provided_key == expected_key {
        Ok(())
    } else {
        Err(tonic::Status::unauthenticated("Invalid API key"))
    }
}

/// Validates the provided API key against the expected API key from environment.
///
/// Returns `Ok(())` if the key is valid, or an error if invalid or missing.
#[allow(clippy::result_large_err)]
pub fn validate_api_key(provided_key: &str) -> Result<(), tonic::Status> {
    let expected_key = env::var("API_KEY")
        .map_err(|_| tonic::Status::internal("API_KEY not set in environment"))?;
    check_api_key(provided_key, &expected_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_key() {
        assert!(check_api_key("secret", "secret").is_ok());
        let err = check_api_key("guess", "secret").expect_err("wrong key");
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
        let err = check_api_key("", "").expect_err("unset key");
        assert_eq!(err.code(), tonic::Code::Internal);
    }
}
