//! Shared HTTP client configuration.

use std::time::Duration;

/// Header carrying the Azure resource key on every service request.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Create an HTTP client with a request timeout.
///
/// The timeout prevents hung service calls from stalling the
/// interactive session indefinitely.
pub fn create_client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_timeout() {
        let _client = create_client_with_timeout(Duration::from_secs(5));
    }
}
