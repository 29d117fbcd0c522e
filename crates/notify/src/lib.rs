pub mod ntfy;
pub mod slack;

use tracing::debug;

/// # Summary
/// Builds the shared HTTP client used by the default backend clients.
///
/// # Logic
/// 1. Installs the `ring` crypto provider for rustls when none is installed yet.
/// 2. Builds a `reqwest::Client` on top of it.
pub(crate) fn http_client() -> reqwest::Client {
    if rustls::crypto::CryptoProvider::get_default().is_none()
        && rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
    {
        debug!("rustls crypto provider installed concurrently");
    }
    reqwest::Client::new()
}
