//! OAuth2 authentication management for Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DeleterError, Result};

/// Full mailbox scope; messages.batchDelete rejects anything narrower
pub const MAIL_SCOPE: &str = "https://mail.google.com/";

/// Where users obtain the OAuth client file
pub const CREDENTIALS_HELP_URL: &str = "https://console.cloud.google.com/apis/credentials";

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub = Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Initialize Gmail API hub with OAuth2 authentication
///
/// Runs the installed-app flow on first use (opens a browser) and persists the
/// refresh token to `token_cache_path` so later runs authenticate silently.
///
/// # Arguments
/// * `credentials_path` - Path to the OAuth2 client secret JSON file
/// * `token_cache_path` - Path where access tokens will be cached
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
) -> Result<GmailHub> {
    ensure_credentials_file(credentials_path)?;

    let secret = yup_oauth2::read_application_secret(credentials_path)
        .await
        .map_err(|e| DeleterError::AuthError(format!("Failed to read credentials: {}", e)))?;

    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| DeleterError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Fetch a token up front so an auth failure surfaces before any prompting
    let _token = auth
        .token(&[MAIL_SCOPE])
        .await
        .map_err(|e| DeleterError::AuthError(format!("Failed to obtain token: {}", e)))?;

    if token_cache_path.exists() {
        secure_token_file(token_cache_path).await?;
    }
    debug!("OAuth token cached at {:?}", token_cache_path);

    // HTTP/1 works better with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| {
                    DeleterError::AuthError(format!("Failed to load TLS roots: {}", e))
                })?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Fail with setup instructions when the client secret file is missing
pub fn ensure_credentials_file(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }

    Err(DeleterError::AuthError(format!(
        "Could not find {}. Please download this file from the \"OAuth 2.0 Client ID\" section of {} \
         (you may need to ask your Google Workspace administrator).",
        path.display(),
        CREDENTIALS_HELP_URL
    )))
}

/// Remove a cached token so the next authentication runs the full flow
pub async fn clear_token_cache(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed existing token cache at {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows relies on the profile directory ACLs
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
