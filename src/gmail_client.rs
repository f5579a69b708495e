use anyhow::{Context, Result};
use google_gmail1::{api, hyper, hyper_rustls, oauth2, Gmail};
use log::{debug, info};

use crate::config::GmailConfig;
use crate::error::TriageError;
use crate::mailbox::{Mailbox, RawHeader, RawMessage, RawPart};

/// Gmail implementation of the `Mailbox` trait, restricted to the modify
/// scope (read, label, trash — no send, no permanent delete).
pub struct GmailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>,
}

impl GmailClient {
    pub async fn new(config: &GmailConfig) -> Result<Self> {
        info!("Connecting to Gmail API via OAuth2");

        // Read OAuth2 client credentials from file
        let secret = oauth2::read_application_secret(&config.credentials_path)
            .await
            .context("Unable to read OAuth2 client credentials file")?;

        // Create authenticator with token persistence: a cached token is
        // reused across runs and refreshed transparently when expired
        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(&config.token_cache_path)
        .build()
        .await
        .context("Unable to create OAuth2 authenticator")?;

        // Create HTTP client
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);

        let hub = Gmail::new(client, auth);

        info!("✅ Gmail API connection established successfully");

        Ok(GmailClient { hub })
    }
}

impl Mailbox for GmailClient {
    async fn list_recent_message_ids(&self, limit: usize) -> Result<Vec<String>, TriageError> {
        debug!("Listing the {} most recent messages", limit);

        let user_id = "me";

        let result = self
            .hub
            .users()
            .messages_list(user_id)
            .max_results(limit as u32)
            .add_scope(api::Scope::Modify)
            .doit()
            .await
            .map_err(|e| map_api_error(e, "listing recent messages"))?;

        let message_ids: Vec<String> = result
            .1
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id)
            .take(limit)
            .collect();

        info!("Found {} recent message(s)", message_ids.len());

        Ok(message_ids)
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage, TriageError> {
        debug!("Retrieving full message for ID: {}", id);

        let user_id = "me";

        let result = self
            .hub
            .users()
            .messages_get(user_id, id)
            .format("full")
            .add_scope(api::Scope::Modify)
            .doit()
            .await
            .map_err(|e| map_api_error(e, &format!("retrieving message {}", id)))?;

        Ok(raw_message_from_api(result.1, id))
    }

    async fn trash_message(&self, id: &str) -> Result<(), TriageError> {
        debug!("Moving message {} to trash", id);

        let user_id = "me";

        self.hub
            .users()
            .messages_trash(user_id, id)
            .add_scope(api::Scope::Modify)
            .doit()
            .await
            .map_err(|e| map_api_error(e, &format!("trashing message {}", id)))?;

        info!("🗑️ Message {} moved to trash", id);

        Ok(())
    }
}

/// Flatten the API's message shape into our `RawMessage`. The API client has
/// already reversed the URL-safe base64 transport encoding of body data.
fn raw_message_from_api(message: api::Message, requested_id: &str) -> RawMessage {
    let id = message.id.unwrap_or_else(|| requested_id.to_string());
    let size_estimate = message.size_estimate.unwrap_or(0).max(0) as u64;

    let payload = message.payload.unwrap_or_default();
    let payload_mime_type = payload.mime_type.unwrap_or_default();

    let headers = payload
        .headers
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some(RawHeader { name, value }),
            _ => None,
        })
        .collect();

    let parts: Vec<RawPart> = payload
        .parts
        .unwrap_or_default()
        .into_iter()
        .map(|p| RawPart {
            mime_type: p.mime_type.unwrap_or_default(),
            data: p.body.and_then(|b| b.data),
        })
        .collect();

    let body = payload.body.map(|b| RawPart {
        mime_type: payload_mime_type,
        data: b.data,
    });

    RawMessage {
        id,
        headers,
        parts,
        body,
        size_estimate,
    }
}

/// Map a Gmail API error onto the run's failure taxonomy: 404 means the id
/// vanished (skip-and-continue), 401/403 or a missing token is an auth
/// failure, everything else is a transport problem.
fn map_api_error(err: google_gmail1::Error, context: &str) -> TriageError {
    use google_gmail1::Error as ApiError;

    match &err {
        ApiError::BadRequest(value) => {
            match value.pointer("/error/code").and_then(|c| c.as_i64()) {
                Some(404) => TriageError::NotFound(context.to_string()),
                Some(401) | Some(403) => TriageError::Auth(format!("{}: {}", context, err)),
                _ => TriageError::Network(format!("{}: {}", context, err)),
            }
        }
        ApiError::Failure(response) => match response.status().as_u16() {
            404 => TriageError::NotFound(context.to_string()),
            401 | 403 => TriageError::Auth(format!("{}: HTTP {}", context, response.status())),
            status => TriageError::Network(format!("{}: HTTP {}", context, status)),
        },
        ApiError::MissingToken(_) | ApiError::MissingAPIKey => {
            TriageError::Auth(format!("{}: {}", context, err))
        }
        _ => TriageError::Network(format!("{}: {}", context, err)),
    }
}
