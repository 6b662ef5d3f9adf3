//! Metadata command handler.
//!
//! Opens a short-lived session against the configured provider.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use cachewatch_axum::ProviderSettings;
use cachewatch_metadata::{HttpProviderTransport, SessionManager, SessionState};

use crate::commands::MetadataCommand;

/// Execute a metadata subcommand.
pub async fn execute(settings: Option<ProviderSettings>, command: MetadataCommand) -> Result<()> {
    let settings = settings.context("No metadata provider configured (set --provider-url)")?;
    let transport = HttpProviderTransport::new(&settings.config)?;
    let session = SessionManager::new(Arc::new(transport));

    let state = match &settings.credentials {
        Some(credentials) => {
            session
                .connect_with_backoff(settings.backoff, credentials)
                .await?
        }
        None => session.connect().await?,
    };

    match command {
        MetadataCommand::Status => print_state(&state),
        MetadataCommand::Lookup { id } => {
            if !state.is_authenticated() {
                return Err(anyhow!(
                    "Lookup needs an authenticated session (set --provider-user and --provider-password)"
                ));
            }
            match session.lookup(id).await? {
                Some(app) => match app.kind {
                    Some(kind) => println!("{}\t{}\t{kind}", app.app_id, app.name),
                    None => println!("{}\t{}", app.app_id, app.name),
                },
                None => println!("No metadata for app {id}"),
            }
        }
    }

    session.disconnect().await;
    Ok(())
}

fn print_state(state: &SessionState) {
    match state {
        SessionState::Disconnected => println!("disconnected"),
        SessionState::Connecting => println!("connecting"),
        SessionState::Connected {
            authenticated_as: Some(user),
        } => println!("connected (authenticated as {user})"),
        SessionState::Connected {
            authenticated_as: None,
        } => println!("connected (not authenticated)"),
        SessionState::Faulted(fault) => println!("faulted: {}", fault.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_provider() {
        let err = execute(None, MetadataCommand::Status).await.unwrap_err();
        assert!(err.to_string().contains("--provider-url"));
    }
}
