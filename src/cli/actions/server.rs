use crate::api;
use crate::cli::actions::Action;
use crate::tenant::hostname::TenantConfig;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            base_url,
            auth_url,
            loopback_marker,
            preview_marker,
        } => {
            // Fail fast on malformed connection strings and URLs; the
            // first request is too late to find out.
            Url::parse(&dsn).context("Invalid database DSN")?;
            Url::parse(&base_url).context("Invalid public base URL")?;
            Url::parse(&auth_url).context("Invalid identity provider URL")?;

            let mut config = TenantConfig::new(base_url);
            if let Some(marker) = loopback_marker {
                config = config.with_loopback_marker(marker);
            }
            if let Some(marker) = preview_marker {
                config = config.with_preview_marker(marker);
            }

            api::new(port, dsn, auth_url, config).await?;
        }
    }

    Ok(())
}
