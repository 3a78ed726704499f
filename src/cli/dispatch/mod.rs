use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
        base_url: matches
            .get_one("base-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --base-url"))?,
        auth_url: matches
            .get_one("auth-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --auth-url"))?,
        loopback_marker: matches
            .get_one("loopback-marker")
            .map(|s: &String| s.to_string()),
        preview_marker: matches
            .get_one("preview-marker")
            .map(|s: &String| s.to_string()),
    })
}
