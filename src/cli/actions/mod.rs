pub mod server;

/// Actions the CLI can dispatch.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        base_url: String,
        auth_url: String,
        loopback_marker: Option<String>,
        preview_marker: Option<String>,
    },
}
