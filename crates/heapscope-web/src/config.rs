pub const LISTEN_ENV: &str = "HEAPSCOPE_LISTEN";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8765";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// `host:port` the websocket endpoint binds to. Port `0` picks a free one.
    pub listen_addr: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl PublisherConfig {
    /// Reads `HEAPSCOPE_LISTEN`, falling back to `127.0.0.1:8765`.
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var(LISTEN_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into()),
        }
    }

    pub fn with_listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.listen_addr = listen_addr.into();
        self
    }
}
