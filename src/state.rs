//! Shared application state for all routes.

use crate::client::Client;

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    /// Force debug envelopes on every data call.
    pub debug: bool,
}

impl AppState {
    pub fn new(client: Client) -> Self {
        AppState { client, debug: false }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
