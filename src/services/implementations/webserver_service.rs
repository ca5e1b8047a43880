use crate::config::Config;
use crate::logger::{self, LogTag};
use crate::services::Service;
use crate::webserver::{self, AppState};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Hosts the HTTP API and the WebSocket event stream
pub struct WebserverService {
    state: Arc<AppState>,
    host: String,
    port: u16,
}

impl WebserverService {
    pub fn new(state: Arc<AppState>, host: String, port: u16) -> Self {
        Self { state, host, port }
    }
}

#[async_trait]
impl Service for WebserverService {
    fn name(&self) -> &'static str {
        "webserver"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.webserver.enabled && !crate::arguments::is_no_web_enabled()
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        // Bind before spawning so port errors fail startup
        let listener = webserver::bind_listener(&self.host, self.port).await?;
        let state = self.state.clone();
        let stop = shutdown.notified_owned();

        let handle = tokio::spawn(async move {
            if let Err(e) = webserver::serve(listener, state, stop).await {
                logger::error(LogTag::Webserver, &format!("Webserver failed: {}", e));
            }
        });

        Ok(vec![handle])
    }
}
