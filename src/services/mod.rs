//! Long-running services and their lifecycle
//!
//! Each [`Service`] spawns its tasks in `start` and watches the shared
//! shutdown [`Notify`]. The [`ServiceManager`] starts services by ascending
//! priority and stops them in reverse.

mod health;
pub mod implementations;

pub use health::ServiceHealth;

use crate::config::Config;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// How long `stop_all` waits for each task to finish
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait Service: Send + Sync {
    /// Unique service identifier
    fn name(&self) -> &'static str;

    /// Lower starts earlier and stops later
    fn priority(&self) -> i32 {
        100
    }

    fn is_enabled(&self, _config: &Config) -> bool {
        true
    }

    async fn initialize(&mut self) -> Result<(), String> {
        Ok(())
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String>;

    async fn stop(&mut self) -> Result<(), String> {
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        ServiceHealth::Healthy
    }
}

pub struct ServiceManager {
    services: Vec<Box<dyn Service>>,
    handles: HashMap<&'static str, Vec<JoinHandle<()>>>,
    shutdown: Arc<Notify>,
    config: Config,
}

impl ServiceManager {
    pub fn new(config: Config) -> Self {
        Self {
            services: Vec::new(),
            handles: HashMap::new(),
            shutdown: Arc::new(Notify::new()),
            config,
        }
    }

    pub fn register(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    /// Shared shutdown signal handed to every service
    pub fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Start all enabled services in priority order
    pub async fn start_all(&mut self) -> Result<(), String> {
        self.services.sort_by_key(|s| s.priority());

        for service in self.services.iter_mut() {
            let name = service.name();
            if !service.is_enabled(&self.config) {
                logger::info(LogTag::System, &format!("Service disabled: {}", name));
                continue;
            }

            logger::debug(LogTag::System, &format!("Initializing service: {}", name));
            service.initialize().await?;

            let handles = service
                .start(self.shutdown.clone())
                .await
                .map_err(|e| format!("Failed to start {}: {}", name, e))?;
            self.handles.insert(name, handles);

            logger::info(LogTag::System, &format!("Service started: {}", name));
        }

        Ok(())
    }

    /// Signal shutdown and stop running services in reverse priority order
    pub async fn stop_all(&mut self) -> Result<(), String> {
        logger::info(LogTag::System, "Stopping all services...");
        self.shutdown.notify_waiters();

        for service in self.services.iter_mut().rev() {
            let name = service.name();
            let handles = match self.handles.remove(name) {
                Some(handles) => handles,
                None => continue,
            };

            if let Err(e) = service.stop().await {
                logger::warning(
                    LogTag::System,
                    &format!("Service stop error for {}: {}", name, e),
                );
            }

            for handle in handles {
                if tokio::time::timeout(STOP_TIMEOUT, handle).await.is_err() {
                    logger::warning(
                        LogTag::System,
                        &format!("Service {} did not stop within {:?}", name, STOP_TIMEOUT),
                    );
                }
            }

            logger::info(LogTag::System, &format!("Service stopped: {}", name));
        }

        Ok(())
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.services
            .iter()
            .map(|s| s.name())
            .filter(|name| self.handles.contains_key(name))
            .collect()
    }

    pub async fn get_health(&self) -> HashMap<&'static str, ServiceHealth> {
        let mut health = HashMap::new();
        for service in &self.services {
            health.insert(service.name(), service.health().await);
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        priority: i32,
        enabled: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn is_enabled(&self, _config: &Config) -> bool {
            self.enabled
        }

        async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            let notified = shutdown.notified_owned();
            Ok(vec![tokio::spawn(notified)])
        }

        async fn stop(&mut self) -> Result<(), String> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_priority_order_and_shutdown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        for (name, priority, enabled) in [("web", 30, true), ("prices", 10, true), ("off", 20, false)] {
            manager.register(Box::new(Recorder {
                name,
                priority,
                enabled,
                log: log.clone(),
            }));
        }

        manager.start_all().await.unwrap();
        assert_eq!(manager.running_services(), vec!["prices", "web"]);

        manager.stop_all().await.unwrap();
        assert!(manager.running_services().is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start prices", "start web", "stop web", "stop prices"]
        );
    }
}
