use serde::Serialize;

/// Service health status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ServiceHealth {
    Healthy,

    /// Running, but the last unit of work failed
    Degraded(String),

    Unhealthy(String),

    Starting,

    Stopping,
}

impl ServiceHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceHealth::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ServiceHealth::Degraded(_))
    }
}
