mod price_update_service;
#[cfg(feature = "web")]
mod webserver_service;

pub use price_update_service::PriceUpdateService;
#[cfg(feature = "web")]
pub use webserver_service::WebserverService;
