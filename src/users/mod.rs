/// User profiles attached to bundle creators
pub mod service;
pub mod types;

pub use service::UserService;
pub use types::{UserLookup, UserProfile, UserUpdate};
