pub mod client;
pub mod extract;
pub mod types;

pub use client::{IntentBackend, LuisClient, MockIntent};
pub use extract::extract_result;
pub use sightline_core::LuisRoute;
pub use types::{EntityGroup, IntentResult};
