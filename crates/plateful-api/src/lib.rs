pub mod auth;
pub mod claims;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod stats;
