pub mod config;
pub mod error;
pub mod panel;
pub mod render;
pub mod routes;
pub mod routing;
pub mod session;
pub mod transit;
pub mod util;
