pub mod error;
pub mod provider;
pub mod resolver;
pub mod service;

pub use error::RoutingError;
pub use provider::OsrmProvider;
pub use resolver::{GeometryResolver, GeometrySink, Outcome, Provenance, ResolvedGeometry};
pub use service::RoutingProvider;
