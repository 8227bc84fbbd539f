//! Stratum engine driver
//!
//! Wires the passes into a single run: chain collection, decorator
//! composition, attribute and external configuration, resolution, dependency
//! ordering and build planning. The [`Engine`] owns the run configuration and
//! the extension points; each [`Engine::run`] produces a [`RunResult`] whose
//! graph is only available when the run succeeded.

pub mod config;
pub mod configure;
pub mod engine;
pub mod outcome;

pub use config::{DecoratorConfig, EngineConfig};
pub use configure::{ConfigureContext, StructuralConfigurator};
pub use engine::Engine;
pub use outcome::{EntityDecorators, RankedItem, ResolvedGraph, RunResult};
