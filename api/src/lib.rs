// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup wiring
// - infrastructure: Postgres adapters
// - presentation: HTTP handlers and routing, one router per sub-app
// - application: ports, use cases and validation
// - domain: core models and business rules

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
