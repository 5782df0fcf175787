//! UAE number-plate rendering backend.
//!
//! The engine lives under [`plate`]: a static per-emirate layout registry,
//! a font store, a template store, the rasterizer with the pressed-metal
//! emboss effect, a per-key render cache, and PNG export. The HTTP surface
//! ([`api`]) is a thin consumer of the engine.

pub mod api;
pub mod openapi;
pub mod plate;
pub mod state;
pub mod util;
