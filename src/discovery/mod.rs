//! Descriptor discovery across the search roots
//!
//! [`scan`] walks each root once, [`MetaDiscoverer`] parses every build descriptor it
//! found and [`ProjectBuilder`] turns collected units into emitter input.

pub mod discoverer;
pub mod projects;
pub mod scan;

pub use discoverer::{Discovery, MetaDiscoverer, UnitSet};
pub use projects::ProjectBuilder;
pub use scan::ScanResult;
