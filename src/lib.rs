//! Root facade crate tying the runtime core and its concrete tools
//! together for whole-gateway integration tests; `photon-cli` is the
//! user-facing binary and does not depend on this crate.

pub use photon_core as core;
pub use photon_tools as tools;
