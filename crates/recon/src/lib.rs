//! `crosstally-recon` — Generic two-source tabular reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded record sets plus a parameter
//! object, returns classified results. No file IO or CLI dependencies.

pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod params;
pub mod router;
pub mod summary;
pub mod validate;

pub use engine::run;
pub use error::ReconError;
pub use model::{RecordSet, ReconResult, Row};
pub use params::ReconParams;
pub use router::{route, OutputTable};
