//! External collaborators for skyhaul trip planning.
//!
//! Provides:
//! - [`AdvisoryOracle`]: "which delivery should fly" hints and drone-leg time
//!   predictions, over HTTP or computed in-process
//! - [`PolylineProvider`]: road geometry for the truck tour from an
//!   OSRM-compatible directions service
//!
//! Every call here is best-effort. Callers treat an [`AdvisorError`] as "no
//! hint" and keep planning locally.

pub mod directions;
pub mod error;
pub mod features;
pub mod http;
pub mod oracle;
pub mod outlier;

pub use directions::{DirectionsBackend, DirectionsClient, PolylineProvider};
pub use error::AdvisorError;
pub use features::{DroneLegFeatures, DroneSummary};
pub use http::HttpAdvisorClient;
pub use oracle::{AdvisorBackend, AdvisoryOracle};
pub use outlier::{find_outlier_position, OutlierAdvisor};
