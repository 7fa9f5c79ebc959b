pub mod network;

pub use network::{Network, NetworkBuilder, NetworkError};

pub mod transfer;

pub use transfer::{ConstrainedTransfer, Transfer, TransferConstraint, TransferPriority};

pub mod config;

pub use config::{CostParams, SearchWindowConfig, SlackProvider, TransferOptimizationConfig};

pub mod access_egress;

pub use access_egress::AccessEgress;

pub mod request;

pub use request::{PassThroughPoint, RaptorProfile, RaptorRequest, RaptorResponse, SearchDirection, SearchParams};

pub mod path;

pub use path::{PathLeg, RaptorPath, TransitLeg};

pub mod service;

pub use service::{RaptorError, RaptorService};

pub mod calculator;
pub mod cost;
pub mod raptor;
pub mod round_tracker;
pub mod search_window;
pub mod transfer_optimization;
pub mod trip_times_search;
pub mod utils;
mod multicriteria;
