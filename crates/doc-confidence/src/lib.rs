//! Confidence scoring and review routing for extracted documents.
//!
//! Upstream extraction signals are scored along seven dimensions, combined under an
//! administrator-controlled policy, classified into a confidence level, and routed to
//! auto-approval, quick review, or full review. Reviewer outcomes feed back into the
//! historical-accuracy dimension for later documents.

pub mod audit;
pub mod config;
pub mod error;
pub mod outcomes;
pub mod policy;
pub mod routing;
pub mod scoring;
pub mod service;
pub mod telemetry;

pub use outcomes::{CompanyId, FinalOutcome, InMemoryOutcomeStore, OutcomeTracker};
pub use policy::{ConfidencePolicy, PolicyDocument, PolicyError, PolicyHandle};
pub use routing::{RoutingDecider, RoutingDecision, RoutingResult};
pub use scoring::{
    ConfidenceCalculationInput, ConfidenceEngine, ConfidenceLevel, ConfidenceResult,
};
pub use service::{
    DocumentRequest, DocumentRoutingService, ProcessedDocument, RoutingServiceError,
};
