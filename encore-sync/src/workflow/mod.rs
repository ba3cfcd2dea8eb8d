//! Sync workflow
//!
//! - [`ingestion`]: per-entity fetch, persist, portrait and voice downloads
//! - [`run_coordinator`]: the full pass and its CHANGED/UNCHANGED outcome
//! - [`enrichment`]: roster upgrade materials over persisted records

pub mod enrichment;
pub mod ingestion;
pub mod run_coordinator;

pub use enrichment::{EnrichmentReport, RosterEnricher};
pub use ingestion::IngestionOrchestrator;
pub use run_coordinator::{RunCoordinator, RunOutcome, RunPhase, RunSummary};
