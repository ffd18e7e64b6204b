//! Data-synchronization bridge between a ZGW case registry and the xxllnc
//! case-management API.
//!
//! The bridge keeps two systems of record in step: it pulls casetypes and
//! cases from the vendor API into local ZGW-shaped objects, and pushes
//! local cases (with their documents) back. Every mapping runs through a
//! durable external-id index, so repeating a sync pass converges instead
//! of duplicating.
//!
//! # Core Components
//!
//! - [`SyncEngine`] - Batch and single-record sync drivers
//! - [`ObjectStore`] - Trait for pluggable local persistence
//! - [`VendorClient`] - Trait over the vendor HTTP API
//! - [`SyncIndex`] - The idempotence ledger linking external and local ids
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use zgw_bridge::{SyncEngine, MappingConfig};
//! use zgw_bridge::store::InMemoryStore;
//! use zgw_bridge::vendor::HttpVendorClient;
//! use zgw_bridge::model::SourceId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new();
//! let vendor = HttpVendorClient::new("https://example.zaaksysteem.nl/api/v1", "api-key")?;
//! let engine = SyncEngine::new(
//!     store,
//!     vendor,
//!     MappingConfig::standard(),
//!     SourceId::new("xxllnc"),
//! );
//! let report = engine.sync_all_case_types().await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod documents;
pub mod error;
pub mod mapping;
pub mod model;
pub mod resolve;
pub mod store;
pub mod sync;
pub mod vendor;

// Re-export commonly used types for convenience
pub use bridge::{SyncEngine, SyncReport};
pub use documents::{DocumentTransfer, TransferState};
pub use error::{BridgeError, BridgeResult, MappingError, MappingResult};
pub use mapping::{Classification, ForwardMapper, MappingConfig, ReverseMapper};
pub use model::{CatalogHandle, EntityType, ExternalId, LocalId, SourceId};
pub use resolve::Resolver;
pub use store::{InMemoryStore, ObjectStore, StoreKey};
pub use sync::{SyncIndex, SyncRecord};
pub use vendor::{HttpVendorClient, MockVendorClient, VendorClient, VendorError};
