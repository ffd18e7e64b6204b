//! The mapping engine: transforms between the vendor schema and ZGW.
//!
//! Three layers:
//!
//! - [`rules`] — the declarative field correspondence machinery: dot-path
//!   [`MappingRule`]s with optional coercion and value translation.
//!   Rule application is pure and total; a missing source field leaves the
//!   target unset and never errors.
//! - [`forward`] — vendor → ZGW: casetype mapping with phase/result
//!   fan-out, case mapping with status/role/property fan-in.
//! - [`reverse`] — ZGW → vendor: case payload assembly with file and
//!   subject fan-in.
//!
//! All engine behavior that used to be implicit (skeleton defaults,
//! translation tables, decision-title detection) lives in an explicit
//! [`MappingConfig`] handed to the engine at construction.

pub mod classify;
pub mod config;
pub mod forward;
pub mod reverse;
pub mod rules;
pub mod translate;

pub use classify::{Classification, classify};
pub use config::MappingConfig;
pub use forward::{ForwardMapper, external_id_of};
pub use reverse::{ReverseMapper, strip_for_create, strip_for_update};
pub use rules::{Coerce, MappingRule};
pub use translate::{TranslationEntry, TranslationTable};
