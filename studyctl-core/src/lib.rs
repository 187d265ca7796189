//! studyctl-core: domain model for workbooks, problems, study records and quotas
//!
//! Aggregates ([`Student`], [`WorkbookAggregate`]) run against any
//! [`StudyStore`]; the server crate provides the Postgres one.

pub mod audio;
pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod quota;
pub mod store;
pub mod student;
pub mod synthesizer;
pub mod workbook;

pub use config::StudyConfig;
pub use error::{DomainError, DomainResult};
pub use memory::MemoryStore;
pub use store::{StoreError, StoreResult, StudyStore};
pub use student::Student;
pub use synthesizer::{DisabledSynthesizer, SynthesizeError, Synthesizer};
pub use workbook::WorkbookAggregate;
