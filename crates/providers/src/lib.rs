//! Completion provider implementations for vidscout.
//!
//! All providers implement the `vidscout_core::Provider` trait.
//! `build_from_config` assembles the shared, admission-controlled instance.

pub mod openai_compat;
pub mod retrying;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retrying::RetryingProvider;
pub use router::{build_from_config, provider_name_for};
