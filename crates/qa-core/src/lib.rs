//! qa-core: Core types and traits for quick-answer
//!
//! This crate resolves chat queries either through a local unit conversion
//! or by delegating to a knowledge-computation service and assembling its
//! result tree into displayable fragments.

pub mod answer;
pub mod assembler;
pub mod client;
pub mod convert;
pub mod error;
pub mod fragment;
pub mod query;
pub mod result;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use answer::Answer;
pub use assembler::{AssemblerConfig, AssemblyState, ResultAssembler};
pub use client::{ComputationClient, HostedImage, ImageHostingClient, UploadOptions};
pub use convert::{ConversionResolver, UnitConverter};
pub use error::Error;
pub use fragment::{title_link, Fragment};
pub use query::{ComputationQuery, ConversionQuery, Query, Services};
pub use result::{Pod, ResultTree, Subpod};

pub type Result<T> = std::result::Result<T, Error>;
