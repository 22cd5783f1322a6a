//! qa-services: HTTP clients for quick-answer
//!
//! Implementations of the `ComputationClient` and `ImageHostingClient`
//! traits against Wolfram|Alpha and Cloudinary.

pub mod cloudinary;
pub mod wolfram;

pub use cloudinary::CloudinaryClient;
pub use wolfram::WolframClient;
