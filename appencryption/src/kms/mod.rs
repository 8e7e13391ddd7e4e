//! Key Management Service implementations for the application encryption library
//!
//! This module provides implementations for encrypting and decrypting system keys:
//!
//! - Static KMS for testing and development (using a static master key)
//! - Custom KMS implementations can be added by implementing the KeyManagementService trait

mod static_kms;

pub use static_kms::StaticKeyManagementService;