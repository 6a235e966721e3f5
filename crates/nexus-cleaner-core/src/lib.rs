//! # Nexus Cleaner Core
//!
//! Domain model and retention policies for pruning container image versions
//! stored in a Sonatype Nexus Repository Manager.
//!
//! This crate is free of I/O. It provides:
//!
//! - [`ImageVersion`] - One version of an image, stamped with the time its
//!   newest asset was last modified
//! - [`RetentionPolicy`] - Keep-last / older-than / name-filter rules
//! - [`RetentionPlan`] - The outcome of applying a policy: what is kept and
//!   what is deleted, per image
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use nexus_cleaner_core::{ImageVersion, RetentionPolicy};
//!
//! let now = Utc::now();
//! let versions = (0_i64..5).map(|i| {
//!     ImageVersion::new("api", format!("1.0.{i}"), now - Duration::days(10 - i), format!("a{i}"), format!("c{i}"))
//! });
//!
//! let plan = RetentionPolicy::new().with_keep_last(2).plan(versions, now);
//! assert_eq!(plan.deletion_count(), 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod plan;
pub mod policy;


pub use error::{Error, Result};
pub use image::{group_by_name, ImageVersion};
pub use plan::{ImagePlan, RetentionPlan};
pub use policy::{RetentionPolicy, MIN_KEEP_VERSIONS};
