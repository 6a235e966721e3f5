//! Retention policies.
//!
//! A [`RetentionPolicy`] decides, per image, which versions survive a cleanup
//! run. Three modes are supported:
//!
//! - **Default** - keep the [`MIN_KEEP_VERSIONS`] newest versions of every image
//! - **Keep last** - keep the `C` newest versions of every image
//! - **Older than** - among versions outside the keep-last floor, delete only
//!   those last modified strictly before `now - D days`
//!
//! Any mode can be scoped to a set of image names.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::{group_by_name, ImageVersion};
use crate::plan::{ImagePlan, RetentionPlan};

/// Minimum number of versions per image a validated policy keeps.
pub const MIN_KEEP_VERSIONS: usize = 10;

/// Rules deciding which image versions are deleted.
///
/// # Examples
///
/// ```rust
/// use nexus_cleaner_core::RetentionPolicy;
///
/// let policy = RetentionPolicy::new()
///     .with_keep_last(20)
///     .with_older_than_days(5)
///     .with_names(["billing"]);
///
/// assert!(policy.validate().is_ok());
/// assert!(policy.matches_name("billing"));
/// assert!(!policy.matches_name("billing-worker"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Number of newest versions per image that are never deleted.
    pub keep_last: usize,

    /// Only delete versions older than this many days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub older_than_days: Option<u32>,

    /// Restrict the policy to these image names (exact match). Empty means
    /// every image.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_last: MIN_KEEP_VERSIONS,
            older_than_days: None,
            names: Vec::new(),
        }
    }
}

impl RetentionPolicy {
    /// Creates the default policy: keep the minimum required versions of every
    /// image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of newest versions kept per image.
    #[must_use]
    pub const fn with_keep_last(mut self, count: usize) -> Self {
        self.keep_last = count;
        self
    }

    /// Only deletes versions older than `days` days.
    #[must_use]
    pub const fn with_older_than_days(mut self, days: u32) -> Self {
        self.older_than_days = Some(days);
        self
    }

    /// Restricts the policy to the given image names.
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the policy is safe to run against a registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`] if fewer than [`MIN_KEEP_VERSIONS`]
    /// versions would be kept, or if a name filter entry is blank.
    pub fn validate(&self) -> Result<()> {
        if self.keep_last < MIN_KEEP_VERSIONS {
            return Err(Error::InvalidPolicy {
                reason: format!(
                    "count must be equal to or greater than {MIN_KEEP_VERSIONS} (got {})",
                    self.keep_last
                ),
            });
        }

        if self.names.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::InvalidPolicy {
                reason: "image names must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Returns true if the image is in scope of this policy.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }

    /// Returns the age threshold relative to `now`, if an age filter is set.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.older_than_days
            .map(|days| now - Duration::days(i64::from(days)))
    }

    /// Applies the policy to a listing of image versions.
    ///
    /// Versions outside the name filter are dropped. Every remaining image gets
    /// an [`ImagePlan`], even when nothing of it is deleted.
    #[must_use]
    pub fn plan<I>(&self, versions: I, now: DateTime<Utc>) -> RetentionPlan
    where
        I: IntoIterator<Item = ImageVersion>,
    {
        let cutoff = self.cutoff(now);
        let grouped = group_by_name(
            versions
                .into_iter()
                .filter(|version| self.matches_name(&version.name)),
        );

        let mut plan = RetentionPlan::new();
        for (name, versions) in grouped {
            let image = self.plan_image(name, versions, cutoff);
            debug!(
                image = %image.name,
                keep = image.keep.len(),
                delete = image.delete.len(),
                "Planned image retention"
            );
            plan.push(image);
        }

        plan
    }

    /// Splits one image's versions (sorted oldest first) into keep and delete.
    fn plan_image(
        &self,
        name: String,
        mut versions: Vec<ImageVersion>,
        cutoff: Option<DateTime<Utc>>,
    ) -> ImagePlan {
        let protected = versions.split_off(versions.len().saturating_sub(self.keep_last));

        let (delete, mut keep): (Vec<_>, Vec<_>) = versions
            .into_iter()
            .partition(|version| cutoff.map_or(true, |cutoff| version.last_modified < cutoff));

        keep.extend(protected);

        ImagePlan { name, keep, delete }
    }
}
