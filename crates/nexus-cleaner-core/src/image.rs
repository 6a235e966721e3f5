//! Image version model.
//!
//! Nexus stores every pushed tag of a docker image as a *component* owning
//! several *assets* (the manifest plus its layers). For retention purposes a
//! version is dated by its most recently modified asset, and that asset is the
//! one removed when the version is pruned.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single version (tag) of a container image stored in Nexus.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use nexus_cleaner_core::ImageVersion;
///
/// let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
/// let version = ImageVersion::new("billing", "2.4.1", stamp, "asset-1", "component-1");
/// assert_eq!(version.reference(), "billing:2.4.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageVersion {
    /// Image name (e.g., "team/billing").
    pub name: String,

    /// Version or tag (e.g., "2.4.1").
    pub version: String,

    /// Last modification time of the newest asset of this version.
    pub last_modified: DateTime<Utc>,

    /// Identifier of the asset the timestamp was taken from.
    pub asset_id: String,

    /// Identifier of the component owning the asset.
    pub component_id: String,
}

impl ImageVersion {
    /// Creates a new image version.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        last_modified: DateTime<Utc>,
        asset_id: impl Into<String>,
        component_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            last_modified,
            asset_id: asset_id.into(),
            component_id: component_id.into(),
        }
    }

    /// Builds an image version from the assets of one component.
    ///
    /// The newest asset (by last modification time) dates the version and
    /// becomes its [`asset_id`](Self::asset_id). Returns `None` when the
    /// component has no dated assets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use nexus_cleaner_core::ImageVersion;
    ///
    /// let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let newer = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    ///
    /// let version = ImageVersion::from_assets(
    ///     "billing",
    ///     "2.4.1",
    ///     "component-1",
    ///     [("layer", older), ("manifest", newer)],
    /// )
    /// .unwrap();
    /// assert_eq!(version.asset_id, "manifest");
    /// assert_eq!(version.last_modified, newer);
    /// ```
    #[must_use]
    pub fn from_assets<I, S>(
        name: impl Into<String>,
        version: impl Into<String>,
        component_id: impl Into<String>,
        assets: I,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = (S, DateTime<Utc>)>,
        S: Into<String>,
    {
        let (asset_id, last_modified) = assets
            .into_iter()
            .max_by_key(|(_, modified)| *modified)?;

        Some(Self::new(
            name,
            version,
            last_modified,
            asset_id,
            component_id,
        ))
    }

    /// Returns the `name:version` reference of this image version.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// Returns true if both values point at the same stored version.
    #[must_use]
    pub fn same_target(&self, other: &Self) -> bool {
        self.component_id == other.component_id && self.asset_id == other.asset_id
    }
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({})",
            self.name,
            self.version,
            self.last_modified.to_rfc3339()
        )
    }
}

/// Groups versions by image name.
///
/// Each group is sorted oldest first; versions sharing a timestamp are ordered
/// by version string so the result does not depend on listing order.
#[must_use]
pub fn group_by_name<I>(versions: I) -> BTreeMap<String, Vec<ImageVersion>>
where
    I: IntoIterator<Item = ImageVersion>,
{
    let mut grouped: BTreeMap<String, Vec<ImageVersion>> = BTreeMap::new();
    for version in versions {
        grouped.entry(version.name.clone()).or_default().push(version);
    }

    for group in grouped.values_mut() {
        group.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.version.cmp(&b.version))
        });
    }

    grouped
}
