//! Nexus REST API (v1) payload types.
//!
//! Only the fields the cleaner needs are modelled; everything else in the
//! responses is ignored.

use chrono::{DateTime, Utc};
use nexus_cleaner_core::ImageVersion;
use serde::{Deserialize, Serialize};

/// Path of the repository listing endpoint.
pub const REPOSITORIES_PATH: &str = "/service/rest/v1/repositories";

/// Path of the component search endpoint.
pub const SEARCH_PATH: &str = "/service/rest/v1/search";

/// Path prefix of the asset endpoints.
pub const ASSETS_PATH: &str = "/service/rest/v1/assets";

/// Path prefix of the component endpoints.
pub const COMPONENTS_PATH: &str = "/service/rest/v1/components";

/// A repository as listed by `GET /service/rest/v1/repositories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name.
    pub name: String,

    /// Repository format (e.g., "docker", "maven2").
    pub format: String,

    /// Repository type ("hosted", "proxy" or "group").
    #[serde(rename = "type")]
    pub kind: String,
}

impl Repository {
    /// Returns true for hosted docker repositories, the only kind the cleaner
    /// touches.
    #[must_use]
    pub fn is_hosted_docker(&self) -> bool {
        self.format == "docker" && self.kind == "hosted"
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,

    /// Token for the next page; absent or null on the last page.
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// A component (one version of an image) returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component identifier.
    pub id: String,

    /// Repository holding the component.
    #[serde(default)]
    pub repository: String,

    /// Component format.
    #[serde(default)]
    pub format: String,

    /// Image name.
    pub name: String,

    /// Version (tag).
    #[serde(default)]
    pub version: String,

    /// Assets belonging to the component.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Component {
    /// Converts the component into an [`ImageVersion`] dated by its most
    /// recently modified asset.
    ///
    /// Returns `None` if no asset carries a modification time.
    #[must_use]
    pub fn into_image_version(self) -> Option<ImageVersion> {
        let dated = self
            .assets
            .into_iter()
            .filter_map(|asset| asset.last_modified.map(|modified| (asset.id, modified)));

        ImageVersion::from_assets(self.name, self.version, self.id, dated)
    }
}

/// A stored file (manifest, layer, ...) belonging to a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset identifier.
    pub id: String,

    /// Path inside the repository.
    #[serde(default)]
    pub path: String,

    /// Direct download URL.
    #[serde(default)]
    pub download_url: Option<String>,

    /// Last modification time.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}
