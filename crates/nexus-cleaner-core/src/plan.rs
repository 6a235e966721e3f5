//! Retention plans.
//!
//! A [`RetentionPlan`] is the pure result of applying a
//! [`RetentionPolicy`](crate::RetentionPolicy) to a listing. It carries no
//! connection to the registry; executing it is up to the caller.

use serde::Serialize;

use crate::image::ImageVersion;

/// Keep/delete decision for the versions of a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePlan {
    /// Image name.
    pub name: String,

    /// Versions that survive, oldest first.
    pub keep: Vec<ImageVersion>,

    /// Versions selected for deletion, oldest first.
    pub delete: Vec<ImageVersion>,
}

impl ImagePlan {
    /// Returns true if the version is not selected for deletion.
    #[must_use]
    pub fn is_kept(&self, version: &ImageVersion) -> bool {
        !self.delete.iter().any(|d| d.same_target(version))
    }

    /// Returns every version of the image, oldest first.
    #[must_use]
    pub fn versions(&self) -> Vec<&ImageVersion> {
        let mut all: Vec<&ImageVersion> = self.delete.iter().chain(&self.keep).collect();
        all.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.version.cmp(&b.version))
        });
        all
    }
}

/// Keep/delete decisions for every image in scope of a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionPlan {
    images: Vec<ImagePlan>,
}

impl RetentionPlan {
    /// Creates an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self { images: Vec::new() }
    }

    /// Adds an image to the plan.
    pub fn push(&mut self, image: ImagePlan) {
        self.images.push(image);
    }

    /// Returns the per-image plans, ordered by image name.
    #[must_use]
    pub fn images(&self) -> &[ImagePlan] {
        &self.images
    }

    /// Returns true if nothing is selected for deletion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.iter().all(|image| image.delete.is_empty())
    }

    /// Iterates over every version selected for deletion.
    pub fn deletions(&self) -> impl Iterator<Item = &ImageVersion> {
        self.images.iter().flat_map(|image| image.delete.iter())
    }

    /// Number of versions selected for deletion.
    #[must_use]
    pub fn deletion_count(&self) -> usize {
        self.images.iter().map(|image| image.delete.len()).sum()
    }

    /// Number of versions that survive.
    #[must_use]
    pub fn retained_count(&self) -> usize {
        self.images.iter().map(|image| image.keep.len()).sum()
    }
}
