//! Provider tags identifying which storage account holds a document payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed label of the storage account that handled a given upload.
///
/// The tag stored on a document must match the account actually used:
/// deletion dispatches on it to pick the credentials for remote cleanup.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum ProviderTag {
    /// Small-files storage account (uploads under 10 MiB).
    ImagekitSmall,

    /// Main storage account (10 MiB up to the hard ceiling).
    ImagekitLarge,

    /// Externally hosted link; no payload was uploaded by this service.
    External,
}

impl ProviderTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTag::ImagekitSmall => "imagekit-small",
            ProviderTag::ImagekitLarge => "imagekit-large",
            ProviderTag::External => "external",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
