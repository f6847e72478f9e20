//! Off-chain JSON document referenced by `Metadata.uri`.

use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_URI_LENGTH;
use crate::errors::StorefrontError;

const URI_SCHEMES: [&str; 4] = ["https", "http", "ipfs", "ar"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffChainMetadata {
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub properties: Properties,
}

/// Trait values are strings or numbers in the wild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub files: Vec<File>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub creators: Vec<FileCreator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub uri: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCreator {
    pub address: String,
    pub share: u8,
}

impl OffChainMetadata {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            msg!("Off-chain metadata rejected: {}", e);
            error!(StorefrontError::InvalidOffChainMetadata)
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|_| error!(StorefrontError::InvalidOffChainMetadata))
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&serde_json::Value> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }
}

/// Accept only non-empty URIs with a scheme wallets can resolve.
pub fn check_metadata_uri(uri: &str) -> Result<()> {
    require!(!uri.is_empty(), StorefrontError::InvalidMetadataUri);
    require!(uri.len() <= MAX_URI_LENGTH, StorefrontError::MetadataFieldTooLong);

    let (scheme, rest) = uri
        .split_once("://")
        .ok_or(StorefrontError::InvalidMetadataUri)?;
    require!(
        URI_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) && !rest.is_empty(),
        StorefrontError::InvalidMetadataUri
    );
    Ok(())
}
