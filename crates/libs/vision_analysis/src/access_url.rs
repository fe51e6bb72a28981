use crate::AccessUrlError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const SAS_VERSION: &str = "2020-12-06";
const READ_PERMISSION: &str = "r";
const BLOB_RESOURCE: &str = "b";

/// A privately stored image, addressed inside the configured storage account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub container: String,
    pub blob: String,
}

impl BlobLocation {
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
        }
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.blob)
    }
}

/// Supplies a time-limited, read-only url for a private image.
#[async_trait]
pub trait AccessUrlIssuer: Send + Sync {
    async fn issue(&self, location: &BlobLocation) -> Result<String, AccessUrlError>;
}

/// Signs blob service SAS urls with the storage account's shared key.
pub struct SasUrlIssuer {
    account_name: String,
    signing_key: HmacSha256,
    blob_endpoint: Url,
    validity: chrono::Duration,
}

impl SasUrlIssuer {
    /// `account_key` is the base64 key as shown in the storage account.
    pub fn new(
        account_name: &str,
        account_key: &str,
        blob_endpoint: &str,
        validity: Duration,
    ) -> Result<Self, AccessUrlError> {
        let account_key = general_purpose::STANDARD
            .decode(account_key.trim())
            .map_err(|e| AccessUrlError::InvalidAccountKey(e.to_string()))?;
        if account_key.is_empty() {
            return Err(AccessUrlError::InvalidAccountKey("key is empty".to_string()));
        }
        let signing_key = HmacSha256::new_from_slice(&account_key)
            .map_err(|e| AccessUrlError::InvalidAccountKey(e.to_string()))?;
        let blob_endpoint = Url::parse(blob_endpoint)?;
        let validity = chrono::Duration::from_std(validity)
            .map_err(|_| AccessUrlError::InvalidValidity(validity))?;
        Ok(Self {
            account_name: account_name.to_string(),
            signing_key,
            blob_endpoint,
            validity,
        })
    }

    /// Signed url valid from `starts_on` until `starts_on + validity`.
    pub fn issue_at(
        &self,
        location: &BlobLocation,
        starts_on: DateTime<Utc>,
    ) -> Result<Url, AccessUrlError> {
        let start = sas_timestamp(starts_on);
        let expiry = sas_timestamp(starts_on + self.validity);
        let string_to_sign = self.string_to_sign(location, &start, &expiry);
        let signature = self.sign(&string_to_sign);

        let mut url = self.blob_url(location)?;
        url.query_pairs_mut()
            .append_pair("sv", SAS_VERSION)
            .append_pair("st", &start)
            .append_pair("se", &expiry)
            .append_pair("sr", BLOB_RESOURCE)
            .append_pair("sp", READ_PERMISSION)
            .append_pair("sig", &signature);
        Ok(url)
    }

    fn blob_url(&self, location: &BlobLocation) -> Result<Url, AccessUrlError> {
        let mut url = self.blob_endpoint.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|()| AccessUrlError::CannotBeABase(self.blob_endpoint.to_string()))?
            .pop_if_empty()
            .push(&location.container)
            .extend(location.blob.split('/'));
        Ok(url)
    }

    fn string_to_sign(&self, location: &BlobLocation, start: &str, expiry: &str) -> String {
        let canonicalized_resource = format!(
            "/blob/{}/{}/{}",
            self.account_name, location.container, location.blob
        );
        [
            READ_PERMISSION,
            start,
            expiry,
            &canonicalized_resource,
            "", // signed identifier
            "", // signed ip
            "", // signed protocol
            SAS_VERSION,
            BLOB_RESOURCE,
            "", // snapshot time
            "", // encryption scope
            "", // rscc
            "", // rscd
            "", // rsce
            "", // rscl
            "", // rsct
        ]
        .join("\n")
    }

    fn sign(&self, string_to_sign: &str) -> String {
        let mut mac = self.signing_key.clone();
        mac.update(string_to_sign.as_bytes());
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl AccessUrlIssuer for SasUrlIssuer {
    async fn issue(&self, location: &BlobLocation) -> Result<String, AccessUrlError> {
        let url = self.issue_at(location, Utc::now())?;
        debug!(
            "Issued read-only url for {}/{} valid for {} minutes",
            location.container,
            location.blob,
            self.validity.num_minutes()
        );
        Ok(url.into())
    }
}

fn sas_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
