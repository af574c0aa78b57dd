use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use strum::Display;

use crate::CosmosError;

/// Resource kinds that take part in the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    Dbs,
    Colls,
    Docs,
}

/// Decoded account master key
#[derive(Clone)]
pub struct MasterKey(Vec<u8>);

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

impl MasterKey {
    pub fn from_base64(key: &str) -> Result<Self, CosmosError> {
        Ok(Self(STANDARD.decode(key.trim())?))
    }

    /// Value for the `authorization` header of one request
    ///
    /// `resource_link` is the link of the resource the request addresses,
    /// e.g. `dbs/db/colls/coll` both for reading that container and for
    /// posting documents into it. `date` must be the exact `x-ms-date`
    /// header value.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: ResourceType,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type,
            resource_link,
            date.to_lowercase()
        );

        #[allow(clippy::expect_used)]
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.0)
            .expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        urlencoding::encode(&format!("type=master&ver=1.0&sig={signature}")).into_owned()
    }
}

/// RFC 1123 date as `x-ms-date` expects it
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
