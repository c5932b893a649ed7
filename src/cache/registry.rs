use crate::cache::store::{digest, is_digest};
use crate::error::{IopipeError, IopipeResult};
use log::debug;
use url::Url;

/// Client for the remote filter registry
///
/// The registry protocol is a plain GET against `<base>/<reference>`
/// returning raw filter source bytes; no content negotiation.
pub struct FilterRegistry {
    base: Url,
    client: reqwest::blocking::Client,
}

impl FilterRegistry {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch filter source for `reference`
    ///
    /// When the reference is itself a content digest, the fetched bytes must
    /// hash back to it; a mismatch is a hard `DigestMismatch` error and the
    /// bytes are discarded, never cached. References that are not digests
    /// (aliases, `fromType/toType` lookups) carry no checkable digest.
    pub fn fetch(&self, reference: &str) -> IopipeResult<Vec<u8>> {
        let url = self
            .base
            .join(reference)
            .map_err(|e| IopipeError::ParseError {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
        debug!("fetching filter from registry: {}", url);

        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(IopipeError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes()?.to_vec();

        if is_digest(reference) {
            let computed = digest(&body);
            if computed != reference {
                return Err(IopipeError::DigestMismatch {
                    reference: reference.to_string(),
                    computed,
                });
            }
        }
        Ok(body)
    }
}
