use crate::config::UpdateVerb;
use crate::error::{IopipeError, IopipeResult};
use log::debug;
use url::Url;

/// A parsed network locator for one remote resource
///
/// References supplied without an explicit scheme default to `https`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    url: Url,
}

impl ObjectReference {
    /// Parse a reference string into an object reference.
    pub fn parse(reference: &str) -> IopipeResult<Self> {
        let url = match Url::parse(reference) {
            Ok(url) => url,
            // A bare "host/path" reference parses as relative; retry with
            // the default scheme.
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&format!("https://{}", reference)).map_err(|e| {
                    IopipeError::ParseError {
                        reference: reference.to_string(),
                        message: e.to_string(),
                    }
                })?
            }
            Err(e) => {
                return Err(IopipeError::ParseError {
                    reference: reference.to_string(),
                    message: e.to_string(),
                })
            }
        };
        Ok(Self { url })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Remote object gateway: the two I/O verbs a pipeline stage needs
///
/// No retries and no timeout layer beyond the transport defaults; a failed
/// call fails the whole pipeline.
pub struct Gateway {
    client: reqwest::blocking::Client,
    update_verb: UpdateVerb,
}

impl Gateway {
    pub fn new(update_verb: UpdateVerb) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            update_verb,
        }
    }

    /// GET the resource and return its body.
    pub fn read(&self, reference: &ObjectReference) -> IopipeResult<String> {
        debug!("gateway read: {}", reference);
        let response = self.client.get(reference.as_str()).send()?;
        Self::into_body(reference, response)
    }

    /// Send `body` to the resource (POST by default, PUT per configuration)
    /// and return the response body.
    pub fn update(&self, reference: &ObjectReference, body: &str) -> IopipeResult<String> {
        debug!("gateway update: {}", reference);
        let request = match self.update_verb {
            UpdateVerb::Post => self.client.post(reference.as_str()),
            UpdateVerb::Put => self.client.put(reference.as_str()),
        };
        let response = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?;
        Self::into_body(reference, response)
    }

    fn into_body(
        reference: &ObjectReference,
        response: reqwest::blocking::Response,
    ) -> IopipeResult<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(IopipeError::Http {
                status: status.as_u16(),
                url: reference.to_string(),
            });
        }
        Ok(response.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_reference() {
        let r = ObjectReference::parse("http://example.test/resource").unwrap();
        assert_eq!(r.scheme(), "http");
        assert_eq!(r.host(), Some("example.test"));
    }

    #[test]
    fn test_parse_defaults_to_https() {
        let r = ObjectReference::parse("example.test/resource").unwrap();
        assert_eq!(r.scheme(), "https");
        assert_eq!(r.as_str(), "https://example.test/resource");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = ObjectReference::parse("http://[bad").unwrap_err();
        assert!(matches!(err, IopipeError::ParseError { .. }));
    }

    #[test]
    fn test_display_round_trips() {
        let r = ObjectReference::parse("https://example.test/a/b?c=d").unwrap();
        assert_eq!(r.to_string(), "https://example.test/a/b?c=d");
    }
}
