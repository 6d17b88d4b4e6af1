//! Response decoding with ordered encoding fallback.
//!
//! Adapters answer either with the CPE's SOAP XML or with a JSON rendering
//! of the same structure. Nothing in the reply says which, so the decoder
//! tries each configured encoding in order and keeps the first complete
//! success. Every attempt deserialises into a fresh value.

use std::fmt;

use cwmp_core::validation_err;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::cwmp::{
    AddObjectResponse, CwmpResponse, GetParameterAttributesResponse, GetParameterNamesResponse,
    GetParameterValuesResponse, ResponseVariant, RpcMethod, SetParameterValuesResponse,
};

/// Wire encodings a reply may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Xml,
    Json,
}

impl Encoding {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("xml"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// XML first, JSON as fallback.
pub const DEFAULT_STRATEGIES: [Encoding; 2] = [Encoding::Xml, Encoding::Json];

/// One failed decode attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeAttempt {
    pub encoding: Encoding,
    pub message: String,
}

/// Every configured encoding failed.
///
/// The reported cause is the last attempt's; all attempts stay available
/// through [`DecodeError::attempts`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode {method} response as {encoding}: {message}")]
pub struct DecodeError {
    method: RpcMethod,
    encoding: Encoding,
    message: String,
    attempts: Vec<DecodeAttempt>,
}

impl DecodeError {
    pub fn method(&self) -> RpcMethod {
        self.method
    }

    /// Encoding of the attempt whose failure is reported.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// All attempts in the order they were made.
    pub fn attempts(&self) -> &[DecodeAttempt] {
        &self.attempts
    }
}

/// A successfully decoded reply together with the encoding that worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub encoding: Encoding,
}

impl<T> Decoded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            encoding: self.encoding,
        }
    }
}

/// Decodes raw replies into response variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDecoder {
    strategies: Vec<Encoding>,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Self {
            strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }

    /// Use a custom attempt order. At least one encoding is required.
    pub fn with_strategies(strategies: Vec<Encoding>) -> cwmp_core::Result<Self> {
        if strategies.is_empty() {
            return Err(validation_err!("decoder needs at least one encoding"));
        }
        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[Encoding] {
        &self.strategies
    }

    pub fn decode<R: CwmpResponse>(&self, raw: &[u8]) -> Result<Decoded<R>, DecodeError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for &encoding in &self.strategies {
            match decode_as::<R>(encoding, raw) {
                Ok(value) => return Ok(Decoded { value, encoding }),
                Err(message) => {
                    debug!(
                        "{} reply is not valid {}: {}",
                        R::METHOD,
                        encoding,
                        message
                    );
                    attempts.push(DecodeAttempt { encoding, message });
                }
            }
        }

        // `with_strategies` guarantees at least one attempt was made.
        let last = attempts.last().cloned().unwrap_or(DecodeAttempt {
            encoding: Encoding::Xml,
            message: "no decode strategy configured".to_string(),
        });
        Err(DecodeError {
            method: R::METHOD,
            encoding: last.encoding,
            message: last.message,
            attempts,
        })
    }

    /// Decode into the variant selected at run time.
    pub fn decode_variant(
        &self,
        method: RpcMethod,
        raw: &[u8],
    ) -> Result<Decoded<ResponseVariant>, DecodeError> {
        match method {
            RpcMethod::GetParameterNames => self
                .decode::<GetParameterNamesResponse>(raw)
                .map(|d| d.map(CwmpResponse::into_variant)),
            RpcMethod::GetParameterAttributes => self
                .decode::<GetParameterAttributesResponse>(raw)
                .map(|d| d.map(CwmpResponse::into_variant)),
            RpcMethod::GetParameterValues => self
                .decode::<GetParameterValuesResponse>(raw)
                .map(|d| d.map(CwmpResponse::into_variant)),
            RpcMethod::SetParameterValues => self
                .decode::<SetParameterValuesResponse>(raw)
                .map(|d| d.map(CwmpResponse::into_variant)),
            RpcMethod::AddObject => self
                .decode::<AddObjectResponse>(raw)
                .map(|d| d.map(CwmpResponse::into_variant)),
        }
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_as<R: CwmpResponse>(encoding: Encoding, raw: &[u8]) -> Result<R, String> {
    match encoding {
        Encoding::Xml => {
            let normalized = strip_namespace_prefixes(raw)?;
            let text = std::str::from_utf8(&normalized).map_err(|e| e.to_string())?;
            quick_xml::de::from_str(text).map_err(|e| e.to_string())
        }
        Encoding::Json => serde_json::from_slice(raw).map_err(|e| e.to_string()),
    }
}

/// Rewrite an XML document so every element and attribute uses its local
/// name. Namespace declarations are removed.
///
/// `<soap:Envelope xmlns:soap="..."><cwmp:ID>1</cwmp:ID>` becomes
/// `<Envelope><ID>1</ID>`, and `xsi:type` becomes `type`.
pub fn strip_namespace_prefixes(xml: &[u8]) -> Result<Vec<u8>, String> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut saw_element = false;

    loop {
        let event = reader.read_event().map_err(|e| e.to_string())?;
        let event = match event {
            Event::Start(start) => {
                saw_element = true;
                Event::Start(local_start(&start)?)
            }
            Event::Empty(start) => {
                saw_element = true;
                Event::Empty(local_start(&start)?)
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().local_name().as_ref()).into_owned();
                Event::End(BytesEnd::new(name))
            }
            Event::Eof => break,
            other => other,
        };
        writer.write_event(event).map_err(|e| e.to_string())?;
    }

    if !saw_element {
        return Err("document has no root element".to_string());
    }
    Ok(writer.into_inner())
}

fn local_start(start: &BytesStart<'_>) -> Result<BytesStart<'static>, String> {
    let name = String::from_utf8_lossy(start.name().local_name().as_ref()).into_owned();
    let mut local = BytesStart::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        local.push_attribute((attr.key.local_name().as_ref(), attr.value.as_ref()));
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefixes() {
        let xml = br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-0"><soap:Header><cwmp:ID soap:mustUnderstand="1">7</cwmp:ID></soap:Header></soap:Envelope>"#;
        let out = String::from_utf8(strip_namespace_prefixes(xml).unwrap()).unwrap();
        assert_eq!(
            out,
            r#"<Envelope><Header><ID mustUnderstand="1">7</ID></Header></Envelope>"#
        );
    }

    #[test]
    fn test_strip_prefixes_keeps_escaped_text() {
        let xml = br#"<a:Value xsi:type="xsd:string">a &amp; b</a:Value>"#;
        let out = String::from_utf8(strip_namespace_prefixes(xml).unwrap()).unwrap();
        assert_eq!(out, r#"<Value type="xsd:string">a &amp; b</Value>"#);
    }

    #[test]
    fn test_strip_prefixes_rejects_non_xml() {
        assert!(strip_namespace_prefixes(b"").is_err());
        assert!(strip_namespace_prefixes(b"{\"Body\": {}}").is_err());
        assert!(strip_namespace_prefixes(b"<a><b></a>").is_err());
    }

    #[test]
    fn test_empty_strategy_list_rejected() {
        assert!(ResponseDecoder::with_strategies(Vec::new()).is_err());
        let decoder = ResponseDecoder::with_strategies(vec![Encoding::Json]).unwrap();
        assert_eq!(decoder.strategies(), &[Encoding::Json]);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(Encoding::Xml.content_type(), "application/xml");
        assert_eq!(Encoding::Json.content_type(), "application/json");
        assert_eq!(Encoding::Json.to_string(), "json");
    }
}
