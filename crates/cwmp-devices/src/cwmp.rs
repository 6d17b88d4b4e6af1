//! CWMP (TR-069) response variants.
//!
//! The bridge understands exactly five RPC responses. Each one is a SOAP
//! envelope whose body carries the method-specific payload:
//!
//! ```text
//! Envelope
//! ├─ Header (optional)  ── ID
//! └─ Body
//!    └─ <Method>Response ── method payload
//! ```
//!
//! [`CwmpResponse`] is sealed: only the five types defined here implement
//! it, so any generic call site that decodes a reply is restricted to this
//! set at compile time. [`ResponseVariant`] is the matching sum type for code
//! that selects the method at run time.
//!
//! Field names follow the CWMP schema. XML is matched on local names (see
//! [`crate::decoder`]), JSON uses the same names as keys.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod sealed {
    pub trait Sealed {}
}

/// The CWMP methods whose responses the bridge can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    GetParameterNames,
    GetParameterAttributes,
    GetParameterValues,
    SetParameterValues,
    AddObject,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 5] = [
        RpcMethod::GetParameterNames,
        RpcMethod::GetParameterAttributes,
        RpcMethod::GetParameterValues,
        RpcMethod::SetParameterValues,
        RpcMethod::AddObject,
    ];

    /// Method name as used in the CWMP schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetParameterNames => "GetParameterNames",
            Self::GetParameterAttributes => "GetParameterAttributes",
            Self::GetParameterValues => "GetParameterValues",
            Self::SetParameterValues => "SetParameterValues",
            Self::AddObject => "AddObject",
        }
    }

    /// Path segment of the HTTP route for this method.
    pub fn route_segment(&self) -> &'static str {
        match self {
            Self::GetParameterNames => "getParameterNames",
            Self::GetParameterAttributes => "getParameterAttributes",
            Self::GetParameterValues => "getParameterValues",
            Self::SetParameterValues => "setParameterValues",
            Self::AddObject => "addObject",
        }
    }

    /// Name of the body element carrying the response.
    pub fn response_element(&self) -> &'static str {
        match self {
            Self::GetParameterNames => "GetParameterNamesResponse",
            Self::GetParameterAttributes => "GetParameterAttributesResponse",
            Self::GetParameterValues => "GetParameterValuesResponse",
            Self::SetParameterValues => "SetParameterValuesResponse",
            Self::AddObject => "AddObjectResponse",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no supported method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported CWMP method '{0}'")]
pub struct UnknownMethod(pub String);

impl FromStr for RpcMethod {
    type Err = UnknownMethod;

    /// Accepts the schema name or the route segment, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// SOAP header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Request ID echoed by the CPE.
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// SOAP envelope around one method body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Envelope")]
pub struct Envelope<B> {
    #[serde(rename = "Header", default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,

    #[serde(rename = "Body")]
    pub body: B,
}

impl<B> Envelope<B> {
    pub fn new(body: B) -> Self {
        Self { header: None, body }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.header = Some(Header {
            id: Some(id.into()),
        });
        self
    }

    /// The `cwmp:ID` header value, if present.
    pub fn id(&self) -> Option<&str> {
        self.header.as_ref().and_then(|h| h.id.as_deref())
    }
}

// ============================================================================
// GetParameterNames
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(rename = "Name")]
    pub name: String,

    /// `1`/`true` when the parameter may be set.
    #[serde(rename = "Writable", default)]
    pub writable: String,
}

impl ParameterInfo {
    pub fn is_writable(&self) -> bool {
        matches!(self.writable.trim(), "1" | "true")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfoList {
    #[serde(rename = "ParameterInfoStruct", default)]
    pub items: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterNames {
    #[serde(rename = "ParameterList")]
    pub parameter_list: ParameterInfoList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterNamesBody {
    #[serde(rename = "GetParameterNamesResponse")]
    pub response: GetParameterNames,
}

// ============================================================================
// GetParameterAttributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    #[serde(rename = "string", default)]
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterAttribute {
    #[serde(rename = "Name")]
    pub name: String,

    /// 0 = off, 1 = passive, 2 = active.
    #[serde(rename = "Notification", default)]
    pub notification: u8,

    #[serde(rename = "AccessList", default)]
    pub access_list: AccessList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterAttributeList {
    #[serde(rename = "ParameterAttributeStruct", default)]
    pub items: Vec<ParameterAttribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterAttributes {
    #[serde(rename = "ParameterList")]
    pub parameter_list: ParameterAttributeList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterAttributesBody {
    #[serde(rename = "GetParameterAttributesResponse")]
    pub response: GetParameterAttributes,
}

// ============================================================================
// GetParameterValues
// ============================================================================

/// A typed parameter value.
///
/// In XML the type is the `xsi:type` attribute and the value is the element
/// text; in JSON they are the `Type` and `Text` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValue {
    #[serde(
        rename(serialize = "Type", deserialize = "@type"),
        alias = "Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    #[serde(
        rename(serialize = "Text", deserialize = "$text"),
        alias = "Text",
        default
    )]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValueStruct {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Value", default)]
    pub value: ParameterValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterValueList {
    #[serde(rename = "ParameterValueStruct", default)]
    pub items: Vec<ParameterValueStruct>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterValues {
    #[serde(rename = "ParameterList")]
    pub parameter_list: ParameterValueList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParameterValuesBody {
    #[serde(rename = "GetParameterValuesResponse")]
    pub response: GetParameterValues,
}

// ============================================================================
// SetParameterValues / AddObject
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParameterValues {
    /// 0 = applied, 1 = applied after reboot / commit.
    #[serde(rename = "Status")]
    pub status: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParameterValuesBody {
    #[serde(rename = "SetParameterValuesResponse")]
    pub response: SetParameterValues,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddObject {
    #[serde(rename = "InstanceNumber")]
    pub instance_number: u32,

    #[serde(rename = "Status")]
    pub status: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddObjectBody {
    #[serde(rename = "AddObjectResponse")]
    pub response: AddObject,
}

// ============================================================================
// Closed variant set
// ============================================================================

pub type GetParameterNamesResponse = Envelope<GetParameterNamesBody>;
pub type GetParameterAttributesResponse = Envelope<GetParameterAttributesBody>;
pub type GetParameterValuesResponse = Envelope<GetParameterValuesBody>;
pub type SetParameterValuesResponse = Envelope<SetParameterValuesBody>;
pub type AddObjectResponse = Envelope<AddObjectBody>;

/// A decoded response of one of the supported methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", content = "response")]
pub enum ResponseVariant {
    GetParameterNames(GetParameterNamesResponse),
    GetParameterAttributes(GetParameterAttributesResponse),
    GetParameterValues(GetParameterValuesResponse),
    SetParameterValues(SetParameterValuesResponse),
    AddObject(AddObjectResponse),
}

impl ResponseVariant {
    pub fn method(&self) -> RpcMethod {
        match self {
            Self::GetParameterNames(_) => RpcMethod::GetParameterNames,
            Self::GetParameterAttributes(_) => RpcMethod::GetParameterAttributes,
            Self::GetParameterValues(_) => RpcMethod::GetParameterValues,
            Self::SetParameterValues(_) => RpcMethod::SetParameterValues,
            Self::AddObject(_) => RpcMethod::AddObject,
        }
    }
}

/// A response type the bridge can decode. Sealed.
pub trait CwmpResponse:
    sealed::Sealed + DeserializeOwned + Serialize + fmt::Debug + Send + Sync + 'static
{
    /// The method this response answers.
    const METHOD: RpcMethod;

    fn into_variant(self) -> ResponseVariant;

    /// Unwrap the matching arm, `None` for any other method.
    fn from_variant(variant: ResponseVariant) -> Option<Self>;
}

macro_rules! cwmp_response {
    ($ty:ty, $arm:ident) => {
        impl sealed::Sealed for $ty {}

        impl CwmpResponse for $ty {
            const METHOD: RpcMethod = RpcMethod::$arm;

            fn into_variant(self) -> ResponseVariant {
                ResponseVariant::$arm(self)
            }

            fn from_variant(variant: ResponseVariant) -> Option<Self> {
                match variant {
                    ResponseVariant::$arm(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for ResponseVariant {
            fn from(value: $ty) -> Self {
                value.into_variant()
            }
        }
    };
}

cwmp_response!(GetParameterNamesResponse, GetParameterNames);
cwmp_response!(GetParameterAttributesResponse, GetParameterAttributes);
cwmp_response!(GetParameterValuesResponse, GetParameterValues);
cwmp_response!(SetParameterValuesResponse, SetParameterValues);
cwmp_response!(AddObjectResponse, AddObject);

// ============================================================================
// Accessors
// ============================================================================

impl Envelope<GetParameterNamesBody> {
    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.body.response.parameter_list.items
    }
}

impl Envelope<GetParameterAttributesBody> {
    pub fn parameters(&self) -> &[ParameterAttribute] {
        &self.body.response.parameter_list.items
    }
}

impl Envelope<GetParameterValuesBody> {
    pub fn parameters(&self) -> &[ParameterValueStruct] {
        &self.body.response.parameter_list.items
    }

    /// Value text of the parameter called `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.parameters()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.text.as_str())
    }
}

impl Envelope<SetParameterValuesBody> {
    pub fn status(&self) -> u8 {
        self.body.response.status
    }
}

impl Envelope<AddObjectBody> {
    pub fn instance_number(&self) -> u32 {
        self.body.response.instance_number
    }

    pub fn status(&self) -> u8 {
        self.body.response.status
    }
}
