//! Response decoder tests.
//!
//! Covers XML decoding with arbitrary namespace prefixes, JSON fallback and
//! the error reported when neither encoding works.

mod common;

use common::*;
use cwmp_devices::{
    AddObjectResponse, Encoding, GetParameterAttributesResponse, GetParameterNamesResponse,
    GetParameterValuesResponse, ResponseDecoder, ResponseVariant, RpcMethod,
    SetParameterValuesResponse,
};

#[test]
fn test_xml_parameter_values() {
    let decoder = ResponseDecoder::new();
    let decoded = decoder
        .decode::<GetParameterValuesResponse>(GET_PARAMETER_VALUES_XML.as_bytes())
        .unwrap();

    assert_eq!(decoded.encoding, Encoding::Xml);
    let response = decoded.value;
    assert_eq!(response.id(), Some("1001"));
    assert_eq!(response.parameters().len(), 2);
    assert_eq!(
        response.value("Device.DeviceInfo.SoftwareVersion"),
        Some("V5R020C10S115")
    );
    assert_eq!(
        response.parameters()[1].value.kind.as_deref(),
        Some("xsd:unsignedInt")
    );
    assert_eq!(response.value("Device.Unknown"), None);
}

#[test]
fn test_json_fallback_matches_xml() {
    let decoder = ResponseDecoder::new();
    let from_xml = decoder
        .decode::<GetParameterValuesResponse>(GET_PARAMETER_VALUES_XML.as_bytes())
        .unwrap();
    let from_json = decoder
        .decode::<GetParameterValuesResponse>(GET_PARAMETER_VALUES_JSON.as_bytes())
        .unwrap();

    assert_eq!(from_json.encoding, Encoding::Json);
    assert_eq!(from_json.value, from_xml.value);
}

#[test]
fn test_xml_parameter_names() {
    let decoded = ResponseDecoder::new()
        .decode::<GetParameterNamesResponse>(GET_PARAMETER_NAMES_XML.as_bytes())
        .unwrap();

    let names: Vec<_> = decoded.value.parameters().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Device.WiFi.", "Device.WiFi.SSID.1.SSID"]);
    assert!(!decoded.value.parameters()[0].is_writable());
    assert!(decoded.value.parameters()[1].is_writable());
    assert_eq!(decoded.value.id(), None);
}

#[test]
fn test_xml_parameter_attributes() {
    let decoded = ResponseDecoder::new()
        .decode::<GetParameterAttributesResponse>(GET_PARAMETER_ATTRIBUTES_XML.as_bytes())
        .unwrap();

    let attribute = &decoded.value.parameters()[0];
    assert_eq!(attribute.notification, 2);
    assert_eq!(attribute.access_list.entries, ["Subscriber"]);
}

#[test]
fn test_xml_status_responses() {
    let decoder = ResponseDecoder::new();

    let set = decoder
        .decode::<SetParameterValuesResponse>(SET_PARAMETER_VALUES_XML.as_bytes())
        .unwrap();
    assert_eq!(set.value.status(), 1);

    let add = decoder
        .decode::<AddObjectResponse>(ADD_OBJECT_XML.as_bytes())
        .unwrap();
    assert_eq!(add.value.instance_number(), 4);
    assert_eq!(add.value.status(), 0);
}

#[test]
fn test_wrong_variant_is_rejected() {
    // An AddObject reply has no SetParameterValuesResponse element.
    let err = ResponseDecoder::new()
        .decode::<SetParameterValuesResponse>(ADD_OBJECT_XML.as_bytes())
        .unwrap_err();
    assert_eq!(err.method(), RpcMethod::SetParameterValues);
    assert_eq!(err.attempts().len(), 2);
}

#[test]
fn test_empty_payload_reports_fallback_cause() {
    let err = ResponseDecoder::new()
        .decode::<GetParameterValuesResponse>(b"")
        .unwrap_err();

    let json_cause = serde_json::from_slice::<GetParameterValuesResponse>(b"")
        .unwrap_err()
        .to_string();

    assert_eq!(err.encoding(), Encoding::Json);
    assert_eq!(err.message(), json_cause);
    assert!(err.to_string().contains(&json_cause));

    let encodings: Vec<_> = err.attempts().iter().map(|a| a.encoding).collect();
    assert_eq!(encodings, [Encoding::Xml, Encoding::Json]);
}

#[test]
fn test_truncated_payload_fails_both_attempts() {
    let truncated = &GET_PARAMETER_VALUES_XML.as_bytes()[..GET_PARAMETER_VALUES_XML.len() / 2];
    let err = ResponseDecoder::new()
        .decode::<GetParameterValuesResponse>(truncated)
        .unwrap_err();

    assert_eq!(err.encoding(), Encoding::Json);
    assert_eq!(err.attempts().len(), 2);
    assert!(!err.attempts()[0].message.is_empty());
}

#[test]
fn test_custom_strategy_order() {
    let json_only = ResponseDecoder::with_strategies(vec![Encoding::Json]).unwrap();
    let err = json_only
        .decode::<AddObjectResponse>(ADD_OBJECT_XML.as_bytes())
        .unwrap_err();
    assert_eq!(err.attempts().len(), 1);

    let json_first = ResponseDecoder::with_strategies(vec![Encoding::Json, Encoding::Xml]).unwrap();
    let decoded = json_first
        .decode::<AddObjectResponse>(ADD_OBJECT_XML.as_bytes())
        .unwrap();
    assert_eq!(decoded.encoding, Encoding::Xml);
}

#[test]
fn test_decode_variant_selects_arm() {
    let decoder = ResponseDecoder::new();

    let decoded = decoder
        .decode_variant(RpcMethod::AddObject, ADD_OBJECT_JSON.as_bytes())
        .unwrap();
    assert_eq!(decoded.encoding, Encoding::Json);
    match decoded.value {
        ResponseVariant::AddObject(response) => assert_eq!(response.instance_number(), 4),
        other => panic!("unexpected variant: {:?}", other),
    }

    let decoded = decoder
        .decode_variant(
            RpcMethod::GetParameterNames,
            GET_PARAMETER_NAMES_XML.as_bytes(),
        )
        .unwrap();
    assert_eq!(decoded.value.method(), RpcMethod::GetParameterNames);
}
