//! Common test utilities for API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use cwmp_api::{create_router_with_state, ServerState};
use cwmp_devices::{InteractionBridge, MockTransport, TopicScheme};
use tower::ServiceExt;

pub const GET_PARAMETER_VALUES_XML: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap:Header><cwmp:ID soap:mustUnderstand="1">42</cwmp:ID></soap:Header>
  <soap:Body>
    <cwmp:GetParameterValuesResponse>
      <ParameterList>
        <ParameterValueStruct>
          <Name>Device.DeviceInfo.SerialNumber</Name>
          <Value xsi:type="xsd:string">ABC123</Value>
        </ParameterValueStruct>
      </ParameterList>
    </cwmp:GetParameterValuesResponse>
  </soap:Body>
</soap:Envelope>"#;

pub const ADD_OBJECT_JSON: &str =
    r#"{"Body": {"AddObjectResponse": {"InstanceNumber": 2, "Status": 0}}}"#;

pub const SET_PARAMETER_VALUES_XML: &str = r#"<Envelope><Body><SetParameterValuesResponse><Status>0</Status></SetParameterValuesResponse></Body></Envelope>"#;

/// Router backed by `transport`.
pub fn create_test_router(transport: &MockTransport) -> Router {
    let bridge = InteractionBridge::new(Arc::new(transport.clone()), TopicScheme::default());
    create_router_with_state(ServerState::new(Arc::new(bridge)))
}

pub async fn post(router: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn post_with_request_id(
    router: Router,
    uri: &str,
    request_id: &str,
    body: impl Into<Body>,
) -> Response<Body> {
    router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("x-request-id", request_id)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(router: Router, uri: &str) -> Response<Body> {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn content_type(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

pub fn request_id(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
}
