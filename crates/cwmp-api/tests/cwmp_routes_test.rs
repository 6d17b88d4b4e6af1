//! Router-level tests for the CWMP routes and health probes.

mod common;

use axum::http::StatusCode;
use common::*;
use cwmp_devices::{MockTransport, TransportError};

#[tokio::test]
async fn test_get_parameter_values_returns_raw_xml() {
    let transport = MockTransport::replying(GET_PARAMETER_VALUES_XML);
    let router = create_test_router(&transport);

    let response = post(
        router,
        "/api/device/cwmp/ABC123/getParameterValues",
        "<GetParameterValues/>",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), Some("application/xml"));
    assert_eq!(body_bytes(response).await, GET_PARAMETER_VALUES_XML.as_bytes());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].topic, "cwmp-adapter.v1.ABC123.api");
    assert_eq!(requests[0].payload, "<GetParameterValues/>".as_bytes());
}

#[tokio::test]
async fn test_json_reply_keeps_json_content_type() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/addObject", "{}").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), Some("application/json"));
    assert_eq!(body_bytes(response).await, ADD_OBJECT_JSON.as_bytes());
}

#[tokio::test]
async fn test_decoded_format() {
    let transport = MockTransport::replying(GET_PARAMETER_VALUES_XML);
    let router = create_test_router(&transport);

    let response = post(
        router,
        "/api/device/cwmp/ABC123/getParameterValues?format=decoded",
        "",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["method"], "GetParameterValues");
    assert_eq!(json["data"]["encoding"], "xml");

    let response = &json["data"]["response"];
    assert_eq!(response["Header"]["ID"], "42");
    let parameter = &response["Body"]["GetParameterValuesResponse"]["ParameterList"]
        ["ParameterValueStruct"][0];
    assert_eq!(parameter["Name"], "Device.DeviceInfo.SerialNumber");
    assert_eq!(parameter["Value"]["Type"], "xsd:string");
    assert_eq!(parameter["Value"]["Text"], "ABC123");
}

#[tokio::test]
async fn test_unknown_format_is_invalid_input() {
    let transport = MockTransport::replying(GET_PARAMETER_VALUES_XML);
    let router = create_test_router(&transport);

    let response = post(
        router,
        "/api/device/cwmp/ABC123/getParameterValues?format=yaml",
        "",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_each_route_selects_its_variant() {
    // A SetParameterValues reply only satisfies the setParameterValues route.
    let routes = [
        ("getParameterNames", StatusCode::BAD_GATEWAY),
        ("getParameterAttributes", StatusCode::BAD_GATEWAY),
        ("getParameterValues", StatusCode::BAD_GATEWAY),
        ("setParameterValues", StatusCode::OK),
        ("addObject", StatusCode::BAD_GATEWAY),
    ];

    for (segment, expected) in routes {
        let transport = MockTransport::replying(SET_PARAMETER_VALUES_XML);
        let router = create_test_router(&transport);
        let uri = format!("/api/device/cwmp/CPE1/{}", segment);

        let response = post(router, &uri, "").await;
        assert_eq!(response.status(), expected, "route {}", segment);
    }
}

#[tokio::test]
async fn test_malformed_reply_reports_all_attempts() {
    let transport = MockTransport::replying("<Envelope><Body>");
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/addObject", "").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "MALFORMED_RESPONSE");
    assert_eq!(json["error"]["details"]["method"], "AddObject");

    let attempts = json["error"]["details"]["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["encoding"], "xml");
    assert_eq!(attempts[1]["encoding"], "json");
}

#[tokio::test]
async fn test_transport_timeout_is_gateway_timeout() {
    let transport = MockTransport::failing(TransportError::Timeout(10_000));
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/getParameterNames", "").await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "DEVICE_TIMEOUT");
}

#[tokio::test]
async fn test_adapter_error_status_passthrough() {
    let transport = MockTransport::failing(TransportError::Adapter {
        code: 404,
        message: "device ABC123 is not connected".to_string(),
    });
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/getParameterNames", "").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "ADAPTER_ERROR");
}

#[tokio::test]
async fn test_disconnected_transport_is_unavailable() {
    let transport = MockTransport::failing(TransportError::NotConnected);
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/addObject", "").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "TRANSPORT_UNAVAILABLE"
    );
}

#[tokio::test]
async fn test_invalid_serial_is_rejected_before_transport() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    // `+` is an MQTT wildcard and may not appear in a topic.
    let response = post(router, "/api/device/cwmp/dev+1/addObject", "").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_DEVICE_ID");
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    let body = vec![b'a'; cwmp_api::server::MAX_REQUEST_BODY_SIZE + 1];
    let response = post(router, "/api/device/cwmp/ABC123/addObject", body).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    let response = get(router, "/api/device/cwmp/ABC123/addObject").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_request_id_echoed_on_raw_reply() {
    let transport = MockTransport::replying(GET_PARAMETER_VALUES_XML);
    let router = create_test_router(&transport);

    let response = post_with_request_id(
        router,
        "/api/device/cwmp/ABC123/getParameterValues",
        "acs-7f3a",
        "",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(request_id(&response), Some("acs-7f3a"));
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    let response = post(router, "/api/device/cwmp/ABC123/addObject", "").await;

    let id = request_id(&response).unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
}

#[tokio::test]
async fn test_request_id_in_decoded_meta() {
    let transport = MockTransport::replying(ADD_OBJECT_JSON);
    let router = create_test_router(&transport);

    let response = post_with_request_id(
        router,
        "/api/device/cwmp/ABC123/addObject?format=decoded",
        "acs-7f3a",
        "",
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["meta"]["request_id"], "acs-7f3a");
    assert_eq!(json["data"]["response"]["Body"]["AddObjectResponse"]["InstanceNumber"], 2);
}

#[tokio::test]
async fn test_request_id_in_error_body() {
    let transport = MockTransport::failing(TransportError::Timeout(10_000));
    let router = create_test_router(&transport);

    let response = post_with_request_id(
        router,
        "/api/device/cwmp/ABC123/getParameterNames",
        "acs-7f3a",
        "",
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "DEVICE_TIMEOUT");
    assert_eq!(json["error"]["request_id"], "acs-7f3a");
}

#[tokio::test]
async fn test_health_endpoints() {
    let transport = MockTransport::new();
    let router = create_test_router(&transport);

    let response = get(router.clone(), "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "cwmp-bridge");

    let response = get(router.clone(), "/api/health/live").await;
    assert_eq!(body_json(response).await["status"], "alive");

    let response = get(router, "/api/health/status").await;
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_follows_transport() {
    let transport = MockTransport::new();
    let router = create_test_router(&transport);

    let response = get(router.clone(), "/api/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["dependencies"]["transport"], "mock");

    transport.set_connected(false);
    let response = get(router, "/api/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["ready"], false);
}
