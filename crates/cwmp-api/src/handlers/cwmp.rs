//! CWMP RPC handlers.
//!
//! Every route forwards the raw request body to the device named in the
//! path and answers with the device's reply. Each handler fixes the
//! response variant it expects, so a reply of a different method is a
//! decode failure.

use axum::{
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use cwmp_devices::{
    AddObjectResponse, CwmpResponse, Encoding, GetParameterAttributesResponse,
    GetParameterNamesResponse, GetParameterValuesResponse, Interaction, RpcMethod,
    SetParameterValuesResponse,
};
use serde::{Deserialize, Serialize};

use super::ServerState;
use crate::models::{ApiResponse, ApiResult, ErrorResponse, ResponseMeta};

/// How a successful reply is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// The device reply bytes, unchanged.
    #[default]
    Raw,
    /// The decoded variant inside the JSON `ApiResponse` wrapper.
    Decoded,
}

#[derive(Debug, Default, Deserialize)]
pub struct InteractionQuery {
    #[serde(default)]
    pub format: ResponseFormat,
}

/// Payload of a `?format=decoded` response.
#[derive(Debug, Serialize)]
pub struct DecodedReply<R> {
    pub method: RpcMethod,
    pub encoding: Encoding,
    pub response: R,
}

type QueryInput = Result<Query<InteractionQuery>, QueryRejection>;
type BodyInput = Result<Bytes, BytesRejection>;

/// Header carrying the request id, echoed on every CWMP response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Metadata for this request, keeping a caller-supplied request id.
fn response_meta(headers: &HeaderMap) -> ResponseMeta {
    let meta = ResponseMeta::default();
    match headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        Some(id) => meta.with_request_id(id),
        None => meta,
    }
}

async fn interact<R: CwmpResponse>(
    state: ServerState,
    serial: String,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    let meta = response_meta(&headers);
    let request_id = meta.request_id.clone();

    let result = async {
        let Query(query) = query.map_err(|e| ErrorResponse::invalid_input(e.body_text()))?;
        let body = body?;

        let interaction = state
            .bridge
            .interact::<R>(&serial, body)
            .await
            .inspect_err(|e| {
                tracing::debug!("{} for {} failed [{}]: {}", R::METHOD, serial, request_id, e)
            })?;
        Ok::<_, ErrorResponse>((interaction, query.format))
    }
    .await;

    match result {
        Ok((interaction, format)) => Ok(render(interaction, format, meta)),
        Err(e) => Err(e.with_request_id(request_id)),
    }
}

fn render<R: CwmpResponse>(
    interaction: Interaction<R>,
    format: ResponseFormat,
    meta: ResponseMeta,
) -> Response {
    match format {
        ResponseFormat::Raw => (
            [
                (header::CONTENT_TYPE, interaction.encoding.content_type().to_string()),
                (HeaderName::from_static(REQUEST_ID_HEADER), meta.request_id),
            ],
            interaction.raw,
        )
            .into_response(),
        ResponseFormat::Decoded => ApiResponse::success_with_meta(
            DecodedReply {
                method: R::METHOD,
                encoding: interaction.encoding,
                response: interaction.response,
            },
            meta,
        )
        .into_response(),
    }
}

/// `POST /api/device/cwmp/:sn/getParameterNames`
pub async fn get_parameter_names_handler(
    State(state): State<ServerState>,
    Path(sn): Path<String>,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    interact::<GetParameterNamesResponse>(state, sn, headers, query, body).await
}

/// `POST /api/device/cwmp/:sn/getParameterAttributes`
pub async fn get_parameter_attributes_handler(
    State(state): State<ServerState>,
    Path(sn): Path<String>,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    interact::<GetParameterAttributesResponse>(state, sn, headers, query, body).await
}

/// `POST /api/device/cwmp/:sn/getParameterValues`
pub async fn get_parameter_values_handler(
    State(state): State<ServerState>,
    Path(sn): Path<String>,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    interact::<GetParameterValuesResponse>(state, sn, headers, query, body).await
}

/// `POST /api/device/cwmp/:sn/setParameterValues`
pub async fn set_parameter_values_handler(
    State(state): State<ServerState>,
    Path(sn): Path<String>,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    interact::<SetParameterValuesResponse>(state, sn, headers, query, body).await
}

/// `POST /api/device/cwmp/:sn/addObject`
pub async fn add_object_handler(
    State(state): State<ServerState>,
    Path(sn): Path<String>,
    headers: HeaderMap,
    query: QueryInput,
    body: BodyInput,
) -> ApiResult<Response> {
    interact::<AddObjectResponse>(state, sn, headers, query, body).await
}
