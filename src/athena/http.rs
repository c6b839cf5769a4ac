//! Amazon Athena client over the AWS JSON 1.1 protocol.
//!
//! Implements the QueryService trait with signed `POST /` requests whose
//! operation is selected by the `X-Amz-Target` header.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::signing::{Credentials, SigV4Signer, SigningRequest};
use super::{
    ColumnInfo, QueryExecution, QueryService, QueryState, ResultSet, ServiceError, ServiceResult,
    StartQueryRequest,
};
use crate::error::{QueryError, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Signing name of the service.
const SERVICE_NAME: &str = "athena";

/// Prefix of the `X-Amz-Target` header.
const TARGET_PREFIX: &str = "AmazonAthena";

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Athena client configuration.
#[derive(Debug, Clone)]
pub struct AthenaHttpConfig {
    /// AWS region, e.g. "eu-north-1".
    pub region: String,
    pub credentials: Credentials,
    /// Overrides the regional endpoint (for emulators).
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl AthenaHttpConfig {
    /// Creates a new config for the given region and credentials.
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            region: region.into(),
            credentials,
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://athena.{}.amazonaws.com/", self.region),
        };
        let url = Url::parse(&raw)
            .map_err(|e| QueryError::config(format!("Invalid endpoint '{raw}': {e}")))?;
        if url.host_str().is_none() {
            return Err(QueryError::config(format!("Endpoint '{raw}' has no host")));
        }
        Ok(url)
    }
}

/// Athena query service client.
#[derive(Debug, Clone)]
pub struct AthenaHttpClient {
    client: Client,
    endpoint: Url,
    host: String,
    signer: SigV4Signer,
}

impl AthenaHttpClient {
    /// Creates a new Athena client with the given configuration.
    pub fn new(config: AthenaHttpConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let host = host_header(&endpoint)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QueryError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            host,
            signer: SigV4Signer::new(config.credentials, config.region, SERVICE_NAME),
        })
    }

    /// Sends one signed operation and decodes its JSON response.
    async fn call<Req, Resp>(&self, operation: &str, input: &Req) -> ServiceResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(input)
            .map_err(|e| ServiceError::invalid_response(format!("Failed to encode request: {e}")))?;
        let target = format!("{TARGET_PREFIX}.{operation}");

        let signed = self.signer.sign(
            &SigningRequest {
                method: "POST",
                host: &self.host,
                path: self.endpoint.path(),
                headers: vec![("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())],
                payload: &payload,
            },
            Utc::now(),
        );

        debug!(operation, "Sending Athena request");

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request.body(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::transport(format!("{operation} timed out"))
            } else if e.is_connect() {
                ServiceError::transport(format!("Failed to connect to Athena: {e}"))
            } else {
                ServiceError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ServiceError::invalid_response(format!("Failed to parse {operation} response: {e}")))
    }
}

#[async_trait]
impl QueryService for AthenaHttpClient {
    async fn start_query_execution(&self, request: &StartQueryRequest) -> ServiceResult<String> {
        let input = StartQueryExecutionInput {
            query_string: &request.query_text,
            query_execution_context: QueryExecutionContext {
                database: &request.database,
            },
            result_configuration: ResultConfiguration {
                output_location: &request.output_location,
            },
            work_group: request.workgroup.as_deref(),
        };

        let output: StartQueryExecutionOutput = self.call("StartQueryExecution", &input).await?;
        output
            .query_execution_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::invalid_response("response carried no QueryExecutionId"))
    }

    async fn get_query_execution(&self, execution_id: &str) -> ServiceResult<QueryExecution> {
        let output: GetQueryExecutionOutput = self
            .call("GetQueryExecution", &ExecutionIdInput { query_execution_id: execution_id })
            .await?;
        decode_query_execution(execution_id, output)
    }

    async fn get_query_results(&self, execution_id: &str) -> ServiceResult<ResultSet> {
        let output: GetQueryResultsOutput = self
            .call("GetQueryResults", &ExecutionIdInput { query_execution_id: execution_id })
            .await?;
        Ok(decode_result_set(output))
    }

    async fn stop_query_execution(&self, execution_id: &str) -> ServiceResult<()> {
        let _: IgnoredAny = self
            .call("StopQueryExecution", &ExecutionIdInput { query_execution_id: execution_id })
            .await?;
        Ok(())
    }
}

/// Builds the `host` header value, keeping non-default ports.
fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| QueryError::config(format!("Endpoint '{url}' has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Parses an API error response.
fn parse_error(status: reqwest::StatusCode, body: &str) -> ServiceError {
    if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
        // `__type` may be namespaced: "com.amazonaws.athena#InvalidRequestException"
        let code = error
            .error_type
            .as_deref()
            .and_then(|t| t.rsplit('#').next())
            .unwrap_or("UnknownError")
            .to_string();
        if let Some(message) = error.message {
            return ServiceError::api(code, message);
        }
        return ServiceError::api(code, format!("HTTP {status}"));
    }

    ServiceError::api(format!("HTTP {}", status.as_u16()), body.to_string())
}

fn decode_query_execution(
    execution_id: &str,
    output: GetQueryExecutionOutput,
) -> ServiceResult<QueryExecution> {
    let status = output
        .query_execution
        .and_then(|qe| qe.status)
        .ok_or_else(|| ServiceError::invalid_response("response carried no QueryExecution.Status"))?;
    let state_str = status
        .state
        .ok_or_else(|| ServiceError::invalid_response("response carried no Status.State"))?;
    let state: QueryState = state_str
        .parse()
        .map_err(|_| ServiceError::invalid_response(format!("unknown query state '{state_str}'")))?;

    Ok(QueryExecution {
        execution_id: execution_id.to_string(),
        state,
        state_change_reason: status.state_change_reason,
    })
}

fn decode_result_set(output: GetQueryResultsOutput) -> ResultSet {
    let wire = output.result_set.unwrap_or_default();
    let columns = wire
        .result_set_metadata
        .map(|m| {
            m.column_info
                .into_iter()
                .map(|c| ColumnInfo::new(c.name, c.data_type))
                .collect()
        })
        .unwrap_or_default();
    let rows = wire
        .rows
        .into_iter()
        .map(|row| row.data.into_iter().map(|d| d.var_char_value).collect())
        .collect();

    ResultSet {
        columns,
        rows,
        next_token: output.next_token,
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionInput<'a> {
    query_string: &'a str,
    query_execution_context: QueryExecutionContext<'a>,
    result_configuration: ResultConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    work_group: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionContext<'a> {
    database: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultConfiguration<'a> {
    output_location: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionIdInput<'a> {
    query_execution_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionOutput {
    query_execution_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecutionOutput {
    query_execution: Option<WireQueryExecution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireQueryExecution {
    status: Option<WireStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireStatus {
    state: Option<String>,
    state_change_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsOutput {
    result_set: Option<WireResultSet>,
    next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResultSet {
    #[serde(default)]
    rows: Vec<WireRow>,
    result_set_metadata: Option<WireResultSetMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRow {
    #[serde(default)]
    data: Vec<WireDatum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDatum {
    var_char_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResultSetMetadata {
    #[serde(default)]
    column_info: Vec<WireColumnInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireColumnInfo {
    name: String,
    #[serde(rename = "Type")]
    data_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}
