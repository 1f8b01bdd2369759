//! Stateless HTTP request builder and response parser for the lookup API.
//!
//! # Design
//! `LookupClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The host executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CustomerDetail, CustomerList, DocumentTypeList, Download, ErrorBody, ExportFormat,
    ExportRequest, SearchRequest,
};

/// File name used for the loyalty report when the server sends none.
pub const DEFAULT_REPORT_FILENAME: &str = "reporte_fidelizacion.xlsx";

/// Synchronous, stateless client for the lookup API.
#[derive(Debug, Clone)]
pub struct LookupClient {
    base_url: String,
}

impl LookupClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_customers(&self) -> HttpRequest {
        self.get("/listar-clientes")
    }

    pub fn build_search_customer(&self, input: &SearchRequest) -> Result<HttpRequest, ApiError> {
        self.post_json("/buscar-cliente", input)
    }

    pub fn build_export_customer(&self, input: &ExportRequest) -> Result<HttpRequest, ApiError> {
        self.post_json("/exportar-cliente", input)
    }

    pub fn build_loyalty_report(&self) -> HttpRequest {
        self.get("/reporte-fidelizacion")
    }

    pub fn build_document_types(&self) -> HttpRequest {
        self.get("/tipos-documento")
    }

    pub fn parse_list_customers(&self, response: HttpResponse) -> Result<CustomerList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_search_customer(
        &self,
        response: HttpResponse,
    ) -> Result<CustomerDetail, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// Parse an export answer. `document_number` and `format` feed the
    /// fallback file name `cliente_<number>.<ext>`.
    pub fn parse_export_customer(
        &self,
        response: HttpResponse,
        document_number: &str,
        format: ExportFormat,
    ) -> Result<Download, ApiError> {
        check_status(&response)?;
        let fallback = format!("cliente_{document_number}.{}", format.extension());
        Ok(into_download(response, fallback))
    }

    pub fn parse_loyalty_report(&self, response: HttpResponse) -> Result<Download, ApiError> {
        check_status(&response)?;
        Ok(into_download(response, DEFAULT_REPORT_FILENAME.to_string()))
    }

    pub fn parse_document_types(
        &self,
        response: HttpResponse,
    ) -> Result<DocumentTypeList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    fn post_json<T: Serialize>(&self, path: &str, input: &T) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Map non-success status codes to `ApiError::Rejected`, keeping whatever
/// message the server put in the body.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = serde_json::from_slice::<ErrorBody>(&response.body).unwrap_or_default();
    Err(ApiError::Rejected {
        status: response.status,
        body,
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn into_download(response: HttpResponse, fallback: String) -> Download {
    let filename = response
        .header("content-disposition")
        .and_then(filename_from_disposition)
        .unwrap_or(fallback);
    Download {
        filename,
        bytes: response.body,
    }
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// The plain `filename` parameter wins; `filename*` (RFC 5987) is used when it
/// is the only one present. Empty values count as absent.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut extended = None;
    for param in split_params(value) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let raw = raw.trim();
        if key.eq_ignore_ascii_case("filename") {
            let name = unquote(raw);
            if !name.is_empty() {
                return Some(name);
            }
        } else if key.eq_ignore_ascii_case("filename*") && extended.is_none() {
            extended = decode_extended(raw);
        }
    }
    extended
}

/// Split on `;` outside of double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(raw);
    inner.replace("\\\"", "\"").trim().to_string()
}

/// Decode `charset'lang'percent-encoded`. Only UTF-8 and ASCII-compatible
/// charsets are understood.
fn decode_extended(raw: &str) -> Option<String> {
    let mut parts = raw.splitn(3, '\'');
    let _charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    let name = urlencoding::decode(encoded).ok()?.into_owned();
    (!name.is_empty()).then_some(name)
}
