//! Domain DTOs for the customer lookup API.
//!
//! # Design
//! The API speaks Spanish field names; the Rust side uses English names and
//! maps them with `#[serde(rename)]`. These types are defined independently
//! from the mock-server crate so integration tests catch schema drift.

use serde::{Deserialize, Serialize};

/// One card of the customer list (`GET /listar-clientes`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerSummary {
    #[serde(rename = "codigo_tipo")]
    pub type_code: String,
    /// Human-readable document type ("Cédula de Ciudadanía").
    #[serde(rename = "tipo_documento", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(rename = "numero_documento")]
    pub document_number: String,
    #[serde(rename = "nombre_completo")]
    pub full_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "total_ultimo_mes")]
    pub last_month_total: f64,
    #[serde(rename = "califica_fidelizacion")]
    pub qualifies_for_loyalty: bool,
}

/// Envelope of the customer list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerList {
    #[serde(rename = "clientes")]
    pub customers: Vec<CustomerSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

/// Identity block of a search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    #[serde(rename = "tipo_documento")]
    pub document_type: String,
    #[serde(rename = "numero_documento")]
    pub document_number: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "fecha_registro")]
    pub registered_on: String,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseRecord {
    #[serde(rename = "fecha_compra")]
    pub purchased_at: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "numero_factura", default)]
    pub invoice_number: Option<String>,
}

/// Successful answer of `POST /buscar-cliente`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerDetail {
    #[serde(rename = "cliente")]
    pub customer: Customer,
    #[serde(rename = "compras")]
    pub purchases: Vec<PurchaseRecord>,
    #[serde(rename = "total_compras")]
    pub total: f64,
    #[serde(rename = "numero_compras")]
    pub count: u32,
}

/// Request payload for the customer search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    #[serde(rename = "tipo_documento")]
    pub document_type: String,
    #[serde(rename = "numero_documento")]
    pub document_number: String,
}

/// File format accepted by the per-customer export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Csv,
}

impl ExportFormat {
    /// Anything other than `"excel"` is treated as CSV, matching the server.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("excel") {
            ExportFormat::Excel
        } else {
            ExportFormat::Csv
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Request payload for the per-customer export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRequest {
    #[serde(rename = "numero_documento")]
    pub document_number: String,
    #[serde(rename = "formato")]
    pub format: ExportFormat,
}

/// Error payload of a non-2xx answer. Either field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,
}

impl ErrorBody {
    /// `error` first, then `mensaje`.
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref().or(self.mensaje.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentType {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentTypeList {
    #[serde(rename = "tipos_documento")]
    pub document_types: Vec<DocumentType>,
}

/// A file returned by one of the export endpoints, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}
