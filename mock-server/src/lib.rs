//! Stand-in for the customer lookup API.
//!
//! Serves the five endpoints the lookup page talks to, under `/api`, from an
//! in-memory `Store`. Export endpoints answer with file bytes and a
//! `Content-Disposition` header. No workbook writer is involved: the "excel"
//! flavour and the loyalty report are tab-separated text named `.tsv`.

pub mod store;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use store::{Client, Store, DOCUMENT_KINDS};

const TSV_MIME: &str = "text/tab-separated-values; charset=utf-8";
const CSV_MIME: &str = "text/csv; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    /// Fixed "now" for deterministic tests; `None` uses the local clock.
    pub now: Option<NaiveDateTime>,
}

impl AppState {
    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientSummary {
    pub tipo_documento: String,
    pub codigo_tipo: String,
    pub numero_documento: String,
    pub nombre_completo: String,
    pub correo: String,
    pub telefono: String,
    pub total_ultimo_mes: f64,
    pub califica_fidelizacion: bool,
}

#[derive(Deserialize)]
pub struct SearchInput {
    pub tipo_documento: Option<String>,
    pub numero_documento: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportInput {
    pub numero_documento: Option<String>,
    pub formato: Option<String>,
}

/// Router over freshly seeded demo data.
pub fn app() -> Router {
    let now = Local::now().naive_local();
    app_with(AppState {
        store: Arc::new(Store::seeded(now)),
        now: None,
    })
}

pub fn app_with(state: AppState) -> Router {
    let api = Router::new()
        .route("/buscar-cliente", post(search_client))
        .route("/exportar-cliente", post(export_client))
        .route("/reporte-fidelizacion", get(loyalty_report))
        .route("/tipos-documento", get(document_types))
        .route("/listar-clientes", get(list_clients));
    Router::new().nest("/api", api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn attachment(filename: String, mime: &'static str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    )
        .into_response()
}

fn client_json(client: &Client) -> serde_json::Value {
    json!({
        "tipo_documento": client.kind().description,
        "numero_documento": client.number,
        "nombre": client.first_name,
        "apellido": client.last_name,
        "correo": client.email,
        "telefono": client.phone,
        "fecha_registro": client.registered.format("%Y-%m-%d").to_string(),
    })
}

async fn search_client(State(state): State<AppState>, Json(input): Json<SearchInput>) -> Response {
    let (Some(kind), Some(number)) = (
        input.tipo_documento.filter(|s| !s.is_empty()),
        input.numero_documento.filter(|s| !s.is_empty()),
    ) else {
        return error(
            StatusCode::BAD_REQUEST,
            "Debe proporcionar tipo_documento y numero_documento",
        );
    };
    if !DOCUMENT_KINDS.iter().any(|k| k.code == kind) {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Tipo de documento {kind} no válido"),
        );
    }
    let Some(client) = state.store.find(&kind, &number) else {
        return error(StatusCode::NOT_FOUND, "Cliente no encontrado");
    };

    let purchases: Vec<_> = client
        .purchases
        .iter()
        .map(|p| {
            json!({
                "fecha_compra": p.at.format("%Y-%m-%d %H:%M:%S").to_string(),
                "monto": p.amount,
                "descripcion": p.description,
                "numero_factura": p.invoice,
            })
        })
        .collect();
    Json(json!({
        "cliente": client_json(client),
        "numero_compras": purchases.len(),
        "compras": purchases,
        "total_compras": client.total(),
    }))
    .into_response()
}

async fn export_client(State(state): State<AppState>, Json(input): Json<ExportInput>) -> Response {
    let Some(number) = input.numero_documento.filter(|s| !s.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Debe proporcionar numero_documento");
    };
    let excel = input
        .formato
        .is_some_and(|f| f.eq_ignore_ascii_case("excel"));
    let Some(client) = state.store.find_by_number(&number) else {
        return error(StatusCode::NOT_FOUND, "Cliente no encontrado");
    };

    let stamp = state.now().format("%Y%m%d_%H%M%S");
    let mut rows = vec![
        vec![
            "Tipo Documento".to_string(),
            "Número Documento".to_string(),
            "Nombre".to_string(),
            "Apellido".to_string(),
            "Correo".to_string(),
            "Teléfono".to_string(),
            "Fecha Registro".to_string(),
            "Total Compras".to_string(),
            "Número de Compras".to_string(),
        ],
        vec![
            client.kind().description.to_string(),
            client.number.clone(),
            client.first_name.clone(),
            client.last_name.clone(),
            client.email.clone(),
            client.phone.clone(),
            client.registered.format("%Y-%m-%d").to_string(),
            client.total().to_string(),
            client.purchases.len().to_string(),
        ],
    ];
    if excel {
        rows.push(Vec::new());
        rows.push(vec![
            "Fecha".to_string(),
            "Monto".to_string(),
            "Descripción".to_string(),
            "Número Factura".to_string(),
        ]);
        for p in &client.purchases {
            rows.push(vec![
                p.at.format("%Y-%m-%d").to_string(),
                p.amount.to_string(),
                p.description.clone().unwrap_or_default(),
                p.invoice.clone().unwrap_or_default(),
            ]);
        }
    }

    let (extension, mime, delimiter) = if excel {
        ("tsv", TSV_MIME, b'\t')
    } else {
        ("csv", CSV_MIME, b',')
    };
    match write_table(&rows, delimiter) {
        Ok(bytes) => attachment(format!("cliente_{number}_{stamp}.{extension}"), mime, bytes),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn loyalty_report(State(state): State<AppState>) -> Response {
    let now = state.now();
    let mut qualifying: Vec<(&Client, f64, usize)> = state
        .store
        .clients
        .iter()
        .filter(|c| c.qualifies(now))
        .map(|c| (c, c.recent_total(now), c.recent(now).len()))
        .collect();
    if qualifying.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "mensaje": "No hay clientes que superen los 5,000,000 COP en el último mes"
            })),
        )
            .into_response();
    }
    qualifying.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut rows = vec![vec![
        "Tipo Documento".to_string(),
        "Número Documento".to_string(),
        "Nombre".to_string(),
        "Apellido".to_string(),
        "Correo".to_string(),
        "Teléfono".to_string(),
        "Monto Total (COP)".to_string(),
        "Número de Compras".to_string(),
    ]];
    for (client, total, count) in qualifying {
        rows.push(vec![
            client.kind().description.to_string(),
            client.number.clone(),
            client.first_name.clone(),
            client.last_name.clone(),
            client.email.clone(),
            client.phone.clone(),
            report_amount(total),
            count.to_string(),
        ]);
    }
    let stamp = now.format("%Y%m%d_%H%M%S");
    match write_table(&rows, b'\t') {
        Ok(bytes) => attachment(format!("reporte_fidelizacion_{stamp}.tsv"), TSV_MIME, bytes),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn document_types() -> Json<serde_json::Value> {
    let kinds: Vec<_> = DOCUMENT_KINDS
        .iter()
        .map(|k| json!({ "codigo": k.code, "descripcion": k.description }))
        .collect();
    Json(json!({ "tipos_documento": kinds }))
}

async fn list_clients(State(state): State<AppState>) -> Json<serde_json::Value> {
    let now = state.now();
    let mut list: Vec<ClientSummary> = state
        .store
        .clients
        .iter()
        .map(|c| ClientSummary {
            tipo_documento: c.kind().description.to_string(),
            codigo_tipo: c.type_code.to_string(),
            numero_documento: c.number.clone(),
            nombre_completo: format!("{} {}", c.first_name, c.last_name),
            correo: c.email.clone(),
            telefono: c.phone.clone(),
            total_ultimo_mes: c.recent_total(now),
            califica_fidelizacion: c.qualifies(now),
        })
        .collect();
    list.sort_by(|a, b| b.total_ultimo_mes.total_cmp(&a.total_ultimo_mes));
    Json(json!({ "total": list.len(), "clientes": list }))
}

/// `$7,750,000.00`: comma thousands, two decimals.
fn report_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

fn write_table(rows: &[Vec<String>], delimiter: u8) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
