//! Client core for the customer lookup page.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and drives the lookup page
//! through `PageController`, a state machine whose output is a list of
//! `Command`s for the host plus a `PageView` describing what to draw.
//!
//! # Design
//! - `LookupClient` is stateless; it holds only `base_url`.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - `PageController` owns all page state; timers, downloads and scrolling
//!   are requested through `Command`s so tests run without a clock or screen.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod controller;
pub mod error;
pub mod format;
pub mod http;
pub mod types;
pub mod view;

pub use client::LookupClient;
pub use controller::{
    Banner, BannerKind, Command, ListState, PageController, ScrollAlign, ScrollTarget, SearchState,
    Ticket, Timer, UiState,
};
pub use error::ApiError;
pub use http::{Exchange, HttpMethod, HttpRequest, HttpResponse, TransportError};
pub use types::{
    Customer, CustomerDetail, CustomerList, CustomerSummary, DocumentType, DocumentTypeList,
    Download, ErrorBody, ExportFormat, ExportRequest, PurchaseRecord, SearchRequest,
};
pub use view::PageView;
