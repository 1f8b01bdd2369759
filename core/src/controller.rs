//! Page controller: the request/render state machine of the lookup page.
//!
//! # Design
//! The controller follows the same host-does-IO split as `LookupClient`, one
//! level up. Every user action or host event returns a list of `Command`s
//! (send a request, start a timer, save a file, scroll somewhere). The host
//! executes them and reports back through `on_response` / `on_timer`. All
//! state lives in this struct; `view()` projects it into a `PageView`.
//!
//! - The current customer is `SearchState::Found`. Hiding results and
//!   forgetting the customer are the same transition.
//! - Each request gets a `Ticket`. Searches and exports hold the busy toggle
//!   until their ticket is answered; answering an unknown ticket is a no-op,
//!   so every busy entry has exactly one exit.
//! - Overlapping searches are sequenced by a generation counter: only the
//!   answer to the latest submission may change the search state.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::LookupClient;
use crate::error::ApiError;
use crate::http::{Exchange, HttpRequest};
use crate::types::{
    CustomerDetail, CustomerSummary, DocumentType, ExportFormat, ExportRequest, SearchRequest,
};
use crate::view::{self, PageView, SearchFormView};

/// Pause between selecting a card and re-submitting the search, so the scroll
/// to the form starts before the busy state kicks in.
pub const RESUBMIT_DELAY: Duration = Duration::from_millis(500);

/// Lifetime of a success banner.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(3);

pub const MSG_SEARCH_FAILED: &str = "Error al buscar el cliente";
pub const MSG_CONNECTION_FAILED: &str =
    "Error de conexión con el servidor. Asegúrate de que el backend esté corriendo.";
pub const MSG_NO_CUSTOMER_SELECTED: &str = "Primero debe buscar un cliente";
pub const MSG_EXPORT_FAILED: &str = "Error al exportar datos";
pub const MSG_NO_QUALIFYING_CUSTOMERS: &str = "No hay clientes que califiquen para fidelización";
pub const MSG_REPORT_FAILED: &str = "Error al generar el reporte";
pub const MSG_REPORT_READY: &str = "Reporte de fidelización descargado exitosamente";

/// Identity of one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    ResubmitSearch,
    /// Hide the success banner carrying this token, if it is still shown.
    DismissBanner(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    SearchSection,
    Results,
    Banner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
}

/// Work the host must carry out on behalf of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send { ticket: Ticket, request: HttpRequest },
    Schedule { timer: Timer, after: Duration },
    /// Persist the file, then drop the bytes.
    Download(crate::types::Download),
    ScrollTo { target: ScrollTarget, align: ScrollAlign },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Pending { generation: u64 },
    Found(CustomerDetail),
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Loaded(Vec<CustomerSummary>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    pub token: u64,
}

/// Coarse page state, derived from the finer-grained fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Idle,
    Loading,
    ResultsShown,
    ErrorShown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub document_type: String,
    pub document_number: String,
}

#[derive(Debug, Clone)]
enum Flow {
    ListCustomers,
    DocumentTypes,
    Search { generation: u64 },
    Export { document_number: String, format: ExportFormat },
    LoyaltyReport,
}

impl Flow {
    fn holds_busy(&self) -> bool {
        matches!(
            self,
            Flow::Search { .. } | Flow::Export { .. } | Flow::LoyaltyReport
        )
    }
}

#[derive(Debug)]
pub struct PageController {
    client: LookupClient,
    list: ListState,
    list_ticket: Option<Ticket>,
    document_types: Vec<DocumentType>,
    form: SearchForm,
    search: SearchState,
    generation: u64,
    banner: Option<Banner>,
    next_banner_token: u64,
    in_flight: HashMap<Ticket, Flow>,
    busy: BTreeSet<Ticket>,
    next_ticket: u64,
}

impl PageController {
    pub fn new(client: LookupClient) -> Self {
        Self {
            client,
            list: ListState::Loading,
            list_ticket: None,
            document_types: Vec::new(),
            form: SearchForm::default(),
            search: SearchState::Idle,
            generation: 0,
            banner: None,
            next_banner_token: 0,
            in_flight: HashMap::new(),
            busy: BTreeSet::new(),
            next_ticket: 0,
        }
    }

    /// Page load: fetch the customer list and the document-type catalogue.
    pub fn init(&mut self) -> Vec<Command> {
        let mut commands = self.reload_customers();
        commands.extend(self.reload_document_types());
        commands
    }

    /// Fetch only the document-type catalogue; the customer list is untouched.
    pub fn reload_document_types(&mut self) -> Vec<Command> {
        let request = self.client.build_document_types();
        vec![self.send(Flow::DocumentTypes, request)]
    }

    pub fn reload_customers(&mut self) -> Vec<Command> {
        self.list = ListState::Loading;
        let request = self.client.build_list_customers();
        let command = self.send(Flow::ListCustomers, request);
        if let Command::Send { ticket, .. } = &command {
            self.list_ticket = Some(*ticket);
        }
        vec![command]
    }

    pub fn set_document_type(&mut self, value: impl Into<String>) {
        self.form.document_type = value.into();
    }

    pub fn set_document_number(&mut self, value: impl Into<String>) {
        self.form.document_number = value.into();
    }

    /// Card click: copy the card's document into the form, bring the form
    /// into view and schedule the search.
    pub fn select_customer(&mut self, index: usize) -> Vec<Command> {
        let ListState::Loaded(customers) = &self.list else {
            return Vec::new();
        };
        let Some(customer) = customers.get(index) else {
            debug!(index, "ignoring selection of unknown card");
            return Vec::new();
        };
        self.form.document_type = customer.type_code.clone();
        self.form.document_number = customer.document_number.clone();
        vec![
            Command::ScrollTo {
                target: ScrollTarget::SearchSection,
                align: ScrollAlign::Center,
            },
            Command::Schedule {
                timer: Timer::ResubmitSearch,
                after: RESUBMIT_DELAY,
            },
        ]
    }

    /// Form submission. Field values are sent verbatim.
    pub fn submit_search(&mut self) -> Vec<Command> {
        self.hide_banner();
        self.generation += 1;
        let generation = self.generation;
        self.search = SearchState::Pending { generation };

        let input = SearchRequest {
            document_type: self.form.document_type.clone(),
            document_number: self.form.document_number.clone(),
        };
        match self.client.build_search_customer(&input) {
            Ok(request) => vec![self.send(Flow::Search { generation }, request)],
            Err(e) => {
                warn!(error = %e, "could not build search request");
                self.search = SearchState::Failed;
                self.show_error(MSG_SEARCH_FAILED)
            }
        }
    }

    /// Export the customer currently on screen.
    pub fn export_customer(&mut self, format: ExportFormat) -> Vec<Command> {
        let SearchState::Found(detail) = &self.search else {
            return self.show_error(MSG_NO_CUSTOMER_SELECTED);
        };
        let document_number = detail.customer.document_number.clone();
        let input = ExportRequest {
            document_number: document_number.clone(),
            format,
        };
        match self.client.build_export_customer(&input) {
            Ok(request) => vec![self.send(
                Flow::Export {
                    document_number,
                    format,
                },
                request,
            )],
            Err(e) => {
                warn!(error = %e, "could not build export request");
                self.show_error(MSG_EXPORT_FAILED)
            }
        }
    }

    pub fn generate_loyalty_report(&mut self) -> Vec<Command> {
        let request = self.client.build_loyalty_report();
        vec![self.send(Flow::LoyaltyReport, request)]
    }

    /// Feed back the outcome of a `Command::Send`.
    pub fn on_response(&mut self, ticket: Ticket, exchange: Exchange) -> Vec<Command> {
        let Some(flow) = self.in_flight.remove(&ticket) else {
            debug!(?ticket, "response for unknown ticket");
            return Vec::new();
        };
        self.busy.remove(&ticket);

        match flow {
            Flow::ListCustomers => {
                self.finish_list(ticket, exchange);
                Vec::new()
            }
            Flow::DocumentTypes => {
                self.finish_document_types(exchange);
                Vec::new()
            }
            Flow::Search { generation } => self.finish_search(generation, exchange),
            Flow::Export {
                document_number,
                format,
            } => self.finish_export(&document_number, format, exchange),
            Flow::LoyaltyReport => self.finish_report(exchange),
        }
    }

    pub fn on_timer(&mut self, timer: Timer) -> Vec<Command> {
        match timer {
            Timer::ResubmitSearch => self.submit_search(),
            Timer::DismissBanner(token) => {
                if self
                    .banner
                    .as_ref()
                    .is_some_and(|b| b.kind == BannerKind::Success && b.token == token)
                {
                    self.banner = None;
                }
                Vec::new()
            }
        }
    }

    pub fn view(&self) -> PageView {
        PageView {
            customers: view::render_customer_list(&self.list),
            form: SearchFormView {
                document_type: self.form.document_type.clone(),
                document_number: self.form.document_number.clone(),
                document_types: self.document_types.clone(),
                button: view::render_button(self.is_busy()),
            },
            banner: self.banner.as_ref().map(view::render_banner),
            results: self.current_customer().map(view::render_result),
        }
    }

    pub fn ui_state(&self) -> UiState {
        if self.is_busy() {
            UiState::Loading
        } else if matches!(self.search, SearchState::Found(_)) {
            UiState::ResultsShown
        } else if self
            .banner
            .as_ref()
            .is_some_and(|b| b.kind == BannerKind::Error)
        {
            UiState::ErrorShown
        } else {
            UiState::Idle
        }
    }

    pub fn current_customer(&self) -> Option<&CustomerDetail> {
        match &self.search {
            SearchState::Found(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn list_state(&self) -> &ListState {
        &self.list
    }

    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn document_types(&self) -> &[DocumentType] {
        &self.document_types
    }

    pub fn is_busy(&self) -> bool {
        !self.busy.is_empty()
    }

    /// Number of requests sent but not yet answered.
    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    fn send(&mut self, flow: Flow, request: HttpRequest) -> Command {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        debug!(
            ?ticket,
            method = request.method.as_str(),
            path = %request.path,
            "dispatching request"
        );
        if flow.holds_busy() {
            self.busy.insert(ticket);
        }
        self.in_flight.insert(ticket, flow);
        Command::Send { ticket, request }
    }

    fn finish_list(&mut self, ticket: Ticket, exchange: Exchange) {
        if self.list_ticket != Some(ticket) {
            debug!(?ticket, "discarding stale customer list");
            return;
        }
        self.list_ticket = None;
        let result = exchange
            .map_err(ApiError::from)
            .and_then(|response| self.client.parse_list_customers(response));
        self.list = match result {
            Ok(list) => ListState::Loaded(list.customers),
            Err(e) => {
                warn!(error = %e, "failed to load customers");
                ListState::Failed
            }
        };
    }

    fn finish_document_types(&mut self, exchange: Exchange) {
        let result = exchange
            .map_err(ApiError::from)
            .and_then(|response| self.client.parse_document_types(response));
        match result {
            Ok(list) => self.document_types = list.document_types,
            Err(e) => warn!(error = %e, "failed to load document types"),
        }
    }

    fn finish_search(&mut self, generation: u64, exchange: Exchange) -> Vec<Command> {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "discarding stale search response");
            return Vec::new();
        }
        let response = match exchange {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "search request did not complete");
                self.search = SearchState::Failed;
                return self.show_error(MSG_CONNECTION_FAILED);
            }
        };
        match self.client.parse_search_customer(response) {
            Ok(detail) => {
                self.search = SearchState::Found(detail);
                vec![Command::ScrollTo {
                    target: ScrollTarget::Results,
                    align: ScrollAlign::Start,
                }]
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                self.search = SearchState::Failed;
                let message = e
                    .body()
                    .and_then(|body| body.error.clone())
                    .unwrap_or_else(|| MSG_SEARCH_FAILED.to_string());
                self.show_error(message)
            }
        }
    }

    fn finish_export(
        &mut self,
        document_number: &str,
        format: ExportFormat,
        exchange: Exchange,
    ) -> Vec<Command> {
        let response = match exchange {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "export request did not complete");
                return self.show_error(MSG_EXPORT_FAILED);
            }
        };
        match self
            .client
            .parse_export_customer(response, document_number, format)
        {
            Ok(download) => {
                let message = format!(
                    "Archivo {} descargado exitosamente",
                    format.as_str().to_uppercase()
                );
                let mut commands = vec![Command::Download(download)];
                commands.extend(self.show_success(message));
                commands
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                let message = e
                    .body()
                    .and_then(|body| body.error.clone())
                    .unwrap_or_else(|| MSG_EXPORT_FAILED.to_string());
                self.show_error(message)
            }
        }
    }

    fn finish_report(&mut self, exchange: Exchange) -> Vec<Command> {
        let response = match exchange {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "loyalty report request did not complete");
                return self.show_error(MSG_REPORT_FAILED);
            }
        };
        match self.client.parse_loyalty_report(response) {
            Ok(download) => {
                let mut commands = vec![Command::Download(download)];
                commands.extend(self.show_success(MSG_REPORT_READY));
                commands
            }
            Err(e) => {
                warn!(error = %e, "loyalty report failed");
                // `mensaje` carries the business-rule "nobody qualifies"
                // answer, `error` the technical one.
                let message = e
                    .body()
                    .and_then(|body| body.mensaje.clone().or_else(|| body.error.clone()))
                    .unwrap_or_else(|| MSG_NO_QUALIFYING_CUSTOMERS.to_string());
                self.show_error(message)
            }
        }
    }

    fn show_error(&mut self, text: impl Into<String>) -> Vec<Command> {
        self.set_banner(BannerKind::Error, text.into());
        vec![Command::ScrollTo {
            target: ScrollTarget::Banner,
            align: ScrollAlign::Center,
        }]
    }

    fn show_success(&mut self, text: impl Into<String>) -> Vec<Command> {
        let token = self.set_banner(BannerKind::Success, text.into());
        vec![
            Command::ScrollTo {
                target: ScrollTarget::Banner,
                align: ScrollAlign::Center,
            },
            Command::Schedule {
                timer: Timer::DismissBanner(token),
                after: SUCCESS_BANNER_TTL,
            },
        ]
    }

    fn set_banner(&mut self, kind: BannerKind, text: String) -> u64 {
        self.next_banner_token += 1;
        let token = self.next_banner_token;
        self.banner = Some(Banner { kind, text, token });
        token
    }

    fn hide_banner(&mut self) {
        self.banner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, TransportError};
    use crate::view::{
        CustomerListView, ListPlaceholder, PurchaseTable, BUSY_LABEL, ERROR_PALETTE, SEARCH_LABEL,
        SUCCESS_PALETTE,
    };

    const CUSTOMER_JSON: &str = r#"{
        "cliente": {
            "id": 1,
            "tipo_documento": "Cédula de Ciudadanía",
            "numero_documento": "123",
            "nombre": "Ana",
            "apellido": "Gómez",
            "correo": "ana@example.com",
            "telefono": "3001234567",
            "fecha_registro": "2023-11-02"
        },
        "compras": [
            {"id": 1, "fecha_compra": "2024-05-01 09:30:00", "monto": 1500000.0,
             "descripcion": "Televisor", "numero_factura": "F-001"},
            {"id": 2, "fecha_compra": "2024-05-03 12:00:00", "monto": 250000.0,
             "descripcion": null, "numero_factura": null}
        ],
        "total_compras": 1750000.0,
        "numero_compras": 2
    }"#;

    const LIST_JSON: &str = r#"{"total": 2, "clientes": [
        {"tipo_documento": "NIT", "codigo_tipo": "NIT", "numero_documento": "900",
         "nombre_completo": "Tienda SAS", "correo": "t@example.com", "telefono": "601",
         "total_ultimo_mes": 7000000.0, "califica_fidelizacion": true},
        {"tipo_documento": "Cédula", "codigo_tipo": "CC", "numero_documento": "123",
         "nombre_completo": "Ana Gómez", "correo": "ana@example.com", "telefono": "300",
         "total_ultimo_mes": 0, "califica_fidelizacion": false}
    ]}"#;

    fn controller() -> PageController {
        PageController::new(LookupClient::new("http://api.test"))
    }

    fn sends(commands: &[Command]) -> Vec<(Ticket, HttpRequest)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Send { ticket, request } => Some((*ticket, request.clone())),
                _ => None,
            })
            .collect()
    }

    fn only_send(commands: &[Command]) -> (Ticket, HttpRequest) {
        let sent = sends(commands);
        assert_eq!(sent.len(), 1, "expected exactly one request in {commands:?}");
        sent.into_iter().next().unwrap()
    }

    fn loaded_controller() -> PageController {
        let mut c = controller();
        let commands = c.init();
        let sent = sends(&commands);
        let (list_ticket, _) = sent
            .iter()
            .find(|(_, r)| r.path.ends_with("/listar-clientes"))
            .cloned()
            .unwrap();
        c.on_response(list_ticket, Ok(HttpResponse::json(200, LIST_JSON)));
        c
    }

    fn found_controller() -> PageController {
        let mut c = controller();
        c.set_document_type("CC");
        c.set_document_number("123");
        let (ticket, _) = only_send(&c.submit_search());
        c.on_response(ticket, Ok(HttpResponse::json(200, CUSTOMER_JSON)));
        assert!(c.current_customer().is_some());
        c
    }

    #[test]
    fn init_requests_list_and_document_types() {
        let mut c = controller();
        let commands = c.init();
        let paths: Vec<_> = sends(&commands).into_iter().map(|(_, r)| r.path).collect();
        assert_eq!(
            paths,
            ["http://api.test/listar-clientes", "http://api.test/tipos-documento"]
        );
        assert_eq!(
            c.view().customers,
            CustomerListView::Placeholder(ListPlaceholder::Loading)
        );
        assert!(!c.is_busy(), "list loading never touches the search button");
    }

    #[test]
    fn list_renders_one_card_per_customer_in_order() {
        let c = loaded_controller();
        let CustomerListView::Grid(cards) = c.view().customers else {
            panic!("expected grid");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].document_number, "900");
        assert_eq!(cards[1].document_number, "123");
    }

    #[test]
    fn empty_list_shows_no_customers_placeholder() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.reload_customers());
        c.on_response(ticket, Ok(HttpResponse::json(200, r#"{"total":0,"clientes":[]}"#)));
        assert_eq!(
            c.view().customers,
            CustomerListView::Placeholder(ListPlaceholder::Empty)
        );
    }

    #[test]
    fn list_failures_show_failed_placeholder_without_banner() {
        for exchange in [
            Ok(HttpResponse::json(500, r#"{"error":"boom"}"#)),
            Ok(HttpResponse::json(200, "garbage")),
            Err(TransportError::new("connection refused")),
        ] {
            let mut c = controller();
            let (ticket, _) = only_send(&c.reload_customers());
            c.on_response(ticket, exchange);
            assert_eq!(
                c.view().customers,
                CustomerListView::Placeholder(ListPlaceholder::Failed)
            );
            assert!(c.banner().is_none());
        }
    }

    #[test]
    fn document_type_failure_is_silent() {
        let mut c = controller();
        let commands = c.init();
        let (ticket, _) = sends(&commands)
            .into_iter()
            .find(|(_, r)| r.path.ends_with("/tipos-documento"))
            .unwrap();
        c.on_response(ticket, Err(TransportError::new("down")));
        assert!(c.document_types().is_empty());
        assert!(c.banner().is_none());
    }

    #[test]
    fn document_types_reload_leaves_list_alone() {
        let mut c = loaded_controller();
        let commands = c.reload_document_types();
        let sent = sends(&commands);
        assert_eq!(sent.len(), 1);
        let (ticket, request) = sent.into_iter().next().unwrap();
        assert_eq!(request.path, "http://api.test/tipos-documento");
        assert!(matches!(c.view().customers, CustomerListView::Grid(_)));

        c.on_response(
            ticket,
            Ok(HttpResponse::json(
                200,
                r#"{"tipos_documento":[{"codigo":"NIT","descripcion":"NIT"}]}"#,
            )),
        );
        assert_eq!(c.document_types().len(), 1);
        assert_eq!(c.document_types()[0].code, "NIT");
        assert!(matches!(c.view().customers, CustomerListView::Grid(_)));
    }

    #[test]
    fn selecting_a_card_fills_form_then_schedules_search() {
        let mut c = loaded_controller();
        let commands = c.select_customer(1);
        assert_eq!(c.form().document_type, "CC");
        assert_eq!(c.form().document_number, "123");
        assert_eq!(
            commands,
            vec![
                Command::ScrollTo {
                    target: ScrollTarget::SearchSection,
                    align: ScrollAlign::Center
                },
                Command::Schedule {
                    timer: Timer::ResubmitSearch,
                    after: RESUBMIT_DELAY
                },
            ]
        );

        let (_, request) = only_send(&c.on_timer(Timer::ResubmitSearch));
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["tipo_documento"], "CC");
        assert_eq!(body["numero_documento"], "123");
    }

    #[test]
    fn selecting_unknown_card_does_nothing() {
        let mut c = loaded_controller();
        assert!(c.select_customer(7).is_empty());
        assert_eq!(c.form(), &SearchForm::default());
    }

    #[test]
    fn search_success_shows_results() {
        let mut c = controller();
        c.set_document_type("CC");
        c.set_document_number("123");
        let commands = c.submit_search();
        let (ticket, request) = only_send(&commands);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "http://api.test/buscar-cliente");
        assert_eq!(c.ui_state(), UiState::Loading);
        assert_eq!(c.view().form.button.label, BUSY_LABEL);
        assert!(!c.view().form.button.enabled);

        let commands = c.on_response(ticket, Ok(HttpResponse::json(200, CUSTOMER_JSON)));
        assert_eq!(
            commands,
            vec![Command::ScrollTo {
                target: ScrollTarget::Results,
                align: ScrollAlign::Start
            }]
        );
        assert_eq!(c.ui_state(), UiState::ResultsShown);

        let view = c.view();
        assert!(view.form.button.enabled);
        assert_eq!(view.form.button.label, SEARCH_LABEL);
        let results = view.results.expect("results visible");
        assert_eq!(results.total, "$\u{a0}1.750.000");
        assert_eq!(results.count, 2);
        let PurchaseTable::Rows(rows) = results.purchases else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].invoice_number, "F-001");
        assert_eq!(rows[1].description, "N/A");
    }

    #[test]
    fn search_not_found_shows_server_message() {
        let mut c = controller();
        c.set_document_type("CC");
        c.set_document_number("000");
        let (ticket, _) = only_send(&c.submit_search());
        c.on_response(ticket, Ok(HttpResponse::json(404, r#"{"error":"not found"}"#)));

        let view = c.view();
        let banner = view.banner.expect("banner visible");
        assert!(banner.text.ends_with("not found"));
        assert_eq!(banner.palette, ERROR_PALETTE);
        assert!(view.results.is_none());
        assert_eq!(c.ui_state(), UiState::ErrorShown);
        assert!(!c.is_busy());
    }

    #[test]
    fn search_rejection_without_message_uses_fallback() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.submit_search());
        c.on_response(ticket, Ok(HttpResponse::json(500, "oops")));
        assert_eq!(c.banner().unwrap().text, MSG_SEARCH_FAILED);
    }

    #[test]
    fn search_transport_failure_mentions_backend() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.submit_search());
        c.on_response(ticket, Err(TransportError::new("connection refused")));
        assert_eq!(c.banner().unwrap().text, MSG_CONNECTION_FAILED);
        assert!(!c.is_busy());
        assert_eq!(c.search_state(), &SearchState::Failed);
    }

    #[test]
    fn resubmitting_clears_error_and_hides_results() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.submit_search());
        c.on_response(ticket, Ok(HttpResponse::json(404, r#"{"error":"x"}"#)));
        assert!(c.banner().is_some());
        let _ = c.submit_search();
        assert!(c.banner().is_none());

        let mut c = found_controller();
        let _ = c.submit_search();
        assert!(c.current_customer().is_none());
        assert!(c.view().results.is_none());
        assert_eq!(c.ui_state(), UiState::Loading);
    }

    #[test]
    fn every_busy_entry_has_one_exit() {
        let outcomes: Vec<Exchange> = vec![
            Ok(HttpResponse::json(200, CUSTOMER_JSON)),
            Ok(HttpResponse::json(404, r#"{"error":"no"}"#)),
            Err(TransportError::new("reset")),
        ];
        for outcome in outcomes {
            let mut c = controller();
            let (ticket, _) = only_send(&c.submit_search());
            assert!(c.is_busy());
            c.on_response(ticket, outcome);
            assert!(!c.is_busy());
            assert!(c.on_response(ticket, Err(TransportError::new("dup"))).is_empty());
            assert!(!c.is_busy());
            assert_eq!(c.pending_requests(), 0);
        }
    }

    #[test]
    fn stale_search_response_is_discarded_but_releases_busy() {
        let mut c = controller();
        c.set_document_number("111");
        let (first, _) = only_send(&c.submit_search());
        c.set_document_number("123");
        let (second, _) = only_send(&c.submit_search());

        c.on_response(second, Ok(HttpResponse::json(200, CUSTOMER_JSON)));
        assert!(c.is_busy(), "first request still in flight");
        let commands = c.on_response(first, Ok(HttpResponse::json(404, r#"{"error":"old"}"#)));
        assert!(commands.is_empty());
        assert!(!c.is_busy());
        assert_eq!(
            c.current_customer().unwrap().customer.document_number,
            "123"
        );
        assert!(c.banner().is_none());
    }

    #[test]
    fn export_without_customer_sends_nothing() {
        let mut c = controller();
        let commands = c.export_customer(ExportFormat::Excel);
        assert!(sends(&commands).is_empty());
        assert_eq!(c.pending_requests(), 0);
        assert_eq!(c.banner().unwrap().text, MSG_NO_CUSTOMER_SELECTED);
        assert_eq!(c.banner().unwrap().kind, BannerKind::Error);
    }

    #[test]
    fn export_excel_without_disposition_uses_synthesized_name() {
        let mut c = found_controller();
        let (ticket, request) = only_send(&c.export_customer(ExportFormat::Excel));
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"numero_documento": "123", "formato": "excel"}));
        assert_eq!(c.ui_state(), UiState::Loading);

        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: b"PK".to_vec(),
        };
        let commands = c.on_response(ticket, Ok(response));
        let download = commands
            .iter()
            .find_map(|cmd| match cmd {
                Command::Download(d) => Some(d.clone()),
                _ => None,
            })
            .expect("download command");
        assert_eq!(download.filename, "cliente_123.xlsx");
        let banner = c.banner().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert_eq!(banner.text, "Archivo EXCEL descargado exitosamente");
        assert_eq!(c.ui_state(), UiState::ResultsShown);
    }

    #[test]
    fn export_failure_keeps_results_visible() {
        let mut c = found_controller();
        let (ticket, _) = only_send(&c.export_customer(ExportFormat::Csv));
        c.on_response(ticket, Ok(HttpResponse::json(404, r#"{"error":"Cliente no encontrado"}"#)));
        assert_eq!(c.banner().unwrap().text, "Cliente no encontrado");
        assert!(c.view().results.is_some());
        assert!(!c.is_busy());

        let (ticket, _) = only_send(&c.export_customer(ExportFormat::Csv));
        c.on_response(ticket, Err(TransportError::new("down")));
        assert_eq!(c.banner().unwrap().text, MSG_EXPORT_FAILED);
        assert!(c.view().results.is_some());
        assert!(!c.is_busy());
        assert!(c.view().form.button.enabled);
    }

    #[test]
    fn report_transport_failure_releases_busy() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.generate_loyalty_report());
        assert!(c.is_busy());
        let commands = c.on_response(ticket, Err(TransportError::new("connection refused")));
        assert!(!commands.iter().any(|cmd| matches!(cmd, Command::Download(_))));
        assert_eq!(c.banner().unwrap().text, MSG_REPORT_FAILED);
        assert_eq!(c.banner().unwrap().kind, BannerKind::Error);
        assert!(!c.is_busy());
        assert!(c.view().form.button.enabled);
    }

    #[test]
    fn report_failure_message_precedence() {
        let cases = [
            (r#"{"mensaje":"nadie","error":"tecnico"}"#, "nadie"),
            (r#"{"error":"tecnico"}"#, "tecnico"),
            (r#"{}"#, MSG_NO_QUALIFYING_CUSTOMERS),
            ("not json", MSG_NO_QUALIFYING_CUSTOMERS),
        ];
        for (body, expected) in cases {
            let mut c = controller();
            let (ticket, request) = only_send(&c.generate_loyalty_report());
            assert_eq!(request.method, HttpMethod::Get);
            assert!(request.body.is_none());
            c.on_response(ticket, Ok(HttpResponse::json(404, body)));
            assert_eq!(c.banner().unwrap().text, expected, "body {body}");
        }
    }

    #[test]
    fn report_success_downloads_and_schedules_dismiss() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.generate_loyalty_report());
        let response = HttpResponse {
            status: 200,
            headers: vec![(
                "Content-Disposition".to_string(),
                "attachment; filename=reporte_fidelizacion_20240101_000000.xlsx".to_string(),
            )],
            body: b"data".to_vec(),
        };
        let commands = c.on_response(ticket, Ok(response));
        assert!(commands.contains(&Command::Download(crate::types::Download {
            filename: "reporte_fidelizacion_20240101_000000.xlsx".to_string(),
            bytes: b"data".to_vec(),
        })));
        let token = c.banner().unwrap().token;
        assert!(commands.contains(&Command::Schedule {
            timer: Timer::DismissBanner(token),
            after: SUCCESS_BANNER_TTL,
        }));
        assert_eq!(c.banner().unwrap().text, MSG_REPORT_READY);
        assert!(!c.is_busy());
    }

    #[test]
    fn success_banner_dismissal_restores_error_palette() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.generate_loyalty_report());
        c.on_response(
            ticket,
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Vec::new(),
            }),
        );
        assert_eq!(c.view().banner.unwrap().palette, SUCCESS_PALETTE);
        let token = c.banner().unwrap().token;

        c.on_timer(Timer::DismissBanner(token));
        assert!(c.view().banner.is_none());

        let _ = c.export_customer(ExportFormat::Csv);
        assert_eq!(c.view().banner.unwrap().palette, ERROR_PALETTE);
    }

    #[test]
    fn dismiss_timer_never_hides_newer_banner() {
        let mut c = controller();
        let (ticket, _) = only_send(&c.generate_loyalty_report());
        c.on_response(
            ticket,
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: Vec::new(),
            }),
        );
        let token = c.banner().unwrap().token;
        let _ = c.export_customer(ExportFormat::Excel);

        c.on_timer(Timer::DismissBanner(token));
        let banner = c.view().banner.expect("error banner stays");
        assert_eq!(banner.palette, ERROR_PALETTE);
        assert!(banner.text.ends_with(MSG_NO_CUSTOMER_SELECTED));
    }
}
