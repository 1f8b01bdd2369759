//! View model: the page as plain data.
//!
//! # Design
//! Every function here is a pure projection from controller state to
//! structured render instructions. Hosts draw a `PageView` however they like
//! (terminal, HTML, test assertions); nothing in this module knows about a
//! screen.

use crate::controller::{Banner, BannerKind, ListState};
use crate::format::{format_currency, format_date};
use crate::types::{CustomerDetail, CustomerSummary, DocumentType, PurchaseRecord};

pub const SEARCH_LABEL: &str = "🔎 Buscar";
pub const BUSY_LABEL: &str = "⏳ Buscando...";
pub const LOYALTY_BADGE: &str = "⭐ CALIFICA FIDELIZACIÓN";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_PURCHASES: &str = "No hay compras registradas";
pub const ERROR_GLYPH: &str = "❌";
pub const SUCCESS_GLYPH: &str = "✅";

/// Column count of the purchase table; the empty row spans all of them.
pub const PURCHASE_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub customers: CustomerListView,
    pub form: SearchFormView,
    pub banner: Option<BannerView>,
    pub results: Option<ResultView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerListView {
    Placeholder(ListPlaceholder),
    Grid(Vec<CustomerCard>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPlaceholder {
    Loading,
    Empty,
    Failed,
}

impl ListPlaceholder {
    pub fn text(self) -> &'static str {
        match self {
            ListPlaceholder::Loading => "Cargando clientes...",
            ListPlaceholder::Empty => "No hay clientes registrados",
            ListPlaceholder::Failed => "Error al cargar clientes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    Regular,
    /// Highlighted card for customers that qualify for the loyalty program.
    Loyalty,
}

/// One clickable customer card. `index` is what the host passes back to
/// `PageController::select_customer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerCard {
    pub index: usize,
    pub type_code: String,
    pub full_name: String,
    pub document_number: String,
    pub email: String,
    pub phone: String,
    pub last_month_total: String,
    pub badge: Option<&'static str>,
    pub style: CardStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFormView {
    pub document_type: String,
    pub document_number: String,
    pub document_types: Vec<DocumentType>,
    pub button: ButtonView,
}

/// Colors of the shared banner element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub color: &'static str,
    pub border: &'static str,
}

pub const ERROR_PALETTE: Palette = Palette {
    background: "#f8d7da",
    color: "#721c24",
    border: "#f5c6cb",
};

pub const SUCCESS_PALETTE: Palette = Palette {
    background: "#d4edda",
    color: "#155724",
    border: "#c3e6cb",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerView {
    pub text: String,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub document_type: String,
    pub document_number: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub registered_on: String,
    pub total: String,
    pub count: u32,
    pub purchases: PurchaseTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseTable {
    Rows(Vec<PurchaseRow>),
    /// A single row spanning `colspan` columns.
    Empty { message: &'static str, colspan: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRow {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub invoice_number: String,
}

pub fn render_customer_list(state: &ListState) -> CustomerListView {
    match state {
        ListState::Loading => CustomerListView::Placeholder(ListPlaceholder::Loading),
        ListState::Failed => CustomerListView::Placeholder(ListPlaceholder::Failed),
        ListState::Loaded(customers) if customers.is_empty() => {
            CustomerListView::Placeholder(ListPlaceholder::Empty)
        }
        ListState::Loaded(customers) => CustomerListView::Grid(
            customers
                .iter()
                .enumerate()
                .map(|(index, customer)| render_card(index, customer))
                .collect(),
        ),
    }
}

pub fn render_card(index: usize, customer: &CustomerSummary) -> CustomerCard {
    let (badge, style) = if customer.qualifies_for_loyalty {
        (Some(LOYALTY_BADGE), CardStyle::Loyalty)
    } else {
        (None, CardStyle::Regular)
    };
    CustomerCard {
        index,
        type_code: customer.type_code.clone(),
        full_name: customer.full_name.clone(),
        document_number: customer.document_number.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        last_month_total: format_currency(customer.last_month_total),
        badge,
        style,
    }
}

pub fn render_button(busy: bool) -> ButtonView {
    if busy {
        ButtonView {
            enabled: false,
            label: BUSY_LABEL,
        }
    } else {
        ButtonView {
            enabled: true,
            label: SEARCH_LABEL,
        }
    }
}

pub fn render_banner(banner: &Banner) -> BannerView {
    let (glyph, palette) = match banner.kind {
        BannerKind::Error => (ERROR_GLYPH, ERROR_PALETTE),
        BannerKind::Success => (SUCCESS_GLYPH, SUCCESS_PALETTE),
    };
    BannerView {
        text: format!("{glyph} {}", banner.text),
        palette,
    }
}

pub fn render_result(detail: &CustomerDetail) -> ResultView {
    let customer = &detail.customer;
    let purchases = if detail.purchases.is_empty() {
        PurchaseTable::Empty {
            message: NO_PURCHASES,
            colspan: PURCHASE_COLUMNS,
        }
    } else {
        PurchaseTable::Rows(detail.purchases.iter().map(render_purchase).collect())
    };
    ResultView {
        document_type: customer.document_type.clone(),
        document_number: customer.document_number.clone(),
        full_name: customer.full_name(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        registered_on: format_date(&customer.registered_on),
        total: format_currency(detail.total),
        count: detail.count,
        purchases,
    }
}

fn render_purchase(purchase: &PurchaseRecord) -> PurchaseRow {
    PurchaseRow {
        date: format_date(&purchase.purchased_at),
        description: or_placeholder(purchase.description.as_deref()),
        amount: format_currency(purchase.amount),
        invoice_number: or_placeholder(purchase.invoice_number.as_deref()),
    }
}

/// Empty strings count as absent, like the falsy check the page always did.
fn or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
