//! Plain-text drawing of the page view model.

use std::fmt::Write;

use lookup_core::view::{
    BannerView, CardStyle, CustomerListView, PurchaseTable, ResultView,
};
use lookup_core::DocumentType;

pub fn customers(list: &CustomerListView) -> String {
    let cards = match list {
        CustomerListView::Placeholder(placeholder) => return format!("{}\n", placeholder.text()),
        CustomerListView::Grid(cards) => cards,
    };
    let mut out = String::new();
    for card in cards {
        let marker = match card.style {
            CardStyle::Loyalty => "*",
            CardStyle::Regular => " ",
        };
        let _ = writeln!(
            out,
            "{marker}#{:<3} [{}] {}",
            card.index + 1,
            card.type_code,
            card.full_name
        );
        let _ = writeln!(out, "       📄 {}", card.document_number);
        let _ = writeln!(out, "       📧 {}  📞 {}", card.email, card.phone);
        let _ = writeln!(out, "       💰 Último mes: {}", card.last_month_total);
        if let Some(badge) = card.badge {
            let _ = writeln!(out, "       {badge}");
        }
    }
    out
}

pub fn banner(banner: &BannerView) -> String {
    format!("{}\n", banner.text)
}

pub fn result(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tipo de documento:   {}", view.document_type);
    let _ = writeln!(out, "Número de documento: {}", view.document_number);
    let _ = writeln!(out, "Nombre:              {}", view.full_name);
    let _ = writeln!(out, "Correo:              {}", view.email);
    let _ = writeln!(out, "Teléfono:            {}", view.phone);
    let _ = writeln!(out, "Fecha de registro:   {}", view.registered_on);
    let _ = writeln!(out, "Total compras:       {}", view.total);
    let _ = writeln!(out, "Número de compras:   {}", view.count);
    out.push('\n');
    match &view.purchases {
        PurchaseTable::Rows(rows) => {
            let _ = writeln!(
                out,
                "{:<12} {:<30} {:>16} {}",
                "Fecha", "Descripción", "Monto", "Factura"
            );
            for row in rows {
                let _ = writeln!(
                    out,
                    "{:<12} {:<30} {:>16} {}",
                    row.date, row.description, row.amount, row.invoice_number
                );
            }
        }
        PurchaseTable::Empty { message, .. } => {
            let _ = writeln!(out, "{message}");
        }
    }
    out
}

pub fn document_types(types: &[DocumentType]) -> String {
    types
        .iter()
        .map(|t| format!("{:<5} {}\n", t.code, t.description))
        .collect()
}
