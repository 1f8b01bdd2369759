//! In-memory customer data and the loyalty rule.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Spend above this amount (COP) in the last `LOYALTY_WINDOW_DAYS` qualifies.
pub const LOYALTY_THRESHOLD: f64 = 5_000_000.0;
pub const LOYALTY_WINDOW_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct DocumentKind {
    pub code: &'static str,
    pub description: &'static str,
}

pub static DOCUMENT_KINDS: [DocumentKind; 3] = [
    DocumentKind {
        code: "CC",
        description: "Cédula de Ciudadanía",
    },
    DocumentKind {
        code: "NIT",
        description: "NIT",
    },
    DocumentKind {
        code: "PA",
        description: "Pasaporte",
    },
];

#[derive(Clone, Debug)]
pub struct Purchase {
    pub at: NaiveDateTime,
    pub amount: f64,
    pub description: Option<String>,
    pub invoice: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Client {
    pub type_code: &'static str,
    pub number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub registered: NaiveDate,
    pub purchases: Vec<Purchase>,
}

impl Client {
    pub fn kind(&self) -> &'static DocumentKind {
        DOCUMENT_KINDS
            .iter()
            .find(|k| k.code == self.type_code)
            .unwrap_or(&DOCUMENT_KINDS[0])
    }

    pub fn total(&self) -> f64 {
        self.purchases.iter().map(|p| p.amount).sum()
    }

    /// Purchases on or after `now - LOYALTY_WINDOW_DAYS`.
    pub fn recent(&self, now: NaiveDateTime) -> Vec<&Purchase> {
        let cutoff = now - Duration::days(LOYALTY_WINDOW_DAYS);
        self.purchases.iter().filter(|p| p.at >= cutoff).collect()
    }

    pub fn recent_total(&self, now: NaiveDateTime) -> f64 {
        self.recent(now).iter().map(|p| p.amount).sum()
    }

    pub fn qualifies(&self, now: NaiveDateTime) -> bool {
        self.recent_total(now) > LOYALTY_THRESHOLD
    }
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    pub clients: Vec<Client>,
}

impl Store {
    pub fn find(&self, kind: &str, number: &str) -> Option<&Client> {
        self.clients
            .iter()
            .find(|c| c.type_code == kind && c.number == number)
    }

    pub fn find_by_number(&self, number: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.number == number)
    }

    /// Demo data anchored at `now`: two qualifying customers, one below the
    /// threshold, one whose big purchases are too old, one without purchases.
    pub fn seeded(now: NaiveDateTime) -> Self {
        let days = |n: i64| now - Duration::days(n);
        let purchase = |n: i64, amount: f64, description: Option<&str>, invoice: &str| Purchase {
            at: days(n),
            amount,
            description: description.map(str::to_string),
            invoice: Some(invoice.to_string()),
        };
        let client = |type_code, number: &str, name: (&str, &str), contact: (&str, &str), since| {
            Client {
                type_code,
                number: number.to_string(),
                first_name: name.0.to_string(),
                last_name: name.1.to_string(),
                email: contact.0.to_string(),
                phone: contact.1.to_string(),
                registered: days(since).date(),
                purchases: Vec::new(),
            }
        };

        let mut valeria = client(
            "CC",
            "1020304050",
            ("Valeria", "Ortiz Páez"),
            ("valeria.ortiz@correo.co", "3105550101"),
            210,
        );
        valeria.purchases = vec![
            purchase(3, 3_200_000.0, Some("Nevera side by side"), "FAC-1001"),
            purchase(12, 2_150_000.0, Some("Lavadora 18 kg"), "FAC-1002"),
            purchase(70, 480_000.0, None, "FAC-1003"),
        ];

        let mut ferreteria = client(
            "NIT",
            "901234567-8",
            ("Ferretería", "Los Andes SAS"),
            ("compras@losandes.co", "6015550202"),
            400,
        );
        ferreteria.purchases = vec![
            purchase(1, 4_000_000.0, Some("Portátiles x4"), "FAC-2001"),
            purchase(20, 3_750_000.0, Some("Impresoras"), "FAC-2002"),
        ];

        let mut tomas = client(
            "CC",
            "1098765432",
            ("Tomás", "Herrera Gil"),
            ("tomas.herrera@correo.co", "3205550303"),
            95,
        );
        tomas.purchases = vec![
            purchase(5, 890_000.0, Some("Televisor 50\""), "FAC-3001"),
            purchase(15, 120_000.0, None, "FAC-3002"),
        ];

        let mut lucia = client(
            "CC",
            "5544332211",
            ("Lucía", "Mejía Rueda"),
            ("lucia.mejia@correo.co", "3155550404"),
            300,
        );
        lucia.purchases = vec![
            purchase(45, 6_000_000.0, Some("Sala completa"), "FAC-4001"),
            purchase(60, 1_500_000.0, Some("Comedor"), "FAC-4002"),
        ];

        let ethan = client(
            "PA",
            "XK778899",
            ("Ethan", "Brooks"),
            ("ethan.brooks@mail.com", "3185550505"),
            10,
        );

        Self {
            clients: vec![valeria, ferreteria, tomas, lucia, ethan],
        }
    }
}
