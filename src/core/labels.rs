//! Localized (pt-AO) labels for status values and money.

use crate::entities::{
    ClientStatus, ExpenseKind, InvoiceStatus, SubscriptionStatus, UserRole, UserStatus,
};
use serde::Serialize;

/// Visual weight of a badge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Good state (green)
    Success,
    /// Needs attention (amber)
    Warning,
    /// Bad state (red)
    Danger,
    /// Neutral (grey)
    Muted,
    /// Informational (blue)
    Info,
}

/// A label plus a tone, rendered next to a status value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Localized text
    pub label: &'static str,
    /// Colour hint
    pub tone: Tone,
}

const fn badge(label: &'static str, tone: Tone) -> StatusBadge {
    StatusBadge { label, tone }
}

/// Values that render as a badge.
pub trait Badged {
    /// The badge for this value.
    fn badge(&self) -> StatusBadge;
}

impl Badged for ClientStatus {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Active => badge("Ativo", Tone::Success),
            Self::Inactive => badge("Inativo", Tone::Muted),
        }
    }
}

impl Badged for SubscriptionStatus {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Active => badge("Ativa", Tone::Success),
            Self::Cancelled => badge("Cancelada", Tone::Danger),
            Self::Suspended => badge("Suspensa", Tone::Muted),
        }
    }
}

impl Badged for InvoiceStatus {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Paid => badge("Paga", Tone::Success),
            Self::Pending => badge("Pendente", Tone::Warning),
            Self::Overdue => badge("Vencida", Tone::Danger),
        }
    }
}

impl Badged for UserStatus {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Active => badge("Ativo", Tone::Success),
            Self::Inactive => badge("Inativo", Tone::Danger),
        }
    }
}

impl Badged for UserRole {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Admin => badge("Administrador", Tone::Info),
            Self::User => badge("Usuário", Tone::Muted),
        }
    }
}

impl Badged for ExpenseKind {
    fn badge(&self) -> StatusBadge {
        match self {
            Self::Fixed => badge("Fixa", Tone::Info),
            Self::Variable => badge("Variável", Tone::Warning),
        }
    }
}

/// Formats an amount as `Kz 15.650,00` (dot thousands, comma decimals).
#[must_use]
pub fn format_kwanza(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("Kz {sign}{grouped},{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_badges() {
        assert_eq!(ClientStatus::Active.badge(), badge("Ativo", Tone::Success));
        assert_eq!(ClientStatus::Inactive.badge(), badge("Inativo", Tone::Muted));
    }

    #[test]
    fn test_subscription_badges() {
        assert_eq!(SubscriptionStatus::Active.badge().label, "Ativa");
        assert_eq!(SubscriptionStatus::Cancelled.badge().label, "Cancelada");
        assert_eq!(SubscriptionStatus::Cancelled.badge().tone, Tone::Danger);
        assert_eq!(SubscriptionStatus::Suspended.badge().label, "Suspensa");
        assert_eq!(SubscriptionStatus::Suspended.badge().tone, Tone::Muted);
    }

    #[test]
    fn test_invoice_badges() {
        assert_eq!(InvoiceStatus::Paid.badge(), badge("Paga", Tone::Success));
        assert_eq!(InvoiceStatus::Pending.badge(), badge("Pendente", Tone::Warning));
        assert_eq!(InvoiceStatus::Overdue.badge(), badge("Vencida", Tone::Danger));
    }

    #[test]
    fn test_user_badges() {
        assert_eq!(UserStatus::Active.badge().label, "Ativo");
        assert_eq!(UserStatus::Inactive.badge().label, "Inativo");
        assert_eq!(UserRole::Admin.badge().label, "Administrador");
        assert_eq!(UserRole::User.badge().label, "Usuário");
    }

    #[test]
    fn test_format_kwanza() {
        assert_eq!(format_kwanza(15_650.0), "Kz 15.650,00");
        assert_eq!(format_kwanza(28_952.05), "Kz 28.952,05");
        assert_eq!(format_kwanza(0.0), "Kz 0,00");
        assert_eq!(format_kwanza(999.999), "Kz 1.000,00");
        assert_eq!(format_kwanza(1_234_567.5), "Kz 1.234.567,50");
        assert_eq!(format_kwanza(-500.0), "Kz -500,00");
    }
}
