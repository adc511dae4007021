//! Search filtering for list views.

use crate::entities::{ClientModel, InvoiceModel, SubscriptionModel, UserModel};

/// Records that can be matched against a search term.
pub trait Searchable {
    /// Fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match on any field. An empty term matches.
    fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Searchable for ClientModel {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.email, &self.national_id]
    }
}

impl Searchable for SubscriptionModel {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.client_name, &self.plan]
    }
}

impl Searchable for InvoiceModel {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.client_name, &self.description]
    }
}

impl Searchable for UserModel {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.email]
    }
}

/// Records matching `term`, in their original order. `None` keeps everything.
#[must_use]
pub fn filter_records<T: Searchable + Clone>(records: &[T], term: Option<&str>) -> Vec<T> {
    let term = term.unwrap_or_default();
    records
        .iter()
        .filter(|record| record.matches(term))
        .cloned()
        .collect()
}
