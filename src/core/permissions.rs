//! Permission checks for sections and feature actions.
//!
//! The rule is simple: no user has nothing, an admin has everything, anyone else
//! has exactly their permission set. Every feature area maps reads to its view
//! permission and add/edit/delete to its manage permission.

use crate::entities::{Permission, UserModel, UserRole};
use crate::errors::{Error, Result};
use serde::Serialize;

/// Whether `user` holds `permission`.
#[must_use]
pub fn has_permission(user: Option<&UserModel>, permission: Permission) -> bool {
    user.is_some_and(|user| user.role == UserRole::Admin || user.permissions.contains(permission))
}

/// Top-level areas of the console
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Overview figures
    Dashboard,
    /// Client list
    Clients,
    /// Subscription list
    Subscriptions,
    /// Invoice list
    Invoices,
    /// Reports and revenue tools
    Reports,
    /// User administration
    Users,
}

impl Section {
    /// Every section in menu order.
    pub const ALL: [Self; 6] = [
        Self::Dashboard,
        Self::Clients,
        Self::Subscriptions,
        Self::Invoices,
        Self::Reports,
        Self::Users,
    ];

    /// Permission needed to open the section.
    #[must_use]
    pub const fn required_permission(self) -> Permission {
        match self {
            Self::Dashboard => Permission::ViewDashboard,
            Self::Clients => Permission::ViewClients,
            Self::Subscriptions => Permission::ViewSubscriptions,
            Self::Invoices => Permission::ViewInvoices,
            Self::Reports => Permission::ViewReports,
            Self::Users => Permission::ManageUsers,
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Clients => "Clientes",
            Self::Subscriptions => "Assinaturas",
            Self::Invoices => "Faturas",
            Self::Reports => "Relatórios",
            Self::Users => "Usuários",
        }
    }

    const fn access_phrase(self) -> &'static str {
        match self {
            Self::Dashboard => "o dashboard",
            Self::Clients => "a lista de clientes",
            Self::Subscriptions => "as assinaturas",
            Self::Invoices => "as faturas",
            Self::Reports => "os relatórios",
            Self::Users => "a gestão de usuários",
        }
    }
}

/// Sections `user` may open, in menu order.
#[must_use]
pub fn visible_sections(user: &UserModel) -> Vec<Section> {
    Section::ALL
        .into_iter()
        .filter(|section| has_permission(Some(user), section.required_permission()))
        .collect()
}

/// Fails with a localized message unless `user` may open `section`.
pub fn require_section(user: &UserModel, section: Section) -> Result<()> {
    let permission = section.required_permission();
    if has_permission(Some(user), permission) {
        return Ok(());
    }
    Err(Error::PermissionDenied {
        permission,
        message: format!(
            "Você não tem permissão para acessar {}.",
            section.access_phrase()
        ),
    })
}

/// Feature areas with view/manage permission pairs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    /// Clients
    Clients,
    /// Subscriptions
    Subscriptions,
    /// Invoices
    Invoices,
}

impl Feature {
    /// Every gated feature.
    pub const ALL: [Self; 3] = [Self::Clients, Self::Subscriptions, Self::Invoices];

    /// Permission for reading the feature's records.
    #[must_use]
    pub const fn view_permission(self) -> Permission {
        match self {
            Self::Clients => Permission::ViewClients,
            Self::Subscriptions => Permission::ViewSubscriptions,
            Self::Invoices => Permission::ViewInvoices,
        }
    }

    /// Permission for changing the feature's records.
    #[must_use]
    pub const fn manage_permission(self) -> Permission {
        match self {
            Self::Clients => Permission::ManageClients,
            Self::Subscriptions => Permission::ManageSubscriptions,
            Self::Invoices => Permission::ManageInvoices,
        }
    }

    const fn section(self) -> Section {
        match self {
            Self::Clients => Section::Clients,
            Self::Subscriptions => Section::Subscriptions,
            Self::Invoices => Section::Invoices,
        }
    }

    const fn plural(self) -> &'static str {
        match self {
            Self::Clients => "clientes",
            Self::Subscriptions => "assinaturas",
            Self::Invoices => "faturas",
        }
    }
}

/// What the caller wants to do with a feature's records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// List or search
    View,
    /// Create
    Add,
    /// Update
    Edit,
    /// Remove
    Delete,
}

impl Action {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::View, Self::Add, Self::Edit, Self::Delete];

    const fn verb(self) -> &'static str {
        match self {
            Self::View => "ver",
            Self::Add => "adicionar",
            Self::Edit => "editar",
            Self::Delete => "excluir",
        }
    }
}

/// Permission required to perform `action` on `feature`.
#[must_use]
pub const fn permission_for(feature: Feature, action: Action) -> Permission {
    match action {
        Action::View => feature.view_permission(),
        Action::Add | Action::Edit | Action::Delete => feature.manage_permission(),
    }
}

/// Fails with a localized message unless `user` may perform `action` on `feature`.
pub fn require(user: &UserModel, feature: Feature, action: Action) -> Result<()> {
    if action == Action::View {
        return require_section(user, feature.section());
    }
    let permission = permission_for(feature, action);
    if has_permission(Some(user), permission) {
        return Ok(());
    }
    Err(Error::PermissionDenied {
        permission,
        message: format!(
            "Você não tem permissão para {} {}.",
            action.verb(),
            feature.plural()
        ),
    })
}

/// Fails unless `user` holds `permission`; used for areas without a feature pair.
pub fn require_permission(user: &UserModel, permission: Permission) -> Result<()> {
    if has_permission(Some(user), permission) {
        return Ok(());
    }
    let section = Section::ALL
        .into_iter()
        .find(|section| section.required_permission() == permission);
    let message = section.map_or_else(
        || format!("Você não tem permissão: {}.", permission.label()),
        |section| {
            format!(
                "Você não tem permissão para acessar {}.",
                section.access_phrase()
            )
        },
    );
    Err(Error::PermissionDenied {
        permission,
        message,
    })
}
