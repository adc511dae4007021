//! User entity - an operator of the back office and the permissions they hold.
//!
//! Users live in a single global scope ([`USERS_SCOPE`]) rather than under another
//! user's ownership. Passwords are stored as Argon2id PHC strings.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Owner scope shared by every user record.
pub const USERS_SCOPE: &str = "lumanet";

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Timestamp-based identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Always [`USERS_SCOPE`]
    #[serde(default)]
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Login e-mail, unique across users
    pub email: String,
    /// Argon2id PHC hash of the password
    pub password_hash: String,
    /// Admins implicitly hold every permission
    pub role: UserRole,
    /// Inactive users cannot log in
    pub status: UserStatus,
    /// Explicitly granted capabilities
    #[sea_orm(column_type = "Json")]
    pub permissions: PermissionSet,
    /// Creation time
    pub created_at: DateTimeUtc,
}

/// User role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Access limited to the permission set
    #[sea_orm(string_value = "user")]
    User,
}

/// User account status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// May log in
    #[sea_orm(string_value = "active")]
    Active,
    /// Login refused
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl UserStatus {
    /// The opposite status, used by the status toggle.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// A named capability gating visibility or mutation of a feature area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// See the dashboard
    ViewDashboard,
    /// List clients
    ViewClients,
    /// Add, edit and delete clients
    ManageClients,
    /// List subscriptions
    ViewSubscriptions,
    /// Add, edit and delete subscriptions
    ManageSubscriptions,
    /// List invoices
    ViewInvoices,
    /// Add, edit and delete invoices
    ManageInvoices,
    /// Reports and revenue tooling
    ViewReports,
    /// User administration
    ManageUsers,
}

impl Permission {
    /// Every permission, in display order.
    pub const ALL: [Self; 9] = [
        Self::ViewDashboard,
        Self::ViewClients,
        Self::ManageClients,
        Self::ViewSubscriptions,
        Self::ManageSubscriptions,
        Self::ViewInvoices,
        Self::ManageInvoices,
        Self::ViewReports,
        Self::ManageUsers,
    ];

    /// Granted to new non-admin users unless specified otherwise.
    pub const DEFAULT_USER: [Self; 4] = [
        Self::ViewDashboard,
        Self::ViewClients,
        Self::ViewSubscriptions,
        Self::ViewInvoices,
    ];

    /// Wire name (`view_dashboard`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewDashboard => "view_dashboard",
            Self::ViewClients => "view_clients",
            Self::ManageClients => "manage_clients",
            Self::ViewSubscriptions => "view_subscriptions",
            Self::ManageSubscriptions => "manage_subscriptions",
            Self::ViewInvoices => "view_invoices",
            Self::ManageInvoices => "manage_invoices",
            Self::ViewReports => "view_reports",
            Self::ManageUsers => "manage_users",
        }
    }

    /// Localized label shown in the permission editor
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewDashboard => "Ver Dashboard",
            Self::ViewClients => "Ver Clientes",
            Self::ManageClients => "Gerenciar Clientes",
            Self::ViewSubscriptions => "Ver Assinaturas",
            Self::ManageSubscriptions => "Gerenciar Assinaturas",
            Self::ViewInvoices => "Ver Faturas",
            Self::ManageInvoices => "Gerenciar Faturas",
            Self::ViewReports => "Ver Relatórios",
            Self::ManageUsers => "Gerenciar Usuários",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of permissions, stored as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct PermissionSet(pub BTreeSet<Permission>);

impl PermissionSet {
    /// Every permission.
    #[must_use]
    pub fn all() -> Self {
        Permission::ALL.into_iter().collect()
    }

    /// The default non-admin grant.
    #[must_use]
    pub fn default_user() -> Self {
        Permission::DEFAULT_USER.into_iter().collect()
    }

    /// Whether `permission` is in the set.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
