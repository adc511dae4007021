//! User administration.
//!
//! Every operation requires `manage_users`. The default administrator (the
//! account whose e-mail matches the configured admin e-mail) cannot be deleted,
//! deactivated, renamed or demoted.

use crate::core::auth::hash_password;
use crate::core::filter::filter_records;
use crate::core::ids::next_id;
use crate::core::labels::{Badged, StatusBadge};
use crate::core::permissions::require_permission;
use crate::entities::{Permission, PermissionSet, UserModel, UserRole, UserStatus, user::USERS_SCOPE};
use crate::errors::{Error, Result};
use crate::store::{Backend, Store};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

/// A user as returned to clients, without the password hash
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Role
    pub role: UserRole,
    /// Role badge
    pub role_badge: StatusBadge,
    /// Account status
    pub status: UserStatus,
    /// Status badge
    pub status_badge: StatusBadge,
    /// Effective permissions
    pub permissions: PermissionSet,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<&UserModel> for UserView {
    fn from(user: &UserModel) -> Self {
        let permissions = if user.role == UserRole::Admin {
            PermissionSet::all()
        } else {
            user.permissions.clone()
        };
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            role_badge: user.role.badge(),
            status: user.status,
            status_badge: user.status.badge(),
            permissions,
            created_at: user.created_at,
        }
    }
}

/// Counters shown above the user list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Every account
    pub total: usize,
    /// Accounts that can log in
    pub active: usize,
    /// Administrators
    pub admins: usize,
}

/// Input for a new account
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Role, `user` when omitted
    #[serde(default = "default_role")]
    pub role: UserRole,
    /// Granted permissions; the default user grant when omitted
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
}

const fn default_role() -> UserRole {
    UserRole::User
}

/// Replacement values for an existing account
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Role
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Granted permissions (ignored for admins)
    #[serde(default)]
    pub permissions: PermissionSet,
    /// New password, unchanged when omitted
    #[serde(default)]
    pub password: Option<String>,
}

fn is_default_admin(user: &UserModel, admin_email: &str) -> bool {
    user.email.eq_ignore_ascii_case(admin_email)
}

fn effective_permissions(role: UserRole, requested: PermissionSet) -> PermissionSet {
    match role {
        UserRole::Admin => PermissionSet::all(),
        UserRole::User => requested,
    }
}

fn validate_identity(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("O nome é obrigatório."));
    }
    if !email.contains('@') {
        return Err(Error::validation("E-mail inválido."));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "A senha deve ter pelo menos {MIN_PASSWORD_LEN} caracteres."
        )));
    }
    Ok(())
}

async fn load_users(store: &Store) -> Result<Vec<UserModel>> {
    store.list(USERS_SCOPE).await
}

async fn find_user(store: &Store, id: &str) -> Result<(Vec<UserModel>, UserModel)> {
    let users = load_users(store).await?;
    let user = users
        .iter()
        .find(|user| user.id == id)
        .cloned()
        .ok_or_else(|| Error::not_found("user", id))?;
    Ok((users, user))
}

fn ensure_unique_email(users: &[UserModel], email: &str, except_id: Option<&str>) -> Result<()> {
    let taken = users
        .iter()
        .any(|user| user.email.eq_ignore_ascii_case(email) && Some(user.id.as_str()) != except_id);
    if taken {
        return Err(Error::validation("Já existe um usuário com este e-mail."));
    }
    Ok(())
}

/// Users matching `search`, in creation order.
pub async fn list_users(
    store: &Store,
    actor: &UserModel,
    search: Option<&str>,
) -> Result<Vec<UserModel>> {
    require_permission(actor, Permission::ManageUsers)?;
    let users = load_users(store).await?;
    Ok(filter_records(&users, search))
}

/// Account counters.
pub async fn user_stats(store: &Store, actor: &UserModel) -> Result<UserStats> {
    require_permission(actor, Permission::ManageUsers)?;
    let users = load_users(store).await?;
    Ok(UserStats {
        total: users.len(),
        active: users.iter().filter(|u| u.status == UserStatus::Active).count(),
        admins: users.iter().filter(|u| u.role == UserRole::Admin).count(),
    })
}

/// Creates an active account.
pub async fn create_user(store: &Store, actor: &UserModel, input: NewUser) -> Result<UserModel> {
    require_permission(actor, Permission::ManageUsers)?;
    let email = input.email.trim().to_string();
    validate_identity(&input.name, &email)?;
    validate_password(&input.password)?;

    let users = load_users(store).await?;
    ensure_unique_email(&users, &email, None)?;

    let requested = input.permissions.unwrap_or_else(PermissionSet::default_user);
    let user = UserModel {
        id: next_id(),
        owner_id: USERS_SCOPE.to_string(),
        name: input.name.trim().to_string(),
        email,
        password_hash: hash_password(&input.password)?,
        role: input.role,
        status: UserStatus::Active,
        permissions: effective_permissions(input.role, requested),
        created_at: Utc::now(),
    };
    let saved = store.upsert(USERS_SCOPE, &user).await?;
    info!("User {} created by {}", saved.email, actor.email);
    Ok(saved)
}

/// Replaces an account's details.
pub async fn update_user(
    store: &Store,
    actor: &UserModel,
    admin_email: &str,
    id: &str,
    update: UserUpdate,
) -> Result<UserModel> {
    require_permission(actor, Permission::ManageUsers)?;
    let email = update.email.trim().to_string();
    validate_identity(&update.name, &email)?;

    let (users, mut user) = find_user(store, id).await?;
    ensure_unique_email(&users, &email, Some(id))?;

    if is_default_admin(&user, admin_email) {
        let changes_identity = !email.eq_ignore_ascii_case(&user.email) || update.name.trim() != user.name;
        if changes_identity || update.role != UserRole::Admin || update.status != UserStatus::Active {
            return Err(Error::ProtectedAccount {
                message: "Não é possível alterar os dados do usuário administrador padrão.".to_string(),
            });
        }
    }

    if let Some(password) = update.password.as_deref() {
        validate_password(password)?;
        user.password_hash = hash_password(password)?;
    }
    user.name = update.name.trim().to_string();
    user.email = email;
    user.role = update.role;
    user.status = update.status;
    user.permissions = effective_permissions(update.role, update.permissions);

    let saved = store.upsert(USERS_SCOPE, &user).await?;
    info!("User {} updated by {}", saved.email, actor.email);
    Ok(saved)
}

/// Deletes an account.
pub async fn delete_user(store: &Store, actor: &UserModel, admin_email: &str, id: &str) -> Result<()> {
    require_permission(actor, Permission::ManageUsers)?;
    let (_, user) = find_user(store, id).await?;
    if is_default_admin(&user, admin_email) {
        return Err(Error::ProtectedAccount {
            message: "Não é possível excluir o usuário administrador padrão.".to_string(),
        });
    }
    store.delete::<UserModel>(USERS_SCOPE, id).await?;
    info!("User {} deleted by {}", user.email, actor.email);
    Ok(())
}

/// Flips an account between active and inactive.
pub async fn toggle_user_status(
    store: &Store,
    actor: &UserModel,
    admin_email: &str,
    id: &str,
) -> Result<UserModel> {
    require_permission(actor, Permission::ManageUsers)?;
    let (_, mut user) = find_user(store, id).await?;
    if is_default_admin(&user, admin_email) {
        return Err(Error::ProtectedAccount {
            message: "Não é possível alterar o status do usuário administrador padrão.".to_string(),
        });
    }
    user.status = user.status.toggled();
    store.upsert(USERS_SCOPE, &user).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::AdminConfig;
    use crate::core::auth::{seed_default_admin, verify_password};
    use crate::test_utils::{demo_store, sample_user};

    const ADMIN_EMAIL: &str = "admin@lumanet.ao";

    async fn seeded() -> Result<(Store, UserModel)> {
        let store = demo_store();
        let admin = seed_default_admin(&store, &AdminConfig::default())
            .await?
            .unwrap();
        Ok((store, admin))
    }

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: "Ana Lima".to_string(),
            email: email.to_string(),
            password: "abc123".to_string(),
            role,
            permissions: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_defaults_and_admin_grant() -> Result<()> {
        let (store, admin) = seeded().await?;

        let ana = create_user(&store, &admin, new_user("ana@lumanet.ao", UserRole::User)).await?;
        assert_eq!(ana.permissions, PermissionSet::default_user());
        assert_eq!(ana.status, UserStatus::Active);
        assert!(verify_password("abc123", &ana.password_hash)?);

        let boss = create_user(&store, &admin, new_user("boss@lumanet.ao", UserRole::Admin)).await?;
        assert_eq!(boss.permissions, PermissionSet::all());

        let stats = user_stats(&store, &admin).await?;
        assert_eq!(stats, UserStats { total: 3, active: 3, admins: 2 });
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let (store, admin) = seeded().await?;

        let duplicate = create_user(&store, &admin, new_user("ADMIN@lumanet.ao", UserRole::User)).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));

        let mut short = new_user("x@lumanet.ao", UserRole::User);
        short.password = "12345".to_string();
        assert!(matches!(
            create_user(&store, &admin, short).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_requires_manage_users() -> Result<()> {
        let (store, _) = seeded().await?;
        let operator = sample_user("77", "op@lumanet.ao", UserRole::User);
        assert!(matches!(
            list_users(&store, &operator, None).await,
            Err(Error::PermissionDenied { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_default_admin_is_protected() -> Result<()> {
        let (store, admin) = seeded().await?;

        assert!(matches!(
            delete_user(&store, &admin, ADMIN_EMAIL, &admin.id).await,
            Err(Error::ProtectedAccount { .. })
        ));
        assert!(matches!(
            toggle_user_status(&store, &admin, ADMIN_EMAIL, &admin.id).await,
            Err(Error::ProtectedAccount { .. })
        ));

        let demote = UserUpdate {
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: UserRole::User,
            status: UserStatus::Active,
            permissions: PermissionSet::default_user(),
            password: None,
        };
        assert!(matches!(
            update_user(&store, &admin, ADMIN_EMAIL, &admin.id, demote).await,
            Err(Error::ProtectedAccount { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_toggle_and_delete_regular_user() -> Result<()> {
        let (store, admin) = seeded().await?;
        let ana = create_user(&store, &admin, new_user("ana@lumanet.ao", UserRole::User)).await?;

        let promoted = update_user(
            &store,
            &admin,
            ADMIN_EMAIL,
            &ana.id,
            UserUpdate {
                name: "Ana Maria Lima".to_string(),
                email: "ana@lumanet.ao".to_string(),
                role: UserRole::Admin,
                status: UserStatus::Active,
                permissions: PermissionSet::default(),
                password: Some("novasenha".to_string()),
            },
        )
        .await?;
        assert_eq!(promoted.permissions, PermissionSet::all());
        assert!(verify_password("novasenha", &promoted.password_hash)?);

        let toggled = toggle_user_status(&store, &admin, ADMIN_EMAIL, &ana.id).await?;
        assert_eq!(toggled.status, UserStatus::Inactive);

        delete_user(&store, &admin, ADMIN_EMAIL, &ana.id).await?;
        assert_eq!(list_users(&store, &admin, None).await?.len(), 1);
        assert!(matches!(
            delete_user(&store, &admin, ADMIN_EMAIL, &ana.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_view_hides_hash_and_expands_admin_permissions() {
        let mut admin = sample_user("1", ADMIN_EMAIL, UserRole::Admin);
        admin.permissions = PermissionSet::default();
        let view = UserView::from(&admin);
        assert_eq!(view.permissions, PermissionSet::all());
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("Administrador"));
    }
}
