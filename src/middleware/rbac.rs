// src/middleware/rbac.rs

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::CurrentUser, i18n::Locale},
    models::{
        rbac::{PermissionEntry, RoleGrant},
        status::EntityStatus,
    },
};

/// O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Política de acesso: (cargo, permissão) -> permitido?
/// Injetada no `AppState` para poder ser trocada nos testes.
pub trait PermissionPolicy: Send + Sync {
    fn allows(&self, role: &RoleGrant, permission: &str) -> bool;
}

const WILDCARD: &str = "*";

/// Tabela fixa de cargos de sistema; os demais cargos usam as permissões
/// gravadas no próprio cargo (restritas ao catálogo).
pub struct StaticPermissionPolicy {
    builtin: HashMap<&'static str, HashSet<&'static str>>,
}

impl StaticPermissionPolicy {
    pub fn new() -> Self {
        let mut builtin = HashMap::new();
        builtin.insert(ADMIN_ROLE, HashSet::from([WILDCARD]));
        builtin.insert(
            SELLER_ROLE,
            HashSet::from([
                "sales:read",
                "sales:write",
                "customers:read",
                "customers:write",
                "products:read",
                "categories:read",
            ]),
        );
        builtin.insert(
            STOCK_ROLE,
            HashSet::from([
                "products:read",
                "products:write",
                "categories:read",
                "categories:write",
                "providers:read",
                "providers:write",
                "purchases:read",
                "purchases:write",
                "reports:export",
            ]),
        );
        Self { builtin }
    }
}

impl Default for StaticPermissionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionPolicy for StaticPermissionPolicy {
    fn allows(&self, role: &RoleGrant, permission: &str) -> bool {
        if role.status != EntityStatus::Active {
            return false;
        }
        match self.builtin.get(role.name.as_str()) {
            Some(granted) => granted.contains(WILDCARD) || granted.contains(permission),
            None => {
                PermissionEntry::is_known(permission)
                    && role.permissions.iter().any(|p| p == permission)
            }
        }
    }
}

pub const ADMIN_ROLE: &str = "admin";
pub const SELLER_ROLE: &str = "vendedor";
pub const STOCK_ROLE: &str = "estoquista";

/// Nomes com permissões fixas na política; ninguém pode criar, renomear
/// para, renomear, desativar ou excluir um cargo com esses nomes.
pub const SYSTEM_ROLES: [&str; 3] = [ADMIN_ROLE, SELLER_ROLE, STOCK_ROLE];

pub fn is_system_role(name: &str) -> bool {
    let name = name.trim();
    SYSTEM_ROLES.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        // A. Extrai Usuário (inserido pelo auth_guard)
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        // B. Consulta a política
        let required_perm = T::slug();
        if !app_state.policy.allows(&user.grant, required_perm) {
            tracing::warn!(
                user_id = %user.user.id,
                role = %user.grant.name,
                permission = required_perm,
                "acesso negado"
            );
            return Err(AppError::Forbidden(required_perm.to_string()).to_api_error(&locale));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

// Declara o tipo e registra a entrada no catálogo.
macro_rules! permission {
    ($ty:ident, $slug:literal, $description:literal, $module:literal) => {
        pub struct $ty;
        impl PermissionDef for $ty {
            fn slug() -> &'static str {
                $slug
            }
        }
        inventory::submit! {
            PermissionEntry::new($slug, $description, $module)
        }
    };
}

permission!(PermCustomersRead, "customers:read", "Visualizar clientes", "CUSTOMERS");
permission!(PermCustomersWrite, "customers:write", "Cadastrar e editar clientes", "CUSTOMERS");
permission!(PermCustomersDelete, "customers:delete", "Excluir clientes", "CUSTOMERS");

permission!(PermProductsRead, "products:read", "Visualizar produtos", "PRODUCTS");
permission!(PermProductsWrite, "products:write", "Cadastrar e editar produtos", "PRODUCTS");
permission!(PermProductsDelete, "products:delete", "Excluir produtos", "PRODUCTS");

permission!(PermCategoriesRead, "categories:read", "Visualizar categorias", "CATEGORIES");
permission!(PermCategoriesWrite, "categories:write", "Cadastrar e editar categorias", "CATEGORIES");
permission!(PermCategoriesDelete, "categories:delete", "Excluir categorias", "CATEGORIES");

permission!(PermProvidersRead, "providers:read", "Visualizar fornecedores", "PROVIDERS");
permission!(PermProvidersWrite, "providers:write", "Cadastrar e editar fornecedores", "PROVIDERS");
permission!(PermProvidersDelete, "providers:delete", "Excluir fornecedores", "PROVIDERS");

permission!(PermPurchasesRead, "purchases:read", "Visualizar compras", "PURCHASES");
permission!(PermPurchasesWrite, "purchases:write", "Registrar compras e alterar status", "PURCHASES");
permission!(PermPurchasesDelete, "purchases:delete", "Excluir compras inativas", "PURCHASES");

permission!(PermSalesRead, "sales:read", "Visualizar vendas", "SALES");
permission!(PermSalesWrite, "sales:write", "Registrar vendas e alterar status", "SALES");
permission!(PermSalesDelete, "sales:delete", "Excluir vendas pendentes ou canceladas", "SALES");

permission!(PermRolesRead, "roles:read", "Visualizar cargos", "ROLES");
permission!(PermRolesWrite, "roles:write", "Cadastrar e editar cargos", "ROLES");
permission!(PermRolesDelete, "roles:delete", "Excluir cargos", "ROLES");

permission!(PermBranchesRead, "branches:read", "Visualizar filiais", "BRANCHES");
permission!(PermBranchesWrite, "branches:write", "Cadastrar e editar filiais", "BRANCHES");
permission!(PermBranchesDelete, "branches:delete", "Excluir filiais", "BRANCHES");

permission!(PermUsersWrite, "users:write", "Cadastrar usuários", "USERS");

permission!(PermReportsExport, "reports:export", "Exportar relatórios PDF/Excel", "REPORTS");

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(name: &str, permissions: &[&str], status: EntityStatus) -> RoleGrant {
        RoleGrant {
            name: name.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            status,
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let policy = StaticPermissionPolicy::new();
        let admin = grant(ADMIN_ROLE, &[], EntityStatus::Active);
        assert!(policy.allows(&admin, "sales:delete"));
        assert!(policy.allows(&admin, "reports:export"));
    }

    #[test]
    fn builtin_table_wins_over_stored_permissions() {
        let policy = StaticPermissionPolicy::new();
        // o que está gravado no cargo de sistema é ignorado
        let seller = grant(SELLER_ROLE, &["roles:write"], EntityStatus::Active);
        assert!(policy.allows(&seller, "sales:write"));
        assert!(!policy.allows(&seller, "roles:write"));
        assert!(!policy.allows(&seller, "purchases:write"));
    }

    #[test]
    fn system_role_names_match_the_builtin_table() {
        let policy = StaticPermissionPolicy::new();
        for name in SYSTEM_ROLES {
            assert!(policy.builtin.contains_key(name));
            assert!(is_system_role(name));
        }
        assert!(is_system_role(" Admin "));
        assert!(!is_system_role("auditor"));
    }

    #[test]
    fn custom_roles_use_their_own_permission_set() {
        let policy = StaticPermissionPolicy::new();
        let auditor = grant("auditor", &["sales:read", "made:up"], EntityStatus::Active);
        assert!(policy.allows(&auditor, "sales:read"));
        assert!(!policy.allows(&auditor, "sales:write"));
        // fora do catálogo não vale
        assert!(!policy.allows(&auditor, "made:up"));
    }

    #[test]
    fn inactive_roles_grant_nothing() {
        let policy = StaticPermissionPolicy::new();
        assert!(!policy.allows(&grant(ADMIN_ROLE, &[], EntityStatus::Inactive), "sales:read"));
        assert!(!policy.allows(
            &grant("auditor", &["sales:read"], EntityStatus::Inactive),
            "sales:read"
        ));
    }

    #[test]
    fn catalogue_lists_every_declared_permission() {
        let catalogue = PermissionEntry::catalogue();
        assert_eq!(catalogue.len(), 26);
        assert!(PermissionEntry::is_known(PermSalesWrite::slug()));
        assert!(PermissionEntry::is_known("users:write"));
        assert!(!PermissionEntry::is_known("sales:approve"));
    }
}
