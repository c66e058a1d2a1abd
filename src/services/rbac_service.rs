// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::RbacRepository,
    middleware::rbac::is_system_role,
    models::{
        rbac::{PermissionEntry, Role},
        status::EntityStatus,
    },
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub fn list_permissions(&self) -> Vec<PermissionEntry> {
        PermissionEntry::catalogue()
    }

    pub async fn list_roles(&self, status: Option<EntityStatus>) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles(status).await
    }

    pub async fn get_role(&self, id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_role(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))
    }

    pub async fn create_role(
        &self,
        name: &str,
        description: Option<&str>,
        permissions: &[String],
    ) -> Result<Role, AppError> {
        ensure_free_name(name)?;
        let permissions = normalize_permissions(permissions)?;
        let role = self
            .repo
            .create_role(&self.pool, name, description, &permissions)
            .await?;
        tracing::info!(role = %role.name, permissions = ?role.permissions, "cargo criado");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        permissions: &[String],
    ) -> Result<Role, AppError> {
        let permissions = normalize_permissions(permissions)?;
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_role(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        check_rename(&current, name)?;
        let role = self
            .repo
            .update_role(&mut *tx, id, name, description, &permissions)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        tx.commit().await?;
        Ok(role)
    }

    pub async fn set_role_status(&self, id: Uuid, status: EntityStatus) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_role(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        if status != EntityStatus::Active {
            ensure_not_system(&current)?;
        }
        let role = self
            .repo
            .set_role_status(&mut *tx, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        tx.commit().await?;
        tracing::info!(role = %role.name, status = %role.status, "status do cargo alterado");
        Ok(role)
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let role = self
            .repo
            .find_role(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;
        ensure_not_system(&role)?;
        role.status.ensure_deletable(Resource::Role)?;
        if self.repo.count_role_users(&mut *tx, id).await? > 0 {
            return Err(AppError::InUse(Resource::Role));
        }
        self.repo.delete_role(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(role_id = %id, "cargo excluído");
        Ok(())
    }
}

fn ensure_free_name(name: &str) -> Result<(), AppError> {
    if is_system_role(name) {
        return Err(AppError::ReservedRole(name.trim().to_string()));
    }
    Ok(())
}

fn ensure_not_system(role: &Role) -> Result<(), AppError> {
    if is_system_role(&role.name) {
        return Err(AppError::ReservedRole(role.name.clone()));
    }
    Ok(())
}

/// Cargo de sistema mantém o nome; cargo comum não assume nome de sistema.
/// Descrição e permissões continuam editáveis.
fn check_rename(current: &Role, new_name: &str) -> Result<(), AppError> {
    if new_name.trim() == current.name {
        return Ok(());
    }
    ensure_not_system(current)?;
    ensure_free_name(new_name)
}

/// Remove repetidos, ordena e rejeita códigos fora do catálogo.
fn normalize_permissions(permissions: &[String]) -> Result<Vec<String>, AppError> {
    let mut unknown: Vec<String> = permissions
        .iter()
        .filter(|p| !PermissionEntry::is_known(p))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(AppError::UnknownPermissions(unknown));
    }

    let mut normalized = permissions.to_vec();
    normalized.sort();
    normalized.dedup();
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn codes(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn role(name: &str) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            permissions: vec![],
            status: EntityStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn system_role_names_cannot_be_taken() {
        for name in ["admin", "Vendedor", " estoquista "] {
            assert!(matches!(ensure_free_name(name), Err(AppError::ReservedRole(_))));
        }
        assert!(ensure_free_name("caixa").is_ok());
    }

    #[test]
    fn system_roles_keep_their_name() {
        let admin = role("admin");
        assert!(matches!(
            check_rename(&admin, "gerente"),
            Err(AppError::ReservedRole(name)) if name == "admin"
        ));
        // mesmo nome: só descrição/permissões mudam
        assert!(check_rename(&admin, "admin").is_ok());
    }

    #[test]
    fn custom_role_cannot_be_renamed_to_a_system_name() {
        let caixa = role("caixa");
        assert!(matches!(check_rename(&caixa, "admin"), Err(AppError::ReservedRole(_))));
        assert!(check_rename(&caixa, "caixa-noturno").is_ok());
    }

    #[test]
    fn system_roles_cannot_be_deactivated_or_deleted() {
        assert!(matches!(ensure_not_system(&role("estoquista")), Err(AppError::ReservedRole(_))));
        assert!(ensure_not_system(&role("caixa")).is_ok());
    }

    #[test]
    fn known_permissions_are_sorted_and_deduplicated() {
        let normalized =
            normalize_permissions(&codes(&["sales:write", "sales:read", "sales:write"])).unwrap();
        assert_eq!(normalized, codes(&["sales:read", "sales:write"]));
    }

    #[test]
    fn unknown_permissions_are_listed() {
        match normalize_permissions(&codes(&["sales:read", "sales:approve", "*"])) {
            Err(AppError::UnknownPermissions(unknown)) => {
                assert_eq!(unknown, codes(&["*", "sales:approve"]));
            }
            other => panic!("esperava UnknownPermissions, veio {:?}", other),
        }
    }
}
