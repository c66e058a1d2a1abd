// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(title = "Estoque & Vendas API", description = "Cadastros, compras, vendas e relatórios"),
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::forgot_password,
        handlers::auth::request_password_setup,
        handlers::auth::reset_password,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,
        handlers::crm::set_customer_status,
        handlers::crm::list_providers,
        handlers::crm::create_provider,
        handlers::crm::get_provider,
        handlers::crm::update_provider,
        handlers::crm::delete_provider,
        handlers::crm::set_provider_status,

        // --- INVENTORY ---
        handlers::inventory::list_categories,
        handlers::inventory::create_category,
        handlers::inventory::get_category,
        handlers::inventory::update_category,
        handlers::inventory::delete_category,
        handlers::inventory::set_category_status,
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::set_product_status,

        // --- OPERATIONS ---
        handlers::operations::list_purchases,
        handlers::operations::create_purchase,
        handlers::operations::get_purchase,
        handlers::operations::update_purchase_status,
        handlers::operations::delete_purchase,
        handlers::operations::list_sales,
        handlers::operations::create_sale,
        handlers::operations::get_sale,
        handlers::operations::update_sale_status,
        handlers::operations::delete_sale,

        // --- DOCUMENTS ---
        handlers::documents::export_pdf,
        handlers::documents::export_excel,
        handlers::documents::sale_receipt_pdf,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::get_role,
        handlers::rbac::update_role,
        handlers::rbac::delete_role,
        handlers::rbac::set_role_status,

        // --- BRANCHES ---
        handlers::branches::list_branches,
        handlers::branches::create_branch,
        handlers::branches::get_branch,
        handlers::branches::update_branch,
        handlers::branches::delete_branch,
        handlers::branches::set_branch_status,
    ),
    components(
        schemas(
            // --- Status ---
            models::status::EntityStatus,
            models::status::SaleStatus,
            models::status::StatusPayload,

            // --- Auth ---
            models::auth::User,
            models::auth::MeResponse,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::EmailPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,

            // --- CRM ---
            models::crm::Customer,
            models::crm::Provider,
            handlers::crm::CustomerPayload,
            handlers::crm::ProviderPayload,

            // --- Inventory ---
            models::inventory::Category,
            models::inventory::Product,
            handlers::inventory::CategoryPayload,
            handlers::inventory::ProductPayload,

            // --- Operations ---
            models::operations::Purchase,
            models::operations::PurchaseItem,
            models::operations::PurchaseDetail,
            models::operations::Sale,
            models::operations::SaleItem,
            models::operations::SaleDetail,
            models::operations::PurchaseLinePayload,
            models::operations::CreatePurchasePayload,
            models::operations::SaleLinePayload,
            models::operations::CreateSalePayload,
            models::operations::SaleStatusPayload,

            // --- Relatórios ---
            services::document_service::ReportKind,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::PermissionEntry,
            handlers::rbac::RolePayload,

            // --- Filiais ---
            models::branch::Branch,
            handlers::branches::BranchPayload,
        )
    ),
    tags(
        (name = "Autenticação", description = "Login, cadastro de usuários e senhas"),
        (name = "Clientes", description = "Clientes (inclui o cliente padrão)"),
        (name = "Fornecedores", description = "Fornecedores"),
        (name = "Categorias", description = "Categorias de produtos"),
        (name = "Produtos", description = "Produtos e estoque"),
        (name = "Compras", description = "Compras (entrada de estoque)"),
        (name = "Vendas", description = "Vendas (saída de estoque) e comprovantes"),
        (name = "Relatórios", description = "Exportação PDF e Excel"),
        (name = "Cargos", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Filiais", description = "Filiais / pontos de venda")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_protected_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/sales/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/reports/export/excel"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
