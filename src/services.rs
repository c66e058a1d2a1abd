pub mod auth;
pub mod branch_service;
pub mod crm_service;
pub mod document_service;
pub mod inventory_service;
pub mod mailer;
pub mod operation_service;
pub mod rbac_service;
pub mod stock_ledger;
