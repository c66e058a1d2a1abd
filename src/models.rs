pub mod auth;
pub mod branch;
pub mod crm;
pub mod inventory;
pub mod operations;
pub mod rbac;
pub mod status;
