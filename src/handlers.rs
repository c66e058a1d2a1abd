pub mod auth;
pub mod branches;
pub mod crm;
pub mod documents;
pub mod inventory;
pub mod operations;
pub mod password_page;
pub mod rbac;
