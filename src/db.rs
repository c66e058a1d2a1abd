pub mod user_repo;
pub use user_repo::UserRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod branch_repo;
pub use branch_repo::BranchRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
