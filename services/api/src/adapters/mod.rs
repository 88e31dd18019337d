pub mod catalog;
pub mod db;
pub mod file_slot;
pub mod memory;
pub mod payment;

pub use catalog::{FileCatalogAdapter, HttpCatalogAdapter};
pub use db::DbAdapter;
pub use file_slot::FileSlotAdapter;
pub use memory::InMemorySlot;
pub use payment::{GatewayPaymentAdapter, SandboxPaymentAdapter};
