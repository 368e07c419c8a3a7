pub mod auth;
pub mod config;
pub mod error;
pub mod input;
pub mod inventory;
pub mod invoice;
pub mod layout;
pub mod pdf;
pub mod shell;
pub mod watermark;

pub use auth::{Credential, Session};
pub use config::Config;
pub use error::{HahnemannError, Result};
pub use inventory::{Inventory, InventoryItem, ItemDraft};
pub use invoice::{export_invoice, grand_total, InvoiceDraft, InvoiceLine};
