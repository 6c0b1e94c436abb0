mod inventory;
mod phone_form;

pub use inventory::InventoryView;
pub use phone_form::PhoneFormView;
