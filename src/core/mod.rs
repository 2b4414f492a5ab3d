pub mod engine;
pub mod export;
pub mod list_resolver;
pub mod loader;
pub mod post_processor;
pub mod retry;
pub mod uploader;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{ContactList, ContactPage, ContactRecord, Pagination, RemoteContact};
pub use crate::domain::ports::{ContactService, Storage};
pub use crate::utils::error::Result;
