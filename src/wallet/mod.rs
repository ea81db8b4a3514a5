pub mod keys;
pub mod models;

pub use keys::load_identities;
pub use models::Identity;
