mod password;
mod storage;
mod types;

pub use password::PasswordHasher;
pub use storage::UserStore;
pub use types::User;
