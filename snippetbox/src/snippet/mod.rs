mod storage;
mod types;

pub use storage::SnippetStore;
pub use types::Snippet;
