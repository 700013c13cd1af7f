pub mod auth_session;
pub mod cipher;
pub mod markup;
pub mod page_fetcher;

pub use auth_session::{AuthSession, PassportSession};
pub use cipher::CredentialCipher;
pub use markup::{MarkupIndex, MarkupNode};
pub use page_fetcher::{fetch_json, HttpPageFetcher, PageFetcher, Query};
