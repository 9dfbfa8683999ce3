//! Service account authentication for the goog API facades.

pub mod context;
pub mod credentials;
pub mod key;

pub use context::{resolve, ContextOptions, GoogleApp, ResolvedContext, ServiceContext};
pub use credentials::Credentials;
pub use key::load_key;
pub use yup_oauth2::ServiceAccountKey;
