//! Typed client for the Library Desk API and the page view-models built on it.
//!
//! The login identity lives in an explicit [`Session`] owned by the caller and
//! handed to each page, never in global state.

pub mod api;
pub mod login;
pub mod navbar;
pub mod profile;
pub mod session;

pub use api::{ClientError, LibraryClient};
pub use login::LoginPage;
pub use navbar::{NavBar, NavItem, Route};
pub use profile::ProfilePage;
pub use session::Session;
