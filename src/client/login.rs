use super::{ClientError, LibraryClient, Route, Session};

/// State behind the login form
#[derive(Debug, Default)]
pub struct LoginPage {
    pub error_message: String,
    pub popup_open: bool,
}

impl LoginPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look the user up by name and, on success, sign the session in.
    /// Any failure leaves the session logged out.
    pub async fn submit(&mut self, client: &LibraryClient, session: &mut Session, name: &str) {
        self.error_message.clear();
        self.popup_open = true;

        match client.login(name).await {
            Ok(user) => session.sign_in(user.name, user.user_id),
            Err(err) => {
                tracing::debug!("Login failed: {}", err);
                session.logout();
                self.error_message = match err {
                    ClientError::NotFound(_) => "User not found.",
                    ClientError::Server { .. } => "An error occurred. Please try again.",
                    ClientError::Network(_) => "An internal error occurred. Please try again.",
                }
                .to_string();
            }
        }
    }

    /// Line shown above the form
    pub fn status_line(&self, session: &Session) -> Option<String> {
        session
            .username()
            .map(|name| format!("Logged in as: {}", name))
    }

    /// Heading of the welcome popup
    pub fn welcome(&self, session: &Session) -> String {
        format!("Welcome {}", session.username().unwrap_or_default())
    }

    /// Dismiss the popup; the app moves on to the profile page
    pub fn close_popup(&mut self) -> Route {
        self.popup_open = false;
        Route::Profile
    }
}
