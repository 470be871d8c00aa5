/// Who is logged in on this client. Lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: String,
    user_id: Option<i32>,
}

impl Session {
    /// Anonymous session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, username: impl Into<String>, user_id: i32) {
        self.username = username.into();
        self.user_id = Some(user_id);
    }

    pub fn logout(&mut self) {
        self.username.clear();
        self.user_id = None;
    }

    pub fn username(&self) -> Option<&str> {
        if self.username.is_empty() {
            None
        } else {
            Some(&self.username)
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.user_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.username().is_some() && self.user_id.is_some()
    }
}
