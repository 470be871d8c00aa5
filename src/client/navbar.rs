use super::Session;

/// Client-side pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Books,
    Login,
    Authors,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Books => "/",
            Route::Login => "/login",
            Route::Authors => "/authors",
            Route::Profile => "/profile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Link { label: &'static str, route: Route },
    /// Clears the session and goes back to the book list
    Logout,
}

pub struct NavBar;

impl NavBar {
    pub fn items(session: &Session) -> Vec<NavItem> {
        let logged_in = session.username().is_some();

        let mut items = vec![if logged_in {
            NavItem::Logout
        } else {
            NavItem::Link {
                label: "Login",
                route: Route::Login,
            }
        }];
        items.push(NavItem::Link {
            label: "Authors",
            route: Route::Authors,
        });
        items.push(NavItem::Link {
            label: "Books",
            route: Route::Books,
        });
        if logged_in {
            items.push(NavItem::Link {
                label: "Profile",
                route: Route::Profile,
            });
        }
        items
    }

    pub fn logout(session: &mut Session) -> Route {
        session.logout();
        Route::Books
    }
}
