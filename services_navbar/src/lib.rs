//! # Navbar Service
//!
//! Assembles the navigation bar from session state and maps its
//! controls to navigation intents.
//!
//! ## Philosophy
//!
//! - **Session in, view out**: assembly is a pure function of the
//!   session context; no hidden reads
//! - **Intents, not side effects**: clicks produce typed intents; the
//!   page runtime decides how to act on them
//!
//! The visibility rules mirror the page they come from: signed in
//! means login is hidden and logout/profile are shown (profile carries
//! the avatar); signed out flips all three.

use serde::{Deserialize, Serialize};
use session::{SessionContext, SessionStore};
use ui_events::ControlId;

/// Control identifier of the home/brand button
pub const HOME_BUTTON: &str = "homeButton";
/// Control identifier of the profile button
pub const PROFILE_BUTTON: &str = "profileButton";
/// Control identifier of the login button
pub const LOGIN_BUTTON: &str = "loginButton";
/// Control identifier of the logout button
pub const LOGOUT_BUTTON: &str = "logoutButton";

/// One button in the assembled bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavButton {
    /// Control this button dispatches as
    pub control: ControlId,
    /// Caption shown to the user
    pub caption: String,
    /// Whether the button is currently shown
    pub visible: bool,
    /// Optional icon image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl NavButton {
    fn new(control: &str, caption: &str, visible: bool) -> Self {
        Self {
            control: ControlId::new(control),
            caption: caption.to_string(),
            visible,
            icon_url: None,
        }
    }

    fn with_icon(mut self, url: Option<String>) -> Self {
        self.icon_url = url;
        self
    }
}

/// The assembled navigation bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavbarView {
    /// Home/brand button; always visible
    pub home: NavButton,
    /// Profile button; visible only with a session
    pub profile: NavButton,
    /// Login button; visible only without a session
    pub login: NavButton,
    /// Logout button; visible only with a session
    pub logout: NavButton,
    /// Footer line appended below the bar
    pub footer: String,
}

impl NavbarView {
    /// Assembles the bar for the given session state
    pub fn assemble(session: Option<&SessionContext>) -> Self {
        let signed_in = session.is_some();
        let avatar_url = session.and_then(|s| s.avatar_url.clone());

        Self {
            home: NavButton::new(HOME_BUTTON, "UnWrapped", true),
            profile: NavButton::new(PROFILE_BUTTON, "Profile", signed_in).with_icon(avatar_url),
            login: NavButton::new(LOGIN_BUTTON, "Log In", !signed_in),
            logout: NavButton::new(LOGOUT_BUTTON, "Log Out", signed_in),
            footer: "Made by Farhan".to_string(),
        }
    }

    /// Renders the bar to plain text lines for a text surface
    pub fn to_lines(&self) -> Vec<String> {
        let buttons = [&self.home, &self.profile, &self.login, &self.logout];
        let bar = buttons
            .iter()
            .filter(|button| button.visible)
            .map(|button| format!("[{}]", button.caption))
            .collect::<Vec<_>>()
            .join(" ");

        vec![bar, self.footer.clone()]
    }
}

/// What a navbar click asks the page to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavIntent {
    /// Navigate to a fixed path
    Navigate { path: String },
    /// Clear the session, then navigate
    ClearSessionAndNavigate { path: String },
}

impl NavIntent {
    /// The destination path of this intent
    pub fn path(&self) -> &str {
        match self {
            NavIntent::Navigate { path } => path,
            NavIntent::ClearSessionAndNavigate { path } => path,
        }
    }

    /// Applies the intent against the session store, returning the
    /// destination path
    pub fn apply(&self, store: &mut SessionStore) -> String {
        if let NavIntent::ClearSessionAndNavigate { .. } = self {
            store.logout();
        }
        self.path().to_string()
    }
}

/// Maps a clicked control to its intent
///
/// Controls that are not part of the bar produce no intent.
pub fn intent_for(control: &ControlId) -> Option<NavIntent> {
    match control.as_str() {
        HOME_BUTTON => Some(NavIntent::Navigate {
            path: "/".to_string(),
        }),
        PROFILE_BUTTON => Some(NavIntent::Navigate {
            path: "/profile".to_string(),
        }),
        LOGIN_BUTTON => Some(NavIntent::Navigate {
            path: "/login".to_string(),
        }),
        LOGOUT_BUTTON => Some(NavIntent::ClearSessionAndNavigate {
            path: "/logout".to_string(),
        }),
        _ => None,
    }
}
