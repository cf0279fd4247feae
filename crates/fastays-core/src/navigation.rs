//! Screen identifiers and the navigation capability controllers drive.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Login,
    OtpVerification { phone_number: String },
    Home,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Splash => "Splash",
            Screen::Login => "Login",
            Screen::OtpVerification { .. } => "OTPVerification",
            Screen::Home => "Home",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque navigation capability owned by the host shell.
pub trait Navigator {
    /// Push `screen` on top of the current one
    fn navigate(&mut self, screen: Screen);

    /// Swap the current screen for `screen`; there is no way back to it
    fn replace(&mut self, screen: Screen);

    fn go_back(&mut self);
}

/// A plain history stack. The root entry is never popped.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    history: Vec<Screen>,
}

impl NavigationStack {
    pub fn new(root: Screen) -> Self {
        Self {
            history: vec![root],
        }
    }

    pub fn current(&self) -> &Screen {
        // history is never empty
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[Screen] {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(Screen::Splash)
    }
}

impl Navigator for NavigationStack {
    fn navigate(&mut self, screen: Screen) {
        self.history.push(screen);
    }

    fn replace(&mut self, screen: Screen) {
        self.history.pop();
        self.history.push(screen);
    }

    fn go_back(&mut self) {
        if self.can_go_back() {
            self.history.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_drops_current_entry() {
        let mut nav = NavigationStack::new(Screen::Login);
        nav.navigate(Screen::OtpVerification {
            phone_number: "5551234567".to_string(),
        });
        nav.replace(Screen::Home);

        assert_eq!(nav.current(), &Screen::Home);
        assert_eq!(nav.history(), &[Screen::Login, Screen::Home]);
    }

    #[test]
    fn test_go_back_keeps_root() {
        let mut nav = NavigationStack::default();
        nav.go_back();
        assert_eq!(nav.current(), &Screen::Splash);

        nav.navigate(Screen::Login);
        assert!(nav.can_go_back());
        nav.go_back();
        assert_eq!(nav.current(), &Screen::Splash);
    }

    #[test]
    fn test_screen_names() {
        assert_eq!(Screen::Home.to_string(), "Home");
        assert_eq!(
            Screen::OtpVerification { phone_number: String::new() }.name(),
            "OTPVerification"
        );
    }
}
