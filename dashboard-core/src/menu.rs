//! Navigation entries of the dashboard shell.

use std::{convert::TryFrom, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Library,
    Downloads,
    Notifications,
    Groups,
    Calendar,
    Collaborators,
    Weather,
    Profile,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Library => "library",
            Screen::Downloads => "downloads",
            Screen::Notifications => "notifications",
            Screen::Groups => "groups",
            Screen::Calendar => "calendar",
            Screen::Collaborators => "collaborators",
            Screen::Weather => "weather",
            Screen::Profile => "profile",
        }
    }

    pub const fn all() -> &'static [Screen] {
        &[
            Screen::Home,
            Screen::Library,
            Screen::Downloads,
            Screen::Notifications,
            Screen::Groups,
            Screen::Calendar,
            Screen::Collaborators,
            Screen::Weather,
            Screen::Profile,
        ]
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Screen {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Screen::all().iter().copied().find(|s| s.as_str() == lower).ok_or_else(|| {
            anyhow::anyhow!("Unknown screen '{value}'. Known screens: {}.", screen_list())
        })
    }
}

fn screen_list() -> String {
    Screen::all().iter().map(Screen::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub icon: &'static str,
    pub label: &'static str,
    pub id: Screen,
}

pub const MENU_ITEMS: &[MenuItem] = &[
    MenuItem { icon: "home", label: "Home", id: Screen::Home },
    MenuItem { icon: "book-marked", label: "Library", id: Screen::Library },
    MenuItem { icon: "download", label: "Downloads", id: Screen::Downloads },
    MenuItem { icon: "bell", label: "Notifications", id: Screen::Notifications },
    MenuItem { icon: "users", label: "Groups", id: Screen::Groups },
    MenuItem { icon: "calendar", label: "Calendar", id: Screen::Calendar },
    MenuItem { icon: "user-search", label: "Collaborators", id: Screen::Collaborators },
    MenuItem { icon: "cloud", label: "Weather", id: Screen::Weather },
    MenuItem { icon: "user", label: "Profile", id: Screen::Profile },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_covers_every_screen_in_order() {
        let ids: Vec<Screen> = MENU_ITEMS.iter().map(|item| item.id).collect();
        assert_eq!(ids, Screen::all());
    }

    #[test]
    fn screen_parsing_ignores_case() {
        assert_eq!(Screen::try_from("Weather").expect("known screen"), Screen::Weather);
    }

    #[test]
    fn unknown_screen_error() {
        let err = Screen::try_from("settings").unwrap_err();
        assert!(err.to_string().contains("Unknown screen"));
        assert!(err.to_string().contains("profile"));
    }
}
