use crate::client::view::DashboardView;

/// View model for the dashboard. Refreshed from the client runtime each
/// frame; holds no logic of its own.
#[derive(Default)]
pub struct TuiApp {
    pub view: Option<DashboardView>,

    /// Label of the last command fired from the keyboard, for the footer.
    pub last_command: Option<String>,
}
