//! Phone-number search: the filter type and the glue that submits the
//! search field to the view.
use crate::app::view::UserGateway;
use crate::app::{AppState, InputMode};
use crate::service::UserRecord;

/// Search constraint for the next page fetch: exact phone-number match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneFilter {
    pub phone: String,
}

impl PhoneFilter {
    /// Build a filter from the submitted text as typed; only an empty
    /// submission means no constraint.
    pub fn from_input(input: &str) -> Option<Self> {
        if input.is_empty() {
            None
        } else {
            Some(Self {
                phone: input.to_string(),
            })
        }
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        user.mobile_phone_number == self.phone
    }
}

/// Submit the search field: hand the query to the view and leave search mode.
///
/// The selection is reset because the view clears the list before fetching.
pub fn apply_search(app: &mut AppState, gateway: &impl UserGateway) {
    if app.input_mode != InputMode::Search {
        return;
    }
    let query = std::mem::take(&mut app.search_query);
    if app.view.search(&query, gateway) {
        app.selected_user_index = 0;
        app.selected_role_index = 0;
    }
    app.input_mode = InputMode::Normal;
}
