use crate::evaluation::Switchboard;
use crate::routes::cookies::CookieSettings;

#[derive(Clone)]
pub struct AppState {
    pub switchboard: Switchboard,
    pub cookies: CookieSettings,
}
