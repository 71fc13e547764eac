use crate::showers::ShowerResolver;
use std::sync::Mutex;

pub struct AppState {
    pub resolver: Mutex<ShowerResolver>,
}
