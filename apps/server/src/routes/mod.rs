pub mod stt;

use crate::env::Env;

#[derive(Clone)]
pub struct AppState {
    pub env: &'static Env,
}
