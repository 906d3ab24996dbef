#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("translation deadline exceeded")]
    Deadline,
    #[error("persistent connection lost")]
    ConnectionLost,
    #[error("backend returned an empty result")]
    Empty,
    #[error("unexpected classifier answer: {0:?}")]
    UnclearLabel(String),
    #[error("malformed backend payload: {0}")]
    Payload(String),
}

impl Error {
    /// Auth and quota rejections end translation for the session; everything
    /// else is worth another attempt later.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Api {
                status: 401 | 403 | 456,
                ..
            }
        )
    }
}
