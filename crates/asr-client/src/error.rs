#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("vendor rejected credentials: {0}")]
    Auth(String),
    #[error("vendor connect failed after {attempts} attempts: {last}")]
    Connect { attempts: u32, last: String },
    #[error("asr stream closed")]
    Closed,
}

impl Error {
    /// Auth and config rejections must not be retried; everything else on
    /// the vendor socket is transient.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
