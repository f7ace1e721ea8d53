mod health;
pub mod relay;
mod token;

pub use health::health_check;
pub use relay::{create_transcription_session, translate};
pub use token::issue_token;
