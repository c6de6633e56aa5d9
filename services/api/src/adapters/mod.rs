pub mod db;
pub mod generation;
pub mod mailer;

pub use db::DbAdapter;
pub use generation::{generation_client, OpenAiGenerationAdapter};
pub use mailer::LogMailer;
