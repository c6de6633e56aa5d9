//! services/api/src/adapters/mailer.rs
//!
//! A `MailService` adapter that writes outgoing account emails to the log.
//!
//! The recipient and subject go out at `info` on the `mail_outbox` target. The
//! link carries a single-use token, so it is only emitted at `debug` on the same
//! target. A delivery pipeline reading the log must enable `mail_outbox=debug`;
//! the default `info` filter never records a usable token.

use async_trait::async_trait;
use tracing::{debug, info};
use tutor_core::ports::{MailService, PortResult};

#[derive(Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

fn queue(email: &str, subject: &str, link: &str) {
    info!(target: "mail_outbox", to = email, subject, "Queued account email.");
    debug!(target: "mail_outbox", to = email, subject, link, "Account email link.");
}

#[async_trait]
impl MailService for LogMailer {
    async fn send_email_verification(&self, email: &str, link: &str) -> PortResult<()> {
        queue(email, "Verify your email address", link);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, link: &str) -> PortResult<()> {
        queue(email, "Reset your password", link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::{layer::Context, prelude::*, Layer};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(Level, bool)>>>);

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let meta = event.metadata();
            if meta.target() == "mail_outbox" {
                let has_link = meta.fields().field("link").is_some();
                self.0.lock().unwrap().push((*meta.level(), has_link));
            }
        }
    }

    #[tokio::test]
    async fn links_are_only_logged_at_debug() {
        let capture = Capture::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

        let mailer = LogMailer::new();
        mailer
            .send_password_reset("asha@gmail.com", "http://localhost/reset?token=secret")
            .await
            .unwrap();
        mailer
            .send_email_verification("asha@gmail.com", "http://localhost/verify?token=secret")
            .await
            .unwrap();

        let events = capture.0.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        assert!(events.iter().any(|(level, _)| *level == Level::INFO));
        for (level, has_link) in events {
            assert_eq!(has_link, level == Level::DEBUG);
        }
    }
}
