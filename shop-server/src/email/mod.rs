use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound mail used by the magic-link flow
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_auth_link(&self, to: &str, link: &str) -> Result<(), BoxError>;
}

fn auth_link_body(link: &str) -> String {
    format!(
        "Use the link below to sign in to your restaurant panel:\n\n\
         {link}\n\n\
         The link can be used once and expires in 7 days.\n\
         If you did not ask for it, ignore this email."
    )
}

/// Delivers mail through AWS SES
pub struct SesMailer {
    ses: SesClient,
    from: String,
}

impl SesMailer {
    pub fn new(ses: SesClient, from: impl Into<String>) -> Self {
        Self {
            ses,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send_auth_link(&self, to: &str, link: &str) -> Result<(), BoxError> {
        let subject = Content::builder().data("Your sign-in link").build()?;

        let body = Body::builder()
            .text(Content::builder().data(auth_link_body(link)).build()?)
            .build();

        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(to).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await?;

        tracing::info!(to = to, "Auth link sent");
        Ok(())
    }
}

/// Writes the link to the log instead of sending it (development)
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_auth_link(&self, to: &str, link: &str) -> Result<(), BoxError> {
        tracing::info!(to = to, link = link, "Auth link (log transport)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_contains_link() {
        let body = auth_link_body("http://localhost:3333/auth-links/authenticate?code=x");
        assert!(body.contains("code=x"));
        assert!(body.contains("7 days"));
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        LogMailer
            .send_auth_link("ana@example.com", "http://localhost/link")
            .await
            .unwrap();
    }
}
