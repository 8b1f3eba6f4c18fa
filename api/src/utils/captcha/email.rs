use anyhow::Result;
use common::env::Smtp;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

pub struct SmtpSender {
    conf: Smtp,
}

impl SmtpSender {
    pub fn new(conf: Smtp) -> Self {
        SmtpSender { conf }
    }

    fn build_message(&self, subject: &str, body: &str, recipients: &[String]) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.conf.sender.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for to in recipients {
            builder = builder.to(to.parse()?);
        }
        Ok(builder.body(body.to_owned())?)
    }

    fn mailer(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(self.conf.sender.clone(), self.conf.password.clone());
        Ok(SmtpTransport::relay(&self.conf.server)?
            .port(self.conf.port)
            .credentials(creds)
            .build())
    }

    /// The transport is blocking, so the send runs on the blocking pool.
    pub async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        let email = self.build_message(subject, body, recipients)?;
        let mailer = self.mailer()?;
        let send_res = tokio::task::spawn_blocking(move || mailer.send(&email)).await??;
        debug!("mail send res {:?}", send_res);
        Ok(())
    }
}
