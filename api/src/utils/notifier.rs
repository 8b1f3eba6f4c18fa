//! Out-of-band delivery of verification codes.
//!
//! Requests only enqueue; a fixed pool of workers drains the queue and hands
//! each message to a [`NotificationSender`]. A full queue or a failed delivery
//! is logged and the message dropped.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use common::env::NotifyConf;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::utils::captcha::email::SmtpSender;
use crate::utils::captcha::sms::SmsGateway;

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_email(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()>;
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Email {
        subject: String,
        body: String,
        recipients: Vec<String>,
    },
    Sms {
        phone_number: String,
        body: String,
    },
}

impl Notification {
    fn target(&self) -> String {
        match self {
            Notification::Email { recipients, .. } => recipients.join(","),
            Notification::Sms { phone_number, .. } => phone_number.clone(),
        }
    }

    async fn deliver(&self, sender: &dyn NotificationSender) -> Result<()> {
        match self {
            Notification::Email {
                subject,
                body,
                recipients,
            } => sender.send_email(subject, body, recipients).await,
            Notification::Sms { phone_number, body } => sender.send_sms(phone_number, body).await,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    queue: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Spawn the worker pool on the current tokio runtime.
    pub fn start(sender: Arc<dyn NotificationSender>, conf: &NotifyConf) -> Self {
        let (queue, receiver) = mpsc::channel::<Notification>(conf.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        for worker in 0..conf.workers.max(1) {
            let receiver = receiver.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(notification) = next else {
                        debug!("notify worker {} stopped", worker);
                        break;
                    };
                    if let Err(e) = notification.deliver(sender.as_ref()).await {
                        error!(
                            "notify worker {} failed to deliver to {}: {}",
                            worker,
                            notification.target(),
                            e
                        );
                    }
                }
            });
        }
        Notifier { queue }
    }

    pub fn send_email(&self, subject: &str, body: &str, recipients: Vec<String>) {
        self.enqueue(Notification::Email {
            subject: subject.to_owned(),
            body: body.to_owned(),
            recipients,
        })
    }

    pub fn send_sms(&self, phone_number: &str, body: &str) {
        self.enqueue(Notification::Sms {
            phone_number: phone_number.to_owned(),
            body: body.to_owned(),
        })
    }

    fn enqueue(&self, notification: Notification) {
        match self.queue.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!("notify queue is full, drop message to {}", dropped.target())
            }
            Err(TrySendError::Closed(dropped)) => {
                error!("notify queue is closed, drop message to {}", dropped.target())
            }
        }
    }
}

/// Writes messages to the log instead of delivering them.
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send_email(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        debug!("email to {:?}, {}: {}", recipients, subject, body);
        Ok(())
    }

    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()> {
        debug!("sms to {}: {}", phone_number, body);
        Ok(())
    }
}

/// Real delivery over smtp and the sms gateway, each optional.
pub struct ExternalSender {
    pub smtp: Option<SmtpSender>,
    pub sms: Option<SmsGateway>,
}

#[async_trait]
impl NotificationSender for ExternalSender {
    async fn send_email(&self, subject: &str, body: &str, recipients: &[String]) -> Result<()> {
        let smtp = self
            .smtp
            .as_ref()
            .ok_or_else(|| anyhow!("smtp is not configured"))?;
        smtp.send(subject, body, recipients).await
    }

    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()> {
        let sms = self
            .sms
            .as_ref()
            .ok_or_else(|| anyhow!("sms gateway is not configured"))?;
        sms.send_code(phone_number, body).await
    }
}
