//! 短信发送统一入口
//!
//! Twilio style gateway: one form post per message, authenticated with the
//! account sid and token.

use anyhow::{anyhow, Result};
use common::env::Sms;

pub struct SmsGateway {
    conf: Sms,
    client: reqwest::Client,
}

impl SmsGateway {
    pub fn new(conf: Sms) -> Self {
        SmsGateway {
            conf,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.conf.gateway.trim_end_matches('/'),
            self.conf.account_sid
        )
    }

    /// `phone` in E.164 form, e.g. "+998901234567"
    pub async fn send_code(&self, phone: &str, msg: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.conf.account_sid, Some(&self.conf.auth_token))
            .form(&[
                ("To", phone),
                ("From", self.conf.from_number.as_str()),
                ("Body", msg),
            ])
            .send()
            .await?;
        match (res.status().as_u16(), res.text().await?) {
            (200..=299, _) => Ok(()),
            (code, c) => Err(anyhow!("sms gateway returned {}: {}", code, c)),
        }
    }
}
