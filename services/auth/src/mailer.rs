//! Transactional email delivery through the Resend HTTP API
//!
//! Emails are side effects of account operations. [`Mailer::dispatch`]
//! spawns the delivery and only logs failures; callers never await it.

use anyhow::{Result, bail};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::AuthSettings;

/// A transactional email
#[derive(Debug, Clone, PartialEq)]
pub enum Email {
    Welcome { to: String, name: Option<String> },
    VerifyEmail { to: String, verify_url: String },
    PasswordReset { to: String, reset_url: String },
}

impl Email {
    pub fn to(&self) -> &str {
        match self {
            Email::Welcome { to, .. }
            | Email::VerifyEmail { to, .. }
            | Email::PasswordReset { to, .. } => to,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Email::Welcome { .. } => "welcome",
            Email::VerifyEmail { .. } => "verifyEmail",
            Email::PasswordReset { .. } => "passwordReset",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Email::Welcome { .. } => "Bem-vindo ao LeVoyager!",
            Email::VerifyEmail { .. } => "Verifique seu email - LeVoyager",
            Email::PasswordReset { .. } => "Recuperacao de senha - LeVoyager",
        }
    }

    pub fn text(&self) -> String {
        match self {
            Email::Welcome { name, .. } => match name {
                Some(name) => format!("Ola, {}! Sua conta LeVoyager foi criada.", name),
                None => "Ola! Sua conta LeVoyager foi criada.".to_string(),
            },
            Email::VerifyEmail { verify_url, .. } => {
                format!("Confirme seu email acessando: {}", verify_url)
            }
            Email::PasswordReset { reset_url, .. } => format!(
                "Para redefinir sua senha acesse: {} (valido por 1 hora)",
                reset_url
            ),
        }
    }
}

#[derive(Clone)]
struct ResendTransport {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

/// Email sender; a mailer without transport skips every send
#[derive(Clone)]
pub struct Mailer {
    transport: Option<ResendTransport>,
    from: String,
}

impl Mailer {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let transport = settings
            .resend_api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(|api_key| ResendTransport {
                client: reqwest::Client::new(),
                api_key: api_key.clone(),
                endpoint: settings.resend_api_url.clone(),
            });

        if transport.is_none() {
            warn!("RESEND_API_KEY not configured, emails will be skipped");
        }

        Self {
            transport,
            from: settings.email_from.clone(),
        }
    }

    /// A mailer that never sends
    pub fn disabled(from: &str) -> Self {
        Self {
            transport: None,
            from: from.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Deliver an email and wait for the provider's answer
    pub async fn send(&self, email: &Email) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!("Skipping {} email to {} (not configured)", email.template(), email.to());
            return Ok(());
        };

        let response = transport
            .client
            .post(&transport.endpoint)
            .bearer_auth(&transport.api_key)
            .json(&json!({
                "from": self.from,
                "to": email.to(),
                "subject": email.subject(),
                "text": email.text(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Email provider answered {}", response.status());
        }

        info!("Sent {} email to {}", email.template(), email.to());
        Ok(())
    }

    /// Send in the background; failures are logged and dropped
    pub fn dispatch(&self, email: Email) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&email).await {
                error!(
                    "Failed to send {} email to {}: {:#}",
                    email.template(),
                    email.to(),
                    e
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_mailer() -> Mailer {
        Mailer {
            transport: Some(ResendTransport {
                client: reqwest::Client::new(),
                api_key: "re_test".to_string(),
                endpoint: "http://127.0.0.1:1/emails".to_string(),
            }),
            from: "LeVoyager <noreply@levoyager.com.br>".to_string(),
        }
    }

    #[test]
    fn test_email_metadata() {
        let email = Email::PasswordReset {
            to: "ana@levoyager.com.br".to_string(),
            reset_url: "https://levoyager.com.br/reset-password?token=abc".to_string(),
        };

        assert_eq!(email.to(), "ana@levoyager.com.br");
        assert_eq!(email.template(), "passwordReset");
        assert!(email.text().contains("token=abc"));
    }

    #[test]
    fn test_welcome_greets_by_name() {
        let email = Email::Welcome {
            to: "ana@levoyager.com.br".to_string(),
            name: Some("Ana".to_string()),
        };
        assert!(email.text().contains("Ana"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_skips() {
        let mailer = Mailer::disabled("noreply@levoyager.com.br");
        assert!(!mailer.is_enabled());

        let email = Email::Welcome {
            to: "ana@levoyager.com.br".to_string(),
            name: None,
        };
        assert!(mailer.send(&email).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_reports_transport_failure() {
        let email = Email::Welcome {
            to: "ana@levoyager.com.br".to_string(),
            name: None,
        };
        assert!(unreachable_mailer().send(&email).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failure() {
        let email = Email::Welcome {
            to: "ana@levoyager.com.br".to_string(),
            name: None,
        };
        unreachable_mailer().dispatch(email);
        tokio::task::yield_now().await;
    }
}
