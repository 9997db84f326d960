//! Send emails to user for account verification and recovery.

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::uri::{
    AMQPAuthority, AMQPQueryString, AMQPScheme, AMQPUri, AMQPUserInfo,
};
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, RecoveryConfig,
};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use serde::Serialize;
use url::Url;

use crate::config::Mail;
use crate::error::{Result, ServerError};
use crate::user::User;

const DEFAULT_AMPQ_HOST: &str = "localhost";
const DEFAULT_AMPQ_PORT: u16 = 5672;
const DEFAULT_AMPQ_VHOST: &str = "/";

const CONTENT_ENCODING: &str = "utf8";
const CONTENT_TYPE: &str = "application/cloudevents+json";
const DATA_CONTENT_TYPE: &str = "application/json";
const CLOUDEVENT_VERSION: &str = "1.0";
const ID_LENGTH: usize = 12;

/// Mailer templates list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Ask user to confirm their email address.
    VerifyEmail,
    /// Let user pick a new password.
    PasswordReset,
}

impl Template {
    /// Callback action carried on the mail link.
    fn action(&self) -> &'static str {
        match self {
            Template::VerifyEmail => "verify-email",
            Template::PasswordReset => "reset-password",
        }
    }
}

#[derive(Debug, Serialize)]
struct Cloudevent<'a> {
    specversion: &'static str,
    r#type: &'static str,
    source: &'static str,
    id: String,
    time: String,
    datacontenttype: &'static str,
    data: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    locale: Option<Cow<'a, str>>,
    to: Cow<'a, str>,
    template: Template,
    username: Cow<'a, str>,
    link: String,
}

/// Mail queue publisher.
#[derive(Debug, Clone, Default)]
pub struct MailManager {
    queue: String,
    base_url: Option<Url>,
    conn: Option<Arc<Connection>>,
}

impl MailManager {
    /// Create a new [`MailManager`].
    ///
    /// `base_url` is where action links on outgoing mails point.
    pub async fn new(config: &Mail, base_url: &str) -> Result<Self> {
        let addr = Url::parse(&config.address)?;
        let uri = AMQPUri {
            scheme: AMQPScheme::from_str(addr.scheme())
                .map_err(|_| ServerError::Internal {
                    details: "invalid AMQP scheme".to_owned(),
                })?,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: config.username.clone(),
                    password: config.password.clone(),
                },
                host: addr.host_str().unwrap_or(DEFAULT_AMPQ_HOST).into(),
                port: addr.port().unwrap_or(DEFAULT_AMPQ_PORT),
            },
            vhost: config
                .vhost
                .clone()
                .unwrap_or(DEFAULT_AMPQ_VHOST.to_string()),
            query: AMQPQueryString {
                channel_max: config.pool,
                ..Default::default()
            },
        };

        let recovery_config =
            RecoveryConfig::default().auto_recover_connection();
        let conn_config = ConnectionProperties::default()
            .with_connection_name("verifa_mail_client".into())
            .with_experimental_recovery_config(recovery_config);
        let conn = Connection::connect_uri(uri, conn_config).await?;

        tracing::info!(%addr, "rabbitmq connected");

        Ok(Self {
            queue: config.queue.clone(),
            base_url: Some(Url::parse(base_url)?),
            conn: Some(Arc::new(conn)),
        })
    }

    async fn create_channel(
        conn: Arc<Connection>,
        queue: &str,
    ) -> Result<Channel> {
        let channel = conn.create_channel().await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(channel)
    }

    fn create_event(data: Content) -> Cloudevent {
        let id = Alphanumeric.sample_string(&mut OsRng, ID_LENGTH);
        Cloudevent {
            specversion: CLOUDEVENT_VERSION,
            r#type: "dev.verifa.email",
            source: "dev.verifa.api",
            id,
            time: Utc::now().with_timezone(&Utc).to_rfc3339(),
            datacontenttype: DATA_CONTENT_TYPE,
            data,
        }
    }

    /// Callback link the recipient must follow, e.g.
    /// `https://host/?_action=verify-email&code=...&id=...`.
    fn action_link(
        base_url: &Url,
        template: &Template,
        user_id: &str,
        code: &str,
    ) -> Url {
        let mut link = base_url.clone();
        link.query_pairs_mut()
            .append_pair("_action", template.action())
            .append_pair("code", code)
            .append_pair("id", user_id);
        link
    }

    /// Publish a mail event carrying a single-use `code` for a user.
    pub async fn publish_event(
        &self,
        template: Template,
        email: &str,
        user: &User,
        code: &str,
    ) -> Result<()> {
        let (Some(conn), Some(base_url)) = (&self.conn, &self.base_url) else {
            tracing::debug!(?template, "failed to send event");
            return Ok(());
        };
        let channel =
            Self::create_channel(Arc::clone(conn), &self.queue).await?;

        let link = Self::action_link(base_url, &template, &user.id, code);

        tracing::trace!(?template, "event sent");

        let content = Content {
            locale: Some(Cow::from(&user.locale)),
            username: Cow::from(&user.username),
            to: Cow::from(email),
            template,
            link: link.to_string(),
        };
        let payload = Self::create_event(content);
        let payload = serde_json::to_string(&payload)?;

        channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default()
                    .with_content_encoding(CONTENT_ENCODING.into())
                    .with_content_type(CONTENT_TYPE.into()),
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_link() {
        let base = Url::parse("https://accounts.example.com/").unwrap();
        let link = MailManager::action_link(
            &base,
            &Template::VerifyEmail,
            "admin",
            "deadbeef",
        );

        assert_eq!(
            link.as_str(),
            "https://accounts.example.com/?_action=verify-email&code=deadbeef&id=admin"
        );
    }

    #[test]
    fn test_template_actions() {
        assert_eq!(Template::VerifyEmail.action(), "verify-email");
        assert_eq!(Template::PasswordReset.action(), "reset-password");
    }

    #[test]
    fn test_event_payload() {
        let content = Content {
            locale: Some(Cow::from("en")),
            to: Cow::from("user@example.com"),
            template: Template::PasswordReset,
            username: Cow::from("user"),
            link: "https://accounts.example.com/?_action=reset-password"
                .to_owned(),
        };
        let event = MailManager::create_event(content);

        assert_eq!(event.specversion, CLOUDEVENT_VERSION);
        assert_eq!(event.id.len(), ID_LENGTH);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"template\":\"password_reset\""));
        assert!(json.contains("user@example.com"));
    }

    #[tokio::test]
    async fn test_default_manager_is_noop() {
        let manager = MailManager::default();
        let user = User::default();

        // Without a connection, publishing must be a silent no-op.
        assert!(
            manager
                .publish_event(
                    Template::VerifyEmail,
                    "user@example.com",
                    &user,
                    "deadbeef",
                )
                .await
                .is_ok()
        );
    }
}
