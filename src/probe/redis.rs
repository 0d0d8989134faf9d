//! Redis reachability probe.
//!
//! `PING`, then `GET health_check`; a nil reply to the GET is a success.

use async_trait::async_trait;
use tokio::time::{timeout_at, Instant};
use url::Url;

use crate::probe::{budget, ProbeError, Prober, Target};

const HEALTH_KEY: &str = "health_check";

pub struct RedisProber {
    identity: String,
    client: redis::Client,
}

impl RedisProber {
    pub fn new(target: &Target) -> Result<Self, ProbeError> {
        let url = connection_url(target)?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        Ok(Self {
            identity: target.identity().to_string(),
            client,
        })
    }

    async fn ping_and_get(&self) -> Result<String, ProbeError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let _: Option<String> = redis::cmd("GET")
            .arg(HEALTH_KEY)
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::Query(e.to_string()))?;

        Ok(pong)
    }
}

/// Build `redis://[:password@]host:port/db` with the password escaped.
fn connection_url(target: &Target) -> Result<Url, ProbeError> {
    let db = if target.dbname().is_empty() { "0" } else { target.dbname() };
    let mut url = Url::parse(&format!("redis://{}:{}/{}", target.host(), target.port(), db))
        .map_err(|e| ProbeError::Connect(format!("invalid redis address: {}", e)))?;

    if !target.password().is_empty() {
        url.set_password(Some(target.password()))
            .map_err(|_| ProbeError::Connect("cannot encode redis password".to_string()))?;
    }
    if !target.user().is_empty() {
        url.set_username(target.user())
            .map_err(|_| ProbeError::Connect("cannot encode redis user".to_string()))?;
    }
    Ok(url)
}

#[async_trait]
impl Prober for RedisProber {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn check(&self, deadline: Instant) -> Result<(), ProbeError> {
        let granted = budget(deadline);
        let pong = timeout_at(deadline, self.ping_and_get())
            .await
            .map_err(|_| ProbeError::Timeout(granted))??;

        tracing::debug!(identity = %self.identity, reply = %pong, "Redis probe succeeded");
        Ok(())
    }
}
