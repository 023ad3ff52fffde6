//! Redis-backed queue service.

use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Commands, Connection, IntoConnectionInfo, RedisError};

use super::{QueueError, QueueService};

/// Connection settings, mirrored from the `REDIS_*` environment variables.
#[derive(Debug, Clone)]
pub struct RedisSettings {
    /// `host:port`
    pub addr: String,
    pub password: Option<String>,
    pub db: i64,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".into(),
            password: None,
            db: 0,
            dial_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// One Redis connection, opened lazily and reopened after any failure.
///
/// Give each long-lived role (consumer, publisher, heartbeat) its own
/// instance so a blocking `BRPOP` never holds up a push.
pub struct RedisQueue {
    client: Client,
    settings: RedisSettings,
    conn: Mutex<Option<Connection>>,
}

impl RedisQueue {
    pub fn new(settings: RedisSettings) -> Result<Self, QueueError> {
        let mut info = format!("redis://{}", settings.addr)
            .into_connection_info()
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        info.redis.db = settings.db;
        info.redis.password = settings.password.clone().filter(|p| !p.is_empty());

        let client = Client::open(info).map_err(|e| QueueError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            settings,
            conn: Mutex::new(None),
        })
    }

    /// Another handle to the same server with its own connection.
    pub fn fork(&self) -> Self {
        Self {
            client: self.client.clone(),
            settings: self.settings.clone(),
            conn: Mutex::new(None),
        }
    }

    fn open(&self) -> Result<Connection, QueueError> {
        let conn = self
            .client
            .get_connection_with_timeout(self.settings.dial_timeout)
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        conn.set_read_timeout(Some(self.settings.read_timeout))
            .and_then(|_| conn.set_write_timeout(Some(self.settings.write_timeout)))
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        Ok(conn)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, RedisError>,
    ) -> Result<T, QueueError> {
        let mut slot = self.conn.lock();
        if slot.is_none() {
            *slot = Some(self.open()?);
        }
        let Some(conn) = slot.as_mut() else {
            return Err(QueueError::Connection("no connection".into()));
        };

        let result = f(conn);
        if result.is_err() {
            // Drop the connection; the next call dials again.
            *slot = None;
        }
        result.map_err(|e| QueueError::Command(e.to_string()))
    }
}

/// `BRPOP key <seconds>`. The timeout goes out as an integer of at least one
/// second: servers before 6.0 reject fractions, and 0 blocks forever.
fn brpop(key: &str, timeout: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("BRPOP");
    cmd.arg(key).arg(timeout.as_secs().max(1));
    cmd
}

impl QueueService for RedisQueue {
    fn pop(&self, key: &str, timeout: Duration) -> Result<Option<String>, QueueError> {
        let wait = Duration::from_secs(timeout.as_secs().max(1));
        let read_timeout = wait + self.settings.read_timeout;
        self.with_conn(|conn| {
            conn.set_read_timeout(Some(read_timeout))?;
            let popped: Option<(String, String)> = brpop(key, wait).query(conn)?;
            conn.set_read_timeout(Some(self.settings.read_timeout))?;
            Ok(popped.map(|(_, payload)| payload))
        })
    }

    fn push(&self, key: &str, value: &str) -> Result<(), QueueError> {
        self.with_conn(|conn| conn.lpush::<_, _, ()>(key, value))
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), QueueError> {
        self.with_conn(|conn| conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)))
    }

    fn ping(&self) -> Result<(), QueueError> {
        self.with_conn(|conn| redis::cmd("PING").query::<String>(conn).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_build_client() {
        let settings = RedisSettings {
            addr: "10.0.0.5:6380".into(),
            password: Some("s3cret".into()),
            db: 2,
            ..RedisSettings::default()
        };
        let queue = RedisQueue::new(settings).unwrap();
        let info = queue.client.get_connection_info();
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_brpop_timeout_is_whole_seconds() {
        let packed = brpop("jobs", Duration::from_secs(5)).get_packed_command();
        assert_eq!(
            packed,
            b"*3\r\n$5\r\nBRPOP\r\n$4\r\njobs\r\n$1\r\n5\r\n".to_vec()
        );

        let packed = brpop("jobs", Duration::from_millis(20)).get_packed_command();
        assert!(packed.ends_with(b"$1\r\n1\r\n"));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let settings = RedisSettings {
            // Nothing listens on port 1.
            addr: "127.0.0.1:1".into(),
            dial_timeout: Duration::from_millis(200),
            ..RedisSettings::default()
        };
        let queue = RedisQueue::new(settings).unwrap();
        assert!(matches!(queue.ping(), Err(QueueError::Connection(_))));
    }
}
