//! Append-only log of every message crossing the wire.
//!
//! Enabled with `REMOTE_ENV_LOG_PATH`. Sessions hand records to a single
//! writer task over an unbounded channel, so logging never blocks a session
//! on file I/O. One line per message:
//!
//! ```text
//! 3 <- {"type":"step","actions":[]}
//! 3 -> {"type":"step","observation":"iVBOR...","reward":0.0,"done":false}
//! ```

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn arrow(self) -> &'static str {
        match self {
            Direction::Inbound => "<-",
            Direction::Outbound => "->",
        }
    }
}

#[derive(Debug)]
struct WireRecord {
    session: usize,
    direction: Direction,
    text: String,
}

/// Cheap cloneable handle to the writer task.
#[derive(Debug, Clone)]
pub struct WireLog {
    tx: mpsc::UnboundedSender<WireRecord>,
}

impl WireLog {
    /// Open `path` for appending and start the writer task.
    pub async fn open(path: &str) -> std::io::Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let (tx, mut rx) = mpsc::unbounded_channel::<WireRecord>();

        tokio::spawn(async move {
            let mut buf: Vec<u8> = Vec::with_capacity(4096);
            while let Some(rec) = rx.recv().await {
                buf.clear();
                buf.extend_from_slice(rec.session.to_string().as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(rec.direction.arrow().as_bytes());
                buf.push(b' ');
                buf.extend_from_slice(rec.text.as_bytes());
                buf.push(b'\n');
                if file.write_all(&buf).await.is_err() {
                    break;
                }
            }
            let _ = file.flush().await;
        });

        Ok(Self { tx })
    }

    pub fn record(&self, session: usize, direction: Direction, text: &str) {
        let _ = self.tx.send(WireRecord {
            session,
            direction,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_records_are_appended() {
        let path = std::env::temp_dir().join(format!("remote-env-wire-{}.log", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        let _ = std::fs::remove_file(&path);

        let log = WireLog::open(&path_str).await.unwrap();
        log.record(1, Direction::Inbound, r#"{"type":"reset"}"#);
        log.record(1, Direction::Outbound, r#"{"type":"error","error":"x"}"#);
        drop(log);

        let mut contents = String::new();
        for _ in 0..50 {
            contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            if contents.lines().count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], r#"1 <- {"type":"reset"}"#);
        assert_eq!(lines[1], r#"1 -> {"type":"error","error":"x"}"#);
        let _ = std::fs::remove_file(&path);
    }
}
