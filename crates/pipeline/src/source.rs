//! Frame source adapters
//!
//! The detector process delivers one JSON `RawFrameMetrics` per line.
//! Malformed lines are logged and skipped; the stream never aborts on bad
//! input.

use frame_metrics::RawFrameMetrics;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Read JSON-lines frames into the runtime's queue until EOF
pub async fn read_frames<R>(reader: R, tx: mpsc::Sender<RawFrameMetrics>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<RawFrameMetrics>(line) {
                    Ok(raw) => {
                        if tx.send(raw).await.is_err() {
                            debug!("frame queue closed, stopping source");
                            return;
                        }
                    }
                    Err(e) => warn!("skipping malformed frame line: {}", e),
                }
            }
            Ok(None) => {
                debug!("frame source reached EOF");
                return;
            }
            Err(e) => {
                warn!("frame source read error: {}", e);
                return;
            }
        }
    }
}

/// Frame source reading from standard input
pub async fn stdin_frames(tx: mpsc::Sender<RawFrameMetrics>) {
    read_frames(BufReader::new(tokio::io::stdin()), tx).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_valid_lines_and_skips_garbage() {
        let input = concat!(
            r#"{"timestamp_ms":1,"left_eye_open":0.9,"right_eye_open":0.9,"head_yaw_deg":0.0,"head_pitch_deg":0.0,"yawning":false}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"timestamp_ms":2,"left_eye_open":null,"right_eye_open":null,"head_yaw_deg":30.0,"head_pitch_deg":0.0,"yawning":true}"#,
            "\n",
        );

        let (tx, mut rx) = mpsc::channel(8);
        read_frames(input.as_bytes(), tx).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.timestamp_ms, 1);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.timestamp_ms, 2);
        assert!(second.yawning);
        assert!(rx.recv().await.is_none());
    }
}
