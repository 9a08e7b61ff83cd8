//! Inbound pose messages.
//!
//! Poses arrive on a channel from any thread and are drained by the
//! control loop once per tick without blocking. They are logged and
//! checked against the arena walls; control does not use them.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use falcon_common::telemetry::{PoseMessage, TransportConfig};
use tracing::{debug, info, warn};

/// Receiving end of the pose channel.
pub struct PoseInbox {
    rx: Receiver<PoseMessage>,
    config: TransportConfig,
    received: u64,
    wall_hits: u64,
    last: Option<PoseMessage>,
}

impl PoseInbox {
    /// Create a channel and its inbox.
    pub fn channel(config: TransportConfig) -> (Sender<PoseMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        let inbox = Self {
            rx,
            config,
            received: 0,
            wall_hits: 0,
            last: None,
        };
        (tx, inbox)
    }

    /// Handle every pending message. Returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.rx.try_recv() {
                Ok(pose) => {
                    self.handle(pose);
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    fn handle(&mut self, pose: PoseMessage) {
        self.received += 1;
        debug!(
            topic = %self.config.pose_topic,
            x = pose.x,
            y = pose.y,
            theta = pose.theta,
            "Tracking"
        );
        if self.config.hits_wall(&pose) {
            self.wall_hits += 1;
            info!(x = pose.x, y = pose.y, "Hit wall");
        }
        self.last = Some(pose);
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn wall_hits(&self) -> u64 {
        self.wall_hits
    }

    pub fn last(&self) -> Option<PoseMessage> {
        self.last
    }
}

/// Forward JSON pose lines from `reader` into `tx` on a background thread.
///
/// Malformed lines are logged and skipped. The thread ends at EOF or when
/// the inbox is dropped.
pub fn spawn_line_reader<R>(reader: R, tx: Sender<PoseMessage>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Pose input read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PoseMessage>(&line) {
                Ok(pose) => {
                    if tx.send(pose).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed pose line: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pose(x: f32, y: f32) -> PoseMessage {
        PoseMessage { x, y, theta: 0.0 }
    }

    #[test]
    fn drain_is_non_blocking_and_counts_walls() {
        let (tx, mut inbox) = PoseInbox::channel(TransportConfig::default());
        assert_eq!(inbox.drain(), 0);

        tx.send(pose(5.5, 5.5)).unwrap();
        tx.send(pose(0.0, 3.0)).unwrap();
        tx.send(pose(4.0, 11.0)).unwrap();
        assert_eq!(inbox.drain(), 3);
        assert_eq!(inbox.received(), 3);
        assert_eq!(inbox.wall_hits(), 2);
        assert_eq!(inbox.last(), Some(pose(4.0, 11.0)));
        assert_eq!(inbox.drain(), 0);
    }

    #[test]
    fn disconnected_sender_is_not_an_error() {
        let (tx, mut inbox) = PoseInbox::channel(TransportConfig::default());
        tx.send(pose(1.0, 1.0)).unwrap();
        drop(tx);
        assert_eq!(inbox.drain(), 1);
        assert_eq!(inbox.drain(), 0);
    }

    #[test]
    fn line_reader_skips_garbage() {
        let input = "{\"x\":1.0,\"y\":2.0,\"theta\":0.5}\nnot json\n\n{\"x\":0.0,\"y\":4.0}\n";
        let (tx, mut inbox) = PoseInbox::channel(TransportConfig::default());
        spawn_line_reader(Cursor::new(input.to_string()), tx)
            .join()
            .unwrap();
        assert_eq!(inbox.drain(), 2);
        assert_eq!(inbox.wall_hits(), 1);
    }
}
