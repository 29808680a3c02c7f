//! Deferred engine commands
//!
//! Listeners run while the engine is mutably borrowed, so they cannot call
//! into it directly. They hold a [`CommandSender`] instead and queue an
//! [`EngineCommand`]; the engine applies the queue once the current dispatch
//! has returned, in send order.

use tokio::sync::mpsc;

use crate::core::types::Side;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    /// Predict the winner of whichever conflict is live when applied
    SubmitPrediction { winner: Side, confidence: u32 },
    Pause,
    Resume,
    SetSpeed(f64),
    NextConflict,
    Stop,
}

/// Cloneable handle for queueing commands on one engine
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command. Returns false once the engine has been dropped.
    pub fn send(&self, command: EngineCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn submit_prediction(&self, winner: Side, confidence: u32) -> bool {
        self.send(EngineCommand::SubmitPrediction { winner, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = CommandSender::new(tx);
        assert!(sender.submit_prediction(0, 5));
        drop(rx);
        assert!(!sender.send(EngineCommand::Pause));
    }

    #[test]
    fn test_clones_share_one_queue() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = CommandSender::new(tx);
        let other = sender.clone();
        sender.send(EngineCommand::Pause);
        other.send(EngineCommand::SetSpeed(2.0));

        assert_eq!(rx.try_recv().unwrap(), EngineCommand::Pause);
        assert_eq!(rx.try_recv().unwrap(), EngineCommand::SetSpeed(2.0));
        assert!(rx.try_recv().is_err());
    }
}
