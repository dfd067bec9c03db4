//! This module contains the `ProducerLink`, the task that owns the connection
//! to the log producer and matches config diffs with their acknowledgements.
use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::frame::OutboundFrame;
use super::handle::ProducerHandle;
use super::message::{LinkStatus, ProducerCommand, ProducerResponse};

/// The currently attached producer connection.
struct Attached {
    connection: Uuid,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
}

pub struct ProducerLink {
    command_receiver: mpsc::UnboundedReceiver<ProducerCommand>,
    attached: Option<Attached>,
    /// Diffs sent on the attached connection, by frame id.
    awaiting_ack: BTreeMap<u64, oneshot::Sender<ProducerResponse>>,
    next_frame_id: u64,
}

impl ProducerLink {
    /// Creates a link and the handle used to drive it.
    ///
    /// # Arguments
    ///
    /// * `ack_timeout` - How long `ProducerHandle::send_config_diff` waits for
    ///   the producer's answer.
    pub fn new(ack_timeout: Duration) -> (Self, ProducerHandle) {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let link = Self {
            command_receiver,
            attached: None,
            awaiting_ack: BTreeMap::new(),
            next_frame_id: 1,
        };
        (link, ProducerHandle::new(command_sender, ack_timeout))
    }

    /// Runs the command loop until every handle is dropped.
    ///
    /// # Errors
    ///
    /// This function will return an error if the loop fails.
    pub async fn run(mut self) -> Result<()> {
        info!("Starting producer link");

        while let Some(command) = self.command_receiver.recv().await {
            self.handle_command(command);
        }

        info!("Command channel closed, shutting down producer link");
        self.fail_awaiting();
        Ok(())
    }

    fn handle_command(&mut self, command: ProducerCommand) {
        self.prune_abandoned();

        match command {
            ProducerCommand::Attach {
                connection,
                outbound,
            } => {
                if let Some(previous) = self.attached.take() {
                    warn!(
                        "Producer {} replaced by {}",
                        previous.connection, connection
                    );
                    self.fail_awaiting();
                }
                info!("Producer {} attached", connection);
                self.attached = Some(Attached {
                    connection,
                    outbound,
                });
            }

            ProducerCommand::Detach { connection } => {
                if self.is_current(&connection) {
                    info!("Producer {} detached", connection);
                    self.attached = None;
                    self.fail_awaiting();
                }
            }

            ProducerCommand::SendConfig { diff, response } => {
                let Some(attached) = &self.attached else {
                    debug!("No producer attached, failing config send immediately.");
                    let _ = response.send(ProducerResponse::Unavailable);
                    return;
                };

                let id = self.next_frame_id;
                self.next_frame_id += 1;

                let frame = OutboundFrame::Config {
                    id,
                    diff: diff.to_string(),
                };
                if attached.outbound.send(frame).is_err() {
                    warn!("Producer {} socket is gone", attached.connection);
                    self.attached = None;
                    self.fail_awaiting();
                    let _ = response.send(ProducerResponse::Unavailable);
                    return;
                }

                debug!("Sent config #{} '{}'", id, diff);
                self.awaiting_ack.insert(id, response);
            }

            ProducerCommand::Answer {
                connection,
                id,
                accepted,
                reason,
            } => {
                if !self.is_current(&connection) {
                    debug!("Ignoring answer from stale producer {}", connection);
                    return;
                }

                let waiter = match id {
                    Some(id) => self.awaiting_ack.remove(&id),
                    None => self.awaiting_ack.pop_first().map(|(_, waiter)| waiter),
                };
                let Some(waiter) = waiter else {
                    debug!("Answer {:?} matches no pending config", id);
                    return;
                };

                let answer = if accepted {
                    ProducerResponse::Acknowledged
                } else {
                    ProducerResponse::Rejected(
                        reason.unwrap_or_else(|| "no reason given".to_string()),
                    )
                };
                let _ = waiter.send(answer);
            }

            ProducerCommand::Status { response } => {
                let _ = response.send(ProducerResponse::Status(LinkStatus {
                    connection: self.attached.as_ref().map(|a| a.connection),
                    awaiting_ack: self.awaiting_ack.len(),
                }));
            }
        }
    }

    fn is_current(&self, connection: &Uuid) -> bool {
        self.attached
            .as_ref()
            .is_some_and(|attached| &attached.connection == connection)
    }

    /// Drops waiters whose sender gave up, e.g. after an ack timeout.
    fn prune_abandoned(&mut self) {
        self.awaiting_ack.retain(|id, waiter| {
            let abandoned = waiter.is_closed();
            if abandoned {
                debug!("Config #{} is no longer awaited", id);
            }
            !abandoned
        });
    }

    fn fail_awaiting(&mut self) {
        for (_, waiter) in std::mem::take(&mut self.awaiting_ack) {
            let _ = waiter.send(ProducerResponse::Unavailable);
        }
    }
}
