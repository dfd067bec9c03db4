//! This module defines the `ProducerHandle`, which is the main API for
//! interacting with the `ProducerLink` from other parts of the application.
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::config::ConfigDiff;
use crate::error::TelemetryError;

use super::frame::OutboundFrame;
use super::message::{LinkStatus, ProducerCommand, ProducerResponse};

/// A handle for interacting with the `ProducerLink`.
#[derive(Clone)]
pub struct ProducerHandle {
    command_sender: mpsc::UnboundedSender<ProducerCommand>,
    ack_timeout: Duration,
}

impl ProducerHandle {
    pub(super) fn new(
        command_sender: mpsc::UnboundedSender<ProducerCommand>,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            command_sender,
            ack_timeout,
        }
    }

    /// Sends a config diff to the producer and waits for its answer.
    ///
    /// # Errors
    ///
    /// Fails with `ProducerUnavailable` when no producer is attached or it
    /// disconnects, `ProducerRejected` on a refusal and `AckTimeout` when no
    /// answer arrives in time.
    pub async fn send_config_diff(&self, diff: &ConfigDiff) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.command_sender.send(ProducerCommand::SendConfig {
            diff: diff.clone(),
            response: tx,
        })?;

        let answer = match tokio::time::timeout(self.ack_timeout, rx).await {
            Ok(answer) => answer?,
            Err(_) => {
                return Err(TelemetryError::AckTimeout(self.ack_timeout.as_millis() as u64).into())
            }
        };

        match answer {
            ProducerResponse::Acknowledged => Ok(()),
            ProducerResponse::Rejected(reason) => Err(TelemetryError::ProducerRejected(reason).into()),
            ProducerResponse::Unavailable => Err(TelemetryError::ProducerUnavailable.into()),
            _ => Err(anyhow!("Unexpected response")),
        }
    }

    /// Registers a newly connected producer.
    ///
    /// # Errors
    ///
    /// This function will return an error if the link has shut down.
    pub fn attach(
        &self,
        connection: Uuid,
        outbound: mpsc::UnboundedSender<OutboundFrame>,
    ) -> Result<()> {
        self.command_sender.send(ProducerCommand::Attach {
            connection,
            outbound,
        })?;
        Ok(())
    }

    /// Reports that a producer connection closed.
    ///
    /// # Errors
    ///
    /// This function will return an error if the link has shut down.
    pub fn detach(&self, connection: Uuid) -> Result<()> {
        self.command_sender
            .send(ProducerCommand::Detach { connection })?;
        Ok(())
    }

    /// Forwards the producer's answer to a config diff.
    ///
    /// # Errors
    ///
    /// This function will return an error if the link has shut down.
    pub fn answer(
        &self,
        connection: Uuid,
        id: Option<u64>,
        accepted: bool,
        reason: Option<String>,
    ) -> Result<()> {
        self.command_sender.send(ProducerCommand::Answer {
            connection,
            id,
            accepted,
            reason,
        })?;
        Ok(())
    }

    /// Gets the current link state.
    ///
    /// # Errors
    ///
    /// This function will return an error if the link has shut down.
    pub async fn status(&self) -> Result<LinkStatus> {
        let (tx, rx) = oneshot::channel();
        self.command_sender
            .send(ProducerCommand::Status { response: tx })?;

        match rx.await? {
            ProducerResponse::Status(status) => Ok(status),
            _ => Err(anyhow!("Unexpected response")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::link::ProducerLink;
    use super::*;

    fn spawn_link(timeout: Duration) -> ProducerHandle {
        let (link, handle) = ProducerLink::new(timeout);
        tokio::spawn(link.run());
        handle
    }

    fn diff(text: &str) -> ConfigDiff {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn send_without_producer_fails_fast() {
        let handle = spawn_link(Duration::from_secs(5));
        let err = handle.send_config_diff(&diff("all@info")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TelemetryError>(),
            Some(TelemetryError::ProducerUnavailable)
        ));
    }

    #[tokio::test]
    async fn ack_resolves_matching_send() {
        let handle = spawn_link(Duration::from_secs(5));
        let connection = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        handle.attach(connection, out_tx).unwrap();

        let sender = handle.clone();
        let send = tokio::spawn(async move { sender.send_config_diff(&diff("codec@debug")).await });

        let OutboundFrame::Config { id, diff: text } = out_rx.recv().await.unwrap();
        assert_eq!(text, "codec@debug");
        handle.answer(connection, Some(id), true, None).unwrap();

        send.await.unwrap().unwrap();
        assert_eq!(handle.status().await.unwrap().awaiting_ack, 0);
    }

    #[tokio::test]
    async fn nack_is_reported_as_rejection() {
        let handle = spawn_link(Duration::from_secs(5));
        let connection = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        handle.attach(connection, out_tx).unwrap();

        let sender = handle.clone();
        let send = tokio::spawn(async move { sender.send_config_diff(&diff("all@debug")).await });
        out_rx.recv().await.unwrap();
        handle
            .answer(connection, None, false, Some("busy".into()))
            .unwrap();

        let err = send.await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TelemetryError>(),
            Some(TelemetryError::ProducerRejected(reason)) if reason == "busy"
        ));
    }

    #[tokio::test]
    async fn detach_fails_pending_sends() {
        let handle = spawn_link(Duration::from_secs(5));
        let connection = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        handle.attach(connection, out_tx).unwrap();

        let sender = handle.clone();
        let send = tokio::spawn(async move { sender.send_config_diff(&diff("all@debug")).await });
        out_rx.recv().await.unwrap();
        handle.detach(connection).unwrap();

        assert!(send.await.unwrap().is_err());
        assert_eq!(handle.status().await.unwrap().connection, None);
    }

    #[tokio::test]
    async fn silent_producer_times_out() {
        let handle = spawn_link(Duration::from_millis(20));
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        handle.attach(Uuid::new_v4(), out_tx).unwrap();

        let err = handle.send_config_diff(&diff("all@info")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TelemetryError>(),
            Some(TelemetryError::AckTimeout(20))
        ));
    }

    #[tokio::test]
    async fn timed_out_sends_are_not_kept_waiting() {
        let handle = spawn_link(Duration::from_millis(10));
        let connection = Uuid::new_v4();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        handle.attach(connection, out_tx).unwrap();

        for _ in 0..5 {
            assert!(handle.send_config_diff(&diff("all@info")).await.is_err());
        }
        assert_eq!(handle.status().await.unwrap().awaiting_ack, 0);

        let patient = ProducerHandle::new(handle.command_sender.clone(), Duration::from_secs(5));
        let send = tokio::spawn(async move { patient.send_config_diff(&diff("codec@debug")).await });
        loop {
            let OutboundFrame::Config { diff: text, .. } = out_rx.recv().await.unwrap();
            if text == "codec@debug" {
                break;
            }
        }

        // An answer without an id goes to the send that is still waiting.
        handle.answer(connection, None, true, None).unwrap();
        send.await.unwrap().unwrap();
    }
}
