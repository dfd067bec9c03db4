use crate::console::Console;
use crate::network::{InboundFrame, OutboundFrame};
use crate::types::ToolId;
use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub async fn producer_ws_handler(
    ws: WebSocketUpgrade,
    State(console): State<Arc<Console>>,
) -> Response {
    ws.on_upgrade(|socket| handle_producer_socket(socket, console))
}

async fn handle_producer_socket(socket: WebSocket, console: Arc<Console>) {
    let connection = Uuid::new_v4();
    let (sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundFrame>();

    if let Err(e) = console.producer.attach(connection, outbound_tx) {
        error!("Failed to attach producer {}: {}", connection, e);
        return;
    }
    info!("Producer connected as {}", connection);
    console.producer_connected().await;

    let send_task = tokio::spawn(async move {
        let mut sender = sender;
        while let Some(frame) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize producer frame: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_frame(&console, connection, &text).await,
            Ok(Message::Close(_)) => {
                debug!("Producer {} closed the socket", connection);
                break;
            }
            Err(e) => {
                error!("Producer socket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    if let Err(e) = console.producer.detach(connection) {
        warn!("Failed to detach producer {}: {}", connection, e);
    }
}

async fn handle_frame(console: &Console, connection: Uuid, text: &str) {
    let frame = match serde_json::from_str::<InboundFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Ignoring malformed producer frame: {}", e);
            return;
        }
    };

    let forwarded = match frame {
        InboundFrame::Entries { tool, entries } => match ToolId::parse(tool.as_str()) {
            Ok(tool) => {
                console.receive_entries(&tool, entries).await;
                Ok(())
            }
            Err(e) => {
                warn!("Dropping {} lines from producer: {}", entries.len(), e);
                Ok(())
            }
        },
        InboundFrame::Ack { id } => console.producer.answer(connection, id, true, None),
        InboundFrame::Nack { id, reason } => {
            console.producer.answer(connection, id, false, reason)
        }
    };

    if let Err(e) = forwarded {
        error!("Failed to forward producer answer: {}", e);
    }
}
