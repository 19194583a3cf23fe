// WebSocket server: accepts browser clients and forwards their traffic to the
// application task.
//
// Every connection gets an id and an unbounded outbound queue. The read half is
// forwarded as `WsEvent`s into a single mpsc channel; a per-connection writer
// task drains the outbound queue into the socket.

use anyhow::Context;
use futures_util::stream::Stream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Identifies one client connection for the lifetime of the process.
pub type ConnId = u64;

/// Events emitted by the WebSocket server to the application layer.
#[derive(Debug)]
pub enum WsEvent {
    /// Handshake completed. `outbound` delivers serialised notifications.
    Connected {
        conn_id: ConnId,
        addr: String,
        outbound: mpsc::UnboundedSender<String>,
    },
    /// The client went away (close frame, error or EOF).
    Disconnected { conn_id: ConnId },
    /// A text frame from the client (raw JSON string).
    Message { conn_id: ConnId, text: String },
}

/// Bind the listener. Use port 0 for an ephemeral port.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;
    info!("WebSocket server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections forever, forwarding events through `tx`.
///
/// Returns once the application side has dropped its receiver.
pub async fn run(listener: TcpListener, tx: mpsc::Sender<WsEvent>) -> anyhow::Result<()> {
    let mut next_id: ConnId = 1;

    loop {
        let (stream, addr) = listener.accept().await?;
        if tx.is_closed() {
            break;
        }
        let conn_id = next_id;
        next_id += 1;
        info!("Accepted TCP connection {conn_id} from {addr}");
        tokio::spawn(handle_connection(stream, addr.to_string(), conn_id, tx.clone()));
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    addr: String,
    conn_id: ConnId,
    tx: mpsc::Sender<WsEvent>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let (mut write, read) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    if tx
        .send(WsEvent::Connected {
            conn_id,
            addr: addr.clone(),
            outbound: out_tx,
        })
        .await
        .is_err()
    {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = write.send(Message::Text(text.into())).await {
                debug!("Write to connection {conn_id} failed: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    let forwarded = process_message_stream(read, &tx, conn_id, &addr).await;
    if forwarded.is_ok() {
        let _ = tx.send(WsEvent::Disconnected { conn_id }).await;
    }
    writer.abort();
}

/// Forward text frames from any message [`Stream`] through `tx`.
///
/// Pure logic over the stream, so it is tested with in-memory streams.
/// Returns `Err(())` if the channel is closed (receiver dropped).
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<WsEvent>,
    conn_id: ConnId,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                debug!("Connection {conn_id} sent {} bytes", text.len());
                let event = WsEvent::Message {
                    conn_id,
                    text: text.to_string(),
                };
                if tx.send(event).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong and raw frames carry nothing for us.
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    fn mock_stream(
        messages: Vec<Result<Message, WsError>>,
    ) -> impl Stream<Item = Result<Message, WsError>> + Unpin {
        stream::iter(messages)
    }

    fn text_of(event: WsEvent) -> (ConnId, String) {
        match event {
            WsEvent::Message { conn_id, text } => (conn_id, text),
            other => panic!("expected Message event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn text_message_forwarded_with_conn_id() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![Ok(Message::Text("hello".into()))];

        process_message_stream(mock_stream(messages), &tx, 7, "test")
            .await
            .unwrap();

        assert_eq!(text_of(rx.recv().await.unwrap()), (7, "hello".to_string()));
    }

    #[tokio::test]
    async fn multiple_messages_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("first".into())),
            Ok(Message::Text("second".into())),
            Ok(Message::Text("third".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, 1, "test")
            .await
            .unwrap();

        assert_eq!(text_of(rx.recv().await.unwrap()).1, "first");
        assert_eq!(text_of(rx.recv().await.unwrap()).1, "second");
        assert_eq!(text_of(rx.recv().await.unwrap()).1, "third");
    }

    #[tokio::test]
    async fn close_frame_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before_close".into())),
            Ok(Message::Close(None)),
            Ok(Message::Text("after_close".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, 1, "test")
            .await
            .unwrap();

        assert_eq!(text_of(rx.recv().await.unwrap()).1, "before_close");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn error_stops_processing() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Text("before_error".into())),
            Err(WsError::ConnectionClosed),
            Ok(Message::Text("after_error".into())),
        ];

        process_message_stream(mock_stream(messages), &tx, 1, "test")
            .await
            .unwrap();

        assert_eq!(text_of(rx.recv().await.unwrap()).1, "before_error");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_text_frames_are_ignored() {
        let (tx, mut rx) = mpsc::channel(64);
        let messages = vec![
            Ok(Message::Binary(vec![1, 2, 3].into())),
            Ok(Message::Ping(vec![].into())),
            Ok(Message::Pong(vec![].into())),
            Ok(Message::Text(r#"{"type":"requestState"}"#.into())),
        ];

        process_message_stream(mock_stream(messages), &tx, 3, "test")
            .await
            .unwrap();

        assert_eq!(
            text_of(rx.recv().await.unwrap()),
            (3, r#"{"type":"requestState"}"#.to_string())
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn returns_err_when_channel_closed() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);

        let messages = vec![Ok(Message::Text("orphan".into()))];
        let result = process_message_stream(mock_stream(messages), &tx, 1, "test").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_stream_completes_normally() {
        let (tx, mut rx) = mpsc::channel(64);
        process_message_stream(mock_stream(vec![]), &tx, 1, "test")
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
