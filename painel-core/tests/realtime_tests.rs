// tests/realtime_tests.rs
//
// Socket.IO client against an in-process WebSocket server speaking just
// enough Engine.IO to exercise handshake, heartbeat, events and refusal.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use painel_core::config::ReconnectPolicy;
use painel_core::console::ConsoleInput;
use painel_core::realtime::{
    ChannelEvent, EventSink, HandshakeAuth, OutgoingEvent, RealtimeConnector, SocketIoConnector, SocketTarget,
};

const OPEN: &str = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

fn auth() -> HandshakeAuth {
    HandshakeAuth {
        token: "tok-1".into(),
        operator_id: "7".into(),
        name: "Ana".into(),
        sector: "Protocolo".into(),
    }
}

async fn listener() -> (TcpListener, SocketTarget) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = url::Url::parse(&format!("http://127.0.0.1:{}/atendimento", port)).unwrap();
    (listener, SocketTarget::from_url(&url).unwrap())
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ConsoleInput>) -> (u64, ChannelEvent) {
    match timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(ConsoleInput::Channel { connection_id, event })) => (connection_id, event),
        other => panic!("expected channel event, got {:?}", other),
    }
}

async fn next_text<S>(ws: &mut S) -> String
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match timeout(Duration::from_secs(5), ws.next()).await {
            Ok(Some(Ok(Message::Text(txt)))) => return txt.as_str().to_string(),
            Ok(Some(Ok(_))) => continue,
            other => panic!("expected text frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn handshake_events_and_emits() {
    let (listener, target) = listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        ws.send(Message::Text(OPEN.into())).await.unwrap();
        let connect = next_text(&mut ws).await;
        assert!(connect.starts_with("40/atendimento,"));
        let auth: Value = serde_json::from_str(&connect["40/atendimento,".len()..]).unwrap();
        assert_eq!(auth, json!({"token": "tok-1", "atendenteId": "7", "nome": "Ana", "setor": "Protocolo"}));

        // A ping before the namespace ack must be answered too.
        ws.send(Message::Text("2".into())).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3");
        ws.send(Message::Text(r#"40/atendimento,{"sid":"ns-1"}"#.into())).await.unwrap();

        // Client emits after being connected.
        assert_eq!(next_text(&mut ws).await, r#"42/atendimento,["listarAtendimentos"]"#);

        let snapshot = json!(["atendimentosAbertos", [{"sessao_id": "s-1", "numero": "5585", "setor": "TI"}]]);
        ws.send(Message::Text(format!("42/atendimento,{}", snapshot).into())).await.unwrap();
        // Events for other namespaces are not ours.
        ws.send(Message::Text(r#"42["atendimentosAbertos",[]]"#.into())).await.unwrap();
        ws.send(Message::Text("2".into())).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3");
        let msg = json!(["novaMensagem", {"sessao_id": "s-1", "sender": "usuario", "mensagem": "oi"}]);
        ws.send(Message::Text(format!("42/atendimento,{}", msg).into())).await.unwrap();

        // Console leaves.
        assert_eq!(next_text(&mut ws).await, "41/atendimento,");
    });

    let connector = SocketIoConnector::new(target, ReconnectPolicy::disabled(), Duration::from_secs(5));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = connector.connect(auth(), EventSink::new(3, tx));

    assert_eq!(next_event(&mut rx).await, (3, ChannelEvent::Connected));
    assert!(handle.emit(OutgoingEvent::ListSessions));

    match next_event(&mut rx).await {
        (3, ChannelEvent::QueueSnapshot(entries)) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].session_id, "s-1");
            assert_eq!(entries[0].number, "5585");
        }
        other => panic!("unexpected {:?}", other),
    }
    match next_event(&mut rx).await {
        (3, ChannelEvent::NewMessage(msg)) => assert_eq!(msg.body, "oi"),
        other => panic!("unexpected {:?}", other),
    }

    handle.disconnect();
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn namespace_refusal_is_reported_without_retry() {
    let (listener, target) = listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(OPEN.into())).await.unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::Text(r#"44/atendimento,{"message":"Token inválido"}"#.into()))
            .await
            .unwrap();
        // No second connection should arrive.
        assert!(timeout(Duration::from_millis(1500), listener.accept()).await.is_err());
    });

    let policy = ReconnectPolicy {
        enabled: true,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(100),
    };
    let connector = SocketIoConnector::new(target, policy, Duration::from_secs(5));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = connector.connect(auth(), EventSink::new(1, tx));

    assert_eq!(
        next_event(&mut rx).await,
        (1, ChannelEvent::ConnectError { message: "Token inválido".into() })
    );
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn transport_drop_reconnects_with_backoff() {
    let (listener, target) = listener().await;

    let server = tokio::spawn(async move {
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::Text(OPEN.into())).await.unwrap();
            let _ = next_text(&mut ws).await;
            ws.send(Message::Text(r#"40/atendimento,{"sid":"x"}"#.into())).await.unwrap();
            // Abrupt close.
            drop(ws);
        }
    });

    let policy = ReconnectPolicy {
        enabled: true,
        initial_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(200),
    };
    let connector = SocketIoConnector::new(target, policy, Duration::from_secs(5));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = connector.connect(auth(), EventSink::new(9, tx));

    assert_eq!(next_event(&mut rx).await, (9, ChannelEvent::Connected));
    assert!(matches!(next_event(&mut rx).await, (9, ChannelEvent::Disconnected { .. })));
    assert_eq!(next_event(&mut rx).await, (9, ChannelEvent::Connected));

    handle.disconnect();
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn unreachable_server_reports_connect_error() {
    let (listener, target) = listener().await;
    drop(listener);

    let connector = SocketIoConnector::new(target, ReconnectPolicy::disabled(), Duration::from_secs(2));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = connector.connect(auth(), EventSink::new(1, tx));

    assert!(matches!(next_event(&mut rx).await, (1, ChannelEvent::ConnectError { .. })));
}

#[tokio::test]
async fn silent_server_is_dropped_even_while_emitting() {
    let (listener, target) = listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(
            r#"0{"sid":"q","upgrades":[],"pingInterval":100,"pingTimeout":100}"#.into(),
        ))
        .await
        .unwrap();
        let _ = next_text(&mut ws).await;
        ws.send(Message::Text(r#"40/atendimento,{"sid":"x"}"#.into())).await.unwrap();
        // Keep reading the client's emits but never answer or ping.
        let _ = timeout(Duration::from_secs(5), async {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;
    });

    let connector = SocketIoConnector::new(target, ReconnectPolicy::disabled(), Duration::from_secs(5));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = connector.connect(auth(), EventSink::new(4, tx));
    assert_eq!(next_event(&mut rx).await, (4, ChannelEvent::Connected));

    let dropped = timeout(Duration::from_secs(2), async {
        loop {
            handle.emit(OutgoingEvent::ListSessions);
            tokio::select! {
                input = rx.recv() => return input,
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        }
    })
    .await
    .expect("silent server was not detected");

    match dropped {
        Some(ConsoleInput::Channel { connection_id: 4, event: ChannelEvent::Disconnected { reason } }) => {
            assert_eq!(reason, "ping timeout");
        }
        other => panic!("unexpected {:?}", other),
    }
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}
