use super::*;
use nodelink_rpc_core::error::TransportErrorKind;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

/// In-process JSON-RPC server.
///
/// - `test_echo` answers with its params
/// - `test_fail` answers with a remote error
/// - `test_silent` never answers
/// - `test_emit [key, payload]` answers `true` then pushes `payload` to subscription `key`
/// - `test_drop` drops the connection without answering
/// - `test_batch` answers within a batch frame that also holds a malformed element
/// - `eth_subscribe` answers `"0xfeed"`
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = accept_async(stream).await else { return };
                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else { continue };
                    let request: Value = serde_json::from_str(&text).unwrap();
                    let id = request["id"].clone();
                    let params = request["params"].clone();
                    let replies = match request["method"].as_str().unwrap_or_default() {
                        "test_echo" => vec![json!({ "jsonrpc": "2.0", "id": id, "result": params })],
                        "test_fail" => vec![json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": { "code": -32000, "message": "execution reverted", "data": "0x08c379a0" }
                        })],
                        "test_silent" => vec![],
                        "test_emit" => vec![
                            json!({ "jsonrpc": "2.0", "id": id, "result": true }),
                            json!({
                                "jsonrpc": "2.0", "method": "eth_subscription",
                                "params": { "subscription": params[0], "result": params[1] }
                            }),
                        ],
                        "test_drop" => return,
                        "test_batch" => vec![json!([{ "jsonrpc": "2.0", "result": 0 }, { "jsonrpc": "2.0", "id": id, "result": "batched" }])],
                        "eth_subscribe" => vec![json!({ "jsonrpc": "2.0", "id": id, "result": "0xfeed" })],
                        _ => vec![json!({ "jsonrpc": "2.0", "id": id, "result": null })],
                    };
                    for reply in replies {
                        if ws.send(Message::Text(reply.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });
    address
}

#[tokio::test]
async fn test_url_validation() {
    assert!(matches!(WsTransport::connect("http://127.0.0.1:8546").await, Err(RpcError::Configuration(_))));
    assert!(matches!(WsTransport::connect("127.0.0.1:8546").await, Err(RpcError::Configuration(_))));
    assert!(matches!(WsTransport::connect_with_timeout("ws://127.0.0.1:8546", Duration::ZERO).await, Err(RpcError::Configuration(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let err = WsTransport::connect(format!("ws://{address}")).await.unwrap_err();
    assert_eq!(err.transport().map(TransportError::kind), Some(TransportErrorKind::Unavailable));
}

#[tokio::test]
async fn test_calls_are_matched_by_id() {
    let address = spawn_server().await;
    let transport = WsTransport::connect(format!("ws://{address}")).await.unwrap();
    assert_eq!(transport.kind(), TransportKind::Stream);

    let (a, b) = tokio::join!(transport.execute("test_echo", vec![json!("a")]), transport.execute("test_echo", vec![json!(2), json!(3)]));
    assert_eq!(a.unwrap(), json!(["a"]));
    assert_eq!(b.unwrap(), json!([2, 3]));

    match transport.execute("test_fail", vec![]).await {
        Err(TransportError::Remote { code, message, data }) => {
            assert_eq!(code, -32000);
            assert_eq!(message, "execution reverted");
            assert_eq!(data, Some(json!("0x08c379a0")));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    transport.close().await;
}

#[tokio::test]
async fn test_pending_call_times_out() {
    let address = spawn_server().await;
    let transport = WsTransport::connect_with_timeout(format!("ws://{address}"), Duration::from_millis(100)).await.unwrap();

    let err = transport.execute("test_silent", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), TransportErrorKind::Timeout);

    // The connection survives a timed out call
    assert_eq!(transport.execute("test_echo", vec![json!(1)]).await.unwrap(), json!([1]));
    transport.close().await;
}

#[tokio::test]
async fn test_malformed_batch_element_spares_the_others() {
    let address = spawn_server().await;
    let transport = WsTransport::connect_with_timeout(format!("ws://{address}"), Duration::from_millis(500)).await.unwrap();
    assert_eq!(transport.execute("test_batch", vec![]).await.unwrap(), json!("batched"));
    transport.close().await;
}

#[tokio::test]
async fn test_push_frames_reach_registered_feed() {
    let address = spawn_server().await;
    let transport = Arc::new(WsTransport::connect(format!("ws://{address}")).await.unwrap());
    let stream = transport.clone().as_stream().unwrap();

    let key = stream.execute("eth_subscribe", vec![json!("newHeads")]).await.unwrap();
    assert_eq!(key, json!("0xfeed"));
    let feed = stream.register_feed("0xfeed");

    stream.execute("test_emit", vec![json!("0xfeed"), json!({ "number": "0x1" })]).await.unwrap();
    stream.execute("test_emit", vec![json!("0xfeed"), json!({ "number": "0x2" })]).await.unwrap();
    assert_eq!(feed.recv().await.unwrap(), json!({ "number": "0x1" }));
    assert_eq!(feed.recv().await.unwrap(), json!({ "number": "0x2" }));

    // A push arriving before its feed is registered is kept for it
    stream.execute("test_emit", vec![json!("0xlate"), json!(7)]).await.unwrap();
    assert_eq!(stream.register_feed("0xlate").recv().await.unwrap(), json!(7));

    stream.unregister_feed("0xfeed");
    assert!(feed.recv().await.is_err());

    stream.close().await;
}

#[tokio::test]
async fn test_close_fails_pending_and_refuses_new_calls() {
    let address = spawn_server().await;
    let transport = WsTransport::connect(format!("ws://{address}")).await.unwrap();
    let feed = transport.register_feed("0xfeed");

    let pending = {
        let transport = transport.clone();
        tokio::spawn(async move { transport.execute("test_silent", vec![]).await })
    };
    // Let the call reach the wire
    tokio::time::sleep(Duration::from_millis(50)).await;

    transport.close().await;
    assert!(transport.is_closed());
    assert_eq!(pending.await.unwrap().unwrap_err().kind(), TransportErrorKind::Closed);
    assert_eq!(transport.execute("test_echo", vec![]).await.unwrap_err().kind(), TransportErrorKind::Closed);
    assert!(feed.recv().await.is_err());
    assert!(transport.register_feed("0xother").is_closed());
}

#[tokio::test]
async fn test_connection_loss_fails_pending_calls() {
    let address = spawn_server().await;
    let transport = WsTransport::connect(format!("ws://{address}")).await.unwrap();
    let feed = transport.register_feed("0xfeed");

    let err = transport.execute("test_drop", vec![]).await.unwrap_err();
    assert_eq!(err.kind(), TransportErrorKind::Closed);
    assert!(transport.is_closed());
    assert!(feed.recv().await.is_err());
    assert_eq!(transport.execute("test_echo", vec![]).await.unwrap_err().kind(), TransportErrorKind::Closed);
}
