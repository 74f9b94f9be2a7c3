use crate::{
    args::{Action, Args},
    error::{Error, Result},
};
use nodelink_api::{Api, ApiConfig, SubscriptionEvent};
use nodelink_core::{debug, info, warn};
use nodelink_http_client::HttpTransport;
use nodelink_rpc_core::{api::transport::DynRpcTransport, error::RpcError};
use nodelink_shapeshift::{PollerConfig, ShapeshiftClient, ShapeshiftConfig, ShiftEvent, poller::Poller};
use nodelink_ws_client::WsTransport;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Opens a stream transport for `ws(s)://` urls and a request transport otherwise.
pub async fn connect(args: &Args) -> Result<DynRpcTransport> {
    let url = args.url.as_str();
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(Arc::new(WsTransport::connect_with_timeout(url, args.request_timeout()).await?))
    } else {
        Ok(Arc::new(HttpTransport::with_timeout(url, args.request_timeout())?))
    }
}

pub async fn run(args: Args) -> Result<()> {
    match args.action.clone().ok_or(Error::MissingCommand)? {
        Action::Call { method, params } => {
            let api = open_api(&args).await?;
            let outcome = call(&api, &method, params).await;
            close(&api).await;
            println!("{}", serde_json::to_string_pretty(&outcome?)?);
        }
        Action::Watch { name, count } => {
            let api = open_api(&args).await?;
            let outcome = watch(&api, &name, count, |event| match event {
                Ok(value) => println!("{value}"),
                Err(err) => println!("error: {err}"),
            })
            .await;
            close(&api).await;
            info!("received {} events", outcome?);
        }
        Action::Track { address } => {
            let poller = Poller::new(Arc::new(exchange(&args)?), PollerConfig::new(args.track_interval()))?;
            let last = track(&poller, &address, |event| println!("{}", describe(event))).await?;
            if let Some(err) = last.as_ref().and_then(ShiftEvent::error) {
                warn!("exchange of {} did not complete: {}", address, err);
            }
        }
        Action::Coins => {
            let mut coins: Vec<_> = exchange(&args)?.get_coins().await?.into_values().collect();
            coins.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            for coin in coins {
                println!("{:<8} {:<24} {}", coin.symbol, coin.name, coin.status);
            }
        }
    }
    Ok(())
}

async fn open_api(args: &Args) -> Result<Api> {
    let transport = connect(args).await?;
    let config = ApiConfig { request_timeout: args.request_timeout(), poll_interval: args.poll_interval() };
    debug!("connected to {}", args.url);
    Ok(Api::with_config(transport, config)?)
}

fn exchange(args: &Args) -> Result<ShapeshiftClient> {
    let mut config = ShapeshiftConfig::default().with_endpoint(args.exchange.clone());
    config.api_key = args.exchange_api_key.clone();
    config.timeout = args.request_timeout();
    Ok(ShapeshiftClient::new(config)?)
}

/// Cancels every subscription and closes a stream transport.
async fn close(api: &Api) {
    api.shutdown();
    if let Some(stream) = api.transport().clone().as_stream() {
        stream.close().await;
    }
}

pub async fn call(api: &Api, method: &str, params: Vec<Value>) -> Result<Value> {
    api.transport().execute(method, params).await.map_err(|err| RpcError::from(err).into())
}

/// Hands the events of `name` to `sink` until `count` events were seen or the process is interrupted.
///
/// Returns the number of events seen.
pub async fn watch<F>(api: &Api, name: &str, count: Option<usize>, mut sink: F) -> Result<usize>
where
    F: FnMut(&SubscriptionEvent),
{
    let (id, receiver) = api.subscribe_channel(name)?;
    let mut seen = 0;
    while count.is_none_or(|count| seen < count) {
        let event = tokio::select! {
            event = receiver.recv() => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Ok(event) = event else { break };
        sink(&event);
        seen += 1;
    }
    api.unsubscribe(id);
    Ok(seen)
}

/// Follows `address` until its exchange settles or the process is interrupted.
///
/// Returns the last observation, if any.
pub async fn track<F>(poller: &Poller, address: &str, mut sink: F) -> Result<Option<ShiftEvent>>
where
    F: FnMut(&ShiftEvent),
{
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handle = poller.subscribe_callback(address, move |event| {
        let _ = sender.send(event);
    });
    poller.start()?;

    let mut last = None;
    loop {
        let event = tokio::select! {
            event = receiver.recv() => event,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(event) = event else { break };
        sink(&event);
        let terminal = event.is_terminal();
        last = Some(event);
        if terminal {
            break;
        }
    }
    poller.unsubscribe(handle);
    poller.stop().await?;
    Ok(last)
}

fn describe(event: &ShiftEvent) -> String {
    match event {
        ShiftEvent::Pending(status) => format!("pending: {:?}", status.status),
        ShiftEvent::Complete(status) => {
            format!("complete: {}", serde_json::to_string(&status.extra).unwrap_or_default())
        }
        ShiftEvent::Failed(_) | ShiftEvent::Unreachable(_) => {
            format!("{}: {}", if event.is_terminal() { "failed" } else { "unreachable" }, event.error().unwrap_or_default())
        }
    }
}
