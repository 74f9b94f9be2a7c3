use crate::{
    config::ShapeshiftConfig,
    error::{Error, Result},
    model::{Coin, DepositStatus, MarketInfo, ShiftResponse},
    poller::StatusSource,
};
use async_trait::async_trait;
use nodelink_core::trace;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;

const SHAPESHIFT: &str = "shapeshift";

#[derive(Clone, Debug)]
pub struct ShapeshiftClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ShapeshiftClient {
    pub fn new(config: ShapeshiftConfig) -> Result<Self> {
        let schema = Regex::new(r"^https?://").map_err(|err| Error::Configuration(err.to_string()))?;
        if !schema.is_match(&config.endpoint) {
            return Err(Error::Configuration(format!("invalid exchange endpoint `{}`", config.endpoint)));
        }
        let mut endpoint = config.endpoint;
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build().map_err(|err| Error::Configuration(err.to_string()))?;
        Ok(Self { http, endpoint, api_key: config.api_key })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Coins supported by the exchange, keyed by symbol.
    pub async fn get_coins(&self) -> Result<HashMap<String, Coin>> {
        decode(self.get("getcoins").await?)
    }

    /// Rate and limits of `pair`, as in `btc_eth`.
    pub async fn get_market_info(&self, pair: &str) -> Result<MarketInfo> {
        decode(self.get(&format!("marketinfo/{pair}")).await?)
    }

    /// Status of the exchange fed by the deposit `address`.
    pub async fn get_status(&self, address: &str) -> Result<DepositStatus> {
        decode(self.get(&format!("txStat/{address}")).await?)
    }

    /// Opens an exchange of `pair` paying out to `to`; refunds go to `return_address`.
    pub async fn shift(&self, to: &str, return_address: &str, pair: &str) -> Result<ShiftResponse> {
        let body = json!({
            "withdrawal": to,
            "pair": pair,
            "returnAddress": return_address,
            "apiKey": self.api_key,
        });
        decode(self.post("shift", &body).await?)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        trace!("[{}] GET {}", SHAPESHIFT, path);
        let response = self.http.get(format!("{}{}", self.endpoint, path)).send().await?;
        check(response.error_for_status()?.json().await?)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        trace!("[{}] POST {}", SHAPESHIFT, path);
        let response = self.http.post(format!("{}{}", self.endpoint, path)).json(body).send().await?;
        check(response.error_for_status()?.json().await?)
    }
}

/// Turns an answer carrying an `error` field into [`Error::Api`].
///
/// A status answer reports the failure of the tracked exchange itself in `error`,
/// so answers that carry a `status` are passed through.
fn check(value: Value) -> Result<Value> {
    match value.get("error") {
        Some(err) if value.get("status").is_none() => {
            Err(Error::Api(err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string())))
        }
        _ => Ok(value),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl StatusSource for ShapeshiftClient {
    async fn deposit_status(&self, key: &str) -> Result<DepositStatus> {
        self.get_status(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    #[test]
    fn test_check() {
        assert_eq!(check(json!({ "error": "Invalid pair" })), Err(Error::Api("Invalid pair".to_string())));
        assert!(matches!(check(json!({ "error": { "code": 1 } })), Err(Error::Api(_))));
        assert!(check(json!({ "status": "failed", "error": "timeout" })).is_ok());
        assert!(check(json!({ "BTC": { "name": "Bitcoin", "symbol": "BTC" } })).is_ok());
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(matches!(ShapeshiftClient::new(ShapeshiftConfig::default().with_endpoint("ftp://x")), Err(Error::Configuration(_))));
        let client = ShapeshiftClient::new(ShapeshiftConfig::default().with_endpoint("http://localhost:8080")).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/");
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            buffer.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buffer).to_string();
            if let Some(pos) = text.find("\r\n\r\n") {
                let length = text[..pos]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if n == 0 || buffer.len() >= pos + 4 + length {
                    return text;
                }
            } else if n == 0 {
                return text;
            }
        }
    }

    /// Serves `count` requests, answering each with `body` and reporting the request heads.
    async fn serve(body: &'static str, count: usize) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for _ in 0..count {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
            requests
        });
        (endpoint, server)
    }

    #[tokio::test]
    async fn test_get_status() {
        let (endpoint, server) = serve(r#"{"status":"complete","address":"addr1","outgoingCoin":"0.5"}"#, 1).await;
        let client = ShapeshiftClient::new(ShapeshiftConfig::default().with_endpoint(endpoint)).unwrap();

        let status = client.deposit_status("addr1").await.unwrap();
        assert_eq!(status.status, Status::Complete);
        assert_eq!(status.get("outgoingCoin"), Some(&json!("0.5")));
        assert!(server.await.unwrap()[0].starts_with("GET /txStat/addr1 "));
    }

    #[tokio::test]
    async fn test_exchange_error() {
        let (endpoint, server) = serve(r#"{"error":"Unknown pair"}"#, 1).await;
        let client = ShapeshiftClient::new(ShapeshiftConfig::default().with_endpoint(endpoint)).unwrap();
        assert_eq!(client.get_market_info("abc_def").await.unwrap_err(), Error::Api("Unknown pair".to_string()));
        assert!(server.await.unwrap()[0].starts_with("GET /marketinfo/abc_def "));
    }

    #[tokio::test]
    async fn test_shift_request_body() {
        let (endpoint, server) = serve(r#"{"deposit":"1Dep","depositType":"BTC","withdrawal":"0xabc","withdrawalType":"ETH"}"#, 1).await;
        let config = ShapeshiftConfig::default().with_endpoint(endpoint).with_api_key("pub-123");
        let client = ShapeshiftClient::new(config).unwrap();

        let shift = client.shift("0xabc", "1Return", "btc_eth").await.unwrap();
        assert_eq!(shift.deposit, "1Dep");
        assert_eq!(shift.withdrawal_type.as_deref(), Some("ETH"));

        let request = server.await.unwrap().remove(0);
        assert!(request.starts_with("POST /shift "));
        let body: Value = serde_json::from_str(request.split("\r\n\r\n").nth(1).unwrap()).unwrap();
        assert_eq!(body, json!({ "withdrawal": "0xabc", "pair": "btc_eth", "returnAddress": "1Return", "apiKey": "pub-123" }));
    }
}
