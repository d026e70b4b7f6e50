use anyhow::Context;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use trackcore::model::{DeviceId, DeviceRecord, Envelope, PositionRecord};
use trackcore::{PositionTransport, TransportError};

/// reqwest-backed client of the tracking backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Request(err.to_string())
    }
}

impl HttpTransport {
    pub fn new(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, TransportError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let envelope: Envelope<T> = response.json().await.map_err(request_error)?;
        Ok(envelope.into_inner())
    }

    pub async fn fetch_devices(&self) -> Result<Vec<DeviceRecord>, TransportError> {
        self.get_list("api/devices", &[]).await
    }

    pub async fn fetch_route(&self, device_id: DeviceId) -> Result<Vec<PositionRecord>, TransportError> {
        self.get_list("api/reports/route", &[("deviceId", device_id.to_string())])
            .await
    }
}

impl PositionTransport for HttpTransport {
    fn fetch_updates(
        &self,
        first: bool,
    ) -> impl Future<Output = Result<Vec<PositionRecord>, TransportError>> + Send {
        let transport = self.clone();
        async move {
            transport
                .get_list("api/async", &[("first", first.to_string())])
                .await
        }
    }
}
