use serde::Deserialize;
use trackcore::model::DeviceId;

/// Query of `GET /api/async`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AsyncQuery {
    #[serde(default)]
    pub first: bool,
}

/// Query of `GET /api/reports/route`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteQuery {
    #[serde(rename = "deviceId")]
    pub device_id: DeviceId,
}
