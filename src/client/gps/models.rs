use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct CheckLoginRequest {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Type")]
    pub login_type: u8,
}

#[derive(Debug, Serialize)]
pub struct VehicleStatusRequest {
    #[serde(rename = "TrackerID")]
    pub tracker_id: String,
    #[serde(rename = "VehID")]
    pub veh_id: String,
    #[serde(rename = "Show_Output")]
    pub show_output: u8,
    #[serde(rename = "OBD")]
    pub obd: u8,
    #[serde(rename = "VehicleType")]
    pub vehicle_type: String,
    #[serde(rename = "ServerIp")]
    pub server_ip: String,
}

/// Envelope returned by the status endpoint. The record itself is the
/// vendor-shaped map under "d" (VehID, stime, lat, lng, velocity, ...);
/// field names and values are taken as-is, no typing beyond JSON scalars.
#[derive(Debug, Deserialize)]
pub struct VehicleStatusResponse {
    pub d: Map<String, Value>,
}
