use std::env;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "https://gps.toanthangjsc.vn";
const DEFAULT_DATA_PATH: &str = "data";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Runtime configuration, built once at startup and passed explicitly into
/// the session establisher and the poll loop.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub user_name: String,
    pub password: String,
    pub tracker_id: String,
    pub veh_id: String,
    pub server_ip: String,
    pub data_path: PathBuf,
    pub poll_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let base_url: String = env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url: String = base_url.trim_end_matches('/').to_string();
        let user_name: String = env::var("USER_NAME").unwrap_or_else(|_| "".to_string());
        let password: String = env::var("PASSWORD").unwrap_or_else(|_| "".to_string());
        let tracker_id: String = env::var("TRACKER_ID").unwrap_or_else(|_| "".to_string());
        let veh_id: String = env::var("VEH_ID").unwrap_or_else(|_| "".to_string());
        let server_ip: String = env::var("SERVER_IP").unwrap_or_else(|_| "".to_string());
        let data_path: String = env::var("DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Config {
            base_url,
            user_name,
            password,
            tracker_id,
            veh_id,
            server_ip,
            data_path: PathBuf::from(data_path),
            poll_interval_secs,
        }
    }
}
