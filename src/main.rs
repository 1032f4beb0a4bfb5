mod client;
mod config;
mod storage;
#[cfg(test)]
mod test_support;

use chrono::Local;
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use client::gps::services::{establish_session, get_vehicle_status};
use config::config::Config;
use storage::daily_log;

/// Result of one poll cycle. The loop only logs these; a rejected poll never
/// stops the loop or touches the session cookie.
#[derive(Debug)]
pub enum PollOutcome {
    Appended { file: PathBuf, fields: usize },
    /// Non-200 from the status endpoint. An expired session surfaces here
    /// too; the vendor gives no way to tell it apart from a transient error.
    Rejected(StatusCode),
    RequestFailed(String),
    WriteFailed(String),
}

#[tokio::main]
async fn main() {
    println!("GPS crawler started");
    log_to_csv("INFO", "GPS crawler started");
    println!("Reading environment variables");
    log_to_csv("INFO", "Reading environment variables");

    let env = Config::from_env();
    if env.user_name.is_empty() || env.password.is_empty() {
        println!("USER_NAME and/or PASSWORD not configured");
        log_to_csv("ERROR", "USER_NAME and/or PASSWORD not configured");
        std::process::exit(1);
    }
    if env.tracker_id.is_empty() || env.veh_id.is_empty() || env.server_ip.is_empty() {
        println!("TRACKER_ID, VEH_ID and/or SERVER_IP not configured");
        log_to_csv("ERROR", "TRACKER_ID, VEH_ID and/or SERVER_IP not configured");
        std::process::exit(1);
    }

    println!(
        "Environment: BASE_URL: {}, VEH_ID: {}, DATA_PATH: {}, interval: {}s",
        env.base_url,
        env.veh_id,
        env.data_path.display(),
        env.poll_interval_secs
    );
    log_to_csv(
        "INFO",
        &format!(
            "Environment: BASE_URL: {}, VEH_ID: {}, DATA_PATH: {}, interval: {}s",
            env.base_url,
            env.veh_id,
            env.data_path.display(),
            env.poll_interval_secs
        ),
    );

    // The cookie is valid for the whole process lifetime as far as this side
    // is concerned; the server forgets it after ~20 minutes of inactivity and
    // there is no renewal, so polls after that fail until restart.
    let session_cookie = match establish_session(&env).await {
        Ok((StatusCode::OK, Some(cookie))) => {
            println!("Login successful");
            log_to_csv("INFO", "Login successful");
            cookie
        }
        Ok((status, _)) => {
            eprintln!("Login failed: {}", status);
            log_to_csv("ERROR", &format!("Login failed: {}", status));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Login request error: {}", e);
            log_to_csv("ERROR", &format!("Login request error: {}", e));
            std::process::exit(1);
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    run_poll_loop(env, session_cookie, stop_rx).await;

    println!("GPS crawler stopped");
    log_to_csv("INFO", "GPS crawler stopped");
}

/// Polls until the stop signal fires. One cycle, log the outcome, sleep the
/// configured interval, repeat; the sleep races the stop signal so shutdown
/// does not wait out a full interval.
async fn run_poll_loop(env: Config, session_cookie: String, mut stop: watch::Receiver<bool>) {
    loop {
        match poll_cycle(&env, &session_cookie).await {
            PollOutcome::Appended { file, fields } => {
                println!("Vehicle status appended to {} ({} fields)", file.display(), fields);
                log_to_csv(
                    "INFO",
                    &format!("Vehicle status appended to {} ({} fields)", file.display(), fields),
                );
            }
            PollOutcome::Rejected(status) => {
                println!("Vehicle status request rejected: {}", status);
                log_to_csv("ERROR", &format!("Vehicle status request rejected: {}", status));
            }
            PollOutcome::RequestFailed(reason) => {
                println!("Vehicle status request failed: {}", reason);
                log_to_csv("ERROR", &format!("Vehicle status request failed: {}", reason));
            }
            PollOutcome::WriteFailed(reason) => {
                println!("Could not append to daily log: {}", reason);
                log_to_csv("ERROR", &format!("Could not append to daily log: {}", reason));
            }
        }

        tokio::select! {
            _ = sleep(Duration::from_secs(env.poll_interval_secs)) => {}
            _ = stop.changed() => break,
        }
    }
}

/// One poll cycle: request the vehicle's current status and append the
/// returned record to the file for today's local date.
async fn poll_cycle(env: &Config, session_cookie: &str) -> PollOutcome {
    match get_vehicle_status(env, session_cookie).await {
        Ok((StatusCode::OK, Some(response))) => {
            let today = Local::now().date_naive();
            match daily_log::append_record(&env.data_path, today, &response.d) {
                Ok(file) => PollOutcome::Appended {
                    fields: response.d.len(),
                    file,
                },
                Err(e) => PollOutcome::WriteFailed(e.to_string()),
            }
        }
        Ok((status, _)) => PollOutcome::Rejected(status),
        Err(e) => PollOutcome::RequestFailed(e.to_string()),
    }
}

fn log_to_csv(level: &str, message: &str) {
    let now = Local::now();
    let date_str = now.format("%Y-%m-%d").to_string();
    let filename = format!("logs-{}.csv", date_str);

    if let Ok(file) = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(filename)
    {
        let mut writer = csv::Writer::from_writer(file);
        let timestamp = now.to_rfc3339();

        if writer
            .write_record(&[timestamp.as_str(), level, message])
            .is_ok()
        {
            let _ = writer.flush();
        }
    } else {
        eprintln!("Could not open the run log file.");
    }
}
