use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, ORIGIN, REFERER,
    SET_COOKIE, USER_AGENT,
};
use reqwest::{redirect, StatusCode};

use crate::client::gps::models::{CheckLoginRequest, VehicleStatusRequest, VehicleStatusResponse};
use crate::config::config::Config;

/// Cookie the vendor's ASP.NET frontend mints on the first unauthenticated
/// GET; the login POST binds it to the authenticated session server-side.
pub const SESSION_COOKIE_NAME: &str = "ASP.NET_SessionId";

// Fixed values the vendor's own frontend sends with every status request.
const VEHICLE_TYPE: &str = "2169";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/96.0.4664.45 Safari/537.36";

/// Headers shared by every request; the service rejects clients that do not
/// look like a browser.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        "Sec-Ch-Ua",
        HeaderValue::from_static("\" Not A;Brand\";v=\"99\", \"Chromium\";v=\"96\""),
    );
    headers.insert("Sec-Ch-Ua-Mobile", HeaderValue::from_static("?0"));
    headers.insert("Sec-Ch-Ua-Platform", HeaderValue::from_static("Linux"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}

fn insert_session_cookie(headers: &mut HeaderMap, session_cookie: &str) {
    let value = format!("{}={}", SESSION_COOKIE_NAME, session_cookie);
    if let Ok(header_value) = HeaderValue::from_str(&value) {
        headers.insert(COOKIE, header_value);
    }
}

fn session_id_from_set_cookie(raw: &str) -> Option<String> {
    let (name, rest) = raw.split_once('=')?;
    if name.trim() != SESSION_COOKIE_NAME {
        return None;
    }
    rest.split(';').next().map(|id| id.trim().to_string())
}

/// Two-step login handshake. Step 1 GETs the service root with redirects
/// disabled to pick a fresh session id out of the Set-Cookie headers; step 2
/// POSTs the credentials against that cookie. On HTTP 200 the session id from
/// step 1 is the authorized token (the server issues nothing new in step 2).
pub async fn establish_session(
    env: &Config,
) -> Result<(StatusCode, Option<String>), reqwest::Error> {
    let client = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()?;

    let mut headers = browser_headers();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
             image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
        ),
    );
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));

    let res = client.get(&env.base_url).headers(headers).send().await?;
    let bootstrap_status = res.status();

    let session_cookie = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_id_from_set_cookie);

    let session_cookie = match session_cookie {
        Some(cookie) => cookie,
        None => return Ok((bootstrap_status, None)),
    };

    let url = format!("{}/Login.aspx/CheckLogin", env.base_url);
    let request_data = CheckLoginRequest {
        username: env.user_name.clone(),
        password: env.password.clone(),
        login_type: 0,
    };

    let mut headers = browser_headers();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=UTF-8"),
    );
    headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
    if let Ok(header_value) = HeaderValue::from_str(&env.base_url) {
        headers.insert(ORIGIN, header_value);
    }
    let referer = format!("{}/Domain/gps.toanthangjsc.vn/login.html?v=2.01.01", env.base_url);
    if let Ok(header_value) = HeaderValue::from_str(&referer) {
        headers.insert(REFERER, header_value);
    }
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
    insert_session_cookie(&mut headers, &session_cookie);

    let res = client
        .post(url)
        .headers(headers)
        .json(&request_data)
        .send()
        .await?;

    let status = res.status();
    if status == StatusCode::OK {
        Ok((status, Some(session_cookie)))
    } else {
        Ok((status, None))
    }
}

/// One status request. Returns the vendor's record on HTTP 200, the bare
/// status otherwise; the caller decides what a non-200 means.
pub async fn get_vehicle_status(
    env: &Config,
    session_cookie: &str,
) -> Result<(StatusCode, Option<VehicleStatusResponse>), reqwest::Error> {
    let url = format!("{}/Default.aspx/VehicleStatus", env.base_url);
    let request_data = VehicleStatusRequest {
        tracker_id: env.tracker_id.clone(),
        veh_id: env.veh_id.clone(),
        show_output: 0,
        obd: 0,
        vehicle_type: VEHICLE_TYPE.to_string(),
        server_ip: env.server_ip.clone(),
    };

    let mut headers = browser_headers();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=UTF-8"),
    );
    headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
    if let Ok(header_value) = HeaderValue::from_str(&env.base_url) {
        headers.insert(ORIGIN, header_value);
    }
    let referer = format!("{}/Default1.aspx", env.base_url);
    if let Ok(header_value) = HeaderValue::from_str(&referer) {
        headers.insert(REFERER, header_value);
    }
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
    insert_session_cookie(&mut headers, session_cookie);

    let client = reqwest::Client::new();
    let res = client
        .post(url)
        .headers(headers)
        .json(&request_data)
        .send()
        .await?;

    let status = res.status();
    if status == StatusCode::OK {
        let json = res.json::<VehicleStatusResponse>().await?;
        Ok((status, Some(json)))
    } else {
        Ok((status, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stub_config, spawn_stub};
    use hyper::{Body, Response};

    #[test]
    fn set_cookie_parsing_picks_the_session_id() {
        let raw = "ASP.NET_SessionId=abc123; path=/; HttpOnly";
        assert_eq!(session_id_from_set_cookie(raw), Some("abc123".to_string()));
        assert_eq!(session_id_from_set_cookie("OtherCookie=x; path=/"), None);
        assert_eq!(session_id_from_set_cookie("not a cookie"), None);
    }

    #[tokio::test]
    async fn establish_session_returns_cookie_on_success() {
        let addr = spawn_stub(|req| match req.uri().path() {
            "/" => Response::builder()
                .status(302)
                .header("Set-Cookie", "ASP.NET_SessionId=abc123; path=/; HttpOnly")
                .header("Location", "/Domain/login.html")
                .body(Body::empty())
                .unwrap(),
            "/Login.aspx/CheckLogin" => Response::builder()
                .status(200)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"d":"OK"}"#))
                .unwrap(),
            _ => Response::builder().status(404).body(Body::empty()).unwrap(),
        });

        let env = stub_config(addr, std::path::Path::new("unused"));
        let (status, cookie) = establish_session(&env).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cookie.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn establish_session_rejected_credentials_yield_no_cookie() {
        let addr = spawn_stub(|req| match req.uri().path() {
            "/" => Response::builder()
                .status(302)
                .header("Set-Cookie", "ASP.NET_SessionId=abc123; path=/")
                .body(Body::empty())
                .unwrap(),
            "/Login.aspx/CheckLogin" => Response::builder()
                .status(401)
                .body(Body::empty())
                .unwrap(),
            _ => Response::builder().status(404).body(Body::empty()).unwrap(),
        });

        let env = stub_config(addr, std::path::Path::new("unused"));
        let (status, cookie) = establish_session(&env).await.unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(cookie.is_none());
    }

    #[tokio::test]
    async fn establish_session_without_set_cookie_stops_after_bootstrap() {
        let addr = spawn_stub(|req| match req.uri().path() {
            "/" => Response::builder().status(200).body(Body::empty()).unwrap(),
            // Reaching the login endpoint without a cookie would be a bug.
            "/Login.aspx/CheckLogin" => {
                Response::builder().status(500).body(Body::empty()).unwrap()
            }
            _ => Response::builder().status(404).body(Body::empty()).unwrap(),
        });

        let env = stub_config(addr, std::path::Path::new("unused"));
        let (status, cookie) = establish_session(&env).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(cookie.is_none());
    }

    #[tokio::test]
    async fn get_vehicle_status_presents_the_session_cookie() {
        let addr = spawn_stub(|req| {
            let authorized = req
                .headers()
                .get("Cookie")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.contains("ASP.NET_SessionId=abc123"))
                .unwrap_or(false);
            if req.uri().path() == "/Default.aspx/VehicleStatus" && authorized {
                Response::builder()
                    .status(200)
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"d":{"VehID":"V1","stime":"08:00:00 01/01/2024","lat":"10.0","lng":"20.0"}}"#,
                    ))
                    .unwrap()
            } else {
                Response::builder().status(401).body(Body::empty()).unwrap()
            }
        });

        let env = stub_config(addr, std::path::Path::new("unused"));
        let (status, response) = get_vehicle_status(&env, "abc123").await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let record = response.unwrap().d;
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["VehID", "stime", "lat", "lng"]);
        assert_eq!(record["VehID"], "V1");

        let (status, response) = get_vehicle_status(&env, "wrong").await.unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn get_vehicle_status_passes_server_errors_through() {
        let addr = spawn_stub(|_req| {
            Response::builder().status(500).body(Body::empty()).unwrap()
        });

        let env = stub_config(addr, std::path::Path::new("unused"));
        let (status, response) = get_vehicle_status(&env, "abc123").await.unwrap();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.is_none());
    }
}
