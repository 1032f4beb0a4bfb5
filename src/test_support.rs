use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::config::Config;

/// Starts a throwaway HTTP server on an ephemeral local port and hands back
/// its address. Each test supplies its own routing closure; the server lives
/// as long as the test's runtime does.
pub fn spawn_stub<F>(handler: F) -> SocketAddr
where
    F: Fn(Request<Body>) -> Response<Body> + Clone + Send + Sync + 'static,
{
    let make_svc = make_service_fn(move |_conn| {
        let handler = handler.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler(req)) }
            }))
        }
    });

    let server = Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

/// Config pointed at a stub server, with a zero-length poll sleep so loop
/// tests do not wait on the wall clock.
pub fn stub_config(addr: SocketAddr, data_path: &Path) -> Config {
    Config {
        base_url: format!("http://{}", addr),
        user_name: "driver01".to_string(),
        password: "secret".to_string(),
        tracker_id: "8000".to_string(),
        veh_id: "V1".to_string(),
        server_ip: "10.0.0.2".to_string(),
        data_path: data_path.to_path_buf(),
        poll_interval_secs: 0,
    }
}
