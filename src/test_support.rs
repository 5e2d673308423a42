//! Local stand-ins for the upstream services, served by axum on an ephemeral port.

use axum::Router;
use tokio::net::TcpListener;

use crate::client::Endpoints;

/// Serve `router` on 127.0.0.1 and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Endpoints with both the auth server and the API gateway pointing at `base`.
pub fn endpoints(base: &str) -> Endpoints {
    Endpoints {
        auth: base.to_string(),
        api: base.to_string(),
    }
}
