use crate::proxy::request_handler::ReverseProxy;
use anyhow::Result;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, header};
use log::{error, info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, SocketAddr, TcpListener};

/// Serve the proxy on `addr`, rebinding if the listener fails
pub async fn start_rp_server(addr: SocketAddr, proxy: ReverseProxy) -> Result<()> {
    loop {
        let listener = match TcpListener::bind(addr) {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind reverse proxy on {}: {}", addr, e);
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                continue;
            }
        };

        if let Err(e) = serve(listener, proxy.clone(), std::future::pending::<()>()).await {
            error!("Server error: {}", e);
        }
    }
}

/// Serve the proxy on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, proxy: ReverseProxy, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let client_ip = conn.remote_addr().ip();
        let proxy = proxy.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let proxy = proxy.clone();
                async move { Ok::<_, Infallible>(proxy_or_error(&proxy, client_ip, req).await) }
            }))
        }
    });

    info!("Reverse Proxy Server running on {}", addr);
    hyper::Server::from_tcp(listener)?.serve(make_svc).with_graceful_shutdown(shutdown).await?;
    info!("Reverse Proxy Server on {} stopped", addr);
    Ok(())
}

// The future is dropped when the client goes away, which aborts the upstream call.
async fn proxy_or_error(proxy: &ReverseProxy, client_ip: IpAddr, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    match proxy.handle(req).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status_code();
            warn!("Proxying {} {} for {} failed with {}: {}", method, uri, client_ip, status, e);
            let mut response = Response::new(Body::from(status.canonical_reason().unwrap_or("Proxy Error")));
            *response.status_mut() = status;
            response.headers_mut().insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));
            response
        }
    }
}
