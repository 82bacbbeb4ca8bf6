#![cfg(not(target_os = "windows"))]

use cbpaas_proxy::{ProxyConfig, ProxyError, ProxySettings, ReverseProxy};
use hyper::body::to_bytes;
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Request, Response, StatusCode, header};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509, X509NameBuilder};
use std::convert::Infallible;
use std::net::SocketAddr;

// PEM certificate and PKCS#8 key for 127.0.0.1, signed by nobody a client would trust
fn self_signed_identity() -> native_tls::Identity {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    let san = SubjectAlternativeName::new().dns("localhost").ip("127.0.0.1").build(&builder.x509v3_context(None, None)).unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    native_tls::Identity::from_pkcs8(&cert.to_pem().unwrap(), &key.private_key_to_pem_pkcs8().unwrap()).unwrap()
}

async fn tls_backend_handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let host = req.headers().get(header::HOST).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    let body = format!("{} {}", req.uri().path(), host);
    Ok(Response::new(Body::from(body)))
}

async fn start_tls_backend() -> SocketAddr {
    let acceptor = tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(self_signed_identity()).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(tls) = acceptor.accept(stream).await {
                    let _ = Http::new().serve_connection(tls, service_fn(tls_backend_handler)).await;
                }
            });
        }
    });
    addr
}

fn proxy_for(backend: SocketAddr, verify_tls: bool) -> ReverseProxy {
    let mut settings = ProxySettings::new(format!("https://{}/shop", backend), "/bff/api");
    settings.verify_tls = verify_tls;
    settings.upstream_timeout_secs = Some(5);
    ReverseProxy::new(ProxyConfig::from_settings(settings).unwrap()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_untrusted_certificate_rejected_when_verifying() {
    let backend = start_tls_backend().await;
    let proxy = proxy_for(backend, true);

    let err = proxy.handle(get("/bff/api/secure")).await.unwrap_err();
    assert!(matches!(err, ProxyError::UpstreamConnection(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_untrusted_certificate_accepted_when_verification_disabled() {
    let backend = start_tls_backend().await;
    let proxy = proxy_for(backend, false);

    let response = proxy.handle(get("/bff/api/secure")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body()).await.unwrap();
    assert_eq!(body, format!("/shop/secure {}", backend).as_bytes());
}
