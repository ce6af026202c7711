// src/middleware/client_ip.rs

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};

// IP de origem para a bitácora (atrás de proxy vem nos cabeçalhos)
#[derive(Debug, Clone, Default)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        ClientIp(forwarded.or_else(real_ip).map(str::to_string))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn first_forwarded_address_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("172.16.0.1"));
        assert_eq!(ClientIp::from_headers(&headers).as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.20"));
        assert_eq!(ClientIp::from_headers(&headers).as_deref(), Some("192.168.1.20"));
        assert_eq!(ClientIp::from_headers(&HeaderMap::new()).as_deref(), None);
    }
}
