use std::time::Duration;

use farehound_core::{CoreError, CoreResult, FareSource, ResultsDocument, SearchForm};
use reqwest::blocking::{Client, Request};
use tracing::debug;

use crate::app_config::SourceConfig;

/// Submits search forms to the booking site and parses the returned page.
pub struct HttpFareSource {
    client: Client,
    endpoint: String,
}

impl HttpFareSource {
    pub fn new(config: &SourceConfig) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CoreError::FetchError(Box::new(e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn request(&self, form: &SearchForm) -> reqwest::Result<Request> {
        self.client
            .post(&self.endpoint)
            .form(&form.form_fields())
            .build()
    }
}

impl FareSource for HttpFareSource {
    fn fetch(&self, form: &SearchForm) -> CoreResult<ResultsDocument> {
        let request = self.request(form).map_err(|e| CoreError::FetchError(Box::new(e)))?;
        debug!(
            endpoint = %self.endpoint,
            outbound = %form.outbound_date,
            inbound = %form.return_date,
            "Submitting search form"
        );

        let response = self
            .client
            .execute(request)
            .map_err(|e| CoreError::FetchError(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::FetchError(
                format!("HTTP {} for {}", status, self.endpoint).into(),
            ));
        }

        let body = response
            .text()
            .map_err(|e| CoreError::FetchError(Box::new(e)))?;
        debug!(bytes = body.len(), "Received results page");

        Ok(ResultsDocument::parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use farehound_core::Query;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn source_at(endpoint: &str) -> HttpFareSource {
        HttpFareSource::new(&SourceConfig {
            endpoint: endpoint.to_string(),
            timeout_seconds: 5,
            ..SourceConfig::default()
        })
        .unwrap()
    }

    fn source() -> HttpFareSource {
        source_at("http://localhost:9/search")
    }

    fn dal_stl() -> SearchForm {
        SearchForm::builder("DAL".parse().unwrap(), "STL".parse().unwrap()).build(
            NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 4).unwrap(),
        )
    }

    // Reads one request, headers and body, so the reply is not cut off by a reset.
    fn drain_request(stream: &mut TcpStream) {
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                return;
            }
            received.extend_from_slice(&buf[..n]);
            if let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&received[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Answers a single request with `status` and `body`, returning the endpoint URL.
    fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            drain_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/search", addr)
    }

    #[test]
    fn test_fetch_parses_successful_response() {
        let endpoint = serve_once(
            "200 OK",
            r#"<html><body><table class="searchResultsTable"><tr><td>row</td></tr></table></body></html>"#,
        );

        let document = source_at(&endpoint).fetch(&dal_stl()).unwrap();
        let tables = Query::new("table", Some("searchResultsTable")).unwrap();
        assert_eq!(document.find_all(&tables).len(), 1);
    }

    #[test]
    fn test_error_status_is_fetch_error() {
        let endpoint = serve_once("503 Service Unavailable", "down for maintenance");

        let err = source_at(&endpoint).fetch(&dal_stl()).unwrap_err();
        match err {
            CoreError::FetchError(inner) => assert!(inner.to_string().contains("503")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_refused_connection_is_fetch_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

        let err = source_at(&format!("http://{}/search", addr))
            .fetch(&dal_stl())
            .unwrap_err();
        assert!(matches!(err, CoreError::FetchError(_)));
    }

    #[test]
    fn test_request_posts_url_encoded_form() {
        let request = source().request(&dal_stl()).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:9/search");

        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap();
        assert!(body.starts_with("twoWayTrip=true&originAirport=DAL&destinationAirport=STL"));
        assert!(body.contains("outboundDateString=02%2F02%2F2024"));
        assert!(body.contains("returnDateString=02%2F04%2F2024"));
        assert!(body.ends_with("submitButton=submit"));
    }
}
