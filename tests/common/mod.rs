use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use shiftscraper::{ScrapingContext, config::ScrapingConfig};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub const BL2_PAGE: &str = r#"<html><body>
<table class="wikitable">
  <tr><th>Source</th><th>Expires</th><th>Reward</th><th>PC / Mac</th><th>PlayStation 3</th><th>Xbox 360</th></tr>
  <tr><td>Twitter</td><td>May 15, 2014</td><td>3 Golden Keys</td>
      <td>WBKTT-6WHJ6-6J53F-BRJXC-JXC3T</td>
      <td>5BKBJ-FSH3J-JTTJB-3BJB3-BSBB9</td>
      <td>CTCBT-3FR9K-XHSFT-5SBT3-THSZ5</td></tr>
  <tr><td>Facebook</td><td>Unknown</td><td>1 Golden Key</td>
      <td colspan="3">K3WBB-RRXXX-5BRR5-XTJBB-WBHKR</td></tr>
</table>
</body></html>"#;

#[derive(Default)]
struct Counters {
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A local HTTP server answering every request with the same page.
pub struct MockPage {
    pub url: String,
    counters: Arc<Counters>,
}

impl MockPage {
    pub async fn serve(status_line: &'static str, body: &'static str) -> Self {
        Self::serve_after(status_line, body, Duration::ZERO).await
    }

    /// Like `serve`, but holds every response back for `delay`.
    pub async fn serve_after(status_line: &'static str, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/codes", listener.local_addr().unwrap());
        let counters = Arc::new(Counters::default());

        let shared = Arc::clone(&counters);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let counters = Arc::clone(&shared);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    counters.hits.fetch_add(1, Ordering::SeqCst);
                    let now_in_flight = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    counters.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { url, counters }
    }

    pub async fn ok(body: &'static str) -> Self {
        Self::serve("200 OK", body).await
    }

    pub fn hits(&self) -> usize {
        self.counters.hits.load(Ordering::SeqCst)
    }

    /// Highest number of requests this page was answering at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

/// A URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/codes", addr)
}

pub fn context(bl2_url: &str, blps_url: &str, spam_window_secs: u64) -> ScrapingContext {
    let config = ScrapingConfig {
        bl2_url: bl2_url.to_string(),
        blps_url: blps_url.to_string(),
        spam_window_secs,
        request_timeout_secs: 5,
        ..ScrapingConfig::default()
    };
    ScrapingContext::with_config(config).unwrap()
}
