//! End-to-end test: `send_alert` against a scripted relay socket.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use alertrelay_core::{AlertConfig, AlertSource, send_alert};

/// Accepts one session, answers the fixed command sequence, and returns
/// the full transcript of what the client sent.
async fn scripted_relay(listener: TcpListener) -> String {
    let (stream, _) = listener.accept().await.unwrap();
    let mut stream = BufReader::new(stream);
    let mut transcript = String::new();

    stream.write_all(b"220 ready\r\n").await.unwrap();

    let mut line = String::new();
    loop {
        line.clear();
        if stream.read_line(&mut line).await.unwrap() == 0 {
            return transcript;
        }
        transcript.push_str(&line);

        let reply: &[u8] = if line.starts_with("HELO")
            || line.starts_with("MAIL")
            || line.starts_with("RCPT")
        {
            b"250 ok\r\n"
        } else if line.starts_with("DATA") {
            b"354 go ahead\r\n"
        } else if line.starts_with("QUIT") {
            stream.write_all(b"221 bye\r\n").await.unwrap();
            return transcript;
        } else if line.trim_end() == "." {
            b"250 queued\r\n"
        } else {
            // Message content; no reply until the terminating dot.
            continue;
        };
        stream.write_all(reply).await.unwrap();
    }
}

#[tokio::test]
async fn test_send_alert_delivers_in_the_background() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(scripted_relay(listener));

    let config = AlertConfig::builder("monitor@example.com")
        .relay("127.0.0.1")
        .relay_port(port)
        .timeout(Duration::from_secs(5))
        .recipient("ops@example.com")
        .deployment_id("LB1")
        .helo_hostname("monitor.example.com")
        .build();

    send_alert(
        &config,
        Some(&AlertSource::Instance("VI_1".to_string())),
        "entering backup state",
        "priority lost on eth0",
    );

    let transcript = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .unwrap()
        .unwrap();

    assert!(transcript.contains("HELO monitor.example.com"));
    assert!(transcript.contains("MAIL FROM:<monitor@example.com>"));
    assert!(transcript.contains("RCPT TO:<ops@example.com>"));
    assert!(transcript.contains("Subject: [LB1] Instance VI_1 - entering backup state"));
    assert!(transcript.contains("priority lost on eth0"));
    assert!(transcript.contains("QUIT"));
}
