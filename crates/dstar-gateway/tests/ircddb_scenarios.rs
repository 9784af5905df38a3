// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end exercise of `spec.md` §8 scenario 6: a `sendUser` query fans
//! out across two IRCDDB backends, the first times out and is marked
//! degraded, the second answers and its result lands in the [`Cache`] with
//! `source=IRCDDB`.
//!
//! Backends are plain TCP listeners speaking the same line-oriented
//! protocol `crate::ircddb::client` implements, run in-process rather than
//! against a real ircDDB server (multi-component lifecycle tests live under
//! `tests/` per `SPEC_FULL.md` §8, the one exception to this crate's
//! colocated `#[cfg(test)]` convention).

use dstar_gateway::cache::{Cache, Dialect, Source};
use dstar_gateway::callsign::Callsign;
use dstar_gateway::ircddb::{IrcDdbClient, IrcDdbMultiClient};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Backend that accepts a connection, reads the login line, then goes
/// silent forever — the multi-client call against it must time out.
async fn spawn_silent_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, _writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let _ = lines.next_line().await; // LOGIN
        // Hold the connection open without ever answering a query.
        std::future::pending::<()>().await;
    });
    port
}

/// Backend that answers every `USER <callsign>` query with a fixed
/// resolution, matching scenario 6's literal `(F4FXL, FR1ZAB, FR1ZABG,
/// 203.0.113.5)` answer.
async fn spawn_answering_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let _ = lines.next_line().await; // LOGIN

        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(rest) = line.strip_prefix("USER ") {
                let user_call = rest.trim();
                let response = format!("USER {user_call} FR1ZAB 203.0.113.5\n");
                if writer.write_all(response.as_bytes()).await.is_err() {
                    break;
                }
            }
        }
    });
    port
}

#[tokio::test]
async fn send_user_resolves_from_second_backend_after_first_times_out() {
    let cache = Arc::new(Cache::new());

    let silent_port = spawn_silent_backend().await;
    let answering_port = spawn_answering_backend().await;

    // Short timeout keeps this test fast; production uses an 8 s timeout
    // via `IrcDdbClient::spawn`, but the degraded/timeout behavior this
    // test checks is identical either way.
    let backend1 = IrcDdbClient::spawn_with_timeout(
        "127.0.0.1".into(),
        silent_port,
        "W1ABC  G".into(),
        String::new(),
        cache.clone(),
        Duration::from_millis(200),
    );
    let backend2 = IrcDdbClient::spawn(
        "127.0.0.1".into(),
        answering_port,
        "W1ABC  G".into(),
        String::new(),
        cache.clone(),
    );

    // Drive backend 1 into its degraded state directly first, as the
    // scenario's "after backend 1 timed out" wording describes.
    let user_call = Callsign::from_str_padded("F4FXL");
    assert!(backend1.send_user(user_call).await.is_none());
    assert!(backend1.is_degraded());

    let multi = IrcDdbMultiClient::new(vec![backend1.clone(), backend2]);
    let answer = multi.send_user(user_call).await.expect("backend 2 should answer");

    assert_eq!(answer.user_call.name(), "F4FXL");
    assert_eq!(answer.repeater_call.name(), "FR1ZAB");
    assert_eq!(answer.gateway_call.name(), "FR1ZAB");
    assert!(answer.gateway_call.is_gateway());
    assert_eq!(answer.address, Ipv4Addr::new(203, 0, 113, 5));

    let record = cache
        .lookup(&Callsign::gateway("FR1ZAB"))
        .expect("IRCDDB answer should populate the cache");
    assert_eq!(record.address, Ipv4Addr::new(203, 0, 113, 5));
    assert_eq!(record.source, Source::Ircddb);
    assert!(!record.locked);
    assert!(matches!(record.dialect, Dialect::DPlusRouted));

    assert!(backend1.is_degraded());
    assert_eq!(multi.degraded_count(), 1);
}
