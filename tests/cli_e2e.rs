//! End-to-end CLI tests for the rushbuy binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("rushbuy").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Watch storefront products"))
        .stdout(predicate::str::contains("--goods"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("rushbuy").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rushbuy"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("rushbuy").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// A malformed product list is rejected before any request is made.
#[test]
fn test_binary_malformed_goods_returns_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("rushbuy").unwrap();
    cmd.args(["--goods", "abc:0", "--storefront-url", "http://127.0.0.1:9"])
        .arg("--session-file")
        .arg(temp.path().join("jd.cookies"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --goods list"));
}

#[test]
fn test_binary_period_out_of_range_returns_error() {
    let mut cmd = Command::cargo_bin("rushbuy").unwrap();
    cmd.args(["--period", "0"]).assert().failure();
}

/// A valid stored session goes straight to the cart and the finalizer, and
/// the session is written back on exit.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_full_run_with_live_session() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = tempfile::TempDir::new().unwrap();
    let session_file = temp.path().join("jd.cookies");

    Mock::given(method("GET"))
        .and(path("/getUserVerifyRight.action"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "thor=abc123; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shopping/dynamic/coupon/getBestVertualCoupons.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shopping/order/getOrderInfo.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="trade-foot"><span id="sumPayPriceId">￥0.00</span></div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shopping/order/submitOrder.action"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let file = session_file.clone();
    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("rushbuy")
            .unwrap()
            .args(["--storefront-url", uri.as_str()])
            .arg("--session-file")
            .arg(&file)
            .assert()
    })
    .await
    .unwrap();
    assert.success();

    let saved = std::fs::read_to_string(&session_file).unwrap();
    assert!(saved.contains("thor"));
    assert!(saved.contains("abc123"));
}

/// SIGTERM while a watcher is still polling stops the run cleanly and keeps
/// the session.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_sigterm_persists_session_and_exits_zero() {
    use std::process::Stdio;
    use std::time::Duration;

    use support::gbk;
    use wiremock::matchers::query_param;

    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let temp = tempfile::TempDir::new().unwrap();
    let session_file = temp.path().join("jd.cookies");

    Mock::given(method("GET"))
        .and(path("/getUserVerifyRight.action"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "thor=abc123; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart.action"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/100.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(gbk(r#"<div class="sku-name">商品100</div>"#)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/prices/mgets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":"J_100","p":"20.00"}]"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stocks"))
        .and(query_param("skuIds", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gbk(
            r#"{"100":{"StockState":34,"StockStateName":"无货"}}"#,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gate.action"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_rushbuy"))
        .args(["--storefront-url", server.uri().as_str()])
        .args(["--rush", "--period", "20", "--goods", "100"])
        .arg("--session-file")
        .arg(&session_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stock_polls = 0;
    for _ in 0..500 {
        stock_polls = server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == "/stocks")
            .count();
        if stock_polls >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(stock_polls >= 3, "watcher never started polling stock");

    let killed = std::process::Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let mut status = None;
    for _ in 0..500 {
        if let Some(exited) = child.try_wait().unwrap() {
            status = Some(exited);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let Some(status) = status else {
        child.kill().unwrap();
        panic!("binary did not exit after SIGTERM");
    };

    assert!(status.success(), "unexpected exit: {status}");
    let saved = std::fs::read_to_string(&session_file).unwrap();
    assert!(saved.contains("abc123"));
}
