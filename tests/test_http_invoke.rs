//! End-to-end invoke over HTTP:
//! 1) Serve the router on an ephemeral port backed by the in-memory ledger.
//! 2) Drive every contract function through `POST /api/invoke`.
//! 3) Check payload shapes and the status code of each failure class.

use loan_ledger_chaincode::{transport, ContractService, InMemoryLedger};
use serde_json::{json, Value};
use std::sync::Arc;

const ALL: &str = r#"{"selector":{}}"#;

async fn spawn_server() -> Result<String, Box<dyn std::error::Error>> {
    let state = transport::http::AppState {
        service: Arc::new(ContractService::default()),
        ledger: Arc::new(InMemoryLedger::new()),
    };
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok(format!("http://{addr}"))
}

async fn call(
    client: &reqwest::Client,
    base_url: &str,
    function: &str,
    args: &[&str],
) -> Result<(u16, Value), Box<dyn std::error::Error>> {
    let resp = client
        .post(format!("{base_url}/api/invoke"))
        .json(&json!({ "function": function, "args": args }))
        .send()
        .await?;
    let status = resp.status().as_u16();
    Ok((status, resp.json().await?))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invoke_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_server().await?;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{base_url}/health")).send().await?.json().await?;
    assert_eq!(health["success"], true);
    assert_eq!(health["data"]["ledger"], "memory");

    // --- Writes answer with success and no data ---
    let (status, body) = call(&client, &base_url, "Bootstrap", &[]).await?;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let lender = json!({"name": "City Bank", "idcard": "L-1"}).to_string();
    let (status, body) = call(
        &client,
        &base_url,
        "RecordContract",
        &["k1", "id1", "CN001", "1000", "2024-01-01", "loan", &lender, ""],
    )
    .await?;
    assert_eq!(status, 200, "{body}");

    let (status, body) = call(
        &client,
        &base_url,
        "RecordEvidence",
        &["ev1", "sha256:abcd", "pdf", "scan.pdf", "signature", "k1", ""],
    )
    .await?;
    assert_eq!(status, 200, "{body}");

    // --- Query ---
    let by_contract_no = r#"{"selector":{"contractNo":"CN001"}}"#;
    let (status, body) = call(&client, &base_url, "Query", &[by_contract_no]).await?;
    assert_eq!(status, 200, "{body}");
    let hits = body["data"].as_array().expect("query returns an array");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["key"], "k1");
    let stored: Value = serde_json::from_str(hits[0]["value"].as_str().unwrap())?;
    assert_eq!(stored["lender"]["name"], "City Bank");
    assert_eq!(stored["borrower"]["name"], "");

    // --- QueryPaged ---
    let (status, body) = call(&client, &base_url, "QueryPaged", &[ALL, "2", ""]).await?;
    assert_eq!(status, 200, "{body}");
    let page = &body["data"];
    assert_eq!(page["size"], "2");
    assert_eq!(page["queryResults"][0]["key"], "ev1");
    assert_eq!(page["queryResults"][1]["key"], "hmContract0");
    let bookmark = page["bookMark"].as_str().unwrap().to_string();
    assert!(!bookmark.is_empty());

    let (_, body) = call(&client, &base_url, "QueryPaged", &[ALL, "2", &bookmark]).await?;
    assert_eq!(body["data"]["size"], "1");
    assert_eq!(body["data"]["queryResults"][0]["key"], "k1");

    // Deployed function names are accepted; a zero page size is uncapped.
    let (status, body) = call(&client, &base_url, "QueryInfoByPage", &[ALL, "0", ""]).await?;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["size"], "3");

    // --- History ---
    let (status, body) = call(&client, &base_url, "History", &["k1"]).await?;
    assert_eq!(status, 200, "{body}");
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["is_del"], "false");
    assert_eq!(history[0]["tx_id"].as_str().unwrap().len(), 64);
    assert_eq!(history[0]["on_chain_time"].as_str().unwrap().len(), 19);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invoke_failure_statuses() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_server().await?;
    let client = reqwest::Client::new();

    let (status, body) = call(&client, &base_url, "DeleteEverything", &[]).await?;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("unknown function"));

    let (status, _) = call(&client, &base_url, "History", &[]).await?;
    assert_eq!(status, 400);

    let (status, _) = call(&client, &base_url, "QueryPaged", &[ALL, "abc", ""]).await?;
    assert_eq!(status, 400);

    let (status, _) = call(
        &client,
        &base_url,
        "RecordContract",
        &["k1", "id1", "CN001", "1000", "2024-01-01", "loan", "{", ""],
    )
    .await?;
    assert_eq!(status, 400);

    let (status, body) = call(&client, &base_url, "Query", &["not a query"]).await?;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("world state"));

    let blank = [""; 7];
    let (status, _) = call(&client, &base_url, "RecordEvidence", &blank).await?;
    assert_eq!(status, 500);

    let resp = client
        .post(format!("{base_url}/api/invoke"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);
    let body: Value = resp.json().await?;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    // Nothing above reached world state.
    let (_, body) = call(&client, &base_url, "Query", &[ALL]).await?;
    assert_eq!(body["data"], json!([]));

    Ok(())
}
