//! End-to-end export runs against a mock API

use crate::support::{
    list_files, mount_json, mount_single_model_brand, mount_status, price_json, read_rows,
    test_config,
};
use fipe_export::output::{OutputResult, HEADER};
use fipe_export::walker::export;
use fipe_export::{AppendOutcome, FipeClient, PriceRecord, RecordSink, Walker};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers model lists after `delay`, remembering when each request arrived
#[derive(Clone)]
struct SlowModelList {
    delay: Duration,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl SlowModelList {
    /// Most requests that were in flight at the same moment
    ///
    /// A request counts as in flight from its arrival until its delayed
    /// response leaves the server.
    fn peak_in_flight(&self) -> usize {
        let arrivals = self.arrivals.lock().unwrap();
        arrivals
            .iter()
            .map(|t| {
                arrivals
                    .iter()
                    .filter(|s| *s <= t && *t < **s + self.delay)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

impl Respond for SlowModelList {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200)
            .set_body_json(json!({ "modelos": [] }))
            .set_delay(self.delay)
    }
}

/// Collects batches, panicking on any batch from one brand
struct PanickingSink {
    panic_on_brand: &'static str,
    batches: Mutex<Vec<Vec<PriceRecord>>>,
}

impl RecordSink for PanickingSink {
    fn append(&self, records: &[PriceRecord]) -> OutputResult<AppendOutcome> {
        if records.iter().any(|r| r.brand == self.panic_on_brand) {
            panic!("sink exploded on {}", self.panic_on_brand);
        }
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(AppendOutcome::Skipped)
    }
}

#[tokio::test]
async fn test_single_record_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("Excel");

    mount_json(&server, "/carros/marcas", json!([{ "codigo": "1", "nome": "Fiat" }])).await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos",
        json!({ "modelos": [{ "codigo": "2", "nome": "Uno" }] }),
    )
    .await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos/2/anos",
        json!([{ "codigo": "2020-1", "nome": "2020 Gasolina" }]),
    )
    .await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos/2/anos/2020-1",
        price_json("001234-5", "Fiat", "Uno", "2020"),
    )
    .await;

    let config = test_config(&server, &out);
    let summary = export(&config, "carros").await.expect("export");

    assert_eq!(list_files(&out), vec!["001234-5 - Fiat - Uno.xlsx"]);
    assert_eq!(summary.counts.files_created, 1);
    assert_eq!(summary.counts.rows_written, 1);

    let rows = read_rows(&out.join("001234-5 - Fiat - Uno.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], HEADER.map(String::from).to_vec());
    assert_eq!(
        rows[1],
        vec![
            "001234-5",
            "Fiat",
            "Uno",
            "2020",
            "R$ 30.000,00",
            "Gasolina",
            "março de 2024",
            "carros",
            "G"
        ]
    );
}

#[tokio::test]
async fn test_empty_brand_list_makes_no_further_calls() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("Excel");

    Mock::given(method("GET"))
        .and(path("/carros/marcas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/carros/marcas/.+"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = export(&test_config(&server, &out), "carros")
        .await
        .expect("export");

    assert_eq!(summary.counts.brands, 0);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_brand_list_failure_is_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_status(&server, "/barcos/marcas", 404).await;

    let result = export(&test_config(&server, dir.path()), "barcos").await;
    assert!(result.is_err());
    assert!(list_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_all_price_fetches_failing_skips_batch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/carros/marcas", json!([{ "codigo": "1", "nome": "Fiat" }])).await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos",
        json!({ "modelos": [{ "codigo": 2, "nome": "Uno" }] }),
    )
    .await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos/2/anos",
        json!([
            { "codigo": "2020-1", "nome": "2020 Gasolina" },
            { "codigo": "2021-1", "nome": "2021 Gasolina" }
        ]),
    )
    .await;
    mount_status(&server, "/carros/marcas/1/modelos/2/anos/2020-1", 500).await;
    mount_status(&server, "/carros/marcas/1/modelos/2/anos/2021-1", 404).await;

    let summary = export(&test_config(&server, dir.path()), "carros")
        .await
        .expect("export");

    assert!(list_files(dir.path()).is_empty());
    assert_eq!(summary.counts.batches_skipped, 1);
    assert_eq!(summary.counts.fetch_failures, 2);
    assert_eq!(summary.counts.brands_completed, 1);
}

#[tokio::test]
async fn test_partial_batch_writes_successful_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/carros/marcas", json!([{ "codigo": "1", "nome": "Fiat" }])).await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos",
        json!({ "modelos": [{ "codigo": 2, "nome": "Uno" }] }),
    )
    .await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos/2/anos",
        json!([
            { "codigo": "2019-1", "nome": "2019 Gasolina" },
            null,
            { "codigo": "2020-1", "nome": "2020 Gasolina" }
        ]),
    )
    .await;
    mount_status(&server, "/carros/marcas/1/modelos/2/anos/2019-1", 500).await;
    mount_json(
        &server,
        "/carros/marcas/1/modelos/2/anos/2020-1",
        price_json("001234-5", "Fiat", "Uno", "2020"),
    )
    .await;

    let summary = export(&test_config(&server, dir.path()), "carros")
        .await
        .expect("export");

    assert_eq!(summary.counts.years, 2);
    assert_eq!(summary.counts.records_fetched, 1);

    let rows = read_rows(&dir.path().join("001234-5 - Fiat - Uno.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][3], "2020");
}

#[tokio::test]
async fn test_each_brand_produces_its_own_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(
        &server,
        "/carros/marcas",
        json!([
            { "codigo": "1", "nome": "Fiat" },
            { "codigo": "2", "nome": "Ford" },
            null,
            { "codigo": "3", "nome": "Honda" },
            { "codigo": "4", "nome": "Kia" }
        ]),
    )
    .await;
    mount_single_model_brand(&server, ("1", "Fiat"), ("10", "Uno"), "001001-1", &["2020"]).await;
    mount_single_model_brand(&server, ("2", "Ford"), ("20", "Ka"), "002002-2", &["2019"]).await;
    mount_single_model_brand(&server, ("3", "Honda"), ("30", "Fit"), "003003-3", &["2018"]).await;
    mount_single_model_brand(&server, ("4", "Kia"), ("40", "Rio"), "004004-4", &["2017"]).await;

    let summary = export(&test_config(&server, dir.path()), "carros")
        .await
        .expect("export");

    assert_eq!(summary.counts.brands, 4);
    assert_eq!(summary.counts.brands_completed, 4);
    assert_eq!(
        list_files(dir.path()),
        vec![
            "001001-1 - Fiat - Uno.xlsx",
            "002002-2 - Ford - Ka.xlsx",
            "003003-3 - Honda - Fit.xlsx",
            "004004-4 - Kia - Rio.xlsx",
        ]
    );
}

#[tokio::test]
async fn test_brand_fan_out_respects_limit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let brands: Vec<_> = (1..=6)
        .map(|n| json!({ "codigo": n.to_string(), "nome": format!("Marca {}", n) }))
        .collect();
    mount_json(&server, "/carros/marcas", json!(brands)).await;

    let responder = SlowModelList {
        delay: Duration::from_millis(200),
        arrivals: Arc::new(Mutex::new(Vec::new())),
    };
    Mock::given(method("GET"))
        .and(path_regex(r"^/carros/marcas/\d+/modelos$"))
        .respond_with(responder.clone())
        .expect(6)
        .mount(&server)
        .await;

    let config = test_config(&server, dir.path());
    assert_eq!(config.walker.max_concurrent_brands, 2);

    let started = Instant::now();
    let summary = export(&config, "carros").await.expect("export");

    assert_eq!(summary.counts.brands_completed, 6);
    assert_eq!(responder.arrivals.lock().unwrap().len(), 6);
    assert_eq!(responder.peak_in_flight(), 2);
    // Six slow brands, two at a time
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_panicking_sink_does_not_stop_other_brands() {
    let server = MockServer::start().await;

    mount_json(
        &server,
        "/carros/marcas",
        json!([{ "codigo": "1", "nome": "Fiat" }, { "codigo": "2", "nome": "Ford" }]),
    )
    .await;
    mount_single_model_brand(&server, ("1", "Fiat"), ("10", "Uno"), "001001-1", &["2020"]).await;
    mount_single_model_brand(&server, ("2", "Ford"), ("20", "Ka"), "002002-2", &["2019"]).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());
    let client = Arc::new(FipeClient::new(&config.api).expect("client"));
    let sink = Arc::new(PanickingSink {
        panic_on_brand: "Fiat",
        batches: Mutex::new(Vec::new()),
    });

    let walker = Walker::new(client, sink.clone(), "carros", 2);
    let summary = walker.run().await.expect("walk");

    let batches = sink.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].brand, "Ford");
    assert_eq!(summary.counts.write_failures, 1);
    assert_eq!(summary.counts.brands_completed, 2);
}

#[tokio::test]
async fn test_failed_brand_does_not_stop_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(
        &server,
        "/carros/marcas",
        json!([{ "codigo": "1", "nome": "Fiat" }, { "codigo": "2", "nome": "Ford" }]),
    )
    .await;
    mount_status(&server, "/carros/marcas/1/modelos", 500).await;
    mount_single_model_brand(&server, ("2", "Ford"), ("20", "Ka"), "002002-2", &["2019"]).await;

    let summary = export(&test_config(&server, dir.path()), "carros")
        .await
        .expect("export");

    assert_eq!(list_files(dir.path()), vec!["002002-2 - Ford - Ka.xlsx"]);
    assert_eq!(summary.counts.brands_completed, 1);
    assert_eq!(summary.counts.fetch_failures, 1);
}

#[tokio::test]
async fn test_second_run_appends_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/carros/marcas", json!([{ "codigo": "1", "nome": "Fiat" }])).await;
    mount_single_model_brand(
        &server,
        ("1", "Fiat"),
        ("10", "Uno"),
        "001001-1",
        &["2020", "2021"],
    )
    .await;

    let config = test_config(&server, dir.path());
    let first = export(&config, "carros").await.expect("first run");
    let second = export(&config, "carros").await.expect("second run");

    assert_eq!(first.counts.files_created, 1);
    assert_eq!(second.counts.files_created, 0);
    assert_eq!(second.counts.files_written, 1);

    let rows = read_rows(&dir.path().join("001001-1 - Fiat - Uno.xlsx"));
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0][0], "CodigoFipe");
    let years: Vec<&str> = rows[1..].iter().map(|r| r[3].as_str()).collect();
    assert_eq!(years, vec!["2020", "2021", "2020", "2021"]);
}

#[tokio::test]
async fn test_model_name_sanitized_in_file_name() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_json(&server, "/carros/marcas", json!([{ "codigo": "1", "nome": "Fiat" }])).await;
    mount_single_model_brand(
        &server,
        ("1", "Fiat"),
        ("10", "Uno 1.0/1.3 <Mille>"),
        "001001-1",
        &["2020"],
    )
    .await;

    export(&test_config(&server, dir.path()), "carros")
        .await
        .expect("export");

    assert_eq!(
        list_files(dir.path()),
        vec!["001001-1 - Fiat - Uno 1.0 1.3  Mille .xlsx"]
    );
}
