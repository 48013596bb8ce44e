mod support;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cv_rag::store::{
    IndexProvisioner, IndexSpec, IndexStatus, PineconeClient, PineconeIndex, ProvisionPolicy,
    VectorIndex, VectorRecord,
};
use cv_rag::Error;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use support::stub_http::StubServer;

const INDEX_PATH: &str = "/indexes/cv-alumno";

fn spec(dimension: usize) -> IndexSpec {
    IndexSpec::cosine("cv-alumno", dimension, "aws", "us-east-1")
}

fn description(host: &str, dimension: usize, ready: bool) -> Value {
    json!({
        "name": "cv-alumno",
        "dimension": dimension,
        "metric": "cosine",
        "host": host,
        "status": {"ready": ready, "state": if ready { "Ready" } else { "Initializing" }}
    })
}

fn not_found() -> (u16, Value) {
    (404, json!({"error": {"code": "NOT_FOUND", "message": "Resource cv-alumno not found"}}))
}

fn client(control: &StubServer) -> PineconeClient {
    PineconeClient::new("pc-test", &control.url(), Duration::from_secs(5), 3)
        .expect("client")
        .with_provision_policy(ProvisionPolicy {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
        })
}

/// Control plane that always describes a ready index served by `data`.
fn open_index(data: &StubServer) -> (StubServer, PineconeIndex) {
    let host = data.url();
    let control = StubServer::start(move |request| {
        if request.is("GET", INDEX_PATH) {
            (200, description(&host, 3, true))
        } else {
            not_found()
        }
    });
    let index = client(&control)
        .with_upsert_batch(64)
        .index("cv-alumno")
        .expect("open index");
    (control, index)
}

fn records(count: usize) -> Vec<VectorRecord> {
    (0..count)
        .map(|i| {
            VectorRecord::for_chunk(&format!("cv_chunk_{i:03}"), vec![0.1, 0.2, 0.3], "texto", "cv")
        })
        .collect()
}

#[test]
fn missing_index_is_created_then_polled_until_ready() {
    let created = Arc::new(AtomicBool::new(false));
    let polls = Arc::new(AtomicUsize::new(0));
    let (created_flag, poll_count) = (Arc::clone(&created), Arc::clone(&polls));
    let control = StubServer::start(move |request| {
        if request.is("GET", INDEX_PATH) {
            if !created_flag.load(Ordering::SeqCst) {
                return not_found();
            }
            let polled = poll_count.fetch_add(1, Ordering::SeqCst) + 1;
            (200, description("unused", 384, polled >= 3))
        } else if request.is("POST", "/indexes") {
            created_flag.store(true, Ordering::SeqCst);
            (201, request.json())
        } else {
            not_found()
        }
    });
    let client = client(&control);

    assert_eq!(client.ensure_index(&spec(384)).unwrap(), IndexStatus::Created);
    assert_eq!(control.count("POST", "/indexes"), 1);
    assert_eq!(control.count("GET", INDEX_PATH), 4);
    assert_eq!(polls.load(Ordering::SeqCst), 3);

    let requests = control.requests();
    let create = requests
        .iter()
        .find(|request| request.is("POST", "/indexes"))
        .expect("create request");
    assert_eq!(
        create.json(),
        json!({
            "name": "cv-alumno",
            "dimension": 384,
            "metric": "cosine",
            "spec": {"serverless": {"cloud": "aws", "region": "us-east-1"}}
        })
    );
    assert_eq!(create.headers["api-key"], "pc-test");
    assert_eq!(create.headers["x-pinecone-api-version"], "2024-07");

    assert_eq!(client.ensure_index(&spec(384)).unwrap(), IndexStatus::Existing);
    assert_eq!(control.count("POST", "/indexes"), 1);
    assert!(created.load(Ordering::SeqCst));
}

#[test]
fn conflict_on_create_counts_as_created() {
    let posted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&posted);
    let control = StubServer::start(move |request| {
        if request.is("GET", INDEX_PATH) {
            if flag.load(Ordering::SeqCst) {
                (200, description("unused", 384, true))
            } else {
                not_found()
            }
        } else if request.is("POST", "/indexes") {
            flag.store(true, Ordering::SeqCst);
            (409, json!({"error": {"code": "ALREADY_EXISTS"}}))
        } else {
            not_found()
        }
    });

    assert_eq!(client(&control).ensure_index(&spec(384)).unwrap(), IndexStatus::Created);
    assert_eq!(control.count("POST", "/indexes"), 1);
}

#[test]
fn existing_index_with_other_dimension_is_rejected() {
    let control = StubServer::start(|request| {
        if request.is("GET", INDEX_PATH) {
            (200, description("unused", 768, true))
        } else {
            not_found()
        }
    });

    let err = client(&control).ensure_index(&spec(384)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
    assert_eq!(control.count("POST", "/indexes"), 0);
}

#[test]
fn existing_index_still_provisioning_is_awaited() {
    let polls = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&polls);
    let control = StubServer::start(move |request| {
        if request.is("GET", INDEX_PATH) {
            let polled = count.fetch_add(1, Ordering::SeqCst) + 1;
            (200, description("unused", 384, polled >= 3))
        } else {
            not_found()
        }
    });

    assert_eq!(client(&control).ensure_index(&spec(384)).unwrap(), IndexStatus::Existing);
    assert_eq!(control.count("GET", INDEX_PATH), 3);
    assert_eq!(control.count("POST", "/indexes"), 0);
}

#[test]
fn rejected_credentials_while_polling_fail_fast() {
    let posted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&posted);
    let control = StubServer::start(move |request| {
        if request.is("GET", INDEX_PATH) {
            if flag.load(Ordering::SeqCst) {
                (401, json!({"error": {"code": "UNAUTHENTICATED"}}))
            } else {
                not_found()
            }
        } else if request.is("POST", "/indexes") {
            flag.store(true, Ordering::SeqCst);
            (201, request.json())
        } else {
            not_found()
        }
    });

    let err = client(&control).ensure_index(&spec(384)).unwrap_err();
    assert!(matches!(err, Error::Provider(_)), "got {err:?}");
    assert_eq!(control.count("GET", INDEX_PATH), 2);
}

#[test]
fn opening_a_missing_index_is_a_configuration_error() {
    let control = StubServer::start(|_| not_found());
    let err = client(&control).index("cv-alumno").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
}

#[test]
fn upserts_are_split_into_batches() {
    let data = StubServer::start(|request| {
        if request.is("POST", "/vectors/upsert") {
            let sent = request.json()["vectors"].as_array().map_or(0, Vec::len);
            (200, json!({"upsertedCount": sent}))
        } else {
            not_found()
        }
    });
    let (_control, index) = open_index(&data);

    assert_eq!(index.upsert(&records(130)).unwrap(), 130);
    let sizes: Vec<usize> = data
        .requests()
        .iter()
        .map(|request| request.json()["vectors"].as_array().map_or(0, Vec::len))
        .collect();
    assert_eq!(sizes, [64, 64, 2]);
}

#[test]
fn mismatched_dimension_is_rejected_before_sending() {
    let data = StubServer::start(|_| (200, json!({"upsertedCount": 1})));
    let (_control, index) = open_index(&data);

    let bad = [VectorRecord::for_chunk("cv_chunk_000", vec![0.0; 384], "texto", "cv")];
    assert!(matches!(index.upsert(&bad), Err(Error::Configuration(_))));
    assert!(data.requests().is_empty());
}

#[test]
fn unavailable_upsert_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&calls);
    let data = StubServer::start(move |request| {
        if count.fetch_add(1, Ordering::SeqCst) == 0 {
            return (503, json!({"error": "busy"}));
        }
        let sent = request.json()["vectors"].as_array().map_or(0, Vec::len);
        (200, json!({"upsertedCount": sent}))
    });
    let (_control, index) = open_index(&data);

    assert_eq!(index.upsert(&records(2)).unwrap(), 2);
    assert_eq!(data.count("POST", "/vectors/upsert"), 2);
}

#[test]
fn unauthorized_query_is_not_retried() {
    let data = StubServer::start(|_| (401, json!({"error": "invalid api key"})));
    let (_control, index) = open_index(&data);

    let err = index.query(&[0.1, 0.2, 0.3], 5).unwrap_err();
    assert!(matches!(err, Error::Provider(_)), "got {err:?}");
    assert_eq!(data.count("POST", "/query"), 1);
}

#[test]
fn empty_matches_are_not_an_error() {
    let data = StubServer::start(|_| (200, json!({"matches": [], "namespace": ""})));
    let (_control, index) = open_index(&data);

    assert!(index.query(&[0.1, 0.2, 0.3], 5).unwrap().is_empty());
    let sent = data.requests()[0].json();
    assert_eq!(sent["topK"], 5);
    assert_eq!(sent["includeMetadata"], true);
}

#[test]
fn matches_come_back_best_first() {
    let data = StubServer::start(|_| {
        (
            200,
            json!({"matches": [
                {"id": "cv_chunk_002", "score": 0.31, "metadata": {"texto": "Go"}},
                {"id": "cv_chunk_000", "score": 0.92, "metadata": {"texto": "Python"}},
                {"id": "cv_chunk_001", "score": 0.57, "metadata": {"texto": "SQL"}}
            ]}),
        )
    });
    let (_control, index) = open_index(&data);

    let hits = index.query(&[0.1, 0.2, 0.3], 2).unwrap();
    let texts: Vec<&str> = hits.iter().map(|hit| hit.text()).collect();
    assert_eq!(texts, ["Python", "SQL"]);
}

#[test]
fn stats_read_the_vector_count() {
    let data = StubServer::start(|request| {
        if request.is("POST", "/describe_index_stats") {
            (200, json!({"dimension": 3, "totalVectorCount": 130, "namespaces": {}}))
        } else {
            not_found()
        }
    });
    let (_control, index) = open_index(&data);

    let stats = index.stats().unwrap();
    assert_eq!(stats.total_vector_count, 130);
    assert_eq!(stats.dimension, 3);
}
