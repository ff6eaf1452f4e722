mod helpers;

use serde_json::{json, Value};

use crew_memory::tools::{Operation, ToolSpec};
use helpers::{numbered_words, test_service};

fn parse(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn message_tools_return_documented_shapes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (service, _) = test_service(tmp.path());
    let store = ToolSpec::new(Operation::StoreMessage);
    let fetch = ToolSpec::new(Operation::FetchMessages);

    let out = store
        .invoke(&service, json!({"session": "s1", "agent": "dev", "content": "hi"}))
        .unwrap();
    assert_eq!(out, "stored");

    let records = parse(fetch.invoke(&service, json!({"session": "s1"})).unwrap());
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["agent"], "dev");
    assert_eq!(records[0]["role"], "note");
    assert_eq!(records[0]["content"], "hi");
    assert!(records[0]["ts"].is_f64());
}

#[test]
fn unknown_role_is_configuration_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (service, _) = test_service(tmp.path());
    let err = ToolSpec::new(Operation::StoreMessage)
        .invoke(
            &service,
            json!({"session": "s1", "agent": "dev", "role": "robot", "content": "hi"}),
        )
        .unwrap_err();
    assert_eq!(err.kind(), "configuration");
}

#[test]
fn missing_required_argument_is_configuration_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (service, _) = test_service(tmp.path());
    for tool in ToolSpec::toolset(None) {
        let err = tool.invoke(&service, Value::Null).unwrap_err();
        assert_eq!(err.kind(), "configuration", "{}", tool.name());
    }
}

#[test]
fn default_scope_binds_notes_to_an_agent() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (service, _) = test_service(tmp.path());
    let remember = ToolSpec::scoped(Operation::Remember, "qa_engineer");
    let recall = ToolSpec::scoped(Operation::Recall, "qa_engineer");

    let out = remember
        .invoke(&service, json!({"text": "flaky test in checkout suite", "tags": ["ci"]}))
        .unwrap();
    assert_eq!(out, "saved");

    let hits = parse(recall.invoke(&service, json!({"query": "flaky checkout"})).unwrap());
    assert_eq!(hits[0]["agent"], "qa_engineer");
    assert_eq!(hits[0]["tags"], json!(["ci"]));
    assert!(hits[0]["score"].is_number());

    // an explicit agent overrides the default
    let other = parse(
        recall
            .invoke(&service, json!({"agent": "manager", "query": "flaky checkout"}))
            .unwrap(),
    );
    assert!(other.as_array().unwrap().is_empty());
}

#[test]
fn scoped_rag_tools_fill_agent_scope() {
    let tmp = tempfile::TempDir::new().unwrap();
    let docs = tempfile::TempDir::new().unwrap();
    std::fs::write(docs.path().join("plan.txt"), numbered_words(1000)).unwrap();
    let (service, _) = test_service(tmp.path());

    let ingest = ToolSpec::scoped(Operation::Ingest, "manager");
    let report = parse(
        ingest
            .invoke(
                &service,
                json!({"directory": docs.path().to_str().unwrap(), "namespace": "ns1"}),
            )
            .unwrap(),
    );
    assert_eq!(report["files"], 1);
    assert_eq!(report["chunks_added"], 4);
    assert_eq!(report["outcomes"][0]["status"], "ingested");

    let query = ToolSpec::scoped(Operation::Query, "manager");
    let hits = parse(query.invoke(&service, json!({"query": "w1 w2", "top_k": 2})).unwrap());
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    for hit in hits {
        assert_eq!(hit["agent_scope"], "manager");
        assert_eq!(hit["namespace"], "ns1");
        assert!(hit["path"].as_str().unwrap().ends_with("plan.txt"));
    }

    let elsewhere = ToolSpec::scoped(Operation::Query, "qa_engineer");
    let none = parse(elsewhere.invoke(&service, json!({"query": "w1 w2"})).unwrap());
    assert!(none.as_array().unwrap().is_empty());
}

#[test]
fn unscoped_query_searches_every_scope() {
    let tmp = tempfile::TempDir::new().unwrap();
    let docs = tempfile::TempDir::new().unwrap();
    std::fs::write(docs.path().join("a.txt"), "alpha beta gamma").unwrap();
    let (service, _) = test_service(tmp.path());

    for scope in ["dev", "qa"] {
        ToolSpec::scoped(Operation::Ingest, scope)
            .invoke(&service, json!({"directory": docs.path().to_str().unwrap()}))
            .unwrap();
    }
    let hits = parse(
        ToolSpec::new(Operation::Query)
            .invoke(&service, json!({"query": "alpha"}))
            .unwrap(),
    );
    assert_eq!(hits.as_array().unwrap().len(), 2);
}
