//! End-to-end behaviour of the escalation chain, from invocation payload to
//! response envelope.

use misaki_foundation::escalation::EscalationOrchestrator;
use misaki_foundation::llm::types::{Tier, TierError};
use misaki_foundation::statics::StaticResponder;
use misaki_local_llm::{LocalLlmConfig, LocalProvider, ModelCache};
use misaki_runtime::Handler;
use misaki_testing::{CountingLoader, ScriptedProvider};
use serde_json::{Value, json};
use std::sync::Arc;

fn body_of(envelope: &Value) -> Value {
    serde_json::from_str(envelope["body"].as_str().expect("body is a string"))
        .expect("body is JSON")
}

#[tokio::test]
async fn test_static_rule_short_circuits_adapters() {
    let local = Arc::new(ScriptedProvider::succeeding(Tier::Local, "ローカルの答え"));
    let external = Arc::new(ScriptedProvider::succeeding(Tier::External, "外部の答え"));
    let orchestrator = EscalationOrchestrator::builder()
        .local(local.clone())
        .external(external.clone())
        .build();

    for _ in 0..3 {
        let response = orchestrator.respond("こんばんは").await.unwrap();
        assert_eq!(response.tier, Tier::Static);
        assert_eq!(response.text, "こんばんは！");
        assert!(!response.escalated);
    }

    assert_eq!(local.call_count(), 0);
    assert_eq!(external.call_count(), 0);
}

#[tokio::test]
async fn test_local_success_never_escalates() {
    let local = Arc::new(ScriptedProvider::succeeding(Tier::Local, "晴れそうですよ。"));
    let external = Arc::new(ScriptedProvider::succeeding(Tier::External, "外部の答え"));
    let orchestrator = EscalationOrchestrator::builder()
        .local(local.clone())
        .external(external.clone())
        .build();

    let response = orchestrator.respond("明日の天気を教えて").await.unwrap();
    assert_eq!(response.tier, Tier::Local);
    assert!(!response.escalated);
    assert_eq!(local.call_count(), 1);
    assert_eq!(external.call_count(), 0);
    assert_eq!(local.prompts(), vec!["明日の天気を教えて".to_string()]);
}

#[tokio::test]
async fn test_local_failure_escalates_to_external() {
    let local = Arc::new(ScriptedProvider::failing(
        Tier::Local,
        TierError::InferenceError("engine crashed".into()),
    ));
    let external = Arc::new(ScriptedProvider::succeeding(Tier::External, "外部の答え"));
    let orchestrator = EscalationOrchestrator::builder()
        .local(local)
        .external(external.clone())
        .build();

    let response = orchestrator.respond("明日の天気を教えて").await.unwrap();
    assert_eq!(response.tier, Tier::External);
    assert!(response.escalated);
    assert_eq!(external.call_count(), 1);
}

#[tokio::test]
async fn test_total_failure_with_fallback_is_static() {
    let local = Arc::new(ScriptedProvider::failing(
        Tier::Local,
        TierError::ModelLoadError("model missing".into()),
    ));
    let external = Arc::new(ScriptedProvider::failing(
        Tier::External,
        TierError::Timeout("10s".into()),
    ));
    let orchestrator = EscalationOrchestrator::builder()
        .local(local)
        .external(external)
        .allow_static_fallback(true)
        .build();

    let response = orchestrator.respond("明日の天気を教えて").await.unwrap();
    assert_eq!(response.tier, Tier::Static);
    assert_eq!(
        response.text,
        StaticResponder::standard().fallback_reply()
    );
}

#[tokio::test]
async fn test_total_failure_without_fallback_reports_tiers() {
    let local = Arc::new(ScriptedProvider::failing(
        Tier::Local,
        TierError::InferenceError("engine crashed".into()),
    ));
    let external = Arc::new(ScriptedProvider::failing(
        Tier::External,
        TierError::AuthError("bad key".into()),
    ));
    let orchestrator = EscalationOrchestrator::builder()
        .local(local)
        .external(external)
        .build();

    let err = orchestrator.respond("明日の天気を教えて").await.unwrap_err();
    assert_eq!(err.tiers_attempted(), vec![Tier::Local, Tier::External]);
    assert!(err.to_string().contains("engine crashed"));
    assert!(err.to_string().contains("bad key"));
}

#[tokio::test]
async fn test_model_cache_amortizes_loads_across_requests() {
    let loader = CountingLoader::new("ローカルの答え");
    let cache = Arc::new(ModelCache::with_loader(loader.clone()));

    let config = LocalLlmConfig::new("/models/misaki-7b.gguf");
    let provider = Arc::new(LocalProvider::new(config, cache.clone()).unwrap());
    let orchestrator = EscalationOrchestrator::builder()
        .local(provider)
        .external(Arc::new(ScriptedProvider::succeeding(
            Tier::External,
            "unused",
        )))
        .build();

    orchestrator.respond("明日の天気を教えて").await.unwrap();
    orchestrator.respond("おすすめのお酒は？").await.unwrap();
    assert_eq!(loader.loads(), 1);

    // A model-path change forces exactly one reload on next use.
    let changed = LocalLlmConfig::new("/models/misaki-13b.gguf");
    let provider = Arc::new(LocalProvider::new(changed, cache).unwrap());
    let orchestrator = EscalationOrchestrator::builder().local(provider).build();

    orchestrator.respond("乾杯の音頭をお願い").await.unwrap();
    assert_eq!(loader.loads(), 2);
}

#[tokio::test]
async fn test_greeting_scenario_wire_contract() {
    let handler = Handler::with_orchestrator(
        EscalationOrchestrator::builder()
            .external(Arc::new(ScriptedProvider::succeeding(
                Tier::External,
                "unused",
            )))
            .build(),
    );

    let envelope = handler.handle(&json!({"input": "こんばんは"})).await;
    assert_eq!(envelope["statusCode"], 200);
    assert_eq!(
        body_of(&envelope),
        json!({"output": "こんばんは！", "tier": "static", "escalated": false})
    );
}

#[tokio::test]
async fn test_weather_scenario_escalates_to_external() {
    let local = Arc::new(ScriptedProvider::failing(
        Tier::Local,
        TierError::InferenceError("engine crashed".into()),
    ));
    let external = Arc::new(ScriptedProvider::succeeding(
        Tier::External,
        "申し訳ありませんが…",
    ));
    let handler = Handler::with_orchestrator(
        EscalationOrchestrator::builder()
            .local(local)
            .external(external)
            .build(),
    );

    let envelope = handler.handle(&json!({"input": "明日の天気を教えて"})).await;
    assert_eq!(envelope["statusCode"], 200);
    assert_eq!(
        body_of(&envelope),
        json!({"output": "申し訳ありませんが…", "tier": "external", "escalated": true})
    );
}

#[tokio::test]
async fn test_exhaustion_envelope_lists_attempts() {
    let handler = Handler::with_orchestrator(
        EscalationOrchestrator::builder()
            .local(Arc::new(ScriptedProvider::failing(
                Tier::Local,
                TierError::Timeout("30s".into()),
            )))
            .external(Arc::new(ScriptedProvider::failing(
                Tier::External,
                TierError::RateLimited("429".into()),
            )))
            .build(),
    );

    let envelope = handler.handle(&json!({"input": "明日の天気を教えて"})).await;
    assert_eq!(envelope["statusCode"], 502);

    let body = body_of(&envelope);
    assert_eq!(body["tiersAttempted"], json!(["local", "external"]));
    assert!(body["error"].as_str().unwrap().contains("Rate limited"));
}

#[tokio::test]
async fn test_scripted_recovery_sequence() {
    // First call fails, second succeeds: each request escalates on its own,
    // nothing is remembered across requests.
    let external = Arc::new(
        ScriptedProvider::succeeding(Tier::External, "回復しました")
            .then(Err(TierError::RateLimited("429".into()))),
    );
    let orchestrator = EscalationOrchestrator::builder()
        .external(external)
        .allow_static_fallback(true)
        .build();

    let degraded = orchestrator.respond("お話しましょう").await.unwrap();
    assert_eq!(degraded.tier, Tier::Static);

    let recovered = orchestrator.respond("お話しましょう").await.unwrap();
    assert_eq!(recovered.tier, Tier::External);
    assert_eq!(recovered.text, "回復しました");
}
