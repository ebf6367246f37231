//! Scenario tests against a real tempfile-backed SQLite store, exercising
//! the transcription -> translation -> evaluation chain end to end.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use ohp_pipeline::workers::{EvaluationWorker, StageWorker, TranscriptionWorker, TranslationWorker};
use ohp_providers::adapters::scripted::{ScriptedEvaluationProvider, ScriptedTranscriptionProvider, ScriptedTranslationProvider};
use ohp_providers::{EvaluationReport, ProviderRouting, ProviderSegment, RetryPolicy};
use ohp_segments::NonVerbalLexicon;
use ohp_store::{File, MediaKind, Stage, StageStatusValue, Store};

async fn new_store() -> Arc<dyn Store> {
    Arc::new(ohp_store::SqliteStore::connect_in_memory().await.unwrap())
}

fn register(store: &Arc<dyn Store>, id: Uuid) -> File {
    File {
        id,
        source_path: format!("/media/{id}.wav"),
        kind: MediaKind::Audio,
        byte_size: 4096,
        duration_ms: Some(7000),
        source_language: Some("de".to_string()),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn monolingual_happy_path_completes_all_three_stages() {
    let store = new_store().await;
    let id = Uuid::new_v4();
    store.register_file(register(&store, id)).await.unwrap();

    let output_root = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();

    let transcription_segments = vec![
        ProviderSegment { ordinal: 0, start_ms: 0, end_ms: 2000, text: "Guten Tag".into(), language: None },
        ProviderSegment { ordinal: 1, start_ms: 2000, end_ms: 5000, text: "Ich heisse Hans und ich wohne hier".into(), language: None },
        ProviderSegment { ordinal: 2, start_ms: 5000, end_ms: 7000, text: "[pause]".into(), language: None },
    ];
    let transcriber = Arc::new(ScriptedTranscriptionProvider::new("primary", vec![Ok(transcription_segments)]));

    let transcription_worker = TranscriptionWorker {
        store: store.clone(),
        provider: transcriber,
        output_root: output_root.path().to_path_buf(),
        lexicon: NonVerbalLexicon::default(),
    };

    store.claim(Stage::Transcription, "test-worker", chrono::Duration::hours(1)).await.unwrap();
    transcription_worker.run(id, &cancel).await.unwrap();
    assert_eq!(store.get_status(id, Stage::Transcription).await.unwrap().status, StageStatusValue::Completed);

    let primary = Arc::new(ScriptedTranslationProvider::passthrough("generic"));
    let fallback = Arc::new(ScriptedTranslationProvider::passthrough("llm"));
    let routing = Arc::new(ProviderRouting::new(RetryPolicy::default()).with_route("en", primary, fallback));

    let translation_worker = TranslationWorker {
        store: store.clone(),
        output_root: output_root.path().to_path_buf(),
        stage: Stage::TranslationEn,
        routing,
        batch_max_segments: 10,
    };

    store.claim(Stage::TranslationEn, "test-worker", chrono::Duration::minutes(30)).await.unwrap();
    translation_worker.run(id, &cancel).await.unwrap();
    assert_eq!(store.get_status(id, Stage::TranslationEn).await.unwrap().status, StageStatusValue::Completed);

    let report = EvaluationReport {
        composite_score: 8.5,
        content_accuracy: 9.0,
        speech_fidelity: 8.0,
        cultural_context: 8.5,
        reliability: 8.5,
        issues: vec![],
    };
    let evaluator = Arc::new(ScriptedEvaluationProvider::new("llm-judge", vec![report]));
    let evaluation_worker = EvaluationWorker {
        store: store.clone(),
        output_root: output_root.path().to_path_buf(),
        stage: Stage::EvaluationEn,
        provider: evaluator,
        qa_threshold: 7.0,
    };

    store.claim(Stage::EvaluationEn, "test-worker", chrono::Duration::minutes(30)).await.unwrap();
    evaluation_worker.run(id, &cancel).await.unwrap();
    assert_eq!(store.get_status(id, Stage::EvaluationEn).await.unwrap().status, StageStatusValue::QaCompleted);

    let srt = tokio::fs::read_to_string(output_root.path().join(id.to_string()).join(format!("{id}.en.srt")))
        .await
        .unwrap();
    assert!(srt.contains("Guten Tag"));
}

#[tokio::test]
async fn evaluation_below_threshold_yields_qa_failed() {
    let store = new_store().await;
    let id = Uuid::new_v4();
    store.register_file(register(&store, id)).await.unwrap();

    store
        .put_segments(
            id,
            vec![ohp_store::Segment {
                file_id: id,
                ordinal: 0,
                start_ms: 0,
                end_ms: 1000,
                source_text: "shalom".into(),
                source_language: Some("he".into()),
                non_verbal: false,
                overlapping: false,
                translations: BTreeMap::new(),
            }],
        )
        .await
        .unwrap();

    let output_root = tempfile::tempdir().unwrap();
    let report = EvaluationReport {
        composite_score: 6.2,
        content_accuracy: 6.0,
        speech_fidelity: 6.5,
        cultural_context: 6.0,
        reliability: 6.5,
        issues: vec![],
    };
    let evaluator = Arc::new(ScriptedEvaluationProvider::new("llm-judge", vec![report]));
    let worker = EvaluationWorker {
        store: store.clone(),
        output_root: output_root.path().to_path_buf(),
        stage: Stage::EvaluationHe,
        provider: evaluator,
        qa_threshold: 7.0,
    };

    store.claim(Stage::EvaluationHe, "test-worker", chrono::Duration::minutes(30)).await.unwrap();
    worker.run(id, &CancellationToken::new()).await.unwrap();

    assert_eq!(store.get_status(id, Stage::EvaluationHe).await.unwrap().status, StageStatusValue::QaFailed);
}

#[tokio::test]
async fn resumed_translation_only_invokes_provider_for_missing_segments() {
    let store = new_store().await;
    let id = Uuid::new_v4();
    store.register_file(register(&store, id)).await.unwrap();

    let segments: Vec<_> = (0..10)
        .map(|i| ohp_store::Segment {
            file_id: id,
            ordinal: i,
            start_ms: i as u64 * 1000,
            end_ms: (i as u64 + 1) * 1000,
            source_text: format!("Satz {i}"),
            source_language: Some("de".into()),
            non_verbal: false,
            overlapping: false,
            translations: BTreeMap::new(),
        })
        .collect();
    store.put_segments(id, segments).await.unwrap();

    // Simulate a crash after segments 0..5 were already translated.
    for i in 0..5u32 {
        store.put_segment_translation(id, i, "en", &format!("Sentence {i}")).await.unwrap();
    }

    let primary = Arc::new(ScriptedTranslationProvider::passthrough("generic"));
    let fallback = Arc::new(ScriptedTranslationProvider::passthrough("llm"));
    let routing = Arc::new(ProviderRouting::new(RetryPolicy::default()).with_route("en", primary.clone(), fallback));

    let worker = TranslationWorker {
        store: store.clone(),
        output_root: tempfile::tempdir().unwrap().path().to_path_buf(),
        stage: Stage::TranslationEn,
        routing,
        batch_max_segments: 10,
    };

    store.claim(Stage::TranslationEn, "test-worker", chrono::Duration::minutes(30)).await.unwrap();
    worker.run(id, &CancellationToken::new()).await.unwrap();

    assert_eq!(primary.call_count(), 1, "provider should only be invoked once for the missing suffix");

    let segments = store.list_segments(id).await.unwrap();
    for s in &segments {
        assert!(s.translations.contains_key("en"));
    }
    assert_eq!(segments[0].translations["en"], "Sentence 0");
    assert_eq!(segments[9].translations["en"], "Satz 9");
}

#[tokio::test]
async fn translation_run_records_failure_without_losing_prior_progress() {
    let store = new_store().await;
    let id = Uuid::new_v4();
    store.register_file(register(&store, id)).await.unwrap();

    store
        .put_segments(
            id,
            vec![
                ohp_store::Segment {
                    file_id: id,
                    ordinal: 0,
                    start_ms: 0,
                    end_ms: 1000,
                    source_text: "eins".into(),
                    source_language: Some("de".into()),
                    non_verbal: false,
                    overlapping: false,
                    translations: BTreeMap::from([("en".to_string(), "one".to_string())]),
                },
                ohp_store::Segment {
                    file_id: id,
                    ordinal: 1,
                    start_ms: 1000,
                    end_ms: 2000,
                    source_text: "zwei".into(),
                    source_language: Some("de".into()),
                    non_verbal: false,
                    overlapping: false,
                    translations: BTreeMap::new(),
                },
            ],
        )
        .await
        .unwrap();

    let primary = Arc::new(ScriptedTranslationProvider::new(
        "primary",
        vec![Err(ohp_providers::ProviderError::Auth("bad key".into()))],
    ));
    let fallback = Arc::new(ScriptedTranslationProvider::new(
        "fallback",
        vec![Err(ohp_providers::ProviderError::Auth("bad key".into()))],
    ));
    let routing = Arc::new(ProviderRouting::new(RetryPolicy::default()).with_route("en", primary, fallback));

    let worker = TranslationWorker {
        store: store.clone(),
        output_root: tempfile::tempdir().unwrap().path().to_path_buf(),
        stage: Stage::TranslationEn,
        routing,
        batch_max_segments: 10,
    };

    store.claim(Stage::TranslationEn, "test-worker", chrono::Duration::minutes(30)).await.unwrap();
    worker.run(id, &CancellationToken::new()).await.unwrap();

    assert_eq!(store.get_status(id, Stage::TranslationEn).await.unwrap().status, StageStatusValue::Failed);

    let segments = store.list_segments(id).await.unwrap();
    assert_eq!(segments[0].translations["en"], "one", "prior progress must survive a later failure");
}
