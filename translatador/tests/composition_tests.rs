mod common;

use common::{load_model, StubEngine, FAILING_TAG};
use std::collections::HashMap;
use translatador::{compose, Batch, FanOutPolicy, Model, PivotedModel, Stage, Translator, TrlError};

#[test]
fn test_composed_equals_sequential() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");

    let sequential = en_fr.translate(&de_en.translate("hallo").unwrap()).unwrap();
    let composed = compose(&de_en, &en_fr).translate("hallo").unwrap();

    assert_eq!(composed, sequential);
    assert_eq!(composed, "en-fr(de-en(hallo))");
}

#[test]
fn test_intermediate_batch_is_released() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");
    let pipeline = de_en.then(&en_fr);

    let result = pipeline.translate_batch(&Batch::plain(["a", "b"])).unwrap();
    assert_eq!(engine.live_batches(), 1);
    assert_eq!(result.len().unwrap(), 2);

    drop(result);
    assert_eq!(engine.live_batches(), 0);
}

#[test]
fn test_composition_does_not_own_models() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");

    {
        let pipeline = compose(&de_en, &en_fr);
        pipeline.translate("x").unwrap();
    }

    assert!(!de_en.is_closed());
    assert!(!en_fr.is_closed());
    assert_eq!(engine.live_models(), 2);
}

#[test]
fn test_closed_component_fails_composition() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");
    let pipeline = compose(&de_en, &en_fr);

    en_fr.close();
    assert!(pipeline.translate("x").unwrap_err().is_closed());
    // The pivot produced by the first stage is still released
    assert_eq!(engine.live_batches(), 0);
}

#[test]
fn test_forked_composition_owns_forks() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");

    let forked = compose(&de_en, &en_fr).fork().unwrap();
    assert_eq!(engine.live_models(), 4);

    de_en.close();
    en_fr.close();
    assert_eq!(forked.translate("x").unwrap(), "en-fr(de-en(x))");

    drop(forked);
    assert_eq!(engine.live_models(), 0);
}

fn pivot_models(engine: &std::sync::Arc<StubEngine>) -> (HashMap<&'static str, Model>, HashMap<&'static str, Model>) {
    let encoders = [("de", load_model(engine, "de-en")), ("es", load_model(engine, "es-en"))]
        .into_iter()
        .collect();
    let decoders = [
        ("fr", load_model(engine, "en-fr")),
        ("it", load_model(engine, "en-it")),
        ("pl", load_model(engine, "en-pl")),
    ]
    .into_iter()
    .collect();
    (encoders, decoders)
}

#[test]
fn test_pivot_translates_into_every_target() {
    let engine = StubEngine::new();
    let (encoders, decoders) = pivot_models(&engine);
    let pivoted = PivotedModel::new(
        encoders.iter().map(|(k, m)| (*k, m)).collect(),
        decoders.iter().map(|(k, m)| (*k, m)).collect(),
    );

    let results = pivoted.translate(&"de", "hallo").unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results["fr"], "en-fr(de-en(hallo))");
    assert_eq!(results["it"], "en-it(de-en(hallo))");
    assert_eq!(results["pl"], "en-pl(de-en(hallo))");

    // One encode, three decodes, nothing left behind
    assert_eq!(engine.translate_calls(), 4);
    assert_eq!(engine.live_batches(), 0);
    assert_eq!(engine.live_models(), 5);
}

#[test]
fn test_pivot_unknown_source_is_empty() {
    let engine = StubEngine::new();
    let (encoders, decoders) = pivot_models(&engine);
    let pivoted = PivotedModel::new(
        encoders.iter().map(|(k, m)| (*k, m)).collect(),
        decoders.iter().map(|(k, m)| (*k, m)).collect(),
    );

    assert!(pivoted.translate(&"ja", "konnichiwa").unwrap().is_empty());
    assert!(pivoted.translate_batch(&"ja", &Batch::plain(["x"])).unwrap().is_empty());
    assert_eq!(engine.translate_calls(), 0);
}

#[test]
fn test_pivot_batches_stay_native() {
    let engine = StubEngine::new();
    let (encoders, decoders) = pivot_models(&engine);
    let pivoted = PivotedModel::new(encoders, decoders);

    let results = pivoted.translate_batch(&"es", &Batch::plain(["hola", "adios"])).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.values().all(Batch::is_native));
    // Only the per-target results remain; the pivot batch is gone
    assert_eq!(engine.live_batches(), 3);
    assert_eq!(
        &*results["it"].get().unwrap(),
        &["en-it(es-en(hola))".to_string(), "en-it(es-en(adios))".to_string()]
    );

    drop(results);
    assert_eq!(engine.live_batches(), 0);
}

fn with_failing_decoder(engine: &std::sync::Arc<StubEngine>) -> (HashMap<&'static str, Model>, HashMap<&'static str, Model>) {
    let encoders = [("de", load_model(engine, "de-en"))].into_iter().collect();
    let decoders = [
        ("fr", load_model(engine, "en-fr")),
        ("xx", load_model(engine, FAILING_TAG)),
    ]
    .into_iter()
    .collect();
    (encoders, decoders)
}

#[test]
fn test_fail_fast_propagates_decoder_error() {
    let engine = StubEngine::new();
    let (encoders, decoders) = with_failing_decoder(&engine);
    let pivoted = PivotedModel::new(encoders, decoders);
    assert_eq!(pivoted.fan_out(), FanOutPolicy::FailFast);

    let err = pivoted.translate(&"de", "hallo").unwrap_err();
    assert!(matches!(err, TrlError::TranslationError(_)));
    assert_eq!(engine.live_batches(), 0);
}

#[test]
fn test_best_effort_skips_failed_targets() {
    let engine = StubEngine::new();
    let (encoders, decoders) = with_failing_decoder(&engine);
    let pivoted = PivotedModel::new(encoders, decoders).with_fan_out(FanOutPolicy::BestEffort);

    let results = pivoted.translate(&"de", "hallo").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results["fr"], "en-fr(de-en(hallo))");
    assert_eq!(engine.live_batches(), 0);
}

#[test]
fn test_best_effort_still_reports_closed_models() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");
    let pivoted = PivotedModel::new(
        [("de", &de_en)].into_iter().collect(),
        [("fr", &en_fr)].into_iter().collect(),
    )
    .with_fan_out(FanOutPolicy::BestEffort);

    en_fr.close();
    assert!(pivoted.translate(&"de", "hallo").unwrap_err().is_closed());
    assert_eq!(engine.live_batches(), 0);
}

#[test]
fn test_pivot_fork_is_independent() {
    let engine = StubEngine::new();
    let (encoders, decoders) = pivot_models(&engine);
    let forked = {
        let borrowed = PivotedModel::new(
            encoders.iter().map(|(k, m)| (*k, m)).collect(),
            decoders.iter().map(|(k, m)| (*k, m)).collect(),
        );
        borrowed.fork().unwrap()
    };
    assert_eq!(engine.live_models(), 10);

    drop(encoders);
    drop(decoders);
    assert_eq!(engine.live_models(), 5);

    let mut sources: Vec<_> = forked.sources().copied().collect();
    sources.sort_unstable();
    assert_eq!(sources, vec!["de", "es"]);
    assert_eq!(forked.targets().count(), 3);
    assert_eq!(forked.translate(&"es", "hola").unwrap()["fr"], "en-fr(es-en(hola))");
}

#[test]
fn test_pivot_language_as_source_and_target() {
    let engine = StubEngine::new();
    let de_en = load_model(&engine, "de-en");
    let en_fr = load_model(&engine, "en-fr");
    let pivoted: PivotedModel<&str, &str, Stage<&Model>> = PivotedModel::new(
        [("de", Stage::from(&de_en)), ("en", Stage::Identity)].into_iter().collect(),
        [("fr", Stage::from(&en_fr)), ("en", Stage::Identity)].into_iter().collect(),
    );

    let from_pivot = pivoted.translate(&"en", "hello").unwrap();
    assert_eq!(from_pivot.len(), 2);
    assert_eq!(from_pivot["en"], "hello");
    assert_eq!(from_pivot["fr"], "en-fr(hello)");

    let from_german = pivoted.translate(&"de", "hallo").unwrap();
    assert_eq!(from_german["en"], "de-en(hallo)");
    assert_eq!(from_german["fr"], "en-fr(de-en(hallo))");

    // Only the real models were called, and nothing is left behind
    assert_eq!(engine.translate_calls(), 3);
    assert_eq!(engine.live_batches(), 0);

    let forked = pivoted.fork().unwrap();
    assert_eq!(engine.live_models(), 4);
    assert_eq!(forked.translate(&"en", "bye").unwrap()["en"], "bye");
}
