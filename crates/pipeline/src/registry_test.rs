//! Tests for the component registry

use std::path::PathBuf;

use super::*;
use crate::error::ExtensionError;
use crate::test_stages::{self, new_collector, new_relay, new_ticker};

#[test]
fn test_new_has_record_channel() {
    let registry = ComponentRegistry::new();
    assert!(registry.has_channel(RECORD_CHANNEL));
    assert_eq!(registry.len(), 1);

    let factory = registry.resolve_channel(RECORD_CHANNEL, None).unwrap();
    let channel = factory(16);
    assert_eq!(channel.type_name(), RECORD_CHANNEL);
    assert_eq!(channel.capacity(), 16);
}

#[test]
fn test_register_by_shape() {
    let registry = test_stages::registry();
    assert!(registry.has_processor("Collector"));
    assert!(registry.has_processor("Ticker"));
    assert!(registry.has_handler("Relay"));
    assert!(!registry.has_processor("Relay"));
}

#[test]
#[should_panic(expected = "already registered")]
fn test_register_duplicate_panics() {
    let mut registry = ComponentRegistry::new();
    registry.register("Collector", Constructor::Processor(new_collector));
    registry.register("Collector", Constructor::Processor(new_collector));
}

#[test]
fn test_try_register_duplicate() {
    let mut registry = ComponentRegistry::new();
    assert!(registry.try_register("Collector", Constructor::Processor(new_collector)));
    assert!(!registry.try_register("Collector", Constructor::Processor(new_collector)));

    // handlers live in their own namespace
    assert!(registry.try_register("Collector", Constructor::Handler(new_relay)));
}

#[test]
fn test_resolve_processor_shapes() {
    let registry = test_stages::registry();

    assert!(matches!(
        registry.resolve_processor("Collector", None, false),
        Ok(StageFactory::Plain(_))
    ));
    assert!(matches!(
        registry.resolve_processor("Ticker", None, true),
        Ok(StageFactory::WithHandler(_))
    ));
}

#[test]
fn test_handler_flag_mismatch() {
    let registry = test_stages::registry();

    let err = registry.resolve_processor("Collector", None, true).unwrap_err();
    match err {
        PipelineError::ConstructorMismatch {
            name,
            expected,
            found,
        } => {
            assert_eq!(name, "Collector");
            assert_eq!(expected, "handler-consuming processor");
            assert_eq!(found, "processor");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = registry.resolve_processor("Ticker", None, false).unwrap_err();
    assert!(matches!(err, PipelineError::ConstructorMismatch { .. }));
}

#[test]
fn test_unknown_lists_available_sorted() {
    let registry = test_stages::registry();
    let err = registry.resolve_processor("Bogus", None, false).unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("unknown processor 'Bogus'"), "{msg}");
    assert!(
        msg.contains("[BadInit, Collector, Emitter, Failing, Ticker]"),
        "{msg}"
    );

    let err = registry.resolve_handler("Bogus", None).unwrap_err();
    assert!(err.to_string().contains("[Relay]"));

    let err = registry.resolve_channel("RawChan", None).unwrap_err();
    assert!(err.to_string().contains("[RecordChan]"));
}

#[test]
fn test_builtin_wins_over_module() {
    let registry = test_stages::registry();
    // the module is never opened when the name is built in
    let module = PathBuf::from("/nonexistent/libext.so");
    assert!(registry
        .resolve_processor("Collector", Some(&module), false)
        .is_ok());
    assert_eq!(registry.loaded_modules(), 0);
}

#[test]
fn test_module_fallback_errors() {
    let registry = test_stages::registry();
    let module = PathBuf::from("/nonexistent/libext.so");

    let err = registry
        .resolve_processor("Dedup", Some(&module), false)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extension(ExtensionError::Load { .. })
    ));

    let err = registry.resolve_handler("Dedup", Some(&module)).unwrap_err();
    assert!(matches!(err, PipelineError::Extension(_)));
}

#[test]
fn test_extension_symbol() {
    assert_eq!(extension_symbol("Dedup"), "NewDedup");
    assert_eq!(extension_symbol("RawChan"), "NewRawChan");
}

#[test]
fn test_handler_processor_constructor_runs() {
    let registry = test_stages::registry();
    let handler = registry.resolve_handler("Relay", None).unwrap()();
    assert_eq!(handler.name(), "Relay");

    let processor = new_ticker(handler);
    assert_eq!(processor.name(), "Ticker");
}
