use serial_test::serial;
use trcstream_recorder::dispatch;
use trcstream_recorder::prelude::*;
use trcstream_recorder::test_utils::InMemoryRecorderGuard;

#[test]
#[serial]
fn test_no_recorder_installed() {
    assert!(dispatch::get_recorder().is_none());
    assert_eq!(
        trace_printf!("nobody listens %d", 1_i32).unwrap(),
        EncodeOutcome::Disabled
    );
    assert!(!dispatch::is_enabled());
    assert!(matches!(
        dispatch::register_channel("io"),
        Err(Error::NotInitialized)
    ));
}

#[test]
#[serial]
fn test_trace_printf() {
    let guard = InMemoryRecorderGuard::new();
    let name = String::from("pump");
    trace_printf!("%s pressure %u kPa", &name, 101_u32).unwrap();
    trace_printf!("no arguments").unwrap();
    trace_printf!("trailing comma %c", 'z',).unwrap();

    let records = guard.sink.lock().unwrap().records().unwrap();
    assert_eq!(records.len(), 3);
    let texts: Vec<String> = records
        .iter()
        .map(|record| record.render(guard.symbols.as_ref()).text)
        .collect();
    assert_eq!(
        texts,
        vec!["pump pressure 101 kPa", "no arguments", "trailing comma z"]
    );
    // only the channel stays registered
    assert_eq!(guard.symbols.live_count(), 1);
}

#[test]
#[serial]
fn test_channel_form() {
    let guard = InMemoryRecorderGuard::new();
    let channel = dispatch::register_channel("sensors").unwrap();
    trace_printf!(channel: channel, "temperature %d", -5_i32).unwrap();
    let records = guard.sink.lock().unwrap().records().unwrap();
    assert_eq!(records[0].header.channel, channel.handle());
    assert_eq!(records[0].slots, vec![(-5_i32) as u32]);
}

#[test]
#[serial]
fn test_enable_disable() {
    let guard = InMemoryRecorderGuard::new();
    assert!(dispatch::is_enabled());
    dispatch::disable();
    assert_eq!(trace_printf!("muted").unwrap(), EncodeOutcome::Disabled);
    dispatch::enable();
    trace_printf!("audible").unwrap();
    let records = guard.sink.lock().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].format_str(), "audible");
}

#[test]
#[serial]
fn test_double_init() {
    let _guard = InMemoryRecorderGuard::new();
    let second = RecorderBuilder::new()
        .with_sink(NullStreamSink::default())
        .build()
        .unwrap();
    assert_eq!(
        dispatch::init_recorder(second).unwrap_err(),
        Error::AlreadyInitialized
    );
}

#[test]
#[serial]
fn test_shutdown_hands_back_recorder() {
    let recorder = RecorderBuilder::new()
        .with_sink(BoundedBufferSink::new(1024))
        .build()
        .unwrap();
    dispatch::init_recorder(recorder).unwrap();
    trace_printf!("kept %u", 1_u32).unwrap();
    let recorder = dispatch::shutdown_recorder().unwrap();
    assert!(dispatch::get_recorder().is_none());
    let mut out = Vec::new();
    assert_eq!(recorder.transfer(&mut out).unwrap(), 16 + 4 + 7);
    assert_eq!(dispatch::with_recorder(|r| r.counter(0)), None);
}

#[test]
#[serial]
fn test_config_from_env() {
    // SAFETY: serial tests, no other thread reads the environment
    unsafe {
        std::env::set_var("TRCSTREAM_CORE_COUNT", "4");
        std::env::set_var("TRCSTREAM_PRINTF_EVENT_ID", "0x0ABC");
        std::env::set_var("TRCSTREAM_SYMBOL_CAPACITY", "not a number");
        std::env::set_var("TRCSTREAM_CHANNEL", "env-channel");
    }
    let builder = RecorderBuilder::from_env();
    unsafe {
        std::env::remove_var("TRCSTREAM_CORE_COUNT");
        std::env::remove_var("TRCSTREAM_PRINTF_EVENT_ID");
        std::env::remove_var("TRCSTREAM_SYMBOL_CAPACITY");
        std::env::remove_var("TRCSTREAM_CHANNEL");
    }
    let config = builder.config();
    assert_eq!(config.core_count, 4);
    assert_eq!(config.printf_event_id, 0x0ABC);
    assert_eq!(config.symbol_capacity, SymbolTable::DEFAULT_CAPACITY);
    assert_eq!(config.channel_name, "env-channel");
}
