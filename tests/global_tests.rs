//! 进程级会话的集成测试

use anyhow::Result;
use logfacade::{
    current_config, info, init, keys_ctx, must_init, new_logger, new_logger_ctx, new_named_logger,
    new_named_logger_ctx, with_context_extractors, with_custom_level, with_format, with_level,
    with_target, Context, DefaultLogger, FieldValue, Format, Key, Level, Logger, DEFAULT_LEVEL,
};
use serial_test::serial;
use std::panic;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn log_path(dir: &TempDir) -> PathBuf {
    dir.path().join("app.log")
}

fn read_json_lines(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[test]
#[serial]
fn test_must_init_defaults() {
    must_init(vec![]);

    let logger = new_logger(None);
    assert_eq!(logger.level(), DEFAULT_LEVEL);
    assert_eq!(
        current_config().to_string(),
        "level='info',format='text',output='stdout',customLevels={}"
    );
}

#[test]
#[serial]
fn test_must_init_invalid_option_panics() {
    must_init(vec![with_level(Level::Error)]);

    let result = panic::catch_unwind(|| must_init(vec![with_target("")]));
    assert!(result.is_err());

    // 失败的初始化不影响之前的配置
    assert_eq!(current_config().level, Level::Error);
}

#[test]
#[serial]
fn test_named_logger_default_level() {
    init(vec![]).unwrap();
    assert_eq!(new_named_logger("svc", None).level(), DEFAULT_LEVEL);
}

#[test]
#[serial]
fn test_named_logger_custom_level_beats_global() {
    init(vec![
        with_level(Level::Debug),
        with_custom_level("svc", Level::Warn),
    ])
    .unwrap();

    assert_eq!(new_named_logger("svc", None).level(), Level::Warn);
    assert_eq!(new_named_logger("svc", Some(Level::Info)).level(), Level::Warn);
    assert_eq!(new_named_logger("api", None).level(), Level::Debug);
}

#[test]
#[serial]
fn test_config_loaded_from_yaml_drives_output() -> Result<()> {
    let dir = TempDir::new()?;
    let path = log_path(&dir);
    let config = logfacade::Config::from_yaml(&format!(
        "level: dbg\nformat: json\noutput: {}\ncustomLevels:\n  noisy: error\n",
        path.display()
    ))?;

    init(vec![
        with_level(config.level),
        with_format(config.format),
        with_target(config.output.clone()),
        with_custom_level("noisy", config.custom_levels["noisy"]),
    ])?;

    let noisy = new_named_logger("noisy", None);
    noisy.warn("suppressed");
    noisy.error("kept");

    let api = new_named_logger("api", None);
    api.debug("debug visible");
    info!(api, "request {} done", 17);
    api.sync()?;

    let entries = read_json_lines(&path)?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["logger"], "noisy");
    assert_eq!(entries[0]["msg"], "kept");
    assert_eq!(entries[1]["level"], "debug");
    assert_eq!(entries[2]["msg"], "request 17 done");
    // 调试级别配置会记录调用位置
    assert!(entries[2]["caller"]
        .as_str()
        .unwrap_or_default()
        .contains("global_tests.rs:"));

    Ok(())
}

#[test]
#[serial]
fn test_ctx_loggers_carry_context_keys() -> Result<()> {
    let dir = TempDir::new()?;
    let path = log_path(&dir);
    let request_id = Key::from_static("request_id");
    let tenant = Key::from_static("tenant");

    init(vec![
        with_format(Format::Json),
        with_target(path.to_string_lossy().to_string()),
        with_context_extractors(vec![request_id.extractor(), tenant.extractor()]),
    ])?;

    let ctx = Context::new();
    let ctx = request_id.set_to_ctx(&ctx, "req-1");
    let ctx = tenant.set_to_ctx(&ctx, FieldValue::Null);

    let keys = keys_ctx(&ctx);
    assert_eq!(keys.get(&request_id), Some(&FieldValue::from("req-1")));
    assert!(!keys.contains_key(&tenant));

    new_logger_ctx(&ctx, None).info("plain");
    new_named_logger_ctx(&ctx, "worker", None).info("named");
    ctx.cancel();
    std::thread::sleep(std::time::Duration::from_millis(50));

    let entries = read_json_lines(&path)?;
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry["request_id"], "req-1");
        assert!(entry.get("tenant").is_none());
    }
    assert_eq!(entries[1]["logger"], "worker");

    Ok(())
}

#[test]
#[serial]
fn test_default_logger_is_lazy() -> Result<()> {
    static LOGGER: DefaultLogger = DefaultLogger::new();

    let dir = TempDir::new()?;
    let path = log_path(&dir);
    init(vec![
        with_format(Format::Json),
        with_level(Level::Warn),
        with_target(path.to_string_lossy().to_string()),
    ])?;

    assert_eq!(LOGGER.level(), DEFAULT_LEVEL);
    LOGGER.info("below configured level");
    LOGGER.warn("from default logger");
    LOGGER
        .with_key("attempt", FieldValue::from(3))
        .error("derived logger");
    LOGGER.sync()?;

    let entries = read_json_lines(&path)?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["msg"], "from default logger");
    assert_eq!(entries[1]["attempt"], 3);

    Ok(())
}
