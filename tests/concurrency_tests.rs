//! 并发场景下的后端初始化与输出流写入

use anyhow::Result;
use logfacade::{
    output, with_level, Backend, Config, DefaultBackend, Level, LockedWriter, LoggingError,
    Target, WritersRegistry,
};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_concurrent_independent_backend_init() {
    let mut config = Config::new();
    config.apply(vec![with_level(Level::Error)]);

    let handles: Vec<_> = (0..1000)
        .map(|_| {
            let config = config.clone();
            thread::spawn(move || {
                let backend = DefaultBackend::new();
                backend.must_init(config);
                // 低于配置级别，不会真正写入 stdout
                backend
                    .new_logger(None)
                    .map(|logger| logger.info("quiet"))
                    .is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("init must not panic"));
    }

    // 所有后端共享同一个 stdout writer
    let first = output("stdout").unwrap();
    let second = output(Target::Stdout).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!first.is_closed());
}

#[test]
fn test_concurrent_writers_do_not_interleave() -> Result<()> {
    const WRITERS: usize = 8;
    const LINES: usize = 500;

    let dir = TempDir::new()?;
    let path = dir.path().join("shared.log");
    let target = Target::from(path.to_string_lossy().to_string());
    let registry = Arc::new(WritersRegistry::new());

    let handles: Vec<_> = (0..WRITERS)
        .map(|id| {
            let registry = registry.clone();
            let target = target.clone();
            thread::spawn(move || -> Result<()> {
                let writer = registry.resolve(&target)?;
                for n in 0..LINES {
                    let line = format!("writer-{:02} line-{:04} {}\n", id, n, "x".repeat(64));
                    writer.write_entry(line.as_bytes())?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked")?;
    }
    registry.resolve(&target)?.sync()?;
    assert_eq!(registry.names().len(), 1);

    let content = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), WRITERS * LINES);

    // 每一行完整，且同一 writer 的行保持写入顺序
    let mut next: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        let parts: Vec<&str> = line.split(' ').collect();
        assert_eq!(parts.len(), 3, "corrupted line: {}", line);
        assert_eq!(parts[2].len(), 64, "corrupted line: {}", line);

        let id: usize = parts[0].trim_start_matches("writer-").parse()?;
        let n: usize = parts[1].trim_start_matches("line-").parse()?;
        let expected = next.entry(id).or_insert(0);
        assert_eq!(n, *expected);
        *expected += 1;
    }

    Ok(())
}

#[test]
fn test_concurrent_resolve_returns_single_writer() -> Result<()> {
    let dir = TempDir::new()?;
    let target = Target::from(dir.path().join("race.log").to_string_lossy().to_string());
    let registry = Arc::new(WritersRegistry::new());

    let writers: Vec<Arc<LockedWriter>> = (0..32)
        .map(|_| {
            let registry = registry.clone();
            let target = target.clone();
            thread::spawn(move || registry.resolve(&target))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().expect("resolve thread panicked"))
        .collect::<std::result::Result<_, _>>()?;

    for writer in &writers[1..] {
        assert!(Arc::ptr_eq(&writers[0], writer));
    }

    Ok(())
}

#[test]
fn test_write_after_close_returns_closed() -> Result<()> {
    let dir = TempDir::new()?;
    let target = Target::from(dir.path().join("closed.log").to_string_lossy().to_string());
    let registry = WritersRegistry::new();

    let writer = registry.resolve(&target)?;
    let holder = registry.resolve(&target)?;
    writer.write_entry(b"before close\n")?;
    writer.close()?;

    // 关闭对所有持有者同时生效
    let err = holder.write_entry(b"after close\n").unwrap_err();
    assert!(matches!(err, LoggingError::Closed));

    let mut handle = &*holder;
    assert!(handle.write_all(b"after close\n").is_err());
    assert!(writer.close().is_ok());

    let content = std::fs::read_to_string(dir.path().join("closed.log"))?;
    assert_eq!(content, "before close\n");

    Ok(())
}
