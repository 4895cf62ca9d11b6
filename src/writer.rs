//! 输出流管理
//!
//! 每个输出标识（`stdout`、`stderr`、`syslog` 或文件路径）对应一个 `LockedWriter`，
//! 由 `WritersRegistry` 统一登记，同一进程内同一输出只打开一次。

use crate::error::{LoggingError, Result};
use crate::syslog::SyslogWriter;
use crate::target::Target;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// writer 注册名
pub type WriterName = String;

/// 可同步、可关闭的输出流
pub trait Sink: Write + Send {
    /// 把缓冲的数据持久化
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }

    /// 关闭输出流，之后不会再被调用
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Sink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_data()
    }
}

impl Sink for io::Stdout {}

impl Sink for io::Stderr {}

impl Sink for SyslogWriter {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        self.disconnect();
        Ok(())
    }
}

/// 把任意 `Write` 适配为 `Sink`，`sync` 为空操作
pub struct WriterAdapter<W> {
    inner: W,
}

impl<W: Write + Send> WriterAdapter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> Write for WriterAdapter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Send> Sink for WriterAdapter<W> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 互斥保护的输出流
///
/// 一条日志在一次加锁内完整写入，并发写入不会交错。关闭后的写入返回
/// `LoggingError::Closed`。
pub struct LockedWriter {
    stream: Mutex<Option<Box<dyn Sink>>>,
}

impl LockedWriter {
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            stream: Mutex::new(Some(sink)),
        }
    }

    pub fn from_sink(sink: impl Sink + 'static) -> Self {
        Self::new(Box::new(sink))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Sink>>> {
        // 临界区内只有单次写入，中毒后数据仍然一致
        self.stream
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 写入一条完整的日志
    pub fn write_entry(&self, buf: &[u8]) -> Result<()> {
        let mut stream = self.lock();
        let sink = stream.as_mut().ok_or(LoggingError::Closed)?;
        sink.write_all(buf)?;
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        let mut stream = self.lock();
        let sink = stream.as_mut().ok_or(LoggingError::Closed)?;
        sink.sync()?;
        Ok(())
    }

    /// 关闭输出流，重复调用无效果
    pub fn close(&self) -> Result<()> {
        let mut stream = self.lock();
        match stream.take() {
            Some(mut sink) => sink.close().map_err(LoggingError::from),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }
}

impl std::fmt::Debug for LockedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedWriter")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Write for &LockedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_entry(buf).map_err(into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stream = self.lock();
        match stream.as_mut() {
            Some(sink) => sink.flush(),
            None => Err(into_io_error(LoggingError::Closed)),
        }
    }
}

fn into_io_error(err: LoggingError) -> io::Error {
    match err {
        LoggingError::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// 输出流注册表
#[derive(Default)]
pub struct WritersRegistry {
    writers: Mutex<HashMap<WriterName, Arc<LockedWriter>>>,
}

impl WritersRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WriterName, Arc<LockedWriter>>> {
        self.writers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 返回输出标识对应的 writer，不存在时打开并登记
    ///
    /// 打开失败时不会留下注册项。并发解析同一输出时只有一个 writer 会被登记，
    /// 所有调用方拿到的都是它。
    pub fn resolve(&self, output: &Target) -> Result<Arc<LockedWriter>> {
        let name = output.as_str();
        if let Some(writer) = self.lock().get(name) {
            return Ok(writer.clone());
        }

        output.validate()?;
        let sink = open_sink(output)?;
        let candidate = Arc::new(LockedWriter::new(sink));

        let mut writers = self.lock();
        let writer = writers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(output = name, "writer registered");
                candidate.clone()
            })
            .clone();
        drop(writers);

        // 竞争失败的一方关闭自己打开的流
        if !Arc::ptr_eq(&writer, &candidate) {
            let _ = candidate.close();
        }

        Ok(writer)
    }

    /// 登记一个输出流
    pub fn put(&self, name: &str, sink: Box<dyn Sink>) -> Result<Arc<LockedWriter>> {
        let writer = Arc::new(LockedWriter::new(sink));
        self.put_locked(name, writer.clone())?;
        Ok(writer)
    }

    /// 登记一个已加锁的输出流，原样保存不再包装
    pub fn put_locked(&self, name: &str, writer: Arc<LockedWriter>) -> Result<()> {
        if name.is_empty() {
            return Err(LoggingError::EmptyWriterName);
        }

        let mut writers = self.lock();
        if writers.contains_key(name) {
            return Err(LoggingError::WriterExists(name.to_string()));
        }
        writers.insert(name.to_string(), writer);
        tracing::debug!(name, "writer registered");

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<LockedWriter>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| LoggingError::WriterUnknown(name.to_string()))
    }

    /// 移除注册项并返回它，不会关闭输出流
    pub fn remove(&self, name: &str) -> Option<Arc<LockedWriter>> {
        let removed = self.lock().remove(name);
        if removed.is_some() {
            tracing::debug!(name, "writer removed");
        }
        removed
    }

    pub fn names(&self) -> Vec<WriterName> {
        let mut names: Vec<WriterName> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

fn open_sink(output: &Target) -> Result<Box<dyn Sink>> {
    match output {
        Target::Stdout => Ok(Box::new(io::stdout())),
        Target::Stderr => Ok(Box::new(io::stderr())),
        Target::Syslog => Ok(Box::new(SyslogWriter::local()?)),
        Target::File(path) => Ok(Box::new(open_file(path)?)),
    }
}

/// 以追加方式打开日志文件，父目录不存在时自动创建
fn open_file(path: &str) -> Result<File> {
    let to_err = |source: io::Error| LoggingError::Open {
        output: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(to_err)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)?;
    tracing::debug!(path, "log file opened");

    Ok(file)
}

static WRITERS: Lazy<WritersRegistry> = Lazy::new(WritersRegistry::new);

/// 进程级输出流注册表
pub fn writers() -> &'static WritersRegistry {
    &WRITERS
}

/// 返回输出标识对应的进程级 writer
pub fn output(identifier: impl Into<Target>) -> Result<Arc<LockedWriter>> {
    writers().resolve(&identifier.into())
}
