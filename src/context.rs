//! 调用上下文
//!
//! `Context` 携带请求范围内的字段（如 request id）和一个可选的取消信号。
//! 通过 `Config` 注册的提取函数会从上下文中取出字段，自动附加到 logger 上。

use crate::keys::{FieldValue, Key};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// 从上下文中提取一个日志字段
///
/// 返回字段名以及字段值，值为 `None` 表示上下文中没有该字段。
pub type ContextExtractorFunc = Arc<dyn Fn(&Context) -> (Key, Option<FieldValue>) + Send + Sync>;

/// 可克隆、可等待的取消信号
///
/// 所有持有者都被释放后，信号不会再被触发，此时 `CancellationWatch` 会结束等待。
#[derive(Debug)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    released: AtomicBool,
    handles: AtomicUsize,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                released: AtomicBool::new(false),
                handles: AtomicUsize::new(1),
                notify: Notify::new(),
            }),
        }
    }

    /// 触发取消并唤醒所有等待者
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancelled.swap(true, Ordering::SeqCst);
        if !was_cancelled {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// 等待取消
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// 创建不计入持有者的观察者
    pub(crate) fn watch(&self) -> CancellationWatch {
        CancellationWatch {
            state: self.inner.clone(),
        }
    }
}

impl Clone for CancellationToken {
    fn clone(&self) -> Self {
        self.inner.handles.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for CancellationToken {
    fn drop(&mut self) {
        if self.inner.handles.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.released.store(true, Ordering::SeqCst);
            self.inner.notify.notify_waiters();
        }
    }
}

/// 取消信号的观察者，不会阻止信号被释放
#[derive(Debug)]
pub(crate) struct CancellationWatch {
    state: Arc<CancellationState>,
}

impl CancellationWatch {
    /// 等待取消或所有持有者被释放，被取消时返回 `true`
    pub(crate) async fn wait(&self) -> bool {
        loop {
            let notified = self.state.notify.notified();
            if self.state.cancelled.load(Ordering::SeqCst) {
                return true;
            }
            if self.state.released.load(Ordering::SeqCst) {
                return false;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// 调用上下文
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Arc<HashMap<Key, FieldValue>>,
    cancellation: Option<CancellationToken>,
}

impl Context {
    /// 永远不会结束的空上下文
    pub fn background() -> Self {
        Self::default()
    }

    /// 可取消的空上下文
    pub fn new() -> Self {
        Self {
            values: Arc::default(),
            cancellation: Some(CancellationToken::new()),
        }
    }

    /// 基于现有取消信号创建上下文
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            values: Arc::default(),
            cancellation: Some(token),
        }
    }

    /// 派生一个带有新字段的子上下文，子上下文与父上下文共享取消信号
    pub fn with_value(&self, key: Key, value: impl Into<FieldValue>) -> Self {
        let mut values = HashMap::clone(&self.values);
        values.insert(key, value.into());
        Self {
            values: Arc::new(values),
            cancellation: self.cancellation.clone(),
        }
    }

    pub fn value(&self, key: &Key) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// 取消上下文；后台上下文调用无效果
    pub fn cancel(&self) {
        if let Some(token) = &self.cancellation {
            token.cancel();
        }
    }

    pub fn is_done(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// 上下文是否可能结束
    pub fn can_be_done(&self) -> bool {
        self.cancellation.is_some()
    }

    /// 观察上下文的取消信号，后台上下文返回 `None`
    pub(crate) fn watch(&self) -> Option<CancellationWatch> {
        self.cancellation.as_ref().map(CancellationToken::watch)
    }

    /// 等待上下文结束；后台上下文永远不会返回
    pub async fn done(&self) {
        match &self.cancellation {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Key {
    /// 将字段值写入上下文，返回新的上下文
    pub fn set_to_ctx(&self, ctx: &Context, value: impl Into<FieldValue>) -> Context {
        ctx.with_value(self.clone(), value)
    }

    /// 读取上下文中的字段值，空值视为不存在
    pub fn get_from_ctx<'a>(&self, ctx: &'a Context) -> Option<&'a FieldValue> {
        ctx.value(self).filter(|value| !value.is_null())
    }

    /// 返回提取该字段的 `ContextExtractorFunc`
    pub fn extractor(&self) -> ContextExtractorFunc {
        let key = self.clone();
        Arc::new(move |ctx: &Context| (key.clone(), key.get_from_ctx(ctx).cloned()))
    }
}
