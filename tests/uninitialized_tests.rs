//! 进程级会话未初始化时的行为
//!
//! 单独放在一个测试二进制中，保证运行时全局会话从未被初始化。

use logfacade::{
    global_session, new_logger, new_named_logger_ctx, try_new_logger, try_new_named_logger,
    Context, DefaultBackend, ErrorKind, LoggingError,
};
use std::panic;
use std::sync::Arc;

#[test]
fn test_factories_before_init() {
    let err = try_new_logger(None).unwrap_err();
    assert!(matches!(err, LoggingError::BackendNotSet));
    assert_eq!(err.kind(), ErrorKind::Lifecycle);

    let result = panic::catch_unwind(|| new_logger(None));
    assert!(result.is_err());

    let result = panic::catch_unwind(|| {
        new_named_logger_ctx(&Context::background(), "svc", None)
    });
    assert!(result.is_err());

    global_session().set_backend(Arc::new(DefaultBackend::new()));
    let err = try_new_named_logger("svc", None).unwrap_err();
    assert!(matches!(err, LoggingError::NotInitialized));
    assert!(err.to_string().starts_with("logging: "));
}
