//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use seatlease_core::async_effect;
///
/// async_effect! {
///     ledger.record_purchase(record).await.err().map(|e| Action::Failed { error: e.to_string() })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use seatlease_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(30),
///     action: Action::TimeoutExpired
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Run` that delivers a value through a [`Reply`](crate::Reply)
///
/// # Example
///
/// ```rust,ignore
/// use seatlease_core::reply;
///
/// reply!(reply, Ok(receipt))
/// ```
#[macro_export]
macro_rules! reply {
    ($reply:expr, $value:expr) => {{
        let reply = $reply;
        let value = $value;
        $crate::effect::Effect::Run(::std::boxed::Box::new(move || {
            let _ = reply.send(value);
        }))
    }};
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::Reply;
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        AsyncResult { value: i32 },
        TimeoutExpired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::AsyncResult { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(30),
            action: TestAction::TimeoutExpired
        };

        assert!(matches!(effect, Effect::Delay { .. }));
    }

    #[tokio::test]
    async fn test_reply_macro_delivers_on_run() {
        let (reply, rx) = Reply::channel();
        let effect: Effect<TestAction> = reply!(reply, 7_u32);

        let Effect::Run(f) = effect else {
            unreachable!("reply! must build Effect::Run");
        };
        f();
        assert_eq!(rx.await.unwrap(), 7);
    }
}
