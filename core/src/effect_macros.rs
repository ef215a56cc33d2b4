//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! reducers, in particular the transport calls issued by the request
//! orchestrator and the delayed toast dismissals of the UI slice.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use dashboard_state_core::async_effect;
///
/// async_effect! {
///     let response = transport.invoke(call).await;
///     Some(ProjectAction::ListSucceeded { items: decode(response) })
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
/// use dashboard_state_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(5),
///     action: UiAction::DismissToast { id }
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
