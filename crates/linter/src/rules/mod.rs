//! Built-in rules.
//!
//! Each rule lives in its own file as a unit struct implementing
//! [`Rule`](crate::Rule); [`registry`](crate::registry) lists them.

mod no_async_promise_executor;
mod no_catch_shadow;
mod no_ex_assign;
mod no_unsafe_finally;
mod object_shorthand;
mod utils;

pub use no_async_promise_executor::NoAsyncPromiseExecutor;
pub use no_catch_shadow::NoCatchShadow;
pub use no_ex_assign::NoExAssign;
pub use no_unsafe_finally::NoUnsafeFinally;
pub use object_shorthand::ObjectShorthand;
