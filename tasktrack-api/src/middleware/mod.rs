/// Middleware modules for the API server
///
/// - `observe`: request counters and error logging
/// - `panic`: panic-to-500 conversion for `CatchPanicLayer`

pub mod observe;
pub mod panic;
