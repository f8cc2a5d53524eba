//! # Observability
//!
//! Misfit evaluations emit `tracing` events; nothing is printed unless the
//! host installs a subscriber, for instance with [`init_logging`].
//!
//! | name             | level | meaning                                 |
//! |------------------|-------|-----------------------------------------|
//! | `phase_misfit`   | debug | span around one evaluation              |
//! | criterion        | debug | phase jump criterion                    |
//! | misfit           | info  | final phase misfit                      |
//! | gates            | warn  | phase jump, non-finite misfit, bound    |
//! | inverse          | debug | refinement iterations and residual      |

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
