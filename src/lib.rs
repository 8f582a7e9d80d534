//! Fan a single HTTP(S) request out to every running member of a fleet and
//! report per-member latency and outcome.
//!
//! ## Example
//! Probing a small fleet read from a JSON inventory:
//! ```no_run
//! use fleet_probe::{report, Dispatcher, Inventory, JsonInventory, RequestSpecBuilder};
//!
//! tokio_test::block_on(async {
//!     let targets = JsonInventory::new("fleet.json")
//!         .members("web", "eu-west-2")
//!         .unwrap();
//!     let spec = RequestSpecBuilder::new().with_path("/health").build().unwrap();
//!     let outcomes = Dispatcher::new().unwrap().dispatch(&targets, &spec).await;
//!     report::render(&mut std::io::stdout(), &outcomes).unwrap();
//! })
//! ```
//! Custom transports (e.g. for tests) plug in through [`transport::Transport`]
//! and [`dispatcher::Dispatcher::with_transport`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod outcome;
pub mod report;
pub mod request;
pub mod target;
pub mod transport;

pub(crate) mod collector;

pub use dispatcher::Dispatcher;
pub use error::{Error, FailureKind, InputBuildError, ProbeFailure, Result};
pub use inventory::{Inventory, JsonInventory};
pub use outcome::{Outcome, ProbeStatus};
pub use request::{ProbeRequest, RequestSpec, RequestSpecBuilder};
pub use target::{LifecycleState, Target, TargetBuilder};
pub use transport::{Exchange, HttpTransport, Transport};
