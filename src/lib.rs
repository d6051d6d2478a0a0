pub mod analytics;
pub mod bindings;
pub mod browser;
pub mod config;
pub mod controller;
pub mod error;
pub mod handle;
pub mod logging;
pub mod navigation;
pub mod outcome;
pub mod three_ds;
pub mod types;
pub mod validation;
pub mod widget;

mod challenge_component;
mod checkout_component;
mod components;
mod interop;

pub use analytics::Analytics;
pub use challenge_component::*;
pub use checkout_component::*;
pub use components::*;
pub use config::{CheckoutConfig, FieldConfig};
pub use controller::{PaymentAttempt, Settlement, SubmissionController, SubmissionState};
pub use error::{ErrorKind, PaymentError, WidgetError};
pub use handle::{ControllerHandle, WeakControllerHandle};
pub use interop::*;
pub use navigation::Navigator;
pub use outcome::{OutcomeReport, OutcomeReporter, ReportedError};
pub use three_ds::{ChallengeContext, ChallengeStep, ThreeDsRedirectHandler};
pub use types::*;
pub use widget::{TokenizationWidget, WidgetAdapter, WidgetEvent, WidgetEventKind};
