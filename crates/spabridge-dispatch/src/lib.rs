//! `spabridge-dispatch` – directive routing and handling.
//!
//! Turns one inbound smart-home directive into exactly one response event.
//!
//! # Modules
//!
//! - [`dispatcher`] – [`Dispatcher`][dispatcher::Dispatcher]: the single entry
//!   point.  Validates the envelope, resolves a handler and converts every
//!   failure into a shaped error event.
//! - [`router`] – [`DirectiveKind`][router::DirectiveKind]: the static
//!   `(namespace, name)` routing table.
//! - [`handlers`] – one handler per directive kind (AcceptGrant, Discover,
//!   TurnOn/TurnOff, ReportState) plus the device/property map.
//! - [`errors`] – [`ProtocolError`][errors::ProtocolError] and
//!   [`BusinessError`][errors::BusinessError].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use spabridge_dispatch::Dispatcher;
//! use spabridge_gateway::{SimDeviceCloud, SimTokenExchange};
//!
//! let dispatcher = Dispatcher::new(
//!     Box::new(SimDeviceCloud::seeded()),
//!     Box::new(SimTokenExchange::new()),
//! );
//! let response = dispatcher.handle(&json!({ "nothing": "here" }), None);
//! assert_eq!(response["event"]["payload"]["type"], "INVALID_DIRECTIVE");
//! ```

pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod router;

pub use dispatcher::{Dispatcher, validate};
pub use errors::{BusinessError, DispatchError, ProtocolError};
pub use handlers::{
    DEVICE_PROPERTIES, DeviceProperty, FRIENDLY_NAME_LOCALE, HandlerContext, UNMAPPED_DEVICE,
};
pub use router::DirectiveKind;
