//! Pinkit session and orchestration layer.
//!
//! This crate drives the workflows on top of `pinkit-lib`'s stateless
//! core: a connected wallet [`PinSession`], batch pin writes that
//! accumulate until one payment settles them, the assisted flow where a
//! sponsor funds each transaction, and profile synchronization that maps
//! field changes onto either path.
//!
//! # Example
//!
//! ```ignore
//! use pinkit_connector::{Collaborators, PinSession, SessionConfig, UserInfoUpdate, UpdateOptions};
//!
//! let session = PinSession::connect(SessionConfig::default(), collaborators).await?;
//! let update = UserInfoUpdate { name: Some("alice".into()), ..Default::default() };
//! let result = session.update_user_info(update, UpdateOptions::default()).await?;
//! if let Some(outcome) = result.name {
//!     println!("name write: {outcome:?}");
//! }
//! ```

mod assisted;
mod batch;
mod profile;
mod session;

pub use assisted::{AssistedPinOptions, AssistedPinResult};
pub use batch::{CreatePinOptions, CreatePinResult, SerialAction};
pub use profile::{FieldOutcome, UpdateOptions, UserInfoUpdate, UserInfoUpdateResult};
pub use session::{Collaborators, PinSession, RetryPolicy, SessionConfig};

pub use pinkit_lib::{PinkitError, Result};
