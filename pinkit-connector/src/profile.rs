//! User-info synchronization.
//!
//! Maps a set of profile field changes (name, bio, avatar, background)
//! onto pin writes. Fields are processed in a fixed order; a field is
//! written only when its new value is present, non-empty and different
//! from the value currently on the ledger. A known record id turns the
//! write into a modification of that record.

use pinkit_lib::{ContentEncoding, IdentityRecord, PinkitError, ProtocolRecord, Result};

use crate::assisted::AssistedPinOptions;
use crate::batch::{CreatePinOptions, CreatePinResult, SerialAction};
use crate::session::PinSession;

/// Requested profile field values.
#[derive(Clone, Debug, Default)]
pub struct UserInfoUpdate {
    /// Display name.
    pub name: Option<String>,
    /// Biography text.
    pub bio: Option<String>,
    /// Avatar content, base64-encoded.
    pub avatar: Option<String>,
    /// Background image content, base64-encoded.
    pub background: Option<String>,
}

impl UserInfoUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
            && self.background.is_none()
    }
}

/// Options for a profile synchronization run.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateOptions {
    /// Fee rate hint in sat/byte; falls back to the session default.
    pub fee_rate: Option<f64>,
}

/// What happened to one changed field.
#[derive(Debug)]
pub enum FieldOutcome {
    /// The field's pin write settled.
    Completed(CreatePinResult),
    /// The field's pin write failed; later fields were not attempted.
    Failed(PinkitError),
}

impl FieldOutcome {
    /// Whether this field settled.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Per-field results of a synchronization run. A field is present only
/// when the diff rule selected it for writing.
#[derive(Debug, Default)]
pub struct UserInfoUpdateResult {
    /// Outcome for the name field.
    pub name: Option<FieldOutcome>,
    /// Outcome for the bio field.
    pub bio: Option<FieldOutcome>,
    /// Outcome for the avatar field.
    pub avatar: Option<FieldOutcome>,
    /// Outcome for the background field.
    pub background: Option<FieldOutcome>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Name,
    Bio,
    Avatar,
    Background,
}

impl Field {
    const ORDER: [Field; 4] = [Field::Name, Field::Bio, Field::Avatar, Field::Background];

    fn path(&self) -> &'static str {
        match self {
            Self::Name => "/info/name",
            Self::Bio => "/info/bio",
            Self::Avatar => "/info/avatar",
            Self::Background => "/info/background",
        }
    }

    fn encoding(&self) -> ContentEncoding {
        match self {
            Self::Name | Self::Bio => ContentEncoding::Utf8,
            Self::Avatar | Self::Background => ContentEncoding::Base64,
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            Self::Name | Self::Bio => "text/plain",
            Self::Avatar | Self::Background => "image/jpeg;binary",
        }
    }

    fn requested<'a>(&self, update: &'a UserInfoUpdate) -> Option<&'a str> {
        match self {
            Self::Name => update.name.as_deref(),
            Self::Bio => update.bio.as_deref(),
            Self::Avatar => update.avatar.as_deref(),
            Self::Background => update.background.as_deref(),
        }
    }

    fn current<'a>(&self, user: Option<&'a IdentityRecord>) -> Option<&'a str> {
        let user = user?;
        match self {
            Self::Name => user.name.as_deref(),
            Self::Bio => user.bio.as_deref(),
            Self::Avatar => user.avatar.as_deref(),
            Self::Background => user.background.as_deref(),
        }
    }

    fn record_id<'a>(&self, user: Option<&'a IdentityRecord>) -> Option<&'a str> {
        let user = user?;
        let id = match self {
            Self::Name => user.name_id.as_deref(),
            Self::Bio => user.bio_id.as_deref(),
            Self::Avatar => user.avatar_id.as_deref(),
            Self::Background => user.background_id.as_deref(),
        };
        id.filter(|id| !id.is_empty())
    }
}

impl UserInfoUpdateResult {
    fn set(&mut self, field: Field, outcome: FieldOutcome) {
        match field {
            Field::Name => self.name = Some(outcome),
            Field::Bio => self.bio = Some(outcome),
            Field::Avatar => self.avatar = Some(outcome),
            Field::Background => self.background = Some(outcome),
        }
    }
}

struct FieldChange {
    field: Field,
    record: ProtocolRecord,
}

/// Apply the diff rule against the known identity and build one record
/// per changed field, in fixed field order.
fn diff_changes(update: &UserInfoUpdate, user: Option<&IdentityRecord>) -> Result<Vec<FieldChange>> {
    let mut changes = Vec::new();
    for field in Field::ORDER {
        let Some(value) = field.requested(update) else {
            continue;
        };
        if value.is_empty() || Some(value) == field.current(user) {
            continue;
        }
        let record = match field.record_id(user) {
            Some(id) => ProtocolRecord::modify(id, value, field.encoding(), field.content_type())?,
            None => ProtocolRecord::create(
                field.path(),
                value,
                field.encoding(),
                field.content_type(),
            )?,
        };
        changes.push(FieldChange { field, record });
    }
    Ok(changes)
}

impl PinSession {
    /// Synchronize changed profile fields onto the ledger.
    ///
    /// With an assist service bound, each changed field becomes one
    /// assisted transaction chained through the derived funding output;
    /// a failure is reported for the failing field and later fields stay
    /// absent, while completed fields keep their results. Without an
    /// assist service, all changed fields settle as one accumulated
    /// batch and a settlement failure surfaces as this call's error.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn update_user_info(
        &self,
        update: UserInfoUpdate,
        options: UpdateOptions,
    ) -> Result<UserInfoUpdateResult> {
        self.ensure_connected()?;
        let user = self.user();
        let changes = diff_changes(&update, user.as_ref())?;
        self.sync_changes(changes, options).await
    }

    /// Publish a first-time profile. Requires a name plus any other
    /// fields; the current identity is ignored, so every provided field
    /// becomes a creation.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn create_user_info(
        &self,
        update: UserInfoUpdate,
        options: UpdateOptions,
    ) -> Result<UserInfoUpdateResult> {
        self.ensure_connected()?;
        if update.is_empty() {
            return Err(PinkitError::invalid_input(
                "user_data",
                "no user data provided",
            ));
        }
        if update.name.as_deref().unwrap_or_default().is_empty() {
            return Err(PinkitError::invalid_input("name", "a name is required"));
        }
        let changes = diff_changes(&update, None)?;
        self.sync_changes(changes, options).await
    }

    async fn sync_changes(
        &self,
        changes: Vec<FieldChange>,
        options: UpdateOptions,
    ) -> Result<UserInfoUpdateResult> {
        if changes.is_empty() {
            return Ok(UserInfoUpdateResult::default());
        }
        if self.has_assist() {
            self.sync_assisted(changes).await
        } else {
            self.sync_batched(changes, options).await
        }
    }

    /// One assisted transaction per field, chained via the derived
    /// funding output. Aborts on the first failure, keeping completed
    /// fields' results.
    async fn sync_assisted(&self, changes: Vec<FieldChange>) -> Result<UserInfoUpdateResult> {
        let mut result = UserInfoUpdateResult::default();
        let mut funding = None;
        for change in changes {
            let options = AssistedPinOptions {
                funding: funding.take(),
            };
            match self.create_pin_assisted(&change.record, options).await {
                Ok(assisted) => {
                    funding = Some(assisted.next_funding);
                    result.set(
                        change.field,
                        FieldOutcome::Completed(CreatePinResult::Settled {
                            txid: assisted.txid.clone(),
                            txids: vec![assisted.txid],
                        }),
                    );
                }
                Err(err) => {
                    result.set(change.field, FieldOutcome::Failed(err));
                    return Ok(result);
                }
            }
        }
        Ok(result)
    }

    /// All changed fields through the batch orchestrator: combo for
    /// every field but the last, finish on the last.
    async fn sync_batched(
        &self,
        changes: Vec<FieldChange>,
        options: UpdateOptions,
    ) -> Result<UserInfoUpdateResult> {
        let mut transactions = Vec::new();
        let mut settled_txids = Vec::new();
        let last = changes.len() - 1;
        for (i, change) in changes.iter().enumerate() {
            let serial_action = if i == last {
                SerialAction::Finish
            } else {
                SerialAction::Combo
            };
            let pin_options = CreatePinOptions {
                serial_action,
                transactions: std::mem::take(&mut transactions),
                fee_rate: options.fee_rate,
                ..CreatePinOptions::default()
            };
            match self.create_pin(&change.record, pin_options).await? {
                CreatePinResult::Accumulating { transactions: acc } => transactions = acc,
                CreatePinResult::Settled { txids, .. } => settled_txids = txids,
            }
        }

        // Walk the settled ids back onto the fields in the same order
        // they were accumulated.
        let mut result = UserInfoUpdateResult::default();
        for (change, txid) in changes.iter().zip(settled_txids.iter()) {
            result.set(
                change.field,
                FieldOutcome::Completed(CreatePinResult::Settled {
                    txid: txid.clone(),
                    txids: settled_txids.clone(),
                }),
            );
        }
        Ok(result)
    }
}
