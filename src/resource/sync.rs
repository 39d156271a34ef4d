//! Reconciliation of one resource instance
//!
//! Given what the host tracks (an identifier, if any) and what it declares (a
//! model, if any), drive the instance through its lifecycle:
//!
//! | tracked | declared | remote  | action     |
//! |---------|----------|---------|------------|
//! | no      | yes      | -       | create     |
//! | yes     | yes      | present | update     |
//! | yes     | yes      | absent  | re-create  |
//! | yes     | no       | -       | delete     |
//! | no      | no       | -       | nothing    |

use super::{Applied, Lifecycle, Resource};
use crate::error::Result;
use crate::sentry::client::SentryClient;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Recreated,
    Updated,
    Deleted,
    Refreshed,
    Untracked,
    Nothing,
}

/// Result of one pass; `id`/`state` are `None` once the instance is absent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome<M> {
    pub action: SyncAction,
    pub lifecycle: Lifecycle,
    pub id: Option<String>,
    pub state: Option<M>,
}

impl<M> SyncOutcome<M> {
    fn present(action: SyncAction, applied: Applied<M>) -> Self {
        Self {
            action,
            lifecycle: Lifecycle::Present,
            id: Some(applied.id),
            state: Some(applied.state),
        }
    }

    fn absent(action: SyncAction) -> Self {
        Self {
            action,
            lifecycle: Lifecycle::Absent,
            id: None,
            state: None,
        }
    }
}

/// Drive one instance toward its declared shape.
///
/// The declared model is validated before the tracked instance is read, so
/// an invalid config never reaches the API.
pub async fn apply<R: Resource>(
    client: &SentryClient,
    tracked: Option<&str>,
    declared: Option<&R::Model>,
) -> Result<SyncOutcome<R::Model>> {
    if let Some(model) = declared {
        R::validate(model)?;
    }

    match (tracked, declared) {
        (None, Some(model)) => {
            let applied = R::create(client, model).await?;
            Ok(SyncOutcome::present(SyncAction::Created, applied))
        }
        (Some(id), Some(model)) => match R::read(client, id).await? {
            Some(current) => {
                let mut model = model.clone();
                R::carry_ids(&current, &mut model);
                let applied = R::update(client, id, &model).await?;
                Ok(SyncOutcome::present(SyncAction::Updated, applied))
            }
            None => {
                tracing::warn!(kind = %R::KIND, id, "drift: tracked resource is gone, re-creating");
                let applied = R::create(client, model).await?;
                Ok(SyncOutcome::present(SyncAction::Recreated, applied))
            }
        },
        (Some(id), None) => {
            R::delete(client, id).await?;
            Ok(SyncOutcome::absent(SyncAction::Deleted))
        }
        (None, None) => Ok(SyncOutcome::absent(SyncAction::Nothing)),
    }
}

/// Refresh a tracked instance without writing anything.
///
/// A resource deleted out of band comes back as [`SyncAction::Untracked`]
/// with no error so the host can drop it from its state.
pub async fn refresh<R: Resource>(client: &SentryClient, id: &str) -> Result<SyncOutcome<R::Model>> {
    match R::read(client, id).await? {
        Some(state) => Ok(SyncOutcome::present(
            SyncAction::Refreshed,
            Applied {
                id: id.to_string(),
                state,
            },
        )),
        None => Ok(SyncOutcome::absent(SyncAction::Untracked)),
    }
}
