//! Administrative commands over the training stores.
//!
//! Each command returns a JSON value; `main` prints it.

use clap::{Args, Subcommand};
use marketd_training::{
    ModelKey, ModelUserKey, PendingModelKey, PublicModelKey, TrainingError, TrainingStorage,
};
use serde_json::{json, Value};
use tracing::info;

/// The (organization, service, group) a list belongs to.
#[derive(Args, Clone, Debug)]
pub struct Scope {
    pub organization_id: String,
    pub service_id: String,
    pub group_id: String,
}

#[derive(Args, Clone, Debug)]
pub struct ModelRef {
    #[command(flatten)]
    pub scope: Scope,
    pub model_id: String,
}

impl ModelRef {
    fn key(&self) -> ModelKey {
        ModelKey::new(
            &self.scope.organization_id,
            &self.scope.service_id,
            &self.scope.group_id,
            &self.model_id,
        )
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Inspect model records.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Inspect or edit the pending model list of a service group.
    Pending {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Inspect or edit the public model list of a service group.
    Public {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Inspect the models a user address can access.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ModelsAction {
    /// Every stored model, optionally narrowed to an organization.
    List {
        #[arg(long)]
        organization_id: Option<String>,
    },
    Show(ModelRef),
}

#[derive(Subcommand, Clone, Debug)]
pub enum ListAction {
    List(Scope),
    Add(ModelRef),
    Remove(ModelRef),
}

#[derive(Subcommand, Clone, Debug)]
pub enum UsersAction {
    Show {
        #[command(flatten)]
        scope: Scope,
        user_address: String,
    },
}

#[derive(Clone, Copy)]
enum ListKind {
    Pending,
    Public,
}

pub fn run(storage: &TrainingStorage, command: &Command) -> anyhow::Result<Value> {
    match command {
        Command::Models { action } => models(storage, action),
        Command::Pending { action } => list(storage, ListKind::Pending, action),
        Command::Public { action } => list(storage, ListKind::Public, action),
        Command::Users {
            action: UsersAction::Show {
                scope,
                user_address,
            },
        } => {
            let key = ModelUserKey::new(
                &scope.organization_id,
                &scope.service_id,
                &scope.group_id,
                user_address,
            );
            let record = storage.users.get(&key)?;
            let models = storage.models_for_user(&key)?;
            Ok(json!({
                "key": key.to_string(),
                "model_ids": record.map(|r| r.model_ids).unwrap_or_default(),
                "models": models,
            }))
        }
    }
}

fn models(storage: &TrainingStorage, action: &ModelsAction) -> anyhow::Result<Value> {
    match action {
        ModelsAction::List { organization_id } => {
            let mut models = storage.models.get_all()?;
            if let Some(org) = organization_id {
                models.retain(|m| &m.organization_id == org);
            }
            models.sort_by(|a, b| {
                (&a.organization_id, &a.service_id, &a.group_id, &a.model_id).cmp(&(
                    &b.organization_id,
                    &b.service_id,
                    &b.group_id,
                    &b.model_id,
                ))
            });
            Ok(serde_json::to_value(models)?)
        }
        ModelsAction::Show(model) => {
            let key = model.key();
            match storage.models.get(&key)? {
                Some(data) => Ok(serde_json::to_value(data)?),
                None => anyhow::bail!("no model stored under {key}"),
            }
        }
    }
}

fn list(storage: &TrainingStorage, kind: ListKind, action: &ListAction) -> anyhow::Result<Value> {
    let scope = match action {
        ListAction::List(scope) => scope,
        ListAction::Add(model) | ListAction::Remove(model) => &model.scope,
    };
    let (org, service, group) = (
        scope.organization_id.as_str(),
        scope.service_id.as_str(),
        scope.group_id.as_str(),
    );

    let result: Result<(), TrainingError> = match (kind, action) {
        (_, ListAction::List(_)) => Ok(()),
        (ListKind::Pending, ListAction::Add(model)) => storage
            .pending
            .add_pending_model_id(&PendingModelKey::new(org, service, group), &model.model_id),
        (ListKind::Pending, ListAction::Remove(model)) => storage
            .pending
            .remove_pending_model_id(&PendingModelKey::new(org, service, group), &model.model_id),
        (ListKind::Public, ListAction::Add(model)) => storage
            .public
            .add_public_model_id(&PublicModelKey::new(org, service, group), &model.model_id),
        (ListKind::Public, ListAction::Remove(model)) => storage
            .public
            .remove_public_model_id(&PublicModelKey::new(org, service, group), &model.model_id),
    };
    result?;
    if let ListAction::Add(model) | ListAction::Remove(model) = action {
        info!(model = %model.key(), "updated model list");
    }

    let (key, model_ids) = match kind {
        ListKind::Pending => {
            let key = PendingModelKey::new(org, service, group);
            let ids = storage.pending.get(&key)?.map(|r| r.model_ids);
            (key.to_string(), ids)
        }
        ListKind::Public => {
            let key = PublicModelKey::new(org, service, group);
            let ids = storage.public.get(&key)?.map(|r| r.model_ids);
            (key.to_string(), ids)
        }
    };
    Ok(json!({
        "key": key,
        "model_ids": model_ids.unwrap_or_default(),
    }))
}
