//! User directory and actors.
//!
//! Authentication lives outside the engine: callers hand in an [`Actor`]
//! built from the identity provider's session. The `users` table is a small
//! local mirror the engine needs to know who a vendor reports to (commission
//! rule) and who owns a transaction (notifications).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    AdminColombia,
    AdminVenezuela,
    Vendedor,
    Cliente,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdminColombia => "admin_colombia",
            Self::AdminVenezuela => "admin_venezuela",
            Self::Vendedor => "vendedor",
            Self::Cliente => "cliente",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::AdminColombia | Self::AdminVenezuela)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin_colombia" => Ok(Self::AdminColombia),
            "admin_venezuela" => Ok(Self::AdminVenezuela),
            "vendedor" => Ok(Self::Vendedor),
            "cliente" => Ok(Self::Cliente),
            other => Err(EngineError::InvalidId(format!("invalid role: {other}"))),
        }
    }
}

/// The authenticated caller of an engine operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Admin user id a vendor reports to.
    pub reports_to: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub role: String,
    pub reports_to: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.clone()),
            name: ActiveValue::Set(user.name.clone()),
            role: ActiveValue::Set(user.role.as_str().to_string()),
            reports_to: ActiveValue::Set(user.reports_to.clone()),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: Role::try_from(model.role.as_str())?,
            id: model.id,
            name: model.name,
            reports_to: model.reports_to,
        })
    }
}
