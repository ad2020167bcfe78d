use sea_orm::{QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Role, User, users, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Mirrors a user from the identity provider.
    ///
    /// `reports_to` must name an existing admin and is only meaningful for
    /// vendors.
    pub async fn register_user(&self, user: User) -> ResultEngine<User> {
        let name = normalize_required_name(&user.name, "user")?;
        let user = User { name, ..user };
        with_tx!(self, |db_tx| {
            if self.find_user(&db_tx, &user.id).await?.is_some() {
                return Err(EngineError::ExistingKey(user.id));
            }
            if let Some(supervisor_id) = &user.reports_to {
                if user.role != Role::Vendedor {
                    return Err(EngineError::InvalidId(format!(
                        "only vendors report to an admin, {} is {}",
                        user.id, user.role
                    )));
                }
                let supervisor = self.require_user(&db_tx, supervisor_id).await?;
                if !supervisor.role.is_admin() {
                    return Err(EngineError::InvalidId(format!(
                        "{supervisor_id} is not an admin"
                    )));
                }
            }
            let model: users::ActiveModel = (&user).into();
            model.insert(&db_tx).await?;
            tracing::info!(user_id = %user.id, role = %user.role, "user registered");
            Ok(user)
        })
    }

    pub async fn user(&self, user_id: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| self.require_user(&db_tx, user_id).await)
    }

    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            users::Entity::find()
                .order_by_asc(users::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
