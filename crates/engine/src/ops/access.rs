use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{Actor, EngineError, ResultEngine, Role, User, transactions, users};

use super::Engine;

pub(super) fn require_role(actor: &Actor, allowed: &[Role], action: &str) -> ResultEngine<()> {
    if !allowed.contains(&actor.role) {
        return Err(EngineError::Forbidden(format!(
            "{} cannot {action}",
            actor.role
        )));
    }
    Ok(())
}

pub(super) fn require_admin(actor: &Actor, action: &str) -> ResultEngine<()> {
    require_role(actor, &[Role::AdminColombia, Role::AdminVenezuela], action)
}

impl Engine {
    pub(super) async fn find_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Option<User>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<User> {
        self.find_user(db, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id} not exists")))
    }

    pub(super) async fn require_transaction_model(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| {
                EngineError::KeyNotFound(format!("transaction {transaction_id} not exists"))
            })
    }

    /// Loads a transaction the actor may see.
    ///
    /// Admins see everything; vendors and clients only their own
    /// transactions. Others' rows are reported as missing.
    pub(super) async fn require_visible_transaction(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        let model = self.require_transaction_model(db, transaction_id).await?;
        if !actor.role.is_admin() && model.created_by != actor.user_id {
            return Err(EngineError::KeyNotFound(format!(
                "transaction {transaction_id} not exists"
            )));
        }
        Ok(model)
    }
}
