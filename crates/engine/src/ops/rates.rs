use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{Actor, CurrentRates, EngineError, RateKind, RateQuote, ResultEngine, Role, rates};

use super::{Engine, access::require_role, with_tx};

const DEFAULT_HISTORY_LIMIT: u64 = 10;

impl Engine {
    pub(super) async fn find_current_rate(
        &self,
        db: &DatabaseTransaction,
        kind: RateKind,
    ) -> ResultEngine<Option<RateQuote>> {
        rates::Entity::find()
            .filter(rates::Column::RateKind.eq(kind.as_str()))
            .order_by_desc(rates::Column::CreatedAt)
            .order_by_desc(rates::Column::Sequence)
            .limit(1)
            .one(db)
            .await?
            .map(RateQuote::try_from)
            .transpose()
    }

    async fn insert_quote(&self, db: &DatabaseTransaction, quote: &RateQuote) -> ResultEngine<()> {
        let sequence = rates::Entity::find()
            .order_by_desc(rates::Column::Sequence)
            .one(db)
            .await?
            .map_or(1, |last| last.sequence + 1);
        let mut model: rates::ActiveModel = quote.into();
        model.sequence = ActiveValue::Set(sequence);
        model.insert(db).await?;
        Ok(())
    }

    /// Appends a new quote for `kind`. Existing quotes are never modified.
    ///
    /// Authorization: admin Venezuela.
    pub async fn record_rate(
        &self,
        actor: &Actor,
        kind: RateKind,
        sale_rate: Decimal,
        purchase_rate: Option<Decimal>,
        purchase_rate_final: bool,
    ) -> ResultEngine<RateQuote> {
        require_role(actor, &[Role::AdminVenezuela], "record rates")?;
        let quote = RateQuote::new(
            kind,
            sale_rate,
            purchase_rate,
            purchase_rate_final,
            actor.user_id.clone(),
            Utc::now(),
        )?;
        with_tx!(self, |db_tx| {
            self.insert_quote(&db_tx, &quote).await?;
            Ok::<_, EngineError>(())
        })?;
        tracing::info!(kind = %kind, sale_rate = %sale_rate, "rate recorded");
        Ok(quote)
    }

    /// Corrects the purchase rate of `kind` by appending a quote that keeps
    /// the current sale rate.
    pub async fn amend_purchase_rate(
        &self,
        actor: &Actor,
        kind: RateKind,
        purchase_rate: Decimal,
        purchase_rate_final: bool,
    ) -> ResultEngine<RateQuote> {
        require_role(actor, &[Role::AdminVenezuela], "amend rates")?;
        let quote = with_tx!(self, |db_tx| {
            let current = self
                .find_current_rate(&db_tx, kind)
                .await?
                .ok_or(EngineError::NoRateAvailable(kind))?;
            let quote = RateQuote::new(
                kind,
                current.sale_rate,
                Some(purchase_rate),
                purchase_rate_final,
                actor.user_id.clone(),
                Utc::now(),
            )?;
            self.insert_quote(&db_tx, &quote).await?;
            Ok::<_, EngineError>(quote)
        })?;
        tracing::info!(kind = %kind, purchase_rate = %purchase_rate, "purchase rate amended");
        Ok(quote)
    }

    /// Most recent quote of `kind`.
    pub async fn current_rate(&self, kind: RateKind) -> ResultEngine<RateQuote> {
        with_tx!(self, |db_tx| {
            self.find_current_rate(&db_tx, kind)
                .await?
                .ok_or(EngineError::NoRateAvailable(kind))
        })
    }

    /// Current quote for every kind; kinds without quotes are left empty.
    pub async fn current_rates(&self) -> ResultEngine<CurrentRates> {
        with_tx!(self, |db_tx| {
            let mut current = CurrentRates::default();
            for kind in RateKind::ALL {
                if let Some(quote) = self.find_current_rate(&db_tx, kind).await? {
                    current.set(quote);
                }
            }
            Ok::<_, EngineError>(current)
        })
    }

    /// Quotes newest first, optionally restricted to one kind.
    pub async fn rate_history(
        &self,
        kind: Option<RateKind>,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<RateQuote>> {
        with_tx!(self, |db_tx| {
            let mut query = rates::Entity::find();
            if let Some(kind) = kind {
                query = query.filter(rates::Column::RateKind.eq(kind.as_str()));
            }
            query
                .order_by_desc(rates::Column::CreatedAt)
                .order_by_desc(rates::Column::Sequence)
                .limit(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(RateQuote::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
